//! # Payload Schemas
//!
//! Typed views over the payloads the core itself inspects. Everything the
//! core only forwards stays an opaque [`serde_json::Value`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// HMI result code carried in the `code` field of a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultCode(i64);

impl ResultCode {
    pub const SUCCESS: Self = Self(0);
    pub const UNSUPPORTED_REQUEST: Self = Self(1);
    pub const REJECTED: Self = Self(4);
    pub const ABORTED: Self = Self(5);
    pub const TIMED_OUT: Self = Self(10);
    pub const INVALID_DATA: Self = Self(11);
    pub const INVALID_ID: Self = Self(13);
    pub const GENERIC_ERROR: Self = Self(22);

    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn value(self) -> i64 {
        self.0
    }

    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }

    /// Symbolic name for known codes.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::SUCCESS => "SUCCESS",
            Self::UNSUPPORTED_REQUEST => "UNSUPPORTED_REQUEST",
            Self::REJECTED => "REJECTED",
            Self::ABORTED => "ABORTED",
            Self::TIMED_OUT => "TIMED_OUT",
            Self::INVALID_DATA => "INVALID_DATA",
            Self::INVALID_ID => "INVALID_ID",
            Self::GENERIC_ERROR => "GENERIC_ERROR",
            _ => return None,
        };
        Some(name)
    }
}

impl Default for ResultCode {
    fn default() -> Self {
        Self::SUCCESS
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Minimal reply body: just the result code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultBody {
    #[serde(default)]
    pub code: ResultCode,
}

/// `GetSystemInfo` reply body.
///
/// Optional fields are only meaningful when `code` is `SUCCESS`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetSystemInfoResult {
    #[serde(default)]
    pub code: ResultCode,
    #[serde(default)]
    pub ccpu_version: Option<String>,
    #[serde(default, rename = "wersCountryCode")]
    pub wers_country_code: Option<String>,
    #[serde(default)]
    pub language: Option<u32>,
}

impl GetSystemInfoResult {
    /// The reported language as a wire string, e.g. `EN-US`.
    pub fn language_name(&self) -> Option<&'static str> {
        self.language.and_then(language_name)
    }
}

/// HMI language codes, indexed by their numeric wire value.
const LANGUAGES: &[&str] = &[
    "EN-US", "ES-MX", "FR-CA", "DE-DE", "ES-ES", "EN-GB", "RU-RU", "TR-TR", "PL-PL", "FR-FR",
    "IT-IT", "SV-SE", "PT-PT", "NL-NL", "EN-AU", "ZH-CN", "ZH-TW", "JA-JP", "AR-SA", "KO-KR",
    "PT-BR", "CS-CZ", "DA-DK", "NO-NO",
];

/// Map a numeric HMI language code to its string form.
pub fn language_name(code: u32) -> Option<&'static str> {
    usize::try_from(code)
        .ok()
        .and_then(|index| LANGUAGES.get(index))
        .copied()
}

/// `hmiCapabilities` block of a UI capability reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HmiCapabilityFlags {
    #[serde(default, deserialize_with = "lenient")]
    pub navigation: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub phone_call: Option<bool>,
    #[serde(default, deserialize_with = "lenient")]
    pub video_streaming: Option<bool>,
}

/// `systemCapabilities` block of a UI capability reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemCapabilities {
    #[serde(default)]
    pub navigation_capability: Option<Value>,
    #[serde(default)]
    pub phone_capability: Option<Value>,
    #[serde(default)]
    pub video_streaming_capability: Option<Value>,
    #[serde(default)]
    pub display_capabilities: Option<Value>,
}

/// `UI.GetCapabilities` reply body.
///
/// Fields are read independently: one of the wrong shape reads as absent
/// and leaves the others intact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiCapabilitiesResult {
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub code: ResultCode,
    #[serde(default)]
    pub display_capabilities: Option<Value>,
    #[serde(default)]
    pub hmi_zone_capabilities: Option<Value>,
    #[serde(default)]
    pub soft_button_capabilities: Option<Value>,
    #[serde(default)]
    pub audio_pass_thru_capabilities_list: Option<Value>,
    #[serde(default)]
    pub audio_pass_thru_capabilities: Option<Value>,
    #[serde(default, deserialize_with = "lenient")]
    pub hmi_capabilities: Option<HmiCapabilityFlags>,
    #[serde(default, deserialize_with = "lenient")]
    pub system_capabilities: Option<SystemCapabilities>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

impl UiCapabilitiesResult {
    /// Audio pass-thru capabilities as a list.
    ///
    /// The newer list field wins; a lone legacy value is wrapped into a
    /// one-element array.
    pub fn audio_pass_thru_list(&self) -> Option<Value> {
        if let Some(list) = &self.audio_pass_thru_capabilities_list {
            return Some(list.clone());
        }
        self.audio_pass_thru_capabilities
            .as_ref()
            .map(|single| Value::Array(vec![single.clone()]))
    }
}
