//! Named capability slots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named bucket of endpoint-reported feature or state data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilitySlot {
    Display,
    HmiZone,
    SoftButton,
    AudioPassThru,
    NavigationSupported,
    PhoneCallSupported,
    VideoStreamingSupported,
    NavigationCapability,
    PhoneCapability,
    VideoStreamingCapability,
    SystemDisplayCapabilities,
    CcpuVersion,
    WersCountryCode,
    Language,
}

impl CapabilitySlot {
    /// Every slot, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::Display,
        Self::HmiZone,
        Self::SoftButton,
        Self::AudioPassThru,
        Self::NavigationSupported,
        Self::PhoneCallSupported,
        Self::VideoStreamingSupported,
        Self::NavigationCapability,
        Self::PhoneCapability,
        Self::VideoStreamingCapability,
        Self::SystemDisplayCapabilities,
        Self::CcpuVersion,
        Self::WersCountryCode,
        Self::Language,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Display => "display",
            Self::HmiZone => "hmi_zone",
            Self::SoftButton => "soft_button",
            Self::AudioPassThru => "audio_pass_thru",
            Self::NavigationSupported => "navigation_supported",
            Self::PhoneCallSupported => "phone_call_supported",
            Self::VideoStreamingSupported => "video_streaming_supported",
            Self::NavigationCapability => "navigation_capability",
            Self::PhoneCapability => "phone_capability",
            Self::VideoStreamingCapability => "video_streaming_capability",
            Self::SystemDisplayCapabilities => "system_display_capabilities",
            Self::CcpuVersion => "ccpu_version",
            Self::WersCountryCode => "wers_country_code",
            Self::Language => "language",
        }
    }
}

impl fmt::Display for CapabilitySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
