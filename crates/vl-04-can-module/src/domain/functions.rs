//! Functions owned by the CAN bridge.

use shared_types::PluginInfo;

pub const PLUGIN_NAME: &str = "ReverseSDLPlugin";
pub const PLUGIN_VERSION: u32 = 1;

pub const TUNE_RADIO: &str = "TuneRadio";
pub const TUNE_UP: &str = "TuneUp";
pub const TUNE_DOWN: &str = "TuneDown";
pub const GRANT_ACCESS: &str = "GrantAccess";
pub const CANCEL_ACCESS: &str = "CancelAccess";
pub const START_SCAN: &str = "StartScan";
pub const STOP_SCAN: &str = "StopScan";
pub const ON_CONTROL_CHANGED: &str = "OnControlChanged";
pub const ON_RADIO_DETAILS: &str = "OnRadioDetails";
pub const ON_PRESET_CHANGED: &str = "OnPresetChanged";

pub const HMI_GRANT_ACCESS: &str = "CAN.GrantAccess";
pub const HMI_CANCEL_ACCESS: &str = "CAN.CancelAccess";
pub const HMI_ON_CONTROL_CHANGED: &str = "CAN.OnControlChanged";

/// App-facing functions.
pub const MOBILE_FUNCTIONS: [&str; 10] = [
    TUNE_RADIO,
    TUNE_UP,
    TUNE_DOWN,
    GRANT_ACCESS,
    CANCEL_ACCESS,
    START_SCAN,
    STOP_SCAN,
    ON_CONTROL_CHANGED,
    ON_RADIO_DETAILS,
    ON_PRESET_CHANGED,
];

/// HMI-facing functions.
pub const HMI_FUNCTIONS: [&str; 3] = [HMI_GRANT_ACCESS, HMI_CANCEL_ACCESS, HMI_ON_CONTROL_CHANGED];

/// Params field naming the application in access requests.
pub const APP_ID_FIELD: &str = "appID";

pub fn plugin_info() -> PluginInfo {
    PluginInfo::new(PLUGIN_NAME, PLUGIN_VERSION)
        .with_mobile_functions(MOBILE_FUNCTIONS)
        .with_hmi_functions(HMI_FUNCTIONS)
}
