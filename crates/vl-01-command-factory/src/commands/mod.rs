//! Built-in command variants.

mod exchange;
pub mod forward;
pub mod get_system_info;
pub mod ui_get_capabilities;

pub use forward::{ForwardNotification, ForwardRequest, ReplyHook};
pub use get_system_info::GetSystemInfo;
pub use ui_get_capabilities::UiGetCapabilities;

use crate::error::FactoryError;
use crate::factory::CommandFactory;
use shared_types::{functions, MessageKind};

/// Register the commands the core itself handles.
pub fn register_builtin_commands(factory: &mut CommandFactory) -> Result<(), FactoryError> {
    factory.register(functions::GET_SYSTEM_INFO, MessageKind::Request, GetSystemInfo::create)?;
    factory.register(
        functions::UI_GET_CAPABILITIES,
        MessageKind::Request,
        UiGetCapabilities::create,
    )?;
    Ok(())
}
