//! # Module Registry
//!
//! Holds the functional modules plugged into the runtime and routes each
//! function identifier to the single module that owns it.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                ModuleRegistry                │
//! │                                              │
//! │  mobile routes            hmi routes         │
//! │  TuneUp ──► Radio         CAN.GrantAccess ─┐ │
//! │  StartScan ──► Radio                        │ │
//! │                                            ▼ │
//! │  ┌──────────┐  ┌──────────┐          ┌──────┐│
//! │  │  Radio   │  │ Climate  │   ...    │ ...  ││
//! │  └──────────┘  └──────────┘          └──────┘│
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Ownership is exclusive per side: registering a module that claims a
//! function another module already owns fails and leaves the registry
//! unchanged.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use shared_types::{FunctionId, FunctionalModule};
use thiserror::Error;
use tracing::info;

/// Module registration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Module {name} is already registered")]
    DuplicateModule { name: String },

    #[error("Function {function} is owned by {existing}, cannot register {module}")]
    OverlappingFunction {
        function: FunctionId,
        existing: String,
        module: String,
    },
}

#[derive(Default)]
struct Routes {
    modules: Vec<Arc<dyn FunctionalModule>>,
    mobile: HashMap<FunctionId, usize>,
    hmi: HashMap<FunctionId, usize>,
}

/// Registered modules in registration order.
#[derive(Default)]
pub struct ModuleRegistry {
    routes: RwLock<Routes>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module and claim its functions.
    pub fn register(&self, module: Arc<dyn FunctionalModule>) -> Result<(), RegistryError> {
        let info = module.plugin_info();
        let mut routes = self.routes.write();

        if routes
            .modules
            .iter()
            .any(|existing| existing.plugin_info().name == info.name)
        {
            return Err(RegistryError::DuplicateModule {
                name: info.name.clone(),
            });
        }

        let claims = [
            (&info.mobile_function_ids, &routes.mobile),
            (&info.hmi_function_ids, &routes.hmi),
        ];
        for (functions, table) in claims {
            if let Some((function, &owner)) = functions
                .iter()
                .find_map(|function| table.get(function).map(|owner| (function, owner)))
            {
                return Err(RegistryError::OverlappingFunction {
                    function: function.clone(),
                    existing: routes.modules[owner].plugin_info().name.clone(),
                    module: info.name.clone(),
                });
            }
        }

        let index = routes.modules.len();
        for function in &info.mobile_function_ids {
            routes.mobile.insert(function.clone(), index);
        }
        for function in &info.hmi_function_ids {
            routes.hmi.insert(function.clone(), index);
        }

        info!(
            "[Registry] Registering module: {} v{} ({} mobile, {} hmi functions)",
            info.name,
            info.version,
            info.mobile_function_ids.len(),
            info.hmi_function_ids.len()
        );
        routes.modules.push(Arc::clone(&module));
        Ok(())
    }

    /// Module owning `function` on the app-facing side.
    pub fn route_mobile(&self, function: &FunctionId) -> Option<Arc<dyn FunctionalModule>> {
        let routes = self.routes.read();
        routes
            .mobile
            .get(function)
            .map(|&index| Arc::clone(&routes.modules[index]))
    }

    /// Module owning `function` on the HMI-facing side.
    pub fn route_hmi(&self, function: &FunctionId) -> Option<Arc<dyn FunctionalModule>> {
        let routes = self.routes.read();
        routes
            .hmi
            .get(function)
            .map(|&index| Arc::clone(&routes.modules[index]))
    }

    /// Whether any module owns `function` on either side.
    pub fn owns(&self, function: &FunctionId) -> bool {
        let routes = self.routes.read();
        routes.mobile.contains_key(function) || routes.hmi.contains_key(function)
    }

    pub fn modules(&self) -> Vec<Arc<dyn FunctionalModule>> {
        self.routes.read().modules.clone()
    }

    pub fn len(&self) -> usize {
        self.routes.read().modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.read().modules.is_empty()
    }

    /// Tell every module an application went away.
    pub fn remove_app_extension(&self, app_id: u32) {
        for module in self.modules() {
            module.remove_app_extension(app_id);
        }
    }

    /// Shut modules down, last registered first.
    pub async fn shutdown_all(&self) {
        let modules = self.modules();
        for module in modules.iter().rev() {
            info!("[Registry] Stopping module: {}", module.plugin_info().name);
            module.shutdown().await;
        }
    }
}
