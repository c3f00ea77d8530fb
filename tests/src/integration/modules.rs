//! # Module Registration and Routing
//!
//! Function ownership is exclusive per side and checked when a module is
//! plugged in, independent of any traffic.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use shared_types::{FunctionalModule, Message, Payload, PluginInfo, ProcessResult};
    use vl_04_can_module::{memory, CanModule, CanModuleConfig, PLUGIN_NAME};
    use vl_runtime::{DispatchOutcome, RegistryError, RuntimeError, Source};

    use crate::fixtures::{id, runtime};

    struct Climate {
        info: PluginInfo,
        removed: AtomicU32,
    }

    impl Climate {
        fn new(info: PluginInfo) -> Arc<Self> {
            Arc::new(Self {
                info,
                removed: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl FunctionalModule for Climate {
        fn plugin_info(&self) -> &PluginInfo {
            &self.info
        }

        async fn process_message(&self, _message: Message) -> ProcessResult {
            ProcessResult::Processed
        }

        async fn process_hmi_message(&self, _message: Message) -> ProcessResult {
            ProcessResult::Processed
        }

        fn remove_app_extension(&self, app_id: u32) {
            self.removed.store(app_id, Ordering::SeqCst);
        }

        async fn shutdown(&self) {}
    }

    fn can_module(runtime: &vl_runtime::CoreRuntime) -> Arc<CanModule> {
        let (connector, _peer) = memory::pair();
        Arc::new(CanModule::new(
            runtime.context(),
            Box::new(connector),
            CanModuleConfig::default(),
        ))
    }

    #[test]
    fn test_overlap_with_can_module_rejected_at_registration() {
        let (runtime, _outbox) = runtime();
        runtime.register_module(can_module(&runtime)).unwrap();

        let rogue = Climate::new(PluginInfo::new("Climate", 1).with_mobile_functions(["SetTemperature", "TuneUp"]));
        let err = runtime.register_module(rogue).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Registry(RegistryError::OverlappingFunction { ref existing, ref module, .. })
                if existing == PLUGIN_NAME && module == "Climate"
        ));
        assert_eq!(runtime.modules().len(), 1);
    }

    #[test]
    fn test_hmi_overlap_checked_separately() {
        let (runtime, _outbox) = runtime();
        runtime.register_module(can_module(&runtime)).unwrap();

        // Owning the app-side name of an HMI-side function is fine.
        let climate = Climate::new(
            PluginInfo::new("Climate", 1).with_mobile_functions(["CAN.OnControlChanged"]),
        );
        runtime.register_module(climate).unwrap();

        let hmi_clash = Climate::new(
            PluginInfo::new("Seats", 1).with_hmi_functions(["CAN.GrantAccess"]),
        );
        assert!(runtime.register_module(hmi_clash).is_err());
    }

    #[tokio::test]
    async fn test_routing_and_app_cleanup_across_modules() {
        let (runtime, _outbox) = runtime();
        let climate = Climate::new(
            PluginInfo::new("Climate", 1)
                .with_mobile_functions(["SetTemperature"])
                .with_hmi_functions(["Climate.OnTemperature"]),
        );
        runtime.register_module(climate.clone()).unwrap();
        runtime.register_module(can_module(&runtime)).unwrap();

        let request = Message::request("SetTemperature", id(1), Payload::new());
        assert_eq!(
            runtime.dispatch(Source::Upstream, request).await,
            DispatchOutcome::RoutedToModule("Climate".into())
        );
        let note = Message::notification("Climate.OnTemperature", Payload::new());
        assert_eq!(
            runtime.dispatch(Source::Downstream, note).await,
            DispatchOutcome::RoutedToModule("Climate".into())
        );

        runtime.remove_app_extension(9);
        assert_eq!(climate.removed.load(Ordering::SeqCst), 9);

        runtime.shutdown().await;
    }
}
