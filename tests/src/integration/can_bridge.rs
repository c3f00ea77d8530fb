//! # CAN Bridge Behind the Runtime
//!
//! ```text
//! app ──dispatch──► CoreRuntime ──► CanModule ──► memory bus ──► peer
//! app ◄──outbox──── relay ◄──── dispatcher ◄──── reader task ◄── peer
//! ```
//!
//! The module shares the runtime's controller and dispatcher, so the
//! runtime's sweeper and shutdown govern bus requests as well.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use shared_types::{Message, MessageKind, Payload, ResultCode};
    use tokio::time::timeout;
    use vl_01_command_factory::Endpoint;
    use vl_04_can_module::{memory, CanModule, ConnectionState, MemoryBusPeer, PLUGIN_NAME};
    use vl_runtime::{CoreRuntime, DispatchOutcome, RuntimeConfig, Source};

    use crate::fixtures::{id, next, payload, runtime_with, Outbox, WAIT};

    async fn bridge(config: RuntimeConfig) -> (Arc<CoreRuntime>, Arc<CanModule>, MemoryBusPeer, Outbox) {
        let (runtime, outbox) = runtime_with(config);
        let (connector, peer) = memory::pair();
        let module = Arc::new(CanModule::new(
            runtime.context(),
            Box::new(connector),
            runtime.config().can_module_config(),
        ));
        runtime.register_module(module.clone()).unwrap();
        module.open().await.unwrap();
        runtime.start();
        (runtime, module, peer, outbox)
    }

    async fn from_app(runtime: &CoreRuntime, peer: &mut MemoryBusPeer, request: Message) {
        assert_eq!(
            runtime.dispatch(Source::Upstream, request.clone()).await,
            DispatchOutcome::RoutedToModule(PLUGIN_NAME.into())
        );
        let on_bus = timeout(WAIT, peer.recv_message()).await.unwrap().unwrap();
        assert_eq!(on_bus, request);
    }

    #[tokio::test]
    async fn test_app_request_answered_by_bus() {
        let (runtime, module, mut peer, mut outbox) = bridge(RuntimeConfig::default()).await;

        let request = Message::request("StartScan", id(1), Payload::new());
        from_app(&runtime, &mut peer, request).await;

        let reply = Message::response("StartScan", id(1), payload(json!({"code": 0})));
        assert!(peer.send_message(&reply));
        assert_eq!(next(&mut outbox).await, (Endpoint::Upstream, reply));
        assert!(module.is_scan_started());
        assert_eq!(runtime.context().controller.pending_count(), 0);

        runtime.shutdown().await;
        assert_eq!(module.state(), ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_access_grant_cleared_by_app_removal() {
        let (runtime, module, mut peer, mut outbox) = bridge(RuntimeConfig::default()).await;

        let request = Message::request("GrantAccess", id(2), payload(json!({"appID": 65537})));
        from_app(&runtime, &mut peer, request).await;
        assert!(peer.send_message(&Message::response("GrantAccess", id(2), payload(json!({"code": 0})))));
        next(&mut outbox).await;
        assert!(module.has_access(65537));

        runtime.remove_app_extension(65537);
        assert!(!module.has_access(65537));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_bus_notification_reaches_app() {
        let (runtime, _module, peer, mut outbox) = bridge(RuntimeConfig::default()).await;

        let note = Message::notification("OnRadioDetails", payload(json!({"frequency": 101.1})));
        assert!(peer.send_message(&note));
        assert_eq!(next(&mut outbox).await, (Endpoint::Upstream, note));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_hmi_notification_is_relayed() {
        let (runtime, _module, _peer, mut outbox) = bridge(RuntimeConfig::default()).await;

        let note = Message::notification("CAN.OnControlChanged", Payload::new());
        assert_eq!(
            runtime.dispatch(Source::Downstream, note.clone()).await,
            DispatchOutcome::RoutedToModule(PLUGIN_NAME.into())
        );
        assert_eq!(next(&mut outbox).await, (Endpoint::Upstream, note));

        let request = Message::request("CAN.GrantAccess", id(3), Payload::new());
        assert!(matches!(
            runtime.dispatch(Source::Downstream, request).await,
            DispatchOutcome::Rejected(_)
        ));

        runtime.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_bus_request_times_out_through_runtime_sweeper() {
        let mut config = RuntimeConfig::default();
        config.can_module.request_timeout = Duration::from_millis(400);
        let (runtime, _module, mut peer, mut outbox) = bridge(config).await;

        let request = Message::request("TuneUp", id(4), Payload::new());
        from_app(&runtime, &mut peer, request).await;

        tokio::time::sleep(Duration::from_millis(600)).await;
        let (endpoint, reply) = next(&mut outbox).await;
        assert_eq!(endpoint, Endpoint::Upstream);
        assert_eq!(reply.kind(), MessageKind::ErrorResponse);
        assert_eq!(reply.result_code(), Some(ResultCode::TIMED_OUT));

        // A bus reply after the deadline goes nowhere.
        assert!(peer.send_message(&Message::response("TuneUp", id(4), payload(json!({"code": 0})))));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(outbox.try_recv().is_err());

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_bus_loss_aborts_outstanding_requests() {
        let (runtime, module, mut peer, mut outbox) = bridge(RuntimeConfig::default()).await;

        let request = Message::request("TuneDown", id(5), Payload::new());
        from_app(&runtime, &mut peer, request).await;

        peer.disconnect();
        let (_, reply) = next(&mut outbox).await;
        assert_eq!(reply.result_code(), Some(ResultCode::ABORTED));

        let mut state = module.watch_state();
        timeout(WAIT, async {
            while *state.borrow_and_update() != ConnectionState::Closed {
                state.changed().await.unwrap();
            }
        })
        .await
        .unwrap();

        // Closed bus: new requests fail back to the app instead of hanging.
        let retry = Message::request("TuneDown", id(6), Payload::new());
        assert!(matches!(
            runtime.dispatch(Source::Upstream, retry).await,
            DispatchOutcome::Rejected(_)
        ));
        let (_, failure) = next(&mut outbox).await;
        assert_eq!(failure.result_code(), Some(ResultCode::GENERIC_ERROR));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_runtime_shutdown_stops_bus_and_aborts() {
        let (runtime, module, mut peer, mut outbox) = bridge(RuntimeConfig::default()).await;

        let request = Message::request("TuneRadio", id(7), payload(json!({"frequency": 98.5})));
        from_app(&runtime, &mut peer, request).await;

        runtime.shutdown().await;

        let (_, reply) = next(&mut outbox).await;
        assert_eq!(reply.result_code(), Some(ResultCode::ABORTED));
        assert_eq!(module.state(), ConnectionState::Closed);
        assert_eq!(runtime.context().controller.pending_count(), 0);
        assert!(timeout(WAIT, peer.recv_frame()).await.unwrap().is_none());
    }
}
