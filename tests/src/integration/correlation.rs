//! # Request/Reply Correlation
//!
//! A request registers with the controller and subscribes under its
//! `(function, id)` key; the reply is raised once, reaches exactly that
//! handler, updates the capability registry and is relayed back.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use serde_json::json;
    use shared_bus::{EventKey, EventObserver};
    use shared_types::{functions, Message, Payload, ResultCode};
    use vl_01_command_factory::Endpoint;
    use vl_03_capability_registry::CapabilitySlot;
    use vl_runtime::{DispatchOutcome, Source};

    use crate::fixtures::{id, next, payload, runtime};

    #[tokio::test]
    async fn test_system_info_populates_registry_and_clears_latch() {
        let (runtime, mut outbox) = runtime();
        let caps = Arc::clone(&runtime.context().capabilities);
        assert!(caps.is_preloaded());

        let request = Message::request(functions::GET_SYSTEM_INFO, id(1), Payload::new());
        runtime.dispatch(Source::Upstream, request.clone()).await;
        assert_eq!(next(&mut outbox).await, (Endpoint::Downstream, request));

        let reply = Message::response(
            functions::GET_SYSTEM_INFO,
            id(1),
            payload(json!({"code": 0, "ccpu_version": "3.2.1", "wersCountryCode": "WAEGB", "language": 0})),
        );
        assert_eq!(
            runtime.dispatch(Source::Downstream, reply.clone()).await,
            DispatchOutcome::Delivered
        );
        assert_eq!(next(&mut outbox).await, (Endpoint::Upstream, reply));

        assert!(!caps.is_preloaded());
        assert_eq!(caps.ccpu_version().as_deref(), Some("3.2.1"));
        assert_eq!(caps.text(CapabilitySlot::WersCountryCode).as_deref(), Some("WAEGB"));
        assert_eq!(caps.text(CapabilitySlot::Language).as_deref(), Some("EN-US"));
    }

    #[tokio::test]
    async fn test_ui_capabilities_wraps_legacy_audio_value() {
        let (runtime, mut outbox) = runtime();
        let request = Message::request(functions::UI_GET_CAPABILITIES, id(2), Payload::new());
        runtime.dispatch(Source::Upstream, request).await;
        next(&mut outbox).await;

        let reply = Message::response(
            functions::UI_GET_CAPABILITIES,
            id(2),
            payload(json!({
                "code": 0,
                "displayCapabilities": {"displayType": "SDL_GENERIC"},
                "audioPassThruCapabilities": {"samplingRate": "16KHZ"},
                "hmiCapabilities": {"videoStreaming": true}
            })),
        );
        runtime.dispatch(Source::Downstream, reply).await;

        let caps = &runtime.context().capabilities;
        assert_eq!(caps.read(CapabilitySlot::Display), Some(json!({"displayType": "SDL_GENERIC"})));
        assert_eq!(
            caps.read(CapabilitySlot::AudioPassThru),
            Some(json!([{"samplingRate": "16KHZ"}]))
        );
        assert_eq!(caps.flag(CapabilitySlot::VideoStreamingSupported), Some(true));
        assert!(!caps.is_preloaded());
    }

    #[tokio::test]
    async fn test_out_of_order_replies_reach_their_requests() {
        let (runtime, mut outbox) = runtime();
        for raw in [10, 11] {
            let request = Message::request(functions::GET_SYSTEM_INFO, id(raw), Payload::new());
            assert_eq!(runtime.dispatch(Source::Upstream, request).await, DispatchOutcome::Executed);
            next(&mut outbox).await;
        }

        for (raw, version) in [(11, "eleven"), (10, "ten")] {
            let reply = Message::response(
                functions::GET_SYSTEM_INFO,
                id(raw),
                payload(json!({"code": 0, "ccpu_version": version})),
            );
            runtime.dispatch(Source::Downstream, reply).await;
            let (endpoint, relayed) = next(&mut outbox).await;
            assert_eq!(endpoint, Endpoint::Upstream);
            assert_eq!(relayed.correlation_id(), Some(id(raw)));
        }

        assert_eq!(runtime.context().capabilities.ccpu_version().as_deref(), Some("ten"));
        assert_eq!(runtime.context().controller.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_error_reply_is_relayed_and_keeps_latch() {
        let (runtime, mut outbox) = runtime();
        let request = Message::request(functions::GET_SYSTEM_INFO, id(3), Payload::new());
        runtime.dispatch(Source::Upstream, request).await;
        next(&mut outbox).await;

        let reply = Message::error_response(functions::GET_SYSTEM_INFO, id(3), ResultCode::GENERIC_ERROR, "oops");
        assert_eq!(
            runtime.dispatch(Source::Downstream, reply.clone()).await,
            DispatchOutcome::Delivered
        );
        assert_eq!(next(&mut outbox).await, (Endpoint::Upstream, reply));
        assert!(runtime.context().capabilities.is_preloaded());
    }

    #[tokio::test]
    async fn test_reply_for_wrong_id_is_unmatched() {
        let (runtime, mut outbox) = runtime();
        let request = Message::request(functions::GET_SYSTEM_INFO, id(4), Payload::new());
        runtime.dispatch(Source::Upstream, request).await;
        next(&mut outbox).await;

        let stray = Message::response(functions::GET_SYSTEM_INFO, id(5), payload(json!({"code": 0})));
        assert_eq!(runtime.dispatch(Source::Downstream, stray).await, DispatchOutcome::Unmatched);
        assert!(runtime.context().controller.is_pending(id(4)));
    }

    #[tokio::test]
    async fn test_function_only_subscription_catches_any_id() {
        let (runtime, _outbox) = runtime();
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let observer: Arc<dyn EventObserver> = Arc::new(move |_: &Message| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        runtime
            .context()
            .dispatcher
            .subscribe(EventKey::function_only("VR.IsReady"), observer)
            .unwrap();

        let reply = Message::response("VR.IsReady", id(77), payload(json!({"available": true})));
        assert_eq!(
            runtime.dispatch(Source::Downstream, reply.clone()).await,
            DispatchOutcome::Delivered
        );
        assert_eq!(runtime.dispatch(Source::Downstream, reply).await, DispatchOutcome::Unmatched);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
