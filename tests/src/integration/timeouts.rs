//! # Deadlines and Teardown
//!
//! The runtime's sweeper retires requests whose deadline passed with a
//! `TIMED_OUT` error to the requester; shutdown aborts whatever is left.
//! These scenarios run on paused tokio time.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use shared_types::{functions, Message, Payload, ResultCode};
    use vl_01_command_factory::Endpoint;
    use vl_runtime::{DispatchOutcome, RuntimeConfig, Source};

    use crate::fixtures::{id, next, payload, runtime, runtime_with};

    fn config(default: Duration) -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.timeouts.default = default;
        config.timeouts.sweep_interval = Duration::from_millis(50);
        config
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_function_override_expires_first() {
        let mut config = config(Duration::from_secs(5));
        config
            .timeouts
            .overrides
            .insert(functions::GET_SYSTEM_INFO.to_string(), Duration::from_millis(500));
        let (runtime, mut outbox) = runtime_with(config);
        runtime.start();

        let info = Message::request(functions::GET_SYSTEM_INFO, id(1), Payload::new());
        let caps = Message::request(functions::UI_GET_CAPABILITIES, id(2), Payload::new());
        runtime.dispatch(Source::Upstream, info).await;
        runtime.dispatch(Source::Upstream, caps).await;
        next(&mut outbox).await;
        next(&mut outbox).await;

        tokio::time::sleep(Duration::from_millis(700)).await;

        let (endpoint, reply) = next(&mut outbox).await;
        assert_eq!(endpoint, Endpoint::Upstream);
        assert_eq!(reply.function_id().as_str(), functions::GET_SYSTEM_INFO);
        assert_eq!(reply.result_code(), Some(ResultCode::TIMED_OUT));
        assert!(runtime.context().controller.is_pending(id(2)));
        assert!(!runtime.context().controller.is_pending(id(1)));

        runtime.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_after_timeout_is_unmatched() {
        let (runtime, mut outbox) = runtime_with(config(Duration::from_millis(300)));
        runtime.start();

        let request = Message::request(functions::GET_SYSTEM_INFO, id(3), Payload::new());
        runtime.dispatch(Source::Upstream, request).await;
        next(&mut outbox).await;

        tokio::time::sleep(Duration::from_millis(400)).await;
        let (_, timed_out) = next(&mut outbox).await;
        assert_eq!(timed_out.result_code(), Some(ResultCode::TIMED_OUT));

        let late = Message::response(
            functions::GET_SYSTEM_INFO,
            id(3),
            payload(json!({"code": 0, "ccpu_version": "late"})),
        );
        assert_eq!(runtime.dispatch(Source::Downstream, late).await, DispatchOutcome::Unmatched);
        assert!(runtime.context().capabilities.ccpu_version().is_none());
        assert!(outbox.try_recv().is_err());

        runtime.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_before_deadline_is_not_swept() {
        let (runtime, mut outbox) = runtime_with(config(Duration::from_millis(300)));
        runtime.start();

        let request = Message::request(functions::GET_SYSTEM_INFO, id(4), Payload::new());
        runtime.dispatch(Source::Upstream, request).await;
        next(&mut outbox).await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        let reply = Message::response(functions::GET_SYSTEM_INFO, id(4), payload(json!({"code": 0})));
        assert_eq!(runtime.dispatch(Source::Downstream, reply).await, DispatchOutcome::Delivered);
        assert_eq!(next(&mut outbox).await.1.result_code(), Some(ResultCode::SUCCESS));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(outbox.try_recv().is_err());

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_aborts_every_pending_request() {
        let (runtime, mut outbox) = runtime();
        runtime.start();
        for raw in 20..23 {
            let request = Message::request(functions::UI_GET_CAPABILITIES, id(raw), Payload::new());
            runtime.dispatch(Source::Upstream, request).await;
            next(&mut outbox).await;
        }

        runtime.shutdown().await;

        let mut aborted = Vec::new();
        while let Ok((endpoint, reply)) = outbox.try_recv() {
            assert_eq!(endpoint, Endpoint::Upstream);
            assert_eq!(reply.result_code(), Some(ResultCode::ABORTED));
            aborted.extend(reply.correlation_id());
        }
        aborted.sort();
        assert_eq!(aborted, vec![id(20), id(21), id(22)]);
        assert_eq!(runtime.context().dispatcher.subscription_count(), 0);
        assert!(!runtime.is_running());
    }
}
