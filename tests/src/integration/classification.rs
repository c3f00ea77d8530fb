//! # Wire Classification Through the Runtime
//!
//! Raw frames enter through `dispatch_bytes` and are classified into the
//! four message kinds before anything else sees them. Malformed frames
//! never reach a command, a module or the dispatcher.

#[cfg(test)]
mod tests {
    use crate::fixtures::{next, runtime};
    use shared_types::{functions, MessageKind, ResultCode};
    use vl_01_command_factory::Endpoint;
    use vl_runtime::{DispatchOutcome, Source};

    const SYSTEM_INFO_REQUEST: &[u8] =
        br#"{"jsonrpc":"2.0","id":21,"method":"GetSystemInfo","params":{}}"#;

    #[tokio::test]
    async fn test_request_frame_runs_command() {
        let (runtime, mut outbox) = runtime();
        assert_eq!(
            runtime.dispatch_bytes(Source::Upstream, SYSTEM_INFO_REQUEST).await,
            DispatchOutcome::Executed
        );

        let (endpoint, forwarded) = next(&mut outbox).await;
        assert_eq!(endpoint, Endpoint::Downstream);
        assert_eq!(forwarded.kind(), MessageKind::Request);
        assert_eq!(forwarded.function_id().as_str(), functions::GET_SYSTEM_INFO);
    }

    #[tokio::test]
    async fn test_response_frame_is_delivered_by_result_method() {
        let (runtime, mut outbox) = runtime();
        runtime.dispatch_bytes(Source::Upstream, SYSTEM_INFO_REQUEST).await;
        next(&mut outbox).await;

        let reply = br#"{"jsonrpc":"2.0","id":21,"result":{"method":"GetSystemInfo","code":0,"ccpu_version":"9.0"}}"#;
        assert_eq!(
            runtime.dispatch_bytes(Source::Downstream, reply).await,
            DispatchOutcome::Delivered
        );

        let (endpoint, relayed) = next(&mut outbox).await;
        assert_eq!(endpoint, Endpoint::Upstream);
        assert_eq!(relayed.kind(), MessageKind::Response);
        assert!(relayed.is_success());
    }

    #[tokio::test]
    async fn test_error_frame_is_delivered_by_data_method() {
        let (runtime, mut outbox) = runtime();
        runtime.dispatch_bytes(Source::Upstream, SYSTEM_INFO_REQUEST).await;
        next(&mut outbox).await;

        let reply = br#"{"jsonrpc":"2.0","id":21,"error":{"code":4,"message":"busy","data":{"method":"GetSystemInfo"}}}"#;
        assert_eq!(
            runtime.dispatch_bytes(Source::Downstream, reply).await,
            DispatchOutcome::Delivered
        );

        let (_, relayed) = next(&mut outbox).await;
        assert_eq!(relayed.kind(), MessageKind::ErrorResponse);
        assert_eq!(relayed.result_code(), Some(ResultCode::REJECTED));
        assert!(!relayed.is_success());
    }

    #[tokio::test]
    async fn test_notification_frame_without_handler() {
        let (runtime, _outbox) = runtime();
        let frame = br#"{"jsonrpc":"2.0","method":"OnAppUnregistered","params":{"appID":3}}"#;
        assert_eq!(
            runtime.dispatch_bytes(Source::Upstream, frame).await,
            DispatchOutcome::UnknownFunction
        );
    }

    #[tokio::test]
    async fn test_malformed_frames_do_not_touch_state() {
        let (runtime, mut outbox) = runtime();
        let frames: [&[u8]; 6] = [
            b"{",
            b"42",
            br#"{"jsonrpc":"2.0"}"#,
            br#"{"id":1,"method":7}"#,
            br#"{"result":{"method":"GetSystemInfo","code":0}}"#,
            br#"{"id":"abc","method":"GetSystemInfo"}"#,
        ];

        for frame in frames {
            let outcome = runtime.dispatch_bytes(Source::Upstream, frame).await;
            assert!(matches!(outcome, DispatchOutcome::Rejected(_)), "{outcome:?}");
        }
        assert!(outbox.try_recv().is_err());
        assert_eq!(runtime.context().controller.pending_count(), 0);
        assert_eq!(runtime.context().dispatcher.subscription_count(), 0);
    }

    mod properties {
        use crate::fixtures::{id, runtime};
        use proptest::prelude::*;
        use shared_types::{codec, functions, Message, MessageKind, Payload};
        use vl_01_command_factory::Endpoint;
        use vl_runtime::{DispatchOutcome, Source};

        fn function_name() -> impl Strategy<Value = String> {
            prop_oneof![
                Just(functions::GET_SYSTEM_INFO.to_string()),
                Just(functions::UI_GET_CAPABILITIES.to_string()),
                "[A-Z][a-z]{2,10}(\\.[A-Z][a-z]{2,10})?",
            ]
        }

        fn is_core(function: &str) -> bool {
            function == functions::GET_SYSTEM_INFO || function == functions::UI_GET_CAPABILITIES
        }

        proptest! {
            #[test]
            fn request_frames_run_only_registered_commands(function in function_name(), raw in any::<u32>()) {
                let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
                let (runtime, mut outbox) = runtime();
                let frame = codec::encode(&Message::request(function.as_str(), id(raw), Payload::new()));

                let outcome = rt.block_on(runtime.dispatch_bytes(Source::Upstream, &frame));
                let ctx = runtime.context();

                if is_core(&function) {
                    prop_assert_eq!(outcome, DispatchOutcome::Executed);
                    prop_assert!(ctx.controller.is_pending(id(raw)));
                    let (endpoint, forwarded) = outbox.try_recv().unwrap();
                    prop_assert_eq!(endpoint, Endpoint::Downstream);
                    prop_assert_eq!(forwarded.kind(), MessageKind::Request);
                    prop_assert_eq!(forwarded.function_id().as_str(), function.as_str());
                    prop_assert_eq!(forwarded.correlation_id(), Some(id(raw)));

                    let reply = codec::encode(&Message::response(function.as_str(), id(raw), Payload::new()));
                    let delivered = rt.block_on(runtime.dispatch_bytes(Source::Downstream, &reply));
                    prop_assert_eq!(delivered, DispatchOutcome::Delivered);
                } else {
                    prop_assert_eq!(outcome, DispatchOutcome::UnknownFunction);
                    prop_assert!(outbox.try_recv().is_err());
                }
                prop_assert_eq!(ctx.controller.pending_count(), 0usize);
                prop_assert_eq!(ctx.dispatcher.subscription_count(), 0usize);
            }

            #[test]
            fn replies_without_a_request_are_unmatched(function in function_name(), raw in any::<u32>()) {
                let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
                let (runtime, mut outbox) = runtime();
                let reply = codec::encode(&Message::response(function.as_str(), id(raw), Payload::new()));

                let outcome = rt.block_on(runtime.dispatch_bytes(Source::Downstream, &reply));
                prop_assert_eq!(outcome, DispatchOutcome::Unmatched);
                prop_assert!(outbox.try_recv().is_err());
            }
        }
    }
}
