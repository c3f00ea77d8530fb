//! # Vehicle-Link Dispatch Benchmarks
//!
//! | Path | Operation |
//! |------|-----------|
//! | shared-types | decode one wire frame |
//! | vl-02 | add + complete on a loaded controller |
//! | shared-bus | subscribe + raise |
//! | vl-runtime | full request → reply correlation |

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use shared_bus::{EventDispatcher, EventKey, EventObserver};
use shared_types::{codec, functions, CorrelationId, Message, Payload};
use vl_02_request_controller::RequestController;
use vl_runtime::Source;
use vl_tests::fixtures::{payload, runtime};

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-types-codec");
    let frames = [
        ("request", br#"{"jsonrpc":"2.0","id":7,"method":"TuneUp","params":{"step":1}}"#.to_vec()),
        ("notification", br#"{"jsonrpc":"2.0","method":"OnRadioDetails","params":{"frequency":101.1}}"#.to_vec()),
        ("response", br#"{"jsonrpc":"2.0","id":7,"result":{"method":"TuneUp","code":0}}"#.to_vec()),
    ];
    for (name, frame) in &frames {
        group.bench_with_input(BenchmarkId::new("decode", name), frame, |b, frame| {
            b.iter(|| black_box(codec::decode(frame).is_ok()))
        });
    }
    group.finish();
}

fn bench_controller(c: &mut Criterion) {
    let mut group = c.benchmark_group("vl-02-request-controller");
    for loaded in [0u32, 1_000, 10_000] {
        let controller = RequestController::<u32>::new();
        let timeout = Duration::from_secs(3600);
        for raw in 0..loaded {
            let _ = controller.add(CorrelationId::new(raw), raw, timeout);
        }
        let extra = CorrelationId::new(u32::MAX);

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("add_complete", loaded), &loaded, |b, _| {
            b.iter(|| {
                let _ = controller.add(extra, 0, timeout);
                black_box(controller.complete(extra))
            })
        });
    }
    group.finish();
}

fn bench_dispatcher(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared-bus-dispatcher");
    let dispatcher = EventDispatcher::new();
    let observer: Arc<dyn EventObserver> = Arc::new(|message: &Message| {
        black_box(message.correlation_id());
    });
    let reply = Message::response("TuneUp", CorrelationId::new(1), Payload::new());
    let key = EventKey::correlated("TuneUp", CorrelationId::new(1));

    group.bench_function("subscribe_raise", |b| {
        b.iter(|| {
            let _ = dispatcher.subscribe(key.clone(), Arc::clone(&observer));
            black_box(dispatcher.raise(&key, &reply))
        })
    });
    group.finish();
}

fn bench_runtime_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("vl-runtime");
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => panic!("failed to build tokio runtime: {e}"),
    };
    let (core, mut outbox) = runtime();
    let mut next_id = 0u32;

    group.bench_function("get_system_info_round_trip", |b| {
        b.iter(|| {
            next_id = next_id.wrapping_add(1);
            let id = CorrelationId::new(next_id);
            rt.block_on(async {
                let request = Message::request(functions::GET_SYSTEM_INFO, id, Payload::new());
                core.dispatch(Source::Upstream, request).await;
                let reply = Message::response(
                    functions::GET_SYSTEM_INFO,
                    id,
                    payload(json!({"code": 0, "ccpu_version": "bench"})),
                );
                black_box(core.dispatch(Source::Downstream, reply).await);
            });
            while outbox.try_recv().is_ok() {}
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_decode,
    bench_controller,
    bench_dispatcher,
    bench_runtime_round_trip
);
criterion_main!(benches);
