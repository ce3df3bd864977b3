use accord_server::contract::{ContractCompiler, IncomingRequest};
use accord_server::dsl::{EvaluationContext, Mode};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;

const CONTRACT: &str = r#"
module.exports = {
    id: 'orders',
    request: {
        method: ['GET', 'POST'],
        urlPath: regex('/orders/[0-9]+'),
        queryParameters: { page: integer({ gte: 1, lte: 100 }) },
        headers: { 'X-Trace': uuid4() },
        body: { kind: anyOf('retail', 'wholesale') },
    },
    response: {
        status: 200,
        headers: { 'Content-Type': 'application/json' },
        body: {
            id: value({ stub: 42, test: integer({ gt: 0 }) }),
            email: email(),
            total: float({ gte: 0, lt: 10000 }),
            echo: jsonpath('$.req.query.page'),
        },
    },
};
"#;

fn matching_request() -> IncomingRequest {
    IncomingRequest::new("POST", "/shop/orders/1234")
        .with_query("page=7")
        .with_header("X-Trace", "8d2f7c1e-3b4a-4c5d-9e6f-0a1b2c3d4e5f")
        .with_header("Content-Type", "application/json")
        .with_body(r#"{"kind": "retail", "note": "extra"}"#)
}

fn bench_is_handle(c: &mut Criterion) {
    let compiler = ContractCompiler::default();
    let contract = compiler.compile(CONTRACT).unwrap();
    let hit = matching_request();
    let miss = IncomingRequest::new("DELETE", "/shop/orders/1234");

    let mut group = c.benchmark_group("is_handle");
    group.throughput(Throughput::Elements(1));
    group.bench_function("match", |b| {
        b.iter(|| contract.is_handle(black_box("/shop"), black_box(&hit)))
    });
    group.bench_function("method_miss", |b| {
        b.iter(|| contract.is_handle(black_box("/shop"), black_box(&miss)))
    });
    group.finish();
}

fn bench_handle(c: &mut Criterion) {
    let compiler = ContractCompiler::default();
    let contract = compiler.compile(CONTRACT).unwrap();
    let req = matching_request();

    c.bench_function("handle", |b| {
        b.iter(|| contract.handle(black_box("/shop"), black_box(&req)).unwrap())
    });
}

fn bench_mock_compare(c: &mut Criterion) {
    let compiler = ContractCompiler::default();
    let contract = compiler.compile(CONTRACT).unwrap();
    let ctx = EvaluationContext::new(json!({"req": {"query": {"page": "7"}}}), Mode::Test);
    let body = contract.response.body.clone().unwrap().evaluate(&ctx);
    let target = body.mock().unwrap();

    let mut group = c.benchmark_group("response_body");
    group.bench_function("mock", |b| b.iter(|| black_box(&body).mock().unwrap()));
    group.bench_function("compare", |b| {
        b.iter(|| black_box(&body).compare(black_box(&target)).unwrap())
    });
    group.finish();
}

fn bench_compile(c: &mut Criterion) {
    let compiler = ContractCompiler::default();
    let mut group = c.benchmark_group("compile");
    for copies in [1usize, 10, 50] {
        let fields: Vec<String> = (0..copies)
            .map(|i| format!("f{i}: value({{stub: {i}, test: integer({{gte: 0}})}})"))
            .collect();
        let script = format!("{{response: {{body: {{{}}}}}}}", fields.join(", "));
        group.bench_with_input(BenchmarkId::new("fields", copies), &script, |b, script| {
            b.iter(|| compiler.compile(black_box(script)).unwrap())
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_is_handle,
    bench_handle,
    bench_mock_compare,
    bench_compile
);
criterion_main!(benches);
