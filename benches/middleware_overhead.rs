//! Benchmarks for measuring middleware overhead.
//!
//! These benchmarks measure the latency added by the hardening layers
//! to help identify performance bottlenecks and track regressions.
//! Rate limiting is excluded everywhere, since every iteration comes from
//! the same client key.

use axum::{Router, body::Body, http::Request, routing::get};
use axum_hardened::{
    AppState, Config, FluentRouter, HttpMiddleware, MemoryItemRepository, items,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tower::ServiceExt;

const CONFIG_TOML: &str = r#"
[app]
name = "bench"

[http.middleware]
exclude = ["rate-limiting"]

[logging]
format = "json"
"#;

/// Simple handler that returns immediately
async fn handler() -> &'static str {
    "OK"
}

fn bench_config() -> Config {
    CONFIG_TOML.parse().unwrap()
}

fn get_request(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .body(Body::empty())
        .unwrap()
}

fn post_item_request() -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(items::ITEMS_PATH)
        .header("content-type", "application/json")
        .body(Body::from(r#"{"name":"Desk","price":199.99}"#))
        .unwrap()
}

/// Runs `request` against `router` once per iteration.
fn bench_router(
    c: &mut Criterion,
    rt: &tokio::runtime::Runtime,
    name: &str,
    router: Router,
    request: fn() -> Request<Body>,
) {
    c.bench_function(name, |b| {
        b.to_async(rt).iter(|| async {
            let response = router.clone().oneshot(request()).await.unwrap();
            black_box(response)
        })
    });
}

/// Benchmark: Bare axum router (no hardening middleware)
fn bench_bare_axum(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let router = Router::new().route("/", get(handler));
    bench_router(c, &rt, "bare_axum", router, || get_request("/"));
}

/// Benchmark: FluentRouter with every middleware switched off
fn bench_no_middleware(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let config = bench_config().with_included_middlewares(vec![]);

    let router = rt.block_on(async {
        FluentRouter::without_state(config)
            .unwrap()
            .route("/", get(handler))
            .setup_middleware()
            .await
            .unwrap()
            .into_router()
    });
    bench_router(c, &rt, "fluent_no_middleware", router, || get_request("/"));
}

/// Benchmark: FluentRouter with the full default stack
fn bench_full_stack(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let router = rt.block_on(async {
        FluentRouter::without_state(bench_config())
            .unwrap()
            .route("/", get(handler))
            .setup_middleware()
            .await
            .unwrap()
            .into_router()
    });
    bench_router(c, &rt, "fluent_full_stack", router, || get_request("/"));
}

/// Benchmark: Creating an item through the whole stack
fn bench_create_item(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    let router = rt.block_on(async {
        FluentRouter::<AppState<MemoryItemRepository>>::with_state(
            bench_config(),
            AppState::new(MemoryItemRepository::new()),
        )
        .unwrap()
        .nest(items::ITEMS_PATH, items::router())
        .setup_middleware()
        .await
        .unwrap()
        .into_router()
    });
    bench_router(c, &rt, "create_item", router, post_item_request);
}

/// Benchmark: Individual middleware layers
fn bench_individual_middleware(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("individual_middleware");

    let layers = [
        ("request_context", HttpMiddleware::RequestContext),
        ("logging", HttpMiddleware::Logging),
        ("security_headers", HttpMiddleware::SecurityHeaders),
        ("cors", HttpMiddleware::Cors),
        ("header_sanitization", HttpMiddleware::HeaderSanitization),
        ("body_limit", HttpMiddleware::BodyLimit),
        ("catch_panic", HttpMiddleware::CatchPanic),
    ];

    for (name, middleware) in layers {
        let config = bench_config().with_included_middlewares(vec![middleware]);
        let router = rt.block_on(async {
            FluentRouter::without_state(config)
                .unwrap()
                .route("/", get(handler))
                .setup_middleware()
                .await
                .unwrap()
                .into_router()
        });

        group.bench_function(name, |b| {
            b.to_async(&rt).iter(|| async {
                let response = router.clone().oneshot(get_request("/")).await.unwrap();
                black_box(response)
            })
        });
    }

    group.finish();
}

/// Benchmark: Middleware stack scaling
fn bench_middleware_stack_scaling(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("stack_scaling");

    let stacks = [
        vec![HttpMiddleware::RequestContext],
        vec![
            HttpMiddleware::RequestContext,
            HttpMiddleware::Logging,
            HttpMiddleware::CatchPanic,
        ],
        vec![
            HttpMiddleware::RequestContext,
            HttpMiddleware::Logging,
            HttpMiddleware::CatchPanic,
            HttpMiddleware::SecurityHeaders,
            HttpMiddleware::Cors,
            HttpMiddleware::MethodWhitelist,
        ],
        vec![
            HttpMiddleware::RequestContext,
            HttpMiddleware::Logging,
            HttpMiddleware::CatchPanic,
            HttpMiddleware::SecurityHeaders,
            HttpMiddleware::Cors,
            HttpMiddleware::MethodWhitelist,
            HttpMiddleware::HeaderLimits,
            HttpMiddleware::HeaderSanitization,
            HttpMiddleware::ContentType,
            HttpMiddleware::Timeout,
            HttpMiddleware::BodyLimit,
        ],
    ];

    for stack in stacks {
        let layers = stack.len();
        let config = bench_config().with_included_middlewares(stack);
        let router = rt.block_on(async {
            FluentRouter::without_state(config)
                .unwrap()
                .route("/", get(handler))
                .setup_middleware()
                .await
                .unwrap()
                .into_router()
        });

        group.bench_with_input(BenchmarkId::new("layers", layers), &router, |b, router| {
            b.to_async(&rt).iter(|| async {
                let response = router.clone().oneshot(get_request("/")).await.unwrap();
                black_box(response)
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_bare_axum,
    bench_no_middleware,
    bench_full_stack,
    bench_create_item,
    bench_individual_middleware,
    bench_middleware_stack_scaling,
);
criterion_main!(benches);
