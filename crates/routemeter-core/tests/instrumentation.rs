#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Barrier};
use std::time::Duration;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http::{HeaderMap, HeaderValue, Request, StatusCode};

use routemeter_core::error::ErrorCode;
use routemeter_core::metrics::{MetricDesc, Registry};
use routemeter_core::middleware::{
    handler_fn, Handler, HttpMetrics, HttpMetricsOptions, ResponseBuffer,
    TemplateResolver, HTTP_REQUESTS_TOTAL, HTTP_RESPONSE_TIME_SECONDS, RESPONSE_STATUS,
};

fn setup() -> (Arc<Registry>, Arc<HttpMetrics>) {
    let registry = Arc::new(Registry::new());
    let metrics = HttpMetrics::install(Arc::clone(&registry), HttpMetricsOptions::default())
        .expect("install");
    (registry, Arc::new(metrics))
}

fn resolver() -> Arc<TemplateResolver> {
    Arc::new(TemplateResolver::new(["/a", "/x", "/slow", "/boom", "/users/{id}"]))
}

fn get(path: &str) -> Request<Bytes> {
    Request::builder().uri(path).body(Bytes::new()).unwrap()
}

fn serve(handler: &dyn Handler, path: &str) -> http::Response<Bytes> {
    let mut w = ResponseBuffer::new();
    handler.serve(&get(path), &mut w);
    w.into_response()
}

#[test]
fn not_found_scenario() {
    let (registry, metrics) = setup();
    let h = metrics.instrument(
        handler_fn(|_req, w| {
            w.write_status(StatusCode::NOT_FOUND);
            w.write_body(b"not found").unwrap();
        }),
        resolver(),
    );

    let resp = serve(&h, "/x");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(resp.body().as_ref(), b"not found");

    let snap = registry.snapshot();
    assert_eq!(snap.counter_value(RESPONSE_STATUS, &["404"]), Some(1));
    assert_eq!(snap.counter_value(HTTP_REQUESTS_TOTAL, &["/x"]), Some(1));
    assert_eq!(snap.histogram(HTTP_RESPONSE_TIME_SECONDS, &["/x"]).unwrap().count, 1);
}

#[test]
fn one_measurement_per_request_with_repeated_status() {
    let (registry, metrics) = setup();
    let h = metrics.instrument(
        handler_fn(|_req, w| {
            w.write_status(StatusCode::CREATED);
            w.write_status(StatusCode::INTERNAL_SERVER_ERROR);
            w.write_status(StatusCode::ACCEPTED);
        }),
        resolver(),
    );

    for _ in 0..3 {
        assert_eq!(serve(&h, "/a").status(), StatusCode::CREATED);
    }

    let snap = registry.snapshot();
    assert_eq!(snap.counter_value(HTTP_REQUESTS_TOTAL, &["/a"]), Some(3));
    assert_eq!(snap.counter_value(RESPONSE_STATUS, &["201"]), Some(3));
    assert_eq!(snap.family(RESPONSE_STATUS).unwrap().samples.len(), 1);
    assert_eq!(snap.histogram(HTTP_RESPONSE_TIME_SECONDS, &["/a"]).unwrap().count, 3);
}

#[test]
fn implicit_status_is_ok() {
    let (registry, metrics) = setup();
    let body_only = metrics.instrument(handler_fn(|_req, w| w.write_body(b"hello").unwrap()), resolver());
    let silent = metrics.instrument(handler_fn(|_req, _w| {}), resolver());

    serve(&body_only, "/a");
    serve(&silent, "/a");

    let snap = registry.snapshot();
    assert_eq!(snap.counter_value(RESPONSE_STATUS, &["200"]), Some(2));
}

#[test]
fn unresolved_route_uses_sentinel() {
    let (registry, metrics) = setup();
    let h = metrics.instrument(handler_fn(|_req, _w| {}), resolver());

    serve(&h, "/definitely/not/a/route/123");

    let snap = registry.snapshot();
    assert_eq!(snap.counter_value(HTTP_REQUESTS_TOTAL, &["unmatched"]), Some(1));
    assert_eq!(snap.family(HTTP_REQUESTS_TOTAL).unwrap().samples.len(), 1);
}

#[test]
fn labels_use_route_template_not_raw_path() {
    let (registry, metrics) = setup();
    let h = metrics.instrument(handler_fn(|_req, _w| {}), resolver());

    for id in 0..50 {
        serve(&h, &format!("/users/{id}"));
    }

    let snap = registry.snapshot();
    let fam = snap.family(HTTP_REQUESTS_TOTAL).unwrap();
    assert_eq!(fam.samples.len(), 1);
    assert_eq!(fam.counter_value(&["/users/{id}"]), Some(50));
}

#[test]
fn panic_is_recorded_and_propagated() {
    let (registry, metrics) = setup();
    let h = metrics.instrument(
        handler_fn(|_req, _w| panic!("handler blew up")),
        resolver(),
    );

    let mut w = ResponseBuffer::new();
    let req = get("/boom");
    let result = catch_unwind(AssertUnwindSafe(|| h.serve(&req, &mut w)));
    assert!(result.is_err());

    let snap = registry.snapshot();
    assert_eq!(snap.counter_value(HTTP_REQUESTS_TOTAL, &["/boom"]), Some(1));
    assert_eq!(snap.counter_value(RESPONSE_STATUS, &["200"]), Some(1));
    assert_eq!(snap.histogram(HTTP_RESPONSE_TIME_SECONDS, &["/boom"]).unwrap().count, 1);
}

#[test]
fn panic_after_status_keeps_that_status() {
    let (registry, metrics) = setup();
    let h = metrics.instrument(
        handler_fn(|_req, w| {
            w.write_status(StatusCode::SERVICE_UNAVAILABLE);
            panic!("late failure");
        }),
        resolver(),
    );

    let mut w = ResponseBuffer::new();
    let req = get("/boom");
    assert!(catch_unwind(AssertUnwindSafe(|| h.serve(&req, &mut w))).is_err());

    assert_eq!(registry.snapshot().counter_value(RESPONSE_STATUS, &["503"]), Some(1));
}

#[test]
fn duration_tracks_handler_time() {
    let (registry, metrics) = setup();
    let h = metrics.instrument(
        handler_fn(|_req, w| {
            std::thread::sleep(Duration::from_millis(60));
            w.write_body(b"done").unwrap();
        }),
        resolver(),
    );

    serve(&h, "/slow");

    let snap = registry.snapshot();
    let hist = snap.histogram(HTTP_RESPONSE_TIME_SECONDS, &["/slow"]).unwrap();
    assert_eq!(hist.count, 1);
    assert!(hist.sum >= 0.060, "sum = {}", hist.sum);
    assert!(hist.sum < 1.0, "sum = {}", hist.sum);

    // 0.05 bucket excludes the sample, 0.1 and above hold it.
    let le = |bound: f64| hist.buckets.iter().find(|(b, _)| *b == bound).unwrap().1;
    assert_eq!(le(0.05), 0);
    assert_eq!(le(10.0), 1);
}

#[test]
fn concurrent_requests_lose_no_updates() {
    const N: usize = 64;
    let (registry, metrics) = setup();
    let h = metrics.instrument(handler_fn(|_req, w| w.write_body(b"ok").unwrap()), resolver());

    std::thread::scope(|s| {
        for _ in 0..N {
            s.spawn(|| serve(&h, "/a"));
        }
    });

    let snap = registry.snapshot();
    assert_eq!(snap.counter_value(HTTP_REQUESTS_TOTAL, &["/a"]), Some(N as u64));
    assert_eq!(snap.counter_value(RESPONSE_STATUS, &["200"]), Some(N as u64));
    assert_eq!(snap.histogram(HTTP_RESPONSE_TIME_SECONDS, &["/a"]).unwrap().count, N as u64);
}

#[test]
fn racing_first_requests_create_one_label_set() {
    const K: usize = 32;
    let (registry, metrics) = setup();
    let h = metrics.instrument(handler_fn(|_req, _w| {}), resolver());
    let barrier = Barrier::new(K);

    std::thread::scope(|s| {
        for i in 0..K {
            let (h, barrier) = (&h, &barrier);
            s.spawn(move || {
                barrier.wait();
                serve(h, &format!("/users/{i}"));
            });
        }
    });

    let snap = registry.snapshot();
    let fam = snap.family(HTTP_REQUESTS_TOTAL).unwrap();
    assert_eq!(fam.samples.len(), 1);
    assert_eq!(fam.counter_value(&["/users/{id}"]), Some(K as u64));
}

#[test]
fn observation_is_transparent() {
    let (_registry, metrics) = setup();
    let raw = handler_fn(|_req, w| {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.append("x-trace", HeaderValue::from_static("a"));
        headers.append("x-trace", HeaderValue::from_static("b"));
        w.write_headers(&headers);
        w.write_status(StatusCode::ACCEPTED);
        w.write_body(b"{\"ok\":").unwrap();
        w.write_body(b"true}").unwrap();
    });
    let raw = Arc::new(raw);
    let observed = metrics.instrument(Arc::clone(&raw), resolver());

    let plain = serve(&raw, "/a");
    let wrapped = serve(&observed, "/a");

    assert_eq!(plain.status(), wrapped.status());
    assert_eq!(plain.headers(), wrapped.headers());
    assert_eq!(plain.body(), wrapped.body());
}

#[test]
fn registries_are_isolated() {
    let (a, metrics_a) = setup();
    let (b, _metrics_b) = setup();
    let h = metrics_a.instrument(handler_fn(|_req, _w| {}), resolver());

    serve(&h, "/a");

    assert_eq!(a.snapshot().counter_value(HTTP_REQUESTS_TOTAL, &["/a"]), Some(1));
    assert_eq!(b.snapshot().counter_value(HTTP_REQUESTS_TOTAL, &["/a"]), None);
}

#[test]
fn conflicting_preregistration_fails_install() {
    let registry = Arc::new(Registry::new());
    registry
        .register(MetricDesc::counter(HTTP_REQUESTS_TOTAL, "other", &["route", "method"]))
        .unwrap();

    let err = HttpMetrics::install(registry, HttpMetricsOptions::default())
        .err()
        .expect("must conflict");
    assert_eq!(err.code(), ErrorCode::AlreadyRegistered);
}
