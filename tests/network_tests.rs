use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;

use crumbtrail::host::{Callback, FetchArg, FetchInit, FetchOutcome, FetchRequest, Host};
use crumbtrail::{init, CapturedEvent, Category, Client, CrumbKind, EventName, SdkConfig, Transport};

struct CollectingTransport {
    events: Rc<RefCell<Vec<CapturedEvent>>>,
}

impl Transport for CollectingTransport {
    fn send(&self, event: CapturedEvent) {
        self.events.borrow_mut().push(event);
    }
}

fn setup(config: SdkConfig) -> (Host, Rc<Client>, Rc<RefCell<Vec<CapturedEvent>>>) {
    let host = Host::new();
    let events = Rc::new(RefCell::new(Vec::new()));
    let client = init(
        &host,
        &config,
        Rc::new(CollectingTransport { events: events.clone() }),
    );
    (host, client, events)
}

#[test]
fn completed_xhr_produces_one_http_crumb() {
    let (host, client, _) = setup(SdkConfig::default());

    let request = host.new_xhr();
    host.xhr_open(&request, "post", "https://api.example/search");
    host.xhr_send(&request, Some(r#"{"q":"foo"}"#));
    host.complete_xhr(&request, 200);

    let crumbs = client.scope().borrow().breadcrumbs();
    assert_eq!(crumbs.len(), 1, "only the terminal state leaves a crumb");
    let crumb = &crumbs[0];
    assert_eq!(crumb.category, Category::Xhr);
    assert_eq!(crumb.kind, Some(CrumbKind::Http));
    assert_eq!(crumb.data["method"], json!("POST"), "method is normalized to uppercase");
    assert_eq!(crumb.data["url"], json!("https://api.example/search"));
    assert_eq!(crumb.data["status_code"], json!(200));
}

#[test]
fn request_body_stays_in_the_hint() {
    let (host, client, _) = setup(SdkConfig::default());

    let request = host.new_xhr();
    host.xhr_open(&request, "POST", "https://api.example/search");
    host.xhr_send(&request, Some(r#"{"q":"foo"}"#));
    host.complete_xhr(&request, 200);

    let entries = client.scope().borrow().entries();
    assert_eq!(entries.len(), 1);
    let (crumb, hint) = &entries[0];
    assert_eq!(hint.input.as_deref(), Some(r#"{"q":"foo"}"#));
    assert!(
        !crumb.data.contains_key("body"),
        "the raw body never lands on the durable crumb"
    );
}

#[test]
fn xhr_without_user_handler_still_leaves_a_crumb() {
    let (host, client, _) = setup(SdkConfig::default());

    let request = host.new_xhr();
    host.xhr_open(&request, "GET", "https://api.example/ping");
    host.xhr_send(&request, None);
    assert!(request.sent());
    host.complete_xhr(&request, 204);

    assert_eq!(client.scope().borrow().len(), 1);
}

#[test]
fn user_handler_fires_once_per_state() {
    let (host, client, _) = setup(SdkConfig::default());

    let request = host.new_xhr();
    host.xhr_open(&request, "GET", "https://api.example/ping");
    host.xhr_send(&request, None);

    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    host.xhr_on_ready_state_change(
        &request,
        &Callback::named("onReady", move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        }),
    );

    // The host redelivers the terminal state; the handler must not see it twice.
    host.fire_xhr_ready_state(&request, 4, 200);
    host.fire_xhr_ready_state(&request, 4, 200);

    assert_eq!(count.get(), 1, "one delivery per distinct ready state");
    assert_eq!(client.scope().borrow().len(), 1, "one crumb per terminal state");
}

#[test]
fn reporting_endpoint_requests_leave_no_trace() {
    let config = SdkConfig {
        report_endpoint: Some("ingest.example".to_string()),
        ..SdkConfig::default()
    };
    let (host, client, _) = setup(config);

    // Raw instrumentation events must not leak either, not just crumbs.
    let opens = Rc::new(Cell::new(0u32));
    let counter = opens.clone();
    client.dispatcher().subscribe(
        EventName::XhrOpen,
        Rc::new(move |_| counter.set(counter.get() + 1)),
    );

    let request = host.new_xhr();
    host.xhr_open(&request, "POST", "https://ingest.example/store");
    host.xhr_send(&request, Some("payload"));
    host.complete_xhr(&request, 200);

    if let Some(handle) = host.fetch(
        &FetchArg::Url("https://ingest.example/store".to_string()),
        &FetchInit::default(),
    ) {
        handle.settle(FetchOutcome::Response { status: 200 });
    }

    assert_eq!(opens.get(), 0, "reporting traffic must not publish open events");
    assert!(
        client.scope().borrow().is_empty(),
        "the SDK's own reporting traffic never becomes breadcrumbs"
    );
}

#[test]
fn ordinary_requests_still_publish_open_events() {
    let config = SdkConfig {
        report_endpoint: Some("ingest.example".to_string()),
        ..SdkConfig::default()
    };
    let (host, client, _) = setup(config);

    let opens = Rc::new(Cell::new(0u32));
    let counter = opens.clone();
    client.dispatcher().subscribe(
        EventName::XhrOpen,
        Rc::new(move |_| counter.set(counter.get() + 1)),
    );

    let request = host.new_xhr();
    host.xhr_open(&request, "GET", "https://api.example/ping");

    assert_eq!(opens.get(), 1, "the guard only filters the reporting endpoint");
}

#[test]
fn settled_fetch_produces_http_crumb() {
    let (host, client, _) = setup(SdkConfig::default());

    let handle = host
        .fetch(
            &FetchArg::Url("https://api.example/suggest".to_string()),
            &FetchInit::default(),
        )
        .unwrap();
    assert!(client.scope().borrow().is_empty(), "no crumb before settlement");

    handle.settle(FetchOutcome::Response { status: 200 });

    let crumbs = client.scope().borrow().breadcrumbs();
    assert_eq!(crumbs.len(), 1);
    assert_eq!(crumbs[0].category, Category::Fetch);
    assert_eq!(crumbs[0].kind, Some(CrumbKind::Http));
    assert_eq!(crumbs[0].data["method"], json!("GET"), "method defaults to GET");
    assert_eq!(crumbs[0].data["status_code"], json!(200));
}

#[test]
fn failed_fetch_records_the_error_instead_of_a_status() {
    let (host, client, _) = setup(SdkConfig::default());

    let handle = host
        .fetch(
            &FetchArg::Url("https://api.example/suggest".to_string()),
            &FetchInit::default(),
        )
        .unwrap();
    handle.settle(FetchOutcome::Error {
        message: "network unreachable".to_string(),
    });

    let crumbs = client.scope().borrow().breadcrumbs();
    assert_eq!(crumbs[0].data["error"], json!("network unreachable"));
    assert!(!crumbs[0].data.contains_key("status_code"));
}

#[test]
fn fetch_method_resolution_prefers_init_over_request() {
    let (host, client, _) = setup(SdkConfig::default());

    let arg = FetchArg::Request(FetchRequest {
        method: "post".to_string(),
        url: "https://api.example/items".to_string(),
    });
    let handle = host
        .fetch(
            &arg,
            &FetchInit {
                method: Some("put".to_string()),
            },
        )
        .unwrap();
    handle.settle(FetchOutcome::Response { status: 201 });

    let crumbs = client.scope().borrow().breadcrumbs();
    assert_eq!(crumbs[0].data["method"], json!("PUT"));
    assert_eq!(crumbs[0].data["url"], json!("https://api.example/items"));
}

#[test]
fn fetch_with_non_string_argument_is_coerced() {
    let (host, client, _) = setup(SdkConfig::default());

    let handle = host
        .fetch(&FetchArg::Other(json!(123)), &FetchInit::default())
        .unwrap();
    handle.settle(FetchOutcome::Response { status: 200 });

    let crumbs = client.scope().borrow().breadcrumbs();
    assert_eq!(crumbs[0].data["url"], json!("123"), "odd arguments coerce, never throw");
}

#[test]
fn navigation_crumb_carries_from_and_to() {
    let (host, client, _) = setup(SdkConfig::default());

    host.push_state(Some(&json!("https://app.example/results")));

    let crumbs = client.scope().borrow().breadcrumbs();
    assert_eq!(crumbs.len(), 1);
    assert_eq!(crumbs[0].category, Category::Navigation);
    assert_eq!(crumbs[0].data["from"], json!("http://localhost/"));
    assert_eq!(crumbs[0].data["to"], json!("https://app.example/results"));
}

#[test]
fn replace_state_is_instrumented_like_push_state() {
    let (host, client, _) = setup(SdkConfig::default());

    host.replace_state(Some(&json!("https://app.example/settings")));

    let crumbs = client.scope().borrow().breadcrumbs();
    assert_eq!(crumbs[0].data["to"], json!("https://app.example/settings"));
    assert_eq!(host.location(), "https://app.example/settings");
}

#[test]
fn navigation_without_url_keeps_the_location() {
    let (host, client, _) = setup(SdkConfig::default());

    host.push_state(None);

    let crumbs = client.scope().borrow().breadcrumbs();
    assert_eq!(crumbs.len(), 1);
    assert_eq!(crumbs[0].data["from"], crumbs[0].data["to"]);
    assert_eq!(host.location(), "http://localhost/");
}

#[test]
fn non_string_navigation_url_is_coerced() {
    let (host, client, _) = setup(SdkConfig::default());

    host.push_state(Some(&json!(42)));

    let crumbs = client.scope().borrow().breadcrumbs();
    assert_eq!(crumbs[0].data["to"], json!("42"));
    assert_eq!(host.location(), "42");
}
