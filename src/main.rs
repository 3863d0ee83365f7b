use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use serde_json::json;

use crumbtrail::host::{Callback, FetchArg, FetchInit, FetchOutcome, Host, Listener, Target, Thrown};
use crumbtrail::{init, CapturedEvent, SdkConfig, Transport};

/// Demo transport: pretty-prints every captured event to stdout.
struct LogTransport;

impl Transport for LogTransport {
    fn send(&self, event: CapturedEvent) {
        match serde_json::to_string_pretty(&event) {
            Ok(body) => println!("[REPORT]\n{body}"),
            Err(err) => tracing::warn!(%err, "event serialization failed"),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    tracing::info!("crumbtrail demo session starting");

    let host = Host::builder().location("https://app.example/dashboard").build();
    let config = SdkConfig {
        report_endpoint: Some("ingest.example".to_string()),
        ..SdkConfig::default()
    };
    let client = init(&host, &config, Rc::new(LogTransport));

    // A small page: a form holding a submit button and a search field.
    let document = Target::new("Document", "document");
    let form = Target::with_parent("HTMLFormElement", "body > form#search", &document);
    let button = Target::with_parent("HTMLButtonElement", "body > form#search > button[type=\"submit\"]", &form);
    let field = Target::with_parent("HTMLInputElement", "body > form#search > input[name=\"q\"]", &form);

    host.add_event_listener(
        &button,
        "click",
        &Listener::Function(Callback::named("onSubmitClick", |_| Ok(()))),
    );
    host.add_event_listener(
        &field,
        "keypress",
        &Listener::Function(Callback::named("onSearchKey", |_| Ok(()))),
    );

    // Typing, then a click, then more typing. The debounce window turns the
    // keypress bursts into two ui.input crumbs around the ui.click.
    for _ in 0..3 {
        host.dispatch_event(&field, "keypress");
        host.wheel().run_for(Duration::from_millis(40)).await;
    }
    host.dispatch_event(&button, "click");
    host.dispatch_event(&field, "keypress");
    host.wheel().run_for(Duration::from_millis(200)).await;

    // One XHR round trip, body preserved in the hint only.
    let request = host.new_xhr();
    host.xhr_open(&request, "post", "https://api.example/search");
    host.xhr_send(&request, Some(r#"{"q":"breadcrumbs"}"#));
    host.complete_xhr(&request, 200);

    // One fetch, one navigation.
    if let Some(handle) = host.fetch(
        &FetchArg::Url("https://api.example/suggest".to_string()),
        &FetchInit::default(),
    ) {
        handle.settle(FetchOutcome::Response { status: 200 });
    }
    host.push_state(Some(&json!("https://app.example/results")));

    // A handler that throws: captured with a mechanism descriptor, and the
    // trail above rides along as breadcrumbs.
    host.add_event_listener(
        &button,
        "click",
        &Listener::Function(Callback::named("brokenHandler", |_| {
            Err(Thrown::new("TypeError", "results is undefined"))
        })),
    );
    host.dispatch_event(&button, "click");

    client.capture_message("demo session complete");
    tracing::info!(location = host.location(), "crumbtrail demo session finished");
    Ok(())
}
