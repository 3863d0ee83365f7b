use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crumbtrail::host::{Callback, Host, Listener, Target, Thrown};
use crumbtrail::instrument;
use crumbtrail::{init, CapturedEvent, Category, Client, SdkConfig, Transport};

struct CollectingTransport {
    events: Rc<RefCell<Vec<CapturedEvent>>>,
}

impl Transport for CollectingTransport {
    fn send(&self, event: CapturedEvent) {
        self.events.borrow_mut().push(event);
    }
}

fn setup_host(host: &Host, config: SdkConfig) -> (Rc<Client>, Rc<RefCell<Vec<CapturedEvent>>>) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let client = init(
        host,
        &config,
        Rc::new(CollectingTransport { events: events.clone() }),
    );
    (client, events)
}

fn counting_callback(count: &Rc<Cell<u32>>) -> Callback {
    let count = count.clone();
    Callback::new(move |_| {
        count.set(count.get() + 1);
        Ok(())
    })
}

#[test]
fn thrown_handler_is_captured_with_mechanism() {
    let host = Host::new();
    let (_client, events) = setup_host(&host, SdkConfig::default());
    let button = Target::new("HTMLButtonElement", "body > button#buy");

    host.add_event_listener(
        &button,
        "click",
        &Listener::Function(Callback::named("brokenHandler", |_| {
            Err(Thrown::new("TypeError", "results is undefined"))
        })),
    );
    host.dispatch_event(&button, "click");

    let events = events.borrow();
    assert_eq!(events.len(), 1, "the throw should produce one captured event");
    let exception = events[0].exception.as_ref().unwrap();
    assert_eq!(exception.kind, "TypeError");
    assert_eq!(exception.value, "results is undefined");

    let mechanism = exception.mechanism.as_ref().unwrap();
    assert_eq!(mechanism.kind, "instrument");
    assert!(mechanism.handled);
    assert_eq!(mechanism.data.function, "addEventListener");
    assert_eq!(mechanism.data.handler, "brokenHandler");
    assert_eq!(mechanism.data.target.as_deref(), Some("HTMLButtonElement"));

    // The click crumb lands before the capture snapshot.
    assert_eq!(
        events[0].breadcrumbs.last().map(|c| c.category),
        Some(Category::UiClick)
    );
}

#[test]
fn anonymous_handler_gets_sentinel_name() {
    let host = Host::new();
    let (_client, events) = setup_host(&host, SdkConfig::default());
    let button = Target::new("HTMLButtonElement", "body > button");

    host.add_event_listener(
        &button,
        "click",
        &Listener::Function(Callback::new(|_| Err(Thrown::error("boom")))),
    );
    host.dispatch_event(&button, "click");

    let events = events.borrow();
    let mechanism = events[0].exception.as_ref().unwrap().mechanism.as_ref().unwrap();
    assert_eq!(mechanism.data.handler, "<anonymous>");
}

#[test]
fn listener_removed_via_original_reference() {
    let host = Host::new();
    let (client, events) = setup_host(&host, SdkConfig::default());
    let button = Target::new("HTMLButtonElement", "body > button");

    let original = Callback::named("onClick", |_| Err(Thrown::error("should never run")));
    host.add_event_listener(&button, "click", &Listener::Function(original.clone()));
    assert_eq!(button.listener_count(), 1);

    // The caller never saw the wrapper; removal with the original must work.
    host.remove_event_listener(&button, "click", &Listener::Function(original));
    assert_eq!(button.listener_count(), 0, "removal via the original reference must land");

    host.dispatch_event(&button, "click");
    assert!(client.scope().borrow().is_empty(), "no crumb after removal");
    assert!(events.borrow().is_empty(), "no capture after removal");
}

#[test]
fn double_registration_reuses_the_wrapper() {
    let host = Host::new();
    let (_client, events) = setup_host(&host, SdkConfig::default());
    let button = Target::new("HTMLButtonElement", "body > button");

    let count = Rc::new(Cell::new(0));
    let callback = counting_callback(&count);
    host.add_event_listener(&button, "click", &Listener::Function(callback.clone()));
    host.add_event_listener(&button, "click", &Listener::Function(callback));

    host.dispatch_event(&button, "click");

    assert_eq!(count.get(), 2, "both registrations should fire");
    assert!(
        events.borrow().is_empty(),
        "a clean handler should not produce captures"
    );
    // One wrapper for both registrations: one dispatched event, one crumb.
    // A nested wrapper would have published a second crumb event.
}

#[test]
fn handle_event_listener_style_is_wrapped_too() {
    let host = Host::new();
    let (_client, events) = setup_host(&host, SdkConfig::default());
    let button = Target::new("HTMLButtonElement", "body > button");

    host.add_event_listener(
        &button,
        "click",
        &Listener::HandleEvent {
            type_name: "ClickController".to_string(),
            callback: Callback::named("handleEvent", |_| Err(Thrown::error("controller failed"))),
        },
    );
    host.dispatch_event(&button, "click");

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    let mechanism = events[0].exception.as_ref().unwrap().mechanism.as_ref().unwrap();
    assert_eq!(mechanism.data.handler, "handleEvent");
    assert_eq!(
        mechanism.data.target.as_deref(),
        Some("ClickController"),
        "the listener object, not the node, is the receiver"
    );
}

#[test]
fn global_listener_falls_back_to_the_default_target() {
    let host = Host::new();
    let (client, events) = setup_host(&host, SdkConfig::default());
    let button = Target::new("HTMLButtonElement", "body > button");

    host.add_global_listener(
        "click",
        &Listener::Function(Callback::named("globalClick", |_| {
            Err(Thrown::error("global handler failed"))
        })),
    );
    host.dispatch_event(&button, "click");

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    let mechanism = events[0].exception.as_ref().unwrap().mechanism.as_ref().unwrap();
    assert_eq!(
        mechanism.data.target.as_deref(),
        Some("EventTarget"),
        "no receiver at the global scope, so the default target applies"
    );
    assert_eq!(client.scope().borrow().len(), 1, "global handlers still leave crumbs");
}

#[test]
fn global_listener_can_be_removed_via_original() {
    let host = Host::new();
    let (client, _) = setup_host(&host, SdkConfig::default());
    let button = Target::new("HTMLButtonElement", "body > button");

    let original = Callback::named("globalClick", |_| Ok(()));
    host.add_global_listener("click", &Listener::Function(original.clone()));
    assert_eq!(host.global_listener_count(), 1);

    host.remove_global_listener("click", &Listener::Function(original));
    assert_eq!(host.global_listener_count(), 0);

    host.dispatch_event(&button, "click");
    assert!(client.scope().borrow().is_empty());
}

#[test]
fn removing_one_of_two_registrations_keeps_the_other() {
    let host = Host::new();
    let (_client, _) = setup_host(&host, SdkConfig::default());
    let button = Target::new("HTMLButtonElement", "body > button");

    let count = Rc::new(Cell::new(0));
    let callback = counting_callback(&count);
    let listener = Listener::Function(callback);
    host.add_event_listener(&button, "click", &listener);
    host.add_event_listener(&button, "click", &listener);
    assert_eq!(button.listener_count(), 2);

    host.remove_event_listener(&button, "click", &listener);
    assert_eq!(button.listener_count(), 1, "one removal drops one registration");

    host.dispatch_event(&button, "click");
    assert_eq!(count.get(), 1, "the remaining registration still fires");

    host.remove_event_listener(&button, "click", &listener);
    assert_eq!(button.listener_count(), 0);
}

#[test]
fn timer_callback_throw_is_captured() {
    let host = Host::new();
    let (_client, events) = setup_host(&host, SdkConfig::default());

    let callback = Callback::named("tick", |_| Err(Thrown::error("timer boom")));
    host.set_timeout(&callback, 50, None);
    host.advance(60);

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    let mechanism = events[0].exception.as_ref().unwrap().mechanism.as_ref().unwrap();
    assert_eq!(mechanism.data.function, "setTimeout");
    assert_eq!(mechanism.data.handler, "tick");
    assert!(mechanism.data.target.is_none(), "timers carry no event target");
}

#[test]
fn interval_repeats_until_cleared() {
    let host = Host::new();
    let (_client, _) = setup_host(&host, SdkConfig::default());

    let count = Rc::new(Cell::new(0));
    let handle = host
        .set_interval(&counting_callback(&count), 50, None)
        .unwrap();

    host.advance(120);
    assert_eq!(count.get(), 2, "interval should fire at 50ms and 100ms");

    host.clear_timer(handle);
    host.advance(200);
    assert_eq!(count.get(), 2, "cleared interval must not fire again");
}

#[test]
fn animation_frame_callback_is_guarded() {
    let host = Host::new();
    let (_client, events) = setup_host(&host, SdkConfig::default());

    let callback = Callback::named("paint", |_| Err(Thrown::error("raf boom")));
    host.request_animation_frame(&callback, None);
    host.advance(20);

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    let mechanism = events[0].exception.as_ref().unwrap().mechanism.as_ref().unwrap();
    assert_eq!(mechanism.data.function, "requestAnimationFrame");
}

#[test]
fn absent_surface_skips_only_that_interceptor() {
    let host = Host::builder().without_fetch().build();
    let (client, _) = setup_host(&host, SdkConfig::default());
    let button = Target::new("HTMLButtonElement", "body > button");
    host.add_event_listener(&button, "click", &Listener::Function(Callback::new(|_| Ok(()))));

    assert!(
        host.fetch(
            &crumbtrail::host::FetchArg::Url("https://api.example/".to_string()),
            &crumbtrail::host::FetchInit::default(),
        )
        .is_none(),
        "absent surface stays absent"
    );

    // The other interceptors installed anyway.
    host.dispatch_event(&button, "click");
    assert_eq!(client.scope().borrow().len(), 1);
}

#[test]
fn uninstall_restores_native_behavior() {
    let host = Host::new();
    let (client, events) = setup_host(&host, SdkConfig::default());
    instrument::uninstall(&host);

    let button = Target::new("HTMLButtonElement", "body > button");
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();
    host.add_event_listener(
        &button,
        "click",
        &Listener::Function(Callback::new(move |_| {
            counter.set(counter.get() + 1);
            Err(Thrown::error("unobserved"))
        })),
    );
    host.dispatch_event(&button, "click");

    assert_eq!(count.get(), 1, "native registration still delivers events");
    assert!(events.borrow().is_empty(), "no captures after uninstall");
    assert!(client.scope().borrow().is_empty(), "no crumbs after uninstall");
}

#[test]
fn disabled_interceptors_are_never_installed() {
    let host = Host::new();
    let config = SdkConfig {
        instrument_dom: false,
        ..SdkConfig::default()
    };
    let (client, _) = setup_host(&host, config);

    let button = Target::new("HTMLButtonElement", "body > button");
    host.add_event_listener(&button, "click", &Listener::Function(Callback::new(|_| Ok(()))));
    host.dispatch_event(&button, "click");

    assert!(client.scope().borrow().is_empty(), "dom interceptor was disabled");
}
