#![forbid(unsafe_code)]

//! Structured log output of the engine.
//!
//! Every state transition is a `debug` event with `from` and `to` fields;
//! every dispatched `slip:*` event is logged with its type and whether it was
//! allowed. Input-driven work happens inside a `slip.input` span, timer-driven
//! work outside of it.
//!
//! Run:
//!   cargo test -p slip-harness --test tracing_capture

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use slip_core::{SlipConfig, SlipEventKind};
use slip_harness::{GestureDriver, list_fixture};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Capture layer
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedEvent {
    level: tracing::Level,
    message: String,
    fields: HashMap<String, String>,
    parent_span_name: Option<String>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

struct CaptureHandle {
    events: Arc<Mutex<Vec<CapturedEvent>>>,
}

impl CaptureHandle {
    fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().unwrap().clone()
    }

    fn with_message(&self, message: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.message == message)
            .collect()
    }

    /// `(from, to)` of every logged state transition, in order.
    fn transitions(&self) -> Vec<(String, String)> {
        self.with_message("gesture state transition")
            .into_iter()
            .map(|event| (event.fields["from"].clone(), event.fields["to"].clone()))
            .collect()
    }
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.0.push((field.name().to_string(), value.to_string()));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for EventCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, ctx: tracing_subscriber::layer::Context<'_, S>) {
        let mut visitor = FieldVisitor(Vec::new());
        event.record(&mut visitor);

        let fields: HashMap<String, String> = visitor.0.into_iter().collect();
        let message = fields.get("message").cloned().unwrap_or_default();
        let parent_span_name = ctx
            .event_span(event)
            .map(|span_ref| span_ref.name().to_string());

        self.events.lock().unwrap().push(CapturedEvent {
            level: *event.metadata().level(),
            message,
            fields,
            parent_span_name,
        });
    }
}

fn with_captured_events<F>(f: F) -> CaptureHandle
where
    F: FnOnce(),
{
    let events = Arc::new(Mutex::new(Vec::new()));
    let layer = EventCapture {
        events: events.clone(),
    };
    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::filter::LevelFilter::TRACE)
        .with(layer);
    tracing::subscriber::with_default(subscriber, f);
    CaptureHandle { events }
}

fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
    list.iter()
        .map(|(from, to)| ((*from).to_owned(), (*to).to_owned()))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn tap_logs_two_transitions_inside_input_spans() {
    let handle = with_captured_events(|| {
        let (dom, list) = list_fixture(3);
        let mut drv = GestureDriver::new(dom, list.container, SlipConfig::default()).unwrap();
        drv.tap(list.rows[0], 10);
    });

    assert_eq!(
        handle.transitions(),
        pairs(&[("Idle", "Undecided"), ("Undecided", "Idle")])
    );
    for event in handle.with_message("gesture state transition") {
        assert_eq!(event.level, tracing::Level::DEBUG);
        assert_eq!(event.parent_span_name.as_deref(), Some("slip.input"));
    }
}

#[test]
fn hold_transition_is_timer_driven() {
    let handle = with_captured_events(|| {
        let (dom, list) = list_fixture(3);
        let mut drv = GestureDriver::new(dom, list.container, SlipConfig::default()).unwrap();
        drv.mouse_down(list.rows[1]);
        drv.wait(300);
        drv.mouse_up();
    });

    assert_eq!(
        handle.transitions(),
        pairs(&[
            ("Idle", "Undecided"),
            ("Undecided", "Reordering"),
            ("Reordering", "Idle"),
        ])
    );
    let hold = &handle.with_message("gesture state transition")[1];
    assert_eq!(hold.parent_span_name, None);
}

#[test]
fn dispatched_events_are_logged_with_veto_outcome() {
    let handle = with_captured_events(|| {
        let (dom, list) = list_fixture(3);
        let mut drv = GestureDriver::new(dom, list.container, SlipConfig::default()).unwrap();
        drv.dom.veto(SlipEventKind::Tap);
        drv.tap(list.rows[2], 10);
    });

    let dispatched = handle.with_message("slip event dispatched");
    let summary: Vec<(&str, &str)> = dispatched
        .iter()
        .map(|event| (event.fields["event"].as_str(), event.fields["allowed"].as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![("slip:beforewait", "true"), ("slip:tap", "false")]
    );
}

#[test]
fn swipe_release_logs_velocity_decision() {
    let handle = with_captured_events(|| {
        let (dom, list) = list_fixture(3);
        let mut drv = GestureDriver::new(dom, list.container, SlipConfig::default()).unwrap();
        drv.fling(list.rows[1], 30.0);
    });

    let released = handle.with_message("swipe released");
    assert_eq!(released.len(), 1);
    assert_eq!(released[0].fields["swiped"], "true");
    assert_eq!(released[0].fields["elapsed_ms"], "140");
}

#[test]
fn attach_and_detach_are_logged() {
    let handle = with_captured_events(|| {
        let (dom, list) = list_fixture(2);
        let mut drv = GestureDriver::new(dom, list.container, SlipConfig::default()).unwrap();
        drv.detach();
    });

    assert_eq!(handle.with_message("slip attached").len(), 1);
    assert_eq!(handle.with_message("slip detached").len(), 1);
}
