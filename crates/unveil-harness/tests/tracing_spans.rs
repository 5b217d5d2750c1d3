#![forbid(unsafe_code)]

//! Integration test: controller transitions are visible as tracing spans.

use std::sync::{Arc, Mutex};

use tracing::span::{Attributes, Id};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use unveil_harness::Stage;

#[derive(Clone, Default)]
struct SpanNames(Arc<Mutex<Vec<&'static str>>>);

impl<S: tracing::Subscriber> Layer<S> for SpanNames {
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        self.0.lock().unwrap().push(attrs.metadata().name());
    }
}

#[test]
fn modal_lifecycle_emits_spans() {
    let names = SpanNames::default();
    let subscriber = tracing_subscriber::registry().with(names.clone());

    tracing::subscriber::with_default(subscriber, || {
        let mut stage = Stage::new();
        let mut modal = stage.modal(false);
        modal.set_open(true, &mut stage.doc);
        modal.mount(&mut stage.doc);
        stage.timelines.latest().unwrap().run_forward();
        modal.pump(&mut stage.doc);
        modal.set_open(false, &mut stage.doc);
    });

    let seen = names.0.lock().unwrap().clone();
    for expected in ["visibility_set_open", "visibility_mount", "visibility_event"] {
        assert!(seen.contains(&expected), "missing span {expected}: {seen:?}");
    }
    assert_eq!(
        seen.iter().filter(|n| **n == "visibility_set_open").count(),
        2
    );
}
