//! Shared test utilities used across contagion crates.

pub mod tracing {
    //! Recording layer capturing closed spans and emitted events for assertions.
    use std::{
        collections::HashMap,
        fmt,
        sync::{Arc, Mutex, MutexGuard, PoisonError},
    };

    use tracing::{
        Event, Level, Subscriber,
        field::{Field, Visit},
        span::{Attributes, Id, Record},
    };
    use tracing_subscriber::{
        Layer,
        layer::{Context, SubscriberExt},
        registry::LookupSpan,
    };

    /// Layer recording every closed span and every event, in order.
    ///
    /// Clones share the same buffers, so a test can keep one handle while the
    /// subscriber owns another.
    ///
    /// # Examples
    /// ```
    /// use contagion_test_support::tracing::RecordingLayer;
    ///
    /// let (value, layer) = RecordingLayer::capture(|| {
    ///     let _span = tracing::info_span!("engine.step", timestep = 3).entered();
    ///     tracing::warn!(node = 4, "oracle degraded");
    ///     7
    /// });
    /// assert_eq!(value, 7);
    /// assert_eq!(layer.span_names(), ["engine.step"]);
    /// assert_eq!(layer.spans_named("engine.step")[0].field("timestep"), Some("3"));
    /// assert_eq!(layer.events_at(tracing::Level::WARN).len(), 1);
    /// ```
    #[derive(Clone, Default)]
    pub struct RecordingLayer {
        spans: Arc<Mutex<Vec<SpanRecord>>>,
        events: Arc<Mutex<Vec<EventRecord>>>,
    }

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    impl RecordingLayer {
        /// Runs `f` under a registry carrying a fresh layer and returns both.
        #[must_use]
        pub fn capture<T>(f: impl FnOnce() -> T) -> (T, Self) {
            let layer = Self::default();
            let subscriber = tracing_subscriber::registry().with(layer.clone());
            let value = tracing::subscriber::with_default(subscriber, f);
            (value, layer)
        }

        /// Closed spans in completion order.
        #[must_use]
        pub fn spans(&self) -> Vec<SpanRecord> {
            lock(&self.spans).clone()
        }

        /// Names of the closed spans in completion order.
        #[must_use]
        pub fn span_names(&self) -> Vec<String> {
            lock(&self.spans)
                .iter()
                .map(|span| span.name.clone())
                .collect()
        }

        /// Closed spans carrying `name`.
        #[must_use]
        pub fn spans_named(&self, name: &str) -> Vec<SpanRecord> {
            lock(&self.spans)
                .iter()
                .filter(|span| span.name == name)
                .cloned()
                .collect()
        }

        /// Events in emission order.
        #[must_use]
        pub fn events(&self) -> Vec<EventRecord> {
            lock(&self.events).clone()
        }

        /// Events emitted at exactly `level`.
        #[must_use]
        pub fn events_at(&self, level: Level) -> Vec<EventRecord> {
            lock(&self.events)
                .iter()
                .filter(|event| event.level == level)
                .cloned()
                .collect()
        }
    }

    /// A closed span with its recorded fields.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SpanRecord {
        /// Span name from the metadata.
        pub name: String,
        /// Fields recorded at creation or later.
        pub fields: HashMap<String, String>,
    }

    impl SpanRecord {
        /// Rendered value of `name`, if recorded.
        #[must_use]
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields.get(name).map(String::as_str)
        }
    }

    /// An emitted event with its level, target and fields.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct EventRecord {
        /// Event level.
        pub level: Level,
        /// Event target.
        pub target: String,
        /// Fields including `message`.
        pub fields: HashMap<String, String>,
    }

    impl EventRecord {
        /// Rendered value of `name`, if recorded.
        #[must_use]
        pub fn field(&self, name: &str) -> Option<&str> {
            self.fields.get(name).map(String::as_str)
        }

        /// The event's message, if any.
        #[must_use]
        pub fn message(&self) -> Option<&str> {
            self.field("message")
        }
    }

    struct OpenSpan(SpanRecord);

    impl<S> Layer<S> for RecordingLayer
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            let mut record = SpanRecord {
                name: attrs.metadata().name().to_owned(),
                fields: HashMap::new(),
            };
            attrs.record(&mut FieldRecorder(&mut record.fields));
            span.extensions_mut().insert(OpenSpan(record));
        }

        fn on_record(&self, id: &Id, values: &Record<'_>, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(id) else {
                return;
            };
            if let Some(OpenSpan(record)) = span.extensions_mut().get_mut::<OpenSpan>() {
                values.record(&mut FieldRecorder(&mut record.fields));
            }
        }

        fn on_close(&self, id: Id, ctx: Context<'_, S>) {
            let Some(span) = ctx.span(&id) else {
                return;
            };
            if let Some(OpenSpan(record)) = span.extensions_mut().remove::<OpenSpan>() {
                lock(&self.spans).push(record);
            }
        }

        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            let mut fields = HashMap::new();
            event.record(&mut FieldRecorder(&mut fields));
            lock(&self.events).push(EventRecord {
                level: *event.metadata().level(),
                target: event.metadata().target().to_owned(),
                fields,
            });
        }
    }

    struct FieldRecorder<'a>(&'a mut HashMap<String, String>);

    impl Visit for FieldRecorder<'_> {
        fn record_str(&mut self, field: &Field, value: &str) {
            self.0.insert(field.name().to_owned(), value.to_owned());
        }

        fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }

        fn record_f64(&mut self, field: &Field, value: f64) {
            self.0.insert(field.name().to_owned(), value.to_string());
        }

        // Integers and booleans reach this through the default visitors and
        // render identically under `Debug` and `Display`.
        fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
            self.0.insert(field.name().to_owned(), format!("{value:?}"));
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn nested_spans_close_inner_first() {
            let ((), layer) = RecordingLayer::capture(|| {
                let _outer = tracing::info_span!("engine.run").entered();
                let _inner = tracing::info_span!("engine.step", timestep = 0).entered();
            });
            assert_eq!(layer.span_names(), ["engine.step", "engine.run"]);
        }

        #[test]
        fn late_recorded_fields_are_kept() {
            let ((), layer) = RecordingLayer::capture(|| {
                let span = tracing::info_span!("graph.build", nodes = tracing::field::Empty);
                span.record("nodes", 12_u64);
            });
            let spans = layer.spans_named("graph.build");
            assert_eq!(spans.len(), 1);
            assert_eq!(spans[0].field("nodes"), Some("12"));
        }

        #[test]
        fn events_keep_message_and_fields() {
            let ((), layer) = RecordingLayer::capture(|| {
                tracing::debug!(dropped = 2_u64, ratio = 0.5, "links dropped");
            });
            let events = layer.events_at(Level::DEBUG);
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].message(), Some("links dropped"));
            assert_eq!(events[0].field("dropped"), Some("2"));
            assert_eq!(events[0].field("ratio"), Some("0.5"));
        }
    }
}

pub mod ci;
