//! Metrics for completion calls.
//!
//! OpenTelemetry instruments on the global meter. With no meter provider
//! installed they are no-ops.

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::OnceLock;

static METRICS: OnceLock<LlmMetrics> = OnceLock::new();

/// Metrics for completion calls, labelled by provider family and model.
#[derive(Clone)]
pub struct LlmMetrics {
    _meter: Meter,
    /// Total completion requests
    pub requests: Counter<u64>,
    /// Failed completion requests, labelled by classification
    pub errors: Counter<u64>,
    /// Call duration in seconds
    pub duration: Histogram<f64>,
    /// Input tokens
    pub input_tokens: Counter<u64>,
    /// Output tokens
    pub output_tokens: Counter<u64>,
    /// Escalations from a primary to a fallback model
    pub fallbacks: Counter<u64>,
}

impl LlmMetrics {
    fn init() -> Self {
        let meter = global::meter("lectern_llm");

        Self {
            _meter: meter.clone(),
            requests: meter
                .u64_counter("lectern.llm.requests")
                .with_description("Total completion requests")
                .build(),
            errors: meter
                .u64_counter("lectern.llm.errors")
                .with_description("Failed completion requests")
                .build(),
            duration: meter
                .f64_histogram("lectern.llm.duration")
                .with_unit("seconds")
                .with_description("Completion call duration")
                .build(),
            input_tokens: meter
                .u64_counter("lectern.llm.tokens.input")
                .with_description("Input tokens used")
                .build(),
            output_tokens: meter
                .u64_counter("lectern.llm.tokens.output")
                .with_description("Output tokens used")
                .build(),
            fallbacks: meter
                .u64_counter("lectern.llm.fallbacks")
                .with_description("Primary model failures escalated to the fallback model")
                .build(),
        }
    }

    /// Get the global instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a successful call.
    pub fn record_request(&self, provider: &str, model: &str, duration_secs: f64) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
        ];
        self.requests.add(1, labels);
        self.duration.record(duration_secs, labels);
    }

    /// Record a failed call.
    pub fn record_error(&self, provider: &str, model: &str, classification: &'static str) {
        let labels = &[
            KeyValue::new("provider", provider.to_string()),
            KeyValue::new("model", model.to_string()),
            KeyValue::new("classification", classification),
        ];
        self.errors.add(1, labels);
    }

    /// Record token usage.
    pub fn record_tokens(&self, model: &str, input: u64, output: u64) {
        let labels = &[KeyValue::new("model", model.to_string())];
        self.input_tokens.add(input, labels);
        self.output_tokens.add(output, labels);
    }

    /// Record an escalation to the fallback model.
    pub fn record_fallback(&self, primary: &str, fallback: &str) {
        self.fallbacks.add(
            1,
            &[
                KeyValue::new("primary", primary.to_string()),
                KeyValue::new("fallback", fallback.to_string()),
            ],
        );
    }
}

impl Default for LlmMetrics {
    fn default() -> Self {
        Self::get().clone()
    }
}
