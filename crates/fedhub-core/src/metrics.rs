//! Observability ports for the trust/validation components.
//!
//! Components take a [`SignatureMetrics`] handle at construction rather
//! than writing to process-global counters, so the metrics lifecycle is
//! owned by application startup and tests can observe increments directly.

use prometheus::{CounterVec, Opts, Registry};
use thiserror::Error;

/// Label value recorded when a trusted candidate credential fails to
/// verify a signature during the fallback pass.
pub const VERIFICATION_FAILED: &str = "verification_failed";

/// Errors that can occur while registering metrics.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Failed to register a metric with the Prometheus registry.
    #[error("failed to register metric: {0}")]
    RegistrationFailed(#[from] prometheus::Error),
}

/// Result type for metrics operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Port for reporting signature-verification failures.
///
/// Incremented once per trusted candidate credential that fails to verify
/// during the fallback pass, labelled by failure type. This is a
/// first-class output of signature trust evaluation: it distinguishes
/// "no candidate worked" from configuration problems at the metrics layer.
pub trait SignatureMetrics: Send + Sync {
    /// Records one signature-verification failure of the given type.
    fn verification_failure(&self, error_type: &str);
}

/// A metrics implementation that discards every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl SignatureMetrics for NoopMetrics {
    fn verification_failure(&self, _error_type: &str) {}
}

/// Prometheus-backed [`SignatureMetrics`].
#[derive(Clone)]
pub struct PrometheusSignatureMetrics {
    /// Verification failures by `error_type`.
    failures: CounterVec,
}

impl PrometheusSignatureMetrics {
    /// Creates the signature metrics and registers them with `registry`.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter cannot be registered (for example,
    /// a duplicate registration).
    pub fn new(registry: &Registry) -> MetricsResult<Self> {
        let failures = CounterVec::new(
            Opts::new(
                "fedhub_signature_verifying_error_total",
                "Signature verification errors against trusted credentials, by error type",
            ),
            &["error_type"],
        )?;
        registry.register(Box::new(failures.clone()))?;
        Ok(Self { failures })
    }

    /// Returns the current count for the given error type.
    ///
    /// Intended for tests and diagnostics.
    #[must_use]
    pub fn failure_count(&self, error_type: &str) -> f64 {
        self.failures.with_label_values(&[error_type]).get()
    }
}

impl SignatureMetrics for PrometheusSignatureMetrics {
    fn verification_failure(&self, error_type: &str) {
        self.failures.with_label_values(&[error_type]).inc();
    }
}
