//! # fedhub-core
//!
//! Core utilities for the fedhub identity hub: configuration loading and
//! the observability ports shared by the trust/validation components.
//!
//! This crate deliberately carries no protocol logic. Higher layers take
//! the types defined here by injection so that nothing in the hub depends
//! on ambient global state.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod metrics;

pub use config::{Config, MetadataConfig};
pub use metrics::{NoopMetrics, PrometheusSignatureMetrics, SignatureMetrics};
