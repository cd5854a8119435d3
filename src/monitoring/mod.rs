#![forbid(unsafe_code)]
#![allow(missing_docs)]

//! Observability: Prometheus metrics.

pub mod metrics;
