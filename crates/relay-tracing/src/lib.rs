//! Tracing bootstrap for relay-proxy: fmt logging on stderr, with optional
//! OTLP span export when a collector endpoint is configured.

pub mod config;
pub mod otlp;
pub mod spans;

pub use config::{LogFormat, TracingConfig};
pub use otlp::{init_tracing, TracingGuard};
