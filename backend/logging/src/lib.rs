//! Structured logging components for qlens.
//!
//! Console and rolling JSON file output, plus redaction of credentials.

pub mod logger;
pub mod redact;

pub use logger::init_logger;
pub use redact::redact_sensitive_data;
