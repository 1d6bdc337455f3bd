//! Observability for the compiler
//!
//! Structured JSON logging only. Logging is read-only: it never changes
//! what a compilation returns.
//!
//! ```
//! use docwire::observability::{Logger, Severity};
//!
//! // Written to stderr only when the event reaches the configured level
//! Logger::log_at(Severity::Error, Severity::Trace, "QUERY_COMPILED", &[("kind", "all")]);
//! ```

mod logger;

pub use logger::{Logger, Severity};
