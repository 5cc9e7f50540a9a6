//! Request middleware.
//!
//! Request-scoped tracing lives here; identity establishment sits with the
//! HTTP adapter in [`crate::inbound::http::identity`].

pub mod trace;

pub use trace::Trace;
