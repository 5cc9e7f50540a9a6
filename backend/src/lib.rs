//! Digital library backend: identity, entitlement and file delivery.
//!
//! The crate follows a hexagonal layout. [`domain`] holds services and port
//! traits, [`outbound`] implements the ports, and [`inbound`] exposes the
//! services over HTTP.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
