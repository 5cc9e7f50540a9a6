//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories, blob store and member
//!   sequence using Diesel
//! - **filesystem**: blob store rooted in a local directory
//! - **identity**: HTTP client for the external identity service
//! - **memory**: process-local adapters used when no database is configured
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod filesystem;
pub mod identity;
pub mod memory;
pub mod persistence;
