//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain's repository, blob and sequence
//! ports backed by PostgreSQL via `diesel-async` and `bb8` pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: implementations only translate between Diesel rows
//!   and domain types. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Strongly typed errors**: every database failure is mapped to the
//!   owning port's error enum.
//!
//! # Example
//!
//! ```ignore
//! use library_backend::outbound::persistence::{DbPool, PoolConfig, DieselProfileRepository};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/library")).await?;
//! let profiles = DieselProfileRepository::new(pool);
//! ```

mod diesel_basic_error_mapping;
mod diesel_blob_store;
mod diesel_content_repository;
mod diesel_profile_repository;
mod migrations;
mod models;
mod pool;
mod schema;
mod search_pattern;

pub use diesel_blob_store::{DieselBlobStore, DieselMemberSequence};
pub use diesel_content_repository::{DieselContentRepository, DieselPurchaseRepository};
pub use diesel_profile_repository::DieselProfileRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
