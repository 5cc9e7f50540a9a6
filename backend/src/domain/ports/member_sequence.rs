//! Port for per-department member number allocation.
//!
//! Each call hands out a number no other caller has received for the same
//! department, even under concurrent registration.

use async_trait::async_trait;

use crate::domain::Department;

use super::define_port_error;

define_port_error! {
    /// Errors raised by member sequence adapters.
    pub enum MemberSequenceError {
        /// Backing store could not be reached.
        Connection { message: String } => "member sequence connection failed: {message}",
        /// Allocation failed.
        Query { message: String } => "member sequence allocation failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemberSequence: Send + Sync {
    /// Atomically allocate the next number for `department`, starting at 1.
    async fn next(&self, department: &Department) -> Result<u32, MemberSequenceError>;
}
