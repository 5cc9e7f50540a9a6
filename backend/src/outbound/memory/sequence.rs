//! In-memory per-department counters.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::Department;
use crate::domain::ports::{MemberSequence, MemberSequenceError};

/// Hands out 1, 2, 3, ... per department under a single lock.
#[derive(Debug, Default)]
pub struct InMemoryMemberSequence {
    counters: Mutex<HashMap<Department, u32>>,
}

impl InMemoryMemberSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MemberSequence for InMemoryMemberSequence {
    async fn next(&self, department: &Department) -> Result<u32, MemberSequenceError> {
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| MemberSequenceError::query("member sequence lock poisoned"))?;
        let counter = counters.entry(department.clone()).or_insert(0);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| MemberSequenceError::query(format!("{department} sequence exhausted")))?;
        Ok(*counter)
    }
}
