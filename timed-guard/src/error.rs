use std::time::Duration;

use thiserror::Error;

/// A bounded lock acquisition gave up before the lock became available.
///
/// Carries the call site that attempted the acquisition so callers can tell
/// which accessor or [`Guarded`](crate::Guarded) operation failed. After this
/// error is returned the failing accessor holds no lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{site}::{operation}() timed out after {waited:?}")]
pub struct LockTimeout {
    site: &'static str,
    operation: &'static str,
    waited: Duration,
}

impl LockTimeout {
    pub(crate) fn new(site: &'static str, operation: &'static str, waited: Duration) -> Self {
        Self {
            site,
            operation,
            waited,
        }
    }

    /// The type that attempted the acquisition, e.g. `"ExclusiveAccessor"`.
    pub fn site(&self) -> &'static str {
        self.site
    }

    /// The method that attempted the acquisition, e.g. `"lock"`.
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// The configured bound that elapsed.
    pub fn waited(&self) -> Duration {
        self.waited
    }
}

pub type Result<T, E = LockTimeout> = std::result::Result<T, E>;
