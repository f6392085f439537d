use async_lock::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::fmt;
use std::marker::PhantomData;

use crate::acquire::{Read, Request, Write};
use crate::error::{LockTimeout, Result};
use crate::mode::{Exclusive, LockMode, LockModeKind, Shared, Writable};
use crate::timeout::Timeout;

enum Grant<'a, T> {
    Shared(RwLockReadGuard<'a, T>),
    Exclusive(RwLockWriteGuard<'a, T>),
    Released,
}

/// A handle to one [`Guarded`](crate::Guarded) value whose access level is
/// encoded in the type parameter `M`.
///
/// - `Accessor<'a, T, Shared>` ([`SharedAccessor`]) — `get` only
/// - `Accessor<'a, T, Exclusive>` ([`ExclusiveAccessor`]) — `get` and `get_mut`
///
/// The accessor is bound to the lock but does not necessarily hold it. Every
/// access through [`get`](Self::get) or [`get_mut`](Self::get_mut) acquires
/// the lock first if it is not held, waiting at most [`timeout`](Self::timeout).
/// The lock is released by [`unlock`](Self::unlock) or when the accessor is
/// dropped.
///
/// Accessors are neither `Send` nor `Sync`: one accessor belongs to the thread
/// that created it.
pub struct Accessor<'a, T, M> {
    lock: &'a RwLock<T>,
    grant: Grant<'a, T>,
    timeout: Timeout,
    _mode: PhantomData<(M, *const ())>,
}

/// Read-only accessor, see [`Guarded::get_shared_access`](crate::Guarded::get_shared_access).
pub type SharedAccessor<'a, T> = Accessor<'a, T, Shared>;

/// Read-write accessor, see [`Guarded::get_exclusive_access`](crate::Guarded::get_exclusive_access).
pub type ExclusiveAccessor<'a, T> = Accessor<'a, T, Exclusive>;

impl<'a, T, M: LockMode> Accessor<'a, T, M> {
    pub(crate) fn new(lock: &'a RwLock<T>, timeout: Timeout) -> Self {
        Self {
            lock,
            grant: Grant::Released,
            timeout,
            _mode: PhantomData,
        }
    }

    /// The bound applied to the next acquisition.
    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// Change the bound for this accessor only. Pass [`Timeout::Disabled`]
    /// to wait indefinitely.
    pub fn set_timeout(&mut self, timeout: impl Into<Timeout>) {
        self.timeout = timeout.into();
    }

    /// Whether this accessor currently holds the lock.
    pub fn is_locked(&self) -> bool {
        !matches!(self.grant, Grant::Released)
    }

    /// Acquire the lock within the configured timeout.
    ///
    /// A no-op if the lock is already held.
    pub fn lock(&mut self) -> Result<()> {
        self.acquire("lock")
    }

    /// Make one attempt to acquire the lock without waiting.
    ///
    /// Returns `true` if the lock is held afterwards.
    pub fn try_lock(&mut self) -> bool {
        if self.is_locked() {
            return true;
        }
        let grant = match M::MODE {
            LockModeKind::Shared => Read(self.lock).try_acquire().map(Grant::Shared),
            LockModeKind::Exclusive => Write(self.lock).try_acquire().map(Grant::Exclusive),
        };
        match grant {
            Some(grant) => {
                self.grant = grant;
                true
            }
            None => false,
        }
    }

    /// Acquire the lock asynchronously, waiting as long as it takes.
    ///
    /// Works on any async runtime. The configured timeout is not applied here;
    /// wrap the call in the runtime's own timeout when a bound is needed.
    pub async fn lock_async(&mut self) {
        if self.is_locked() {
            return;
        }
        self.grant = match M::MODE {
            LockModeKind::Shared => Grant::Shared(self.lock.read().await),
            LockModeKind::Exclusive => Grant::Exclusive(self.lock.write().await),
        };
        tracing::trace!(
            site = M::SITE,
            mode = ?M::MODE,
            operation = "lock_async",
            "lock acquired"
        );
    }

    /// Release the lock if held. A no-op otherwise.
    pub fn unlock(&mut self) {
        if self.is_locked() {
            self.grant = Grant::Released;
            tracing::trace!(site = M::SITE, mode = ?M::MODE, "lock released");
        }
    }

    /// Read the value, acquiring the lock first if needed.
    pub fn get(&mut self) -> Result<&T> {
        self.acquire("get")?;
        match &self.grant {
            Grant::Shared(g) => Ok(&**g),
            Grant::Exclusive(g) => Ok(&**g),
            Grant::Released => unreachable!(),
        }
    }

    fn acquire(&mut self, operation: &'static str) -> Result<()> {
        if self.is_locked() {
            return Ok(());
        }

        let deadline = self.timeout.deadline();
        let grant = match M::MODE {
            LockModeKind::Shared => Read(self.lock).acquire(deadline).map(Grant::Shared),
            LockModeKind::Exclusive => Write(self.lock).acquire(deadline).map(Grant::Exclusive),
        };

        match grant {
            Some(grant) => {
                self.grant = grant;
                tracing::trace!(site = M::SITE, mode = ?M::MODE, operation, "lock acquired");
                Ok(())
            }
            None => {
                let waited = self.timeout.duration().unwrap_or_default();
                tracing::debug!(
                    site = M::SITE,
                    mode = ?M::MODE,
                    operation,
                    ?waited,
                    "lock acquisition timed out"
                );
                Err(LockTimeout::new(M::SITE, operation, waited))
            }
        }
    }
}

impl<'a, T, M: Writable> Accessor<'a, T, M> {
    /// Mutate the value, acquiring the lock first if needed.
    pub fn get_mut(&mut self) -> Result<&mut T> {
        self.acquire("get_mut")?;
        match &mut self.grant {
            Grant::Exclusive(g) => Ok(&mut **g),
            _ => unreachable!(),
        }
    }
}

impl<'a, T> Accessor<'a, T, Exclusive> {
    /// Turn this into a shared accessor.
    ///
    /// If the write lock is held it is atomically downgraded, so no other
    /// writer can slip in between. Otherwise the result starts unlocked.
    pub fn downgrade(mut self) -> SharedAccessor<'a, T> {
        let grant = match std::mem::replace(&mut self.grant, Grant::Released) {
            Grant::Exclusive(g) => Grant::Shared(RwLockWriteGuard::downgrade(g)),
            other => other,
        };
        Accessor {
            lock: self.lock,
            grant,
            timeout: self.timeout,
            _mode: PhantomData,
        }
    }
}

impl<T: fmt::Debug, M: LockMode> fmt::Debug for Accessor<'_, T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct(M::SITE);
        match &self.grant {
            Grant::Shared(g) => d.field("value", &**g),
            Grant::Exclusive(g) => d.field("value", &**g),
            Grant::Released => d.field("value", &format_args!("<unlocked>")),
        };
        d.field("timeout", &self.timeout).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tracing_test::traced_test;

    fn short() -> Timeout {
        Timeout::from_millis(20)
    }

    #[test]
    fn lazy_accessor_locks_on_first_access() {
        let lock = RwLock::new(5u32);
        let mut acc = ExclusiveAccessor::new(&lock, short());
        assert!(!acc.is_locked());
        assert!(lock.try_write().is_some());

        *acc.get_mut().unwrap() += 1;
        assert!(acc.is_locked());
        assert!(lock.try_read().is_none());
    }

    #[test]
    fn lock_and_unlock_are_idempotent() {
        let lock = RwLock::new(());
        let mut acc = ExclusiveAccessor::new(&lock, short());

        acc.lock().unwrap();
        acc.lock().unwrap();
        assert!(acc.is_locked());

        acc.unlock();
        acc.unlock();
        assert!(!acc.is_locked());
        assert!(lock.try_write().is_some());
    }

    #[test]
    fn relock_after_unlock() {
        let lock = RwLock::new(1u8);
        let mut acc = SharedAccessor::new(&lock, short());
        assert_eq!(*acc.get().unwrap(), 1);
        acc.unlock();
        assert!(!acc.is_locked());
        assert_eq!(*acc.get().unwrap(), 1);
        assert!(acc.is_locked());
    }

    #[test]
    fn shared_accessors_coexist() {
        let lock = RwLock::new(3u32);
        let mut a = SharedAccessor::new(&lock, short());
        let mut b = SharedAccessor::new(&lock, short());
        assert_eq!(*a.get().unwrap(), 3);
        assert_eq!(*b.get().unwrap(), 3);
    }

    #[test]
    fn timeout_reports_site_and_operation() {
        let lock = RwLock::new(0u32);
        let mut holder = ExclusiveAccessor::new(&lock, short());
        holder.lock().unwrap();

        let mut reader = SharedAccessor::new(&lock, short());
        let start = Instant::now();
        let err = reader.get().unwrap_err();
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(err.site(), "SharedAccessor");
        assert_eq!(err.operation(), "get");
        assert_eq!(err.waited(), Duration::from_millis(20));
        assert!(!reader.is_locked());

        let mut writer = ExclusiveAccessor::new(&lock, short());
        let err = writer.lock().unwrap_err();
        assert_eq!(err.to_string(), "ExclusiveAccessor::lock() timed out after 20ms");
    }

    #[test]
    fn try_lock_does_not_wait() {
        let lock = RwLock::new(0u32);
        let _writer = lock.write_blocking();

        let mut acc = SharedAccessor::new(&lock, Timeout::Disabled);
        assert!(!acc.try_lock());
        assert!(!acc.is_locked());
    }

    #[test]
    fn downgrade_keeps_the_lock() {
        let lock = RwLock::new(1u32);
        let mut w = ExclusiveAccessor::new(&lock, short());
        *w.get_mut().unwrap() = 2;

        let mut r = w.downgrade();
        assert!(r.is_locked());
        assert_eq!(*r.get().unwrap(), 2);
        assert!(lock.try_write().is_none());
        assert!(lock.try_read().is_some());
    }

    #[test]
    fn downgrade_of_unlocked_stays_unlocked() {
        let lock = RwLock::new(1u32);
        let w = ExclusiveAccessor::new(&lock, Timeout::Disabled);
        let r = w.downgrade();
        assert!(!r.is_locked());
        assert_eq!(r.timeout(), Timeout::Disabled);
    }

    #[test]
    fn debug_does_not_lock() {
        let lock = RwLock::new(9u32);
        let mut acc = SharedAccessor::new(&lock, short());
        assert!(format!("{acc:?}").contains("<unlocked>"));
        acc.lock().unwrap();
        assert!(format!("{acc:?}").contains('9'));
    }

    #[traced_test]
    #[test]
    fn timeout_is_logged() {
        let lock = RwLock::new(0u32);
        let _writer = lock.write_blocking();

        let mut acc = ExclusiveAccessor::new(&lock, Timeout::from_millis(5));
        assert!(acc.lock().is_err());
        assert!(logs_contain("lock acquisition timed out"));
        assert!(logs_contain("ExclusiveAccessor"));
        assert!(logs_contain("mode=Exclusive"));
        assert!(logs_contain("waited=5ms"));
    }

    #[traced_test]
    #[test]
    fn acquire_and_release_are_logged_with_mode() {
        let lock = RwLock::new(0u32);
        let mut acc = SharedAccessor::new(&lock, short());
        acc.get().unwrap();
        acc.unlock();
        assert!(logs_contain("lock acquired"));
        assert!(logs_contain("lock released"));
        assert!(logs_contain("mode=Shared"));
        assert!(logs_contain("operation=\"get\""));
    }
}
