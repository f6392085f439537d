use async_lock::RwLock;
use std::fmt;
use std::ptr;

use crate::accessor::{Accessor, ExclusiveAccessor, SharedAccessor};
use crate::acquire::{acquire_pair, Read, Request, Write};
use crate::error::{LockTimeout, Result};
use crate::mode::LockMode;
use crate::timeout::{AtomicTimeout, Timeout};

const SITE: &str = "Guarded";

/// When a freshly created accessor takes the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Acquire {
    /// Lock before returning the accessor.
    #[default]
    Now,
    /// Lock on first access. Prefer this when the accessor is created well
    /// before it is used.
    Deferred,
}

/// A value of type `T` paired with the readers-writer lock that protects it.
///
/// The value is only reachable through accessors created by
/// [`get_shared_access`](Self::get_shared_access) and
/// [`get_exclusive_access`](Self::get_exclusive_access), or through
/// `&mut self` / ownership where the borrow checker already proves exclusivity.
///
/// Every `Guarded` carries a default [`Timeout`] (ten seconds unless changed)
/// that is copied into each accessor when it is created.
pub struct Guarded<T> {
    lock: RwLock<T>,
    timeout: AtomicTimeout,
}

impl<T> Guarded<T> {
    pub fn new(value: T) -> Self {
        Self::with_timeout(value, Timeout::DEFAULT)
    }

    pub fn with_timeout(value: T, timeout: impl Into<Timeout>) -> Self {
        Self {
            lock: RwLock::new(value),
            timeout: AtomicTimeout::new(timeout.into()),
        }
    }

    /// The timeout handed to new accessors.
    pub fn timeout(&self) -> Timeout {
        self.timeout.load()
    }

    /// Change the timeout handed to accessors created from now on.
    /// Existing accessors keep theirs.
    pub fn set_timeout(&self, timeout: impl Into<Timeout>) {
        self.timeout.store(timeout.into());
    }

    /// Create a read-write accessor.
    ///
    /// With [`Acquire::Now`] the write lock is taken before returning and a
    /// [`LockTimeout`] is returned if that does not happen in time.
    pub fn get_exclusive_access(&self, acquire: Acquire) -> Result<ExclusiveAccessor<'_, T>> {
        self.accessor(acquire)
    }

    /// Create a read-only accessor.
    ///
    /// With [`Acquire::Now`] the read lock is taken before returning and a
    /// [`LockTimeout`] is returned if that does not happen in time.
    pub fn get_shared_access(&self, acquire: Acquire) -> Result<SharedAccessor<'_, T>> {
        self.accessor(acquire)
    }

    /// Shorthand for `get_exclusive_access(Acquire::Now)`.
    pub fn exclusive(&self) -> Result<ExclusiveAccessor<'_, T>> {
        self.get_exclusive_access(Acquire::Now)
    }

    /// A read-write accessor that locks on first use.
    pub fn exclusive_deferred(&self) -> ExclusiveAccessor<'_, T> {
        Accessor::new(&self.lock, self.timeout())
    }

    /// Shorthand for `get_shared_access(Acquire::Now)`.
    pub fn shared(&self) -> Result<SharedAccessor<'_, T>> {
        self.get_shared_access(Acquire::Now)
    }

    /// A read-only accessor that locks on first use.
    pub fn shared_deferred(&self) -> SharedAccessor<'_, T> {
        Accessor::new(&self.lock, self.timeout())
    }

    /// Get a mutable reference without locking. Requires `&mut self`,
    /// guaranteeing no accessor is alive.
    pub fn get_mut(&mut self) -> &mut T {
        self.lock.get_mut()
    }

    /// Consume the wrapper and return the value.
    pub fn into_inner(self) -> T {
        self.lock.into_inner()
    }

    fn accessor<M: LockMode>(&self, acquire: Acquire) -> Result<Accessor<'_, T, M>> {
        let mut accessor = Accessor::new(&self.lock, self.timeout());
        if acquire == Acquire::Now {
            accessor.lock()?;
        }
        Ok(accessor)
    }

    fn timed_out(operation: &'static str, timeout: Timeout) -> LockTimeout {
        let waited = timeout.duration().unwrap_or_default();
        tracing::debug!(site = SITE, operation, ?waited, "lock acquisition timed out");
        LockTimeout::new(SITE, operation, waited)
    }
}

impl<T: Clone> Guarded<T> {
    /// Copy the value into a new `Guarded` under a read lock.
    ///
    /// Waits at most this value's timeout; the copy inherits the timeout.
    pub fn try_clone(&self) -> Result<Self> {
        let timeout = self.timeout();
        let value = Read(&self.lock)
            .acquire(timeout.deadline())
            .ok_or_else(|| Self::timed_out("try_clone", timeout))?;
        Ok(Self::with_timeout(T::clone(&value), timeout))
    }

    /// Replace this value with a copy of `source`'s value and timeout.
    ///
    /// This value is write-locked and `source` read-locked as one joint
    /// acquisition bounded by this value's timeout, so `a.assign_from(&b)` and
    /// `b.assign_from(&a)` running concurrently cannot deadlock. Assigning a
    /// value to itself does nothing.
    pub fn assign_from(&self, source: &Self) -> Result<()> {
        if ptr::eq(self, source) {
            return Ok(());
        }

        let timeout = self.timeout();
        let (mut dst, src) = acquire_pair(
            &Write(&self.lock),
            &Read(&source.lock),
            timeout.deadline(),
            "assign_from",
        )
        .ok_or_else(|| Self::timed_out("assign_from", timeout))?;
        (*dst).clone_from(&*src);
        self.timeout.store(source.timeout());
        tracing::trace!(site = SITE, operation = "assign_from", "value copied");
        Ok(())
    }
}

impl<T: Default> Guarded<T> {
    /// Move the value out into a new `Guarded` under a write lock, leaving
    /// `T::default()` behind.
    ///
    /// Waits at most this value's timeout; the new value inherits the timeout.
    pub fn take(&self) -> Result<Self> {
        let timeout = self.timeout();
        let mut value = Write(&self.lock)
            .acquire(timeout.deadline())
            .ok_or_else(|| Self::timed_out("take", timeout))?;
        Ok(Self::with_timeout(std::mem::take(&mut *value), timeout))
    }

    /// Move `source`'s value and timeout into this one, leaving
    /// `T::default()` in `source`.
    ///
    /// Both sides are write-locked as one joint acquisition bounded by this
    /// value's timeout. Moving a value into itself does nothing.
    pub fn move_from(&self, source: &Self) -> Result<()> {
        if ptr::eq(self, source) {
            return Ok(());
        }

        let timeout = self.timeout();
        let (mut dst, mut src) =
            acquire_pair(&Write(&self.lock), &Write(&source.lock), timeout.deadline(), "move_from")
                .ok_or_else(|| Self::timed_out("move_from", timeout))?;
        *dst = std::mem::take(&mut *src);
        self.timeout.store(source.timeout());
        tracing::trace!(site = SITE, operation = "move_from", "value moved");
        Ok(())
    }
}

/// Panics if the read lock cannot be taken within the timeout; use
/// [`Guarded::try_clone`] to handle that case.
impl<T: Clone> Clone for Guarded<T> {
    fn clone(&self) -> Self {
        match self.try_clone() {
            Ok(copy) => copy,
            Err(e) => panic!("{e}"),
        }
    }
}

impl<T: Default> Default for Guarded<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for Guarded<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Guarded<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct(SITE);
        match self.lock.try_read() {
            Some(value) => d.field("value", &&*value),
            None => d.field("value", &format_args!("<locked>")),
        };
        d.field("timeout", &self.timeout()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn guarded_is_send_sync() {
        assert_send_sync::<Guarded<Vec<u8>>>();
        assert_send_sync::<Guarded<String>>();
    }

    #[test]
    fn timeout_is_copied_into_accessors() {
        let g = Guarded::new(0u8);
        g.set_timeout(Duration::from_millis(15));
        let mut acc = g.shared_deferred();
        assert_eq!(acc.timeout(), Timeout::from_millis(15));

        g.set_timeout(Timeout::Disabled);
        assert_eq!(acc.timeout(), Timeout::from_millis(15));
        acc.set_timeout(Duration::from_millis(1));
        assert_eq!(g.timeout(), Timeout::Disabled);
    }

    #[test]
    fn self_assignment_is_a_no_op() {
        let g = Guarded::new(vec![1, 2, 3]);
        g.assign_from(&g).unwrap();
        g.move_from(&g).unwrap();
        assert_eq!(*g.shared().unwrap().get().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn self_assignment_does_not_lock() {
        let g = Guarded::with_timeout(1u32, Duration::from_millis(5));
        let _held = g.exclusive().unwrap();
        g.assign_from(&g).unwrap();
    }

    #[test]
    fn debug_shows_locked_value() {
        let g = Guarded::new(4u32);
        assert!(format!("{g:?}").contains('4'));
        let _w = g.exclusive().unwrap();
        assert!(format!("{g:?}").contains("<locked>"));
    }

    #[test]
    fn failed_take_leaves_source_intact() {
        let g = Guarded::with_timeout(String::from("kept"), Duration::from_millis(10));
        {
            let _r = g.shared().unwrap();
            let err = g.take().unwrap_err();
            assert_eq!(err.site(), "Guarded");
            assert_eq!(err.operation(), "take");
        }
        assert_eq!(g.into_inner(), "kept");
    }
}
