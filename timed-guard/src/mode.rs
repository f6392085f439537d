/// Marker: the accessor takes the lock in shared (read) mode. Only `get` is available.
pub struct Shared;

/// Marker: the accessor takes the lock in exclusive (write) mode. Both `get`
/// and `get_mut` are available.
pub struct Exclusive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockModeKind {
    Shared,
    Exclusive,
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Shared {}
    impl Sealed for super::Exclusive {}
}

/// Implemented only by [`Shared`] and [`Exclusive`].
///
/// ```compile_fail,E0277
/// use timed_guard::{LockMode, LockModeKind};
///
/// struct Mine;
///
/// impl LockMode for Mine {
///     const MODE: LockModeKind = LockModeKind::Shared;
///     const SITE: &'static str = "Mine";
/// }
/// ```
pub trait LockMode: sealed::Sealed {
    const MODE: LockModeKind;
    /// Name reported in [`LockTimeout`](crate::LockTimeout) and log events.
    const SITE: &'static str;
}

impl LockMode for Shared {
    const MODE: LockModeKind = LockModeKind::Shared;
    const SITE: &'static str = "SharedAccessor";
}

impl LockMode for Exclusive {
    const MODE: LockModeKind = LockModeKind::Exclusive;
    const SITE: &'static str = "ExclusiveAccessor";
}

/// Implemented by modes that grant mutable access.
pub trait Writable: LockMode {}

impl Writable for Exclusive {}
