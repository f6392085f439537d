use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// How long an acquisition may wait before failing with
/// [`LockTimeout`](crate::LockTimeout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeout {
    /// Block until the lock is granted.
    Disabled,
    /// Give up once this much time has elapsed.
    After(Duration),
}

impl Timeout {
    /// Ten seconds, the bound every new [`Guarded`](crate::Guarded) starts with.
    pub const DEFAULT: Timeout = Timeout::After(Duration::from_millis(10_000));

    pub fn from_millis(ms: u64) -> Self {
        Timeout::After(Duration::from_millis(ms))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Timeout::Disabled)
    }

    /// The bound as a duration, `None` when disabled.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Timeout::Disabled => None,
            Timeout::After(d) => Some(*d),
        }
    }

    /// The instant at which an acquisition starting now must give up.
    ///
    /// Bounds too large to represent as an `Instant` behave as disabled.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        self.duration().and_then(|d| Instant::now().checked_add(d))
    }
}

impl Default for Timeout {
    fn default() -> Self {
        Timeout::DEFAULT
    }
}

impl From<Duration> for Timeout {
    fn from(d: Duration) -> Self {
        Timeout::After(d)
    }
}

impl From<Option<Duration>> for Timeout {
    fn from(d: Option<Duration>) -> Self {
        d.map_or(Timeout::Disabled, Timeout::After)
    }
}

impl fmt::Display for Timeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timeout::Disabled => f.write_str("disabled"),
            Timeout::After(d) => write!(f, "{d:?}"),
        }
    }
}

/// A [`Timeout`] that can be replaced through a shared reference.
///
/// Stored as nanoseconds; `u64::MAX` encodes [`Timeout::Disabled`] and longer
/// bounds saturate just below it.
pub(crate) struct AtomicTimeout(AtomicU64);

const DISABLED: u64 = u64::MAX;

impl AtomicTimeout {
    pub(crate) fn new(timeout: Timeout) -> Self {
        Self(AtomicU64::new(Self::encode(timeout)))
    }

    pub(crate) fn load(&self) -> Timeout {
        match self.0.load(Ordering::Relaxed) {
            DISABLED => Timeout::Disabled,
            nanos => Timeout::After(Duration::from_nanos(nanos)),
        }
    }

    pub(crate) fn store(&self, timeout: Timeout) {
        self.0.store(Self::encode(timeout), Ordering::Relaxed);
    }

    fn encode(timeout: Timeout) -> u64 {
        match timeout {
            Timeout::Disabled => DISABLED,
            Timeout::After(d) => {
                u64::try_from(d.as_nanos()).map_or(DISABLED - 1, |n| n.min(DISABLED - 1))
            }
        }
    }
}

impl fmt::Debug for AtomicTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.load(), f)
    }
}
