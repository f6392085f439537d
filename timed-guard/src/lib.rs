//! Thread-safe value wrapper with **timeout-bounded** shared and exclusive
//! accessors.
//!
//! [`Guarded<T>`] pairs a value with a readers-writer lock. Threads reach the
//! value through accessors: any number of [`SharedAccessor`]s may read at the
//! same time, or one [`ExclusiveAccessor`] may read and write. Every blocking
//! acquisition is bounded by a [`Timeout`] and fails with [`LockTimeout`]
//! instead of waiting forever.
//!
//! Built on [`async-lock`]; the same accessors can also be locked from async
//! code with [`Accessor::lock_async`].
//!
//! # Quick Start
//!
//! ```rust
//! use timed_guard::Guarded;
//!
//! let counter = Guarded::new(0u32);
//!
//! {
//!     let mut acc = counter.exclusive()?;
//!     *acc.get_mut()? += 1;
//! } // write lock released
//!
//! let mut acc = counter.shared()?;
//! assert_eq!(*acc.get()?, 1);
//! # Ok::<(), timed_guard::LockTimeout>(())
//! ```
//!
//! # Deferred acquisition and timeouts
//!
//! An accessor created with [`Acquire::Deferred`] takes the lock on first
//! access. Each accessor starts with its `Guarded`'s timeout and can change it:
//!
//! ```rust
//! use std::time::Duration;
//! use timed_guard::{Acquire, Guarded, Timeout};
//!
//! let names = Guarded::new(vec![String::from("a")]);
//! names.set_timeout(Duration::from_millis(50));
//!
//! let mut writer = names.get_exclusive_access(Acquire::Now)?;
//! let mut reader = names.get_shared_access(Acquire::Deferred)?;
//! assert_eq!(reader.timeout(), Timeout::from_millis(50));
//!
//! // The writer holds the lock, so the reader gives up after 50ms.
//! let err = reader.get().unwrap_err();
//! assert_eq!(err.operation(), "get");
//!
//! writer.unlock();
//! reader.set_timeout(Timeout::Disabled);
//! assert_eq!(reader.get()?.len(), 1);
//! # Ok::<(), timed_guard::LockTimeout>(())
//! ```
//!
//! # Copy and move between wrappers
//!
//! [`Guarded::assign_from`] and [`Guarded::move_from`] lock both sides as one
//! joint acquisition, so two threads assigning in opposite directions never
//! deadlock:
//!
//! ```rust
//! use timed_guard::Guarded;
//!
//! let a = Guarded::new(String::from("left"));
//! let b = Guarded::new(String::from("right"));
//!
//! a.assign_from(&b)?;
//! assert_eq!(*a.shared()?.get()?, "right");
//!
//! b.move_from(&a)?;
//! assert_eq!(*a.shared()?.get()?, "");
//! # Ok::<(), timed_guard::LockTimeout>(())
//! ```
//!
//! Accessors borrow their `Guarded` and are neither `Send` nor `Sync`, so they
//! can neither outlive it nor be handed to another thread:
//!
//! ```compile_fail,E0277
//! use timed_guard::Guarded;
//!
//! let g = Guarded::new(0u32);
//! let acc = g.shared().unwrap();
//! std::thread::scope(|s| {
//!     s.spawn(move || drop(acc));
//! });
//! ```
//!
//! ```compile_fail,E0597
//! use timed_guard::{Guarded, SharedAccessor};
//!
//! let acc: SharedAccessor<'_, u32>;
//! {
//!     let g = Guarded::new(0u32);
//!     acc = g.shared_deferred();
//! }
//! drop(acc);
//! ```
//!
//! A shared accessor never hands out a mutable reference:
//!
//! ```compile_fail,E0599
//! use timed_guard::Guarded;
//!
//! let g = Guarded::new(0u32);
//! let mut acc = g.shared().unwrap();
//! *acc.get_mut().unwrap() = 1;
//! ```
//!
//! and a reference obtained from an accessor keeps it from unlocking:
//!
//! ```compile_fail,E0499
//! use timed_guard::Guarded;
//!
//! let g = Guarded::new(vec![0u8]);
//! let mut acc = g.exclusive().unwrap();
//! let value = acc.get_mut().unwrap();
//! acc.unlock();
//! value.push(1);
//! ```
//!
//! [`async-lock`]: https://docs.rs/async-lock

mod accessor;
mod acquire;
pub mod collections;
mod error;
mod guarded;
mod mode;
mod timeout;

pub use accessor::{Accessor, ExclusiveAccessor, SharedAccessor};
pub use error::{LockTimeout, Result};
pub use guarded::{Acquire, Guarded};
pub use mode::{Exclusive, LockMode, LockModeKind, Shared, Writable};
pub use timeout::Timeout;
