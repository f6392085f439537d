//! Minimal timed-guard example.
//!
//! Run with: `cargo run --example basic`

use std::time::Duration;
use timed_guard::{Acquire, Guarded};

fn main() -> timed_guard::Result<()> {
    let counter = Guarded::new(0u32);
    counter.set_timeout(Duration::from_millis(100));

    // Eager: the write lock is held from here on
    let mut writer = counter.get_exclusive_access(Acquire::Now)?;
    *writer.get_mut()? += 1;
    drop(writer);

    // Deferred: nothing is locked until the first access
    let mut reader = counter.get_shared_access(Acquire::Deferred)?;
    println!("counter = {}", reader.get()?);

    // A writer cannot get in while the reader holds the lock
    match counter.exclusive() {
        Ok(_) => println!("unexpected: writer got the lock"),
        Err(e) => println!("as expected: {e}"),
    }

    reader.unlock();
    *counter.exclusive()?.get_mut()? += 1;
    println!("final = {:?}", counter);
    Ok(())
}
