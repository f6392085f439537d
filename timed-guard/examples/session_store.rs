//! A session store shared by worker threads.
//!
//! Workers look sessions up through shared accessors and register new ones
//! through exclusive accessors. A snapshot thread periodically copies the
//! whole store with `assign_from`, which never deadlocks against writers.
//!
//! Run with: `cargo run --example session_store`

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use timed_guard::collections::HashMap;
use timed_guard::LockTimeout;

#[derive(Debug, Clone)]
#[allow(dead_code)]
struct Session {
    user_id: u64,
    token: String,
}

fn lookup(store: &HashMap<String, Session>, token: &str) -> Result<Option<u64>, LockTimeout> {
    let mut acc = store.shared()?;
    Ok(acc.get()?.get(token).map(|s| s.user_id))
}

fn register(store: &HashMap<String, Session>, user_id: u64) -> Result<String, LockTimeout> {
    let token = format!("tok-{user_id}");
    let mut acc = store.exclusive()?;
    acc.get_mut()?.insert(
        token.clone(),
        Session {
            user_id,
            token: token.clone(),
        },
    );
    Ok(token)
}

fn main() -> Result<(), LockTimeout> {
    let store = Arc::new(HashMap::<String, Session>::default());
    store.set_timeout(Duration::from_millis(500));
    let snapshot = Arc::new(HashMap::<String, Session>::default());

    let workers: Vec<_> = (0..4u64)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || -> Result<(), LockTimeout> {
                for i in 0..25 {
                    let token = register(&store, w * 100 + i)?;
                    assert_eq!(lookup(&store, &token)?, Some(w * 100 + i));
                }
                Ok(())
            })
        })
        .collect();

    let snapper = {
        let (store, snapshot) = (store.clone(), snapshot.clone());
        thread::spawn(move || -> Result<(), LockTimeout> {
            for _ in 0..10 {
                snapshot.assign_from(&store)?;
                thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        })
    };

    for w in workers {
        w.join().expect("worker panicked")?;
    }
    snapper.join().expect("snapshot thread panicked")?;

    println!("sessions: {}", store.shared()?.get()?.len());
    println!("last snapshot: {}", snapshot.shared()?.get()?.len());
    Ok(())
}
