//! Miri-compatible tests using pollster::block_on instead of tokio.
//! Tokio's IO driver uses kqueue/epoll syscalls that miri can't handle.

use timed_guard::{Acquire, Guarded, Timeout};

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    pollster::block_on(f)
}

#[test]
fn exclusive_then_shared() {
    let state = Guarded::with_timeout(vec![1u8], Timeout::Disabled);
    {
        let mut acc = state.exclusive().unwrap();
        acc.get_mut().unwrap().push(2);
    }
    let mut acc = state.shared().unwrap();
    assert_eq!(acc.get().unwrap().as_slice(), &[1, 2]);
}

#[test]
fn lazy_lock_async() {
    block_on(async {
        let state = Guarded::new(10u32);
        let mut acc = state.get_exclusive_access(Acquire::Deferred).unwrap();
        acc.lock_async().await;
        *acc.get_mut().unwrap() += 5;
        acc.unlock();

        let mut acc = state.shared_deferred();
        acc.lock_async().await;
        assert_eq!(*acc.get().unwrap(), 15);
    });
}

#[test]
fn downgrade_then_read() {
    let state = Guarded::with_timeout(String::from("a"), Timeout::Disabled);
    let mut w = state.exclusive().unwrap();
    w.get_mut().unwrap().push('b');

    let mut r = w.downgrade();
    assert_eq!(r.get().unwrap(), "ab");
    let mut other = state.shared().unwrap();
    assert_eq!(other.get().unwrap(), "ab");
}

#[test]
fn copy_and_move_between_wrappers() {
    let a = Guarded::with_timeout(vec![1u8, 2], Timeout::Disabled);
    let b = Guarded::with_timeout(Vec::new(), Timeout::Disabled);

    b.assign_from(&a).unwrap();
    assert_eq!(b.shared().unwrap().get().unwrap().len(), 2);

    let c = a.take().unwrap();
    assert!(a.shared().unwrap().get().unwrap().is_empty());
    assert_eq!(c.into_inner(), vec![1, 2]);

    a.move_from(&b).unwrap();
    assert_eq!(a.into_inner(), vec![1, 2]);
    assert!(b.into_inner().is_empty());
}
