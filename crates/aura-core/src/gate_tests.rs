use std::sync::Arc;
use std::thread;

use super::*;

#[test]
fn test_acquire_and_release() {
    let gate = ExecutionGate::new();
    assert!(gate.is_free());

    let permit = gate.acquire("command:a", Duration::from_millis(10)).unwrap();
    assert!(!gate.is_free());
    assert_eq!(permit.owner(), "command:a");
    assert_eq!(gate.holder().as_deref(), Some("command:a"));

    drop(permit);
    assert!(gate.is_free());
    assert_eq!(gate.holder(), None);
}

#[test]
fn test_acquire_times_out_while_held() {
    let gate = ExecutionGate::new();
    let _held = gate.acquire("command:a", Duration::from_millis(10)).unwrap();

    let started = Instant::now();
    let err = gate
        .acquire("command:b", Duration::from_millis(50))
        .unwrap_err();
    assert!(started.elapsed() >= Duration::from_millis(50));

    let GateError::Timeout { owner, holder, .. } = err;
    assert_eq!(owner, "command:b");
    assert_eq!(holder.as_deref(), Some("command:a"));
}

#[test]
fn test_try_acquire() {
    let gate = ExecutionGate::new();
    let held = gate.try_acquire("a").unwrap();
    assert!(gate.try_acquire("b").is_none());
    drop(held);
    assert!(gate.try_acquire("b").is_some());
}

#[test]
fn test_waiter_gets_gate_after_release() {
    let gate = Arc::new(ExecutionGate::new());
    let permit = gate.acquire("first", Duration::from_millis(10)).unwrap();

    let waiter = {
        let gate = gate.clone();
        thread::spawn(move || {
            gate.acquire("second", Duration::from_secs(2))
                .map(|p| p.owner().to_string())
        })
    };

    thread::sleep(Duration::from_millis(30));
    drop(permit);

    assert_eq!(waiter.join().unwrap().unwrap(), "second");
    assert!(gate.is_free());
}

#[test]
fn test_permit_debug_shows_owner() {
    let gate = ExecutionGate::new();
    let permit = gate.try_acquire("command:x").unwrap();
    assert!(format!("{:?}", permit).contains("command:x"));
}
