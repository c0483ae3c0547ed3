use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Barrier, mpsc};
use std::thread;

use super::*;

const SHORT: Duration = Duration::from_millis(50);

fn coordinator() -> Arc<DeferredCoordinator> {
    Arc::new(
        DeferredCoordinator::new(Arc::new(ExecutionGate::new()))
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(200)),
    )
}

fn park(coord: &DeferredCoordinator, action: PendingAction) -> ExecutionId {
    let permit = coord.gate().acquire("test", SHORT).unwrap();
    coord.defer(permit, action).unwrap()
}

fn counting_action(counter: Arc<AtomicUsize>) -> PendingAction {
    PendingAction::new(ExecutionId::new(), "count", move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

#[test]
fn test_defer_releases_gate() {
    let coord = coordinator();
    let id = park(&coord, counting_action(Arc::default()));

    assert!(coord.gate().is_free());
    match coord.status().unwrap() {
        DeferredStatus::Awaiting {
            execution_id,
            description,
            ..
        } => {
            assert_eq!(execution_id, id);
            assert_eq!(description, "count");
        }
        other => panic!("unexpected status {:?}", other),
    }
}

#[test]
fn test_trigger_runs_effect_once() {
    let coord = coordinator();
    let runs = Arc::new(AtomicUsize::new(0));
    let id = park(&coord, counting_action(runs.clone()));

    let outcome = coord.trigger(UserGesture::click(5, 6)).unwrap();
    assert!(matches!(outcome, TriggerOutcome::Executed { execution_id, .. } if execution_id == id));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(coord.status().unwrap().is_idle());
    assert!(coord.gate().is_free());

    assert_eq!(
        coord.trigger(UserGesture::click(5, 6)).unwrap(),
        TriggerOutcome::NothingPending
    );
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_effect_receives_gesture() {
    let coord = coordinator();
    let (tx, rx) = mpsc::channel();
    park(
        &coord,
        PendingAction::new(ExecutionId::new(), "where", move |g| {
            tx.send(*g).unwrap();
            Ok(())
        }),
    );

    coord.trigger(UserGesture::click(-3, 400)).unwrap();
    assert_eq!(rx.recv().unwrap(), UserGesture::click(-3, 400));
}

#[test]
fn test_trigger_with_nothing_pending() {
    let coord = coordinator();
    assert_eq!(
        coord.trigger(UserGesture::click(0, 0)).unwrap(),
        TriggerOutcome::NothingPending
    );
    assert!(coord.gate().is_free());
}

#[test]
fn test_second_defer_rejected() {
    let coord = coordinator();
    let first = park(&coord, counting_action(Arc::default()));

    let permit = coord.gate().acquire("second", SHORT).unwrap();
    let err = coord
        .defer(permit, counting_action(Arc::default()))
        .unwrap_err();
    assert!(matches!(err, DeferredError::AlreadyPending { pending } if pending == first));
    assert!(coord.gate().is_free());
}

#[test]
fn test_duplicate_gesture_while_running() {
    let coord = coordinator();
    let started = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let runs = Arc::new(AtomicUsize::new(0));

    let id = park(&coord, {
        let (started, release, runs) = (started.clone(), release.clone(), runs.clone());
        PendingAction::new(ExecutionId::new(), "slow", move |_| {
            runs.fetch_add(1, Ordering::SeqCst);
            started.wait();
            release.wait();
            Ok(())
        })
    });

    let first = {
        let coord = coord.clone();
        thread::spawn(move || coord.trigger(UserGesture::click(1, 1)))
    };
    started.wait();

    assert!(matches!(
        coord.status().unwrap(),
        DeferredStatus::Triggered { .. }
    ));
    assert_eq!(
        coord.trigger(UserGesture::click(2, 2)).unwrap(),
        TriggerOutcome::Duplicate { execution_id: id }
    );

    release.wait();
    assert!(matches!(
        first.join().unwrap().unwrap(),
        TriggerOutcome::Executed { .. }
    ));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert!(coord.status().unwrap().is_idle());
}

#[test]
fn test_resume_timeout_abandons_action() {
    let coord = coordinator();
    let runs = Arc::new(AtomicUsize::new(0));
    park(&coord, counting_action(runs.clone()));

    let blocker = coord.gate().acquire("long command", SHORT).unwrap();
    let err = coord.trigger(UserGesture::click(0, 0)).unwrap_err();
    drop(blocker);

    assert!(matches!(err, DeferredError::ResumeTimeout { .. }));
    assert_eq!(runs.load(Ordering::SeqCst), 0);
    assert!(coord.status().unwrap().is_idle());
    assert!(coord.gate().is_free());
}

#[test]
fn test_effect_error_resets_state() {
    let coord = coordinator();
    park(
        &coord,
        PendingAction::new(ExecutionId::new(), "fails", |_| Err("target vanished".into())),
    );

    let err = coord.trigger(UserGesture::click(0, 0)).unwrap_err();
    assert!(err.to_string().contains("target vanished"));
    assert!(coord.status().unwrap().is_idle());
    assert!(coord.gate().is_free());
}

#[test]
fn test_effect_panic_resets_state() {
    let coord = coordinator();
    park(
        &coord,
        PendingAction::new(ExecutionId::new(), "panics", |_| panic!("effect blew up")),
    );

    let result = {
        let coord = coord.clone();
        thread::spawn(move || coord.trigger(UserGesture::click(0, 0))).join()
    };
    assert!(result.is_err());
    assert!(coord.status().unwrap().is_idle());
    assert!(coord.gate().is_free());
}

#[test]
fn test_gate_held_while_effect_runs() {
    let coord = coordinator();
    let (tx, rx) = mpsc::channel();
    park(&coord, {
        let gate = coord.gate().clone();
        PendingAction::new(ExecutionId::new(), "observe", move |_| {
            tx.send((gate.is_free(), gate.holder())).unwrap();
            Ok(())
        })
    });

    coord.trigger(UserGesture::click(0, 0)).unwrap();
    let (free, holder) = rx.recv().unwrap();
    assert!(!free);
    assert!(holder.unwrap().starts_with("deferred:"));
}

#[test]
fn test_cancel() {
    let coord = coordinator();
    let runs = Arc::new(AtomicUsize::new(0));
    let id = park(&coord, counting_action(runs.clone()));

    assert_eq!(coord.cancel().unwrap(), Some(id));
    assert_eq!(coord.cancel().unwrap(), None);
    assert_eq!(
        coord.trigger(UserGesture::click(0, 0)).unwrap(),
        TriggerOutcome::NothingPending
    );
    assert_eq!(runs.load(Ordering::SeqCst), 0);
}

#[test]
fn test_expire_stale() {
    let coord = coordinator();
    let id = park(&coord, counting_action(Arc::default()));

    assert_eq!(coord.expire_stale(Duration::from_secs(60)).unwrap(), None);
    thread::sleep(Duration::from_millis(20));
    assert_eq!(coord.expire_stale(Duration::from_millis(10)).unwrap(), Some(id));
    assert!(coord.status().unwrap().is_idle());
}

#[test]
fn test_wait_until_idle() {
    let coord = coordinator();
    coord.wait_until_idle(SHORT).unwrap();

    park(&coord, counting_action(Arc::default()));
    assert!(matches!(
        coord.wait_until_idle(SHORT),
        Err(DeferredError::WaitTimeout { state: "awaiting", .. })
    ));

    let trigger = {
        let coord = coord.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            coord.trigger(UserGesture::click(0, 0))
        })
    };
    coord.wait_until_idle(Duration::from_secs(2)).unwrap();
    trigger.join().unwrap().unwrap();
}

#[test]
fn test_status_serializes_with_state_tag() {
    let coord = coordinator();
    let json = serde_json::to_value(coord.status().unwrap()).unwrap();
    assert_eq!(json["state"], "idle");

    let id = park(&coord, counting_action(Arc::default()));
    let json = serde_json::to_value(coord.status().unwrap()).unwrap();
    assert_eq!(json["state"], "awaiting");
    assert_eq!(json["execution_id"], id.to_string());
}

#[test]
fn test_reset_guard_returns_to_idle() {
    let coord = coordinator();
    *coord.state.lock() = DeferredState::Triggered {
        execution_id: ExecutionId::new(),
        description: "running".to_string(),
    };

    drop(ResetOnDrop { coordinator: &coord });
    assert!(coord.status().unwrap().is_idle());
}

#[test]
fn test_reset_guard_gives_up_after_state_lock_timeout() {
    let coord = DeferredCoordinator::new(Arc::new(ExecutionGate::new()))
        .with_timeouts(Duration::from_millis(20), SHORT);
    let id = ExecutionId::new();

    let mut held = coord.state.lock();
    *held = DeferredState::Triggered {
        execution_id: id,
        description: "running".to_string(),
    };
    let started = Instant::now();
    drop(ResetOnDrop { coordinator: &coord });
    assert!(started.elapsed() < Duration::from_secs(1));
    drop(held);

    assert_eq!(coord.status().unwrap().execution_id(), Some(id));
}
