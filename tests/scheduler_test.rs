/*!
 * Scheduler Tests
 * End-to-end admission, preemption, and termination with real trials
 */

use pretty_assertions::assert_eq;
use sim_scheduler::{
    AdmissionState, HandleStatus, ProcessHandle, Scheduler, SchedulerError, SchedulerEvent, Step,
    Trial,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

fn endless(name: &str) -> Arc<Trial> {
    Arc::new(Trial::new(name).with_step_delay(Duration::from_millis(1)))
}

fn scheduler(capacity: usize) -> Scheduler {
    Scheduler::builder().with_capacity(capacity).build().unwrap()
}

async fn wait_for(events: &flume::Receiver<SchedulerEvent>, want: SchedulerEvent) {
    timeout(WAIT, async {
        loop {
            let event = events.recv_async().await.expect("event bus closed");
            if event == want {
                return;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {:?}", want));
}

#[tokio::test]
async fn test_capacity_scenario() {
    let scheduler = scheduler(2);
    let events = scheduler.subscribe();

    let ids = scheduler.register_batch((1..=4).map(|i| endless(&format!("t{}", i))));
    assert_eq!(ids, vec![1, 2, 3, 4]);

    scheduler.play_all(&ids).unwrap();
    let snap = scheduler.snapshot();
    assert_eq!(snap.running, vec![1, 2]);
    assert_eq!(snap.queued, vec![3, 4]);

    scheduler.stop(1).unwrap();
    wait_for(&events, SchedulerEvent::ProcessCompleted { id: 1 }).await;
    let snap = scheduler.snapshot();
    assert_eq!(snap.running, vec![2, 3]);
    assert_eq!(snap.queued, vec![4]);

    scheduler.set_capacity(1);
    let snap = scheduler.snapshot();
    assert_eq!(snap.running.len(), 1);
    assert_eq!(snap.queued.len(), 2);
    assert!(snap.queued[0] == 2 || snap.queued[0] == 3);
    assert_eq!(snap.queued[1], 4);
    assert_eq!(scheduler.capacity(), 1);

    scheduler.shutdown().await;
    assert_eq!(scheduler.stats().registered_now, 0);
}

#[tokio::test]
async fn test_deferred_kill_scenario() {
    let scheduler = scheduler(1);
    let events = scheduler.subscribe();

    let id = scheduler.register(endless("victim"));
    scheduler.play(id).unwrap();
    assert_eq!(scheduler.snapshot().running, vec![id]);

    scheduler.kill(id).unwrap();
    assert!(scheduler.exists(id));
    assert_eq!(scheduler.snapshot().kill_pending, vec![id]);
    assert!(scheduler.status(id).unwrap().kill_pending);

    scheduler.stop(id).unwrap();
    wait_for(&events, SchedulerEvent::ProcessKilled { id }).await;

    assert!(!scheduler.exists(id));
    let snap = scheduler.snapshot();
    assert!(snap.running.is_empty());
    assert!(snap.kill_pending.is_empty());

    let extra_kills = events
        .try_iter()
        .filter(|e| *e == SchedulerEvent::ProcessKilled { id })
        .count();
    assert_eq!(extra_kills, 0);
    assert_eq!(scheduler.stats().kills, 1);
}

#[tokio::test]
async fn test_killed_queued_process_never_runs() {
    let scheduler = scheduler(1);
    let first = endless("first");
    let second = endless("second");

    let a = scheduler.register(Arc::clone(&first));
    let b = scheduler.register(Arc::clone(&second));
    scheduler.play_all(&[a, b]).unwrap();
    assert_eq!(scheduler.snapshot().queued, vec![b]);

    scheduler.kill(b).unwrap();
    assert!(!scheduler.exists(b));
    assert!(scheduler.snapshot().queued.is_empty());

    scheduler.shutdown().await;
    assert_eq!(second.current_status(), HandleStatus::Ready);
    assert_eq!(second.current_step(), 0);
}

#[tokio::test]
async fn test_natural_completion_returns_to_idle() {
    let scheduler = scheduler(1);
    let events = scheduler.subscribe();

    let id = scheduler.register_and_play(Trial::new("short").with_max_steps(10));
    wait_for(&events, SchedulerEvent::ProcessCompleted { id }).await;

    let info = scheduler.status(id).unwrap();
    assert_eq!(info.admission, AdmissionState::Idle);
    assert_eq!(info.handle_status, HandleStatus::Finished);
    assert_eq!(info.segments_completed, 1);
    assert!(scheduler.exists(id));

    scheduler.kill(id).unwrap();
    assert!(!scheduler.exists(id));
}

#[tokio::test]
async fn test_pause_at_then_replay() {
    let scheduler = scheduler(1);
    let events = scheduler.subscribe();
    let trial = endless("resumable");

    let id = scheduler.register(Arc::clone(&trial));
    trial.pause_at(5);
    scheduler.play(id).unwrap();
    wait_for(&events, SchedulerEvent::ProcessCompleted { id }).await;

    assert_eq!(trial.current_step(), 5);
    assert_eq!(trial.current_status(), HandleStatus::Paused);
    assert_eq!(scheduler.status(id).unwrap().admission, AdmissionState::Idle);

    scheduler.play(id).unwrap();
    scheduler.stop_at(id, 50).unwrap();
    wait_for(&events, SchedulerEvent::ProcessCompleted { id }).await;

    assert_eq!(trial.current_step(), 50);
    assert_eq!(trial.current_status(), HandleStatus::Finished);
    assert_eq!(scheduler.status(id).unwrap().segments_completed, 2);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_pause_at_after_readmission_reaches_target() {
    let scheduler = scheduler(1);
    let events = scheduler.subscribe();
    let trial = Arc::new(
        Trial::new("readmitted")
            .with_max_steps(1000)
            .with_step_delay(Duration::from_millis(20)),
    );

    let id = scheduler.register(Arc::clone(&trial));
    scheduler.play(id).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    scheduler.set_capacity(0);
    scheduler.set_capacity(1);
    assert_eq!(scheduler.status(id).unwrap().admission, AdmissionState::Running);
    scheduler.pause_at(id, 30).unwrap();

    timeout(WAIT, async {
        loop {
            if events.recv_async().await.unwrap() == (SchedulerEvent::ProcessCompleted { id })
                && scheduler.status(id).unwrap().admission == AdmissionState::Idle
            {
                return;
            }
        }
    })
    .await
    .unwrap();

    assert_eq!(trial.current_step(), 30);
    assert_eq!(trial.current_status(), HandleStatus::Paused);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_failure_does_not_disturb_others() {
    let scheduler = scheduler(1);
    let events = scheduler.subscribe();

    let faulty = Trial::new("faulty").with_step_fn(|step: Step| {
        anyhow::ensure!(step < 3, "diverged");
        Ok(())
    });
    let a = scheduler.register(faulty);
    let b = scheduler.register(Trial::new("healthy").with_max_steps(5));
    scheduler.play_all(&[a, b]).unwrap();

    let failure = timeout(WAIT, async {
        loop {
            if let SchedulerEvent::ProcessFailed { id, cause } = events.recv_async().await.unwrap() {
                return (id, cause);
            }
        }
    })
    .await
    .unwrap();
    assert_eq!(failure.0, a);
    assert!(failure.1.contains("diverged"), "{}", failure.1);

    wait_for(&events, SchedulerEvent::ProcessCompleted { id: b }).await;
    assert_eq!(
        scheduler.status(b).unwrap().handle_status,
        HandleStatus::Finished
    );
    assert!(scheduler.exists(a));

    let stats = scheduler.stats();
    assert_eq!(stats.failures, 1);
    assert_eq!(stats.running_now, 0);
}

struct Exploding;

impl ProcessHandle for Exploding {
    fn begin_stepping(&self) -> anyhow::Result<()> {
        panic!("step loop exploded");
    }
    fn pause(&self) {}
    fn pause_at(&self, _step: Step) {}
    fn stop(&self) {}
    fn stop_at(&self, _step: Step) {}
    fn current_status(&self) -> HandleStatus {
        HandleStatus::Ready
    }
}

#[tokio::test]
async fn test_panicking_handle_is_reported() {
    let scheduler = scheduler(1);
    let events = scheduler.subscribe();

    let id = scheduler.register_and_play(Exploding);
    let cause = timeout(WAIT, async {
        loop {
            if let SchedulerEvent::ProcessFailed { cause, .. } = events.recv_async().await.unwrap() {
                return cause;
            }
        }
    })
    .await
    .unwrap();

    assert!(cause.contains("step loop exploded"), "{}", cause);
    wait_for(&events, SchedulerEvent::ProcessCompleted { id }).await;
    assert_eq!(scheduler.status(id).unwrap().admission, AdmissionState::Idle);
}

#[tokio::test]
async fn test_preempted_process_resumes_first() {
    let scheduler = scheduler(2);
    let events = scheduler.subscribe();
    let first = endless("first");

    let a = scheduler.register(Arc::clone(&first));
    let b = scheduler.register(endless("second"));
    let c = scheduler.register(endless("third"));
    scheduler.play_all(&[a, b]).unwrap();

    scheduler.set_capacity(1);
    wait_for(&events, SchedulerEvent::ProcessPreempted { id: a }).await;
    scheduler.play(c).unwrap();
    assert_eq!(scheduler.snapshot().queued, vec![a, c]);

    wait_for(&events, SchedulerEvent::ProcessCompleted { id: a }).await;
    assert_eq!(first.current_status(), HandleStatus::Paused);
    let paused_at = first.current_step();

    scheduler.set_capacity(2);
    wait_for(&events, SchedulerEvent::ProcessStarted { id: a }).await;
    assert_eq!(scheduler.snapshot().running, vec![b, a]);
    assert_eq!(scheduler.snapshot().queued, vec![c]);

    scheduler.shutdown().await;
    assert!(first.current_step() >= paused_at);
}

#[tokio::test]
async fn test_unknown_id_is_not_found() {
    let scheduler = scheduler(1);
    assert_eq!(scheduler.play(99), Err(SchedulerError::NotFound(99)));
    assert_eq!(scheduler.pause(99), Err(SchedulerError::NotFound(99)));
    assert_eq!(scheduler.pause_at(99, 1), Err(SchedulerError::NotFound(99)));
    assert_eq!(scheduler.stop(99), Err(SchedulerError::NotFound(99)));
    assert_eq!(scheduler.stop_at(99, 1), Err(SchedulerError::NotFound(99)));
    assert_eq!(scheduler.kill(99), Err(SchedulerError::NotFound(99)));
    assert!(scheduler.status(99).unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_play_all_reports_unknown_but_plays_rest() {
    let scheduler = scheduler(0);
    let a = scheduler.register(endless("a"));

    assert_eq!(scheduler.play_all(&[42, a]), Err(SchedulerError::NotFound(42)));
    assert_eq!(scheduler.snapshot().queued, vec![a]);

    scheduler.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_drains_everything() {
    let scheduler = scheduler(2);
    let ids = scheduler.register_batch_and_play((0..4).map(|i| endless(&format!("t{}", i))));
    assert_eq!(scheduler.snapshot().running.len(), 2);

    timeout(WAIT, scheduler.shutdown()).await.unwrap();

    let stats = scheduler.stats();
    assert_eq!(stats.registered_now, 0);
    assert_eq!(stats.running_now, 0);
    assert_eq!(stats.kills, 4);
    assert!(ids.iter().all(|&id| !scheduler.exists(id)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_capacity_never_exceeded_under_churn() {
    const TRIALS: usize = 12;
    let scheduler = scheduler(3);
    let events = scheduler.subscribe();

    scheduler.register_batch_and_play(
        (0..TRIALS).map(|i| Trial::new(format!("t{}", i)).with_max_steps(20)),
    );

    let mut killed = 0;
    timeout(WAIT, async {
        while killed < TRIALS {
            match events.recv_async().await.unwrap() {
                SchedulerEvent::ProcessStarted { .. } => {
                    assert!(scheduler.snapshot().running.len() <= 3);
                }
                SchedulerEvent::ProcessCompleted { id } => {
                    if let Ok(info) = scheduler.status(id) {
                        if info.handle_status == HandleStatus::Finished {
                            scheduler.kill(id).unwrap();
                        }
                    }
                }
                SchedulerEvent::ProcessKilled { .. } => killed += 1,
                _ => {}
            }
        }
    })
    .await
    .unwrap();

    let stats = scheduler.stats();
    assert_eq!(stats.admissions, TRIALS as u64);
    assert_eq!(stats.registered_now, 0);
}
