use chrono::{DateTime, Duration, TimeZone, Utc};
use circuit_application::{ObserveTarget, SessionObserver, SessionUseCase, TemplateSource};
use circuit_core::clock::ManualClock;
use circuit_core::session::{AutoAdvanceOutcome, NoOpReason, SessionStatus};
use circuit_core::template::BlockMode;
use circuit_infrastructure::{CircuitPaths, FileSessionRepository, TomlTemplateProvider};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const FRIDAY: &str = r#"
name = "Friday Burner"

[[blocks]]
name = "Warm-up"

[[blocks.steps]]
title = "Row"
step_kind = "time"
duration_ms = 1000

[[blocks.steps]]
title = "Air squats"
step_kind = "reps"
reps = 15

[[blocks]]
name = "Cool-down stretch"
steps = []

[[blocks]]
name = "AMRAP 6"
block_mode = "amrap"
block_duration_seconds = 360

[[blocks.steps]]
title = "Burpees"
step_kind = "reps"
reps = 5
"#;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 8, 18, 0, 0).unwrap()
}

/// One "client": its own use case over the shared data directory.
fn client(dir: &TempDir, clock: Arc<ManualClock>) -> SessionUseCase {
    let paths = CircuitPaths::new(Some(dir.path()));
    let sessions = FileSessionRepository::new(paths.sessions_dir().unwrap()).unwrap();
    let templates = TomlTemplateProvider::new(paths.templates_dir().unwrap());
    SessionUseCase::new(Arc::new(sessions), Arc::new(templates), clock)
}

fn setup() -> (TempDir, Arc<ManualClock>) {
    let dir = TempDir::new().unwrap();
    let templates_dir = dir.path().join("templates");
    std::fs::create_dir_all(&templates_dir).unwrap();
    std::fs::write(templates_dir.join("friday.toml"), FRIDAY).unwrap();
    (dir, Arc::new(ManualClock::new(t0())))
}

#[tokio::test]
async fn test_session_survives_reopen() {
    let (dir, clock) = setup();
    let session = client(&dir, clock.clone())
        .start("gym-north", TemplateSource::Id("friday".to_string()))
        .await
        .unwrap();

    clock.advance_ms(300);
    client(&dir, clock.clone()).pause(&session.id).await.unwrap();

    let reopened = client(&dir, clock.clone()).get(&session.id).await.unwrap();
    assert_eq!(reopened.status, SessionStatus::Paused);
    assert_eq!(reopened.remaining_ms, Some(700));
    assert_eq!(reopened.state_version, 2);
    assert_eq!(reopened.template_snapshot.name, "Friday Burner");
}

#[tokio::test]
async fn test_walk_skips_empty_block_and_expires_block_timer() {
    let (dir, clock) = setup();
    let usecase = client(&dir, clock.clone());
    let session = usecase
        .start("gym-north", TemplateSource::Id("friday".to_string()))
        .await
        .unwrap();

    // Row times out onto the untimed squats
    clock.advance_ms(1000);
    let squats = usecase
        .auto_advance_check(&session.id, 1)
        .await
        .unwrap()
        .into_session();
    assert_eq!(squats.current_step_index, Some(1));
    assert_eq!(squats.step_end_time, None);

    // The empty stretch block is skipped on the way to the AMRAP
    let amrap = usecase.next_step(&session.id).await.unwrap();
    assert_eq!(amrap.current_block_index, 2);
    assert_eq!(amrap.view_mode, BlockMode::Amrap);
    assert_eq!(amrap.current_step_index, None);
    assert_eq!(amrap.block_end_time, Some(clock_now(&clock) + Duration::seconds(360)));

    // Manual step navigation does not apply to a timed block
    assert!(usecase.next_step(&session.id).await.unwrap_err().is_precondition());
    // Jumping back onto the empty block is refused
    assert!(matches!(
        usecase.prev_block(&session.id).await.unwrap_err(),
        circuit_core::CircuitError::EmptyBlock { block_index: 1 }
    ));

    clock.advance_ms(360_000);
    let ended = usecase
        .auto_advance_check(&session.id, amrap.state_version)
        .await
        .unwrap();
    assert!(ended.advanced());
    assert_eq!(ended.session().status, SessionStatus::Ended);
}

fn clock_now(clock: &ManualClock) -> DateTime<Utc> {
    use circuit_core::clock::Clock;
    clock.now()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_clients_racing_on_shared_directory() {
    let (dir, clock) = setup();
    let session = client(&dir, clock.clone())
        .start("gym-north", TemplateSource::Id("friday".to_string()))
        .await
        .unwrap();
    clock.advance_ms(1500);

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let usecase = client(&dir, clock.clone());
            let id = session.id.clone();
            tokio::spawn(async move { usecase.auto_advance_check(&id, 1).await })
        })
        .collect();

    let mut advanced = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            AutoAdvanceOutcome::Advanced { .. } => advanced += 1,
            AutoAdvanceOutcome::NoOp { reason, session } => {
                assert_eq!(reason, NoOpReason::Stale);
                assert_eq!(session.state_version, 2);
            }
        }
    }
    assert_eq!(advanced, 1);

    // Every client now reads the single advanced record
    let usecase = client(&dir, clock.clone());
    let current = usecase.get(&session.id).await.unwrap();
    assert_eq!(current.state_version, 2);
    assert_eq!(current.current_step_index, Some(1));
}

#[tokio::test]
async fn test_observer_sees_changes_from_another_client() {
    let (dir, clock) = setup();
    let coach = client(&dir, clock.clone());
    let display = client(&dir, clock.clone());
    let session = coach
        .start("gym-north", TemplateSource::Id("friday".to_string()))
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let observer = SessionObserver::new(display.repository(), std::time::Duration::from_millis(20));
    let mut rx = observer.observe(ObserveTarget::Gym("gym-north".to_string()), cancel.clone());

    let wait = std::time::Duration::from_secs(5);
    tokio::time::timeout(wait, rx.changed()).await.unwrap().unwrap();
    assert_eq!(rx.borrow_and_update().as_ref().unwrap().id, session.id);

    coach.pause(&session.id).await.unwrap();
    tokio::time::timeout(wait, rx.changed()).await.unwrap().unwrap();
    let seen = rx.borrow_and_update().clone().unwrap();
    assert_eq!(seen.status, SessionStatus::Paused);
    assert_eq!(seen.state_version, 2);

    cancel.cancel();
}
