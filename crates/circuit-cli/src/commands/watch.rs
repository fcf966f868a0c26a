use super::App;
use anyhow::Result;
use circuit_application::{AutoAdvanceTicker, ObserveTarget, SessionObserver};
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;

/// Prints one JSON `SessionView` line per change and per poll until the
/// session finishes or Ctrl-C.
///
/// With `auto_advance` this terminal also acts as a coach client and runs
/// deadline checks; any number of such clients may run at once.
pub async fn run(app: &App, id: String, auto_advance: bool) -> Result<()> {
    let cancel = CancellationToken::new();

    let observer = SessionObserver::from_config(app.usecase.repository(), &app.config);
    let mut rx = observer.observe(ObserveTarget::Session(id.clone()), cancel.clone());

    let ticker = auto_advance.then(|| {
        AutoAdvanceTicker::from_config(app.usecase.clone(), &app.config)
            .spawn(id.clone(), cancel.clone())
    });

    let mut countdown = interval(observer.poll_interval());
    countdown.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = countdown.tick() => {}
        }

        let Some(session) = rx.borrow_and_update().clone() else {
            continue;
        };
        let view = app.usecase.project(&session);
        println!("{}", serde_json::to_string(&view)?);

        if session.is_terminal() {
            break;
        }
    }

    cancel.cancel();
    if let Some(handle) = ticker
        && let Err(e) = handle.await
    {
        tracing::warn!("Auto-advance ticker failed: {}", e);
    }
    Ok(())
}
