use engine_core::progress::ProgressTable;
use engine_runtime::summary::{RunOutcome, RunSummary};
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle, time};

const BAR_WIDTH: usize = 24;

/// Renders the progress board once per second until the run signals
/// completion, then prints one final reading.
pub fn spawn_reporter(
    progress: Arc<ProgressTable>,
    mut done: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = time::interval(Duration::from_secs(1));
        tick.set_missed_tick_behavior(time::MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so a fast run prints
        // only its final state.
        tick.tick().await;

        loop {
            tokio::select! {
                _ = tick.tick() => print_progress(&progress),
                _ = done.changed() => {
                    print_progress(&progress);
                    break;
                }
            }
        }
    })
}

fn print_progress(progress: &ProgressTable) {
    for (worker, snapshot) in progress.snapshot().iter().enumerate() {
        println!(
            "worker {:>2} {} {:>3}% ({}/{})",
            worker,
            bar(snapshot.percent()),
            snapshot.percent(),
            snapshot.done,
            snapshot.total
        );
    }
    let total = progress.aggregate();
    println!(
        "total     {} {:>3}% ({}/{})",
        bar(total.percent()),
        total.percent(),
        total.done,
        total.total
    );
}

fn bar(percent: u8) -> String {
    let filled = (percent as usize * BAR_WIDTH) / 100;
    format!("[{}{}]", "=".repeat(filled), " ".repeat(BAR_WIDTH - filled))
}

pub fn print_summary(summary: &RunSummary) {
    println!("-----------------------------");
    let outcome = match summary.outcome {
        RunOutcome::Committed => "committed",
        RunOutcome::RolledBack => "rolled back",
    };
    println!("{:<16} {}", "Outcome", outcome);
    println!("{:<16} {}", "Rows planned", summary.rows_planned);
    println!("{:<16} {}", "Rows copied", summary.rows_copied);
    println!("{:<16} {} ms", "Elapsed", summary.elapsed_ms);
    for error in &summary.worker_errors {
        println!("{:<16} {}", "Worker error", error);
    }
}
