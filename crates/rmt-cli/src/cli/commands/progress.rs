//! Progress printing task fed by the transfer's progress callback.

use rmt_core::progress::ProgressStats;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const PROGRESS_INTERVAL_MS: u64 = 500;

/// Spawn the printing task. Returns the sender the progress callback feeds; the
/// task ends once every sender is dropped.
pub fn spawn_printer() -> (mpsc::Sender<ProgressStats>, JoinHandle<()>) {
    let (progress_tx, mut progress_rx) = mpsc::channel::<ProgressStats>(16);
    let handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        let mut printed = false;
        while let Some(stats) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                || stats.parts_done >= stats.part_count
            {
                let done_mib = stats.bytes_done as f64 / 1_048_576.0;
                let total_mib = stats.total_bytes as f64 / 1_048_576.0;
                let pct = stats.fraction() * 100.0;
                let rate_mib = stats.bytes_per_sec() / 1_048_576.0;
                let eta = stats
                    .eta_secs()
                    .map(|s| format!("{:.0}s", s))
                    .unwrap_or_else(|| "?".to_string());
                println!(
                    "  part {}/{}  {:.1} / {:.1} MiB ({:.1}%)  {:.2} MiB/s  ETA {}",
                    stats.parts_done, stats.part_count, done_mib, total_mib, pct, rate_mib, eta
                );
                last_print = now;
                printed = true;
            }
        }
        if printed {
            println!();
        }
    });
    (progress_tx, handle)
}
