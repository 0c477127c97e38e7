//! Simulated column strobe.
//!
//! Stands in for the M68's edge-triggered scan mechanism: a detached thread
//! cycles through the 15 columns at the configured period, fetching each
//! column's row pattern through the read handle exactly as the pin driver
//! would on a strobe edge, and logging every observed transition. Each full
//! sweep bumps a heartbeat counter; the main loop watches the counter and
//! complains when scanning stalls, the way the real converter only kicks
//! its watchdog while strobe edges keep arriving.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::machine::m68::keymap::COLUMNS;
use crate::machine::m68::matrix::{IDLE, MatrixReader};

pub struct ScannerHandle {
    heartbeat: Arc<AtomicU64>,
}

impl ScannerHandle {
    /// Number of full 15-column sweeps completed so far.
    pub fn sweeps(&self) -> u64 {
        self.heartbeat.load(Ordering::Relaxed)
    }
}

pub fn spawn_scanner(reader: MatrixReader, period: Duration) -> ScannerHandle {
    let heartbeat = Arc::new(AtomicU64::new(0));
    let handle = ScannerHandle {
        heartbeat: heartbeat.clone(),
    };
    thread::spawn(move || {
        let mut last = [IDLE; COLUMNS];
        let mut column: u8 = 0;
        loop {
            let bits = reader.column(column);
            if bits != last[column as usize] {
                debug!("SCAN: col={column} bits={bits:#010b}");
                last[column as usize] = bits;
            }
            column += 1;
            if column as usize == COLUMNS {
                column = 0;
                heartbeat.fetch_add(1, Ordering::Relaxed);
            }
            if !period.is_zero() {
                thread::sleep(period);
            }
        }
    });
    handle
}

/// How long the scan may sit still before the supervisor complains. The
/// hardware converter reboots via watchdog after 20 s without strobe
/// edges; warning at 18 s mirrors its kick window.
const STALL_AFTER: Duration = Duration::from_secs(18);

/// Tracks heartbeat progress between main-loop iterations and reports a
/// stall at most once per episode.
pub struct StallMonitor {
    last_sweeps: u64,
    last_progress: Instant,
    warned: bool,
}

impl StallMonitor {
    pub fn new(now: Instant) -> Self {
        Self {
            last_sweeps: 0,
            last_progress: now,
            warned: false,
        }
    }

    /// Observe the current sweep count. Returns how long the scan has been
    /// stalled the first time the threshold is crossed.
    pub fn observe(&mut self, sweeps: u64, now: Instant) -> Option<Duration> {
        if sweeps != self.last_sweeps {
            self.last_sweeps = sweeps;
            self.last_progress = now;
            self.warned = false;
            return None;
        }
        let stalled = now.duration_since(self.last_progress);
        if stalled >= STALL_AFTER && !self.warned {
            self.warned = true;
            return Some(stalled);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::m68::matrix::Matrix;

    #[test]
    fn scanner_sweeps_and_observes_writes() {
        let matrix = Matrix::new();
        let handle = spawn_scanner(MatrixReader::new(matrix.clone()), Duration::ZERO);
        matrix.write(4, 0b1111_0111);
        let deadline = Instant::now() + Duration::from_secs(5);
        while handle.sweeps() < 2 {
            assert!(Instant::now() < deadline, "scanner made no progress");
            thread::yield_now();
        }
    }

    #[test]
    fn stall_monitor_warns_once_per_episode() {
        let start = Instant::now();
        let mut monitor = StallMonitor::new(start);

        // Progress keeps the monitor quiet.
        assert_eq!(monitor.observe(1, start + Duration::from_secs(30)), None);
        // No progress past the threshold: one warning, then silence.
        let stalled_at = start + Duration::from_secs(60);
        assert!(monitor.observe(1, stalled_at).is_some());
        assert_eq!(monitor.observe(1, stalled_at + Duration::from_secs(5)), None);
        // Progress resets the episode.
        assert_eq!(monitor.observe(2, stalled_at + Duration::from_secs(6)), None);
    }

    #[test]
    fn stall_monitor_tolerates_short_gaps() {
        let start = Instant::now();
        let mut monitor = StallMonitor::new(start);
        assert_eq!(monitor.observe(0, start + Duration::from_secs(17)), None);
        assert!(monitor.observe(0, start + Duration::from_secs(19)).is_some());
    }
}
