//! Acquisition abstraction.
//!
//! A scan runs on a worker and reports progress through a [`ScanMonitor`].
//! The caller blocks in [`ScanMonitor::wait`] until the scan finishes, fails,
//! is cancelled, or the deadline passes; the monitor wakes waiters through a
//! condition variable, so there is no sleep polling. A scan delivers either a
//! complete [`ChannelSet`] or an error, never a partial buffer.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use hound::WavReader;
use tracing::{debug, info, warn};
use tubemat_core::{ChannelSet, MIC_COUNT, TimeSeries};

use crate::wav::{decode, read_wav_info};
use crate::{Error, Result};

/// Why a scan did not deliver data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcquisitionError {
    /// The deadline passed before the scan completed.
    #[error("scan timed out after {timeout:?} ({acquired} of {total} frames)")]
    Timeout {
        /// Timeout that expired.
        timeout: Duration,
        /// Frames acquired before the deadline.
        acquired: usize,
        /// Frames expected.
        total: usize,
    },

    /// The scan was cancelled by the caller.
    #[error("scan cancelled")]
    Cancelled,

    /// The device or backend reported a fault.
    #[error("device error: {0}")]
    Device(String),
}

/// Life cycle of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Not started.
    #[default]
    Idle,
    /// Acquiring.
    Running,
    /// All frames acquired.
    Finished,
    /// The backend failed.
    Failed,
    /// Stopped on request.
    Cancelled,
}

impl ScanState {
    /// Whether the scan has stopped for good.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ScanState::Finished | ScanState::Failed | ScanState::Cancelled
        )
    }
}

#[derive(Debug, Default)]
struct Progress {
    state: ScanState,
    acquired: usize,
    total: usize,
    failure: Option<String>,
    cancel_requested: bool,
}

/// Shared scan progress, cloned between the caller and the worker.
#[derive(Debug, Clone, Default)]
pub struct ScanMonitor {
    shared: Arc<(Mutex<Progress>, Condvar)>,
}

impl ScanMonitor {
    /// Fresh monitor in the idle state.
    pub fn new() -> Self {
        Self::default()
    }

    fn progress(&self) -> MutexGuard<'_, Progress> {
        // Progress stays consistent even if a holder panicked
        self.shared.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut Progress)) {
        f(&mut self.progress());
        self.shared.1.notify_all();
    }

    /// Mark the scan as running with `total` expected frames.
    ///
    /// A cancellation requested before the start sticks.
    pub fn begin(&self, total: usize) {
        self.update(|p| {
            p.total = total;
            p.acquired = 0;
            if !p.cancel_requested {
                p.state = ScanState::Running;
            }
        });
    }

    /// Record `frames` more acquired frames.
    pub fn advance(&self, frames: usize) {
        self.update(|p| p.acquired += frames);
    }

    /// Mark the scan as complete.
    pub fn finish(&self) {
        self.update(|p| {
            if !p.state.is_terminal() {
                p.state = ScanState::Finished;
            }
        });
    }

    /// Mark the scan as failed.
    pub fn fail(&self, reason: impl Into<String>) {
        let reason = reason.into();
        self.update(|p| {
            if !p.state.is_terminal() {
                p.state = ScanState::Failed;
                p.failure = Some(reason);
            }
        });
    }

    /// Request cancellation. Workers observe it through [`is_cancelled`](Self::is_cancelled).
    pub fn cancel(&self) {
        self.update(|p| {
            p.cancel_requested = true;
            if !p.state.is_terminal() {
                p.state = ScanState::Cancelled;
            }
        });
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.progress().cancel_requested
    }

    /// Current state.
    pub fn state(&self) -> ScanState {
        self.progress().state
    }

    /// Frames acquired so far.
    pub fn acquired(&self) -> usize {
        self.progress().acquired
    }

    /// Frames expected in total.
    pub fn total(&self) -> usize {
        self.progress().total
    }

    /// Block until the scan stops or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> std::result::Result<(), AcquisitionError> {
        let deadline = Instant::now() + timeout;
        let (lock, condvar) = &*self.shared;
        let mut progress = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !progress.state.is_terminal() {
            let now = Instant::now();
            if now >= deadline {
                return Err(AcquisitionError::Timeout {
                    timeout,
                    acquired: progress.acquired,
                    total: progress.total,
                });
            }
            progress = condvar
                .wait_timeout(progress, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        match progress.state {
            ScanState::Cancelled => Err(AcquisitionError::Cancelled),
            ScanState::Failed => Err(AcquisitionError::Device(
                progress.failure.clone().unwrap_or_default(),
            )),
            _ => Ok(()),
        }
    }
}

/// Per-scan settings handed to an [`Acquisition`].
#[derive(Debug, Clone)]
pub struct ScanControl {
    monitor: ScanMonitor,
    timeout: Duration,
}

impl ScanControl {
    /// Control with a fresh monitor.
    pub fn new(timeout: Duration) -> Self {
        Self::with_monitor(ScanMonitor::new(), timeout)
    }

    /// Control reporting to an existing monitor, e.g. one shared with a
    /// Ctrl-C handler.
    pub fn with_monitor(monitor: ScanMonitor, timeout: Duration) -> Self {
        Self { monitor, timeout }
    }

    /// Progress monitor.
    pub fn monitor(&self) -> &ScanMonitor {
        &self.monitor
    }

    /// Time allowed for the whole scan.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Cancel the scan.
    pub fn cancel(&self) {
        self.monitor.cancel();
    }
}

/// A source of synchronized four-channel scans.
pub trait Acquisition {
    /// Play `stimulus` and record the four microphones.
    ///
    /// Returns a complete scan or an error; on error no samples are returned.
    fn acquire(&mut self, stimulus: &TimeSeries, control: &ScanControl) -> Result<ChannelSet>;
}

/// Replays a recorded four-channel scan from a WAV file.
///
/// Samples are read on a worker thread in chunks, reporting progress after
/// each chunk and stopping at the first chunk boundary after a cancellation.
/// The first `settle` seconds are dropped from the delivered scan.
#[derive(Debug, Clone)]
pub struct WavReplay {
    path: PathBuf,
    settle_secs: f64,
    chunk_frames: usize,
}

impl WavReplay {
    /// Replay of the scan stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settle_secs: 0.0,
            chunk_frames: 4800,
        }
    }

    /// Drop the first `secs` seconds of the scan.
    pub fn with_settle(mut self, secs: f64) -> Self {
        self.settle_secs = secs.max(0.0);
        self
    }

    /// Frames read between progress reports.
    pub fn with_chunk_frames(mut self, frames: usize) -> Self {
        self.chunk_frames = frames.max(1);
        self
    }

    /// File being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn replay(path: &Path, chunk_frames: usize, monitor: &ScanMonitor) -> Result<Vec<f64>> {
    let reader = WavReader::open(path)?;
    let channels = usize::from(reader.spec().channels);
    let mut buffer = Vec::with_capacity(reader.len() as usize);
    let mut samples = decode(reader);

    loop {
        if monitor.is_cancelled() {
            return Err(AcquisitionError::Cancelled.into());
        }
        let before = buffer.len();
        for sample in samples.by_ref().take(chunk_frames * channels) {
            buffer.push(sample?);
        }
        let read = buffer.len() - before;
        if read == 0 {
            break;
        }
        monitor.advance(read / channels);
    }
    Ok(buffer)
}

impl Acquisition for WavReplay {
    fn acquire(&mut self, stimulus: &TimeSeries, control: &ScanControl) -> Result<ChannelSet> {
        let info = read_wav_info(&self.path)?;
        if usize::from(info.channels) != MIC_COUNT {
            return Err(Error::ChannelCount {
                expected: MIC_COUNT as u16,
                found: info.channels,
            });
        }
        let sample_rate = f64::from(info.sample_rate);
        if sample_rate != stimulus.sample_rate() {
            return Err(tubemat_core::Error::invalid(
                "sample_rate",
                format!(
                    "recording is {sample_rate} Hz, stimulus is {} Hz",
                    stimulus.sample_rate()
                ),
            )
            .into());
        }
        if (info.num_frames as usize) < stimulus.len() {
            warn!(
                recorded = info.num_frames,
                played = stimulus.len(),
                "recording is shorter than the stimulus"
            );
        }

        let monitor = control.monitor().clone();
        monitor.begin(info.num_frames as usize);
        let (tx, rx) = mpsc::channel();
        let path = self.path.clone();
        let chunk_frames = self.chunk_frames;
        let worker = thread::Builder::new()
            .name("wav-replay".into())
            .spawn(move || {
                let result = replay(&path, chunk_frames, &monitor);
                match &result {
                    Ok(_) => monitor.finish(),
                    Err(Error::Acquisition(AcquisitionError::Cancelled)) => {}
                    Err(e) => monitor.fail(e.to_string()),
                }
                // The receiver only goes away if the caller already gave up
                let _ = tx.send(result);
            })?;

        let waited = control.monitor().wait(control.timeout());
        if waited.is_err() {
            control.cancel();
        }
        if worker.join().is_err() {
            return Err(AcquisitionError::Device("replay worker panicked".into()).into());
        }
        waited?;

        let buffer = rx
            .recv()
            .map_err(|_| AcquisitionError::Device("replay worker sent no data".into()))??;
        let channels = ChannelSet::from_interleaved(sample_rate, &buffer)?;
        let settle = (self.settle_secs * sample_rate).round() as usize;
        info!(
            frames = channels.len(),
            settle_frames = settle,
            path = %self.path.display(),
            "scan acquired"
        );
        let channels = channels.skip_leading(settle);
        debug!(frames = channels.len(), "settling transient dropped");
        Ok(channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_times_out_while_running() {
        let monitor = ScanMonitor::new();
        monitor.begin(100);
        monitor.advance(40);
        let err = monitor.wait(Duration::from_millis(20)).unwrap_err();
        assert_eq!(
            err,
            AcquisitionError::Timeout {
                timeout: Duration::from_millis(20),
                acquired: 40,
                total: 100
            }
        );
        assert_eq!(monitor.state(), ScanState::Running);
    }

    #[test]
    fn cancel_from_another_thread_wakes_waiter() {
        let monitor = ScanMonitor::new();
        monitor.begin(10);
        let remote = monitor.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            remote.cancel();
        });
        let started = Instant::now();
        let err = monitor.wait(Duration::from_secs(10)).unwrap_err();
        handle.join().unwrap();
        assert_eq!(err, AcquisitionError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn finished_scan_returns_immediately() {
        let monitor = ScanMonitor::new();
        monitor.begin(1);
        monitor.advance(1);
        monitor.finish();
        assert!(monitor.wait(Duration::ZERO).is_ok());
        // Late cancellation does not rewrite a completed scan
        monitor.cancel();
        assert_eq!(monitor.state(), ScanState::Finished);
    }

    #[test]
    fn failure_carries_reason() {
        let monitor = ScanMonitor::new();
        monitor.begin(1);
        monitor.fail("usb disconnected");
        assert_eq!(
            monitor.wait(Duration::from_secs(1)),
            Err(AcquisitionError::Device("usb disconnected".into()))
        );
    }

    #[test]
    fn cancel_before_begin_sticks() {
        let monitor = ScanMonitor::new();
        monitor.cancel();
        monitor.begin(10);
        assert_eq!(monitor.state(), ScanState::Cancelled);
        assert!(monitor.is_cancelled());
    }
}
