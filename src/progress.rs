//! Progress estimation from dnf/dnf5 transaction output.

use std::collections::VecDeque;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::Result;
use crate::exec::{stream_checked, CommandSpec, OutputLine};

const TRANSCRIPT_LEN: usize = 10;
const STATUS_MAX_CHARS: usize = 80;
const START_FRACTION: f64 = 0.2;
// Markers never claim more than this; only counters and the exit status do.
const MARKER_CAP: f64 = 0.95;

static COUNTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\s*(\d+)/(\d+)\]").expect("valid regex"));
static TRAILING_COUNTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s(\d+)/(\d+)\s*$").expect("valid regex"));
static TRAILING_PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(\d{1,3})%\s*$").expect("valid regex"));
static INBOUND_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Total size of inbound packages is (\d+(?:\.\d+)?\s*\w+)").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub fraction: f64,
    pub status: String,
    pub transcript: Vec<String>,
}

pub struct ProgressTracker {
    fraction: f64,
    base_status: String,
    status: String,
    transcript: VecDeque<String>,
}

impl ProgressTracker {
    pub fn new(status: impl Into<String>) -> Self {
        let status = status.into();
        Self {
            fraction: START_FRACTION,
            base_status: status.clone(),
            status,
            transcript: VecDeque::with_capacity(TRANSCRIPT_LEN),
        }
    }

    pub fn fraction(&self) -> f64 {
        self.fraction
    }

    /// Feeds one output line and returns the updated snapshot.
    pub fn feed(&mut self, line: &str) -> ProgressUpdate {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return self.snapshot();
        }

        if self.transcript.len() == TRANSCRIPT_LEN {
            self.transcript.pop_front();
        }
        self.transcript.push_back(trimmed.to_string());

        let percent = TRAILING_PERCENT_RE
            .captures(trimmed)
            .map(|caps| caps[1].to_string());
        let text = TRAILING_PERCENT_RE.replace(trimmed, "");

        if let Some(caps) = INBOUND_SIZE_RE.captures(&text) {
            self.base_status = format!("Total download size: {}", &caps[1]);
        } else if let Some((done, total)) = counter(trimmed) {
            // Counters are exact, so they may reach 1.0 before the exit status
            self.raise(done as f64 / total as f64);
            self.base_status = shorten(&text);
        } else if let Some((fraction, status)) = marker(&text) {
            self.raise(fraction.min(MARKER_CAP));
            self.base_status = status.to_string();
        }

        self.status = match percent {
            Some(percent) => format!("{} ({}%)", self.base_status, percent),
            None => self.base_status.clone(),
        };

        self.snapshot()
    }

    pub fn finish(&mut self, success: bool) -> ProgressUpdate {
        if success {
            self.fraction = 1.0;
        }
        self.base_status = if success { "Completed" } else { "Failed" }.to_string();
        self.status = self.base_status.clone();
        self.snapshot()
    }

    pub fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            fraction: self.fraction,
            status: self.status.clone(),
            transcript: self.transcript.iter().cloned().collect(),
        }
    }

    fn raise(&mut self, fraction: f64) {
        if fraction > self.fraction {
            self.fraction = fraction;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    Output(OutputLine),
    Progress(ProgressUpdate),
}

/// Runs `steps` in order, streaming every line through a [`ProgressTracker`].
/// Stops at the first failing step.
pub async fn run_tracked<F>(steps: &[CommandSpec], status: &str, mut emit: F) -> Result<ProgressUpdate>
where
    F: FnMut(TaskEvent),
{
    let mut tracker = ProgressTracker::new(status);
    emit(TaskEvent::Progress(tracker.snapshot()));

    for (index, step) in steps.iter().enumerate() {
        info!(step = index + 1, total = steps.len(), command = %step.display(), "running task step");
        let result = stream_checked(step, |line| {
            let update = tracker.feed(line.text());
            emit(TaskEvent::Output(line));
            emit(TaskEvent::Progress(update));
        })
        .await;

        if let Err(e) = result {
            warn!(command = %step.display(), error = %e, "task step failed");
            emit(TaskEvent::Progress(tracker.finish(false)));
            return Err(e);
        }
    }

    let done = tracker.finish(true);
    emit(TaskEvent::Progress(done.clone()));
    Ok(done)
}

fn counter(line: &str) -> Option<(u32, u32)> {
    let caps = COUNTER_RE
        .captures(line)
        .or_else(|| TRAILING_COUNTER_RE.captures(line))?;
    let done: u32 = caps[1].parse().ok()?;
    let total: u32 = caps[2].parse().ok()?;
    (total > 0 && done <= total).then_some((done, total))
}

fn marker(line: &str) -> Option<(f64, &'static str)> {
    const MARKERS: &[(&str, f64, &str)] = &[
        ("Updating and loading repositories", 0.2, "Loading repositories..."),
        ("Last metadata expiration check", 0.2, "Loading repositories..."),
        ("Resolving Dependencies", 0.25, "Resolving dependencies..."),
        ("Dependencies resolved", 0.3, "Dependencies resolved"),
        ("Downloading Packages", 0.4, "Downloading packages..."),
        ("Running transaction", 0.7, "Running transaction..."),
        ("Installing", 0.7, "Installing packages..."),
        ("Upgrading", 0.7, "Upgrading packages..."),
        ("Reinstalling", 0.7, "Reinstalling packages..."),
        ("Downgrading", 0.7, "Downgrading packages..."),
        ("Removing", 0.7, "Removing packages..."),
        ("Erasing", 0.7, "Removing packages..."),
        ("Cleanup", 0.8, "Cleaning up..."),
        ("Verifying", 0.8, "Verifying packages..."),
        ("Installed:", 0.85, "Finishing..."),
        ("Complete!", 0.9, "Complete"),
        ("Transaction complete", 0.9, "Complete"),
    ];

    // Section headers like "Installing:" list the plan, before any download.
    if line.ends_with(':') && !line.contains(' ') && line != "Installed:" {
        return Some((0.3, "Preparing transaction..."));
    }
    if line.starts_with("Downloading") {
        return Some((0.4, "Downloading packages..."));
    }

    MARKERS
        .iter()
        .find(|(needle, _, _)| line.starts_with(needle) || (needle.len() > 10 && line.contains(needle)))
        .map(|(_, fraction, status)| (*fraction, *status))
}

fn shorten(line: &str) -> String {
    if line.chars().count() <= STATUS_MAX_CHARS {
        line.to_string()
    } else {
        let cut: String = line.chars().take(STATUS_MAX_CHARS - 3).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dnf_install_output_moves_forward_only() {
        let output = [
            "Last metadata expiration check: 0:10:11 ago on Sun Jan  5 10:00:00 2025.",
            "Dependencies resolved.",
            "Installing:",
            " vlc   x86_64   3.0.21-1   cooker-x86_64   2 M",
            "Downloading Packages:",
            "(1/2): vlc-3.0.21-1.x86_64.rpm   1.2 MB/s | 2.0 MB     00:01",
            "Running transaction",
            "  Installing       : vlc-3.0.21-1.x86_64        1/2",
            "  Verifying        : vlc-3.0.21-1.x86_64        2/2",
            "Complete!",
        ];
        let mut tracker = ProgressTracker::new("Preparing installation...");
        let mut last = tracker.fraction();
        for line in output {
            let update = tracker.feed(line);
            assert!(update.fraction >= last, "{} went backwards", line);
            last = update.fraction;
        }
        assert!(tracker.fraction() >= 0.9);
        assert_eq!(tracker.finish(true).fraction, 1.0);
    }

    #[test]
    fn dnf5_counters_drive_fraction() {
        let mut tracker = ProgressTracker::new("Updating...");
        let update = tracker.feed("[3/6] Upgrading bash-0:5.2.37-1.x86_64  100% |  10.0 MiB/s");
        assert_eq!(update.fraction, 0.5);
        assert!(update.status.starts_with("[3/6] Upgrading bash"));

        // A smaller counter never moves the bar back
        assert_eq!(tracker.feed("[2/6] Upgrading zlib-0:1.3.1-1.x86_64").fraction, 0.5);
        assert_eq!(tracker.feed("[6/6] Upgrading glibc-0:2.40-3.x86_64").fraction, 1.0);
    }

    #[test]
    fn trailing_percent_is_refreshed_on_every_line() {
        let mut tracker = ProgressTracker::new("Updating...");
        assert_eq!(tracker.feed("[1/2] foo 40%").status, "[1/2] foo (40%)");
        assert_eq!(tracker.feed("[1/2] foo 75%").status, "[1/2] foo (75%)");
        assert_eq!(tracker.feed("[2/2] bar").status, "[2/2] bar");

        tracker.feed("Downloading Packages:");
        assert_eq!(tracker.feed("vlc.rpm 10%").status, "Downloading packages... (10%)");
        assert_eq!(tracker.feed("vlc.rpm 95%").status, "Downloading packages... (95%)");
    }

    #[test]
    fn percent_inside_a_line_is_not_a_progress_figure() {
        let mut tracker = ProgressTracker::new("Updating...");
        let update = tracker.feed("[1/4] Upgrading bash  100% |  10.0 MiB/s");
        assert!(!update.status.ends_with("(100%)"));
    }

    #[test]
    fn starts_at_a_fifth() {
        let tracker = ProgressTracker::new("Working...");
        assert_eq!(tracker.snapshot().fraction, 0.2);
        assert_eq!(tracker.snapshot().status, "Working...");
    }

    #[test]
    fn inbound_size_becomes_status() {
        let mut tracker = ProgressTracker::new("Updating...");
        let update = tracker.feed("Total size of inbound packages is 312 MiB. Need to download 120 MiB.");
        assert_eq!(update.status, "Total download size: 312 MiB");
    }

    #[test]
    fn kernel_removal_markers() {
        let mut tracker = ProgressTracker::new("Removing kernel...");
        assert_eq!(tracker.feed("Resolving Dependencies").fraction, 0.25);
        assert_eq!(tracker.feed("Removing:").fraction, 0.3);
        assert_eq!(tracker.feed("Running transaction").fraction, 0.7);
        assert_eq!(tracker.feed("Cleanup      : kernel-server").fraction, 0.8);
    }

    #[test]
    fn transcript_keeps_last_ten_lines() {
        let mut tracker = ProgressTracker::new("Working...");
        for i in 0..25 {
            tracker.feed(&format!("line {}", i));
        }
        let update = tracker.feed("");
        assert_eq!(update.transcript.len(), 10);
        assert_eq!(update.transcript.first().map(String::as_str), Some("line 15"));
        assert_eq!(update.transcript.last().map(String::as_str), Some("line 24"));
    }

    #[tokio::test]
    async fn run_tracked_stops_at_failing_step() {
        let steps = [
            CommandSpec::new("sh").args(["-c", "echo Dependencies resolved."]),
            CommandSpec::new("sh").args(["-c", "echo broken >&2; exit 1"]),
            CommandSpec::new("sh").args(["-c", "echo never"]),
        ];
        let mut lines = Vec::new();
        let mut last = None;
        let result = run_tracked(&steps, "Working...", |event| match event {
            TaskEvent::Output(line) => lines.push(line.text().to_string()),
            TaskEvent::Progress(update) => last = Some(update),
        })
        .await;

        assert!(result.is_err());
        assert_eq!(lines, vec!["Dependencies resolved.", "broken"]);
        let last = last.unwrap();
        assert_eq!(last.status, "Failed");
        assert_eq!(last.fraction, 0.3);
    }

    #[tokio::test]
    async fn run_tracked_completes() {
        let steps = [CommandSpec::new("true")];
        let done = run_tracked(&steps, "Working...", |_| {}).await.unwrap();
        assert_eq!(done.fraction, 1.0);
        assert_eq!(done.status, "Completed");
    }

    #[test]
    fn failure_keeps_fraction() {
        let mut tracker = ProgressTracker::new("Working...");
        tracker.feed("Dependencies resolved.");
        let update = tracker.finish(false);
        assert_eq!(update.fraction, 0.3);
        assert_eq!(update.status, "Failed");
    }
}
