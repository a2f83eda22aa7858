use crate::scan::BackupTotals;
use crate::utils::format_clock;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{IsTerminal, Write};
use std::time::{Duration, Instant};

/// Running counters for one copy run
#[derive(Debug, Clone)]
pub struct CopyProgress {
    pub totals: BackupTotals,
    pub copied_bytes: u64,
    pub copied_files: u64,
    started: Instant,
}

impl CopyProgress {
    pub fn new(totals: BackupTotals) -> Self {
        Self {
            totals,
            copied_bytes: 0,
            copied_files: 0,
            started: Instant::now(),
        }
    }

    pub fn record_file(&mut self, bytes: u64) {
        self.copied_bytes += bytes;
        self.copied_files += 1;
    }

    /// Percentage of bytes copied; an empty backup is complete from the start
    pub fn percent(&self) -> f64 {
        if self.totals.bytes == 0 {
            return 100.0;
        }
        (self.copied_bytes as f64 / self.totals.bytes as f64 * 100.0).min(100.0)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// `[#####-----] 50.0% (1/2) | 00:00:03`
pub fn render_status_line(progress: &CopyProgress, bar_width: usize) -> String {
    let percent = progress.percent();
    let filled = ((percent / 100.0) * bar_width as f64).round() as usize;
    let filled = filled.min(bar_width);

    format!(
        "[{}{}] {:.1}% ({}/{}) | {}",
        "#".repeat(filled),
        "-".repeat(bar_width - filled),
        percent,
        progress.copied_files,
        progress.totals.files,
        format_clock(progress.elapsed())
    )
}

#[derive(Debug, Clone)]
pub struct ProgressConfig {
    pub enabled: bool,
    pub is_interactive: bool,
    pub bar_width: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            is_interactive: std::io::stdout().is_terminal(),
            bar_width: 40,
        }
    }
}

impl ProgressConfig {
    pub fn auto_detect(bar_width: usize) -> Self {
        // No animated bar in CI logs
        if is_ci_environment() {
            Self {
                is_interactive: false,
                bar_width,
                ..Self::default()
            }
        } else {
            Self {
                bar_width,
                ..Self::default()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            is_interactive: false,
            bar_width: 40,
        }
    }
}

/// Receives progress as the copy engine works through the file list
pub trait ProgressSink {
    fn start(&mut self, _progress: &CopyProgress) {}
    fn update(&mut self, progress: &CopyProgress);
    fn finish(&mut self, _progress: &CopyProgress) {}
}

pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&mut self, _progress: &CopyProgress) {}
}

/// Single status line redrawn in place with a carriage return
pub struct PlainProgress<W: Write> {
    out: W,
    bar_width: usize,
}

impl<W: Write> PlainProgress<W> {
    pub fn new(out: W, bar_width: usize) -> Self {
        Self { out, bar_width }
    }

    fn draw(&mut self, progress: &CopyProgress) {
        let line = render_status_line(progress, self.bar_width);
        // Progress output is best effort
        let _ = write!(self.out, "\r{line}");
        let _ = self.out.flush();
    }
}

impl<W: Write> ProgressSink for PlainProgress<W> {
    fn start(&mut self, progress: &CopyProgress) {
        self.draw(progress);
    }

    fn update(&mut self, progress: &CopyProgress) {
        self.draw(progress);
    }

    fn finish(&mut self, progress: &CopyProgress) {
        self.draw(progress);
        let _ = writeln!(self.out);
    }
}

/// Redraw interval of the console bar while a single file is still copying
const TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Animated bar on an interactive terminal
pub struct ConsoleProgress {
    bar: Option<ProgressBar>,
    bar_width: usize,
}

impl ConsoleProgress {
    pub fn new(bar_width: usize) -> Self {
        Self {
            bar: None,
            bar_width,
        }
    }

    fn style(&self) -> ProgressStyle {
        let template = format!(
            "[{{bar:{}.cyan/blue}}] {{percent}}% ({{msg}}) | {{elapsed_precise}}",
            self.bar_width
        );
        ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏ ")
    }
}

impl ProgressSink for ConsoleProgress {
    fn start(&mut self, progress: &CopyProgress) {
        // A zero-length bar renders as complete
        let bar = ProgressBar::with_draw_target(
            Some(progress.totals.bytes),
            ProgressDrawTarget::stdout(),
        );
        bar.set_style(self.style());
        bar.set_message(format!("0/{}", progress.totals.files));
        bar.enable_steady_tick(TICK_INTERVAL);
        self.bar = Some(bar);
    }

    fn update(&mut self, progress: &CopyProgress) {
        if let Some(ref bar) = self.bar {
            bar.set_position(progress.copied_bytes);
            bar.set_message(format!(
                "{}/{}",
                progress.copied_files, progress.totals.files
            ));
        }
    }

    fn finish(&mut self, progress: &CopyProgress) {
        self.update(progress);
        if let Some(bar) = self.bar.take() {
            bar.finish();
        }
    }
}

/// Pick the progress display for the current terminal; `out` receives plain status lines
pub fn create_progress_sink<'w, W: Write + 'w>(
    config: &ProgressConfig,
    out: W,
) -> Box<dyn ProgressSink + 'w> {
    if !config.enabled {
        Box::new(NoProgress)
    } else if config.is_interactive {
        Box::new(ConsoleProgress::new(config.bar_width))
    } else {
        Box::new(PlainProgress::new(out, config.bar_width))
    }
}

/// Check if we're running in a CI environment
fn is_ci_environment() -> bool {
    std::env::var("CI").is_ok()
        || std::env::var("GITHUB_ACTIONS").is_ok()
        || std::env::var("GITLAB_CI").is_ok()
        || std::env::var("JENKINS_URL").is_ok()
        || std::env::var("BUILDKITE").is_ok()
}
