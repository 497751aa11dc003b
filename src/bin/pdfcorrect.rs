//! CLI binary for edgequake-pdfcorrect.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `CorrectionConfig` and prints the report.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdfcorrect::{
    correct, inspect, CorrectionConfig, CorrectionOutput, CorrectionProgressCallback,
    CorrectionStats, Issue, ProgressCallback, RunState,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Live progress bar plus one log line per checked page. Pages may complete
/// out of order when `--concurrency` > 1.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    failures: AtomicUsize,
}

impl CliProgressCallback {
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);
        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            failures: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Checking");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&page_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl CorrectionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Checking {total_pages} pages…"))
        ));
    }

    fn on_state_change(&self, state: &RunState) {
        match state {
            // The prompt needs a clean terminal.
            RunState::AwaitingConfirmation => self.bar.finish_and_clear(),
            RunState::FormattingCheck => self.bar.set_message("formatting"),
            RunState::Writing => self.bar.set_message("writing"),
            _ => {}
        }
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut m) = self.start_times.lock() {
            m.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, issue_count: usize) {
        let secs = self.elapsed_secs(page_num);
        let count = format!("{issue_count:>3} issues");
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<10}  {}",
            if issue_count == 0 { green("✓") } else { yellow("•") },
            page_num,
            total,
            dim(&count),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        self.failures.fetch_add(1, Ordering::SeqCst);
        let msg: String = if error.chars().count() > 80 {
            error.chars().take(79).chain(std::iter::once('…')).collect()
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} Page {:>3}/{:<3}  {}", red("✗"), page_num, total, red(&msg)));
    }

    fn on_run_complete(&self, stats: &CorrectionStats) {
        self.bar.finish_and_clear();
        let failures = self.failures.load(Ordering::SeqCst);
        if failures > 0 {
            eprintln!(
                "{} {} pages checked  ({} detector failures)",
                cyan("⚠"),
                bold(&stats.pages_processed.to_string()),
                red(&failures.to_string()),
            );
        } else {
            eprintln!(
                "{} {} pages checked",
                green("✔"),
                bold(&stats.pages_processed.to_string())
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Check, review the findings, confirm, write report_corrected.pdf
  pdfcorrect report.pdf

  # Unattended run to a chosen path
  pdfcorrect -n report.pdf -o fixed/report.pdf

  # Commit the grammar engine's corrected text (re-typesets changed pages)
  pdfcorrect -n --commit-corrected report.pdf

  # British English, four pages at a time
  pdfcorrect -l en-GB --concurrency 4 thesis.pdf

  # Fonts, links and images only (no grammar server needed)
  pdfcorrect --inspect-only report.pdf

  # Machine-readable report
  pdfcorrect -n --json report.pdf > report.json

GRAMMAR ENGINE:
  pdfcorrect talks to a LanguageTool HTTP server. Run one locally:
    docker run -p 8081:8010 erikvl87/languagetool
  or point --languagetool-url / LANGUAGETOOL_URL at a hosted instance.
  If the server is unreachable, each page records a detector_unavailable
  issue and the run continues.

ENVIRONMENT VARIABLES:
  LANGUAGETOOL_URL        LanguageTool base URL (default http://localhost:8081)
  RUST_LOG                Override log filter (e.g. edgequake_pdfcorrect=debug)
"#;

/// Find and fix grammar, sentence-structure and formatting issues in PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "pdfcorrect",
    version,
    about = "Find and fix grammar, sentence-structure and formatting issues in PDFs",
    long_about = "Check every page of a PDF (local file or URL) for grammar and spelling \
errors, overlong sentences and passive voice, then check the whole document for font \
sprawl and suspicious links. Shows a digest, asks before writing, and writes a \
corrected copy.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Output path (default: <input-stem>_corrected.<ext> in the current directory).
    #[arg(short, long, env = "PDFCORRECT_OUTPUT")]
    output: Option<PathBuf>,

    /// Do not ask for confirmation before writing.
    #[arg(short = 'n', long)]
    non_interactive: bool,

    /// Language code for the grammar engine.
    #[arg(short, long, env = "PDFCORRECT_LANGUAGE", default_value = "en-US")]
    language: String,

    /// LanguageTool server base URL.
    #[arg(long, env = "LANGUAGETOOL_URL")]
    languagetool_url: Option<String>,

    /// Write the engine's corrected text instead of the original pages.
    #[arg(long)]
    commit_corrected: bool,

    /// Pages checked at once.
    #[arg(long, env = "PDFCORRECT_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Per-engine-call timeout in seconds.
    #[arg(long, env = "PDFCORRECT_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// HTTP download timeout in seconds for URL inputs.
    #[arg(long, env = "PDFCORRECT_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Print the full report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Report structure and formatting only; no grammar engine, no output file.
    #[arg(long)]
    inspect_only: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFCORRECT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // INFO logs would fight the progress bar for the terminal.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let report = inspect(&cli.input).await.context("Failed to inspect PDF")?;
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("Failed to serialise report")?
            );
        } else {
            println!("File:         {}", cli.input);
            println!("Pages:        {}", report.page_count);
            println!("Fonts:        {}", report.profile.fonts.len());
            for (font, sizes) in &report.profile.fonts {
                let sizes: Vec<String> = sizes.iter().map(|s| format!("{s}")).collect();
                println!("  {:<28} {}", font, dim(&sizes.join(", ")));
            }
            println!("Links:        {}", report.profile.hyperlinks.len());
            println!("Images:       {}", report.profile.images.len());
            print_issues(&report.formatting_issues);
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn CorrectionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = match correct(&cli.input, &config).await {
        Ok(output) => output,
        Err(e) => {
            if let Some(report) = e.report() {
                print_summary(report, &cli);
            }
            return Err(anyhow::Error::new(e)).context("Correction failed");
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }
    if output.is_aborted() {
        if !cli.quiet {
            eprintln!("Operation cancelled.");
        }
        return Ok(());
    }
    print_summary(&output, &cli);
    Ok(())
}

/// Map CLI args to `CorrectionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<CorrectionConfig> {
    let mut builder = CorrectionConfig::builder()
        .language(&cli.language)
        .interactive(!cli.non_interactive)
        .commit_corrected_text(cli.commit_corrected)
        .concurrency(cli.concurrency)
        .engine_timeout_secs(cli.timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref path) = cli.output {
        builder = builder.output_path(path);
    }
    if let Some(ref url) = cli.languagetool_url {
        builder = builder.languagetool_url(url);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_issues(issues: &[Issue]) {
    if issues.is_empty() {
        println!("{}", green("No formatting issues."));
        return;
    }
    for issue in issues {
        println!("  {} {}", yellow("•"), issue);
    }
}

fn print_summary(output: &CorrectionOutput, cli: &Cli) {
    if cli.quiet || cli.json {
        return;
    }
    let s = &output.stats;
    eprintln!("{}", bold("Correction statistics"));
    eprintln!("  Pages processed:    {}", s.pages_processed);
    eprintln!("  Grammar errors:     {}", s.grammar_errors);
    eprintln!("  Spelling errors:    {}", s.spelling_errors);
    eprintln!("  Structure issues:   {}", s.structure_issues);
    eprintln!("  Formatting issues:  {}", s.formatting_issues);
    eprintln!("  Corrections made:   {}", s.corrections_made);
    let failed = output.failed_pages();
    if !failed.is_empty() {
        eprintln!("  {}", red(&format!("Detector failures on pages {failed:?}")));
    }
    match &output.output_path {
        Some(path) => eprintln!(
            "{}  {}ms  →  {}",
            green("✔"),
            output.duration_ms,
            bold(&path.display().to_string())
        ),
        None => eprintln!("{}", red("✘ No output written")),
    }
}
