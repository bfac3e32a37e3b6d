//! CLI binary for edgequake-transcript.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints JSON results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_transcript::ocr::resolve_engine;
use edgequake_transcript::pipeline::input;
use edgequake_transcript::{
    extract_batch, extract_input, ExtractionConfig, ExtractionProgressCallback, ExtractionResult,
    ExtractionRules, LineNumbering, OcrEngine, ProgressCallback, SubjectVocabulary,
    WordStreamEngine,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
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
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per image.
/// Images finish out of order, so start times are keyed by input index.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Input label and wall-clock start per in-flight image.
    started: Mutex<HashMap<usize, (String, Instant)>>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} images  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Reading");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(HashMap::new()),
            errors: AtomicUsize::new(0),
        })
    }

    /// Remove the bookkeeping for `index`, returning its label and elapsed seconds.
    fn finish(&self, index: usize) -> (String, f64) {
        self.started
            .lock()
            .ok()
            .and_then(|mut m| m.remove(&index))
            .map(|(label, t)| (label, t.elapsed().as_secs_f64()))
            .unwrap_or_else(|| (format!("#{}", index + 1), 0.0))
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.reset_eta();
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Reading {total} transcript(s)…"))
        ));
    }

    fn on_image_start(&self, index: usize, _total: usize, input: &str) {
        let label = Path::new(input)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| input.to_string());
        if let Ok(mut m) = self.started.lock() {
            m.insert(index, (label.clone(), Instant::now()));
        }
        self.bar.set_message(label);
    }

    fn on_image_complete(&self, index: usize, total: usize, subjects: usize) {
        let (label, secs) = self.finish(index);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            green("✓"),
            index + 1,
            total,
            label,
            dim(&format!("{subjects:>2} subjects")),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_image_error(&self, index: usize, total: usize, error: String) {
        let (label, secs) = self.finish(index);
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {:<32}  {}  {}",
            red("✗"),
            index + 1,
            total,
            label,
            red(&error),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total: usize, success_count: usize) {
        let failed = total.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} transcripts read successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} transcripts read  ({} failed)",
                if failed == total { red("✘") } else { cyan("⚠") },
                bold(&success_count.to_string()),
                total,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One transcript (stdout)
  transcript2json scan.jpg

  # Write to a file
  transcript2json scan.jpg -o result.json

  # A folder of scans, four at a time
  transcript2json -c 4 scans/*.jpg -o results.json

  # Include dropped candidates and timings
  transcript2json --report scan.jpg

  # Inspect what OCR saw, then replay it without OCR
  transcript2json --dump-words scan.jpg > scan.words.json
  transcript2json --words scan.words.json

  # Another board's subject list
  transcript2json --subjects BIOLOGY,ECONOMICS,ACCOUNTANCY scan.png

OUTPUT:
  One input   {"name": ..., "subjects": [{"subject": ..., "marks": ...}], "error": null}
              or {"error": "Could not read image file"}
  Several     [{"input": "a.jpg", "result": {...}}, ...] in input order

ENVIRONMENT VARIABLES:
  RUST_LOG                 Override log filter (logs go to stderr)
  TRANSCRIPT2JSON_*        Every option below has one (see --help)

SETUP:
  Tesseract must be on PATH (or pass --tesseract-cmd):
    apt install tesseract-ocr      # Debian/Ubuntu
    brew install tesseract         # macOS
"#;

/// Extract student names and subject marks from transcript images.
#[derive(Parser, Debug)]
#[command(
    name = "transcript2json",
    version,
    about = "Extract student names and subject marks from transcript images as JSON",
    long_about = "Read photographed or scanned academic transcripts (local files or URLs) with \
Tesseract OCR and print the student's name and per-subject marks as JSON. Marks may be printed \
as digits or spelled out word by word.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image file paths or HTTP/HTTPS URLs (word-stream JSON files with --words).
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<String>,

    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "TRANSCRIPT2JSON_OUTPUT")]
    output: Option<PathBuf>,

    /// Print the full report (dropped candidates, counts, timing). Single input only.
    #[arg(long, env = "TRANSCRIPT2JSON_REPORT")]
    report: bool,

    /// Inputs are recorded word streams (JSON arrays of words), not images.
    #[arg(long, env = "TRANSCRIPT2JSON_WORDS")]
    words: bool,

    /// Print the OCR word stream only; skip extraction. With `--words`, prints
    /// the parsed recording.
    #[arg(long, conflicts_with = "report")]
    dump_words: bool,

    /// JSON file with extraction rules (keywords, digit words, name and mark rules).
    #[arg(long, env = "TRANSCRIPT2JSON_RULES")]
    rules: Option<PathBuf>,

    /// Comma-separated subject keywords, replacing the built-in list.
    #[arg(long, env = "TRANSCRIPT2JSON_SUBJECTS", value_delimiter = ',')]
    subjects: Option<Vec<String>>,

    /// Lowest plausible mark (inclusive).
    #[arg(long, env = "TRANSCRIPT2JSON_MIN_MARK")]
    min_mark: Option<u32>,

    /// Highest plausible mark (inclusive); larger values are truncated first.
    #[arg(long, env = "TRANSCRIPT2JSON_MAX_MARK")]
    max_mark: Option<u32>,

    /// How many spelled digit words make up a mark.
    #[arg(long, env = "TRANSCRIPT2JSON_MAX_DIGIT_WORDS")]
    max_digit_words: Option<usize>,

    /// Leading digits kept from a mark above the maximum.
    #[arg(long, env = "TRANSCRIPT2JSON_OVERFLOW_DIGITS")]
    overflow_digits: Option<usize>,

    /// Words after the name anchor taken as the name.
    #[arg(long, env = "TRANSCRIPT2JSON_NAME_WINDOW")]
    name_window: Option<usize>,

    /// Do not look on the following line for a missing mark.
    #[arg(long, env = "TRANSCRIPT2JSON_NO_MERGE_NEXT_LINE")]
    no_merge_next_line: bool,

    /// Tesseract executable.
    #[arg(long, env = "TRANSCRIPT2JSON_TESSERACT_CMD", default_value = "tesseract")]
    tesseract_cmd: PathBuf,

    /// Tesseract language pack(s), e.g. eng or eng+dzo.
    #[arg(long, env = "TRANSCRIPT2JSON_LANG", default_value = "eng")]
    lang: String,

    /// Tesseract page segmentation mode (0–13).
    #[arg(long, env = "TRANSCRIPT2JSON_PSM",
          value_parser = clap::value_parser!(u8).range(0..=13))]
    psm: Option<u8>,

    /// How OCR line numbers are assigned: raw (per block) or global.
    #[arg(long, env = "TRANSCRIPT2JSON_LINE_NUMBERING", value_enum, default_value = "raw")]
    line_numbering: LineNumberingArg,

    /// Number of images processed at once.
    #[arg(short, long, env = "TRANSCRIPT2JSON_CONCURRENCY")]
    concurrency: Option<usize>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "TRANSCRIPT2JSON_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable progress bar.
    #[arg(long, env = "TRANSCRIPT2JSON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TRANSCRIPT2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TRANSCRIPT2JSON_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LineNumberingArg {
    Raw,
    Global,
}

impl From<LineNumberingArg> for LineNumbering {
    fn from(v: LineNumberingArg) -> Self {
        match v {
            LineNumberingArg::Raw => LineNumbering::Raw,
            LineNumberingArg::Global => LineNumbering::Global,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; stdout carries only JSON.
    let show_progress = !cli.quiet && !cli.no_progress && cli.inputs.len() > 1 && !cli.dump_words;
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

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Word dump mode ───────────────────────────────────────────────────
    if cli.dump_words {
        let json = dump_words(&cli, &config).await?;
        return emit(&json, cli.output.as_deref(), cli.quiet);
    }

    // ── Single input ─────────────────────────────────────────────────────
    if let [input_str] = cli.inputs.as_slice() {
        let outcome = extract_input(input_str, &config).await;
        let failed = outcome.is_err();
        let json = match outcome {
            Ok(report) if cli.report => serde_json::to_string_pretty(&report),
            Ok(report) => serde_json::to_string_pretty(&report.result),
            Err(e) => serde_json::to_string_pretty(&ExtractionResult::failed(e.to_string())),
        }
        .context("Failed to serialise result")?;
        emit(&json, cli.output.as_deref(), cli.quiet)?;
        if failed {
            std::process::exit(1);
        }
        return Ok(());
    }

    // ── Several inputs ───────────────────────────────────────────────────
    if cli.report {
        anyhow::bail!("--report takes a single input ({} given)", cli.inputs.len());
    }
    let outcomes = extract_batch(&cli.inputs, &config)
        .await
        .context("Extraction failed")?;
    let json = serde_json::to_string_pretty(&outcomes).context("Failed to serialise results")?;
    emit(&json, cli.output.as_deref(), cli.quiet)?;

    let failed = outcomes.iter().filter(|o| o.result.is_error()).count();
    if !cli.quiet && !show_progress {
        eprintln!(
            "Read {}/{} transcripts",
            outcomes.len() - failed,
            outcomes.len()
        );
    }
    if failed == outcomes.len() {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let rules = match cli.rules {
        Some(ref path) => ExtractionRules::from_json_file(path)
            .with_context(|| format!("Failed to load rules from {:?}", path))?,
        None => ExtractionRules::default(),
    };
    let min_mark = cli.min_mark.unwrap_or(rules.marks.min);
    let max_mark = cli.max_mark.unwrap_or(rules.marks.max);

    let mut builder = ExtractionConfig::builder()
        .rules(rules)
        .mark_range(min_mark, max_mark)
        .tesseract_cmd(&cli.tesseract_cmd)
        .language(&cli.lang)
        .line_numbering(cli.line_numbering.clone().into())
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref keywords) = cli.subjects {
        builder = builder.vocabulary(SubjectVocabulary::new(keywords));
    }
    if let Some(n) = cli.max_digit_words {
        builder = builder.max_digit_words(n);
    }
    if let Some(n) = cli.overflow_digits {
        builder = builder.overflow_keep_digits(n);
    }
    if let Some(n) = cli.name_window {
        builder = builder.name_window(n);
    }
    if cli.no_merge_next_line {
        builder = builder.merge_next_line(false);
    }
    if let Some(psm) = cli.psm {
        builder = builder.page_segmentation_mode(psm);
    }
    if let Some(n) = cli.concurrency {
        builder = builder.concurrency(n);
    }
    if cli.words {
        builder = builder.engine(Arc::new(WordStreamEngine));
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// OCR each input and serialise the raw words.
///
/// One input prints its word array; several print `[{input, words}, ...]`.
async fn dump_words(cli: &Cli, config: &ExtractionConfig) -> Result<String> {
    let engine = resolve_engine(config);
    let mut dumps = Vec::with_capacity(cli.inputs.len());

    for input_str in &cli.inputs {
        let resolved = input::resolve_input(input_str, config.download_timeout_secs)
            .await
            .with_context(|| format!("Failed to open {input_str}"))?;
        let engine = Arc::clone(&engine);
        let words = tokio::task::spawn_blocking(move || engine.recognize(resolved.path()))
            .await
            .context("OCR task panicked")?
            .with_context(|| format!("OCR failed for {input_str}"))?;
        dumps.push((input_str.clone(), words));
    }

    let json = if let [(_, words)] = dumps.as_slice() {
        serde_json::to_string_pretty(words)
    } else {
        let listed: Vec<_> = dumps
            .iter()
            .map(|(input, words)| serde_json::json!({ "input": input, "words": words }))
            .collect();
        serde_json::to_string_pretty(&listed)
    };
    json.context("Failed to serialise words")
}

/// Write `json` to `output`, or to stdout with a trailing newline.
fn emit(json: &str, output: Option<&Path>, quiet: bool) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if !quiet {
                eprintln!("{}  {}", green("✔"), dim(&path.display().to_string()));
            }
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(json.as_bytes())
                .context("Failed to write to stdout")?;
            handle.write_all(b"\n").ok();
            handle.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}
