//! CLI binary for pdfshift.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, runs one conversion and reports where it landed.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdfshift::{
    convert, ConversionConfig, ConversionMode, ConversionProgressCallback, ConversionRequest,
    ConvertError, ExtensionPolicy, OutputBundle, PageSelection, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner while pdfium renders, then a page bar once the count is known.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_prefix("Rendering");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, mode: ConversionMode, total_pages: usize) {
        self.bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  "),
        );
        self.bar.set_length(total_pages as u64);
        self.bar.set_prefix(mode.to_string());
        self.bar.reset_eta();
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, _page_num: usize, _total: usize, _bytes: usize) {
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, _bundle: &OutputBundle) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"MODES:
  pdf-to-word    Word document, one full-page picture per PDF page
  pdf-to-ppt     Slide deck, one slide per page, sized from page 1
  pdf-to-image   One image for a one-page PDF; otherwise a zip of
                 page_1.png, page_2.png, … written to OUTPUT

EXAMPLES:
  pdfshift pdf-to-ppt talk.pdf talk.pptx
  pdfshift pdf-to-word --dpi 300 scan.pdf scan.docx
  pdfshift pdf-to-image --pages 2-4 report.pdf pages.png
  pdfshift pdf-to-image --force-archive-extension report.pdf report.png   # → report.zip

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to libpdfium; otherwise ./ then the system library
  RUST_LOG          Override log filtering (e.g. pdfshift=debug)
"#;

/// Convert PDF files to Word documents, slide decks or images.
#[derive(Parser, Debug)]
#[command(
    name = "pdfshift",
    version,
    about = "Convert PDF files to Word documents, slide decks or images",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Conversion mode: pdf-to-word, pdf-to-ppt or pdf-to-image.
    mode: String,

    /// Source PDF file.
    input: PathBuf,

    /// Output path (.docx, .pptx, or an image name such as out.png).
    output: PathBuf,

    /// Rendering DPI (72–600).
    #[arg(long, env = "PDFSHIFT_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Longest rendered side in pixels.
    #[arg(long, env = "PDFSHIFT_MAX_PIXELS", default_value_t = 8000)]
    max_pixels: u32,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDFSHIFT_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFSHIFT_PASSWORD")]
    password: Option<String>,

    /// Name multi-page image archives `.zip` instead of keeping OUTPUT's extension.
    #[arg(long, env = "PDFSHIFT_FORCE_ARCHIVE_EXTENSION")]
    force_archive_extension: bool,

    /// Print the conversion result as JSON on stdout.
    #[arg(long, env = "PDFSHIFT_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFSHIFT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFSHIFT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFSHIFT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<ConvertError>() {
                Some(ce) => eprintln!("{} [{}] {}", red("✘"), ce.stage(), ce),
                None => eprintln!("{} {:#}", red("✘"), e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    // Mode first: an unknown mode is reported before anything else happens.
    let request = ConversionRequest::parse(&cli.mode, &cli.input, &cli.output)?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb)?;

    let output = convert(request, &config).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        let what = match &output.bundle {
            OutputBundle::Single { .. } => format!("{} pages", output.stats.total_pages),
            OutputBundle::Archive { members, .. } => format!("{} images in zip", members.len()),
        };
        eprintln!(
            "{}  {}  {}ms  →  {}",
            green("✔"),
            what,
            output.stats.total_duration_ms,
            bold(&output.bundle.path().display().to_string()),
        );
        if output.renamed() {
            eprintln!(
                "   {}",
                dim(&format!("requested {}", output.requested_output.display()))
            );
        }
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let policy = if cli.force_archive_extension {
        ExtensionPolicy::ForceArchive
    } else {
        ExtensionPolicy::KeepRequested
    };

    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels)
        .pages(parse_pages(&cli.pages)?)
        .extension_policy(policy);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start.trim().parse().context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;
        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }
        return Ok(PageSelection::Range(start, end));
    }

    if s.contains(',') {
        let pages = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;
        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }
        return Ok(PageSelection::Set(pages));
    }

    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }
    Ok(PageSelection::Single(page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pages_forms() {
        assert_eq!(parse_pages("all").unwrap(), PageSelection::All);
        assert_eq!(parse_pages(" 5 ").unwrap(), PageSelection::Single(5));
        assert_eq!(parse_pages("3-15").unwrap(), PageSelection::Range(3, 15));
        assert_eq!(parse_pages("1,3,5").unwrap(), PageSelection::Set(vec![1, 3, 5]));
        assert!(parse_pages("0").is_err());
        assert!(parse_pages("5-2").is_err());
        assert!(parse_pages("x").is_err());
    }

    #[test]
    fn cli_accepts_positional_triple() {
        let cli = Cli::try_parse_from(["pdfshift", "pdf-to-ppt", "in.pdf", "out.pptx"]).unwrap();
        assert_eq!(cli.mode, "pdf-to-ppt");
        assert_eq!(cli.dpi, 200);
        assert!(!cli.force_archive_extension);
    }

    #[test]
    fn dpi_out_of_range_is_rejected_by_clap() {
        assert!(Cli::try_parse_from(["pdfshift", "pdf-to-ppt", "a.pdf", "b.pptx", "--dpi", "10"])
            .is_err());
    }
}
