//! CLI binary for handmark.
//!
//! A thin shim over the library crate that maps CLI flags to `DigestConfig`,
//! plus the two housekeeping commands that persist a credential and a
//! default model.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use handmark::settings::{Credentials, Settings};
use handmark::{available_models, digest, models, DigestConfig, ImageDetail, DEFAULT_MODEL};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

const AFTER_HELP: &str = r#"EXAMPLES:
  # Markdown transcription into the current directory
  handmark digest notes.jpg

  # YAML into ./notes, named after the note's title
  handmark digest notes.jpg --format yaml --output ./notes

  # Fixed name when the model gives no title
  handmark digest whiteboard.png --filename whiteboard.md

  # Store an API key, pick a default model
  handmark auth --provider openai
  handmark conf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  RUST_LOG                Log filter, e.g. handmark=debug
"#;

/// Transcribe handwritten notes with Vision LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "handmark",
    version,
    about = "Transcribe handwritten notes into Markdown, JSON, YAML or XML using Vision LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "HANDMARK_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the written path.
    #[arg(short, long, global = true, env = "HANDMARK_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transcribe an image into a structured text document.
    Digest(DigestArgs),
    /// Store an API key for a provider.
    Auth {
        /// Provider the key belongs to (openai, anthropic, gemini, …).
        #[arg(long, env = "HANDMARK_PROVIDER")]
        provider: Option<String>,
    },
    /// Select the default model.
    Conf {
        /// Set this model without showing the menu.
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Args, Debug)]
struct DigestArgs {
    /// Path to the image of handwritten text (PNG, JPEG, GIF, WebP).
    image: PathBuf,

    /// Output format: markdown, json, yaml, xml.
    #[arg(short, long, env = "HANDMARK_FORMAT", default_value = "markdown")]
    format: String,

    /// Directory the document is written to.
    #[arg(short, long, env = "HANDMARK_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Filename to use when the response carries no title. Default: response.<ext>.
    #[arg(long, env = "HANDMARK_FILENAME")]
    filename: Option<String>,

    /// LLM model ID. Default: the model chosen with `handmark conf`, else gpt-4o.
    #[arg(long, env = "HANDMARK_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "HANDMARK_PROVIDER")]
    provider: Option<String>,

    /// JSON file replacing the built-in format registry.
    #[arg(long, env = "HANDMARK_FORMATS")]
    formats: Option<PathBuf>,

    /// Image detail sent to the model: low, high, auto.
    #[arg(long, env = "HANDMARK_DETAIL", default_value = "low")]
    detail: String,

    /// Max LLM output tokens.
    #[arg(long, env = "HANDMARK_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "HANDMARK_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// LLM call timeout in seconds.
    #[arg(long, env = "HANDMARK_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Disable the spinner.
    #[arg(long, env = "HANDMARK_NO_PROGRESS")]
    no_progress: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Keep INFO logs out of the way of the spinner unless asked for.
    let spinner = match &cli.command {
        Command::Digest(args) => !cli.quiet && !args.no_progress,
        _ => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner {
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

    match cli.command {
        Command::Digest(ref args) => run_digest(args, cli.quiet, spinner && !cli.verbose),
        Command::Auth { ref provider } => run_auth(provider.as_deref()),
        Command::Conf { ref model } => run_conf(model.as_deref()),
    }
}

// ── digest ───────────────────────────────────────────────────────────────────

fn run_digest(args: &DigestArgs, quiet: bool, show_spinner: bool) -> Result<()> {
    let settings = Settings::load_default().context("Failed to load settings")?;
    if let Some(creds) = Credentials::load_default().context("Failed to load stored credential")? {
        creds.export_to_env();
    }

    let config = build_config(args, &settings)?;

    let bar = show_spinner.then(|| {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Transcribing");
        bar.set_message(format!("{} with {}", args.image.display(), config.model));
        bar.enable_steady_tick(Duration::from_millis(80));
        bar
    });

    let start = Instant::now();
    let result = digest(&args.image, &args.output, args.filename.as_deref(), &config);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let path = result.context("Digest failed")?;

    if quiet {
        println!("{}", path.display());
    } else {
        eprintln!(
            "{} {} written  {}",
            green("✔"),
            config.format,
            dim(&format!("{:.1}s", start.elapsed().as_secs_f64())),
        );
        println!("{}", bold(&path.display().to_string()));
    }
    Ok(())
}

/// Map CLI args and saved settings to `DigestConfig`.
///
/// The saved provider belongs to the saved model: it is only applied when the
/// model also comes from the settings. An explicit `--model` without
/// `--provider` leaves the provider to catalogue/environment resolution.
fn build_config(args: &DigestArgs, settings: &Settings) -> Result<DigestConfig> {
    let (model, saved_provider) = match (&args.model, &settings.model) {
        (Some(model), _) => (model.clone(), None),
        (None, Some(model)) => (model.clone(), settings.provider.clone()),
        (None, None) => (DEFAULT_MODEL.to_string(), None),
    };
    let detail: ImageDetail = args.detail.parse().context("Invalid --detail")?;

    let mut builder = DigestConfig::builder()
        .format(args.format.clone())
        .model(model)
        .image_detail(detail)
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .api_timeout_secs(args.api_timeout);

    if let Some(provider) = args.provider.clone().or(saved_provider) {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = args.formats {
        builder = builder.formats_path(path);
    }

    builder.build().context("Invalid configuration")
}

// ── auth ─────────────────────────────────────────────────────────────────────

fn run_auth(provider: Option<&str>) -> Result<()> {
    let settings = Settings::load_default().context("Failed to load settings")?;
    let provider = provider
        .map(str::to_string)
        .or(settings.provider)
        .or_else(|| {
            settings
                .model
                .as_deref()
                .and_then(models::find_model)
                .map(|m| m.provider.to_string())
        })
        .unwrap_or_else(|| "openai".to_string());

    let Some(var) = models::api_key_env(&provider) else {
        bail!("Provider '{provider}' does not take an API key handled by handmark");
    };

    let token = rpassword::prompt_password(format!("Please enter your {provider} API key ({var}): "))
        .context("Failed to read API key")?;
    let token = token.trim();
    if token.is_empty() {
        eprintln!("{}", yellow("No key provided. Configuration cancelled."));
        return Ok(());
    }

    let path = Credentials::new(&provider, token)
        .save_default()
        .context("Failed to store API key")?;
    eprintln!("{}", green(&format!("Key stored in {}", path.display())));
    eprintln!("{}", green("Configuration complete."));
    Ok(())
}

// ── conf ─────────────────────────────────────────────────────────────────────

fn run_conf(model: Option<&str>) -> Result<()> {
    let mut settings = Settings::load_default().context("Failed to load settings")?;

    let chosen = match model {
        Some(id) => {
            if models::find_model(id).is_none() {
                eprintln!(
                    "{}",
                    yellow(&format!("'{id}' is not in the model catalogue; saving it anyway."))
                );
            }
            id.to_string()
        }
        None => prompt_model(settings.model.as_deref())?,
    };

    settings.provider = models::find_model(&chosen).map(|m| m.provider.to_string());
    settings.model = Some(chosen.clone());
    let path = settings.save_default().context("Failed to save settings")?;
    eprintln!(
        "{} Default model set to {}  {}",
        green("✔"),
        bold(&chosen),
        dim(&path.display().to_string())
    );
    Ok(())
}

fn prompt_model(current: Option<&str>) -> Result<String> {
    let catalogue = available_models();
    let current = current.unwrap_or(DEFAULT_MODEL);

    eprintln!("{} {}", cyan("◆"), bold("Available models:"));
    for (i, m) in catalogue.iter().enumerate() {
        let marker = if m.id == current { green("●") } else { " ".to_string() };
        eprintln!(
            "  {} {:>2}. {:<26} {:<10} {}",
            marker,
            i + 1,
            m.name,
            m.provider,
            dim(m.pricing)
        );
    }
    eprint!("Select a model [1-{}]: ", catalogue.len());
    io::stderr().flush().ok();

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read selection")?;

    let index: usize = line
        .trim()
        .parse()
        .with_context(|| format!("Invalid selection: '{}'", line.trim()))?;
    match index.checked_sub(1).and_then(|i| catalogue.get(i)) {
        Some(m) => Ok(m.id.to_string()),
        None => bail!("Selection must be between 1 and {}", catalogue.len()),
    }
}
