//! Bitsmith CLI - assemble tracker submissions from release files

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use bitsmith::error::{BitsError, FixSuggestion};
use bitsmith::kinds;
use bitsmith::{BitsConfig, FieldValue, Submission};

/// Console width used by the payload preview
const PREVIEW_WIDTH: usize = 80;

#[derive(Parser)]
#[command(name = "bitsmith")]
#[command(about = "Bitsmith - assemble tracker submissions from release files")]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and print fields of a submission
    Show(SubmissionArgs),

    /// Resolve, finalize and print the payload (nothing is sent)
    Submit {
        #[command(flatten)]
        args: SubmissionArgs,

        /// Finalize without asking
        #[arg(short, long)]
        yes: bool,

        /// Print the payload as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the fields of a kind
    Fields {
        /// Submission kind (base, video, tv, movie)
        #[arg(short = 'c', long = "category", default_value = "video")]
        kind: String,
    },

    /// Show the configuration path and effective values
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct SubmissionArgs {
    /// Release file or directory
    path: PathBuf,

    /// Title override, e.g. "Firefly S01"
    title: Option<String>,

    /// Submission kind (base, video, tv, movie)
    #[arg(short = 'c', long = "category")]
    kind: Option<String>,

    /// Set a field: -u FIELD VALUE (VALUE is parsed as YAML)
    #[arg(short = 'u', long = "set-field", num_args = 2, value_names = ["FIELD", "VALUE"])]
    set_fields: Vec<String>,

    /// Fields to show (default: the kind's default fields)
    #[arg(short = 'f', long = "field", num_args = 1..)]
    fields: Vec<String>,

    /// YAML mapping of literal fields
    #[arg(long)]
    fields_file: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Show(args) => show(&args),
        Commands::Submit { args, yes, json } => submit(&args, yes, json),
        Commands::Fields { kind } => list_fields(&kind),
        Commands::Config { init } => {
            if init {
                init_config()
            } else {
                show_config()
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

/// `-v` flags win; without them `RUST_LOG` applies, falling back to `warn`
fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        n => {
            let level = match n {
                1 => tracing::Level::INFO,
                2 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            };
            EnvFilter::from_default_env().add_directive(level.into())
        }
    };

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

// ============================================================================
// SUBMISSION ASSEMBLY
// ============================================================================

/// Build a submission from CLI arguments, config and literal overrides
fn build_submission(args: &SubmissionArgs, config: &BitsConfig) -> Result<Submission, BitsError> {
    let kind_name = args
        .kind
        .as_deref()
        .or(config.default_kind())
        .unwrap_or("base");
    let kind = kinds::by_name(kind_name)?;

    let path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()?.join(&args.path)
    };

    let mut literals: Vec<(String, FieldValue)> = vec![
        ("path".to_string(), FieldValue::Path(path)),
        ("title_arg".to_string(), args.title.clone().into()),
    ];
    literals.extend(
        config
            .field_literals()
            .into_iter()
            .map(|(field, value)| (field.to_string(), value)),
    );

    if let Some(file) = &args.fields_file {
        let content = fs::read_to_string(file)?;
        let map: BTreeMap<String, serde_json::Value> = serde_yaml::from_str(&content)?;
        literals.extend(map.into_iter().map(|(k, v)| (k, FieldValue::from_json(v))));
    }

    for pair in args.set_fields.chunks(2) {
        if let [field, raw] = pair {
            literals.push((field.clone(), parse_value(raw)?));
        }
    }

    Ok(Submission::with_literals(kind, literals))
}

/// Parse a `-u` value: `true`, `3`, `[a, b]` keep their YAML types
fn parse_value(raw: &str) -> Result<FieldValue, BitsError> {
    let value: serde_json::Value = serde_yaml::from_str(raw)?;
    Ok(FieldValue::from_json(value))
}

fn show(args: &SubmissionArgs) -> Result<(), BitsError> {
    let config = BitsConfig::load()?.with_env();
    let mut sub = build_submission(args, &config)?;
    let text = sub.resolve_narrowing(args.fields.as_slice())?;

    println!("{} {}", "Kind:".cyan().bold(), sub.kind().name());
    print!("{}", text);
    Ok(())
}

fn submit(args: &SubmissionArgs, yes: bool, json: bool) -> Result<(), BitsError> {
    let config = BitsConfig::load()?.with_env();
    let mut sub = build_submission(args, &config)?;
    let text = sub.resolve_narrowing(args.fields.as_slice())?;

    if !json {
        println!("{} {}", "Kind:".cyan().bold(), sub.kind().name());
        print!("{}", text);
    }

    // Resolve every output so deferred placeholders are known before asking
    let kind = Arc::clone(sub.kind());
    for entry in kind.registry().iter() {
        sub.get(&entry.field)?;
    }

    if sub.needs_finalization() {
        let pending: Vec<String> = sub.pending().iter().map(|f| f.to_string()).collect();
        let question = format!("Finalize {} ({})? [y/N] ", pending.len(), pending.join(", "));
        if !yes && !confirm(&question)? {
            println!("Cancelled by user");
            return Ok(());
        }

        let committed = sub.finalize()?;
        if !json {
            let names: Vec<&str> = committed.iter().map(|f| f.as_ref()).collect();
            println!("{} Finalized: {}", "✓".green(), names.join(", "));
        }
    }

    let payload = sub.payload()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print!("{}", payload.preview(PREVIEW_WIDTH));
        println!("{} Nothing was sent.", "Note:".yellow());
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool, BitsError> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

// ============================================================================
// INTROSPECTION
// ============================================================================

fn list_fields(kind: &str) -> Result<(), BitsError> {
    let kind = kinds::by_name(kind)?;

    println!("{} {}", "Kind:".cyan().bold(), kind.lineage().join(" → "));

    println!("\n{}", "Output fields:".bold());
    println!("  {:<20} {:<16} {}", "FIELD", "KEY", "TYPE");
    for entry in kind.registry().iter() {
        let marker = if kind.is_deferred(&entry.field) {
            " (deferred)".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<20} {:<16} {}{}",
            entry.field,
            entry.key.to_string(),
            entry.output.to_string(),
            marker
        );
    }

    println!("\n{}", "Rendered fields:".bold());
    for name in kind.renderer_names() {
        let marker = if kind.is_deferred(&name) { " (deferred)" } else { "" };
        println!("  {}{}", name, marker);
    }

    let defaults: Vec<&str> = kind.default_fields().iter().map(|f| f.as_ref()).collect();
    println!("\n{} {}", "Default fields:".bold(), defaults.join(", "));
    Ok(())
}

fn show_config() -> Result<(), BitsError> {
    let path = BitsConfig::config_path();
    let config = BitsConfig::load()?.with_env();

    let state = if path.exists() { "" } else { " (not found, using defaults)" };
    println!("{} {}{}", "Config:".cyan().bold(), path.display(), state);
    println!(
        "  black_hole:      {}",
        config
            .black_hole()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!(
        "  image_dir:       {}",
        config
            .image_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    );
    println!("  kind:            {}", config.default_kind().unwrap_or("base"));
    println!("  num_screenshots: {}", config.defaults.num_screenshots);
    println!("  num_cast:        {}", config.defaults.num_cast);
    Ok(())
}

fn init_config() -> Result<(), BitsError> {
    let path = BitsConfig::config_path();
    if path.exists() {
        println!("{} {} already exists", "Config:".cyan().bold(), path.display());
        return Ok(());
    }

    BitsConfig::default().save()?;
    println!("{} wrote {}", "✓".green(), path.display());
    Ok(())
}
