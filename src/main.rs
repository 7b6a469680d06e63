// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! NewsClassify: AI-powered news categorization
//!
//! Command-line client for the classification service: upload documents,
//! video and audio, read the categorized summaries, rate the result.

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use newsclassify::auth::{self, password_strength, SignupForm};
use newsclassify::client::ApiClient;
use newsclassify::config::AppConfig;
use newsclassify::context::SessionContext;
use newsclassify::dashboard::Dashboard;
use newsclassify::feedback::{FeedbackGate, FeedbackOutcome};
use newsclassify::intake::expand_paths;
use newsclassify::language::LanguageCode;
use newsclassify::render::{render_html, render_text};
use newsclassify::session::Resolution;
use newsclassify::{NewsClassifyError, Result};

/// NewsClassify CLI - AI-powered news categorization
#[derive(Parser, Debug)]
#[command(name = "newsclassify")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Categorize and summarize news from documents, video and audio", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json", "html"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload files and show the categorized news
    Analyze(AnalyzeArgs),

    /// Sign in and remember the session
    Login {
        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in
    Signup {
        #[arg(short, long)]
        name: Option<String>,

        #[arg(short, long)]
        email: Option<String>,

        #[arg(short, long)]
        password: Option<String>,

        /// Defaults to --password when given on the command line
        #[arg(long)]
        confirm_password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Rate the service
    Review {
        /// Stars, 1 to 5
        #[arg(short, long)]
        rating: u8,

        #[arg(short = 'm', long)]
        comment: Option<String>,
    },

    /// List the latest published reviews
    Reviews,

    /// List your past analyses
    History {
        /// Number of entries to show
        #[arg(short = 'n', long, default_value = "10")]
        count: usize,
    },

    /// List supported output languages
    Languages,

    /// Show API and session status
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Files, directories or glob patterns
    #[arg(required = true)]
    paths: Vec<String>,

    /// Output language code (overrides config)
    #[arg(short, long)]
    language: Option<String>,

    /// Descend into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Show every category's articles
    #[arg(short, long)]
    expand: bool,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Never prompt for a rating
    #[arg(long)]
    no_feedback: bool,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    // Reports go to stdout, so logs stay on stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    debug!("NewsClassify v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Analyze(args) => run_analyze(config, args, &cli.format).await,
        Commands::Login { email, password } => run_login(&config, email, password).await,
        Commands::Signup { name, email, password, confirm_password } => {
            run_signup(&config, name, email, password, confirm_password).await
        }
        Commands::Logout => run_logout(&config),
        Commands::Whoami => run_whoami(&config, &cli.format),
        Commands::Review { rating, comment } => run_review(&config, rating, comment).await,
        Commands::Reviews => run_reviews(&config, &cli.format).await,
        Commands::History { count } => run_history(&config, count, &cli.format).await,
        Commands::Languages => run_languages(&config, &cli.format),
        Commands::Status => run_status(&config, &cli.config).await,
        Commands::Config { action } => run_config_command(config, action, &cli.config),
    }
}

/// Upload, classify, report, then offer the rating prompt
async fn run_analyze(config: AppConfig, args: AnalyzeArgs, format: &str) -> Result<()> {
    let candidates = expand_paths(&args.paths, args.recursive)?;
    let client = Arc::new(ApiClient::from_config(&config.api)?);
    let context = SessionContext::load(&config.context_path())?;
    let mut dashboard = Dashboard::new(client, context, &config);

    if let Some(language) = &args.language {
        dashboard.set_language(language)?;
    }

    let intake = dashboard.select(candidates)?;
    for rejected in &intake.rejected {
        warn!("{}", rejected);
    }
    info!(
        "Processing {} file(s), {:.1} MB, summaries in {}",
        intake.batch.len(),
        intake.batch.total_size() as f64 / (1024.0 * 1024.0),
        dashboard.language().name()
    );

    match dashboard.analyze().await {
        Some(Resolution::Completed { .. }) => {}
        Some(Resolution::Failed { message }) => return Err(NewsClassifyError::Analysis(message)),
        other => {
            return Err(NewsClassifyError::Analysis(format!(
                "no result ({:?})",
                other
            )))
        }
    }

    if args.expand {
        dashboard.expand_all();
    }
    let (Some(result), Some(view)) = (dashboard.results(), dashboard.view()) else {
        return Err(NewsClassifyError::Analysis("no result".to_string()));
    };

    let report = match format {
        "json" => serde_json::to_string_pretty(result)?,
        "html" => render_html(&view, Utc::now())?,
        _ => render_text(&view),
    };
    write_report(&report, args.output.as_deref())?;

    let interactive = !args.no_feedback && io::stdin().is_terminal();
    if interactive && dashboard.feedback_due().is_some() && dashboard.open_feedback_after_delay().await {
        prompt_feedback(&mut dashboard).await?;
    }

    dashboard.into_context().save()
}

fn write_report(report: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, report)?;
            info!("Report written to {:?}", path);
        }
        None => println!("{}", report),
    }
    Ok(())
}

/// Interactive rating prompt; Enter or EOF dismisses it
async fn prompt_feedback(dashboard: &mut Dashboard<ApiClient>) -> Result<()> {
    eprintln!("\nHow useful was this analysis? Rate 1-5, or press Enter to skip.");

    loop {
        let raw = match prompt("Rating: ")? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                dashboard.dismiss_feedback();
                return Ok(());
            }
        };
        let Ok(rating) = raw.trim().parse::<u8>() else {
            eprintln!("Please enter a number from 1 to 5");
            continue;
        };
        let comment = prompt("Comment (optional): ")?.unwrap_or_default();

        match dashboard.submit_feedback(rating, Some(comment.as_str())).await {
            Ok(FeedbackOutcome::Submitted) => {
                eprintln!("Thank you for your feedback!");
                return Ok(());
            }
            Ok(FeedbackOutcome::Failed(message)) => eprintln!("{}", message),
            Ok(FeedbackOutcome::Ignored) => return Ok(()),
            Err(e) => eprintln!("{}", e),
        }
    }
}

/// Read one line from stdin; `None` on EOF
fn prompt(label: &str) -> Result<Option<String>> {
    eprint!("{}", label);
    io::stderr().flush()?;

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Use the flag value, or ask for it
fn required(value: Option<String>, label: &str) -> Result<String> {
    if let Some(value) = value {
        return Ok(value);
    }
    prompt(&format!("{}: ", label))?
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| NewsClassifyError::Auth(format!("{} is required", label)))
}

async fn run_login(config: &AppConfig, email: Option<String>, password: Option<String>) -> Result<()> {
    let client = ApiClient::from_config(&config.api)?;
    let mut context = SessionContext::load(&config.context_path())?;

    let email = required(email, "Email")?;
    let password = required(password, "Password")?;
    let user = auth::login(&client, &mut context, email.trim(), &password).await?;

    println!("Logged in as {} <{}>", user.name, user.email);
    Ok(())
}

async fn run_signup(
    config: &AppConfig,
    name: Option<String>,
    email: Option<String>,
    password: Option<String>,
    confirm_password: Option<String>,
) -> Result<()> {
    let client = ApiClient::from_config(&config.api)?;
    let mut context = SessionContext::load(&config.context_path())?;

    let name = required(name, "Name")?;
    let email = required(email, "Email")?;
    let confirm_password = match (&password, confirm_password) {
        (_, Some(confirm)) => Some(confirm),
        (Some(password), None) => Some(password.clone()),
        (None, None) => None,
    };
    let password = required(password, "Password")?;
    if let Some(strength) = password_strength(&password) {
        info!("Password strength: {}", strength.label());
    }
    let confirm_password = required(confirm_password, "Confirm password")?;

    let form = SignupForm {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        password,
        confirm_password,
    };
    let user = auth::signup(&client, &mut context, form).await?;

    println!("Welcome, {}! You are signed in as {}", user.name, user.email);
    Ok(())
}

fn run_logout(config: &AppConfig) -> Result<()> {
    let mut context = SessionContext::load(&config.context_path())?;
    let was_signed_in = context.is_authenticated();
    auth::logout(&mut context)?;

    if was_signed_in {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

fn run_whoami(config: &AppConfig, format: &str) -> Result<()> {
    let context = SessionContext::load(&config.context_path())?;
    let user = context.user().ok_or(NewsClassifyError::NotAuthenticated)?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(user)?);
        return Ok(());
    }

    println!("{} <{}>", user.name, user.email);
    if let Some(at) = context.signed_in_at() {
        println!("  Signed in: {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    println!("  Reviewed:  {}", if context.has_reviewed() { "yes" } else { "no" });
    Ok(())
}

async fn run_review(config: &AppConfig, rating: u8, comment: Option<String>) -> Result<()> {
    let client = ApiClient::from_config(&config.api)?;
    let mut context = SessionContext::load(&config.context_path())?;

    // No display delays outside the interactive prompt
    let mut gate = FeedbackGate::with_timing(Duration::ZERO, Duration::ZERO);
    gate.open();

    match gate.submit(&client, &mut context, rating, comment.as_deref()).await? {
        FeedbackOutcome::Submitted => {
            context.save()?;
            println!("Thank you for your feedback!");
            Ok(())
        }
        FeedbackOutcome::Failed(message) => Err(NewsClassifyError::Review(message)),
        FeedbackOutcome::Ignored => Err(NewsClassifyError::Review("prompt was not open".to_string())),
    }
}

async fn run_reviews(config: &AppConfig, format: &str) -> Result<()> {
    let client = ApiClient::from_config(&config.api)?;
    let reviews = client.list_reviews().await?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&reviews)?);
        return Ok(());
    }

    if reviews.is_empty() {
        println!("No reviews yet");
    }
    for review in &reviews {
        let filled = review.rating.min(5) as usize;
        println!(
            "{}{}  {}  {}",
            "★".repeat(filled),
            "☆".repeat(5 - filled),
            review.user_name,
            review.created_at
        );
        if let Some(comment) = &review.comment {
            println!("    {}", comment);
        }
    }
    Ok(())
}

async fn run_history(config: &AppConfig, count: usize, format: &str) -> Result<()> {
    let client = ApiClient::from_config(&config.api)?;
    let context = SessionContext::load(&config.context_path())?;
    let token = context.bearer().ok_or(NewsClassifyError::NotAuthenticated)?;

    let mut entries = client.history(token).await?;
    entries.truncate(count);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No analyses yet");
    }
    for entry in &entries {
        let categories: Vec<&str> = entry.categories.iter().map(|c| c.name.as_str()).collect();
        println!(
            "#{:<5} {}  {}  {} file(s), {} article(s), {}  [{}]",
            entry.id,
            entry.created_at,
            entry.language.to_uppercase(),
            entry.files_processed,
            entry.total_articles,
            entry
                .processing_time
                .map(|t| format!("{:.1}s", t))
                .unwrap_or_else(|| "-".to_string()),
            categories.join(", ")
        );
    }
    Ok(())
}

fn run_languages(config: &AppConfig, format: &str) -> Result<()> {
    if format == "json" {
        let codes: Vec<_> = LanguageCode::ALL
            .iter()
            .map(|c| serde_json::json!({ "code": c.as_str(), "name": c.name() }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&codes)?);
        return Ok(());
    }

    for code in LanguageCode::ALL {
        let marker = if code == config.language { "→" } else { " " };
        println!("{} {}  {}", marker, code.as_str(), code.name());
    }
    Ok(())
}

async fn run_status(config: &AppConfig, config_path: &Path) -> Result<()> {
    let client = ApiClient::from_config(&config.api)?;

    println!("NewsClassify v{} Status", env!("CARGO_PKG_VERSION"));
    println!("========================");

    match client.health_check().await {
        Ok(health) => println!("API: {} ({})", client.base_url(), health.status),
        Err(e) => println!("API: {} - Error: {}", client.base_url(), e.message("no response")),
    }

    let context = SessionContext::load(&config.context_path())?;
    match context.user() {
        Some(user) => println!("\nSession: {} <{}>", user.name, user.email),
        None => println!("\nSession: not logged in"),
    }

    println!("\nConfiguration ({:?}):", config_path);
    println!("  Language: {} ({})", config.language, config.language.name());
    println!("  Feedback prompt: {}", if config.feedback.enabled { "on" } else { "off" });
    println!("  Session file: {}", config.context.path);

    Ok(())
}

fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            ApiClient::from_config(&config.api)?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  API: {} (timeout {}s)", config.api.base_url, config.api.timeout_secs);
            println!("  Language: {}", config.language);
            println!("  Session file: {}", config.context.path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["newsclassify"]).is_err());

        let cli = Cli::try_parse_from(["newsclassify", "languages"]).unwrap();
        assert!(!cli.verbose);
        assert_eq!(cli.format, "text");
    }

    #[test]
    fn test_cli_analyze_command() {
        let cli = Cli::try_parse_from([
            "newsclassify", "analyze", "a.pdf", "clips/*.mp4", "--language", "fr", "-r", "--no-feedback",
        ])
        .unwrap();

        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.paths, vec!["a.pdf".to_string(), "clips/*.mp4".to_string()]);
                assert_eq!(args.language.as_deref(), Some("fr"));
                assert!(args.recursive);
                assert!(args.no_feedback);
                assert!(!args.expand);
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_cli_analyze_needs_paths() {
        assert!(Cli::try_parse_from(["newsclassify", "analyze"]).is_err());
    }

    #[test]
    fn test_cli_global_format() {
        let cli = Cli::try_parse_from(["newsclassify", "history", "--format", "json", "-n", "3"]).unwrap();
        assert_eq!(cli.format, "json");
        assert!(matches!(cli.command, Commands::History { count: 3 }));

        assert!(Cli::try_parse_from(["newsclassify", "reviews", "--format", "jsonl"]).is_err());
    }

    #[test]
    fn test_cli_review_command() {
        let cli = Cli::try_parse_from(["newsclassify", "review", "--rating", "4", "-m", "solid"]).unwrap();
        match cli.command {
            Commands::Review { rating, comment } => {
                assert_eq!(rating, 4);
                assert_eq!(comment.as_deref(), Some("solid"));
            }
            _ => panic!("Expected Review command"),
        }
    }

    #[test]
    fn test_cli_config_generate() {
        let cli = Cli::try_parse_from(["newsclassify", "config", "generate", "-o", "/tmp/nc.json"]).unwrap();
        match cli.command {
            Commands::Config { action: ConfigCommands::Generate { output } } => {
                assert_eq!(output, PathBuf::from("/tmp/nc.json"));
            }
            _ => panic!("Expected Config Generate command"),
        }
    }

    #[test]
    fn test_required_prefers_flag() {
        assert_eq!(required(Some("a@b.c".into()), "Email").unwrap(), "a@b.c");
    }
}
