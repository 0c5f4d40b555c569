//! mend CLI - lifecycle hooks with protected remediation
//!
//! Usage:
//!   mend init                   Initialize .mend/ in current repo
//!   mend post-tool-use          Handle a PostToolUse hook payload (stdin)
//!   mend subagent-stop          Handle a SubagentStop hook
//!   mend stop                   Handle a Stop hook
//!   mend check [paths...]       Check formatting without writing
//!   mend format [paths...]      Format files in place
//!   mend remediate              Run one protected remediation cycle
//!   mend watch                  Run the background cleanup watcher

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mend_core::{MendConfig, PathResolver};
use mend_format::{BlackFormatter, Formatter, IsortFormatter};
use mend_git::{GitCommand, GitExecutor, ProtectionManager};
use mend_hooks::{CleanupWatcher, HookEvent, HookInput, MainOrchestrator, SessionLog, SessionTracker};
use mend_process::{ProcessExecutor, ProcessRunner};
use mend_quality::{QualityOrchestrator, Verifier};
use mend_remediate::{ApiAssistant, RemediationOrchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "mend")]
#[command(author, version, about = "Lifecycle hooks with protected remediation")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize mend in the current repository
    Init {
        /// Repository path (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Handle a PostToolUse hook invocation
    PostToolUse {
        /// JSON payload (read from stdin when omitted)
        payload: Option<String>,
    },

    /// Handle a SubagentStop hook invocation
    SubagentStop {
        /// JSON payload (read from stdin when omitted)
        payload: Option<String>,

        /// Prefer assistant-guided remediation
        #[arg(long)]
        sdk: bool,
    },

    /// Handle a Stop hook invocation
    Stop {
        /// JSON payload (read from stdin when omitted)
        payload: Option<String>,
    },

    /// Check formatting without writing changes
    Check {
        /// Files to check (whole project when omitted)
        paths: Vec<PathBuf>,
    },

    /// Format files in place
    Format {
        /// Files to format (flagged project files when omitted)
        paths: Vec<PathBuf>,
    },

    /// Run one protected remediation cycle over the project
    Remediate {
        /// Prefer assistant-guided remediation
        #[arg(long)]
        sdk: bool,
    },

    /// Run the background cleanup watcher
    Watch,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: failed to install tracing subscriber");
    }

    // Nothing propagates past the hook boundary: every error lands here,
    // gets logged with its chain, and becomes exit code 1.
    let code = match run(cli.command).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            1
        }
    };
    std::process::exit(code);
}

async fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Init { path } => init(path),
        Commands::PostToolUse { payload } => hook(HookEvent::PostToolUse, payload, false).await,
        Commands::SubagentStop { payload, sdk } => {
            hook(HookEvent::SubagentStop, payload, sdk).await
        }
        Commands::Stop { payload } => hook(HookEvent::Stop, payload, false).await,
        Commands::Check { paths } => check(paths).await,
        Commands::Format { paths } => format(paths).await,
        Commands::Remediate { sdk } => remediate(sdk).await,
        Commands::Watch => watch().await,
    }
}

fn init(path: PathBuf) -> Result<i32> {
    let resolver = PathResolver::new(&path);
    resolver.ensure_layout().context("Failed to create .mend layout")?;
    MendConfig::write_default(&path).context("Failed to write default config")?;

    println!("Initialized mend in {}", resolver.mend_dir().display());
    Ok(0)
}

async fn hook(event: HookEvent, payload: Option<String>, use_sdk: bool) -> Result<i32> {
    let root = resolve_root().await;
    let config = MendConfig::load_or_default(&root)?;

    let payload = match payload {
        Some(payload) => payload,
        None => read_stdin().await?,
    };
    let input = HookInput::parse(&payload)?.or_env();

    let orchestrator = build_orchestrator(&root, &config, use_sdk)?;
    let summary = orchestrator.handle(event, &input).await;

    info!(
        "{}: checked {} file(s), {} issue(s), {} cleaned",
        summary.event, summary.files_checked, summary.issues_found, summary.files_cleaned
    );
    Ok(if summary.success { 0 } else { 1 })
}

async fn check(paths: Vec<PathBuf>) -> Result<i32> {
    let root = resolve_root().await;
    let config = MendConfig::load_or_default(&root)?;
    let quality = build_quality(&root, &config);

    let report = if paths.is_empty() {
        quality.check_project().await?
    } else {
        quality.check_files(&paths).await?
    };

    for check in &report.checks {
        if check.needs_formatting {
            println!("{}: needs {}", check.file.display(), check.tool);
        }
        if let Some(error) = &check.error {
            println!("{}: {} error: {}", check.file.display(), check.tool, error);
        }
    }
    println!(
        "{} issue(s) across {} file(s)",
        report.issues_found, report.files_checked
    );
    Ok(if report.issues_found == 0 { 0 } else { 1 })
}

async fn format(paths: Vec<PathBuf>) -> Result<i32> {
    let root = resolve_root().await;
    let config = MendConfig::load_or_default(&root)?;
    let quality = build_quality(&root, &config);

    let targets = if paths.is_empty() {
        quality.check_project().await?.files_needing_format()
    } else {
        paths
    };
    if targets.is_empty() {
        println!("Nothing to format");
        return Ok(0);
    }

    let summary = quality.format_files(&targets).await?;
    println!("Formatted {} file(s)", summary.files_formatted);
    for error in &summary.errors {
        println!("error: {}", error);
    }
    Ok(if summary.errors.is_empty() { 0 } else { 1 })
}

async fn remediate(use_sdk: bool) -> Result<i32> {
    let root = resolve_root().await;
    let config = MendConfig::load_or_default(&root)?;

    let quality = build_quality(&root, &config);
    let report = quality.check_project().await?;
    if report.issues_found == 0 {
        println!("No issues found");
        return Ok(0);
    }

    let remediation = build_remediation(&root, &config, use_sdk)?;
    let result = remediation.remediate(&report, use_sdk).await;

    let resolver = PathResolver::new(&root);
    resolver.ensure_layout()?;
    SessionLog::new(resolver.session_log_path())
        .log_remediation(&result)
        .await;

    println!(
        "Remediation {}: {} of {} issue(s) fixed",
        if result.success { "succeeded" } else { "failed" },
        result.issues_fixed,
        result.issues_found
    );
    for op in &result.operations {
        println!(
            "  {} {}: {}",
            if op.success { "ok " } else { "FAIL" },
            op.kind,
            op.detail
        );
    }
    if let Some(error) = &result.error {
        println!("error: {}", error);
    }
    Ok(if result.success { 0 } else { 1 })
}

async fn watch() -> Result<i32> {
    let root = resolve_root().await;
    let config = MendConfig::load_or_default(&root)?;

    let resolver = PathResolver::new(&root);
    resolver.ensure_layout()?;
    let tracker = Arc::new(SessionTracker::new(resolver.tracker_path()));

    let mut watcher = CleanupWatcher::new(&root, tracker)
        .with_cooldown(Duration::from_secs(config.watcher.cooldown_secs));

    tokio::select! {
        result = watcher.run() => {
            result.context("Watcher failed")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down watcher");
        }
    }
    Ok(0)
}

/// Git toplevel when available, current directory otherwise
async fn resolve_root() -> PathBuf {
    match GitCommand::detect().await {
        Ok(git) => git.repo_root().clone(),
        Err(_) => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

async fn read_stdin() -> Result<String> {
    let mut payload = String::new();
    tokio::io::stdin()
        .read_to_string(&mut payload)
        .await
        .context("Failed to read hook payload from stdin")?;
    Ok(payload)
}

fn build_quality(root: &PathBuf, config: &MendConfig) -> QualityOrchestrator {
    let executor: Arc<dyn ProcessExecutor> = Arc::new(ProcessRunner::new(root));
    let formatter_timeout = Duration::from_secs(config.timeouts.formatter_secs);

    let formatters: Vec<Box<dyn Formatter>> = vec![
        Box::new(
            BlackFormatter::new(executor.clone())
                .with_line_length(config.formatting.line_length)
                .with_timeout(formatter_timeout),
        ),
        Box::new(
            IsortFormatter::new(executor)
                .with_profile(&config.formatting.isort_profile)
                .with_timeout(formatter_timeout),
        ),
    ];

    QualityOrchestrator::new(formatters, root, config.formatting.include_patterns.clone())
}

fn build_remediation(
    root: &PathBuf,
    config: &MendConfig,
    use_sdk: bool,
) -> Result<RemediationOrchestrator> {
    let executor: Arc<dyn ProcessExecutor> = Arc::new(ProcessRunner::new(root));
    let verifier = Verifier::new(executor).with_timeouts(
        Duration::from_secs(config.timeouts.compile_secs),
        Duration::from_secs(config.timeouts.test_discovery_secs),
    );
    let protection = Arc::new(ProtectionManager::new(GitCommand::new(root)));

    let mut remediation =
        RemediationOrchestrator::new(protection, build_quality(root, config), verifier);
    if use_sdk {
        let assistant = ApiAssistant::new(&config.assistant.model)
            .with_max_tokens(config.assistant.max_tokens)
            .with_timeout(Duration::from_secs(config.timeouts.assistant_secs));
        remediation = remediation.with_assistant(Arc::new(assistant));
    }
    Ok(remediation)
}

fn build_orchestrator(
    root: &PathBuf,
    config: &MendConfig,
    use_sdk: bool,
) -> Result<MainOrchestrator> {
    let resolver = PathResolver::new(root);
    resolver.ensure_layout()?;

    let mut orchestrator = MainOrchestrator::new(
        build_quality(root, config),
        build_remediation(root, config, use_sdk)?,
        SessionLog::new(resolver.session_log_path()),
        SessionTracker::new(resolver.tracker_path()),
        root,
    );
    if use_sdk {
        orchestrator = orchestrator.with_sdk();
    }
    Ok(orchestrator)
}
