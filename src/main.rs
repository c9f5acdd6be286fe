use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use attest_core::{
    Assessment, AuthenticityChecker, ExecutionCertificate, ExecutionMonitor, Verdict, VerifyConfig,
};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "attest", version, about = "Verify tool output authenticity")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Treat a single matched indicator as fabrication.
    #[arg(long, global = true)]
    strict: bool,

    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check a text for fabrication indicators. Reads stdin when no text
    /// argument is given.
    Check { text: Option<String> },

    /// Run a command, capture its stdout, and verify it with filesystem
    /// monitoring of the current directory.
    Run {
        /// Seconds to wait before giving up on the command.
        #[arg(long, default_value_t = 30)]
        timeout: u64,

        #[arg(trailing_var_arg = true, required = true)]
        command: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let mut config = load_config(&config_path)?;
    if cli.strict {
        config.strict = true;
    }
    let checker = AuthenticityChecker::from_config(&config)?;

    let fabricated = match cli.command {
        Command::Check { text } => {
            let text = match text {
                Some(t) => t,
                None => {
                    std::io::read_to_string(std::io::stdin()).context("failed to read stdin")?
                }
            };
            let assessment = checker.check_labeled("stdin", &text);
            print_assessment(&assessment, cli.json)?;
            assessment.verdict == Verdict::LikelyFabricated
        }
        Command::Run { timeout, command } => {
            let cwd = std::env::current_dir().context("failed to resolve working directory")?;
            let certificate = run_and_verify(checker, &config, cwd, timeout, &command).await?;
            print_certificate(&certificate, cli.json)?;
            certificate.is_fabricated()
        }
    };

    if fabricated {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_and_verify(
    checker: AuthenticityChecker,
    config: &VerifyConfig,
    root: PathBuf,
    timeout: u64,
    command: &[String],
) -> anyhow::Result<ExecutionCertificate> {
    let mut monitor = ExecutionMonitor::new(checker, root, config.scan_depth);

    let (program, args) = command.split_first().context("no command given")?;

    monitor.start();
    let output = tokio::time::timeout(
        Duration::from_secs(timeout),
        tokio::process::Command::new(program).args(args).output(),
    )
    .await
    .with_context(|| format!("command timed out after {timeout}s"))?
    .with_context(|| format!("failed to execute {program}"))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let certificate = monitor.finish(&command.join(" "), &stdout);

    if !output.status.success() {
        tracing::warn!(status = %output.status, "command exited unsuccessfully");
    }

    Ok(certificate)
}

fn print_assessment(assessment: &Assessment, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(assessment)?);
        return Ok(());
    }
    println!("verdict: {}", assessment.verdict);
    println!("confidence: {:.2}", assessment.confidence);
    for indicator in &assessment.indicators {
        println!("indicator: {indicator}");
    }
    Ok(())
}

fn print_certificate(certificate: &ExecutionCertificate, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(certificate)?);
        return Ok(());
    }
    print_assessment(&certificate.assessment, false)?;
    println!(
        "filesystem changes: {}",
        certificate.evidence.filesystem_changes
    );
    println!("duration: {}ms", certificate.evidence.duration_ms);
    Ok(())
}

/// Priority: CLI --config > `ATTEST_CONFIG` env > config/default.toml
fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("ATTEST_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Falls back to defaults when the file does not exist.
fn load_config(path: &Path) -> anyhow::Result<VerifyConfig> {
    if path.exists() {
        let content = std::fs::read_to_string(path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config file")
    } else {
        Ok(VerifyConfig::default())
    }
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
