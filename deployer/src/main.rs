//! mdeploy - Entry Point
//!
//! Deploys an app or group definition to Marathon and waits for the
//! deployment to finish, reporting its outcome and duration.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use secrecy::SecretString;
use tokio::io::AsyncReadExt;
use tracing::{error, info};

use mdeploy::app::options::AppOptions;
use mdeploy::app::run::run;
use mdeploy::errors::DeployError;
use mdeploy::http::client::Credentials;
use mdeploy::logs::{init_logging, LogLevel, LogOptions};
use mdeploy::models::job::Job;
use mdeploy::settings::Settings;
use mdeploy::tracker::Verdict;
use mdeploy::utils::{await_signal, duration_secs, version_info};

const EXIT_FAILED: u8 = 1;
const EXIT_UNKNOWN: u8 = 2;
const EXIT_ERROR: u8 = 3;

#[derive(Parser, Debug)]
#[command(name = "mdeploy")]
#[command(version, about = "Deploy a job to Marathon and wait for the deployment to finish")]
struct Args {
    /// Marathon URL
    #[arg(short = 'm', long = "marathon", env = "MARATHON_URL")]
    marathon: Option<String>,

    /// Job file, `-` reads from stdin
    #[arg(short = 'f', long = "file")]
    file: String,

    /// Username for basic auth
    #[arg(short = 'u', long, env = "MARATHON_USER")]
    user: Option<String>,

    /// Password for basic auth
    #[arg(short = 'p', long, env = "MARATHON_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Debug output
    #[arg(short = 'd', long)]
    debug: bool,

    /// Override a deployment already holding the job
    #[arg(long)]
    force: bool,

    /// Give up tracking after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Emit JSON logs
    #[arg(long)]
    json_logs: bool,

    /// Settings file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let settings = match &args.config {
        Some(path) => match Settings::load(path).await {
            Ok(settings) => settings,
            Err(e) => {
                eprintln!("Unable to read settings file {}: {}", path.display(), e);
                return ExitCode::from(EXIT_ERROR);
            }
        },
        None => Settings::default(),
    };

    // Initialize logging
    let log_options = LogOptions {
        log_level: if args.debug {
            LogLevel::Debug
        } else {
            settings.log_level.clone()
        },
        json_format: args.json_logs || settings.json_logs,
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let version = version_info();
    info!(
        version = %version.version,
        git_hash = %version.git_hash,
        "Starting mdeploy"
    );

    let options = build_options(&args, &settings);
    let job = match read_job(&args.file).await {
        Ok(job) => job,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let result = tokio::select! {
        result = run(&options, &job) => result,
        _ = await_shutdown_signal() => {
            println!("{}", "Interrupted, deployment status unknown".yellow());
            return ExitCode::from(EXIT_UNKNOWN);
        }
    };

    match result {
        Ok(verdict) => report(&verdict),
        Err(e @ DeployError::TrackingTimedOut { .. }) => {
            error!("{}", e);
            println!("{}", "Deployment status unknown".yellow());
            ExitCode::from(EXIT_UNKNOWN)
        }
        Err(e) => {
            error!("Deployment could not be tracked: {}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

async fn await_shutdown_signal() {
    let ctrl_c = await_signal(tokio::signal::ctrl_c(), "Ctrl+C");

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let sigterm = async {
            let mut sigterm = signal(SignalKind::terminate())?;
            sigterm.recv().await;
            Ok::<(), std::io::Error>(())
        };

        tokio::select! {
            _ = await_signal(sigterm, "SIGTERM") => {
                info!("SIGTERM received, shutting down...");
            }
            _ = ctrl_c => {
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        info!("Ctrl+C received, shutting down...");
    }
}

/// Settings file first, command line flags on top
fn build_options(args: &Args, settings: &Settings) -> AppOptions {
    let mut options = AppOptions::from_settings(settings);

    if let Some(url) = &args.marathon {
        options.marathon_url = Some(url.clone());
    }

    let user = args.user.clone().or_else(|| settings.marathon.user.clone());
    let password = args
        .password
        .clone()
        .map(SecretString::from)
        .or_else(|| settings.marathon.password.clone());
    options.credentials = Credentials::from_parts(user, password);

    options.submit.force = args.force;
    if let Some(secs) = args.timeout {
        options.tracking_timeout = Some(Duration::from_secs(secs));
    }

    options
}

async fn read_job(file: &str) -> Result<Job> {
    let data = if file == "-" {
        let mut data = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut data)
            .await
            .context("Unable to read job from stdin")?;
        data
    } else {
        tokio::fs::read(file)
            .await
            .with_context(|| format!("Unable to read job file {}", file))?
    };

    Job::from_slice(&data).with_context(|| format!("Invalid job definition in {}", file))
}

fn report(verdict: &Verdict) -> ExitCode {
    match verdict {
        Verdict::Succeeded { duration, failures } => {
            println!("{}", "Deployment succeeded".green());
            println!("Duration: {:6.2} seconds", duration_secs(*duration));
            if !failures.is_empty() {
                println!("Recovered from:\n{}", failures);
            }
            ExitCode::SUCCESS
        }
        Verdict::Failed { duration, failures } => {
            println!("{}", "Deployment failed".red());
            println!("Duration: {:6.2} seconds", duration_secs(*duration));
            println!("Reason: {}", failures);
            ExitCode::from(EXIT_FAILED)
        }
        Verdict::StreamExhausted => {
            println!(
                "{}",
                "Deployment status unknown: event stream ended before the deployment finished"
                    .yellow()
            );
            ExitCode::from(EXIT_UNKNOWN)
        }
    }
}
