//! mailst - personalized bulk email from a recipient table.

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command, RunArgs};
use mailst_core::{JobConfig, RunMode, SentLog, SmtpTransport};
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr so stdout only carries rendered emails
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailst=info,mailst_core=info,mailst_smtp=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    match cli.command {
        Command::Run(args) => runtime.block_on(run(&args)),
        Command::Forget { emails, sent_log } => forget(&emails, &sent_log),
        Command::Sent { sent_log } => list_sent(&sent_log),
    }
}

async fn run(args: &RunArgs) -> anyhow::Result<()> {
    let job = JobConfig::load(&args.job)
        .with_context(|| format!("Failed to load job {}", args.job.display()))?;
    let log_path = args.sent_log.clone().unwrap_or_else(|| job.sent_log_path());
    let sent_log = SentLog::open(&log_path)
        .with_context(|| format!("Failed to read sent log {}", log_path.display()))?;

    let options = args.process_options();
    let mut mailer = job
        .build_mailer(sent_log, &options)
        .context("Failed to prepare the run")?;
    let mut stdout = std::io::stdout();

    let report = match options.mode(mailer.sender())? {
        RunMode::Preview { max_num_emails } => mailer.test(max_num_emails, &mut stdout)?,
        RunMode::Deliver(send_options) => {
            let settings = job.smtp.settings();
            let mut transport = SmtpTransport::connect(&settings)
                .await
                .with_context(|| format!("Failed to connect to {}", settings.host))?;
            let report = mailer
                .send(&mut transport, &send_options, &mut stdout)
                .await?;
            transport.close().await?;
            report
        }
    };
    stdout.flush()?;

    info!(
        "{} processed, {} already sent, {} excluded",
        report.processed.len(),
        report.already_sent.len(),
        report.excluded.len()
    );
    if !report.missing_attachments.is_empty() {
        warn!(
            "{} attachment(s) were missing",
            report.missing_attachments.len()
        );
    }
    Ok(())
}

fn forget(emails: &[String], path: &Path) -> anyhow::Result<()> {
    let mut log = SentLog::open(path)
        .with_context(|| format!("Failed to read sent log {}", path.display()))?;
    let now = chrono::Local::now().naive_local();
    for email in emails {
        if log.forget(email, now)? {
            info!("Forgot delivery to {email}");
        } else {
            warn!("No delivery to {email} was recorded");
        }
    }
    Ok(())
}

fn list_sent(path: &Path) -> anyhow::Result<()> {
    let log = SentLog::open(path)
        .with_context(|| format!("Failed to read sent log {}", path.display()))?;
    let mut stdout = std::io::stdout().lock();
    for (email, at) in log.entries() {
        writeln!(stdout, "{email}\t{}", at.format("%Y-%m-%d %H:%M:%S"))?;
    }
    Ok(())
}
