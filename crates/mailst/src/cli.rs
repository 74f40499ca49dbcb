//! Command line arguments.

use clap::{Args, Parser, Subcommand};
use mailst_core::{LOG_FILENAME, ProcessOptions};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mailst", version)]
#[command(about = "Send personalized emails to the recipients of a table")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a mail merge job (simulated unless --send-emails is given)
    Run(RunArgs),
    /// Let addresses be mailed again
    Forget {
        /// Addresses to forget
        #[arg(required = true)]
        emails: Vec<String>,
        /// Sent log file
        #[arg(long, default_value = LOG_FILENAME)]
        sent_log: PathBuf,
    },
    /// List the addresses already mailed
    Sent {
        /// Sent log file
        #[arg(long, default_value = LOG_FILENAME)]
        sent_log: PathBuf,
    },
}

#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Job file (JSON)
    pub job: PathBuf,

    /// Really send the emails; without it the run is simulated
    #[arg(long)]
    pub send_emails: bool,

    /// Address emails to the recipients instead of the sender
    #[arg(long)]
    pub send_to_recipients: bool,

    /// Only print a preview of each email, without connecting
    #[arg(short = 'p', long)]
    pub just_print: bool,

    /// Print every email built while sending
    #[arg(long)]
    pub print_mails: bool,

    /// Stop after this many emails (0 means no limit)
    #[arg(short = 'm', long, default_value = "0")]
    pub max_num_emails: usize,

    /// Seconds to wait between emails
    #[arg(short = 'd', long)]
    pub delay: Option<f64>,

    /// Only send to this address (repeatable)
    #[arg(short = 's', long = "send-only-to", value_name = "EMAIL")]
    pub send_only_to: Vec<String>,

    /// Never send to this address (repeatable)
    #[arg(short = 'e', long = "exclude", value_name = "EMAIL")]
    pub exclude: Vec<String>,

    /// Sent log file, overriding the job's
    #[arg(long)]
    pub sent_log: Option<PathBuf>,
}

impl RunArgs {
    pub fn process_options(&self) -> ProcessOptions {
        ProcessOptions {
            send_emails: self.send_emails,
            send_to_recipients: self.send_to_recipients,
            just_print: self.just_print,
            print_mails: self.print_mails,
            max_num_emails: self.max_num_emails,
            delay: self.delay,
            send_only_to: self.send_only_to.clone(),
            exclude: self.exclude.clone(),
        }
    }
}
