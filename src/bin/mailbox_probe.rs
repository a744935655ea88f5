use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use mailbox_probe::config::{load_config, load_config_from};
use mailbox_probe::handler::EmailHandler;

#[derive(Parser)]
#[command(name = "mailbox_probe")]
#[command(about = "Wait for test emails and pull links out of them", long_about = None)]
struct Cli {
    /// Config file (defaults to the per-user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Wait until exactly one message matches, mark it read and print its id
    Wait {
        query: String,

        /// Seconds before the first search
        #[arg(long)]
        delay: Option<u64>,

        /// Seconds between searches
        #[arg(long)]
        interval: Option<u64>,

        /// Overall seconds to wait
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Print the ids matching a query
    List { query: String },

    /// Print the extracted body of a message
    Show { id: String },

    /// Print the first link containing the given text
    Link { id: String, sub_text: String },

    /// Print the password reset link
    ResetLink { id: String },

    /// Print the account verification link
    VerifyLink { id: String },

    Delete { id: String },

    MarkRead { id: String },
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => load_config_from(path),
        None => load_config(),
    }
    .map_err(|e| anyhow!("Configuration error: {e:#}"))?;
    let handler = EmailHandler::from_config(&cfg);

    match cli.cmd {
        Command::Wait {
            query,
            delay,
            interval,
            timeout,
        } => {
            let mut policy = *handler.policy();
            if let Some(s) = delay {
                policy.poll_delay = Duration::from_secs(s);
            }
            if let Some(s) = interval {
                policy.poll_interval = Duration::from_secs(s);
            }
            if let Some(s) = timeout {
                policy.timeout = Duration::from_secs(s);
            }
            let id = handler.ensure_one_message_with(&query, &policy)?;
            println!("{id}");
        }
        Command::List { query } => {
            for id in handler.get_messages(&query) {
                println!("{id}");
            }
        }
        Command::Show { id } => println!("{}", handler.get_message(&id).content),
        Command::Link { id, sub_text } => {
            println!("{}", handler.get_link_from_email(&id, &sub_text))
        }
        Command::ResetLink { id } => println!("{}", handler.get_password_forgotten_link(&id)),
        Command::VerifyLink { id } => {
            println!("{}", handler.get_account_verification_link(&id))
        }
        Command::Delete { id } => println!("{}", handler.delete(&id)),
        Command::MarkRead { id } => println!("{}", handler.mark_read(&id)),
    }

    Ok(())
}
