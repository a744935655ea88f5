//! Find a test email in a mailbox, wait for it to arrive and pull a link out of its body.
//!
//! ```no_run
//! use mailbox_probe::config::load_config;
//! use mailbox_probe::handler::EmailHandler;
//!
//! # fn main() -> anyhow::Result<()> {
//! let handler = EmailHandler::from_config(&load_config()?);
//! let id = handler.ensure_one_message("UNSEEN SUBJECT \"Reset your password\"")?;
//! let link = handler.get_password_forgotten_link(&id);
//! assert!(link.starts_with("https"));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod handler;
pub mod mail;
pub mod store;
pub mod tokens_file;

pub use domain::email::{Email, MessageId};
pub use error::Error;
pub use handler::EmailHandler;
pub use mail::poller::PollPolicy;
pub use store::repo::MessageStore;
