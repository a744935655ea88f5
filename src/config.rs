use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::mail::poller::PollPolicy;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub links: LinkPatterns,
    pub provider: ProviderConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    pub poll_delay_secs: u64,
    pub poll_interval_secs: u64,
    pub timeout_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_delay_secs: 10,
            poll_interval_secs: 5,
            timeout_secs: 120,
        }
    }
}

impl PollingConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            poll_delay: Duration::from_secs(self.poll_delay_secs),
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Substrings identifying the links the convenience getters look for.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LinkPatterns {
    pub password_forgotten: String,
    pub account_verification: String,
}

impl Default for LinkPatterns {
    fn default() -> Self {
        Self {
            password_forgotten: "passwort-zuruecksetzen".to_string(),
            account_verification: "zugangsdaten-bestaetigen".to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderConfig {
    Imap(ImapConfig),
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ImapConfig {
    pub server: String,
    #[serde(default = "default_imap_port")]
    pub port: u16,
    #[serde(default = "default_mailbox")]
    pub mailbox: String,
    pub user_email: String,
    pub auth: ImapAuth,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ImapAuth {
    /// Bearer token read from a tokens file, see [`crate::tokens_file`].
    Xoauth2 { token_file: PathBuf },
    /// Plain LOGIN, the password taken from an environment variable.
    Password { password_env: String },
}

fn default_imap_port() -> u16 {
    993
}

fn default_mailbox() -> String {
    "INBOX".to_string()
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("no config dir available"))?
        .join("mailbox_probe"))
}

pub fn config_path() -> Result<PathBuf> {
    let mut p = config_dir()?;
    fs::create_dir_all(&p)?;
    p.push("config.toml");
    Ok(p)
}

/// Load the config from the default location, writing a template there if it is missing.
pub fn load_config() -> Result<Config> {
    let path = config_path()?;
    if !path.exists() {
        // create a template config for users to edit
        let tom = toml::to_string_pretty(&sample_config())?;
        fs::write(&path, tom)?;
        return Err(anyhow::anyhow!(
            "Created template config at {} — edit it and run again",
            path.display()
        ));
    }
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    parse_config(&s).with_context(|| format!("invalid config {}", path.display()))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s)?)
}

fn sample_config() -> Config {
    Config {
        polling: PollingConfig::default(),
        links: LinkPatterns::default(),
        provider: ProviderConfig::Imap(ImapConfig {
            server: "imap.gmail.com".to_string(),
            port: default_imap_port(),
            mailbox: default_mailbox(),
            user_email: "you@example.com".to_string(),
            auth: ImapAuth::Xoauth2 {
                token_file: PathBuf::from("tokens.json"),
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
        let cfg = parse_config(
            r#"
            [provider]
            kind = "imap"
            server = "imap.x.test"
            user_email = "qa@x.test"

            [provider.auth]
            method = "password"
            password_env = "QA_MAIL_PASSWORD"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.polling.policy(), PollPolicy::default());
        assert_eq!(cfg.links, LinkPatterns::default());

        let ProviderConfig::Imap(imap) = cfg.provider;
        assert_eq!(imap.server, "imap.x.test");
        assert_eq!(imap.port, 993);
        assert_eq!(imap.mailbox, "INBOX");
        assert!(matches!(
            imap.auth,
            ImapAuth::Password { ref password_env } if password_env == "QA_MAIL_PASSWORD"
        ));
    }

    #[test]
    fn polling_and_links_can_be_overridden() {
        let cfg = parse_config(
            r#"
            [polling]
            poll_delay_secs = 0
            timeout_secs = 30

            [links]
            password_forgotten = "reset-password"

            [provider]
            kind = "imap"
            server = "imap.x.test"
            port = 1993
            user_email = "qa@x.test"

            [provider.auth]
            method = "xoauth2"
            token_file = "/tmp/tokens.json"
            "#,
        )
        .unwrap();

        let policy = cfg.polling.policy();
        assert_eq!(policy.poll_delay, Duration::ZERO);
        assert_eq!(policy.poll_interval, Duration::from_secs(5));
        assert_eq!(policy.timeout, Duration::from_secs(30));
        assert_eq!(cfg.links.password_forgotten, "reset-password");
        assert_eq!(cfg.links.account_verification, "zugangsdaten-bestaetigen");

        let ProviderConfig::Imap(imap) = cfg.provider;
        assert_eq!(imap.port, 1993);
        assert!(matches!(imap.auth, ImapAuth::Xoauth2 { .. }));
    }

    #[test]
    fn missing_provider_is_rejected() {
        assert!(parse_config("[polling]\ntimeout_secs = 1\n").is_err());
    }

    #[test]
    fn sample_config_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, toml::to_string_pretty(&sample_config()).unwrap()).unwrap();

        let cfg = load_config_from(&path).unwrap();
        let ProviderConfig::Imap(imap) = cfg.provider;
        assert_eq!(imap.server, "imap.gmail.com");
    }
}
