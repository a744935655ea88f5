use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Access token metadata kept by whatever tool performed the OAuth consent.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokensFile {
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>, // epoch seconds
}

pub fn load_tokens(path: &Path) -> Result<TokensFile> {
    let s = fs::read_to_string(path)
        .with_context(|| format!("failed to read tokens file {}", path.display()))?;
    let tf: TokensFile = serde_json::from_str(&s)
        .with_context(|| format!("invalid tokens file {}", path.display()))?;
    Ok(tf)
}

/// Returns the stored access token, refusing one that has already expired.
pub fn load_access_token(path: &Path) -> Result<String> {
    let tf = load_tokens(path)?;
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
    usable_token(tf, now).with_context(|| format!("tokens file {}", path.display()))
}

fn usable_token(tf: TokensFile, now: i64) -> Result<String> {
    let token = tf
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| anyhow!("no access token stored"))?;
    match tf.expires_at_epoch {
        Some(exp) if now >= exp => Err(anyhow!("access token expired at epoch {exp}")),
        _ => Ok(token),
    }
}
