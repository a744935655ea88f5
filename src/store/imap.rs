use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose};
use log::debug;
use native_tls::{TlsConnector, TlsStream};
use std::net::TcpStream;

use crate::config::{ImapAuth, ImapConfig};
use crate::domain::email::MessageId;
use crate::store::repo::MessageStore;
use crate::tokens_file;

type ImapSession = imap::Session<TlsStream<TcpStream>>;

/// Build canonical auth string as bytes.
fn build_xoauth2_bytes(user: &str, access_token: &str) -> Vec<u8> {
    let user_field = format!("user={}", user);
    let auth_field = format!("auth=Bearer {}", access_token);
    let auth_string = format!("{}{}{}{}{}", user_field, "\x01", auth_field, "\x01", "\x01");
    auth_string.into_bytes()
}

struct OAuth2Authenticator {
    response: Vec<u8>,
}

impl imap::Authenticator for OAuth2Authenticator {
    type Response = Vec<u8>;
    fn process(&self, _challenge: &[u8]) -> Self::Response {
        self.response.clone()
    }
}

/// [`MessageStore`] over IMAP. Ids are UIDs in the configured mailbox.
///
/// Every call opens its own session, so the store itself holds no connection state.
pub struct ImapStore {
    cfg: ImapConfig,
}

impl ImapStore {
    pub fn new(cfg: ImapConfig) -> Self {
        Self { cfg }
    }

    fn connect_and_auth(&self) -> Result<ImapSession> {
        let server = self.cfg.server.as_str();
        let tls = TlsConnector::builder().build()?;
        let mut client = imap::connect((server, self.cfg.port), server, &tls)
            .with_context(|| format!("failed to connect to {server}:{}", self.cfg.port))?;

        match &self.cfg.auth {
            ImapAuth::Password { password_env } => {
                let password = std::env::var(password_env)
                    .with_context(|| format!("{password_env} is not set"))?;
                client
                    .login(&self.cfg.user_email, password)
                    .map_err(|(e, _)| anyhow!("LOGIN failed for {}: {e}", self.cfg.user_email))
            }
            ImapAuth::Xoauth2 { token_file } => {
                let access_token = tokens_file::load_access_token(token_file)?;
                let raw_payload = build_xoauth2_bytes(&self.cfg.user_email, &access_token);

                // Try RAW first
                let auth_raw = OAuth2Authenticator {
                    response: raw_payload.clone(),
                };
                match client.authenticate("XOAUTH2", &auth_raw) {
                    Ok(session) => return Ok(session),
                    Err((e, returned_client)) => {
                        debug!("raw XOAUTH2 attempt failed: {e}");
                        client = returned_client;
                    }
                }

                // Fallback BASE64
                let b64_bytes = general_purpose::STANDARD.encode(&raw_payload).into_bytes();
                let auth_b64 = OAuth2Authenticator {
                    response: b64_bytes,
                };
                client
                    .authenticate("XOAUTH2", &auth_b64)
                    .map_err(|(e, _)| anyhow!("XOAUTH2 failed (raw+base64): {e}"))
            }
        }
    }

    /// Open a session with the mailbox selected, run `op`, and log out.
    fn with_session<T>(&self, op: impl FnOnce(&mut ImapSession) -> Result<T>) -> Result<T> {
        let mut session = self.connect_and_auth()?;
        session.select(&self.cfg.mailbox)?;
        let out = op(&mut session);
        if let Err(e) = session.logout() {
            debug!("logout from {} failed: {e}", self.cfg.server);
        }
        out
    }
}

/// The UID-scoped write commands `delete` and `mark_read` are built from.
trait UidCommands {
    fn add_flags(&mut self, uid: u32, flags: &str) -> Result<()>;
    /// Remove `uid` only, leaving other `\Deleted` messages alone (UIDPLUS).
    fn expunge_uid(&mut self, uid: u32) -> Result<()>;
}

impl UidCommands for ImapSession {
    fn add_flags(&mut self, uid: u32, flags: &str) -> Result<()> {
        self.uid_store(uid.to_string(), format!("+FLAGS ({flags})"))?;
        Ok(())
    }

    fn expunge_uid(&mut self, uid: u32) -> Result<()> {
        self.uid_expunge(uid.to_string())?;
        Ok(())
    }
}

fn delete_uid(session: &mut impl UidCommands, uid: u32) -> Result<()> {
    session.add_flags(uid, "\\Deleted")?;
    session.expunge_uid(uid)
}

fn mark_uid_read(session: &mut impl UidCommands, uid: u32) -> Result<()> {
    session.add_flags(uid, "\\Seen")
}

fn parse_uid(id: &str) -> Result<u32> {
    id.parse()
        .map_err(|_| anyhow!("'{id}' is not an IMAP UID"))
}

impl MessageStore for ImapStore {
    fn search(&self, query: &str) -> Result<Vec<MessageId>> {
        self.with_session(|session| {
            let mut uids: Vec<u32> = session.uid_search(query)?.into_iter().collect();
            uids.sort_unstable(); // ascending
            Ok(uids.into_iter().map(|uid| uid.to_string()).collect())
        })
    }

    fn fetch_raw(&self, id: &str) -> Result<Vec<u8>> {
        let uid = parse_uid(id)?;
        self.with_session(|session| {
            let fetches = session.uid_fetch(uid.to_string(), "(UID BODY.PEEK[])")?;
            let f = fetches
                .iter()
                .next()
                .ok_or_else(|| anyhow!("email UID {uid} not found"))?;
            let raw = f
                .body()
                .ok_or_else(|| anyhow!("UID {uid}: missing body"))?;
            Ok(raw.to_vec())
        })
    }

    fn delete(&self, id: &str) -> Result<()> {
        let uid = parse_uid(id)?;
        self.with_session(|session| delete_uid(session, uid))
    }

    fn mark_read(&self, id: &str) -> Result<()> {
        let uid = parse_uid(id)?;
        self.with_session(|session| mark_uid_read(session, uid))
    }
}
