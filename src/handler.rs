//! Test-facing facade over a [`MessageStore`].
//!
//! Everything except [`EmailHandler::ensure_one_message`] degrades to an empty value
//! or `false` when the provider misbehaves, so a test fails on "expected a link, got
//! an empty string" instead of on an unrelated transport error.

use log::{error, info, warn};

use crate::config::{Config, LinkPatterns};
use crate::domain::email::{Email, MessageId};
use crate::error::Error;
use crate::mail::body::extract_body;
use crate::mail::links::find_link;
use crate::mail::poller::{PollPolicy, poll_messages};
use crate::store::open_store;
use crate::store::repo::MessageStore;

pub struct EmailHandler {
    store: Box<dyn MessageStore>,
    policy: PollPolicy,
    links: LinkPatterns,
}

impl EmailHandler {
    pub fn new(store: Box<dyn MessageStore>) -> Self {
        Self {
            store,
            policy: PollPolicy::default(),
            links: LinkPatterns::default(),
        }
    }

    /// Handler over the configured provider, with the configured timing and link patterns.
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(open_store(&cfg.provider))
            .with_policy(cfg.polling.policy())
            .with_links(cfg.links.clone())
    }

    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_links(mut self, links: LinkPatterns) -> Self {
        self.links = links;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    /// Ids matching `query`, waiting for them according to the handler's policy.
    /// Empty if nothing showed up in time.
    pub fn get_messages(&self, query: &str) -> Vec<MessageId> {
        self.get_messages_with(query, &self.policy)
    }

    pub fn get_messages_with(&self, query: &str, policy: &PollPolicy) -> Vec<MessageId> {
        info!("querying mailbox with '{query}'");
        poll_messages(query, |q| self.store.search(q), policy)
    }

    /// The message with its extracted body; the body is empty if it could not be read.
    pub fn get_message(&self, id: &str) -> Email {
        Email::new(id, self.body_text(id))
    }

    pub fn delete(&self, id: &str) -> bool {
        self.store
            .delete(id)
            .map_err(|e| error!("failed to delete email {id}: {e:#}"))
            .is_ok()
    }

    pub fn mark_read(&self, id: &str) -> bool {
        self.store
            .mark_read(id)
            .map_err(|e| error!("failed to mark email read {id}: {e:#}"))
            .is_ok()
    }

    /// First `https` link in the body of `id` containing `sub_text`, or an empty string.
    ///
    /// For `https://someurl.com/foo/bar/T5JVydhMEqfTzshTtzWU`, any of `foo`, `foo/bar`,
    /// `bar` or `MEqfTz` selects the link.
    pub fn get_link_from_email(&self, id: &str, sub_text: &str) -> String {
        info!("retrieving link with text '{sub_text}' from {id}");
        find_link(&self.body_text(id), sub_text)
    }

    pub fn get_password_forgotten_link(&self, id: &str) -> String {
        self.get_link_from_email(id, &self.links.password_forgotten)
    }

    pub fn get_account_verification_link(&self, id: &str) -> String {
        self.get_link_from_email(id, &self.links.account_verification)
    }

    /// The single message matching `query`, marked as read.
    ///
    /// Finding none or several means the test precondition is broken; that is the one
    /// failure this handler reports instead of swallowing.
    pub fn ensure_one_message(&self, query: &str) -> Result<MessageId, Error> {
        self.ensure_one_message_with(query, &self.policy)
    }

    pub fn ensure_one_message_with(
        &self,
        query: &str,
        policy: &PollPolicy,
    ) -> Result<MessageId, Error> {
        let messages = self.get_messages_with(query, policy);
        info!("{query} got {} messages", messages.len());

        let [id] = <[MessageId; 1]>::try_from(messages).map_err(|found| Error::NotUnique {
            query: query.to_string(),
            found: found.len(),
        })?;

        info!("current email id: {id}");
        if self.mark_read(&id) {
            info!("email {id} marked as read");
        }
        Ok(id)
    }

    fn body_text(&self, id: &str) -> String {
        match self.store.fetch_raw(id).and_then(|raw| extract_body(&raw)) {
            Ok(text) => text,
            Err(e) => {
                warn!("failed to retrieve email {id}: {e:#}");
                String::new()
            }
        }
    }
}
