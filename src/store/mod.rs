pub mod imap;
pub mod repo;

use crate::config::ProviderConfig;
use crate::store::imap::ImapStore;
use crate::store::repo::MessageStore;

/// Build the [`MessageStore`] selected by the provider section of the config.
pub fn open_store(provider: &ProviderConfig) -> Box<dyn MessageStore> {
    match provider {
        ProviderConfig::Imap(cfg) => Box::new(ImapStore::new(cfg.clone())),
    }
}
