pub mod body;
pub mod links;
pub mod poller;
