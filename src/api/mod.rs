pub mod activities;
pub mod client;
pub mod csrf;
pub mod envelope;
pub mod headers;
pub mod keyring;
pub mod notes;
pub mod notify;
pub mod resource;
pub mod tasks;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;
