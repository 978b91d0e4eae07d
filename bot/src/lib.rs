pub mod api;
pub mod config;
pub mod events;
pub mod messages;
pub mod webhook;

#[cfg(test)]
pub(crate) mod testutils;
