//! Network subsystem: TCP server and client

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "server")]
pub mod server;

#[cfg(feature = "client")]
pub use client::AudioClient;
#[cfg(feature = "server")]
pub use server::AudioServer;
