pub mod args;
pub mod config;
pub mod drop_policy;
#[cfg(test)]
mod fixture;
pub mod net;
pub mod node;
pub mod protocol;
pub mod route;
pub mod seed;
mod utils;

pub use args::Args;

/// Trait to be implemented by payload to be sent over the network.
pub trait Message: Sized {
    type Error;

    /// Convert a message into bytes.
    fn into_bytes(self) -> Vec<u8>;
    /// Convert bytes into a message.
    fn try_from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}
