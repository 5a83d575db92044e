pub mod tunnel;

use anyhow::Result;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// A message the server reads off a client-controlled stream (SOCKS5
/// greeting, userpass sub-negotiation, relay request).
pub trait LurkRequest {
    async fn read_from<T: AsyncReadExt + Unpin>(stream: &mut T) -> Result<Self>
    where
        Self: std::marker::Sized;
}

/// A message the server writes back onto a client-controlled stream (SOCKS5
/// method selection, userpass outcome, relay reply).
pub trait LurkResponse {
    async fn write_to<T: AsyncWriteExt + Unpin>(&self, stream: &mut T) -> Result<()>;
}
