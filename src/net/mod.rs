pub mod address;
pub mod tcp;

pub use address::Address;

use anyhow::Result;
use std::net::SocketAddr;
use tokio::net::{lookup_host, ToSocketAddrs};

/// Resolves any `ToSocketAddrs` to its first socket address, used when
/// binding listeners (the listener itself only ever needs one local addr).
pub async fn resolve_sockaddr(addr: impl ToSocketAddrs) -> Result<SocketAddr> {
    lookup_host(addr)
        .await?
        .next()
        .ok_or_else(|| anyhow::anyhow!("address did not resolve to anything"))
}
