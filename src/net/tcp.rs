use super::resolve_sockaddr;
use anyhow::Result;
use log::{debug, info};
use socket2::{Domain, Socket, TcpKeepalive, Type};
use std::{net::SocketAddr, time::Duration};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

const TCP_LISTEN_BACKLOG: i32 = 1024;

/// Different TCP connection options applied to outbound (origin) sockets.
pub struct TcpConnectionOptions {
    keep_alive: Option<TcpKeepalive>,
}

impl TcpConnectionOptions {
    pub fn new() -> TcpConnectionOptions {
        TcpConnectionOptions { keep_alive: None }
    }

    pub fn set_keepalive(&mut self, keep_alive: TcpKeepalive) -> &mut TcpConnectionOptions {
        debug_assert!(self.keep_alive.is_none(), "should be unset");
        self.keep_alive = Some(keep_alive);
        self
    }

    pub fn apply_to(&self, tcp_stream: &TcpStream) -> Result<()> {
        let tcp_sock_ref = socket2::SockRef::from(tcp_stream);

        if let Some(keep_alive) = &self.keep_alive {
            tcp_sock_ref.set_tcp_keepalive(keep_alive)?;
        }

        Ok(())
    }
}

impl Default for TcpConnectionOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Establishes a TCP connection with the passed `addr`, applying `tcp_opts`
/// right after the stream is created.
pub async fn establish_tcp_connection_with_opts(addr: SocketAddr, tcp_opts: &TcpConnectionOptions) -> Result<TcpStream> {
    let tcp_stream = TcpStream::connect(addr).await.map_err(anyhow::Error::from)?;
    tcp_opts.apply_to(&tcp_stream)?;

    Ok(tcp_stream)
}

/// Establishes a TCP connection with the passed `addr` using the default
/// keepalive policy.
pub async fn establish_tcp_connection(addr: SocketAddr) -> Result<TcpStream> {
    let mut tcp_opts = TcpConnectionOptions::new();
    tcp_opts.set_keepalive(
        TcpKeepalive::new()
            .with_time(Duration::from_secs(150)) // 2.5 min
            .with_interval(Duration::from_secs(30)), // 30 sec
    );

    establish_tcp_connection_with_opts(addr, &tcp_opts).await
}

/// Thin wrapper over `tokio::net::TcpListener` that binds with `SO_REUSEADDR`
/// and a fixed backlog, so restarts don't fail on "address already in use".
pub struct LurkTcpListener {
    inner: TcpListener,
}

impl LurkTcpListener {
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<LurkTcpListener> {
        let bind_addr = resolve_sockaddr(addr).await?;

        let socket = Socket::new(Domain::for_address(bind_addr), Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.bind(&bind_addr.into())?;
        socket.listen(TCP_LISTEN_BACKLOG)?;
        socket.set_nonblocking(true)?;

        let inner = TcpListener::from_std(socket.into())?;
        info!("Listening on {}", inner.local_addr()?);

        Ok(LurkTcpListener { inner })
    }

    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, addr) = self.inner.accept().await?;
        debug!("Accepted TCP connection from {}", addr);

        Ok((stream, addr))
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr().expect("listener should have a local address")
    }
}
