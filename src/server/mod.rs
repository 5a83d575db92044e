use crate::{
    common::logging::{self},
    config::LurkConfig,
    net::tcp::LurkTcpListener,
    state::SharedState,
};
use anyhow::Result;
use async_listen::is_transient_error;
use log::{error, info, warn};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::{net::TcpStream, signal, time::sleep};
use tokio_util::{sync::CancellationToken, task::TaskTracker};

pub mod mgmt;
pub mod socks5;

pub struct LurkServer {
    socks5_addr: SocketAddr,
    mng_addr: SocketAddr,
    require_auth: bool,
    state: Arc<SharedState>,
    task_tracker: TaskTracker,
    task_cancellation_token: CancellationToken,
}

impl LurkServer {
    /// Delay after a non-transient TCP acception failure, e.g. resource
    /// exhaustion.
    const DELAY_AFTER_ERROR_MILLIS: u64 = 500;

    pub fn new(config: &LurkConfig) -> Result<LurkServer> {
        Ok(LurkServer {
            socks5_addr: config.socks5_bind_addr(),
            mng_addr: config.mng_bind_addr(),
            require_auth: config.require_auth(),
            state: SharedState::new(crate::config::DEFAULT_COPY_CHUNK_CAP),
            task_tracker: TaskTracker::new(),
            task_cancellation_token: CancellationToken::new(),
        })
    }

    pub async fn run(&self) -> Result<()> {
        let socks5_listener = LurkTcpListener::bind(self.socks5_addr).await?;
        let mng_listener = LurkTcpListener::bind(self.mng_addr).await?;
        info!("SOCKS5 listening on {}, management listening on {}", socks5_listener.local_addr(), mng_listener.local_addr());

        loop {
            tokio::select! {
                accepted = socks5_listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => self.on_socks5_connection(stream, peer_addr, socks5_listener.local_addr()),
                    Err(err) => self.on_tcp_acception_error(err).await,
                },
                accepted = mng_listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => self.on_mgmt_connection(stream, peer_addr),
                    Err(err) => self.on_tcp_acception_error(err).await,
                },
                _ = signal::ctrl_c() => {
                    info!("Received Ctrl+C. Gracefully tearing down ...");
                    self.on_shutdown_requested();
                    break
                }
            }
        }

        self.task_tracker.wait().await;

        Ok(())
    }

    async fn on_tcp_acception_error(&self, err: anyhow::Error) {
        logging::log_tcp_acception_error!(err);

        if let Some(err) = err.downcast_ref::<std::io::Error>() {
            if !is_transient_error(err) {
                sleep(Duration::from_millis(LurkServer::DELAY_AFTER_ERROR_MILLIS)).await;
            }
        }
    }

    fn on_socks5_connection(&self, stream: TcpStream, peer_addr: SocketAddr, local_addr: SocketAddr) {
        logging::log_tcp_established_conn!(peer_addr, "SOCKS5");

        let token = self.task_cancellation_token.clone();
        let require_auth = self.require_auth;
        let state = Arc::clone(&self.state);

        self.task_tracker.spawn(async move {
            tokio::select! {
                res = socks5::handle_connection(stream, peer_addr, local_addr, require_auth, state) => {
                    if let Err(err) = res {
                        logging::log_tcp_closed_conn_with_error!(peer_addr, "SOCKS5", err);
                    } else {
                        logging::log_tcp_closed_conn!(peer_addr, "SOCKS5");
                    }
                },
                _ = token.cancelled() => {
                    logging::log_tcp_canceled_conn!(peer_addr, "SOCKS5");
                }
            }
        });
    }

    fn on_mgmt_connection(&self, stream: TcpStream, peer_addr: SocketAddr) {
        logging::log_tcp_established_conn!(peer_addr, "management");

        let token = self.task_cancellation_token.clone();
        let state = Arc::clone(&self.state);

        self.task_tracker.spawn(async move {
            tokio::select! {
                res = mgmt::handle_connection(stream, peer_addr, state) => {
                    if let Err(err) = res {
                        logging::log_tcp_closed_conn_with_error!(peer_addr, "management", err);
                    } else {
                        logging::log_tcp_closed_conn!(peer_addr, "management");
                    }
                },
                _ = token.cancelled() => {
                    logging::log_tcp_canceled_conn!(peer_addr, "management");
                }
            }
        });
    }

    fn on_shutdown_requested(&self) {
        self.task_tracker.close();
        self.task_cancellation_token.cancel();
    }
}
