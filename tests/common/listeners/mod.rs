use anyhow::Result;
use log::debug;
use lurk_admin::{config::LurkConfig, server::LurkServer};
use std::{future::Future, net::SocketAddr, sync::Mutex};
use tokio::task::{yield_now, JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

pub mod tcp_echo_server;

#[allow(unused_macros)]
macro_rules! cancel_listener {
    ($l:expr) => {
        $l.cancel().await.expect("Failed to cancel async task");
    };
}

#[allow(unused_imports)]
pub(crate) use cancel_listener;

pub trait AsyncListener {
    fn name(&self) -> &'static str;

    fn listen(&mut self) -> impl Future<Output = Result<()>> + Send;

    fn run(self) -> impl Future<Output = AsyncListenerTask> + Send
    where
        Self: Send + Sized + 'static,
    {
        AsyncListenerTask::spawn(self)
    }
}

pub struct AsyncListenerTask {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

impl AsyncListenerTask {
    /// Spawn listener through tokio::spawn with graceful cancellation ability.
    async fn spawn<T>(mut listener: T) -> AsyncListenerTask
    where
        T: AsyncListener + Send + 'static,
    {
        let token = CancellationToken::new();
        let token_clone = token.clone();

        let failure_msg = format!("[AsyncListenerTask] Failure occured while running {} listener", listener.name());

        let handle = tokio::spawn(async move {
            tokio::select! {
                res = listener.listen() => res.expect(&failure_msg),
                _ = token_clone.cancelled() => {
                    debug!(
                        "[AsyncListenerTask] {} listener has been cancelled. Shutting down the task ...",
                        listener.name()
                    );
                }
            }
        });

        yield_now().await;

        AsyncListenerTask { handle, token }
    }

    /// Cancel task and wait for it's termination.
    pub async fn cancel(self) -> Result<(), JoinError> {
        self.token.cancel();
        self.handle.await
    }
}

/*
 * Lurk server listener, binding both the SOCKS5 and management endpoints.
 */

pub struct LurkServerListener {
    server: LurkServer,
}

/// Guards the window between setting `ADMIN` and the `LurkServer` reading it
/// in `UserTable::new`, since the env var is process-global and tests run
/// concurrently.
static ADMIN_ENV_LOCK: Mutex<()> = Mutex::new(());

impl LurkServerListener {
    pub fn new(socks5_addr: SocketAddr, mng_addr: SocketAddr, require_auth: bool) -> LurkServerListener {
        let config = LurkConfig::for_test(socks5_addr, mng_addr, require_auth);
        LurkServerListener {
            server: LurkServer::new(&config).expect("Failed to construct Lurk server"),
        }
    }

    /// Same as `new`, but seeds the user table with an initial `admin` user
    /// (the management protocol's only bootstrap path) before the server
    /// starts accepting connections.
    pub fn new_with_admin(socks5_addr: SocketAddr, mng_addr: SocketAddr, require_auth: bool, admin: &str) -> LurkServerListener {
        let _guard = ADMIN_ENV_LOCK.lock().expect("admin env lock poisoned");
        std::env::set_var("ADMIN", admin);
        let listener = LurkServerListener::new(socks5_addr, mng_addr, require_auth);
        std::env::remove_var("ADMIN");
        listener
    }
}

impl AsyncListener for LurkServerListener {
    fn listen(&mut self) -> impl Future<Output = Result<()>> + Send {
        self.server.run()
    }

    fn name(&self) -> &'static str {
        "Lurk server"
    }
}
