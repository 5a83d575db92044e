use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const LOG4RS_CONFIG_FILE_PATH: &str = "log/log4rs.yaml";

/// Default per-read chunk cap applied in the SOCKS5 copy phase, in bytes.
/// Mutable at runtime via the management protocol's `SET_BUFFER` command.
pub const DEFAULT_COPY_CHUNK_CAP: usize = 4096;

#[derive(Parser, Debug)]
#[clap(author = "Boris S. <boris.works@hotmail.com>", about = "SOCKS5 proxy with an out-of-band management protocol", version)]
pub struct LurkConfig {
    /// Address to bind the SOCKS5 listener on.
    #[clap(long, default_value = "0.0.0.0")]
    socks5_ip: IpAddr,

    /// TCP port to bind the SOCKS5 listener on.
    #[clap(long, short = 'p', default_value_t = 1080)]
    socks5_port: u16,

    /// Address to bind the management listener on.
    #[clap(long, default_value = "127.0.0.1")]
    mng_ip: IpAddr,

    /// TCP port to bind the management listener on.
    #[clap(long, default_value_t = 1081)]
    mng_port: u16,

    /// Require SOCKS5 clients to authenticate (RFC 1929 username/password).
    /// When disabled, the "no authentication" method is offered alongside
    /// "username/password" and preferred by clients that don't support auth.
    #[clap(long)]
    require_auth: bool,

    /// Path to the log4rs YAML configuration file.
    #[clap(long, default_value = LOG4RS_CONFIG_FILE_PATH)]
    log4rs_config: String,
}

impl LurkConfig {
    pub fn socks5_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.socks5_ip, self.socks5_port)
    }

    pub fn mng_bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.mng_ip, self.mng_port)
    }

    pub fn require_auth(&self) -> bool {
        self.require_auth
    }

    pub fn log4rs_config_path(&self) -> &str {
        &self.log4rs_config
    }

    /// Builds a config without going through `clap::Parser`, for tests that
    /// need independent bind addresses and auth requirements per server
    /// instance.
    pub fn for_test(socks5_addr: SocketAddr, mng_addr: SocketAddr, require_auth: bool) -> LurkConfig {
        LurkConfig {
            socks5_ip: socks5_addr.ip(),
            socks5_port: socks5_addr.port(),
            mng_ip: mng_addr.ip(),
            mng_port: mng_addr.port(),
            require_auth,
            log4rs_config: LOG4RS_CONFIG_FILE_PATH.to_string(),
        }
    }
}

impl Default for LurkConfig {
    fn default() -> Self {
        LurkConfig {
            socks5_ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            socks5_port: 1080,
            mng_ip: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            mng_port: 1081,
            require_auth: false,
            log4rs_config: LOG4RS_CONFIG_FILE_PATH.to_string(),
        }
    }
}
