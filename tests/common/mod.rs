use log::LevelFilter;
use log4rs_test_utils::test_logging::init_logging_once_for;
use std::{
    net::SocketAddr,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
};
use utils::assertions::assert_eq_vectors;

pub mod listeners;

pub fn init_logging() {
    init_logging_once_for(None, LevelFilter::Debug, "{h({({l}):5.5})} [{M}] {f}:{L}: {m}{n}");
}

pub fn next_available_address() -> SocketAddr {
    static PORT: AtomicUsize = AtomicUsize::new(32000);

    format!("127.0.0.1:{}", PORT.fetch_add(1, Ordering::AcqRel)).parse().unwrap()
}

/// Establishes a SOCKS5 connection with `endpoint` through `socks5_proxy`
/// (optionally authenticating), writes a random payload and expects it back
/// verbatim from an echo server listening at `endpoint`.
pub async fn ping_pong_data_through_socks5(endpoint: SocketAddr, socks5_proxy: SocketAddr, auth: Option<async_socks5::Auth>) {
    let mut socks5_stream = TcpStream::connect(socks5_proxy)
        .await
        .expect("Expect successful TCP connection established with proxy");

    async_socks5::connect(&mut socks5_stream, endpoint, auth)
        .await
        .expect("Expect successfully established SOCKS5 connection");

    let write_buff = utils::generate_data(1024);
    socks5_stream.write_all(&write_buff).await.expect("Expect all data to be written");

    let mut read_buff = vec![0u8; 1024];
    socks5_stream.read_exact(&mut read_buff).await.expect("Expect all data to be read");

    socks5_stream.shutdown().await.expect("Expect successful TCP stream shutdown");

    assert_eq_vectors(&write_buff, &read_buff);
}

/// A thin client for the line-oriented management protocol: sends one line
/// (appending `\r\n`) and reads back one logical reply. `METRICS`/`SHOW_LOGS`
/// replies are multi-line, so callers that need the full body should use
/// [`ManagementClient::read_body`] instead.
pub struct ManagementClient {
    reader: BufReader<tokio::net::tcp::OwnedReadHalf>,
    writer: tokio::net::tcp::OwnedWriteHalf,
}

impl ManagementClient {
    pub async fn connect(addr: SocketAddr) -> ManagementClient {
        let stream = TcpStream::connect(addr).await.expect("Expect successful TCP connection to management endpoint");
        let (read_half, write_half) = stream.into_split();
        ManagementClient {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }

    pub async fn send_line(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.expect("Expect line to be written");
        self.writer.write_all(b"\r\n").await.expect("Expect line terminator to be written");
    }

    /// Reads a single LF-terminated line, trimming the trailing CR/LF.
    pub async fn read_line(&mut self) -> Option<String> {
        use tokio::io::AsyncBufReadExt;
        let mut buf = String::new();
        let n = self.reader.read_line(&mut buf).await.expect("Expect line to be read");
        if n == 0 {
            return None;
        }
        while buf.ends_with('\n') || buf.ends_with('\r') {
            buf.pop();
        }
        Some(buf)
    }
}

pub mod utils {

    use rand::Rng;

    pub mod assertions {

        use std::fmt::Debug;

        pub fn assert_eq_vectors<T: Eq + Debug>(expected: &[T], actual: &[T]) {
            let matching = expected
                .iter()
                .zip(actual)
                .filter(|&(r, w)| {
                    assert_eq!(r, w);
                    r == w
                })
                .count();

            assert_eq!(expected.len(), matching, "whole buffers (write & read) should be equal");
        }
    }

    pub fn generate_data(len: usize) -> Vec<u8> {
        let v = vec![0u8; len];
        let mut rng = rand::thread_rng();

        v.iter().map(|_| rng.gen::<u8>()).collect()
    }
}
