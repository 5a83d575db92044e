use crate::{config::DEFAULT_COPY_CHUNK_CAP, state::metrics::Metrics};
use anyhow::Result;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Per-direction byte counters returned once both halves of a tunnel drain.
pub struct TunnelStats {
    pub l2r_bytes: u64,
    pub r2l_bytes: u64,
}

/// Relays bytes between two independent streams, capping every single
/// `read()` at the shared, runtime-tunable chunk size (`SET_BUFFER`).
///
/// `tokio::io::copy_bidirectional` has no hook for a per-read cap, so each
/// direction is pumped by hand: read up to the current cap, write it
/// through, repeat until EOF. Each direction drains independently — when
/// one side's source reaches EOF its destination half is shut down (a TCP
/// half-close), while the other direction keeps relaying until its own
/// source reaches EOF or errors.
pub struct LurkTunnel<'a, X, Y>
where
    X: AsyncRead + AsyncWrite + Unpin,
    Y: AsyncRead + AsyncWrite + Unpin,
{
    l2r: &'a mut X,
    r2l: &'a mut Y,
    chunk_cap: Arc<AtomicUsize>,
    metrics: Option<Arc<Metrics>>,
}

impl<'a, X, Y> LurkTunnel<'a, X, Y>
where
    X: AsyncRead + AsyncWrite + Unpin,
    Y: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(l2r: &'a mut X, r2l: &'a mut Y) -> LurkTunnel<'a, X, Y> {
        LurkTunnel {
            l2r,
            r2l,
            chunk_cap: Arc::new(AtomicUsize::new(DEFAULT_COPY_CHUNK_CAP)),
            metrics: None,
        }
    }

    pub fn with_chunk_cap(mut self, chunk_cap: Arc<AtomicUsize>) -> Self {
        self.chunk_cap = chunk_cap;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn run(&mut self) -> Result<TunnelStats> {
        let (l2r_read, l2r_write) = io::split(&mut *self.l2r);
        let (r2l_read, r2l_write) = io::split(&mut *self.r2l);

        let (l2r_bytes, r2l_bytes) = tokio::try_join!(
            pump(l2r_read, r2l_write, Arc::clone(&self.chunk_cap), self.metrics.clone()),
            pump(r2l_read, l2r_write, Arc::clone(&self.chunk_cap), self.metrics.clone()),
        )?;

        Ok(TunnelStats { l2r_bytes, r2l_bytes })
    }
}

/// Copies from `src` into `dst` until EOF, honoring `chunk_cap` on every
/// read (re-read each iteration, so `SET_BUFFER` applies mid-tunnel). Shuts
/// `dst` down once `src` reaches EOF.
async fn pump<R, W>(mut src: R, mut dst: W, chunk_cap: Arc<AtomicUsize>, metrics: Option<Arc<Metrics>>) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; DEFAULT_COPY_CHUNK_CAP.max(1)];
    let mut total = 0u64;

    loop {
        let cap = chunk_cap.load(Ordering::Relaxed).max(1);
        if cap > buf.len() {
            buf.resize(cap, 0);
        }

        let n = src.read(&mut buf[..cap]).await?;
        if n == 0 {
            dst.shutdown().await.ok();
            return Ok(total);
        }

        dst.write_all(&buf[..n]).await?;
        total += n as u64;

        if let Some(metrics) = &metrics {
            metrics.on_bytes_transferred(n as u64);
        }
    }
}
