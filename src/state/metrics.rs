use std::sync::atomic::{AtomicU64, Ordering};

/// Connection and traffic counters exposed by the management protocol's
/// `METRICS` command.
pub struct Metrics {
    historic_connections: AtomicU64,
    current_connections: AtomicU64,
    transferred_bytes: AtomicU64,
}

impl Metrics {
    pub fn new() -> Metrics {
        Metrics {
            historic_connections: AtomicU64::new(0),
            current_connections: AtomicU64::new(0),
            transferred_bytes: AtomicU64::new(0),
        }
    }

    pub fn on_connection_started(&self) {
        self.historic_connections.fetch_add(1, Ordering::Relaxed);
        self.current_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn on_connection_ended(&self) {
        self.current_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn on_bytes_transferred(&self, bytes: u64) {
        self.transferred_bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn historic_connections(&self) -> u64 {
        self.historic_connections.load(Ordering::Relaxed)
    }

    pub fn current_connections(&self) -> u64 {
        self.current_connections.load(Ordering::Relaxed)
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Renders the `+OK metrics` reply body for the management protocol.
    pub fn render(&self) -> String {
        format!(
            "+OK metrics\r\ntotal connections: {}\r\ncurrent connections: {}\r\ntotal transferred bytes: {}\r\n",
            self.historic_connections(),
            self.current_connections(),
            self.transferred_bytes()
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
