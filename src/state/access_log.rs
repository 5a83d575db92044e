use chrono::Local;
use std::{
    collections::VecDeque,
    sync::Mutex,
};

const MAX_LOGS: usize = 50;

/// The management write buffer's capacity in the original daemon; `SHOW_LOGS`
/// truncates its reply to fit within it, keeping only the most recent tail.
const MNG_WRITE_BUFFER_CAP: usize = 4096;

/// Bounded ring of access-log entries, one line per accepted or rejected
/// SOCKS5 relay attempt, surfaced by the management protocol's `SHOW_LOGS`.
pub struct AccessLog {
    entries: Mutex<VecDeque<String>>,
}

impl AccessLog {
    pub fn new() -> AccessLog {
        AccessLog {
            entries: Mutex::new(VecDeque::with_capacity(MAX_LOGS)),
        }
    }

    /// Appends `[TIMESTAMP] user=USER src=SRC dst=DST status=STATUS`,
    /// evicting the oldest entry once the ring is full.
    pub fn record(&self, user: &str, src: &str, dst: &str, status: &str) {
        let timestamp = Local::now().format("%Y-%m-%dT%H:%M:%S");
        let entry = format!("[{timestamp}] user={user} src={src} dst={dst} status={status}\n");

        let mut entries = self.entries.lock().expect("access log lock poisoned");
        if entries.len() == MAX_LOGS {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Renders the `SHOW_LOGS` reply body: `+OK\r\n` followed by every
    /// entry in chronological order, or, if that would exceed the
    /// management write buffer's capacity, `+OK (truncated, showing most
    /// recent logs)\r\n` followed by only as much of the tail as fits.
    pub fn render(&self) -> String {
        let entries = self.entries.lock().expect("access log lock poisoned");
        let logs: String = entries.iter().cloned().collect();

        const HEADER: &str = "+OK\r\n";
        if HEADER.len() + logs.len() <= MNG_WRITE_BUFFER_CAP {
            return format!("{HEADER}{logs}");
        }

        const TRUNCATED_HEADER: &str = "+OK (truncated, showing most recent logs)\r\n";
        let available = MNG_WRITE_BUFFER_CAP.saturating_sub(TRUNCATED_HEADER.len());
        let offset = logs.len().saturating_sub(available);
        // Don't split a UTF-8 entry in half; fall back to the nearest
        // following line boundary.
        let offset = logs[offset..].find('\n').map(|i| offset + i + 1).unwrap_or(logs.len());

        format!("{TRUNCATED_HEADER}{}", &logs[offset..])
    }
}

impl Default for AccessLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_entries_in_chronological_order() {
        let log = AccessLog::new();
        log.record("alice", "1.2.3.4:1111", "5.6.7.8:80", "CONNECT");
        log.record("bob", "1.2.3.4:2222", "5.6.7.8:443", "FAIL");

        let rendered = log.render();
        assert!(rendered.starts_with("+OK\r\n"));
        let alice_pos = rendered.find("user=alice").unwrap();
        let bob_pos = rendered.find("user=bob").unwrap();
        assert!(alice_pos < bob_pos);
    }

    #[test]
    fn evicts_oldest_entry_once_full() {
        let log = AccessLog::new();
        for i in 0..(MAX_LOGS + 5) {
            log.record(&format!("user{i}"), "src", "dst", "CONNECT");
        }

        let rendered = log.render();
        assert!(!rendered.contains("user=user0"));
        assert!(rendered.contains(&format!("user=user{}", MAX_LOGS + 4)));
    }

    #[test]
    fn truncates_when_logs_exceed_write_buffer_capacity() {
        let log = AccessLog::new();
        for i in 0..MAX_LOGS {
            log.record(
                &format!("user-with-a-reasonably-long-name-{i}"),
                "255.255.255.255:65535",
                "255.255.255.255:65535",
                "CONNECT",
            );
        }

        let rendered = log.render();
        assert!(rendered.starts_with("+OK (truncated, showing most recent logs)\r\n"));
        assert!(rendered.contains(&format!("user-with-a-reasonably-long-name-{}", MAX_LOGS - 1)));
    }
}
