pub mod access_log;
pub mod metrics;
pub mod users;

use access_log::AccessLog;
use metrics::Metrics;
use std::sync::{atomic::AtomicUsize, Arc};
use users::UserTable;

/// State shared between every SOCKS5 and management session task: the user
/// table, connection/byte counters, the bounded access log ring and the
/// runtime-tunable copy chunk cap (`SET_BUFFER`).
pub struct SharedState {
    pub users: UserTable,
    pub metrics: Arc<Metrics>,
    pub access_log: AccessLog,
    pub copy_chunk_cap: Arc<AtomicUsize>,
}

impl SharedState {
    pub fn new(default_chunk_cap: usize) -> Arc<SharedState> {
        Arc::new(SharedState {
            users: UserTable::new(),
            metrics: Arc::new(Metrics::new()),
            access_log: AccessLog::new(),
            copy_chunk_cap: Arc::new(AtomicUsize::new(default_chunk_cap)),
        })
    }
}
