use std::sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
};

/// Process-unique, monotonically increasing connection id for log correlation.
///
/// The counter starts at a random 32-bit offset, so ids from separate server runs rarely overlap.
pub fn next_conn_id() -> u64 {
    static COUNTER: OnceLock<AtomicU64> = OnceLock::new();
    let counter = COUNTER.get_or_init(|| AtomicU64::new(u64::from(rand::random::<u32>())));
    counter.fetch_add(1, Ordering::Relaxed)
}
