#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub acks_sent: u64,
    pub acks_received: u64,
    pub reliable_delivered: u64,
    pub reliable_queued: u64,
    pub duplicates_dropped: u64,
    pub out_of_window_dropped: u64,
    pub malformed_dropped: u64,
}

pub fn rand_u64() -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};
    use std::time::{SystemTime, UNIX_EPOCH};

    let mut hasher = RandomState::new().build_hasher();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    hasher.write_u64(nanos);
    hasher.finish()
}

pub fn rand_client_id() -> u16 {
    (rand_u64() & 0xFFFF) as u16
}
