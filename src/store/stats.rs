//! Keyspace Statistics Module
//!
//! Counters the in-memory store reports through INFO stats.

// == Keyspace Stats ==
/// Tracks command and lookup counters.
#[derive(Debug, Clone, Default)]
pub struct KeyspaceStats {
    /// Number of lookups that found a live key
    pub keyspace_hits: u64,
    /// Number of lookups that found nothing
    pub keyspace_misses: u64,
    /// Number of keys removed because their TTL elapsed
    pub expired_keys: u64,
    /// Number of commands served
    pub total_commands_processed: u64,
}

impl KeyspaceStats {
    // == Constructor ==
    /// Creates a new KeyspaceStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&mut self) {
        self.keyspace_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.keyspace_misses += 1;
    }

    pub fn record_expired(&mut self) {
        self.expired_keys += 1;
    }

    pub fn record_command(&mut self) {
        self.total_commands_processed += 1;
    }
}
