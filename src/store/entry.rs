//! Store Entry Module
//!
//! A single in-memory entry with an optional expiration deadline.

use std::time::Duration;

use tokio::time::Instant;

// == Store Entry ==
/// Represents a single stored payload with its deadline.
///
/// Deadlines use tokio's clock so a paused test runtime controls expiry.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// Serialized payload
    pub value: String,
    /// Write time
    pub created_at: Instant,
    /// Expiration deadline, None = no expiration
    pub expires_at: Option<Instant>,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates a new entry, expiring `lifetime` from now when given.
    pub fn new(value: String, lifetime: Option<Duration>) -> Self {
        let now = Instant::now();

        Self {
            value,
            created_at: now,
            expires_at: lifetime.map(|lifetime| now + lifetime),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its deadline, so an
    /// entry is never readable after its full lifetime has elapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Same as [`is_expired`](Self::is_expired) against a caller-supplied instant.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if no expiration is set.
    ///
    /// Saturates at zero once expired.
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}
