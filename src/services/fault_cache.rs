//! TTL-bounded cache of known faults.
//!
//! Records expire lazily: [`FaultCache::lookup`] is the only place stale
//! records are removed. There is no sweeper task, so memory is bounded by
//! the number of distinct fingerprints seen within the window plus any
//! stale entries that have not been read since they expired.
//!
//! # Concurrency
//!
//! The map sits behind a `std::sync::Mutex` that is never held across an
//! `.await`. Each operation is atomic on its own, but a lookup followed by
//! an insert is not: two reports with the same fingerprint that both miss
//! before either inserts will each open a ticket. Callers that need strict
//! one-ticket-per-fault semantics must serialize their reports.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::domain::models::{CreatedTicket, FaultFingerprint, FaultRecord};

/// Fingerprint → record map with lazy expiry.
#[derive(Debug)]
pub struct FaultCache {
    records: Mutex<HashMap<FaultFingerprint, FaultRecord>>,
    ttl: TimeDelta,
    enabled: bool,
}

impl FaultCache {
    /// Create an enabled cache with the given window.
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            ttl,
            enabled: true,
        }
    }

    /// Create a cache that never remembers anything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(TimeDelta::zero())
        }
    }

    /// Whether records are kept at all.
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn records(&self) -> MutexGuard<'_, HashMap<FaultFingerprint, FaultRecord>> {
        // A panic while holding the lock cannot leave a record half-written.
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_stale(&self, record: &FaultRecord, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(record.last_seen) > self.ttl
    }

    /// Find a live record. A record older than the window is evicted and
    /// reported as absent.
    pub fn lookup(&self, fingerprint: &FaultFingerprint, now: DateTime<Utc>) -> Option<FaultRecord> {
        if !self.enabled {
            return None;
        }

        let mut records = self.records();
        let record = records.get(fingerprint)?;
        if self.is_stale(record, now) {
            tracing::debug!(
                fingerprint = %fingerprint,
                ticket_id = %record.ticket_id,
                "fault record expired, evicting"
            );
            records.remove(fingerprint);
            return None;
        }
        Some(record.clone())
    }

    /// Remember a freshly created ticket for `fingerprint`.
    pub fn insert(&self, fingerprint: FaultFingerprint, ticket: &CreatedTicket, now: DateTime<Utc>) {
        if !self.enabled {
            return;
        }

        let record = FaultRecord {
            fingerprint: fingerprint.clone(),
            ticket_id: ticket.id.clone(),
            identifier: ticket.identifier.clone(),
            url: ticket.url.clone(),
            count: 1,
            first_seen: now,
            last_seen: now,
        };
        self.records().insert(fingerprint, record);
    }

    /// Record another sighting: bump the count and refresh `last_seen`.
    ///
    /// Returns the updated record, or `None` if the fingerprint is unknown.
    pub fn touch(&self, fingerprint: &FaultFingerprint, now: DateTime<Utc>) -> Option<FaultRecord> {
        let mut records = self.records();
        let record = records.get_mut(fingerprint)?;
        record.count += 1;
        record.last_seen = now;
        Some(record.clone())
    }

    /// Forget every record.
    pub fn clear(&self) {
        self.records().clear();
    }

    /// Number of records held, including expired ones not yet looked up.
    pub fn len(&self) -> usize {
        self.records().len()
    }

    /// Whether no records are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
