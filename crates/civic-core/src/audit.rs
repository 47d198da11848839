use crate::error::AuditError;
use crate::types::TrackingId;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One accepted change, chained to its predecessor by hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub tracking_id: TrackingId,
    pub action: String,
    pub detail: String,
    pub prev_hash: [u8; 32],
    pub hash: [u8; 32],
}

impl AuditRecord {
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hex::encode(self.hash)
    }
}

/// Append-only trail of submissions and updates.
#[derive(Debug, Default)]
pub struct AuditLog {
    inner: Mutex<Vec<AuditRecord>>,
}

impl AuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, tracking_id: &TrackingId, action: &str, detail: impl Into<String>) -> u64 {
        let mut guard = self.inner.lock();
        let prev_hash = guard.last().map(|r| r.hash).unwrap_or([0u8; 32]);
        let mut record = AuditRecord {
            sequence: guard.len() as u64,
            timestamp: Utc::now(),
            tracking_id: tracking_id.clone(),
            action: action.to_string(),
            detail: detail.into(),
            prev_hash,
            hash: [0u8; 32],
        };
        record.hash = compute_hash(&record);
        let sequence = record.sequence;
        guard.push(record);
        sequence
    }

    pub fn records(&self) -> Vec<AuditRecord> {
        self.inner.lock().clone()
    }

    pub fn records_for(&self, tracking_id: &TrackingId) -> Vec<AuditRecord> {
        self.inner
            .lock()
            .iter()
            .filter(|r| &r.tracking_id == tracking_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn verify_integrity(&self) -> Result<(), AuditError> {
        let guard = self.inner.lock();
        let mut prev = [0u8; 32];
        for r in guard.iter() {
            if r.prev_hash != prev || r.hash != compute_hash(r) {
                return Err(AuditError::IntegrityViolation {
                    sequence: r.sequence,
                });
            }
            prev = r.hash;
        }
        Ok(())
    }

    #[cfg(test)]
    fn tamper(&self, sequence: usize, detail: &str) {
        self.inner.lock()[sequence].detail = detail.to_string();
    }
}

fn compute_hash(record: &AuditRecord) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(record.sequence.to_le_bytes());
    hasher.update(record.timestamp.timestamp_micros().to_le_bytes());
    hasher.update(record.tracking_id.as_str().as_bytes());
    hasher.update([0]);
    hasher.update(record.action.as_bytes());
    hasher.update([0]);
    hasher.update(record.detail.as_bytes());
    hasher.update([0]);
    hasher.update(record.prev_hash);
    hasher.finalize().into()
}
