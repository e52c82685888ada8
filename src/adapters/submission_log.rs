//! Recent submissions, fed by the host callbacks and read by `/api/submissions`

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{SubmissionObserver, SubmissionPayload, SubmissionResult};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub payload: SubmissionPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SubmissionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

/// Bounded in-memory log, newest first
#[derive(Clone)]
pub struct SubmissionLog {
    records: Arc<RwLock<VecDeque<SubmissionRecord>>>,
    limit: usize,
}

impl SubmissionLog {
    pub fn new(limit: usize) -> Self {
        Self {
            records: Arc::new(RwLock::new(VecDeque::new())),
            limit: limit.max(1),
        }
    }

    /// Observer for a single submit; pairs the response with its payload.
    pub fn observer(&self) -> Arc<SubmissionLogObserver> {
        Arc::new(SubmissionLogObserver {
            log: self.clone(),
            current: Mutex::new(None),
        })
    }

    pub fn record(&self, payload: &SubmissionPayload) -> Uuid {
        let record = SubmissionRecord {
            id: Uuid::new_v4(),
            submitted_at: Utc::now(),
            payload: payload.clone(),
            result: None,
            settled_at: None,
        };
        let id = record.id;

        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        records.push_front(record);
        records.truncate(self.limit);
        id
    }

    /// Attach a result to a recorded submission. Returns false when the
    /// record has already been evicted.
    pub fn settle(&self, id: Uuid, result: &SubmissionResult) -> bool {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        match records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.result = Some(result.clone());
                record.settled_at = Some(Utc::now());
                true
            }
            None => false,
        }
    }

    pub fn list(&self) -> Vec<SubmissionRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records.iter().cloned().collect()
    }

    pub fn get(&self, id: Uuid) -> Option<SubmissionRecord> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records.iter().find(|r| r.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct SubmissionLogObserver {
    log: SubmissionLog,
    current: Mutex<Option<Uuid>>,
}

impl SubmissionObserver for SubmissionLogObserver {
    fn on_submission_data(&self, payload: &SubmissionPayload) {
        let id = self.log.record(payload);
        debug!(%id, form_id = %payload.form_id, fields = ?payload.fields, "Submission started");
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = Some(id);
    }

    fn on_submission_response(&self, result: &SubmissionResult) {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner()).take();
        let Some(id) = current else {
            warn!("Submission response without a recorded submission");
            return;
        };

        if result.success {
            info!(%id, "Submission accepted");
        } else {
            warn!(%id, error = ?result.error, "Submission failed");
        }
        self.log.settle(id, result);
    }
}
