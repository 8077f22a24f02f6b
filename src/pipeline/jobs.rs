//! Ingestion job state machine.
//!
//! A job is the folder row itself: status, a human-readable current step and
//! a final summary. The state machine only moves forward
//! (queued → processing → completed | failed); updates are idempotent
//! last-writer-wins writes, so the detached worker and the polling caller
//! need no locking.

use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::JobStatus;

/// Caller-facing view of a job, served by the polling endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub job_id: Uuid,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

pub fn load(conn: &Connection, job_id: &Uuid) -> Result<Option<JobView>, DatabaseError> {
    Ok(db::get_folder(conn, job_id)?.map(|folder| JobView {
        job_id: folder.id,
        status: folder.status,
        step: folder.step,
        summary: folder.summary,
    }))
}

/// Status writer bound to one job. All writes are best-effort: a failed
/// status update is logged and swallowed so it can never take down the
/// pipeline run it describes.
pub struct JobTracker<'a> {
    conn: &'a Connection,
    job_id: Uuid,
}

impl<'a> JobTracker<'a> {
    pub fn new(conn: &'a Connection, job_id: Uuid) -> Self {
        Self { conn, job_id }
    }

    pub fn step(&self, label: &str) {
        tracing::info!(job_id = %self.job_id, step = %label, "Job step");
        if let Err(e) = db::advance_folder(self.conn, &self.job_id, JobStatus::Processing, label) {
            tracing::warn!(job_id = %self.job_id, error = %e, "Failed to record job step");
        }
    }

    pub fn complete(&self, summary: &str) {
        tracing::info!(job_id = %self.job_id, summary = %summary, "Job completed");
        if let Err(e) = db::complete_folder(self.conn, &self.job_id, summary) {
            tracing::warn!(job_id = %self.job_id, error = %e, "Failed to record completion");
        }
    }

    pub fn fail(&self, message: &str) {
        tracing::error!(job_id = %self.job_id, message = %message, "Job failed");
        if let Err(e) = db::fail_folder(self.conn, &self.job_id, message) {
            tracing::warn!(job_id = %self.job_id, error = %e, "Failed to record failure");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_folder, open_memory_database};

    #[test]
    fn tracker_advances_and_completes() {
        let conn = open_memory_database().unwrap();
        let id = Uuid::new_v4();
        create_folder(&conn, &id, "doc.pdf", JobStatus::Processing, "mapping document").unwrap();

        let tracker = JobTracker::new(&conn, id);
        tracker.step("classified as ESCRITURA");

        let view = load(&conn, &id).unwrap().unwrap();
        assert_eq!(view.status, JobStatus::Processing);
        assert_eq!(view.step.as_deref(), Some("classified as ESCRITURA"));

        tracker.complete("IA: 2 personas, 1 inmuebles");
        let view = load(&conn, &id).unwrap().unwrap();
        assert_eq!(view.status, JobStatus::Completed);
        assert!(view.status.is_terminal());
    }

    #[test]
    fn tracker_fail_records_message_as_step() {
        let conn = open_memory_database().unwrap();
        let id = Uuid::new_v4();
        create_folder(&conn, &id, "doc.pdf", JobStatus::Processing, "start").unwrap();

        JobTracker::new(&conn, id).fail("reasoning service unreachable");
        let view = load(&conn, &id).unwrap().unwrap();
        assert_eq!(view.status, JobStatus::Failed);
        assert_eq!(view.step.as_deref(), Some("reasoning service unreachable"));
    }

    #[test]
    fn load_unknown_job_is_none() {
        let conn = open_memory_database().unwrap();
        assert!(load(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn tracker_on_missing_row_does_not_panic() {
        let conn = open_memory_database().unwrap();
        // UPDATE on a nonexistent row affects 0 rows; tracker must shrug.
        JobTracker::new(&conn, Uuid::new_v4()).step("noop");
    }
}
