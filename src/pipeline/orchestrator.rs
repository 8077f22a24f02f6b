//! Ingestion orchestrator.
//!
//! Single entry point driving the full pipeline:
//! admission → text extraction → classification → skill routing →
//! normalization → persistence → finalization.
//!
//! Small uploads run inline and return the finished record; uploads above
//! the configured threshold are admitted as jobs: the folder row is created
//! immediately, the caller gets its id, and the same stages continue on a
//! detached worker thread that reports progress through the job row. The
//! orchestrator is the only component that catches broadly: every fatal
//! error becomes a job-status transition.

use std::sync::Arc;
use std::time::Instant;

use rusqlite::Connection;
use serde_json::json;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::db::{self, DatabaseError};
use crate::models::{DocumentType, JobStatus, NormalizedRecord};
use crate::pipeline::classifier;
use crate::pipeline::jobs::JobTracker;
use crate::pipeline::normalizer::{self, normalize_id, to_title_case};
use crate::pipeline::skills::reasoning::ReasoningClient;
use crate::pipeline::skills::{
    Attachment, SkillError, SkillExecutor, SkillRegistry, ENTITY_EXTRACTOR, IDENTITY_VISION,
    TAX_CALCULATOR, UIF_COMPLIANCE,
};
use crate::pipeline::text;
use crate::storage::{BlobStorage, StorageError};

// ---------------------------------------------------------------------------
// Error and result types
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Empty upload")]
    EmptyUpload,

    #[error(transparent)]
    Skill(#[from] SkillError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ingestion exceeded its {budget_secs}s budget")]
    DeadlineExceeded { budget_secs: u64 },

    #[error("Could not start ingestion worker: {0}")]
    Spawn(String),
}

/// An uploaded document entering the pipeline.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// Outcome of admission: a finished record (sync) or an accepted job (async).
#[derive(Debug)]
pub enum IngestOutcome {
    Completed {
        job_id: Uuid,
        record: NormalizedRecord,
    },
    Accepted {
        job_id: Uuid,
    },
}

struct PersistCounts {
    parties: usize,
    assets: usize,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct IngestionPipeline {
    config: PipelineConfig,
    executor: SkillExecutor,
    blobs: Arc<dyn BlobStorage>,
}

impl IngestionPipeline {
    pub fn new(
        config: PipelineConfig,
        registry: Arc<SkillRegistry>,
        reasoning: Arc<dyn ReasoningClient>,
        blobs: Arc<dyn BlobStorage>,
    ) -> Self {
        Self {
            config,
            executor: SkillExecutor::new(registry, reasoning),
            blobs,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Admit an upload. Large files return immediately with a job id and
    /// continue on a detached worker; small files run inline.
    pub fn ingest(self: Arc<Self>, upload: DocumentUpload) -> Result<IngestOutcome, IngestError> {
        if upload.bytes.is_empty() {
            return Err(IngestError::EmptyUpload);
        }

        std::fs::create_dir_all(&self.config.data_dir)?;
        let conn = db::open_database(&self.config.db_path())?;

        let job_id = Uuid::new_v4();
        let caratula: String = upload.file_name.chars().take(100).collect();
        db::create_folder(&conn, &job_id, &caratula, JobStatus::Processing, "mapping document")?;

        let size = upload.bytes.len() as u64;
        if size > self.config.async_threshold_bytes {
            tracing::info!(
                job_id = %job_id,
                size,
                threshold = self.config.async_threshold_bytes,
                "Large upload admitted as background job"
            );
            let pipeline = Arc::clone(&self);
            let spawned = std::thread::Builder::new()
                .name(format!("ingest-{job_id}"))
                .spawn(move || pipeline.run_detached(job_id, upload));

            if let Err(e) = spawned {
                JobTracker::new(&conn, job_id).fail(&format!("worker spawn failed: {e}"));
                return Err(IngestError::Spawn(e.to_string()));
            }
            return Ok(IngestOutcome::Accepted { job_id });
        }

        tracing::info!(job_id = %job_id, size, "Small upload, processing inline");
        let record = self.run_pipeline(&conn, job_id, &upload)?;
        Ok(IngestOutcome::Completed { job_id, record })
    }

    /// Detached continuation for async jobs. Outcome is recorded on the job
    /// row; the caller polls for it.
    fn run_detached(&self, job_id: Uuid, upload: DocumentUpload) {
        let conn = match db::open_database(&self.config.db_path()) {
            Ok(conn) => conn,
            Err(e) => {
                tracing::error!(job_id = %job_id, error = %e, "Worker could not open database");
                return;
            }
        };
        if let Err(e) = self.run_pipeline(&conn, job_id, &upload) {
            tracing::error!(job_id = %job_id, error = %e, "Background ingestion failed");
        }
    }

    /// Run the post-admission stages and translate the outcome into a terminal
    /// job status.
    fn run_pipeline(
        &self,
        conn: &Connection,
        job_id: Uuid,
        upload: &DocumentUpload,
    ) -> Result<NormalizedRecord, IngestError> {
        let tracker = JobTracker::new(conn, job_id);
        let started = Instant::now();

        match self.execute_stages(conn, &tracker, job_id, upload, started) {
            Ok((record, summary)) => {
                tracker.complete(&summary);
                Ok(record)
            }
            Err(e) => {
                tracker.fail(&e.to_string());
                Err(e)
            }
        }
    }

    fn execute_stages(
        &self,
        conn: &Connection,
        tracker: &JobTracker<'_>,
        job_id: Uuid,
        upload: &DocumentUpload,
        started: Instant,
    ) -> Result<(NormalizedRecord, String), IngestError> {
        // Best-effort text extraction.
        let extracted_text = text::extract_text(&upload.bytes, &upload.media_type);
        let attachment = Attachment {
            bytes: upload.bytes.clone(),
            media_type: upload.media_type.clone(),
        };

        // Classification.
        self.check_budget(started)?;
        let classification = classifier::classify(
            &self.executor,
            Some(&attachment),
            &extracted_text,
            self.config.classification_sample_chars,
        );
        tracker.step(&format!("classified as {}", classification.document_type));

        // Skill routing + normalization.
        self.check_budget(started)?;
        let record =
            self.route_extraction(classification.document_type, &attachment, &extracted_text)?;

        // Persistence.
        self.check_budget(started)?;
        tracker.step("persisting record");
        let persisted = self.persist(conn, job_id, upload, &record)?;

        let summary = format!(
            "IA: {} personas, {} inmuebles",
            persisted.parties, persisted.assets
        );
        Ok((record, summary))
    }

    /// Branch on the classified type. ID-like documents go to the vision
    /// skill; deed-like documents get the full extract → normalize →
    /// tax + compliance fan-out; everything else falls back to the generic
    /// extractor.
    fn route_extraction(
        &self,
        document_type: DocumentType,
        attachment: &Attachment,
        extracted_text: &str,
    ) -> Result<NormalizedRecord, IngestError> {
        if document_type.is_identity() {
            let raw = self.executor.execute(
                IDENTITY_VISION,
                json!({ "extracted_text": extracted_text }),
                Some(attachment),
            )?;
            return Ok(normalizer::normalize(&raw, &self.config.default_jurisdiction));
        }

        let raw = self.executor.execute(
            ENTITY_EXTRACTOR,
            json!({ "text": extracted_text }),
            Some(attachment),
        )?;
        let mut record = normalizer::normalize(&raw, &self.config.default_jurisdiction);

        if document_type.is_deed_like() {
            // Secondary tools are part of the standard deed flow but never
            // fatal: the record proceeds without them.
            match self.executor.execute(
                TAX_CALCULATOR,
                json!({
                    "price": record.operation.price,
                    "currency": record.operation.currency,
                }),
                None,
            ) {
                Ok(tax) => record.tax = Some(tax),
                Err(e) => tracing::warn!(error = %e, "Tax calculation failed, continuing"),
            }

            match self.executor.execute(
                UIF_COMPLIANCE,
                json!({
                    "price": record.operation.price,
                    "moneda": record.operation.currency,
                    "parties": record.parties,
                }),
                None,
            ) {
                Ok(compliance) => record.compliance = Some(compliance),
                Err(e) => tracing::warn!(error = %e, "Compliance screening failed, continuing"),
            }
        }

        Ok(record)
    }

    /// Every write is an upsert or guarded create so re-running a
    /// failed job cannot duplicate rows. Individual asset/party failures are
    /// logged and skipped; only the operation record itself is fatal.
    fn persist(
        &self,
        conn: &Connection,
        job_id: Uuid,
        upload: &DocumentUpload,
        record: &NormalizedRecord,
    ) -> Result<PersistCounts, IngestError> {
        // Attach the original document. Non-fatal.
        let blob_name = format!("{}_{}", job_id, upload.file_name);
        match self.blobs.put(&blob_name, &upload.bytes, &upload.media_type) {
            Ok(url) => {
                if let Err(e) = db::set_folder_storage_url(conn, &job_id, &url) {
                    tracing::warn!(job_id = %job_id, error = %e, "Could not record storage URL");
                }
            }
            Err(e) => tracing::warn!(job_id = %job_id, error = %e, "Storage upload failed"),
        }

        let mut assets = 0usize;
        let mut primary_asset = None;
        for asset in &record.assets {
            let Some(parcel) = normalize_id(asset.parcel_id.as_deref()) else {
                tracing::warn!(
                    jurisdiction = %asset.jurisdiction,
                    "Asset without parcel number skipped"
                );
                continue;
            };
            let row = db::AssetRow {
                partido: asset.jurisdiction.clone(),
                nro_partida: parcel,
                nomenclatura: asset.cadastral_code.clone(),
                transcripcion_literal: asset.literal_description.clone(),
                valuacion_fiscal: asset.fiscal_valuation,
            };
            match db::upsert_asset(conn, &row) {
                Ok(asset_id) => {
                    primary_asset.get_or_insert(asset_id);
                    assets += 1;
                }
                Err(e) => tracing::warn!(error = %e, "Asset upsert failed, continuing"),
            }
        }

        // The operation record is the anchor of the folder; its failure
        // fails the job.
        let operation = db::OperationRow {
            id: Uuid::new_v4(),
            carpeta_id: job_id,
            inmueble_id: primary_asset,
            tipo_acto: truncate_upper(&record.operation.act_type, 100),
            monto: record.operation.price,
            moneda: record.operation.currency.clone(),
            nro_acto: record.operation.deed_number.clone(),
        };
        db::insert_operation(conn, &operation)?;

        let mut parties = 0usize;
        for party in &record.parties {
            let Some(dni) = normalize_id(party.dni.as_deref())
                .or_else(|| normalize_id(party.cuit.as_deref()))
            else {
                tracing::warn!(
                    party = %party.full_name,
                    "Party without resolvable ID skipped"
                );
                continue;
            };

            let row = db::PersonRow {
                dni: dni.clone(),
                nombre_completo: to_title_case(&party.full_name),
                cuit: normalize_id(party.cuit.as_deref()),
                nacionalidad: party.nationality.as_deref().map(to_title_case),
                estado_civil: party.civil_status.clone(),
                domicilio: party.address.clone(),
                fecha_nacimiento: party.birth_date.clone(),
                origen_dato: "IA_OCR".to_string(),
            };
            match db::upsert_person(conn, &row) {
                Ok(()) => {
                    parties += 1;
                    let rol = truncate_upper(&party.role, 50);
                    if let Err(e) = db::link_participant(conn, &operation.id, &dni, &rol) {
                        tracing::warn!(error = %e, "Participant link failed, continuing");
                    }
                }
                Err(e) => tracing::warn!(dni = %dni, error = %e, "Party upsert failed, continuing"),
            }
        }

        Ok(PersistCounts { parties, assets })
    }

    fn check_budget(&self, started: Instant) -> Result<(), IngestError> {
        let budget_secs = self.config.overall_budget_secs;
        if started.elapsed().as_millis() >= u128::from(budget_secs) * 1000 {
            return Err(IngestError::DeadlineExceeded { budget_secs });
        }
        Ok(())
    }
}

fn truncate_upper(s: &str, max: usize) -> String {
    s.to_uppercase().chars().take(max).collect()
}
