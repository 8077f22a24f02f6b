//! Document classifier.
//!
//! Thin consumer of the skill executor: sends a bounded OCR sample to the
//! classification skill and maps its free-form answer onto the closed
//! `DocumentType` set. Classification failure never blocks the pipeline:
//! any executor error degrades to `Unknown` with confidence 0.

use serde_json::json;

use super::skills::{Attachment, SkillExecutor, DOCUMENT_CLASSIFIER};
use crate::models::DocumentType;

#[derive(Debug, Clone)]
pub struct ClassificationOutcome {
    pub document_type: DocumentType,
    pub confidence: f32,
    pub reasoning: Option<String>,
}

impl ClassificationOutcome {
    fn unknown() -> Self {
        Self {
            document_type: DocumentType::Unknown,
            confidence: 0.0,
            reasoning: None,
        }
    }
}

/// Classify a document from its attachment and an OCR text sample capped at
/// `sample_cap` characters.
pub fn classify(
    executor: &SkillExecutor,
    attachment: Option<&Attachment>,
    sample_text: &str,
    sample_cap: usize,
) -> ClassificationOutcome {
    let sample: String = sample_text.chars().take(sample_cap).collect();
    let context = json!({
        "has_ocr_text": !sample.is_empty(),
        "ocr_sample": sample,
        "hint": "Analiza la primera página para determinar la naturaleza del documento.",
    });

    let result = match executor.execute(DOCUMENT_CLASSIFIER, context, attachment) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(error = %e, "Classification failed, continuing as UNKNOWN");
            return ClassificationOutcome::unknown();
        }
    };

    let raw_type = result["document_type"].as_str().unwrap_or("").to_uppercase();
    let document_type = map_document_type(&raw_type);
    if document_type == DocumentType::Unknown {
        return ClassificationOutcome {
            reasoning: result["reasoning"].as_str().map(String::from),
            ..ClassificationOutcome::unknown()
        };
    }

    ClassificationOutcome {
        document_type,
        confidence: result["confidence_score"].as_f64().unwrap_or(0.5) as f32,
        reasoning: result["reasoning"].as_str().map(String::from),
    }
}

/// Map a free-form type string onto the closed set by keyword, in fixed
/// priority order so multi-keyword answers resolve deterministically.
pub fn map_document_type(raw: &str) -> DocumentType {
    const KEYWORD_PRIORITY: [(&[&str], DocumentType); 6] = [
        (&["DNI"], DocumentType::Dni),
        (&["PASAPORTE", "PASSPORT"], DocumentType::Pasaporte),
        (&["ESCRITURA"], DocumentType::Escritura),
        (&["BOLETO"], DocumentType::BoletoCompraventa),
        (
            &["DOMINIO", "INHIBICION", "RPI"],
            DocumentType::CertificadoRpi,
        ),
        (&["CATASTRO", "ARBA"], DocumentType::CatastroArba),
    ];

    let upper = raw.to_uppercase();
    for (keywords, document_type) in KEYWORD_PRIORITY {
        if keywords.iter().any(|k| upper.contains(k)) {
            return document_type;
        }
    }
    DocumentType::Unknown
}
