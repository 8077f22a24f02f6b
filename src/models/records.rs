//! Canonical record shapes produced by the extraction normalizer.
//!
//! These are the flat structures the persistence layer expects. The semantic
//! extractor's nested, evidence-annotated output is flattened into them in a
//! single decode step (see `pipeline::normalizer`).

use serde::{Deserialize, Serialize};

/// One party to the act (seller, buyer, attorney, consenting spouse...).
///
/// `role` is always non-empty; the normalizer defaults it when missing.
/// A party without a resolvable national/tax ID cannot be keyed and is
/// excluded from persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRecord {
    pub role: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dni: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cuit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub civil_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Raw date string as extracted; parsing happens downstream.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

/// One real-estate asset named in the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Jurisdiction ("partido"); defaulted from configuration when absent.
    pub jurisdiction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parcel_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadastral_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub literal_description: Option<String>,
    pub fiscal_valuation: f64,
}

/// Summary of the notarial operation itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationSummary {
    pub act_type: String,
    pub price: f64,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deed_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,
}

impl Default for OperationSummary {
    fn default() -> Self {
        Self {
            act_type: "Ingesta".to_string(),
            price: 0.0,
            currency: "USD".to_string(),
            date: None,
            deed_number: None,
            notary: None,
            registry: None,
        }
    }
}

/// The canonical shape produced by the normalizer: flattened parties, assets
/// and operation summary, plus the opaque tax/compliance blocks merged in by
/// the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizedRecord {
    #[serde(default)]
    pub parties: Vec<PartyRecord>,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
    #[serde(default)]
    pub operation: OperationSummary,
    /// Deterministic tax breakdown, attached for deed-like documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<serde_json::Value>,
    /// Compliance screening output, attached for deed-like documents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compliance: Option<serde_json::Value>,
}
