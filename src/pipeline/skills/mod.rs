//! Skills: named extraction/computation capabilities.
//!
//! A skill is either DETERMINISTIC (a local pure function: tax calculator,
//! timeline planner, deed drafter) or SEMANTIC (delegated to the remote
//! reasoning service with an instruction document). The executor routes by
//! slug; everything it cannot match against the fixed deterministic set is
//! treated as semantic and resolved through the registry.

pub mod drafter;
pub mod executor;
pub mod formatters;
pub mod reasoning;
pub mod registry;
pub mod tax;
pub mod timeline;

pub use executor::SkillExecutor;
pub use registry::{Skill, SkillKind, SkillRegistry};

use thiserror::Error;

use drafter::DraftError;
use reasoning::ReasoningError;

// Deterministic slugs: routed to local pure functions, never the network.
pub const TAX_CALCULATOR: &str = "notary-tax-calculator";
pub const TIMELINE_PLANNER: &str = "notary-timeline-planner";
pub const DEED_DRAFTER: &str = "notary-deed-drafter";

// Semantic slugs: resolved through the registry.
pub const DOCUMENT_CLASSIFIER: &str = "notary-document-classifier";
pub const ENTITY_EXTRACTOR: &str = "notary-entity-extractor";
pub const IDENTITY_VISION: &str = "notary-identity-vision";
pub const UIF_COMPLIANCE: &str = "notary-uif-compliance";

/// Binary payload forwarded to vision-capable skills.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub bytes: Vec<u8>,
    pub media_type: String,
}

#[derive(Error, Debug)]
pub enum SkillError {
    #[error("Skill not found or inactive: {0}")]
    NotFound(String),

    #[error("Invalid input for skill {slug}: {reason}")]
    InvalidInput { slug: String, reason: String },

    #[error("Semantic execution failed for {slug}: {source}")]
    Semantic {
        slug: String,
        #[source]
        source: ReasoningError,
    },

    #[error("Skill {slug} returned malformed JSON: {reason}")]
    MalformedOutput { slug: String, reason: String },

    #[error(transparent)]
    Draft(#[from] DraftError),
}
