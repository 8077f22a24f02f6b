//! The hybrid skill router.
//!
//! `execute` matches the slug against the fixed deterministic set first and
//! runs the corresponding pure function locally. Every other slug is treated
//! as semantic: the instruction document is fetched from the registry,
//! embedded verbatim into the system instruction, and the request goes out
//! to the reasoning service exactly once; retries, if any, belong to the
//! orchestrator.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::drafter::{draft_deed, DraftingContext};
use super::reasoning::{ReasoningClient, ReasoningRequest};
use super::registry::SkillRegistry;
use super::tax::{calculate_notary_expenses, TaxCalculationInput};
use super::timeline::{plan_timeline, TimelineRequest};
use super::{Attachment, SkillError};

pub struct SkillExecutor {
    registry: Arc<SkillRegistry>,
    reasoning: Arc<dyn ReasoningClient>,
}

impl SkillExecutor {
    pub fn new(registry: Arc<SkillRegistry>, reasoning: Arc<dyn ReasoningClient>) -> Self {
        Self {
            registry,
            reasoning,
        }
    }

    /// Execute a skill by slug with a context payload and optional attachment.
    pub fn execute(
        &self,
        slug: &str,
        context: Value,
        attachment: Option<&Attachment>,
    ) -> Result<Value, SkillError> {
        tracing::debug!(slug = %slug, "Routing skill");

        match slug {
            super::TAX_CALCULATOR => {
                let input: TaxCalculationInput = decode_context(slug, context)?;
                encode_output(slug, &calculate_notary_expenses(&input))
            }
            super::TIMELINE_PLANNER => {
                let request: TimelineRequest = decode_context(slug, context)?;
                encode_output(slug, &plan_timeline(&request))
            }
            super::DEED_DRAFTER => {
                let drafting: DraftingContext = decode_context(slug, context)?;
                encode_output(slug, &draft_deed(&drafting)?)
            }
            _ => self.execute_semantic(slug, context, attachment),
        }
    }

    fn execute_semantic(
        &self,
        slug: &str,
        context: Value,
        attachment: Option<&Attachment>,
    ) -> Result<Value, SkillError> {
        let skill = self.registry.lookup_semantic(slug)?;

        let system_instruction = format!(
            "SOS UN AGENTE NOTARIAL EXPERTO.\n\
             --- SKILL ---\n\
             {}\n\
             ---\n\
             Si hay un archivo adjunto, es la fuente primaria de verdad por sobre \
             cualquier contexto textual.\n\
             Respondé ESTRICTAMENTE en JSON, sin texto adicional.",
            skill.instruction
        );

        let request = ReasoningRequest {
            system_instruction: &system_instruction,
            context: &context,
            attachment,
        };

        let raw = self
            .reasoning
            .generate(&request)
            .map_err(|source| SkillError::Semantic {
                slug: slug.to_string(),
                source,
            })?;

        let cleaned = strip_code_fences(&raw);
        serde_json::from_str(cleaned).map_err(|e| SkillError::MalformedOutput {
            slug: slug.to_string(),
            reason: format!("{e}: {}", truncate(cleaned, 100)),
        })
    }
}

fn decode_context<T: DeserializeOwned>(slug: &str, context: Value) -> Result<T, SkillError> {
    serde_json::from_value(context).map_err(|e| SkillError::InvalidInput {
        slug: slug.to_string(),
        reason: e.to_string(),
    })
}

fn encode_output<T: serde::Serialize>(slug: &str, output: &T) -> Result<Value, SkillError> {
    serde_json::to_value(output).map_err(|e| SkillError::MalformedOutput {
        slug: slug.to_string(),
        reason: e.to_string(),
    })
}

/// Strip a markdown code-fence wrapper the model may add despite being asked
/// for bare JSON.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
    else {
        return trimmed;
    };
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
