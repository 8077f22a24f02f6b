//! Skill registry: immutable configuration mapping slugs to capabilities.
//!
//! Semantic skills carry the instruction document embedded verbatim in the
//! reasoning request; deterministic skills are listed for completeness but
//! dispatch never consults their instruction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::SkillError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    Deterministic,
    Semantic,
}

/// A named, versioned capability. Immutable after registry construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub slug: String,
    pub version: u32,
    pub kind: SkillKind,
    pub instruction: String,
    pub active: bool,
}

impl Skill {
    pub fn semantic(slug: &str, instruction: &str) -> Self {
        Self {
            slug: slug.to_string(),
            version: 1,
            kind: SkillKind::Semantic,
            instruction: instruction.to_string(),
            active: true,
        }
    }

    pub fn deterministic(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
            version: 1,
            kind: SkillKind::Deterministic,
            instruction: String::new(),
            active: true,
        }
    }
}

#[derive(Debug, Default)]
pub struct SkillRegistry {
    skills: HashMap<String, Skill>,
}

impl SkillRegistry {
    /// The built-in skill set of the notarial pipeline.
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for skill in [
            Skill::deterministic(super::TAX_CALCULATOR),
            Skill::deterministic(super::TIMELINE_PLANNER),
            Skill::deterministic(super::DEED_DRAFTER),
            Skill::semantic(super::DOCUMENT_CLASSIFIER, CLASSIFIER_INSTRUCTION),
            Skill::semantic(super::ENTITY_EXTRACTOR, ENTITY_EXTRACTOR_INSTRUCTION),
            Skill::semantic(super::IDENTITY_VISION, IDENTITY_VISION_INSTRUCTION),
            Skill::semantic(super::UIF_COMPLIANCE, UIF_COMPLIANCE_INSTRUCTION),
        ] {
            registry = registry.with_skill(skill);
        }
        registry
    }

    pub fn with_skill(mut self, skill: Skill) -> Self {
        self.skills.insert(skill.slug.clone(), skill);
        self
    }

    pub fn without_skill(mut self, slug: &str) -> Self {
        self.skills.remove(slug);
        self
    }

    /// Look up an active semantic skill. Absence (or an inactive or
    /// non-semantic entry) is a hard error: dispatch cannot proceed.
    pub fn lookup_semantic(&self, slug: &str) -> Result<&Skill, SkillError> {
        match self.skills.get(slug) {
            Some(skill) if skill.active && skill.kind == SkillKind::Semantic => Ok(skill),
            _ => Err(SkillError::NotFound(slug.to_string())),
        }
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.skills.contains_key(slug)
    }
}

const CLASSIFIER_INSTRUCTION: &str = "\
Identificá el tipo de documento notarial a partir de la primera página y del texto OCR \
disponible. Tipos posibles: DNI, PASAPORTE, ESCRITURA, BOLETO_COMPRAVENTA, \
CERTIFICADO_RPI (dominio/inhibiciones), CATASTRO_ARBA. \
Respondé únicamente JSON con la forma: \
{ \"document_type\": string, \"confidence_score\": number, \"reasoning\": string }.";

const ENTITY_EXTRACTOR_INSTRUCTION: &str = "\
Extraé las partes, inmuebles y detalles de la operación del documento notarial adjunto. \
Cada dato atómico se informa como objeto { \"valor\": any, \"evidencia\": string } citando \
el pasaje fuente. Respondé únicamente JSON con la forma: \
{ \"entidades\": [ { \"rol\": \"VENDEDOR\"|\"COMPRADOR\"|\"APODERADO\"|\"USUFRUCTUARIO\"|\
\"CONYUGE_ASINTIENTE\", \"tipo_persona\": \"FISICA\"|\"JURIDICA\", \"datos\": { \
\"nombre_completo\", \"dni_cuil_cuit\", \"estado_civil\", \"domicilio\", \"nacionalidad\", \
\"fecha_nacimiento\" } } ], \
\"inmuebles\": [ { \"partido\", \"partida_inmobiliaria\", \"nomenclatura\", \
\"transcripcion_literal\", \"valuacion_fiscal\" } ], \
\"detalles_operacion\": { \"tipo_acto\", \"numero_escritura\", \"fecha_escritura\", \
\"precio\": { \"valor\", \"moneda\" }, \"escribano\", \"registro\" } }.";

const IDENTITY_VISION_INSTRUCTION: &str = "\
Leé el documento de identidad adjunto (DNI o pasaporte) y extraé los datos de la persona. \
Respondé únicamente JSON con la forma: { \"entidades\": [ { \"rol\": \"COMPARECIENTE\", \
\"datos\": { \"nombre_completo\", \"dni_cuil_cuit\", \"nacionalidad\", \"fecha_nacimiento\", \
\"domicilio\" } } ] }. Cada dato como { \"valor\": any, \"evidencia\": string }.";

const UIF_COMPLIANCE_INSTRUCTION: &str = "\
Evaluá la operación frente a la normativa UIF vigente: umbrales de reporte según monto y \
moneda, condición PEP de las partes y señales de alerta. Respondé únicamente JSON con la \
forma: { \"risk_level\": \"LOW\"|\"MEDIUM\"|\"HIGH\", \"alerts\": [string], \
\"requiere_reporte\": boolean }.";
