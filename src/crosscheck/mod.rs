//! Identity triangulation across official, extracted and manual sources.
//!
//! Each logical field carries up to three independently sourced values:
//! 1. OFFICIAL: authoritative registries (AFIP/RENAPER certificates)
//! 2. EXTRACTED: semantic extraction from deeds/IDs
//! 3. MANUAL: user-provided data
//!
//! The engine is pure and deterministic: it never errors, is recomputed on
//! every read and is never cached, so the verdict always reflects current
//! data. A `CriticalDiscrepancy` verdict hard-blocks deed drafting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strsim::levenshtein;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::models::PartyRecord;

/// Name distance above which a difference stops being a typo and becomes an
/// identity problem.
const NAME_DISTANCE_CRITICAL: usize = 5;

/// Overall trust verdict. Ordered lattice: verdicts only ever escalate
/// within one evaluation (`max`-fold), never downgrade.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationState {
    #[default]
    MatchTotal,
    ReviewRequired,
    CriticalDiscrepancy,
}

impl ValidationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MatchTotal => "MATCH_TOTAL",
            Self::ReviewRequired => "REVIEW_REQUIRED",
            Self::CriticalDiscrepancy => "CRITICAL_DISCREPANCY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    High,
}

/// One logical fact with up to three sourced values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrossCheckField {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual: Option<String>,
}

/// Per-field verdict with a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldVerdict {
    #[serde(rename = "match")]
    pub matched: bool,
    pub severity: Severity,
    pub message: String,
}

/// Aggregate of per-field verdicts plus the overall trust state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossCheckResult {
    pub state: ValidationState,
    pub details: BTreeMap<String, FieldVerdict>,
}

impl CrossCheckResult {
    /// Whether downstream legal-document export must refuse to run.
    pub fn blocks_export(&self) -> bool {
        self.state == ValidationState::CriticalDiscrepancy
    }
}

/// Validate identity data across sources.
///
/// Field keys containing an ID-like token (`dni`, `cuit`, `cuil`) are
/// compared digit-strict; keys containing a name-like token (`nombre`,
/// `name`) are compared fuzzily after diacritic stripping. Other keys carry
/// no validation rule and produce no verdict.
pub fn validate_identity(fields: &BTreeMap<String, CrossCheckField>) -> CrossCheckResult {
    let mut details = BTreeMap::new();

    let state = fields
        .iter()
        .filter_map(|(key, values)| {
            let (verdict, field_state) = check_field(key, values)?;
            details.insert(key.clone(), verdict);
            Some(field_state)
        })
        .fold(ValidationState::MatchTotal, ValidationState::max);

    CrossCheckResult { state, details }
}

fn check_field(key: &str, values: &CrossCheckField) -> Option<(FieldVerdict, ValidationState)> {
    let lowered = key.to_lowercase();
    if ["dni", "cuit", "cuil"].iter().any(|t| lowered.contains(t)) {
        Some(check_id_field(key, values))
    } else if lowered.contains("nombre") || lowered.contains("name") {
        Some(check_name_field(values))
    } else {
        None
    }
}

/// Strict digit comparison for national/tax IDs. The official value rules:
/// any disagreement with a present extracted or manual value is critical.
fn check_id_field(key: &str, values: &CrossCheckField) -> (FieldVerdict, ValidationState) {
    let official = values.official.as_deref().map(digits).unwrap_or_default();
    let extracted = values.extracted.as_deref().map(digits).unwrap_or_default();
    let manual = values.manual.as_deref().map(digits).unwrap_or_default();

    let mismatch = (!official.is_empty() && !extracted.is_empty() && official != extracted)
        || (!official.is_empty() && !manual.is_empty() && official != manual);

    if mismatch {
        (
            FieldVerdict {
                matched: false,
                severity: Severity::High,
                message: format!(
                    "Discrepancia CRÍTICA en {}. El dato oficial manda.",
                    key.to_uppercase()
                ),
            },
            ValidationState::CriticalDiscrepancy,
        )
    } else {
        (
            FieldVerdict {
                matched: true,
                severity: Severity::Low,
                message: "Coincidencia exacta.".to_string(),
            },
            ValidationState::MatchTotal,
        )
    }
}

/// Fuzzy comparison for names. Distance 0 after normalization is a match,
/// up to `NAME_DISTANCE_CRITICAL` is a minor difference needing review,
/// beyond that the identity itself is in question.
fn check_name_field(values: &CrossCheckField) -> (FieldVerdict, ValidationState) {
    let official = values
        .official
        .as_deref()
        .map(normalize_name)
        .unwrap_or_default();
    let extracted = values
        .extracted
        .as_deref()
        .map(normalize_name)
        .unwrap_or_default();
    let manual = values
        .manual
        .as_deref()
        .map(normalize_name)
        .unwrap_or_default();

    // Without an authoritative value (or anything to compare it against)
    // there is nothing to anchor a verdict on.
    if official.is_empty() || (extracted.is_empty() && manual.is_empty()) {
        return (
            FieldVerdict {
                matched: true,
                severity: Severity::Low,
                message: "Datos insuficientes para validar.".to_string(),
            },
            ValidationState::MatchTotal,
        );
    }

    let dist_extracted = if extracted.is_empty() {
        0
    } else {
        levenshtein(&official, &extracted)
    };
    let dist_manual = if manual.is_empty() {
        0
    } else {
        levenshtein(&official, &manual)
    };

    let critical = (!extracted.is_empty() && dist_extracted > NAME_DISTANCE_CRITICAL)
        || (!manual.is_empty() && dist_manual > NAME_DISTANCE_CRITICAL);

    if critical {
        (
            FieldVerdict {
                matched: false,
                severity: Severity::High,
                message: "Diferencia significativa en NOMBRE. Verificar identidad.".to_string(),
            },
            ValidationState::CriticalDiscrepancy,
        )
    } else if dist_extracted > 0 || dist_manual > 0 {
        (
            FieldVerdict {
                matched: false,
                severity: Severity::Low,
                message: "Diferencias leves (acentos/tipeo) en NOMBRE.".to_string(),
            },
            ValidationState::ReviewRequired,
        )
    } else {
        (
            FieldVerdict {
                matched: true,
                severity: Severity::Low,
                message: "Coincidencia de nombre.".to_string(),
            },
            ValidationState::MatchTotal,
        )
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(char::is_ascii_digit).collect()
}

/// Lowercase + NFD decomposition with combining marks stripped, so
/// "Juan Pérez" and "Juan Perez" compare equal.
fn normalize_name(s: &str) -> String {
    s.to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Assemble the transient field map for one party from its three sources.
/// Keys are `{prefix}_nombre`, `{prefix}_dni`, `{prefix}_cuit`.
pub fn party_fields(
    prefix: &str,
    official: Option<&PartyRecord>,
    extracted: Option<&PartyRecord>,
    manual: Option<&PartyRecord>,
) -> BTreeMap<String, CrossCheckField> {
    let mut fields = BTreeMap::new();

    fields.insert(
        format!("{prefix}_nombre"),
        CrossCheckField {
            official: official.map(|p| p.full_name.clone()),
            extracted: extracted.map(|p| p.full_name.clone()),
            manual: manual.map(|p| p.full_name.clone()),
        },
    );
    fields.insert(
        format!("{prefix}_dni"),
        CrossCheckField {
            official: official.and_then(|p| p.dni.clone()),
            extracted: extracted.and_then(|p| p.dni.clone()),
            manual: manual.and_then(|p| p.dni.clone()),
        },
    );
    fields.insert(
        format!("{prefix}_cuit"),
        CrossCheckField {
            official: official.and_then(|p| p.cuit.clone()),
            extracted: extracted.and_then(|p| p.cuit.clone()),
            manual: manual.and_then(|p| p.cuit.clone()),
        },
    );

    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(
        official: Option<&str>,
        extracted: Option<&str>,
        manual: Option<&str>,
    ) -> CrossCheckField {
        CrossCheckField {
            official: official.map(String::from),
            extracted: extracted.map(String::from),
            manual: manual.map(String::from),
        }
    }

    fn single(key: &str, f: CrossCheckField) -> BTreeMap<String, CrossCheckField> {
        BTreeMap::from([(key.to_string(), f)])
    }

    #[test]
    fn id_digit_equal_after_stripping_matches() {
        let result = validate_identity(&single(
            "vendedor_dni",
            field(Some("20-12345678-9"), Some("20123456789"), None),
        ));
        assert_eq!(result.state, ValidationState::MatchTotal);
        assert!(result.details["vendedor_dni"].matched);
        assert!(!result.blocks_export());
    }

    #[test]
    fn id_mismatch_is_critical_with_high_severity() {
        let result = validate_identity(&single(
            "vendedor_dni",
            field(Some("20-12345678-9"), Some("20999999999"), None),
        ));
        assert_eq!(result.state, ValidationState::CriticalDiscrepancy);
        let verdict = &result.details["vendedor_dni"];
        assert!(!verdict.matched);
        assert_eq!(verdict.severity, Severity::High);
        assert!(result.blocks_export());
    }

    #[test]
    fn id_manual_mismatch_also_critical() {
        let result = validate_identity(&single(
            "comprador_cuit",
            field(Some("27-99988877-1"), None, Some("27-11111111-1")),
        ));
        assert_eq!(result.state, ValidationState::CriticalDiscrepancy);
    }

    #[test]
    fn id_without_official_value_cannot_mismatch() {
        let result = validate_identity(&single(
            "vendedor_dni",
            field(None, Some("20123456789"), Some("20999999999")),
        ));
        // No authoritative anchor, so this reports as a non-blocking match.
        assert_eq!(result.state, ValidationState::MatchTotal);
        assert!(result.details["vendedor_dni"].matched);
    }

    #[test]
    fn name_accent_only_difference_is_distance_zero() {
        let result = validate_identity(&single(
            "vendedor_nombre",
            field(Some("Juan Pérez"), Some("Juan Perez"), None),
        ));
        assert_eq!(result.state, ValidationState::MatchTotal);
        assert!(result.details["vendedor_nombre"].matched);
    }

    #[test]
    fn name_small_distance_requires_review() {
        // "maria gonzalez" vs "marta gonzales": distance 2, LOW severity.
        let result = validate_identity(&single(
            "comprador_nombre",
            field(Some("María González"), Some("Marta Gonzáles"), None),
        ));
        assert_eq!(result.state, ValidationState::ReviewRequired);
        let verdict = &result.details["comprador_nombre"];
        assert!(!verdict.matched);
        assert_eq!(verdict.severity, Severity::Low);
    }

    #[test]
    fn name_distance_three_never_escalates_past_review() {
        // distance 3: "carlos ruiz" vs "carlo cruz" -> c-a-r-l-o [s->_] + ruiz/cruz
        let official = "abcdefgh";
        let extracted = "abcdexyz"; // distance 3
        assert_eq!(levenshtein(official, extracted), 3);

        let result = validate_identity(&single(
            "nombre",
            field(Some(official), Some(extracted), None),
        ));
        assert_eq!(result.state, ValidationState::ReviewRequired);
    }

    #[test]
    fn name_distance_six_is_critical() {
        let official = "abcdefghij";
        let extracted = "abcduvwxyz"; // distance 6
        assert_eq!(levenshtein(official, extracted), 6);

        let result = validate_identity(&single(
            "nombre",
            field(Some(official), Some(extracted), None),
        ));
        assert_eq!(result.state, ValidationState::CriticalDiscrepancy);
        assert_eq!(result.details["nombre"].severity, Severity::High);
    }

    #[test]
    fn name_without_official_reports_insufficient_data() {
        let result = validate_identity(&single(
            "nombre",
            field(None, Some("Juan Perez"), Some("Pedro Gomez")),
        ));
        assert_eq!(result.state, ValidationState::MatchTotal);
        assert!(result.details["nombre"]
            .message
            .contains("insuficientes"));
    }

    #[test]
    fn escalation_is_monotonic_across_fields() {
        // Critical ID mismatch first (BTreeMap order), clean name second:
        // the clean field must not downgrade the overall state.
        let mut fields = BTreeMap::new();
        fields.insert(
            "a_dni".to_string(),
            field(Some("20111111111"), Some("20222222222"), None),
        );
        fields.insert(
            "b_nombre".to_string(),
            field(Some("Juan Pérez"), Some("Juan Perez"), None),
        );
        let result = validate_identity(&fields);
        assert_eq!(result.state, ValidationState::CriticalDiscrepancy);
        assert!(result.details["b_nombre"].matched);
    }

    #[test]
    fn review_does_not_downgrade_critical() {
        let mut fields = BTreeMap::new();
        // Low-severity name drift…
        fields.insert(
            "a_nombre".to_string(),
            field(Some("Maria Gonzalez"), Some("Marta Gonzalez"), None),
        );
        // …after a critical ID mismatch.
        fields.insert(
            "z_dni".to_string(),
            field(Some("20111111111"), Some("20222222222"), None),
        );
        let result = validate_identity(&fields);
        assert_eq!(result.state, ValidationState::CriticalDiscrepancy);
    }

    #[test]
    fn unknown_keys_produce_no_verdict() {
        let result = validate_identity(&single(
            "domicilio",
            field(Some("Alsina 65"), Some("Alsina 66"), None),
        ));
        assert_eq!(result.state, ValidationState::MatchTotal);
        assert!(result.details.is_empty());
    }

    #[test]
    fn empty_field_map_is_total_match() {
        let result = validate_identity(&BTreeMap::new());
        assert_eq!(result.state, ValidationState::MatchTotal);
        assert!(result.details.is_empty());
    }

    #[test]
    fn lattice_ordering() {
        assert!(ValidationState::MatchTotal < ValidationState::ReviewRequired);
        assert!(ValidationState::ReviewRequired < ValidationState::CriticalDiscrepancy);
        assert_eq!(
            ValidationState::CriticalDiscrepancy.max(ValidationState::ReviewRequired),
            ValidationState::CriticalDiscrepancy
        );
    }

    #[test]
    fn validation_state_serde_uses_wire_names() {
        assert_eq!(
            serde_json::to_string(&ValidationState::CriticalDiscrepancy).unwrap(),
            "\"CRITICAL_DISCREPANCY\""
        );
        let parsed: ValidationState = serde_json::from_str("\"REVIEW_REQUIRED\"").unwrap();
        assert_eq!(parsed, ValidationState::ReviewRequired);
    }

    fn make_party(name: &str, dni: Option<&str>, cuit: Option<&str>) -> PartyRecord {
        PartyRecord {
            role: "VENDEDOR".into(),
            full_name: name.into(),
            dni: dni.map(String::from),
            cuit: cuit.map(String::from),
            nationality: None,
            civil_status: None,
            address: None,
            birth_date: None,
        }
    }

    #[test]
    fn party_fields_assembles_three_keys() {
        let official = make_party("Juan Pérez", Some("20-12345678-9"), Some("20-12345678-9"));
        let extracted = make_party("Juan Perez", Some("20123456789"), None);

        let fields = party_fields("vendedor", Some(&official), Some(&extracted), None);
        assert_eq!(fields.len(), 3);
        assert_eq!(
            fields["vendedor_dni"].official.as_deref(),
            Some("20-12345678-9")
        );
        assert!(fields["vendedor_cuit"].extracted.is_none());

        let result = validate_identity(&fields);
        assert_eq!(result.state, ValidationState::MatchTotal);
    }

    #[test]
    fn party_fields_end_to_end_critical_dni() {
        let official = make_party("Juan Pérez", Some("20-12345678-9"), None);
        let extracted = make_party("Juan Perez", Some("20999999999"), None);

        let fields = party_fields("vendedor", Some(&official), Some(&extracted), None);
        let result = validate_identity(&fields);
        assert_eq!(result.state, ValidationState::CriticalDiscrepancy);
        assert_eq!(result.details["vendedor_dni"].severity, Severity::High);
        assert!(result.blocks_export());
    }
}
