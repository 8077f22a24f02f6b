//! Extraction normalizer.
//!
//! The semantic extractor answers with deeply nested, evidence-annotated
//! JSON: every atomic value is wrapped as `{ "valor": ..., "evidencia": ... }`
//! and operation details may appear nested under `detalles_operacion` or
//! duplicated at the top level. This module performs the entire flattening in
//! one typed decode step, producing the flat `NormalizedRecord` the
//! persistence layer expects.
//!
//! `normalize` is total: missing or malformed fields degrade to defaults,
//! never to an error.

use serde::Deserialize;
use serde_json::Value;

use crate::models::{AssetRecord, NormalizedRecord, OperationSummary, PartyRecord};

/// Placeholder role assigned when the extractor omits one.
const DEFAULT_ROLE: &str = "VENDEDOR";

// ---------------------------------------------------------------------------
// Raw wire shapes
// ---------------------------------------------------------------------------

/// The `{valor, evidencia}` wrapper. `valor` stays loosely typed because the
/// model emits strings and numbers interchangeably; coercion happens at
/// flattening time, in one place.
#[derive(Debug, Clone, Default, Deserialize)]
struct Evidenced {
    #[serde(default)]
    valor: Option<Value>,
    #[serde(default)]
    #[allow(dead_code)]
    evidencia: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawPrice {
    #[serde(default)]
    valor: Option<Value>,
    #[serde(default)]
    moneda: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawOperation {
    #[serde(default)]
    tipo_acto: Option<Evidenced>,
    #[serde(default)]
    numero_escritura: Option<Evidenced>,
    #[serde(default)]
    fecha_escritura: Option<Evidenced>,
    #[serde(default)]
    precio: Option<RawPrice>,
    #[serde(default)]
    escribano: Option<Evidenced>,
    #[serde(default)]
    registro: Option<Evidenced>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawEntityData {
    #[serde(default)]
    nombre_completo: Option<Evidenced>,
    #[serde(default)]
    dni_cuil_cuit: Option<Evidenced>,
    #[serde(default)]
    estado_civil: Option<Evidenced>,
    #[serde(default)]
    domicilio: Option<Evidenced>,
    #[serde(default)]
    nacionalidad: Option<Evidenced>,
    #[serde(default)]
    fecha_nacimiento: Option<Evidenced>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawEntity {
    #[serde(default)]
    rol: Option<String>,
    #[serde(default)]
    datos: Option<RawEntityData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawAsset {
    #[serde(default)]
    partido: Option<Evidenced>,
    #[serde(default)]
    partida_inmobiliaria: Option<Evidenced>,
    #[serde(default)]
    nomenclatura: Option<Evidenced>,
    #[serde(default)]
    transcripcion_literal: Option<Evidenced>,
    #[serde(default)]
    valuacion_fiscal: Option<Evidenced>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawExtraction {
    #[serde(default)]
    detalles_operacion: Option<RawOperation>,
    #[serde(default)]
    entidades: Vec<RawEntity>,
    #[serde(default)]
    inmuebles: Vec<RawAsset>,
    // Top-level duplicates, used only when the nested block is absent.
    #[serde(default)]
    resumen_acto: Option<Evidenced>,
    #[serde(default)]
    numero_escritura: Option<Evidenced>,
    #[serde(default)]
    fecha_escritura: Option<Evidenced>,
    #[serde(default)]
    price: Option<Evidenced>,
    #[serde(default)]
    currency: Option<Evidenced>,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Flatten a raw extraction into the canonical record shape.
pub fn normalize(raw: &Value, default_jurisdiction: &str) -> NormalizedRecord {
    let decoded: RawExtraction = serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Extraction payload did not decode, using defaults");
        RawExtraction::default()
    });

    let ops = decoded.detalles_operacion.unwrap_or_default();

    let act_type = ev_string(&ops.tipo_acto)
        .or_else(|| ev_string(&decoded.resumen_acto))
        .unwrap_or_else(|| "Ingesta".to_string());
    let price = ops
        .precio
        .as_ref()
        .and_then(|p| p.valor.as_ref())
        .map(coerce_number)
        .or_else(|| decoded.price.as_ref().and_then(|p| p.valor.as_ref()).map(coerce_number))
        .unwrap_or(0.0);
    let currency = ops
        .precio
        .as_ref()
        .and_then(|p| p.moneda.clone())
        .or_else(|| ev_string(&decoded.currency))
        .unwrap_or_else(|| "USD".to_string());
    let date = ev_string(&ops.fecha_escritura).or_else(|| ev_string(&decoded.fecha_escritura));
    let deed_number =
        ev_string(&ops.numero_escritura).or_else(|| ev_string(&decoded.numero_escritura));

    let parties = decoded
        .entidades
        .into_iter()
        .map(|entity| {
            let datos = entity.datos.unwrap_or_default();
            let id = ev_string(&datos.dni_cuil_cuit);
            PartyRecord {
                role: entity
                    .rol
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
                full_name: ev_string(&datos.nombre_completo)
                    .unwrap_or_else(|| "Desconocido".to_string()),
                dni: id.clone(),
                cuit: id,
                nationality: ev_string(&datos.nacionalidad),
                civil_status: ev_string(&datos.estado_civil),
                address: ev_string(&datos.domicilio),
                birth_date: ev_string(&datos.fecha_nacimiento),
            }
        })
        .collect();

    let assets = decoded
        .inmuebles
        .into_iter()
        .map(|asset| AssetRecord {
            jurisdiction: ev_string(&asset.partido)
                .unwrap_or_else(|| default_jurisdiction.to_string()),
            parcel_id: ev_string(&asset.partida_inmobiliaria),
            cadastral_code: ev_string(&asset.nomenclatura),
            literal_description: ev_string(&asset.transcripcion_literal),
            fiscal_valuation: asset
                .valuacion_fiscal
                .as_ref()
                .and_then(|e| e.valor.as_ref())
                .map(coerce_number)
                .unwrap_or(0.0),
        })
        .collect();

    NormalizedRecord {
        parties,
        assets,
        operation: OperationSummary {
            act_type,
            price,
            currency,
            date,
            deed_number,
            notary: ev_string(&ops.escribano),
            registry: ev_string(&ops.registro),
        },
        tax: None,
        compliance: None,
    }
}

fn ev_string(wrapper: &Option<Evidenced>) -> Option<String> {
    match wrapper.as_ref()?.valor.as_ref()? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a number-or-string value to f64 with a 0 fallback.
pub fn coerce_number(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

// ---------------------------------------------------------------------------
// Persistence-side string helpers
// ---------------------------------------------------------------------------

/// Strip everything but alphanumerics; None when nothing is left. This is
/// the natural key under which parties are persisted.
pub fn normalize_id(raw: Option<&str>) -> Option<String> {
    let cleaned: String = raw?.chars().filter(|c| c.is_alphanumeric()).collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

pub fn to_title_case(s: &str) -> String {
    s.to_lowercase()
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
