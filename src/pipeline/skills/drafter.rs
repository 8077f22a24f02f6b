//! Deterministic deed-text generator.
//!
//! Composes the legal text of a deed from the persisted record: header,
//! appearances, conveyance (or mortgage) clause, price, compliance records,
//! tax withholdings and closing. Drafting is the legal-export surface of the
//! pipeline, so it refuses outright while the identity cross-check reports a
//! critical discrepancy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::formatters::{format_notary_date, format_notary_money, format_notary_name};
use super::tax::TaxCalculationResult;
use crate::crosscheck::ValidationState;
use crate::models::{AssetRecord, PartyRecord};

#[derive(Error, Debug)]
pub enum DraftError {
    #[error(
        "Drafting blocked: identity cross-check reported a critical discrepancy. \
         Resolve the flagged fields before exporting."
    )]
    ValidationBlocked,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MortgageTerms {
    pub capital: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub rate: Option<String>,
    #[serde(default)]
    pub system: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplianceSummary {
    #[serde(default)]
    pub risk_level: Option<String>,
    #[serde(default)]
    pub alerts: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftingContext {
    #[serde(default)]
    pub deed_number: Option<String>,
    #[serde(default)]
    pub act_title: Option<String>,
    /// YYYY-MM-DD
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub notary: Option<String>,
    #[serde(default)]
    pub registry: Option<String>,
    #[serde(default)]
    pub parties: Vec<PartyRecord>,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
    #[serde(default)]
    pub tax: Option<TaxCalculationResult>,
    #[serde(default)]
    pub compliance: Option<ComplianceSummary>,
    #[serde(default)]
    pub mortgage: Option<MortgageTerms>,
    /// Latest triangulation verdict for this record. CRITICAL_DISCREPANCY
    /// hard-blocks drafting.
    #[serde(default)]
    pub validation_state: ValidationState,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftResult {
    pub text: String,
}

pub fn draft_deed(ctx: &DraftingContext) -> Result<DraftResult, DraftError> {
    if ctx.validation_state == ValidationState::CriticalDiscrepancy {
        return Err(DraftError::ValidationBlocked);
    }

    let act_title = ctx.act_title.as_deref().unwrap_or("ACTO").to_uppercase();
    let is_mortgage = act_title.contains("HIPOTECA");
    let date_text = ctx
        .date
        .as_deref()
        .and_then(format_notary_date)
        .unwrap_or_else(|| "FECHA PENDIENTE".to_string());

    let mut text = format!(
        "ESCRITURA NUMERO {}.- {}.- ",
        ctx.deed_number.as_deref().unwrap_or("___").to_uppercase(),
        act_title
    );
    text.push_str(&format!(
        "En la ciudad de Bahía Blanca, provincia de Buenos Aires, a los {date_text}, \
         ante mí, {}, Notario Titular del Registro {}, COMPARECEN: ",
        ctx.notary.as_deref().unwrap_or("ESCRIBANO").to_uppercase(),
        ctx.registry.as_deref().unwrap_or("___").to_uppercase(),
    ));

    for (i, party) in ctx.parties.iter().enumerate() {
        let name = if party.full_name.is_empty() {
            "SIN NOMBRE".to_string()
        } else {
            format_notary_name(&party.full_name)
        };
        text.push_str(&format!(
            "por una parte {}, {}, DNI {}{}",
            name,
            party.nationality.as_deref().unwrap_or("argentino"),
            party.dni.as_deref().unwrap_or("___"),
            if i + 1 == ctx.parties.len() { "." } else { "; " }
        ));
    }

    text.push_str("\n\nINTERVENCION: Los comparecientes intervienen por su propio derecho. ");

    if is_mortgage {
        text.push_str(
            "Y el deudor DICE: Que CONSTITUYE DERECHO REAL DE HIPOTECA en primer grado de \
             privilegio, a favor de la parte acreedora, sobre el siguiente Inmueble: ",
        );
    } else {
        text.push_str(
            "Y el vendedor DICE: Que VENDE, CEDE y TRANSFIERE a favor de la parte \
             compradora, el siguiente Inmueble: ",
        );
    }

    for asset in &ctx.assets {
        text.push('\n');
        text.push_str(
            asset
                .literal_description
                .as_deref()
                .unwrap_or("[FALTA DESCRIPCION TECNICA]"),
        );
    }

    if is_mortgage {
        if let Some(mortgage) = &ctx.mortgage {
            let capital_text = format_notary_money(
                mortgage.capital,
                mortgage.currency.as_deref().unwrap_or("UVA"),
            );
            text.push_str(&format!(
                "\n\nCAPITAL Y CLAUSULAS FINANCIERAS: La presente hipoteca se constituye por \
                 la suma de {capital_text}. Se conviene una tasa de interés de {}, bajo el \
                 sistema de amortización {}. ",
                mortgage.rate.as_deref().unwrap_or("___"),
                mortgage.system.as_deref().unwrap_or("FRANCES"),
            ));
        }
    } else {
        let base = ctx.tax.as_ref().map(|t| t.base_calculo_ars).unwrap_or(0.0);
        text.push_str(&format!(
            "\n\nPRECIO: La presente operación se realiza por el precio total de {}, que la \
             parte vendedora manifiesta haber recibido con anterioridad a este acto.",
            format_notary_money(base, "ARS")
        ));
    }

    if let Some(compliance) = &ctx.compliance {
        let high_risk = compliance.risk_level.as_deref() == Some("HIGH");
        if high_risk || !compliance.alerts.is_empty() {
            text.push_str("\n\nCONSTANCIAS UIF: ");
            for alert in &compliance.alerts {
                text.push_str(&format!("\n- {alert}"));
            }
            if compliance.alerts.iter().any(|a| a.contains("PEP")) {
                text.push_str(
                    "\nManifestando el comprador bajo fe de juramento su condición de \
                     Persona Expuesta Políticamente (PEP).",
                );
            }
        }
    }

    let (sellos, iti) = ctx
        .tax
        .as_ref()
        .map(|t| (t.detail.sellos_pba, t.detail.iti_afip))
        .unwrap_or((0.0, 0.0));
    text.push_str(&format!(
        "\n\nIMPUESTOS Y TASAS: Se hace constar que se retienen las siguientes sumas: \
         Impuesto de Sellos: {}; ITI: {}. ",
        format_notary_money(sellos, "ARS"),
        format_notary_money(iti, "ARS"),
    ));

    text.push_str(
        "\n\nCIERRE: Leo a los comparecientes, quienes se ratifican en su contenido y \
         firman ante mí, de lo que doy fe.",
    );

    Ok(DraftResult { text })
}
