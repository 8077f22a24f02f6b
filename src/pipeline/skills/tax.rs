//! Deterministic notary expense calculator (Provincia de Buenos Aires rules).
//!
//! Pure and synchronous: same input, byte-identical output. The taxable base
//! is the greater of the operation price (converted to ARS) and the fiscal
//! valuation.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const STAMP_TAX_RATE: f64 = 0.02;
const ITI_RATE: f64 = 0.015;
const FEE_RATE: f64 = 0.02;
const VAT_RATE: f64 = 0.21;
const NOTARIAL_CONTRIBUTION_RATE: f64 = 0.15;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxCalculationInput {
    pub price: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// ARS per unit of `currency` (the UVA value when currency is UVA).
    #[serde(default = "default_exchange_rate")]
    pub exchange_rate: f64,
    /// YYYY-MM-DD; acquisitions before 2018 are subject to ITI.
    #[serde(default)]
    pub acquisition_date: Option<String>,
    #[serde(default)]
    pub is_unique_home: bool,
    #[serde(default)]
    pub fiscal_valuation: f64,
    /// Stamp-tax exemption cap for unique homes (ley impositiva).
    #[serde(default = "default_exemption_threshold")]
    pub sellos_exemption_threshold: f64,
}

fn default_currency() -> String {
    "ARS".to_string()
}

fn default_exchange_rate() -> f64 {
    1.0
}

fn default_exemption_threshold() -> f64 {
    90_000_000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    pub sellos_pba: f64,
    pub iti_afip: f64,
    pub honorarios: f64,
    pub iva21: f64,
    pub aportes_notariales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxCalculationResult {
    pub base_calculo_ars: f64,
    pub detail: TaxBreakdown,
    pub total_expenses_ars: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_expenses_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_expenses_uva: Option<f64>,
}

pub fn calculate_notary_expenses(input: &TaxCalculationInput) -> TaxCalculationResult {
    let price_ars = match input.currency.as_str() {
        "USD" | "UVA" => input.price * input.exchange_rate,
        _ => input.price,
    };

    let base_sellos = price_ars.max(input.fiscal_valuation);

    let sellos_pba = if input.is_unique_home {
        if base_sellos > input.sellos_exemption_threshold {
            (base_sellos - input.sellos_exemption_threshold) * STAMP_TAX_RATE
        } else {
            0.0
        }
    } else {
        base_sellos * STAMP_TAX_RATE
    };

    let iti_afip = if acquired_before_2018(input.acquisition_date.as_deref()) {
        price_ars * ITI_RATE
    } else {
        0.0
    };

    let honorarios = price_ars * FEE_RATE;
    let iva21 = honorarios * VAT_RATE;
    let aportes_notariales = honorarios * NOTARIAL_CONTRIBUTION_RATE;

    let total_ars = sellos_pba + iti_afip + honorarios + iva21 + aportes_notariales;

    TaxCalculationResult {
        base_calculo_ars: round_cents(base_sellos),
        detail: TaxBreakdown {
            sellos_pba: round_cents(sellos_pba),
            iti_afip: round_cents(iti_afip),
            honorarios: round_cents(honorarios),
            iva21: round_cents(iva21),
            aportes_notariales: round_cents(aportes_notariales),
        },
        total_expenses_ars: round_cents(total_ars),
        total_expenses_usd: (input.currency == "USD" && input.exchange_rate > 0.0)
            .then(|| round_cents(total_ars / input.exchange_rate)),
        total_expenses_uva: (input.currency == "UVA" && input.exchange_rate > 0.0)
            .then(|| round_cents(total_ars / input.exchange_rate)),
    }
}

fn acquired_before_2018(date: Option<&str>) -> bool {
    date.and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|d| d.year() < 2018)
        .unwrap_or(false)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(price: f64) -> TaxCalculationInput {
        TaxCalculationInput {
            price,
            currency: "ARS".into(),
            exchange_rate: 1.0,
            acquisition_date: None,
            is_unique_home: false,
            fiscal_valuation: 0.0,
            sellos_exemption_threshold: 90_000_000.0,
        }
    }

    #[test]
    fn basic_ars_breakdown() {
        let result = calculate_notary_expenses(&input(10_000_000.0));
        assert_eq!(result.base_calculo_ars, 10_000_000.0);
        assert_eq!(result.detail.sellos_pba, 200_000.0);
        assert_eq!(result.detail.iti_afip, 0.0);
        assert_eq!(result.detail.honorarios, 200_000.0);
        assert_eq!(result.detail.iva21, 42_000.0);
        assert_eq!(result.detail.aportes_notariales, 30_000.0);
        assert_eq!(result.total_expenses_ars, 472_000.0);
        assert!(result.total_expenses_usd.is_none());
    }

    #[test]
    fn usd_price_converts_through_exchange_rate() {
        let mut i = input(100_000.0);
        i.currency = "USD".into();
        i.exchange_rate = 1000.0;
        let result = calculate_notary_expenses(&i);
        assert_eq!(result.base_calculo_ars, 100_000_000.0);
        // Total is echoed back in USD as well.
        let usd = result.total_expenses_usd.unwrap();
        assert!((usd - result.total_expenses_ars / 1000.0).abs() < 0.01);
    }

    #[test]
    fn fiscal_valuation_raises_the_base() {
        let mut i = input(1_000_000.0);
        i.fiscal_valuation = 5_000_000.0;
        let result = calculate_notary_expenses(&i);
        assert_eq!(result.base_calculo_ars, 5_000_000.0);
        assert_eq!(result.detail.sellos_pba, 100_000.0);
        // Fees still follow the price, not the stamp base.
        assert_eq!(result.detail.honorarios, 20_000.0);
    }

    #[test]
    fn unique_home_below_threshold_pays_no_stamp_tax() {
        let mut i = input(80_000_000.0);
        i.is_unique_home = true;
        let result = calculate_notary_expenses(&i);
        assert_eq!(result.detail.sellos_pba, 0.0);
    }

    #[test]
    fn unique_home_above_threshold_pays_on_excess_only() {
        let mut i = input(100_000_000.0);
        i.is_unique_home = true;
        let result = calculate_notary_expenses(&i);
        // 2% over the 10M excess.
        assert_eq!(result.detail.sellos_pba, 200_000.0);
    }

    #[test]
    fn pre_2018_acquisition_triggers_iti() {
        let mut i = input(10_000_000.0);
        i.acquisition_date = Some("2015-06-30".into());
        let result = calculate_notary_expenses(&i);
        assert_eq!(result.detail.iti_afip, 150_000.0);
    }

    #[test]
    fn post_2018_acquisition_has_no_iti() {
        let mut i = input(10_000_000.0);
        i.acquisition_date = Some("2020-01-01".into());
        let result = calculate_notary_expenses(&i);
        assert_eq!(result.detail.iti_afip, 0.0);
    }

    #[test]
    fn unparseable_acquisition_date_means_no_iti() {
        let mut i = input(10_000_000.0);
        i.acquisition_date = Some("hace mucho".into());
        let result = calculate_notary_expenses(&i);
        assert_eq!(result.detail.iti_afip, 0.0);
    }

    #[test]
    fn calculator_is_pure_and_idempotent() {
        let mut i = input(12_345_678.9);
        i.currency = "USD".into();
        i.exchange_rate = 987.65;
        i.fiscal_valuation = 11_111.0;
        i.acquisition_date = Some("2016-02-29".into());

        let first = calculate_notary_expenses(&i);
        let second = calculate_notary_expenses(&i);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn minimal_context_decodes_with_defaults() {
        // The orchestrator invokes this skill with only price + currency.
        let input: TaxCalculationInput =
            serde_json::from_value(serde_json::json!({"price": 50000.0, "currency": "USD"}))
                .unwrap();
        assert_eq!(input.exchange_rate, 1.0);
        assert!(!input.is_unique_home);
        assert_eq!(input.sellos_exemption_threshold, 90_000_000.0);
        let result = calculate_notary_expenses(&input);
        assert!(result.total_expenses_ars > 0.0);
    }
}
