//! Notary-style formatters for generated deed text.
//!
//! Argentine protocol rules: amounts and dates are written out in words,
//! with the numeric form in parentheses; surnames go first in uppercase.

const UNIDADES: [&str; 10] = [
    "", "un", "dos", "tres", "cuatro", "cinco", "seis", "siete", "ocho", "nueve",
];
const DECENAS: [&str; 10] = [
    "diez",
    "once",
    "doce",
    "trece",
    "catorce",
    "quince",
    "dieciséis",
    "diecisiete",
    "dieciocho",
    "diecinueve",
];
const DECENAS_COMP: [&str; 10] = [
    "", "", "veinte", "treinta", "cuarenta", "cincuenta", "sesenta", "setenta", "ochenta",
    "noventa",
];
const CENTENAS: [&str; 10] = [
    "",
    "cien",
    "doscientos",
    "trescientos",
    "cuatrocientos",
    "quinientos",
    "seiscientos",
    "setecientos",
    "ochocientos",
    "novecientos",
];

/// Spell a non-negative integer in Spanish, uppercase.
pub fn number_to_spanish_text(n: u64) -> String {
    if n == 0 {
        return "CERO".to_string();
    }

    let mut n = n;
    let mut res = String::new();

    if n >= 1_000_000 {
        let millions = n / 1_000_000;
        if millions == 1 {
            res.push_str("un millón ");
        } else {
            res.push_str(&number_to_spanish_text(millions).to_lowercase());
            res.push_str(" millones ");
        }
        n %= 1_000_000;
    }

    if n >= 1000 {
        let thousands = n / 1000;
        if thousands == 1 {
            res.push_str("mil ");
        } else {
            res.push_str(&number_to_spanish_text(thousands).to_lowercase());
            res.push_str(" mil ");
        }
        n %= 1000;
    }

    if n >= 100 {
        if n == 100 {
            res.push_str("cien");
        } else {
            let h = (n / 100) as usize;
            res.push_str(if h == 1 { "ciento" } else { CENTENAS[h] });
            res.push(' ');
        }
        n %= 100;
    }

    if n >= 20 {
        let d = (n / 10) as usize;
        let u = (n % 10) as usize;
        if d == 2 && u > 0 {
            res.push_str("veinti");
            res.push_str(UNIDADES[u]);
        } else {
            res.push_str(DECENAS_COMP[d]);
            if u > 0 {
                res.push_str(" y ");
                res.push_str(UNIDADES[u]);
            }
        }
    } else if n >= 10 {
        res.push_str(DECENAS[(n - 10) as usize]);
    } else if n > 0 {
        res.push_str(UNIDADES[n as usize]);
    }

    res.trim().to_uppercase()
}

/// `CIENTO CINCUENTA MIL DÓLARES ESTADOUNIDENSES (U$S 150.000,00)`
pub fn format_notary_money(amount: f64, currency: &str) -> String {
    let amount = amount.max(0.0);
    let mut integer_part = amount.trunc() as u64;
    let mut decimal_part = ((amount - amount.trunc()) * 100.0).round() as u64;
    if decimal_part >= 100 {
        integer_part += 1;
        decimal_part = 0;
    }

    let mut text = number_to_spanish_text(integer_part);
    if decimal_part > 0 {
        text.push_str(" CON ");
        text.push_str(&number_to_spanish_text(decimal_part));
        text.push_str(" CENTAVOS");
    }

    let (currency_name, symbol) = match currency {
        "USD" => ("DÓLARES ESTADOUNIDENSES", "U$S"),
        "UVA" => ("UNIDADES DE VALOR ADQUISITIVO", "UVA"),
        _ => ("PESOS", "$"),
    };

    format!(
        "{currency_name} {text} ({symbol} {})",
        format_es_ar(integer_part, decimal_part)
    )
}

/// es-AR numeric format: thousands with '.', decimals with ','.
fn format_es_ar(integer_part: u64, decimal_part: u64) -> String {
    let digits = integer_part.to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    format!("{grouped},{decimal_part:02}")
}

/// `2026-01-23` → `veintitres de enero de dos mil veintiseis`
pub fn format_notary_date(date: &str) -> Option<String> {
    let parsed = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    use chrono::Datelike;

    const MONTHS: [&str; 12] = [
        "enero",
        "febrero",
        "marzo",
        "abril",
        "mayo",
        "junio",
        "julio",
        "agosto",
        "septiembre",
        "octubre",
        "noviembre",
        "diciembre",
    ];

    Some(format!(
        "{} de {} de {}",
        number_to_spanish_text(parsed.day() as u64).to_lowercase(),
        MONTHS[parsed.month0() as usize],
        number_to_spanish_text(parsed.year().max(0) as u64).to_lowercase()
    ))
}

/// `Juan Carlos Pérez` → `PÉREZ, Juan Carlos`
pub fn format_notary_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() == 1 {
        return parts[0].to_uppercase();
    }
    let last_name = parts[parts.len() - 1].to_uppercase();
    let first_names: Vec<String> = parts[..parts.len() - 1]
        .iter()
        .map(|p| capitalize(p))
        .collect();
    format!("{}, {}", last_name, first_names.join(" "))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_numbers() {
        assert_eq!(number_to_spanish_text(0), "CERO");
        assert_eq!(number_to_spanish_text(1), "UN");
        assert_eq!(number_to_spanish_text(15), "QUINCE");
        assert_eq!(number_to_spanish_text(21), "VEINTIUN");
        assert_eq!(number_to_spanish_text(45), "CUARENTA Y CINCO");
    }

    #[test]
    fn hundreds() {
        assert_eq!(number_to_spanish_text(100), "CIEN");
        assert_eq!(number_to_spanish_text(101), "CIENTO UN");
        assert_eq!(number_to_spanish_text(500), "QUINIENTOS");
        assert_eq!(number_to_spanish_text(999), "NOVECIENTOS NOVENTA Y NUEVE");
    }

    #[test]
    fn thousands_and_millions() {
        assert_eq!(number_to_spanish_text(1000), "MIL");
        assert_eq!(number_to_spanish_text(2026), "DOS MIL VEINTISEIS");
        assert_eq!(number_to_spanish_text(16), "DIECISÉIS");
        assert_eq!(number_to_spanish_text(150_000), "CIENTO CINCUENTA MIL");
        assert_eq!(number_to_spanish_text(1_000_000), "UN MILLÓN");
        assert_eq!(
            number_to_spanish_text(2_500_000),
            "DOS MILLONES QUINIENTOS MIL"
        );
    }

    #[test]
    fn money_usd() {
        assert_eq!(
            format_notary_money(150_000.0, "USD"),
            "DÓLARES ESTADOUNIDENSES CIENTO CINCUENTA MIL (U$S 150.000,00)"
        );
    }

    #[test]
    fn money_ars_with_cents() {
        let formatted = format_notary_money(1234.56, "ARS");
        assert!(formatted.starts_with("PESOS MIL DOSCIENTOS TREINTA Y CUATRO CON"));
        assert!(formatted.contains("CINCUENTA Y SEIS CENTAVOS"));
        assert!(formatted.ends_with("($ 1.234,56)"));
    }

    #[test]
    fn money_zero() {
        assert_eq!(format_notary_money(0.0, "ARS"), "PESOS CERO ($ 0,00)");
    }

    #[test]
    fn date_in_words() {
        assert_eq!(
            format_notary_date("2026-01-23").unwrap(),
            "veintitres de enero de dos mil veintiseis"
        );
        assert!(format_notary_date("not a date").is_none());
    }

    #[test]
    fn name_surname_first() {
        assert_eq!(format_notary_name("Juan Carlos Pérez"), "PÉREZ, Juan Carlos");
        assert_eq!(format_notary_name("perez"), "PEREZ");
        assert_eq!(format_notary_name(""), "");
    }
}
