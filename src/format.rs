//! Human-readable number rendering for result tables.
//!
//! Monetary and count values are grouped pt-BR style (dots as thousands
//! separators); zero and missing both render as the literal zero form, so
//! "no data" and "value is zero" are indistinguishable at this layer.

use polars::prelude::*;

use crate::error::ComexError;
use crate::schema::{analytic, display};

/// Long SH4 descriptions mapped to short chart labels.
const SHORT_NAMES: [(&str, &str); 6] = [
    ("Soja, mesmo triturada", "Soja"),
    (
        "Açúcares de cana ou de beterraba e sacarose quimicamente pura, no estado sólido",
        "Açúcar",
    ),
    (
        "Óleo de soja e respectivas fracções, mesmo refinados, mas não quimicamente modificados",
        "Óleo de Soja",
    ),
    (
        "Álcool etílico não desnaturado, com um teor alcoólico em volume igual ou superior a 80 % vol; álcool etílico e aguardentes, desnaturados, com qualquer teor alcoólico",
        "Álcool Etílico",
    ),
    (
        "Tortas e outros resíduos sólidos da extração do óleo de soja",
        "Farelo de Soja",
    ),
    ("Milho", "Milho"),
];

const MAX_LABEL_CHARS: usize = 25;

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    let lead = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i != 0 && (i + 3 - lead) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Render a count value: "1.234.567". Zero and NaN render as "0".
pub fn format_count(value: f64) -> String {
    if value.is_nan() || value == 0.0 {
        return "0".to_string();
    }
    group_thousands(value.round() as i64)
}

/// Render a monetary value: "$1.234.567". Zero and NaN render as "$0".
pub fn format_currency(value: f64) -> String {
    if value.is_nan() || value == 0.0 {
        return "$0".to_string();
    }
    format!("${}", group_thousands(value.round() as i64))
}

/// Shorten a product description for chart labels and crosstab headers.
///
/// Known descriptions map to fixed short names; anything else longer than
/// 25 characters is truncated with an ellipsis.
pub fn shorten_product_name(name: &str) -> String {
    if name.chars().count() <= MAX_LABEL_CHARS {
        return name.to_string();
    }
    for (full, short) in SHORT_NAMES {
        if name.contains(full) {
            return short.to_string();
        }
    }
    let truncated: String = name.chars().take(MAX_LABEL_CHARS - 3).collect();
    format!("{truncated}...")
}

/// Append the formatted display columns for FOB value and net weight.
pub fn add_display_columns(mut df: DataFrame) -> Result<DataFrame, ComexError> {
    let fob = df.column(analytic::VALOR_FOB)?.as_materialized_series().f64()?;
    let money: Vec<String> = fob
        .into_iter()
        .map(|v| format_currency(v.unwrap_or(0.0)))
        .collect();

    let kg = df
        .column(analytic::QUILO_LIQUIDO)?
        .as_materialized_series()
        .f64()?;
    let counts: Vec<String> = kg
        .into_iter()
        .map(|v| format_count(v.unwrap_or(0.0)))
        .collect();

    df.with_column(Column::new(display::VALOR_FOB.into(), money))?;
    df.with_column(Column::new(display::QUILO_LIQUIDO.into(), counts))?;
    Ok(df)
}
