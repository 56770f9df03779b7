//! Parser for the composite value-column headers of the wide spreadsheet.
//!
//! Source headers encode metric, flow and year in one string, e.g.
//! "Valor US$ FOB Exportação 2021" or "Quilograma Líquido Importação 2019".
//! Everything downstream works with the parsed `ValueHeader`; the string
//! conventions live only here and in `schema::markers`.

use crate::error::ComexError;
use crate::schema::{flow, markers, metric};

/// The two metrics carried by every value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    FobValue,
    NetWeight,
}

impl Metric {
    /// Canonical long-form label for the metric.
    pub fn label(self) -> &'static str {
        match self {
            Metric::FobValue => metric::VALOR_FOB,
            Metric::NetWeight => metric::QUILO_LIQUIDO,
        }
    }
}

/// Trade flow direction of a value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Export,
    Import,
}

impl Flow {
    pub fn label(self) -> &'static str {
        match self {
            Flow::Export => flow::EXPORTACAO,
            Flow::Import => flow::IMPORTACAO,
        }
    }

    /// Parse a flow label as supplied by the UI layer.
    pub fn parse(value: &str) -> Result<Self, ComexError> {
        match value {
            v if v == flow::EXPORTACAO => Ok(Flow::Export),
            v if v == flow::IMPORTACAO => Ok(Flow::Import),
            other => Err(ComexError::Validation(format!(
                "Unknown flow type: '{other}'. Must be '{}' or '{}'",
                flow::EXPORTACAO,
                flow::IMPORTACAO
            ))),
        }
    }
}

/// A fully parsed value-column header.
#[derive(Debug, Clone)]
pub struct ValueHeader {
    pub raw: String,
    pub metric: Metric,
    pub flow: Flow,
    pub year: i32,
}

/// Parse one value-column header.
///
/// Year is the first maximal digit run of length exactly four; a header
/// without one is a malformed input file and fails the whole load rather
/// than silently dropping the column.
pub fn parse_value_header(header: &str) -> Result<ValueHeader, ComexError> {
    let year = extract_year(header).ok_or_else(|| ComexError::MalformedHeader {
        header: header.to_string(),
        reason: "no 4-digit year found".to_string(),
    })?;

    let flow = if header.contains(markers::EXPORT) {
        Flow::Export
    } else {
        Flow::Import
    };

    let metric = if header.contains(markers::VALOR) {
        Metric::FobValue
    } else {
        Metric::NetWeight
    };

    Ok(ValueHeader {
        raw: header.to_string(),
        metric,
        flow,
        year,
    })
}

/// First maximal run of exactly four ASCII digits.
fn extract_year(s: &str) -> Option<i32> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i].is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            if i - start == 4 {
                return s[start..i].parse::<i32>().ok();
            }
        } else {
            i += 1;
        }
    }
    None
}
