//! Year × category cross-tab tables.
//!
//! Built as conditional sums over a stable group-by, so a (year, category)
//! combination absent from the data shows zero rather than a hole.

use polars::prelude::*;

use crate::error::ComexError;
use crate::format::{format_count, format_currency};
use crate::schema::{analytic, derived, display, flow};

/// Sum `values` into one column per distinct `columns` value, one row per
/// distinct `index` value. Categories are sorted; missing cells are zero.
pub fn crosstab(
    df: &DataFrame,
    index: &str,
    columns: &str,
    values: &str,
) -> Result<DataFrame, ComexError> {
    let cats = df.column(columns)?.str()?;
    let mut names: Vec<String> = Vec::new();
    for v in cats.into_iter().flatten() {
        if !names.iter().any(|n| n == v) {
            names.push(v.to_string());
        }
    }
    names.sort();

    let aggs: Vec<Expr> = names
        .iter()
        .map(|c| {
            when(col(columns).eq(lit(c.as_str())))
                .then(col(values))
                .otherwise(lit(0.0))
                .sum()
                .alias(c.as_str())
        })
        .collect();

    let out = df
        .clone()
        .lazy()
        .group_by_stable([col(index)])
        .agg(aggs)
        .sort([index], SortMultipleOptions::default())
        .collect()?;

    Ok(out)
}

/// Year × flow summary of FOB value with the trade balance appended:
/// Saldo = Exportação − Importação. Either flow column is zero-filled
/// when that flow is absent from the data.
pub fn flow_balance(df: &DataFrame) -> Result<DataFrame, ComexError> {
    let mut ct = crosstab(df, derived::ANO, derived::TIPO, analytic::VALOR_FOB)?;

    for label in [flow::EXPORTACAO, flow::IMPORTACAO] {
        if ct.column(label).is_err() {
            let zeros = vec![0.0f64; ct.height()];
            ct.with_column(Column::new(label.into(), zeros))?;
        }
    }

    let ct = ct
        .lazy()
        .with_columns([(col(flow::EXPORTACAO) - col(flow::IMPORTACAO)).alias(display::SALDO)])
        .collect()?;

    Ok(ct)
}

/// Render every non-index column of a numeric crosstab as formatted
/// strings, monetary or count style.
pub fn format_crosstab(df: &DataFrame, index: &str, money: bool) -> Result<DataFrame, ComexError> {
    let mut out: Vec<Column> = vec![df.column(index)?.clone()];

    for name in df.get_column_names_str() {
        if name == index {
            continue;
        }
        let series = df.column(name)?.f64()?;
        let formatted: Vec<String> = series
            .into_iter()
            .map(|v| {
                let v = v.unwrap_or(0.0);
                if money {
                    format_currency(v)
                } else {
                    format_count(v)
                }
            })
            .collect();
        out.push(Column::new(name.into(), formatted));
    }

    Ok(DataFrame::new(out)?)
}
