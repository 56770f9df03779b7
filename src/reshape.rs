//! Wide → long → wide reshaping pipeline.
//!
//! The raw spreadsheet carries one row per (country, product, via, UF) and
//! one column per (metric, flow, year). `melt_wide` normalizes that into a
//! long table, `pivot_long` spreads the two metrics back into sibling
//! columns keyed on (dimensions, Ano, Tipo). The pivoted table is the
//! single source of truth for every downstream aggregation.

use polars::prelude::*;

use crate::error::ComexError;
use crate::header::{parse_value_header, ValueHeader};
use crate::schema::{analytic, derived, dims, long, metric, source};

/// Reshape the raw wide table into the analytic table.
pub fn reshape(raw: DataFrame) -> Result<DataFrame, ComexError> {
    let long_df = melt_wide(raw)?;
    pivot_long(&long_df)
}

/// Melt the wide table into long form.
///
/// Output columns: the five dimensions + Metrica + Ano + Tipo + Valor.
/// Every non-dimension column must parse as a value header; a header
/// without a 4-digit year fails the load (silent drops would corrupt
/// totals). Non-numeric cell values coerce to zero, by policy.
pub fn melt_wide(raw: DataFrame) -> Result<DataFrame, ComexError> {
    let renamed = rename_dimensions(raw)?;
    require_columns(&renamed, &dims::ALL)?;

    let value_columns: Vec<String> = renamed
        .get_column_names_str()
        .iter()
        .map(|c| c.to_string())
        .filter(|c| !dims::ALL.contains(&c.as_str()))
        .collect();

    if value_columns.is_empty() {
        return Err(ComexError::Validation(
            "Source table has no value columns".to_string(),
        ));
    }

    let headers: Vec<ValueHeader> = value_columns
        .iter()
        .map(|c| parse_value_header(c))
        .collect::<Result<_, _>>()?;

    // SH4 is a product code; a non-numeric code is malformed input,
    // unlike value cells which coerce leniently.
    let typed = renamed
        .lazy()
        .with_columns([col(dims::SH4).strict_cast(DataType::Int32)]);

    let frames: Vec<LazyFrame> = headers
        .iter()
        .map(|h| {
            let mut exprs: Vec<Expr> = dims::ALL.iter().map(|c| col(*c)).collect();
            exprs.push(lit(h.metric.label()).alias(long::METRICA));
            exprs.push(lit(h.year).alias(derived::ANO));
            exprs.push(lit(h.flow.label()).alias(derived::TIPO));
            exprs.push(
                col(h.raw.as_str())
                    .cast(DataType::Float64)
                    .fill_null(lit(0.0))
                    .alias(long::VALOR),
            );
            typed.clone().select(exprs)
        })
        .collect();

    Ok(concat(frames, UnionArgs::default())?.collect()?)
}

/// Pivot the long table into the analytic table.
///
/// One row per (dimensions, Ano, Tipo), with Valor_FOB and Quilo_Liquido
/// as sibling columns. A key present for only one metric gets zero for
/// the other (fill semantics, not drop semantics). The stable group-by
/// makes the pre-pivot key unique by construction.
pub fn pivot_long(long_df: &DataFrame) -> Result<DataFrame, ComexError> {
    let mut keys: Vec<Expr> = dims::ALL.iter().map(|c| col(*c)).collect();
    keys.push(col(derived::ANO));
    keys.push(col(derived::TIPO));

    let spread = |label: &'static str, out: &'static str| {
        when(col(long::METRICA).eq(lit(label)))
            .then(col(long::VALOR))
            .otherwise(lit(0.0))
            .sum()
            .alias(out)
    };

    let df = long_df
        .clone()
        .lazy()
        .group_by_stable(keys)
        .agg([
            spread(metric::VALOR_FOB, analytic::VALOR_FOB),
            spread(metric::QUILO_LIQUIDO, analytic::QUILO_LIQUIDO),
        ])
        .collect()?;

    Ok(df)
}

fn rename_dimensions(df: DataFrame) -> Result<DataFrame, ComexError> {
    let existing: Vec<&str> = source::RENAMES.iter().map(|(from, _)| *from).collect();
    let new: Vec<&str> = source::RENAMES.iter().map(|(_, to)| *to).collect();
    Ok(df.lazy().rename(existing, new, false).collect()?)
}

fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), ComexError> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(ComexError::MissingColumn(col_name.to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Metric;
    use crate::schema::flow;

    fn sample_wide() -> DataFrame {
        DataFrame::new(vec![
            Column::new(source::PAIS.into(), &["Brasil", "Brasil", "Argentina"]),
            Column::new(source::SH4.into(), &["1201", "1201", "1005"]),
            Column::new(
                source::DESCRICAO.into(),
                &["Soja, mesmo triturada", "Soja, mesmo triturada", "Milho"],
            ),
            Column::new(source::VIA.into(), &["MARITIMA", "RODOVIARIA", "MARITIMA"]),
            Column::new(source::UF.into(), &["MS", "MS", "PR"]),
            Column::new(
                "Valor US$ FOB Exportação 2021".into(),
                &["1000", "250", "70"],
            ),
            Column::new(
                "Quilograma Líquido Exportação 2021".into(),
                &["500", "100", "30"],
            ),
            // "n/d" exercises the lenient coercion path
            Column::new("Valor US$ FOB Importação 2021".into(), &["0", "n/d", "5"]),
        ])
        .unwrap()
    }

    fn lookup(df: &DataFrame, pais: &str, via: &str, tipo: &str) -> (f64, f64) {
        let hit = df
            .clone()
            .lazy()
            .filter(
                col(dims::PAIS)
                    .eq(lit(pais))
                    .and(col(dims::VIA).eq(lit(via)))
                    .and(col(derived::TIPO).eq(lit(tipo))),
            )
            .collect()
            .unwrap();
        assert_eq!(hit.height(), 1, "expected exactly one analytic row");
        let fob = hit
            .column(analytic::VALOR_FOB)
            .unwrap()
            .f64()
            .unwrap()
            .get(0)
            .unwrap();
        let kg = hit
            .column(analytic::QUILO_LIQUIDO)
            .unwrap()
            .f64()
            .unwrap()
            .get(0)
            .unwrap();
        (fob, kg)
    }

    #[test]
    fn reshape_produces_the_expected_analytic_row() {
        let df = reshape(sample_wide()).unwrap();
        let (fob, kg) = lookup(&df, "Brasil", "MARITIMA", flow::EXPORTACAO);
        assert_eq!(fob, 1000.0);
        assert_eq!(kg, 500.0);
    }

    #[test]
    fn missing_metric_fills_zero_instead_of_dropping() {
        // No import net-weight column exists at all; import rows must still
        // appear with Quilo_Liquido = 0.
        let df = reshape(sample_wide()).unwrap();
        let (fob, kg) = lookup(&df, "Argentina", "MARITIMA", flow::IMPORTACAO);
        assert_eq!(fob, 5.0);
        assert_eq!(kg, 0.0);
    }

    #[test]
    fn non_numeric_values_coerce_to_zero() {
        let df = reshape(sample_wide()).unwrap();
        let (fob, _) = lookup(&df, "Brasil", "RODOVIARIA", flow::IMPORTACAO);
        assert_eq!(fob, 0.0);
    }

    #[test]
    fn sums_are_conserved_through_the_reshape() {
        let df = reshape(sample_wide()).unwrap();
        let export_2021 = df
            .clone()
            .lazy()
            .filter(
                col(derived::TIPO)
                    .eq(lit(flow::EXPORTACAO))
                    .and(col(derived::ANO).eq(lit(2021))),
            )
            .collect()
            .unwrap();
        let total: f64 = export_2021
            .column(analytic::VALOR_FOB)
            .unwrap()
            .f64()
            .unwrap()
            .sum()
            .unwrap();
        assert_eq!(total, 1000.0 + 250.0 + 70.0);
    }

    #[test]
    fn melt_recovers_every_source_tuple() {
        let long_df = melt_wide(sample_wide()).unwrap();
        // 3 rows × 3 value columns
        assert_eq!(long_df.height(), 9);

        let years = long_df.column(derived::ANO).unwrap().i32().unwrap();
        assert!(years.into_no_null_iter().all(|y| y == 2021));

        let total: f64 = long_df
            .column(long::VALOR)
            .unwrap()
            .f64()
            .unwrap()
            .sum()
            .unwrap();
        // 1320 export FOB + 630 export kg + 5 import FOB ("n/d" -> 0)
        assert_eq!(total, 1320.0 + 630.0 + 5.0);
    }

    #[test]
    fn reshape_round_trips_every_source_cell() {
        let wide = sample_wide();
        let analytic_df = reshape(wide.clone()).unwrap();
        // Each source row is a distinct dimension key, so the analytic
        // table carries one row per (key, flow) and nothing else.
        assert_eq!(analytic_df.height(), 6);

        let pais = wide.column(source::PAIS).unwrap().str().unwrap();
        let sh4 = wide.column(source::SH4).unwrap().str().unwrap();
        let descricao = wide.column(source::DESCRICAO).unwrap().str().unwrap();
        let via = wide.column(source::VIA).unwrap().str().unwrap();
        let uf = wide.column(source::UF).unwrap().str().unwrap();

        let value_columns = [
            "Valor US$ FOB Exportação 2021",
            "Quilograma Líquido Exportação 2021",
            "Valor US$ FOB Importação 2021",
        ];

        for name in value_columns {
            let header = parse_value_header(name).unwrap();
            let out = match header.metric {
                Metric::FobValue => analytic::VALOR_FOB,
                Metric::NetWeight => analytic::QUILO_LIQUIDO,
            };
            let cells = wide.column(name).unwrap().str().unwrap();

            for idx in 0..wide.height() {
                let expected: f64 = cells.get(idx).unwrap().parse().unwrap_or(0.0);
                let hit = analytic_df
                    .clone()
                    .lazy()
                    .filter(
                        col(dims::PAIS)
                            .eq(lit(pais.get(idx).unwrap()))
                            .and(
                                col(dims::SH4)
                                    .eq(lit(sh4.get(idx).unwrap().parse::<i32>().unwrap())),
                            )
                            .and(col(dims::DESCRICAO).eq(lit(descricao.get(idx).unwrap())))
                            .and(col(dims::VIA).eq(lit(via.get(idx).unwrap())))
                            .and(col(dims::UF).eq(lit(uf.get(idx).unwrap())))
                            .and(col(derived::ANO).eq(lit(header.year)))
                            .and(col(derived::TIPO).eq(lit(header.flow.label()))),
                    )
                    .collect()
                    .unwrap();
                assert_eq!(hit.height(), 1, "cell {name}[{idx}] lost or duplicated");
                let got = hit.column(out).unwrap().f64().unwrap().get(0).unwrap();
                assert_eq!(got, expected, "cell {name}[{idx}] misattributed");
            }
        }
    }

    #[test]
    fn header_without_year_fails_the_load() {
        let mut wide = sample_wide();
        wide.with_column(Column::new(
            "Valor US$ FOB Exportação".into(),
            &["1", "2", "3"],
        ))
        .unwrap();
        let err = reshape(wide).unwrap_err();
        assert!(matches!(err, ComexError::MalformedHeader { .. }));
    }

    #[test]
    fn missing_dimension_column_is_rejected() {
        let wide = sample_wide().drop(source::UF).unwrap();
        let err = reshape(wide).unwrap_err();
        assert!(matches!(err, ComexError::MissingColumn(_)));
    }
}
