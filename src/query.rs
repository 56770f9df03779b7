//! Filter and aggregation primitives over the analytic table.
//!
//! Every function is pure: (table, parameters) in, fresh table out. The
//! analytic table itself is never mutated.

use polars::prelude::*;

use crate::error::ComexError;
use crate::header::Flow;
use crate::schema::{analytic, derived, dims, display, flow};

/// The UI's three-way flow selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowSelection {
    Export,
    Import,
    Both,
}

impl FlowSelection {
    /// The concrete flows to run, in display order (exports first).
    pub fn flows(self) -> Vec<Flow> {
        match self {
            FlowSelection::Export => vec![Flow::Export],
            FlowSelection::Import => vec![Flow::Import],
            FlowSelection::Both => vec![Flow::Export, Flow::Import],
        }
    }

    pub fn parse(value: &str) -> Result<Self, ComexError> {
        match value {
            v if v == flow::EXPORTACAO => Ok(FlowSelection::Export),
            v if v == flow::IMPORTACAO => Ok(FlowSelection::Import),
            "Ambos" => Ok(FlowSelection::Both),
            other => Err(ComexError::Validation(format!(
                "Unknown flow selection: '{other}'. Must be '{}', '{}' or 'Ambos'",
                flow::EXPORTACAO,
                flow::IMPORTACAO
            ))),
        }
    }
}

/// Conjunctive filter set. `None` means pass-through; an empty year or
/// product selection is reported as a distinct error since an empty
/// result table is not visually distinguishable from it.
#[derive(Debug, Clone, Default)]
pub struct TradeFilters {
    pub years: Option<Vec<i32>>,
    pub products: Option<Vec<i32>>,
    pub country: Option<String>,
    pub via: Option<String>,
    pub flow: Option<Flow>,
}

/// Apply the filters, returning the narrowed frame as a lazy plan.
pub fn apply_filters(df: &DataFrame, filters: &TradeFilters) -> Result<LazyFrame, ComexError> {
    if matches!(&filters.years, Some(years) if years.is_empty()) {
        return Err(ComexError::EmptySelection(derived::ANO.to_string()));
    }
    if matches!(&filters.products, Some(products) if products.is_empty()) {
        return Err(ComexError::EmptySelection(dims::SH4.to_string()));
    }

    let mut lf = df.clone().lazy();

    if let Some(years) = &filters.years {
        let wanted = Series::new(derived::ANO.into(), years.as_slice());
        lf = lf.filter(col(derived::ANO).is_in(lit(wanted), false));
    }
    if let Some(products) = &filters.products {
        let wanted = Series::new(dims::SH4.into(), products.as_slice());
        lf = lf.filter(col(dims::SH4).is_in(lit(wanted), false));
    }
    if let Some(country) = &filters.country {
        lf = lf.filter(col(dims::PAIS).eq(lit(country.as_str())));
    }
    if let Some(via) = &filters.via {
        lf = lf.filter(col(dims::VIA).eq(lit(via.as_str())));
    }
    if let Some(f) = filters.flow {
        lf = lf.filter(col(derived::TIPO).eq(lit(f.label())));
    }

    Ok(lf)
}

/// Filter, group-sum the two metrics over `group_keys`, and sort by FOB
/// value descending. Both the grouping and the sort are stable, so ties
/// keep their original relative order.
pub fn aggregate(
    df: &DataFrame,
    group_keys: &[&str],
    filters: &TradeFilters,
) -> Result<DataFrame, ComexError> {
    let keys: Vec<Expr> = group_keys.iter().map(|c| col(*c)).collect();

    let out = apply_filters(df, filters)?
        .group_by_stable(keys)
        .agg([
            col(analytic::VALOR_FOB).sum(),
            col(analytic::QUILO_LIQUIDO).sum(),
        ])
        .sort(
            [analytic::VALOR_FOB],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()?;

    Ok(out)
}

/// Keep the first `n` rows of an already-ranked table.
pub fn top_n(df: DataFrame, n: usize) -> DataFrame {
    df.head(Some(n))
}

/// Append `% FOB`: each row's share of the displayed result's FOB total,
/// rounded to one decimal. The total is over this result set, not the
/// pre-filter universe.
pub fn with_percent_of_total(mut df: DataFrame) -> Result<DataFrame, ComexError> {
    let fob = df.column(analytic::VALOR_FOB)?.f64()?;
    let total: f64 = fob.sum().unwrap_or(0.0);

    let pct: Vec<f64> = fob
        .into_iter()
        .map(|v| {
            let v = v.unwrap_or(0.0);
            if total > 0.0 {
                (v / total * 1000.0).round() / 10.0
            } else {
                0.0
            }
        })
        .collect();

    df.with_column(Column::new(display::PCT_FOB.into(), pct))?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analytic_frame() -> DataFrame {
        DataFrame::new(vec![
            Column::new(
                dims::PAIS.into(),
                &["Brasil", "Brasil", "Argentina", "Argentina"],
            ),
            Column::new(dims::SH4.into(), &[1201i32, 1201, 1005, 1201]),
            Column::new(
                dims::DESCRICAO.into(),
                &["Soja, mesmo triturada", "Soja, mesmo triturada", "Milho", "Soja, mesmo triturada"],
            ),
            Column::new(
                dims::VIA.into(),
                &["MARITIMA", "RODOVIARIA", "MARITIMA", "MARITIMA"],
            ),
            Column::new(dims::UF.into(), &["MS", "MS", "PR", "PR"]),
            Column::new(derived::ANO.into(), &[2021i32, 2021, 2021, 2022]),
            Column::new(
                derived::TIPO.into(),
                &[
                    flow::EXPORTACAO,
                    flow::EXPORTACAO,
                    flow::EXPORTACAO,
                    flow::IMPORTACAO,
                ],
            ),
            Column::new(
                analytic::VALOR_FOB.into(),
                &[1000.0f64, 250.0, 70.0, 30.0],
            ),
            Column::new(
                analytic::QUILO_LIQUIDO.into(),
                &[500.0f64, 100.0, 30.0, 10.0],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn rows_differing_only_by_via_sum_into_one() {
        let ranked = aggregate(
            &analytic_frame(),
            &[dims::PAIS],
            &TradeFilters {
                years: Some(vec![2021]),
                flow: Some(Flow::Export),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(ranked.height(), 2);
        // Brasil first: 1250 > 70, descending sort
        let paises = ranked.column(dims::PAIS).unwrap().str().unwrap();
        assert_eq!(paises.get(0), Some("Brasil"));
        let fob = ranked.column(analytic::VALOR_FOB).unwrap().f64().unwrap();
        assert_eq!(fob.get(0), Some(1250.0));
        assert_eq!(fob.get(1), Some(70.0));
    }

    #[test]
    fn aggregation_is_idempotent() {
        let filters = TradeFilters::default();
        let once = aggregate(&analytic_frame(), &[dims::PAIS], &filters).unwrap();
        let twice = aggregate(&once, &[dims::PAIS], &filters).unwrap();
        assert!(once.equals(&twice));
    }

    #[test]
    fn empty_year_selection_is_reported_not_swallowed() {
        let err = aggregate(
            &analytic_frame(),
            &[dims::PAIS],
            &TradeFilters {
                years: Some(vec![]),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ComexError::EmptySelection(_)));
    }

    #[test]
    fn empty_product_selection_is_reported_not_swallowed() {
        let err = apply_filters(
            &analytic_frame(),
            &TradeFilters {
                products: Some(vec![]),
                ..Default::default()
            },
        )
        .map(|_| ())
        .unwrap_err();
        assert!(matches!(err, ComexError::EmptySelection(_)));
    }

    #[test]
    fn absent_filters_pass_everything_through() {
        let lf = apply_filters(&analytic_frame(), &TradeFilters::default()).unwrap();
        assert_eq!(lf.collect().unwrap().height(), 4);
    }

    #[test]
    fn top_n_truncates_after_sorting() {
        let ranked = aggregate(
            &analytic_frame(),
            &[dims::PAIS, dims::VIA],
            &TradeFilters::default(),
        )
        .unwrap();
        let top = top_n(ranked, 2);
        assert_eq!(top.height(), 2);
        let fob = top.column(analytic::VALOR_FOB).unwrap().f64().unwrap();
        assert_eq!(fob.get(0), Some(1000.0));

        // N larger than the table returns what exists
        let all = aggregate(&analytic_frame(), &[dims::PAIS], &TradeFilters::default()).unwrap();
        assert_eq!(top_n(all, 50).height(), 2);
    }

    #[test]
    fn percentages_sum_to_one_hundred() {
        let ranked = aggregate(
            &analytic_frame(),
            &[dims::PAIS, dims::VIA],
            &TradeFilters::default(),
        )
        .unwrap();
        let rows = ranked.height();
        let with_pct = with_percent_of_total(ranked).unwrap();
        let pct = with_pct.column(display::PCT_FOB).unwrap().f64().unwrap();
        let total: f64 = pct.sum().unwrap();
        assert!((total - 100.0).abs() <= 0.1 * rows as f64);
    }

    #[test]
    fn percentages_are_relative_to_the_displayed_set() {
        // After truncation to top 2, shares are over those 2 rows only.
        let ranked = aggregate(
            &analytic_frame(),
            &[dims::PAIS, dims::VIA],
            &TradeFilters {
                flow: Some(Flow::Export),
                ..Default::default()
            },
        )
        .unwrap();
        let top = top_n(ranked, 2);
        let with_pct = with_percent_of_total(top).unwrap();
        let pct = with_pct.column(display::PCT_FOB).unwrap().f64().unwrap();
        assert_eq!(pct.get(0), Some(80.0)); // 1000 / 1250
        assert_eq!(pct.get(1), Some(20.0)); // 250 / 1250
    }
}
