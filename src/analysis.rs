//! Declarative analysis requests and their dispatcher.
//!
//! The UI layer builds an `AnalysisRequest` from its widget state; the
//! dispatcher resolves it against the analytic table into one result table
//! per flow. The aggregation core stays UI-agnostic and testable on its
//! own.

use polars::prelude::*;
use pyo3::prelude::*;

use crate::crosstab::{crosstab, flow_balance, format_crosstab};
use crate::error::ComexError;
use crate::format::{add_display_columns, shorten_product_name};
use crate::header::Flow;
use crate::query::{aggregate, apply_filters, top_n, with_percent_of_total, FlowSelection, TradeFilters};
use crate::schema::{analytic, derived, dims, display};

#[derive(Debug, Clone)]
pub enum AnalysisKind {
    /// Countries ranked by FOB value, optionally narrowed to one year,
    /// one via or one product.
    TopCountries {
        flow: FlowSelection,
        top_n: usize,
        year: Option<i32>,
        via: Option<String>,
        product: Option<i32>,
    },
    /// Year × flow FOB matrix with the trade balance, for one country or
    /// the whole universe.
    FlowBalance { country: Option<String> },
    /// Every product a country traded in one year, ranked, with shares.
    CountryProducts {
        country: String,
        flow: Flow,
        year: i32,
    },
    /// (SH4, Descricao, Ano) FOB series feeding the evolution charts.
    ProductEvolution {
        products: Vec<i32>,
        flow: Flow,
        country: Option<String>,
    },
    /// Year × product matrix of formatted FOB values for one country.
    ProductCrosstab { country: String, flow: Flow },
    /// Year × via matrices (FOB and net weight) for one country.
    ViaEvolution { country: String, flow: Flow },
    /// Products moved through one via in one year, ranked, with shares.
    ViaComposition {
        country: String,
        flow: Flow,
        via: String,
        year: i32,
        top_n: Option<usize>,
    },
}

/// Declarative analysis specification.
///
/// The UI builds these from Python; the Rust engine executes them.
#[derive(Debug, Clone)]
#[pyclass(name = "AnalysisRequest")]
pub struct AnalysisRequest {
    pub(crate) kind: AnalysisKind,
}

#[pymethods]
impl AnalysisRequest {
    #[staticmethod]
    #[pyo3(signature = (flow, top_n=5, year=None, via=None, product=None))]
    fn top_countries(
        flow: &str,
        top_n: usize,
        year: Option<i32>,
        via: Option<String>,
        product: Option<i32>,
    ) -> PyResult<Self> {
        Ok(Self {
            kind: AnalysisKind::TopCountries {
                flow: FlowSelection::parse(flow)?,
                top_n,
                year,
                via,
                product,
            },
        })
    }

    #[staticmethod]
    #[pyo3(signature = (country=None))]
    fn flow_balance(country: Option<String>) -> Self {
        Self {
            kind: AnalysisKind::FlowBalance { country },
        }
    }

    #[staticmethod]
    fn country_products(country: String, flow: &str, year: i32) -> PyResult<Self> {
        Ok(Self {
            kind: AnalysisKind::CountryProducts {
                country,
                flow: Flow::parse(flow)?,
                year,
            },
        })
    }

    #[staticmethod]
    #[pyo3(signature = (products, flow, country=None))]
    fn product_evolution(
        products: Vec<i32>,
        flow: &str,
        country: Option<String>,
    ) -> PyResult<Self> {
        Ok(Self {
            kind: AnalysisKind::ProductEvolution {
                products,
                flow: Flow::parse(flow)?,
                country,
            },
        })
    }

    #[staticmethod]
    fn product_crosstab(country: String, flow: &str) -> PyResult<Self> {
        Ok(Self {
            kind: AnalysisKind::ProductCrosstab {
                country,
                flow: Flow::parse(flow)?,
            },
        })
    }

    #[staticmethod]
    fn via_evolution(country: String, flow: &str) -> PyResult<Self> {
        Ok(Self {
            kind: AnalysisKind::ViaEvolution {
                country,
                flow: Flow::parse(flow)?,
            },
        })
    }

    #[staticmethod]
    #[pyo3(signature = (country, flow, via, year, top_n=None))]
    fn via_composition(
        country: String,
        flow: &str,
        via: String,
        year: i32,
        top_n: Option<usize>,
    ) -> PyResult<Self> {
        Ok(Self {
            kind: AnalysisKind::ViaComposition {
                country,
                flow: Flow::parse(flow)?,
                via,
                year,
                top_n,
            },
        })
    }
}

/// One result table, labeled for display (flow name or metric name).
pub struct FlowTable {
    pub label: String,
    pub table: DataFrame,
}

/// Resolve a request against the analytic table.
///
/// `base` carries the sidebar-level year and product selections; the
/// request adds its own narrowing on top.
pub fn run_analysis(
    df: &DataFrame,
    base: &TradeFilters,
    request: &AnalysisRequest,
) -> Result<Vec<FlowTable>, ComexError> {
    let universe = apply_filters(df, base)?.collect()?;

    match &request.kind {
        AnalysisKind::TopCountries {
            flow,
            top_n: n,
            year,
            via,
            product,
        } => {
            let mut tables = Vec::new();
            for f in flow.flows() {
                let local = TradeFilters {
                    years: (*year).map(|y| vec![y]),
                    products: (*product).map(|p| vec![p]),
                    via: via.clone(),
                    flow: Some(f),
                    ..Default::default()
                };
                let ranked = top_n(aggregate(&universe, &[dims::PAIS], &local)?, *n);
                tables.push(FlowTable {
                    label: f.label().to_string(),
                    table: add_display_columns(ranked)?,
                });
            }
            Ok(tables)
        }

        AnalysisKind::FlowBalance { country } => {
            let local = TradeFilters {
                country: country.clone(),
                ..Default::default()
            };
            let narrowed = apply_filters(&universe, &local)?.collect()?;
            let balance = flow_balance(&narrowed)?;
            Ok(vec![FlowTable {
                label: display::VALOR_FOB.to_string(),
                table: format_crosstab(&balance, derived::ANO, true)?,
            }])
        }

        AnalysisKind::CountryProducts {
            country,
            flow,
            year,
        } => {
            let local = TradeFilters {
                years: Some(vec![*year]),
                country: Some(country.clone()),
                flow: Some(*flow),
                ..Default::default()
            };
            let ranked = aggregate(&universe, &[dims::SH4, dims::DESCRICAO], &local)?;
            let ranked = add_display_columns(with_percent_of_total(ranked)?)?;
            Ok(vec![FlowTable {
                label: flow.label().to_string(),
                table: ranked,
            }])
        }

        AnalysisKind::ProductEvolution {
            products,
            flow,
            country,
        } => {
            let local = TradeFilters {
                products: Some(products.clone()),
                country: country.clone(),
                flow: Some(*flow),
                ..Default::default()
            };
            let series = aggregate(
                &universe,
                &[dims::SH4, dims::DESCRICAO, derived::ANO],
                &local,
            )?
            .lazy()
            .sort([dims::SH4, derived::ANO], SortMultipleOptions::default())
            .collect()?;
            Ok(vec![FlowTable {
                label: flow.label().to_string(),
                table: series,
            }])
        }

        AnalysisKind::ProductCrosstab { country, flow } => {
            let local = TradeFilters {
                country: Some(country.clone()),
                flow: Some(*flow),
                ..Default::default()
            };
            let narrowed = apply_filters(&universe, &local)?.collect()?;
            let ct = crosstab(
                &narrowed,
                derived::ANO,
                dims::DESCRICAO,
                analytic::VALOR_FOB,
            )?;
            let ct = shorten_crosstab_headers(ct)?;
            Ok(vec![FlowTable {
                label: flow.label().to_string(),
                table: format_crosstab(&ct, derived::ANO, true)?,
            }])
        }

        AnalysisKind::ViaEvolution { country, flow } => {
            let local = TradeFilters {
                country: Some(country.clone()),
                flow: Some(*flow),
                ..Default::default()
            };
            let narrowed = apply_filters(&universe, &local)?.collect()?;
            let fob = crosstab(&narrowed, derived::ANO, dims::VIA, analytic::VALOR_FOB)?;
            let kg = crosstab(&narrowed, derived::ANO, dims::VIA, analytic::QUILO_LIQUIDO)?;
            Ok(vec![
                FlowTable {
                    label: display::VALOR_FOB.to_string(),
                    table: format_crosstab(&fob, derived::ANO, true)?,
                },
                FlowTable {
                    label: display::QUILO_LIQUIDO.to_string(),
                    table: format_crosstab(&kg, derived::ANO, false)?,
                },
            ])
        }

        AnalysisKind::ViaComposition {
            country,
            flow,
            via,
            year,
            top_n: n,
        } => {
            let local = TradeFilters {
                years: Some(vec![*year]),
                country: Some(country.clone()),
                via: Some(via.clone()),
                flow: Some(*flow),
                ..Default::default()
            };
            let mut ranked = aggregate(&universe, &[dims::SH4, dims::DESCRICAO], &local)?;
            if let Some(n) = n {
                ranked = top_n(ranked, *n);
            }
            let ranked = add_display_columns(with_percent_of_total(ranked)?)?;
            Ok(vec![FlowTable {
                label: flow.label().to_string(),
                table: ranked,
            }])
        }
    }
}

/// Rename product-description crosstab headers to their short chart
/// labels. A shortened name that would collide keeps the original header.
fn shorten_crosstab_headers(df: DataFrame) -> Result<DataFrame, ComexError> {
    let current: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.to_string())
        .collect();

    let mut renamed: Vec<String> = Vec::with_capacity(current.len());
    for name in &current {
        let short = if name == derived::ANO {
            name.clone()
        } else {
            shorten_product_name(name)
        };
        if renamed.contains(&short) {
            renamed.push(name.clone());
        } else {
            renamed.push(short);
        }
    }

    let mut df = df;
    df.set_column_names(renamed.as_slice())?;
    Ok(df)
}
