use std::path::PathBuf;

use polars::prelude::*;

use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use crate::analysis::{self, AnalysisRequest};
use crate::cache::TableCache;
use crate::error::ComexError;
use crate::format::add_display_columns;
use crate::header::Flow;
use crate::load::load_wide_table;
use crate::query::{self, TradeFilters};
use crate::reshape::reshape;
use crate::schema::{derived, dims, ORDEM_VIAS};

const DEFAULT_SOURCE: &str = "Importação e Exportação - 19-25.xlsx";

#[pyclass]
pub struct ComexModel {
    base_path: PathBuf,
    cache: TableCache,
}

#[pymethods]
impl ComexModel {
    #[new]
    fn new(base_path: String) -> Self {
        Self {
            base_path: PathBuf::from(base_path),
            cache: TableCache::new(Box::new(|path| {
                let raw = load_wide_table(path)?;
                reshape(raw)
            })),
        }
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Build (or reuse) the analytic table from the wide source file.
    ///
    /// The result is cached on the file's fingerprint; a changed file
    /// reloads, an unchanged one does not.
    #[pyo3(signature = (filename=None))]
    fn load_trade_data(&mut self, filename: Option<&str>) -> PyResult<PyDataFrame> {
        let fname = filename.unwrap_or(DEFAULT_SOURCE);
        let path = self.base_path.join(fname);
        let df = self.cache.get_or_load(&path)?;
        Ok(PyDataFrame(df.clone()))
    }

    /// Drop the cached table; the next load re-reads the source file.
    fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    #[getter]
    fn analytic_df(&self) -> Option<PyDataFrame> {
        self.cache.get().cloned().map(PyDataFrame)
    }

    // ── Selector values for the UI ──────────────────────────────────────────

    /// Sorted unique years in the analytic table.
    fn years(&self) -> PyResult<Vec<i32>> {
        let s = self.unique_column(derived::ANO)?;
        let mut years: Vec<i32> = s
            .i32()
            .map_err(ComexError::from)?
            .into_no_null_iter()
            .collect();
        years.sort_unstable();
        Ok(years)
    }

    /// Sorted unique SH4 product codes.
    fn products(&self) -> PyResult<Vec<i32>> {
        let s = self.unique_column(dims::SH4)?;
        let mut codes: Vec<i32> = s
            .i32()
            .map_err(ComexError::from)?
            .into_no_null_iter()
            .collect();
        codes.sort_unstable();
        Ok(codes)
    }

    /// Sorted unique country names.
    fn countries(&self) -> PyResult<Vec<String>> {
        let s = self.unique_column(dims::PAIS)?;
        let mut names: Vec<String> = s
            .str()
            .map_err(ComexError::from)?
            .into_no_null_iter()
            .map(String::from)
            .collect();
        names.sort();
        Ok(names)
    }

    /// Transport modes: the known ones in their fixed order first, then
    /// anything unexpected, alphabetically.
    fn vias(&self) -> PyResult<Vec<String>> {
        let s = self.unique_column(dims::VIA)?;
        let mut vias: Vec<String> = s
            .str()
            .map_err(ComexError::from)?
            .into_no_null_iter()
            .map(String::from)
            .collect();
        vias.sort_by_cached_key(|v| {
            (
                ORDEM_VIAS
                    .iter()
                    .position(|known| *known == v.as_str())
                    .unwrap_or(usize::MAX),
                v.clone(),
            )
        });
        Ok(vias)
    }

    // ── Analysis ────────────────────────────────────────────────────────────

    /// Run an analysis request against the cached analytic table.
    ///
    /// `years`/`products` are the sidebar-level selections applied before
    /// the request's own narrowing; an empty selection raises instead of
    /// returning an indistinguishable empty table.
    #[pyo3(signature = (request, years=None, products=None))]
    fn run_analysis(
        &self,
        request: AnalysisRequest,
        years: Option<Vec<i32>>,
        products: Option<Vec<i32>>,
    ) -> PyResult<Vec<(String, PyDataFrame)>> {
        let df = self.require_loaded()?;
        let base = TradeFilters {
            years,
            products,
            ..Default::default()
        };
        let tables = analysis::run_analysis(df, &base, &request)?;
        Ok(tables
            .into_iter()
            .map(|t| (t.label, PyDataFrame(t.table)))
            .collect())
    }

    /// Filter, group-sum and rank an analytic table directly.
    #[staticmethod]
    #[pyo3(signature = (
        table, group_by,
        years=None, products=None, country=None, via=None, flow=None,
        top=None, percent=false
    ))]
    #[allow(clippy::too_many_arguments)]
    fn aggregate(
        table: PyDataFrame,
        group_by: Vec<String>,
        years: Option<Vec<i32>>,
        products: Option<Vec<i32>>,
        country: Option<String>,
        via: Option<String>,
        flow: Option<&str>,
        top: Option<usize>,
        percent: bool,
    ) -> PyResult<PyDataFrame> {
        let filters = TradeFilters {
            years,
            products,
            country,
            via,
            flow: flow.map(Flow::parse).transpose()?,
        };
        let keys: Vec<&str> = group_by.iter().map(|s| s.as_str()).collect();

        let mut out = query::aggregate(&table.0, &keys, &filters)?;
        if let Some(n) = top {
            out = query::top_n(out, n);
        }
        if percent {
            out = query::with_percent_of_total(out)?;
        }
        let out = add_display_columns(out)?;
        Ok(PyDataFrame(out))
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl ComexModel {
    fn require_loaded(&self) -> Result<&DataFrame, ComexError> {
        self.cache
            .get()
            .ok_or_else(|| ComexError::NotLoaded("trade data".to_string()))
    }

    fn unique_column(&self, name: &str) -> Result<Series, ComexError> {
        let df = self.require_loaded()?;
        let s = df.column(name)?.as_materialized_series().unique()?;
        Ok(s)
    }
}
