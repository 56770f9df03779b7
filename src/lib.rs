use pyo3::prelude::*;
use pyo3::types::{PyDict, PyModule};

pub mod analysis;
pub mod cache;
pub mod crosstab;
pub mod error;
pub mod format;
pub mod header;
pub mod load;
pub mod model;
pub mod query;
pub mod reshape;
pub mod schema;

use model::ComexModel;

/// Export schema constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Dimension columns
    let dims = PyModule::new(m.py(), "dims")?;
    dims.add("PAIS", schema::dims::PAIS)?;
    dims.add("SH4", schema::dims::SH4)?;
    dims.add("DESCRICAO", schema::dims::DESCRICAO)?;
    dims.add("VIA", schema::dims::VIA)?;
    dims.add("UF", schema::dims::UF)?;
    m.add_submodule(&dims)?;

    // Derived key columns
    let derived = PyModule::new(m.py(), "derived")?;
    derived.add("ANO", schema::derived::ANO)?;
    derived.add("TIPO", schema::derived::TIPO)?;
    m.add_submodule(&derived)?;

    // Analytic value columns
    let analytic = PyModule::new(m.py(), "analytic")?;
    analytic.add("VALOR_FOB", schema::analytic::VALOR_FOB)?;
    analytic.add("QUILO_LIQUIDO", schema::analytic::QUILO_LIQUIDO)?;
    m.add_submodule(&analytic)?;

    // Flow labels
    let flow = PyModule::new(m.py(), "flow")?;
    flow.add("EXPORTACAO", schema::flow::EXPORTACAO)?;
    flow.add("IMPORTACAO", schema::flow::IMPORTACAO)?;
    m.add_submodule(&flow)?;

    // Display labels
    let display = PyModule::new(m.py(), "display")?;
    display.add("VALOR_FOB", schema::display::VALOR_FOB)?;
    display.add("QUILO_LIQUIDO", schema::display::QUILO_LIQUIDO)?;
    display.add("PCT_FOB", schema::display::PCT_FOB)?;
    display.add("SALDO", schema::display::SALDO)?;
    m.add_submodule(&display)?;

    // Fixed via ordering and the known SH4 names
    m.add("ORDEM_VIAS", schema::ORDEM_VIAS.to_vec())?;
    let mapa = PyDict::new(m.py());
    for (code, name) in schema::MAPA_SH4 {
        mapa.set_item(code, name)?;
    }
    m.add("MAPA_SH4", mapa)?;

    Ok(())
}

#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ComexModel>()?;
    m.add_class::<analysis::AnalysisRequest>()?;
    add_schema_exports(m)?;
    Ok(())
}
