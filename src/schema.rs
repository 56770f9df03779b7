/// Column-name and label constants for the comex-datakit schema.
/// Single source of truth - exported to Python via PyO3.

// ── Dimension columns ───────────────────────────────────────────────────────
pub mod dims {
    pub const PAIS: &str = "Pais";
    pub const SH4: &str = "SH4";
    pub const DESCRICAO: &str = "Descricao";
    pub const VIA: &str = "Via";
    pub const UF: &str = "UF";

    pub const ALL: [&str; 5] = [PAIS, SH4, DESCRICAO, VIA, UF];
}

// ── Source spreadsheet headers and their canonical renames ─────────────────
pub mod source {
    use super::dims;

    pub const PAIS: &str = "Países";
    pub const SH4: &str = "Código SH4";
    pub const DESCRICAO: &str = "Descrição SH4";
    pub const VIA: &str = "Via";
    pub const UF: &str = "UF do Produto";

    pub const RENAMES: [(&str, &str); 5] = [
        (PAIS, dims::PAIS),
        (SH4, dims::SH4),
        (DESCRICAO, dims::DESCRICAO),
        (VIA, dims::VIA),
        (UF, dims::UF),
    ];
}

// ── Long-form columns ───────────────────────────────────────────────────────
pub mod long {
    pub const METRICA: &str = "Metrica";
    pub const VALOR: &str = "Valor";
}

// ── Derived key columns ─────────────────────────────────────────────────────
pub mod derived {
    pub const ANO: &str = "Ano";
    pub const TIPO: &str = "Tipo";
}

// ── Analytic value columns ──────────────────────────────────────────────────
pub mod analytic {
    pub const VALOR_FOB: &str = "Valor_FOB";
    pub const QUILO_LIQUIDO: &str = "Quilo_Liquido";
}

// ── Flow type values ────────────────────────────────────────────────────────
pub mod flow {
    pub const EXPORTACAO: &str = "Exportação";
    pub const IMPORTACAO: &str = "Importação";
}

// ── Canonical metric labels (long form) ─────────────────────────────────────
pub mod metric {
    pub const VALOR_FOB: &str = "Valor US$ FOB";
    pub const QUILO_LIQUIDO: &str = "Quilograma Líquido";
}

// ── Header parse markers ────────────────────────────────────────────────────
pub mod markers {
    /// A value header containing this substring is an export column.
    pub const EXPORT: &str = "Exportação";
    /// A value header containing this substring is a monetary column.
    pub const VALOR: &str = "Valor";
}

// ── Display column labels ───────────────────────────────────────────────────
pub mod display {
    pub const VALOR_FOB: &str = "Valor FOB ($)";
    pub const QUILO_LIQUIDO: &str = "Quantidade Líquida (Kg)";
    pub const PCT_FOB: &str = "% FOB";
    pub const SALDO: &str = "Saldo";
}

/// Fixed ordering of the known transport modes. Unknown values sort after.
pub const ORDEM_VIAS: [&str; 13] = [
    "MARITIMA",
    "FLUVIAL",
    "RODOVIARIA",
    "FERROVIARIA",
    "AEREA",
    "LACUSTRE",
    "VICINAL FRONTEIRICO",
    "MEIOS PROPRIOS",
    "EM MAOS",
    "DUTOS",
    "ENTRADA/SAIDA FICTA",
    "CONDUTO/REDE DE TRANSMISSAO",
    "VIA NAO DECLARADA",
];

/// Known SH4 codes mapped to their display names.
pub const MAPA_SH4: [(i32, &str); 6] = [
    (1005, "Milho"),
    (1201, "Soja, mesmo triturada"),
    (1507, "Óleo de soja e fracções"),
    (1701, "Açúcares (cana/beterraba, sacarose pura)"),
    (2207, "Álcool etílico >= 80% vol / Aguardentes"),
    (2304, "Tortas e resíduos de óleo de soja"),
];
