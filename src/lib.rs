//! # DCF Model Builder
//!
//! Turns a company's annual regulatory filings (XBRL facts, already fetched)
//! into the cell contents of a discounted-cash-flow spreadsheet model.
//!
//! ## Core Concepts
//!
//! - **Tag aliases**: each canonical line item (Revenue, Net Income, ...) is the
//!   signed sum of several synonymous disclosure tags; absent tags count as zero
//! - **Authoritative year**: a filing reports its latest fiscal year; restated
//!   prior years inside the same filing are ignored
//! - **Historical columns**: literal values, one column per fiscal year, oldest first
//! - **Forecast columns**: seven years of spreadsheet formulas driven by the
//!   growth assumptions of the template, followed by a terminal-value column
//! - **Summary view**: market data, the opening balance of the latest filing and
//!   links into the model sheet
//!
//! Fetching filings and writing the workbook are left to the caller.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dcf_model_builder::*;
//!
//! let config = ModelConfig::default();
//! let filings: Vec<Filing> = fetch_annual_filings("AAPL")?; // caller supplied
//! let market = MarketSnapshot { current_price: 187.5, beta: 1.29, interest_expense: 3.9e9 };
//!
//! let model = build_dcf_model(&config, &filings, &market)?;
//! println!("{}", model.grid.to_csv());
//! ```

pub mod aliases;
pub mod columns;
pub mod config;
pub mod error;
pub mod formulas;
pub mod grid;
pub mod layout;
pub mod period;
pub mod resolver;
pub mod schema;
pub mod statement;

pub use aliases::{AliasTag, CanonicalLineItem, Sign, StatementKind, TagAliasTable};
pub use columns::{ColumnAllocator, ColumnIndex, ColumnPlan};
pub use config::{
    AssumptionCells, ModelConfig, StatementNames, SummaryCells, FORECAST_HORIZON,
    XLSX_MAX_COLUMNS,
};
pub use error::{DcfModelError, Result};
pub use formulas::{sheet_reference, ForecastCell, FormulaSynthesizer, SummaryLinks};
pub use grid::{CellAddress, CellValue, GridStitcher, OutputGrid, SummaryView};
pub use layout::ModelRow;
pub use period::{AuthoritativePeriod, PeriodSelector};
pub use resolver::{fact_for_period, FactNumber, TagResolver};
pub use schema::*;
pub use statement::{CanonicalYearRecord, OpeningBalance, StatementBuilder, StatementHistory};

use log::{debug, info};

/// Everything the persistence layer needs to write one model workbook.
#[derive(Debug, Clone)]
pub struct DcfModel {
    pub grid: OutputGrid,
    pub summary: SummaryView,
    pub plan: ColumnPlan,
    pub records: Vec<CanonicalYearRecord>,
    pub opening: OpeningBalance,
}

pub struct DcfModelProcessor;

impl DcfModelProcessor {
    /// Runs filings through statement extraction, column allocation, formula
    /// synthesis and grid assembly. Filings must be ordered oldest first.
    pub fn process(
        config: &ModelConfig,
        filings: &[Filing],
        market: &MarketSnapshot,
    ) -> Result<DcfModel> {
        config.validate()?;

        info!("Building DCF model from {} filings", filings.len());

        let history = StatementBuilder::new(config).build_all(filings)?;

        let plan = ColumnAllocator::from_config(config)?.allocate(&history.records)?;
        info!(
            "Allocated columns {}..{} (historical), {}..{} (forecast), {} (terminal)",
            plan.first_historical(),
            plan.last_historical(),
            plan.forecast()[0],
            plan.last_forecast(),
            plan.terminal()
        );
        debug!(
            "{} columns to insert at {}",
            plan.inserted_columns(),
            config.base_column
        );

        let synthesizer = FormulaSynthesizer::from_config(config);
        let mut formulas = synthesizer.project_horizon(&plan);
        formulas.extend(synthesizer.cross_column_cells(&plan));
        formulas.extend(synthesizer.terminal_cells(&plan));

        let grid = GridStitcher::assemble(&history.records, &formulas, &plan)?;

        let links = synthesizer.summary_links(&plan, &config.model_sheet);
        let summary = SummaryView::new(&config.summary_sheet, market, &history.opening, links);

        Ok(DcfModel {
            grid,
            summary,
            plan,
            records: history.records,
            opening: history.opening,
        })
    }
}

pub fn build_dcf_model(
    config: &ModelConfig,
    filings: &[Filing],
    market: &MarketSnapshot,
) -> Result<DcfModel> {
    DcfModelProcessor::process(config, filings, market)
}
