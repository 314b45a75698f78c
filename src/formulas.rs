use crate::columns::{ColumnIndex, ColumnPlan};
use crate::config::{AssumptionCells, ModelConfig, FORECAST_HORIZON};
use crate::layout::ModelRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A formula placed at one model cell. Never carries a literal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastCell {
    pub row: ModelRow,
    pub column: ColumnIndex,
    pub formula: String,
    pub referenced_columns: Vec<ColumnIndex>,
}

impl ForecastCell {
    fn new(row: ModelRow, column: ColumnIndex, formula: String, refs: &[ColumnIndex]) -> Self {
        let mut referenced_columns = refs.to_vec();
        referenced_columns.sort();
        referenced_columns.dedup();
        Self {
            row,
            column,
            formula,
            referenced_columns,
        }
    }
}

/// Formulas linking the summary sheet to the model sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryLinks {
    pub final_net_income: String,
    pub dcf_total: String,
}

/// Quotes a sheet name for use in a cross-sheet reference when needed.
pub fn sheet_reference(sheet: &str) -> String {
    if sheet.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        sheet.to_string()
    } else {
        format!("'{}'", sheet.replace('\'', "''"))
    }
}

pub struct FormulaSynthesizer<'a> {
    assumptions: &'a AssumptionCells,
}

impl<'a> FormulaSynthesizer<'a> {
    pub fn new(assumptions: &'a AssumptionCells) -> Self {
        Self { assumptions }
    }

    pub fn from_config(config: &'a ModelConfig) -> Self {
        Self::new(&config.assumptions)
    }

    fn growth(
        row: ModelRow,
        actual: ColumnIndex,
        reference: ColumnIndex,
        assumption: &str,
    ) -> ForecastCell {
        ForecastCell::new(
            row,
            actual,
            format!("={}*(1+{})", row.at(reference), assumption),
            &[reference],
        )
    }

    fn sum_of(row: ModelRow, column: ColumnIndex, terms: &[ModelRow]) -> ForecastCell {
        let refs: Vec<String> = terms.iter().map(|r| r.at(column)).collect();
        ForecastCell::new(row, column, format!("={}", refs.join("+")), &[column])
    }

    /// `=X16+X17+X18`, identical for historical and forecast columns.
    pub fn pretax_income(column: ColumnIndex) -> ForecastCell {
        Self::sum_of(
            ModelRow::PretaxIncome,
            column,
            &[
                ModelRow::OperatingIncome,
                ModelRow::InterestNet,
                ModelRow::OtherNonOperating,
            ],
        )
    }

    /// `=X6/W6-1`.
    pub fn revenue_growth(column: ColumnIndex, previous: ColumnIndex) -> ForecastCell {
        ForecastCell::new(
            ModelRow::RevenueGrowth,
            column,
            format!(
                "={}/{}-1",
                ModelRow::Revenue.at(column),
                ModelRow::Revenue.at(previous)
            ),
            &[column, previous],
        )
    }

    /// `=X10/X6`, the observed margin of a historical column.
    pub fn gross_margin_ratio(column: ColumnIndex) -> ForecastCell {
        ForecastCell::new(
            ModelRow::GrossMargin,
            column,
            format!(
                "={}/{}",
                ModelRow::GrossProfit.at(column),
                ModelRow::Revenue.at(column)
            ),
            &[column],
        )
    }

    /// Formulas of forecast year `year_index` (0-based), projected from the
    /// adjacent `reference` column into `actual`.
    pub fn project_forecast_year(
        &self,
        year_index: usize,
        actual: ColumnIndex,
        reference: ColumnIndex,
    ) -> BTreeMap<ModelRow, ForecastCell> {
        use ModelRow::*;

        let a = self.assumptions;
        let cells = vec![
            Self::growth(Revenue, actual, reference, &a.revenue_growth),
            ForecastCell::new(
                CostOfRevenue,
                actual,
                format!("={}-{}", Revenue.at(actual), GrossProfit.at(actual)),
                &[actual],
            ),
            Self::growth(GrossMargin, actual, reference, &a.gross_margin_growth),
            ForecastCell::new(
                GrossProfit,
                actual,
                format!("={}*{}", Revenue.at(actual), GrossMargin.at(actual)),
                &[actual],
            ),
            Self::growth(ResearchAndDevelopment, actual, reference, &a.research_growth),
            Self::growth(SellingMarketing, actual, reference, &a.marketing_growth),
            Self::growth(GeneralAdministrative, actual, reference, &a.admin_growth),
            Self::growth(Restructuring, actual, reference, &a.restructuring_growth),
            Self::sum_of(
                OperatingExpenses,
                actual,
                &[
                    ResearchAndDevelopment,
                    SellingMarketing,
                    GeneralAdministrative,
                    Restructuring,
                ],
            ),
            ForecastCell::new(
                OperatingIncome,
                actual,
                format!("={}-{}", GrossProfit.at(actual), OperatingExpenses.at(actual)),
                &[actual],
            ),
            Self::growth(InterestNet, actual, reference, &a.interest_growth),
            Self::growth(
                OtherNonOperating,
                actual,
                reference,
                &a.other_non_operating_growth,
            ),
            Self::pretax_income(actual),
            Self::growth(Taxes, actual, reference, &a.tax_growth),
            ForecastCell::new(
                NetIncome,
                actual,
                format!("={}-{}", PretaxIncome.at(actual), Taxes.at(actual)),
                &[actual],
            ),
            Self::growth(SharesBasic, actual, reference, &a.share_growth),
            ForecastCell::new(
                DiscountedCashFlow,
                actual,
                format!(
                    "={}/(1+{})^{}",
                    NetIncome.at(actual),
                    a.discount_rate,
                    year_index + 1
                ),
                &[actual],
            ),
        ];

        cells.into_iter().map(|c| (c.row, c)).collect()
    }

    /// All forecast years, each projected from the column to its left.
    pub fn project_horizon(&self, plan: &ColumnPlan) -> Vec<ForecastCell> {
        let mut reference = plan.last_historical();
        let mut cells = Vec::new();

        for (i, actual) in plan.forecast().iter().copied().enumerate() {
            cells.extend(self.project_forecast_year(i, actual, reference).into_values());
            reference = actual;
        }

        cells
    }

    /// Rows recomputed uniformly across the statement columns: revenue growth
    /// (every column after the first), pretax income (every column) and the
    /// observed gross margin (historical columns).
    pub fn cross_column_cells(&self, plan: &ColumnPlan) -> Vec<ForecastCell> {
        let columns: Vec<ColumnIndex> = plan.statement_columns().collect();
        let mut cells = Vec::new();

        for pair in columns.windows(2) {
            cells.push(Self::revenue_growth(pair[1], pair[0]));
        }

        for column in &columns {
            cells.push(Self::pretax_income(*column));
        }

        for (_, column) in plan.historical() {
            cells.push(Self::gross_margin_ratio(*column));
        }

        cells
    }

    /// Discounted terminal-year value and the total of all discounted values.
    pub fn terminal_cells(&self, plan: &ColumnPlan) -> Vec<ForecastCell> {
        let terminal = plan.terminal();
        let first = plan.forecast()[0];

        vec![
            ForecastCell::new(
                ModelRow::DiscountedCashFlow,
                terminal,
                format!(
                    "={}/(1+{})^{}",
                    ModelRow::NetIncome.at(terminal),
                    self.assumptions.discount_rate,
                    FORECAST_HORIZON
                ),
                &[terminal],
            ),
            ForecastCell::new(
                ModelRow::DiscountedCashFlowTotal,
                terminal,
                format!(
                    "=SUM({}:{})",
                    ModelRow::DiscountedCashFlow.at(first),
                    ModelRow::DiscountedCashFlow.at(terminal)
                ),
                &[first, terminal],
            ),
        ]
    }

    pub fn summary_links(&self, plan: &ColumnPlan, model_sheet: &str) -> SummaryLinks {
        let sheet = sheet_reference(model_sheet);
        SummaryLinks {
            final_net_income: format!(
                "={}!{}",
                sheet,
                ModelRow::NetIncome.at(plan.last_forecast())
            ),
            dcf_total: format!(
                "={}!{}",
                sheet,
                ModelRow::DiscountedCashFlowTotal.at(plan.terminal())
            ),
        }
    }
}
