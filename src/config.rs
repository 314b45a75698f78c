use crate::aliases::{StatementKind, TagAliasTable};
use crate::columns::ColumnIndex;
use crate::error::{DcfModelError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Number of projected years following the last historical column.
pub const FORECAST_HORIZON: usize = 7;

/// Column limit of an XLSX worksheet (`XFD`).
pub const XLSX_MAX_COLUMNS: u32 = 16_384;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ModelConfig {
    #[schemars(description = "Name of the worksheet holding the historical and forecast statement grid")]
    pub model_sheet: String,

    #[schemars(description = "Name of the valuation summary worksheet (price, beta, opening balances, DCF links)")]
    pub summary_sheet: String,

    #[schemars(description = "Column label of the oldest historical year, e.g. 'C'")]
    pub base_column: String,

    #[schemars(
        description = "Number of columns the output grid may use, counted from column A. 16384 matches XLSX; 26 restricts labels to a single letter."
    )]
    pub max_columns: u32,

    #[schemars(description = "Form types accepted as annual filings. Anything else is skipped.")]
    pub annual_form_types: Vec<String>,

    pub statements: StatementNames,

    pub assumptions: AssumptionCells,

    pub summary_cells: SummaryCells,

    #[schemars(description = "Signed disclosure tags summed into each canonical line item")]
    pub aliases: TagAliasTable,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_sheet: "Model".to_string(),
            summary_sheet: "Main".to_string(),
            base_column: "C".to_string(),
            max_columns: XLSX_MAX_COLUMNS,
            annual_form_types: vec!["10-K".to_string()],
            statements: StatementNames::default(),
            assumptions: AssumptionCells::default(),
            summary_cells: SummaryCells::default(),
            aliases: TagAliasTable::standard(),
        }
    }
}

impl ModelConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.model_sheet.trim().is_empty() || self.summary_sheet.trim().is_empty() {
            return Err(DcfModelError::InvalidConfig(
                "Sheet names must not be empty".to_string(),
            ));
        }

        let base = self.base_column()?;
        if base.position() >= self.max_columns {
            return Err(DcfModelError::InvalidConfig(format!(
                "Base column {} lies outside the {} representable columns",
                base, self.max_columns
            )));
        }

        if self.annual_form_types.is_empty() {
            return Err(DcfModelError::InvalidConfig(
                "At least one annual form type is required".to_string(),
            ));
        }

        if self.statements.income_statement.trim().is_empty()
            || self.statements.balance_sheet.trim().is_empty()
        {
            return Err(DcfModelError::InvalidConfig(
                "Statement section names must not be empty".to_string(),
            ));
        }

        for (name, reference) in self.assumptions.references() {
            if reference.trim().is_empty() {
                return Err(DcfModelError::InvalidConfig(format!(
                    "Assumption cell '{}' is empty",
                    name
                )));
            }
        }

        for (name, address) in self.summary_cells.addresses() {
            if address.trim().is_empty() {
                return Err(DcfModelError::InvalidConfig(format!(
                    "Summary cell '{}' is empty",
                    name
                )));
            }
        }

        self.aliases.validate()
    }

    pub fn base_column(&self) -> Result<ColumnIndex> {
        ColumnIndex::from_label(&self.base_column)
    }

    pub fn is_annual_form(&self, form_type: &str) -> bool {
        self.annual_form_types.iter().any(|f| f == form_type)
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ModelConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StatementNames {
    pub income_statement: String,
    pub balance_sheet: String,
}

impl Default for StatementNames {
    fn default() -> Self {
        Self {
            income_statement: "StatementsOfIncome".to_string(),
            balance_sheet: "BalanceSheets".to_string(),
        }
    }
}

impl StatementNames {
    pub fn name(&self, kind: StatementKind) -> &str {
        match kind {
            StatementKind::IncomeStatement => &self.income_statement,
            StatementKind::BalanceSheet => &self.balance_sheet,
        }
    }
}

/// Cell references of the forecast drivers, written verbatim into formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AssumptionCells {
    pub revenue_growth: String,
    pub gross_margin_growth: String,
    pub research_growth: String,
    pub marketing_growth: String,
    pub admin_growth: String,
    pub restructuring_growth: String,
    pub interest_growth: String,
    pub other_non_operating_growth: String,
    pub tax_growth: String,
    pub share_growth: String,

    #[schemars(description = "Discount rate reference, usually on the summary sheet, e.g. 'Main!$I$9'")]
    pub discount_rate: String,
}

impl Default for AssumptionCells {
    fn default() -> Self {
        Self {
            revenue_growth: "$B$31".to_string(),
            gross_margin_growth: "$B$32".to_string(),
            research_growth: "$B$33".to_string(),
            marketing_growth: "$B$34".to_string(),
            admin_growth: "$B$35".to_string(),
            restructuring_growth: "$B$36".to_string(),
            interest_growth: "$B$37".to_string(),
            other_non_operating_growth: "$B$38".to_string(),
            tax_growth: "$B$39".to_string(),
            share_growth: "$B$40".to_string(),
            discount_rate: "Main!$I$9".to_string(),
        }
    }
}

impl AssumptionCells {
    fn references(&self) -> [(&'static str, &str); 11] {
        [
            ("revenue_growth", self.revenue_growth.as_str()),
            ("gross_margin_growth", self.gross_margin_growth.as_str()),
            ("research_growth", self.research_growth.as_str()),
            ("marketing_growth", self.marketing_growth.as_str()),
            ("admin_growth", self.admin_growth.as_str()),
            ("restructuring_growth", self.restructuring_growth.as_str()),
            ("interest_growth", self.interest_growth.as_str()),
            ("other_non_operating_growth", self.other_non_operating_growth.as_str()),
            ("tax_growth", self.tax_growth.as_str()),
            ("share_growth", self.share_growth.as_str()),
            ("discount_rate", self.discount_rate.as_str()),
        ]
    }
}

/// A1 addresses on the summary sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SummaryCells {
    pub current_price: String,
    pub beta: String,
    pub shares: String,
    pub cash: String,
    pub debt: String,
    pub interest_expense: String,
    pub final_net_income: String,
    pub dcf_total: String,
}

impl Default for SummaryCells {
    fn default() -> Self {
        Self {
            current_price: "C3".to_string(),
            beta: "F4".to_string(),
            shares: "C4".to_string(),
            cash: "C6".to_string(),
            debt: "C7".to_string(),
            interest_expense: "I6".to_string(),
            final_net_income: "L3".to_string(),
            dcf_total: "C15".to_string(),
        }
    }
}

impl SummaryCells {
    fn addresses(&self) -> [(&'static str, &str); 8] {
        [
            ("current_price", self.current_price.as_str()),
            ("beta", self.beta.as_str()),
            ("shares", self.shares.as_str()),
            ("cash", self.cash.as_str()),
            ("debt", self.debt.as_str()),
            ("interest_expense", self.interest_expense.as_str()),
            ("final_net_income", self.final_net_income.as_str()),
            ("dcf_total", self.dcf_total.as_str()),
        ]
    }
}
