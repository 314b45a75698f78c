use crate::columns::{ColumnIndex, ColumnPlan};
use crate::config::SummaryCells;
use crate::error::{DcfModelError, Result};
use crate::formulas::{ForecastCell, SummaryLinks};
use crate::layout::ModelRow;
use crate::schema::MarketSnapshot;
use crate::statement::{CanonicalYearRecord, OpeningBalance};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Content of one spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Decimal(f64),
    /// Spreadsheet formula text, always starting with `=`.
    Formula(String),
}

impl CellValue {
    pub fn is_formula(&self) -> bool {
        matches!(self, CellValue::Formula(_))
    }

    pub fn as_formula(&self) -> Option<&str> {
        match self {
            CellValue::Formula(f) => Some(f),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Integer(v) => write!(f, "{}", v),
            CellValue::Decimal(v) => write!(f, "{}", v),
            CellValue::Formula(s) => f.write_str(s),
        }
    }
}

/// Row-major cell address on the model sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellAddress {
    pub row: u32,
    pub column: ColumnIndex,
}

impl CellAddress {
    pub fn new(row: ModelRow, column: ColumnIndex) -> Self {
        Self {
            row: row.number(),
            column,
        }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column.label(), self.row)
    }
}

/// Cells of the model sheet, each written exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputGrid {
    cells: BTreeMap<CellAddress, CellValue>,
}

impl OutputGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes `value` at `address`. Rewriting a cell with the same formula is a
    /// no-op; any other second write is a conflict.
    pub fn insert(&mut self, address: CellAddress, value: CellValue) -> Result<()> {
        match self.cells.get(&address) {
            None => {
                self.cells.insert(address, value);
                Ok(())
            }
            Some(existing) if existing.is_formula() && *existing == value => Ok(()),
            Some(existing) => Err(DcfModelError::ColumnConflict {
                cell: address.to_string(),
                existing: existing.to_string(),
                incoming: value.to_string(),
            }),
        }
    }

    pub fn get(&self, row: ModelRow, column: ColumnIndex) -> Option<&CellValue> {
        self.cells.get(&CellAddress::new(row, column))
    }

    /// Looks a cell up by its A1 address, e.g. `F6`.
    pub fn get_a1(&self, a1: &str) -> Option<&CellValue> {
        let split = a1.find(|c: char| c.is_ascii_digit())?;
        let (letters, digits) = a1.split_at(split);
        let column = ColumnIndex::from_label(letters).ok()?;
        let row = digits.parse().ok()?;
        self.cells.get(&CellAddress { row, column })
    }

    /// Cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (&CellAddress, &CellValue)> {
        self.cells.iter()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn column_span(&self) -> Option<(ColumnIndex, ColumnIndex)> {
        let min = self.cells.keys().map(|a| a.column).min()?;
        let max = self.cells.keys().map(|a| a.column).max()?;
        Some((min, max))
    }

    /// Row-major matrix: a header of column labels, then one line per
    /// populated row. Empty cells stay empty.
    pub fn to_csv(&self) -> String {
        let mut output = String::new();
        let Some((first, last)) = self.column_span() else {
            return output;
        };

        let columns: Vec<ColumnIndex> = (first.position()..=last.position())
            .map(ColumnIndex::new)
            .collect();

        output.push_str("Row");
        for column in &columns {
            output.push(',');
            output.push_str(&column.label());
        }
        output.push('\n');

        let mut rows: Vec<u32> = self.cells.keys().map(|a| a.row).collect();
        rows.dedup();

        for row in rows {
            output.push_str(&row.to_string());
            for column in &columns {
                output.push(',');
                if let Some(value) = self.cells.get(&CellAddress { row, column: *column }) {
                    output.push_str(&csv_field(&value.to_string()));
                }
            }
            output.push('\n');
        }

        output
    }

    /// JSON object keyed by A1 address.
    pub fn to_json(&self) -> Result<String> {
        let map: BTreeMap<String, &CellValue> = self
            .cells
            .iter()
            .map(|(address, value)| (address.to_string(), value))
            .collect();
        Ok(serde_json::to_string_pretty(&map)?)
    }
}

fn csv_field(raw: &str) -> String {
    if raw.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

/// Places record values and formulas into their allocated columns.
pub struct GridStitcher;

impl GridStitcher {
    fn historical_cells(record: &CanonicalYearRecord) -> [(ModelRow, CellValue); 17] {
        use CellValue::{Decimal, Integer};
        use ModelRow::*;

        [
            (Year, Integer(record.year as i64)),
            (Revenue, Integer(record.revenue)),
            (CostOfRevenue, Integer(record.cost_of_revenue)),
            (GrossProfit, Integer(record.gross_profit)),
            (ResearchAndDevelopment, Integer(record.research_and_development)),
            (SellingMarketing, Integer(record.selling_marketing)),
            (GeneralAdministrative, Integer(record.general_administrative)),
            (Restructuring, Integer(record.restructuring)),
            (OperatingExpenses, Integer(record.operating_expenses)),
            (OperatingIncome, Integer(record.operating_income())),
            (InterestNet, Integer(record.interest_net)),
            (OtherNonOperating, Integer(record.other_non_operating)),
            (Taxes, Integer(record.taxes)),
            (NetIncome, Integer(record.net_income)),
            (SharesBasic, Integer(record.shares_basic)),
            (EpsBasic, Decimal(record.eps_basic)),
            (EpsDiluted, Decimal(record.eps_diluted)),
        ]
    }

    /// Writes every record into its historical column, then every formula.
    /// Records must line up one-to-one with the plan's historical columns.
    pub fn assemble(
        records: &[CanonicalYearRecord],
        formulas: &[ForecastCell],
        plan: &ColumnPlan,
    ) -> Result<OutputGrid> {
        if records.len() != plan.historical().len() {
            return Err(DcfModelError::PlanMismatch(format!(
                "{} records for {} historical columns",
                records.len(),
                plan.historical().len()
            )));
        }

        let mut grid = OutputGrid::new();

        for (record, (year, column)) in records.iter().zip(plan.historical()) {
            if record.year != *year {
                return Err(DcfModelError::PlanMismatch(format!(
                    "record for {} placed in the column of {}",
                    record.year, year
                )));
            }
            debug!("Writing {} into column {}", record.year, column);
            for (row, value) in Self::historical_cells(record) {
                grid.insert(CellAddress::new(row, *column), value)?;
            }
        }

        for cell in formulas {
            grid.insert(
                CellAddress::new(cell.row, cell.column),
                CellValue::Formula(cell.formula.clone()),
            )?;
        }

        info!(
            "Assembled grid: {} cells across {} columns",
            grid.len(),
            plan.historical().len() + plan.forecast().len() + 1
        );

        Ok(grid)
    }
}

/// Values and links written to the summary sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryView {
    pub sheet: String,
    pub current_price: f64,
    pub beta: f64,
    pub interest_expense: f64,
    pub shares: i64,
    pub cash: i64,
    pub debt: i64,
    pub links: SummaryLinks,
}

impl SummaryView {
    pub fn new(
        sheet: impl Into<String>,
        market: &MarketSnapshot,
        opening: &OpeningBalance,
        links: SummaryLinks,
    ) -> Self {
        Self {
            sheet: sheet.into(),
            current_price: market.current_price,
            beta: market.beta,
            interest_expense: market.interest_expense,
            shares: opening.shares_basic,
            cash: opening.cash,
            debt: opening.debt,
            links,
        }
    }

    /// Address/value pairs placed according to `addresses`.
    pub fn cells(&self, addresses: &SummaryCells) -> Vec<(String, CellValue)> {
        vec![
            (
                addresses.current_price.clone(),
                CellValue::Decimal(self.current_price),
            ),
            (addresses.beta.clone(), CellValue::Decimal(self.beta)),
            (addresses.shares.clone(), CellValue::Integer(self.shares)),
            (addresses.cash.clone(), CellValue::Integer(self.cash)),
            (addresses.debt.clone(), CellValue::Integer(self.debt)),
            (
                addresses.interest_expense.clone(),
                CellValue::Decimal(self.interest_expense),
            ),
            (
                addresses.final_net_income.clone(),
                CellValue::Formula(self.links.final_net_income.clone()),
            ),
            (
                addresses.dcf_total.clone(),
                CellValue::Formula(self.links.dcf_total.clone()),
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::ColumnAllocator;
    use crate::config::AssumptionCells;
    use crate::formulas::FormulaSynthesizer;
    use chrono::NaiveDate;

    fn col(label: &str) -> ColumnIndex {
        ColumnIndex::from_label(label).unwrap()
    }

    fn record(year: i32, revenue: i64, cost: i64) -> CanonicalYearRecord {
        CanonicalYearRecord {
            filing_id: format!("fy{}", year),
            year,
            period_end: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
            revenue,
            cost_of_revenue: cost,
            gross_profit: revenue - cost,
            research_and_development: 10,
            selling_marketing: 5,
            general_administrative: 3,
            restructuring: 0,
            operating_expenses: 18,
            reported_operating_income: 0,
            interest_net: 2,
            other_non_operating: -1,
            taxes: 7,
            net_income: 20,
            shares_basic: 1_000,
            eps_basic: 0.02,
            eps_diluted: 0.019,
        }
    }

    fn assembled() -> (OutputGrid, ColumnPlan) {
        let records = vec![record(2021, 100, 40), record(2022, 110, 45), record(2023, 125, 50)];
        let plan = ColumnAllocator::new(col("C"), 16_384)
            .allocate(&records)
            .unwrap();
        let assumptions = AssumptionCells::default();
        let synth = FormulaSynthesizer::new(&assumptions);

        let mut formulas = synth.project_horizon(&plan);
        formulas.extend(synth.cross_column_cells(&plan));
        formulas.extend(synth.terminal_cells(&plan));

        let grid = GridStitcher::assemble(&records, &formulas, &plan).unwrap();
        (grid, plan)
    }

    #[test]
    fn test_historical_columns_hold_literals() {
        let (grid, _) = assembled();

        let gross: Vec<&CellValue> = ["C", "D", "E"]
            .iter()
            .map(|c| grid.get(ModelRow::GrossProfit, col(c)).unwrap())
            .collect();
        assert_eq!(
            gross,
            vec![
                &CellValue::Integer(60),
                &CellValue::Integer(65),
                &CellValue::Integer(75)
            ]
        );
        assert_eq!(grid.get(ModelRow::Year, col("E")), Some(&CellValue::Integer(2023)));
        assert_eq!(
            grid.get(ModelRow::OperatingIncome, col("C")),
            Some(&CellValue::Integer(42))
        );
        assert_eq!(
            grid.get(ModelRow::EpsDiluted, col("D")),
            Some(&CellValue::Decimal(0.019))
        );
    }

    #[test]
    fn test_forecast_and_cross_column_formulas() {
        let (grid, plan) = assembled();

        assert_eq!(
            grid.get_a1("F6").and_then(CellValue::as_formula),
            Some("=E6*(1+$B$31)")
        );
        assert_eq!(grid.get_a1("C9").and_then(CellValue::as_formula), Some("=C10/C6"));
        assert_eq!(grid.get_a1("C19").and_then(CellValue::as_formula), Some("=C16+C17+C18"));
        assert_eq!(grid.get_a1("F19").and_then(CellValue::as_formula), Some("=F16+F17+F18"));
        assert_eq!(grid.get_a1("D7").and_then(CellValue::as_formula), Some("=D6/C6-1"));
        assert_eq!(grid.get_a1("L7").and_then(CellValue::as_formula), Some("=L6/K6-1"));
        assert!(grid.get_a1("C7").is_none());
        assert!(grid.get_a1("M7").is_none());
        assert_eq!(
            grid.get(ModelRow::DiscountedCashFlowTotal, plan.terminal())
                .and_then(CellValue::as_formula),
            Some("=SUM(F22:M22)")
        );
    }

    #[test]
    fn test_every_cell_has_one_source() {
        let (grid, plan) = assembled();

        for (address, value) in grid.iter() {
            let historical = plan.historical().iter().any(|(_, c)| *c == address.column);
            let literal_row = ![7, 9, 19].contains(&address.row);
            if historical && literal_row {
                assert!(!value.is_formula(), "{} should be a literal", address);
            } else {
                assert!(value.is_formula(), "{} should be a formula", address);
            }
        }
    }

    #[test]
    fn test_formula_over_literal_conflicts() {
        let records = vec![record(2021, 100, 40)];
        let plan = ColumnAllocator::new(col("C"), 16_384)
            .allocate(&records)
            .unwrap();
        let clash = ForecastCell {
            row: ModelRow::Revenue,
            column: col("C"),
            formula: "=B6*(1+$B$31)".to_string(),
            referenced_columns: vec![col("B")],
        };

        let err = GridStitcher::assemble(&records, &[clash], &plan).unwrap_err();
        match err {
            DcfModelError::ColumnConflict { cell, existing, incoming } => {
                assert_eq!(cell, "C6");
                assert_eq!(existing, "100");
                assert_eq!(incoming, "=B6*(1+$B$31)");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_differing_formulas_conflict() {
        let mut grid = OutputGrid::new();
        let address = CellAddress::new(ModelRow::Revenue, col("F"));
        grid.insert(address, CellValue::Formula("=E6".into())).unwrap();
        grid.insert(address, CellValue::Formula("=E6".into())).unwrap();
        assert!(grid
            .insert(address, CellValue::Formula("=E6*2".into()))
            .is_err());
    }

    #[test]
    fn test_record_plan_mismatch() {
        let records = vec![record(2021, 100, 40), record(2022, 110, 45)];
        let plan = ColumnAllocator::new(col("C"), 16_384)
            .allocate_years(&[2021, 2023])
            .unwrap();
        assert!(matches!(
            GridStitcher::assemble(&records, &[], &plan),
            Err(DcfModelError::PlanMismatch(_))
        ));

        let short = ColumnAllocator::new(col("C"), 16_384)
            .allocate_years(&[2021])
            .unwrap();
        assert!(matches!(
            GridStitcher::assemble(&records, &[], &short),
            Err(DcfModelError::PlanMismatch(_))
        ));
    }

    #[test]
    fn test_to_csv_matrix() {
        let (grid, _) = assembled();
        let csv = grid.to_csv();
        let mut lines = csv.lines();

        assert_eq!(lines.next(), Some("Row,C,D,E,F,G,H,I,J,K,L,M"));
        assert_eq!(lines.next(), Some("1,2021,2022,2023,,,,,,,,"));
        let revenue = lines.next().unwrap();
        assert!(revenue.starts_with("6,100,110,125,=E6*(1+$B$31),"));
    }

    #[test]
    fn test_to_json_keys_by_address() {
        let (grid, _) = assembled();
        let value: serde_json::Value = serde_json::from_str(&grid.to_json().unwrap()).unwrap();
        assert_eq!(value["C6"], 100);
        assert_eq!(value["F6"], "=E6*(1+$B$31)");
    }

    #[test]
    fn test_summary_cells() {
        let market = MarketSnapshot {
            current_price: 187.5,
            beta: 1.29,
            interest_expense: 3_933_000_000.0,
        };
        let opening = OpeningBalance {
            filing_id: "fy2023".to_string(),
            as_of: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            cash: 61_555,
            debt: 104_590,
            shares_basic: 15_744,
        };
        let links = SummaryLinks {
            final_net_income: "=Model!L21".to_string(),
            dcf_total: "=Model!M23".to_string(),
        };
        let view = SummaryView::new("Main", &market, &opening, links);
        let cells: BTreeMap<String, CellValue> =
            view.cells(&SummaryCells::default()).into_iter().collect();

        assert_eq!(cells["C3"], CellValue::Decimal(187.5));
        assert_eq!(cells["F4"], CellValue::Decimal(1.29));
        assert_eq!(cells["C4"], CellValue::Integer(15_744));
        assert_eq!(cells["C6"], CellValue::Integer(61_555));
        assert_eq!(cells["C7"], CellValue::Integer(104_590));
        assert_eq!(cells["L3"], CellValue::Formula("=Model!L21".to_string()));
        assert_eq!(cells["C15"], CellValue::Formula("=Model!M23".to_string()));
    }
}
