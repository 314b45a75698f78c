//! Row schema of the model worksheet.
//!
//! The template the grid is written into addresses every line by a fixed row
//! number, and the forecast formulas embed those numbers as text. The numbers
//! below are therefore a compatibility contract, not configuration.

use crate::columns::ColumnIndex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelRow {
    Year,
    Revenue,
    RevenueGrowth,
    CostOfRevenue,
    GrossMargin,
    GrossProfit,
    ResearchAndDevelopment,
    SellingMarketing,
    GeneralAdministrative,
    Restructuring,
    OperatingExpenses,
    OperatingIncome,
    InterestNet,
    OtherNonOperating,
    PretaxIncome,
    Taxes,
    NetIncome,
    DiscountedCashFlow,
    DiscountedCashFlowTotal,
    SharesBasic,
    EpsBasic,
    EpsDiluted,
}

impl ModelRow {
    pub const fn number(self) -> u32 {
        match self {
            Self::Year => 1,
            Self::Revenue => 6,
            Self::RevenueGrowth => 7,
            Self::CostOfRevenue => 8,
            Self::GrossMargin => 9,
            Self::GrossProfit => 10,
            Self::ResearchAndDevelopment => 11,
            Self::SellingMarketing => 12,
            Self::GeneralAdministrative => 13,
            Self::Restructuring => 14,
            Self::OperatingExpenses => 15,
            Self::OperatingIncome => 16,
            Self::InterestNet => 17,
            Self::OtherNonOperating => 18,
            Self::PretaxIncome => 19,
            Self::Taxes => 20,
            Self::NetIncome => 21,
            Self::DiscountedCashFlow => 22,
            Self::DiscountedCashFlowTotal => 23,
            Self::SharesBasic => 24,
            Self::EpsBasic => 25,
            Self::EpsDiluted => 26,
        }
    }

    /// Relative A1 reference, e.g. `C6`.
    pub fn at(self, column: ColumnIndex) -> String {
        format!("{}{}", column.label(), self.number())
    }
}
