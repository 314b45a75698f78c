use crate::error::{DcfModelError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "PascalCase")]
pub enum CanonicalLineItem {
    Revenue,
    CostOfRevenue,
    ResearchAndDevelopment,
    SellingGeneralAdministrative,
    SellingMarketing,
    Restructuring,
    OperatingExpenses,
    OperatingIncome,
    InterestNet,
    OtherNonOperating,
    Taxes,
    NetIncome,
    SharesBasic,
    EpsBasic,
    EpsDiluted,
    Cash,
    Debt,
}

impl CanonicalLineItem {
    pub const ALL: [CanonicalLineItem; 17] = [
        Self::Revenue,
        Self::CostOfRevenue,
        Self::ResearchAndDevelopment,
        Self::SellingGeneralAdministrative,
        Self::SellingMarketing,
        Self::Restructuring,
        Self::OperatingExpenses,
        Self::OperatingIncome,
        Self::InterestNet,
        Self::OtherNonOperating,
        Self::Taxes,
        Self::NetIncome,
        Self::SharesBasic,
        Self::EpsBasic,
        Self::EpsDiluted,
        Self::Cash,
        Self::Debt,
    ];

    pub fn statement(self) -> StatementKind {
        match self {
            Self::Cash | Self::Debt => StatementKind::BalanceSheet,
            _ => StatementKind::IncomeStatement,
        }
    }

    /// Per-share figures are disclosed as decimals; everything else is a whole
    /// number of dollars or shares.
    pub fn is_per_share(self) -> bool {
        matches!(self, Self::EpsBasic | Self::EpsDiluted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum StatementKind {
    IncomeStatement,
    BalanceSheet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Sign {
    #[default]
    Add,
    Subtract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AliasTag {
    #[schemars(description = "Disclosure tag name, e.g. 'RevenueFromContractWithCustomerExcludingAssessedTax'")]
    pub tag: String,

    #[serde(default)]
    #[schemars(description = "Whether the tag's value is added to or subtracted from the line item. Defaults to add.")]
    pub sign: Sign,
}

impl AliasTag {
    pub fn add(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            sign: Sign::Add,
        }
    }

    pub fn subtract(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            sign: Sign::Subtract,
        }
    }
}

/// Maps every canonical line item to the signed disclosure tags summed into it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct TagAliasTable {
    aliases: BTreeMap<CanonicalLineItem, Vec<AliasTag>>,
}

impl Default for TagAliasTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl TagAliasTable {
    /// The US-GAAP vocabulary observed across 10-K income statements and
    /// balance sheets.
    pub fn standard() -> Self {
        use CanonicalLineItem::*;

        fn add(tags: &[&str]) -> Vec<AliasTag> {
            tags.iter().map(|t| AliasTag::add(*t)).collect()
        }

        let mut aliases = BTreeMap::new();
        aliases.insert(
            Revenue,
            add(&[
                "RevenueFromContractWithCustomerExcludingAssessedTax",
                "Revenues",
                "SalesRevenueNet",
            ]),
        );
        aliases.insert(
            CostOfRevenue,
            add(&["CostOfGoodsAndServicesSold", "CostRevenue"]),
        );
        aliases.insert(
            ResearchAndDevelopment,
            add(&["ResearchAndDevelopmentExpense"]),
        );
        aliases.insert(
            SellingGeneralAdministrative,
            add(&[
                "SellingGeneralAndAdministrativeExpense",
                "GeneralAndAdministrativeExpense",
            ]),
        );
        aliases.insert(SellingMarketing, add(&["SellingAndMarketingExpense"]));
        aliases.insert(
            Restructuring,
            add(&["RestructuringAndOtherExpenses", "RestructuringCharges"]),
        );
        aliases.insert(
            OperatingExpenses,
            add(&["OperatingExpenses", "CostsAndExpenses"]),
        );
        aliases.insert(OperatingIncome, add(&["OperatingIncomeLoss"]));
        aliases.insert(
            InterestNet,
            vec![
                AliasTag::add("InterestIncomeExpenseNonoperatingNet"),
                AliasTag::add("InvestmentIncomeInterest"),
                AliasTag::subtract("InterestExpense"),
                AliasTag::add("InvestmentIncomeNonoperating"),
            ],
        );
        aliases.insert(
            OtherNonOperating,
            add(&[
                "NonoperatingIncomeExpense",
                "OtherNonoperatingIncomeExpense",
            ]),
        );
        aliases.insert(Taxes, add(&["IncomeTaxExpenseBenefit"]));
        aliases.insert(NetIncome, add(&["NetIncomeLoss"]));
        aliases.insert(
            SharesBasic,
            add(&["WeightedAverageNumberOfSharesOutstandingBasic"]),
        );
        aliases.insert(EpsBasic, add(&["EarningsPerShareBasic"]));
        aliases.insert(EpsDiluted, add(&["EarningsPerShareDiluted"]));
        aliases.insert(
            Cash,
            add(&[
                "CashAndCashEquivalentsAtCarryingValue",
                "ShortTermInvestments",
            ]),
        );
        aliases.insert(Debt, add(&["LongTermDebtCurrent", "LongTermDebtNoncurrent"]));

        Self { aliases }
    }

    pub fn aliases(&self, item: CanonicalLineItem) -> &[AliasTag] {
        self.aliases.get(&item).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn with_aliases(mut self, item: CanonicalLineItem, tags: Vec<AliasTag>) -> Self {
        self.aliases.insert(item, tags);
        self
    }

    /// Every canonical line item must map to at least one named tag.
    pub fn validate(&self) -> Result<()> {
        for item in CanonicalLineItem::ALL {
            let tags = self.aliases(item);
            if tags.is_empty() {
                return Err(DcfModelError::InvalidConfig(format!(
                    "No disclosure tags configured for {:?}",
                    item
                )));
            }
            if let Some(idx) = tags.iter().position(|a| a.tag.trim().is_empty()) {
                return Err(DcfModelError::InvalidConfig(format!(
                    "Alias #{} of {:?} has an empty tag name",
                    idx, item
                )));
            }
        }
        Ok(())
    }

    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        output.push_str("| Line Item | Statement | Tags |\n");
        output.push_str("|---|---|---|\n");

        for (item, tags) in &self.aliases {
            let rendered: Vec<String> = tags
                .iter()
                .map(|a| match a.sign {
                    Sign::Add => format!("+{}", a.tag),
                    Sign::Subtract => format!("-{}", a.tag),
                })
                .collect();
            output.push_str(&format!(
                "| {:?} | {:?} | {} |\n",
                item,
                item.statement(),
                rendered.join(", ")
            ));
        }

        output
    }
}
