use crate::aliases::CanonicalLineItem;
use crate::config::ModelConfig;
use crate::error::{DcfModelError, Result};
use crate::period::{AuthoritativePeriod, PeriodSelector};
use crate::resolver::TagResolver;
use crate::schema::Filing;
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Income-statement figures of one filing's authoritative year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalYearRecord {
    pub filing_id: String,
    pub year: i32,
    pub period_end: NaiveDate,
    pub revenue: i64,
    pub cost_of_revenue: i64,
    /// Always `revenue - cost_of_revenue`; never read from a tag.
    pub gross_profit: i64,
    pub research_and_development: i64,
    pub selling_marketing: i64,
    pub general_administrative: i64,
    pub restructuring: i64,
    /// Disclosed total, or the sum of the four expense lines when the
    /// disclosed total is zero or absent.
    pub operating_expenses: i64,
    /// Operating income as disclosed under `OperatingIncomeLoss`. The model
    /// writes [`operating_income`](Self::operating_income) instead; this is
    /// kept for callers reconciling the two.
    pub reported_operating_income: i64,
    pub interest_net: i64,
    pub other_non_operating: i64,
    pub taxes: i64,
    pub net_income: i64,
    pub shares_basic: i64,
    pub eps_basic: f64,
    pub eps_diluted: f64,
}

impl CanonicalYearRecord {
    pub fn operating_income(&self) -> i64 {
        self.gross_profit - self.operating_expenses
    }

    pub fn pretax_income(&self) -> i64 {
        self.operating_income() + self.interest_net + self.other_non_operating
    }
}

/// Balance-sheet figures taken from the most recent filing only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpeningBalance {
    pub filing_id: String,
    pub as_of: NaiveDate,
    pub cash: i64,
    pub debt: i64,
    pub shares_basic: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementHistory {
    pub records: Vec<CanonicalYearRecord>,
    pub opening: OpeningBalance,
}

pub struct StatementBuilder<'a> {
    config: &'a ModelConfig,
    resolver: TagResolver<'a>,
}

impl<'a> StatementBuilder<'a> {
    pub fn new(config: &'a ModelConfig) -> Self {
        Self {
            config,
            resolver: TagResolver::from_config(config),
        }
    }

    /// Selects the period from the first net-income alias the filing discloses.
    pub fn authoritative_period(&self, filing: &Filing) -> Result<AuthoritativePeriod> {
        let section = self
            .config
            .statements
            .name(CanonicalLineItem::NetIncome.statement());

        let series = self
            .config
            .aliases
            .aliases(CanonicalLineItem::NetIncome)
            .iter()
            .find_map(|alias| filing.fact_series(section, &alias.tag))
            .ok_or_else(|| {
                DcfModelError::MissingPeriod(format!(
                    "filing {} discloses no net income series",
                    filing.id
                ))
            })?;

        PeriodSelector::select_authoritative_period(series).map_err(|e| match e {
            DcfModelError::MissingPeriod(details) => DcfModelError::MissingPeriod(format!(
                "filing {}: {}",
                filing.id, details
            )),
            other => other,
        })
    }

    pub fn build(&self, filing: &Filing) -> Result<CanonicalYearRecord> {
        use CanonicalLineItem::*;

        let period = self.authoritative_period(filing)?;
        let end = period.period_end;
        debug!(
            "Filing {}: authoritative year {} (period ending {})",
            filing.id, period.year, end
        );

        let dollars = |item| self.resolver.resolve::<i64>(item, filing, end);
        let per_share = |item| self.resolver.resolve::<f64>(item, filing, end);

        let revenue = dollars(Revenue)?;
        let cost_of_revenue = dollars(CostOfRevenue)?;
        let research_and_development = dollars(ResearchAndDevelopment)?;
        let selling_marketing = dollars(SellingMarketing)?;
        let general_administrative = dollars(SellingGeneralAdministrative)?;
        let restructuring = dollars(Restructuring)?;

        let overflow = |item: &str| DcfModelError::Overflow {
            filing: filing.id.clone(),
            item: item.to_string(),
        };

        let gross_profit = revenue
            .checked_sub(cost_of_revenue)
            .ok_or_else(|| overflow("GrossProfit"))?;

        let mut operating_expenses = dollars(OperatingExpenses)?;
        if operating_expenses == 0 {
            operating_expenses = [general_administrative, selling_marketing, restructuring]
                .into_iter()
                .try_fold(research_and_development, i64::checked_add)
                .ok_or_else(|| overflow("OperatingExpenses"))?;
            debug!(
                "Filing {}: no operating expense total, using sum of expense lines ({})",
                filing.id, operating_expenses
            );
        }

        let interest_net = dollars(InterestNet)?;
        let other_non_operating = dollars(OtherNonOperating)?;

        // operating_income() and pretax_income() rely on these staying in range
        gross_profit
            .checked_sub(operating_expenses)
            .and_then(|v| v.checked_add(interest_net))
            .and_then(|v| v.checked_add(other_non_operating))
            .ok_or_else(|| overflow("PretaxIncome"))?;

        Ok(CanonicalYearRecord {
            filing_id: filing.id.clone(),
            year: period.year,
            period_end: end,
            revenue,
            cost_of_revenue,
            gross_profit,
            research_and_development,
            selling_marketing,
            general_administrative,
            restructuring,
            operating_expenses,
            reported_operating_income: dollars(OperatingIncome)?,
            interest_net,
            other_non_operating,
            taxes: dollars(Taxes)?,
            net_income: dollars(NetIncome)?,
            shares_basic: dollars(SharesBasic)?,
            eps_basic: per_share(EpsBasic)?,
            eps_diluted: per_share(EpsDiluted)?,
        })
    }

    pub fn build_opening_balance(&self, filing: &Filing) -> Result<OpeningBalance> {
        let period = self.authoritative_period(filing)?;
        let end = period.period_end;

        Ok(OpeningBalance {
            filing_id: filing.id.clone(),
            as_of: end,
            cash: self.resolver.resolve(CanonicalLineItem::Cash, filing, end)?,
            debt: self.resolver.resolve(CanonicalLineItem::Debt, filing, end)?,
            shares_basic: self
                .resolver
                .resolve(CanonicalLineItem::SharesBasic, filing, end)?,
        })
    }

    /// Builds one record per annual filing, in input order, plus the opening
    /// balance of the filing with the latest filing date.
    pub fn build_all(&self, filings: &[Filing]) -> Result<StatementHistory> {
        let annual: Vec<&Filing> = filings
            .iter()
            .filter(|f| {
                let keep = self.config.is_annual_form(&f.form_type);
                if !keep {
                    debug!("Skipping filing {} with form type {}", f.id, f.form_type);
                }
                keep
            })
            .collect();

        // max_by_key keeps the last of equal dates
        let latest = annual
            .iter()
            .max_by_key(|f| f.filed_at)
            .ok_or(DcfModelError::NoFilings)?;

        let records = annual
            .iter()
            .map(|f| self.build(f))
            .collect::<Result<Vec<_>>>()?;

        let opening = self.build_opening_balance(latest)?;
        debug!(
            "Opening balance taken from filing {} filed {}",
            latest.id, latest.filed_at
        );

        info!(
            "Built {} year records ({}..{})",
            records.len(),
            records.first().map(|r| r.year).unwrap_or_default(),
            records.last().map(|r| r.year).unwrap_or_default()
        );

        Ok(StatementHistory { records, opening })
    }
}
