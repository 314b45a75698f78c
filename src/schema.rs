use crate::error::Result;
use chrono::NaiveDate;
use log::debug;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Reporting period of a single disclosed fact.
///
/// Income-statement facts cover a duration; balance-sheet facts are reported
/// as of an instant. Both expose an end date used for period matching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Period {
    Duration {
        #[serde(rename = "startDate")]
        start_date: NaiveDate,
        #[serde(rename = "endDate")]
        end_date: NaiveDate,
    },
    Instant { instant: NaiveDate },
}

impl Period {
    pub fn end_date(&self) -> NaiveDate {
        match self {
            Period::Duration { end_date, .. } => *end_date,
            Period::Instant { instant } => *instant,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub period: Period,
    /// Raw disclosed value. Parsed on demand so that a malformed number is
    /// reported against the tag that carried it.
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    #[serde(rename = "unitRef", default, skip_serializing_if = "Option::is_none")]
    pub unit_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimals: Option<Value>,
    /// Dimensional qualifier. Facts carrying one are breakdowns, not totals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment: Option<Value>,
}

impl Fact {
    pub fn duration(start_date: NaiveDate, end_date: NaiveDate, value: impl Into<String>) -> Self {
        Self {
            period: Period::Duration {
                start_date,
                end_date,
            },
            value: value.into(),
            unit_ref: None,
            decimals: None,
            segment: None,
        }
    }

    pub fn instant(instant: NaiveDate, value: impl Into<String>) -> Self {
        Self {
            period: Period::Instant { instant },
            value: value.into(),
            unit_ref: None,
            decimals: None,
            segment: None,
        }
    }

    pub fn end_date(&self) -> NaiveDate {
        self.period.end_date()
    }

    pub fn is_dimensional(&self) -> bool {
        self.segment.is_some()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or number fact value, got {}",
            other
        ))),
    }
}

/// All facts disclosed under one tag, in document order.
pub type FactSeries = Vec<Fact>;

/// Tag name to fact series for one statement section.
pub type StatementFacts = BTreeMap<String, FactSeries>;

/// One structured filing as handed over by the retrieval collaborator.
/// The core only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filing {
    pub id: String,
    pub url: String,
    pub form_type: String,
    pub filed_at: NaiveDate,
    pub statements: BTreeMap<String, StatementFacts>,
}

impl Filing {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        form_type: impl Into<String>,
        filed_at: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            form_type: form_type.into(),
            filed_at,
            statements: BTreeMap::new(),
        }
    }

    pub fn with_fact_series(
        mut self,
        statement: impl Into<String>,
        tag: impl Into<String>,
        series: FactSeries,
    ) -> Self {
        self.statements
            .entry(statement.into())
            .or_default()
            .insert(tag.into(), series);
        self
    }

    pub fn statement(&self, name: &str) -> Option<&StatementFacts> {
        self.statements.get(name)
    }

    pub fn fact_series(&self, statement: &str, tag: &str) -> Option<&FactSeries> {
        self.statement(statement).and_then(|facts| facts.get(tag))
    }

    /// Builds a filing from an XBRL-to-JSON document of the shape
    /// `{"StatementsOfIncome": {"Revenues": [fact, ...]}, ...}`.
    ///
    /// Top-level entries that are not statement objects, and statement entries
    /// that are not fact arrays, are ignored. Fact arrays are parsed strictly.
    pub fn from_xbrl_json(
        id: impl Into<String>,
        url: impl Into<String>,
        form_type: impl Into<String>,
        filed_at: NaiveDate,
        json: &str,
    ) -> Result<Self> {
        let root: serde_json::Map<String, Value> = serde_json::from_str(json)?;
        let mut filing = Self::new(id, url, form_type, filed_at);

        for (statement_name, section) in root {
            let Value::Object(tags) = section else {
                debug!("Skipping non-statement entry '{}'", statement_name);
                continue;
            };

            let mut statement = StatementFacts::new();
            for (tag, series) in tags {
                if !series.is_array() {
                    continue;
                }
                let facts: FactSeries = serde_json::from_value(series)?;
                statement.insert(tag, facts);
            }

            filing.statements.insert(statement_name, statement);
        }

        debug!(
            "Parsed filing {} with {} statement sections",
            filing.id,
            filing.statements.len()
        );

        Ok(filing)
    }
}

/// Point-in-time market data supplied by the market-data collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub current_price: f64,
    pub beta: f64,
    /// Most recent annual interest expense, used for the cost of debt.
    pub interest_expense: f64,
}
