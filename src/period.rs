use crate::error::{DcfModelError, Result};
use crate::schema::Fact;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// The fiscal year a filing reports on, pinned to the one fact that
/// represents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthoritativePeriod {
    pub year: i32,
    pub period_end: NaiveDate,
    /// Position of the chosen fact in the series it was selected from.
    pub fact_index: usize,
}

pub struct PeriodSelector;

impl PeriodSelector {
    /// Latest year among the period end dates of the consolidated facts in
    /// `series`. Dimensional breakdowns are not considered.
    pub fn authoritative_year(series: &[Fact]) -> Option<i32> {
        series
            .iter()
            .filter(|f| !f.is_dimensional())
            .map(|f| f.end_date().year())
            .max()
    }

    /// Picks the latest year and the first consolidated fact reporting it.
    /// Later facts for the same year (restatements, duplicates) are ignored.
    pub fn select_authoritative_period(series: &[Fact]) -> Result<AuthoritativePeriod> {
        let year = Self::authoritative_year(series).ok_or_else(|| {
            DcfModelError::MissingPeriod("fact series has no consolidated facts".to_string())
        })?;

        series
            .iter()
            .enumerate()
            .find(|(_, f)| !f.is_dimensional() && f.end_date().year() == year)
            .map(|(fact_index, f)| AuthoritativePeriod {
                year,
                period_end: f.end_date(),
                fact_index,
            })
            .ok_or_else(|| DcfModelError::MissingPeriod(format!("no fact for year {}", year)))
    }
}
