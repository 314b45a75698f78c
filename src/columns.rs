use crate::config::{ModelConfig, FORECAST_HORIZON};
use crate::error::{DcfModelError, Result};
use crate::statement::CanonicalYearRecord;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest label accepted by [`ColumnIndex::from_label`]. Seven letters
/// already exceed `u32` positions.
const MAX_LABEL_LEN: usize = 6;

/// Zero-based worksheet column position with a spreadsheet-style label
/// (`0 -> A`, `25 -> Z`, `26 -> AA`, `16383 -> XFD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ColumnIndex(u32);

impl ColumnIndex {
    pub fn new(position: u32) -> Self {
        Self(position)
    }

    pub fn position(self) -> u32 {
        self.0
    }

    /// Bijective base-26 encoding of `position + 1`.
    pub fn label(self) -> String {
        let mut n = self.0 as u64 + 1;
        let mut letters = Vec::new();
        while n > 0 {
            let rem = ((n - 1) % 26) as u8;
            letters.push((b'A' + rem) as char);
            n = (n - 1) / 26;
        }
        letters.iter().rev().collect()
    }

    pub fn from_label(label: &str) -> Result<Self> {
        let trimmed = label.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_LABEL_LEN {
            return Err(DcfModelError::InvalidColumnLabel(label.to_string()));
        }

        let mut n: u64 = 0;
        for c in trimmed.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(DcfModelError::InvalidColumnLabel(label.to_string()));
            }
            let digit = (c.to_ascii_uppercase() as u8 - b'A') as u64 + 1;
            n = n * 26 + digit;
        }

        u32::try_from(n - 1)
            .map(Self)
            .map_err(|_| DcfModelError::InvalidColumnLabel(label.to_string()))
    }

    pub fn offset(self, by: u32) -> Option<Self> {
        self.0.checked_add(by).map(Self)
    }

    pub fn previous(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl fmt::Display for ColumnIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl From<ColumnIndex> for String {
    fn from(column: ColumnIndex) -> Self {
        column.label()
    }
}

impl TryFrom<String> for ColumnIndex {
    type Error = DcfModelError;

    fn try_from(label: String) -> Result<Self> {
        Self::from_label(&label)
    }
}

/// Column assignment for one model: historical years left to right, then the
/// forecast horizon, then the terminal-value column.
///
/// Deserialized plans are re-checked against what [`ColumnAllocator`] would
/// produce for the same years and base column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawColumnPlan")]
pub struct ColumnPlan {
    historical: Vec<(i32, ColumnIndex)>,
    forecast: Vec<ColumnIndex>,
    terminal: ColumnIndex,
}

#[derive(Deserialize)]
struct RawColumnPlan {
    historical: Vec<(i32, ColumnIndex)>,
    forecast: Vec<ColumnIndex>,
    terminal: ColumnIndex,
}

impl TryFrom<RawColumnPlan> for ColumnPlan {
    type Error = DcfModelError;

    fn try_from(raw: RawColumnPlan) -> Result<Self> {
        let base = raw
            .historical
            .first()
            .map(|(_, c)| *c)
            .ok_or_else(|| DcfModelError::PlanMismatch("no historical columns".to_string()))?;
        let years: Vec<i32> = raw.historical.iter().map(|(y, _)| *y).collect();

        let expected = ColumnAllocator::new(base, u32::MAX).allocate_years(&years)?;
        let plan = ColumnPlan {
            historical: raw.historical,
            forecast: raw.forecast,
            terminal: raw.terminal,
        };

        if plan != expected {
            return Err(DcfModelError::PlanMismatch(format!(
                "columns are not contiguous from {} with {} forecast years",
                base, FORECAST_HORIZON
            )));
        }

        Ok(plan)
    }
}

impl ColumnPlan {
    pub fn historical(&self) -> &[(i32, ColumnIndex)] {
        &self.historical
    }

    pub fn column_for_year(&self, year: i32) -> Option<ColumnIndex> {
        self.historical
            .iter()
            .find(|(y, _)| *y == year)
            .map(|(_, c)| *c)
    }

    pub fn forecast(&self) -> &[ColumnIndex] {
        &self.forecast
    }

    pub fn terminal(&self) -> ColumnIndex {
        self.terminal
    }

    pub fn first_historical(&self) -> ColumnIndex {
        self.historical[0].1
    }

    pub fn last_historical(&self) -> ColumnIndex {
        self.historical[self.historical.len() - 1].1
    }

    pub fn last_forecast(&self) -> ColumnIndex {
        self.forecast[self.forecast.len() - 1]
    }

    /// Historical then forecast columns, excluding the terminal column.
    pub fn statement_columns(&self) -> impl Iterator<Item = ColumnIndex> + '_ {
        self.historical
            .iter()
            .map(|(_, c)| *c)
            .chain(self.forecast.iter().copied())
    }

    /// Columns the persistence layer inserts at the base column. The template
    /// already reserves one historical column.
    pub fn inserted_columns(&self) -> usize {
        self.historical.len().saturating_sub(1)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ColumnAllocator {
    base: ColumnIndex,
    max_columns: u32,
}

impl ColumnAllocator {
    pub fn new(base: ColumnIndex, max_columns: u32) -> Self {
        Self { base, max_columns }
    }

    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        Ok(Self::new(config.base_column()?, config.max_columns))
    }

    /// Records must already be sorted oldest first.
    pub fn allocate(&self, records: &[CanonicalYearRecord]) -> Result<ColumnPlan> {
        let years: Vec<i32> = records.iter().map(|r| r.year).collect();
        self.allocate_years(&years)
    }

    pub fn allocate_years(&self, years: &[i32]) -> Result<ColumnPlan> {
        if years.is_empty() {
            return Err(DcfModelError::NoFilings);
        }

        for pair in years.windows(2) {
            if pair[1] <= pair[0] {
                return Err(DcfModelError::YearsOutOfOrder {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }

        let required =
            self.base.position() as u64 + years.len() as u64 + FORECAST_HORIZON as u64 + 1;
        if required > self.max_columns as u64 {
            return Err(DcfModelError::ColumnRangeExceeded {
                required,
                max: self.max_columns,
            });
        }

        // Bounded by the range check above.
        let at = |offset: usize| ColumnIndex(self.base.position() + offset as u32);

        let historical: Vec<(i32, ColumnIndex)> = years
            .iter()
            .enumerate()
            .map(|(i, year)| (*year, at(i)))
            .collect();
        let forecast: Vec<ColumnIndex> = (0..FORECAST_HORIZON)
            .map(|i| at(years.len() + i))
            .collect();
        let terminal = at(years.len() + FORECAST_HORIZON);

        debug!(
            "Allocated {} historical columns {}..{}, forecast {}..{}, terminal {}",
            historical.len(),
            historical[0].1,
            historical[historical.len() - 1].1,
            forecast[0],
            forecast[FORECAST_HORIZON - 1],
            terminal
        );

        Ok(ColumnPlan {
            historical,
            forecast,
            terminal,
        })
    }
}
