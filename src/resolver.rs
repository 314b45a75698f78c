use crate::aliases::{CanonicalLineItem, Sign, TagAliasTable};
use crate::config::{ModelConfig, StatementNames};
use crate::error::{DcfModelError, Result};
use crate::schema::{Fact, Filing};
use chrono::NaiveDate;

/// Numeric representation a disclosed value is parsed into.
pub trait FactNumber: Copy + Default {
    const EXPECTED: &'static str;

    fn parse_fact(raw: &str) -> Option<Self>;

    /// `None` when the result leaves the representable range.
    fn accumulate(self, value: Self, sign: Sign) -> Option<Self>;
}

impl FactNumber for i64 {
    const EXPECTED: &'static str = "an integer";

    /// Accepts whole-valued decimals such as `15000000000.0` or `1.5e10`.
    fn parse_fact(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(v) = raw.parse() {
            return Some(v);
        }
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .filter(|v| *v >= i64::MIN as f64 && *v < i64::MAX as f64)
            .map(|v| v as i64)
    }

    fn accumulate(self, value: Self, sign: Sign) -> Option<Self> {
        match sign {
            Sign::Add => self.checked_add(value),
            Sign::Subtract => self.checked_sub(value),
        }
    }
}

impl FactNumber for f64 {
    const EXPECTED: &'static str = "a decimal number";

    fn parse_fact(raw: &str) -> Option<Self> {
        raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    fn accumulate(self, value: Self, sign: Sign) -> Option<Self> {
        let total = match sign {
            Sign::Add => self + value,
            Sign::Subtract => self - value,
        };
        Some(total).filter(|t| t.is_finite())
    }
}

/// First consolidated (non-dimensional) fact ending on `period_end`.
pub fn fact_for_period(series: &[Fact], period_end: NaiveDate) -> Option<&Fact> {
    series
        .iter()
        .find(|f| !f.is_dimensional() && f.end_date() == period_end)
}

pub struct TagResolver<'a> {
    aliases: &'a TagAliasTable,
    statements: &'a StatementNames,
}

impl<'a> TagResolver<'a> {
    pub fn new(aliases: &'a TagAliasTable, statements: &'a StatementNames) -> Self {
        Self {
            aliases,
            statements,
        }
    }

    pub fn from_config(config: &'a ModelConfig) -> Self {
        Self::new(&config.aliases, &config.statements)
    }

    /// Signed sum of every alias tag disclosed for `period_end`.
    ///
    /// A tag with no fact for the period contributes zero. A fact whose value
    /// does not parse as `T` is an error.
    pub fn resolve<T: FactNumber>(
        &self,
        item: CanonicalLineItem,
        filing: &Filing,
        period_end: NaiveDate,
    ) -> Result<T> {
        let section = self.statements.name(item.statement());
        let Some(facts) = filing.statement(section) else {
            return Ok(T::default());
        };

        let mut total = T::default();
        for alias in self.aliases.aliases(item) {
            let Some(fact) = facts
                .get(&alias.tag)
                .and_then(|series| fact_for_period(series, period_end))
            else {
                continue;
            };

            let value =
                T::parse_fact(&fact.value).ok_or_else(|| DcfModelError::MalformedValue {
                    tag: alias.tag.clone(),
                    value: fact.value.clone(),
                    expected: T::EXPECTED,
                })?;

            total = total
                .accumulate(value, alias.sign)
                .ok_or_else(|| DcfModelError::Overflow {
                    filing: filing.id.clone(),
                    item: format!("{:?}", item),
                })?;
        }

        Ok(total)
    }
}
