//! Budget distribution across periods.

use chrono::NaiveDate;
use meridian_shared::config::EngineConfig;
use meridian_shared::types::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::AllocationUtil;
use crate::schedule::error::ScheduleError;
use crate::schedule::period::{Period, PeriodGranularity};

/// One period's share of a time-phased budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimePhasedEntry {
    /// The period.
    pub period: Period,
    /// Budget falling in this period.
    pub period_budget: Decimal,
    /// Budget through the end of this period.
    pub cumulative_budget: Decimal,
}

/// How a total is spread over periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", content = "amounts", rename_all = "snake_case")]
pub enum DistributionMethod {
    /// Equal amount per period, remainder in the last period.
    Linear,
    /// Slow start, fast middle, slow finish.
    #[serde(rename = "s_curve")]
    SCurve,
    /// Caller-supplied amount per period, used as given.
    Manual(Vec<Decimal>),
}

/// Input to `TimePhasedBudgetDistributor::distribute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRequest {
    /// Amount to distribute.
    pub total: Decimal,
    /// First day of the distribution.
    pub start: NaiveDate,
    /// Last day of the distribution.
    pub end: NaiveDate,
    /// Distribution method.
    pub method: DistributionMethod,
    /// Period size; the distributor's default when absent.
    #[serde(default)]
    pub granularity: Option<PeriodGranularity>,
    /// Currency, which fixes the minor unit.
    pub currency: Currency,
}

/// Spreads budgets across calendar periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimePhasedBudgetDistributor {
    default_granularity: PeriodGranularity,
    manual_tolerance_units: u32,
}

impl Default for TimePhasedBudgetDistributor {
    fn default() -> Self {
        Self {
            default_granularity: PeriodGranularity::Monthly,
            manual_tolerance_units: 1,
        }
    }
}

impl TimePhasedBudgetDistributor {
    /// Creates a distributor with an explicit default granularity and
    /// manual tolerance (in minor units).
    #[must_use]
    pub const fn new(default_granularity: PeriodGranularity, manual_tolerance_units: u32) -> Self {
        Self {
            default_granularity,
            manual_tolerance_units,
        }
    }

    /// Creates a distributor from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Result<Self, ScheduleError> {
        let granularity = PeriodGranularity::parse(&config.default_granularity)
            .ok_or_else(|| ScheduleError::UnknownGranularity(config.default_granularity.clone()))?;
        Ok(Self::new(granularity, config.manual_tolerance_units))
    }

    /// Granularity used when a request does not name one.
    #[must_use]
    pub const fn default_granularity(&self) -> PeriodGranularity {
        self.default_granularity
    }

    /// Periods covering `[start, end]` at `granularity`, edges clipped.
    pub fn periods(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        granularity: Option<PeriodGranularity>,
    ) -> Result<Vec<Period>, ScheduleError> {
        Period::split(start, end, granularity.unwrap_or(self.default_granularity))
    }

    /// Distributes `request.total` across every period in range.
    ///
    /// The period budgets of the result always sum to the total: exactly
    /// for `Linear` and `SCurve`, and within the manual tolerance for
    /// `Manual`, whose amounts are never rebalanced.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError` if the range is inverted, the total is
    /// negative or finer than the currency's minor unit, or a manual
    /// distribution does not match the periods or the total.
    pub fn distribute(&self, request: &DistributionRequest) -> Result<Vec<TimePhasedEntry>, ScheduleError> {
        let DistributionRequest {
            total,
            start,
            end,
            currency,
            ..
        } = *request;

        if total.is_sign_negative() && !total.is_zero() {
            return Err(ScheduleError::NegativeTotal(total));
        }
        if currency.round(total) != total {
            return Err(ScheduleError::SubMinorUnitTotal { total, currency });
        }

        let periods = self.periods(start, end, request.granularity)?;
        let decimal_places = currency.minor_units();

        let amounts = match &request.method {
            DistributionMethod::Linear => {
                AllocationUtil::allocate_linear(total, periods.len(), decimal_places)
            }
            DistributionMethod::SCurve => {
                let fractions = s_curve_fractions(start, end, &periods);
                AllocationUtil::allocate_cumulative(total, &fractions, decimal_places)
            }
            DistributionMethod::Manual(amounts) => {
                self.check_manual(amounts, periods.len(), total, currency)?;
                amounts.clone()
            }
        };

        build_entries(&periods, &amounts)
    }

    /// Checks that `entries` sum to `total` within the manual tolerance.
    pub fn validate_entries(
        &self,
        entries: &[TimePhasedEntry],
        total: Decimal,
        currency: Currency,
    ) -> Result<(), ScheduleError> {
        let mut sum = Decimal::ZERO;
        for (index, entry) in entries.iter().enumerate() {
            if entry.period_budget.is_sign_negative() && !entry.period_budget.is_zero() {
                return Err(ScheduleError::NegativePeriodAmount {
                    index,
                    amount: entry.period_budget,
                });
            }
            sum = sum
                .checked_add(entry.period_budget)
                .ok_or(ScheduleError::Overflow)?;
        }
        self.check_sum(sum, total, currency)
    }

    /// Cumulative budget of every period that ends on or before `date`.
    ///
    /// A period still in progress at `date` contributes nothing.
    #[must_use]
    pub fn cumulative_at(entries: &[TimePhasedEntry], date: NaiveDate) -> Decimal {
        entries
            .iter()
            .take_while(|e| e.period.end <= date)
            .last()
            .map_or(Decimal::ZERO, |e| e.cumulative_budget)
    }

    fn check_manual(
        &self,
        amounts: &[Decimal],
        period_count: usize,
        total: Decimal,
        currency: Currency,
    ) -> Result<(), ScheduleError> {
        if amounts.len() != period_count {
            return Err(ScheduleError::PeriodCountMismatch {
                expected: period_count,
                got: amounts.len(),
            });
        }

        let mut sum = Decimal::ZERO;
        for (index, amount) in amounts.iter().enumerate() {
            if amount.is_sign_negative() && !amount.is_zero() {
                return Err(ScheduleError::NegativePeriodAmount {
                    index,
                    amount: *amount,
                });
            }
            sum = sum.checked_add(*amount).ok_or(ScheduleError::Overflow)?;
        }
        self.check_sum(sum, total, currency)
    }

    fn check_sum(&self, sum: Decimal, total: Decimal, currency: Currency) -> Result<(), ScheduleError> {
        let tolerance = currency.minor_unit() * Decimal::from(self.manual_tolerance_units);
        if (sum - total).abs() > tolerance {
            return Err(ScheduleError::SumMismatch { sum, total });
        }
        Ok(())
    }
}

/// Cumulative share reached at each period end on the curve
/// `F(x) = 3x^2 - 2x^3`, where `x` is the elapsed fraction of days.
fn s_curve_fractions(start: NaiveDate, end: NaiveDate, periods: &[Period]) -> Vec<Decimal> {
    let total_days = Decimal::from((end - start).num_days() + 1);
    let three = Decimal::from(3);
    let two = Decimal::TWO;

    periods
        .iter()
        .map(|p| {
            let elapsed = Decimal::from((p.end - start).num_days() + 1);
            let x = elapsed / total_days;
            x * x * (three - two * x)
        })
        .collect()
}

fn build_entries(periods: &[Period], amounts: &[Decimal]) -> Result<Vec<TimePhasedEntry>, ScheduleError> {
    let mut cumulative = Decimal::ZERO;
    periods
        .iter()
        .zip(amounts)
        .map(|(period, amount)| {
            cumulative = cumulative.checked_add(*amount).ok_or(ScheduleError::Overflow)?;
            Ok(TimePhasedEntry {
                period: *period,
                period_budget: *amount,
                cumulative_budget: cumulative,
            })
        })
        .collect()
}
