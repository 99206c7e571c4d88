//! Earned value metric calculation.
//!
//! All arithmetic is exact decimal arithmetic; nothing is rounded here.
//! Rounding to a currency's minor unit happens only when a total is split
//! into periods (see `schedule`).

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::evm::error::EvmError;

/// Index threshold at or above which cost and schedule count as on track.
pub const ON_TRACK_THRESHOLD: Decimal = Decimal::from_parts(95, 0, 0, false, 2);

/// The four base measures of earned value, in one currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmValues {
    /// Planned value: budgeted cost of work scheduled to date.
    pub pv: Decimal,
    /// Earned value: budgeted cost of work performed to date.
    pub ev: Decimal,
    /// Actual cost of work performed to date.
    pub ac: Decimal,
    /// Budget at completion.
    pub bac: Decimal,
}

impl EvmValues {
    /// All measures zero.
    pub const ZERO: Self = Self {
        pv: Decimal::ZERO,
        ev: Decimal::ZERO,
        ac: Decimal::ZERO,
        bac: Decimal::ZERO,
    };

    /// Builds a validated set of measures.
    pub fn new(pv: Decimal, ev: Decimal, ac: Decimal, bac: Decimal) -> Result<Self, EvmError> {
        let values = Self { pv, ev, ac, bac };
        values.validate()?;
        Ok(values)
    }

    /// Rejects any negative measure.
    pub fn validate(&self) -> Result<(), EvmError> {
        for (field, value) in [
            ("PV", self.pv),
            ("EV", self.ev),
            ("AC", self.ac),
            ("BAC", self.bac),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(EvmError::NegativeValue { field, value });
            }
        }
        Ok(())
    }

    /// Field-wise sum of two sets of measures.
    pub fn checked_add(&self, other: &Self) -> Result<Self, EvmError> {
        Ok(Self {
            pv: self.pv.checked_add(other.pv).ok_or(EvmError::Overflow("PV"))?,
            ev: self.ev.checked_add(other.ev).ok_or(EvmError::Overflow("EV"))?,
            ac: self.ac.checked_add(other.ac).ok_or(EvmError::Overflow("AC"))?,
            bac: self
                .bac
                .checked_add(other.bac)
                .ok_or(EvmError::Overflow("BAC"))?,
        })
    }
}

/// A cost or schedule performance index.
///
/// When the denominator is zero there is nothing to measure yet. The index
/// is then `NotAssessable`, which reads as 1.0 wherever a number is needed.
/// This keeps "no data" distinguishable from "exactly on plan" for callers
/// that care, while dashboards keep seeing the long-standing 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PerformanceIndex {
    /// Ratio computed from a positive denominator.
    Measured(Decimal),
    /// Denominator was zero.
    NotAssessable,
}

impl PerformanceIndex {
    /// Numeric value; `NotAssessable` reads as 1.0.
    #[must_use]
    pub const fn value(self) -> Decimal {
        match self {
            Self::Measured(v) => v,
            Self::NotAssessable => Decimal::ONE,
        }
    }

    /// Returns true if the index was actually measured.
    #[must_use]
    pub const fn is_measured(self) -> bool {
        matches!(self, Self::Measured(_))
    }
}

/// To-complete performance index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToCompleteIndex {
    /// Efficiency required on remaining work to finish within BAC.
    Required(Decimal),
    /// Actual cost already meets or exceeds BAC.
    Infeasible,
}

impl ToCompleteIndex {
    /// Numeric value, or `None` when finishing within BAC is infeasible.
    #[must_use]
    pub const fn value(self) -> Option<Decimal> {
        match self {
            Self::Required(v) => Some(v),
            Self::Infeasible => None,
        }
    }
}

/// Overall performance classification of a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceStatus {
    /// Both indices at or above the threshold and no negative variance.
    OnTrack,
    /// One variance negative, or an index below the threshold.
    AtRisk,
    /// Both cost and schedule variance negative.
    Critical,
}

impl PerformanceStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::AtRisk => "at_risk",
            Self::Critical => "critical",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "on_track" => Some(Self::OnTrack),
            "at_risk" => Some(Self::AtRisk),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for PerformanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics derived from one set of `EvmValues`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvmMetrics {
    /// Cost variance, EV - AC.
    pub cv: Decimal,
    /// Schedule variance, EV - PV.
    pub sv: Decimal,
    /// Cost performance index, EV / AC.
    pub cpi: PerformanceIndex,
    /// Schedule performance index, EV / PV.
    pub spi: PerformanceIndex,
    /// Estimate at completion, BAC / CPI.
    pub eac: Decimal,
    /// Estimate to complete, EAC - AC.
    pub etc: Decimal,
    /// To-complete performance index, (BAC - EV) / (BAC - AC).
    pub tcpi: ToCompleteIndex,
    /// Variance at completion, BAC - EAC.
    pub vac: Decimal,
    /// Performance classification.
    pub status: PerformanceStatus,
}

/// Stateless earned value calculator.
pub struct EvmCalculator;

impl EvmCalculator {
    /// Computes every derived metric for `values`.
    ///
    /// # Errors
    ///
    /// * `EvmError::NegativeValue` if any input is negative
    /// * `EvmError::Overflow` if a derived value does not fit in a decimal
    pub fn calculate(values: &EvmValues) -> Result<EvmMetrics, EvmError> {
        values.validate()?;
        let EvmValues { pv, ev, ac, bac } = *values;

        let cv = ev.checked_sub(ac).ok_or(EvmError::Overflow("CV"))?;
        let sv = ev.checked_sub(pv).ok_or(EvmError::Overflow("SV"))?;
        let cpi = Self::index(ev, ac, "CPI")?;
        let spi = Self::index(ev, pv, "SPI")?;

        let eac = if cpi.value() > Decimal::ZERO {
            bac.checked_div(cpi.value())
                .ok_or(EvmError::Overflow("EAC"))?
        } else {
            bac
        };
        let etc = eac.checked_sub(ac).ok_or(EvmError::Overflow("ETC"))?;

        let remaining_budget = bac.checked_sub(ac).ok_or(EvmError::Overflow("TCPI"))?;
        let tcpi = if remaining_budget > Decimal::ZERO {
            let remaining_work = bac.checked_sub(ev).ok_or(EvmError::Overflow("TCPI"))?;
            ToCompleteIndex::Required(
                remaining_work
                    .checked_div(remaining_budget)
                    .ok_or(EvmError::Overflow("TCPI"))?,
            )
        } else {
            ToCompleteIndex::Infeasible
        };

        let vac = bac.checked_sub(eac).ok_or(EvmError::Overflow("VAC"))?;

        Ok(EvmMetrics {
            cv,
            sv,
            cpi,
            spi,
            eac,
            etc,
            tcpi,
            vac,
            status: Self::classify(cv, sv, cpi, spi),
        })
    }

    /// Classifies performance. Rules are checked in order; the first match
    /// wins:
    ///
    /// 1. CV < 0 and SV < 0: `Critical`
    /// 2. CV < 0 or SV < 0: `AtRisk`
    /// 3. CPI >= 0.95 and SPI >= 0.95: `OnTrack`
    /// 4. otherwise `AtRisk`
    #[must_use]
    pub fn classify(
        cv: Decimal,
        sv: Decimal,
        cpi: PerformanceIndex,
        spi: PerformanceIndex,
    ) -> PerformanceStatus {
        let cost_behind = cv < Decimal::ZERO;
        let schedule_behind = sv < Decimal::ZERO;

        if cost_behind && schedule_behind {
            PerformanceStatus::Critical
        } else if cost_behind || schedule_behind {
            PerformanceStatus::AtRisk
        } else if cpi.value() >= ON_TRACK_THRESHOLD && spi.value() >= ON_TRACK_THRESHOLD {
            PerformanceStatus::OnTrack
        } else {
            PerformanceStatus::AtRisk
        }
    }

    fn index(
        numerator: Decimal,
        denominator: Decimal,
        name: &'static str,
    ) -> Result<PerformanceIndex, EvmError> {
        if denominator > Decimal::ZERO {
            numerator
                .checked_div(denominator)
                .map(PerformanceIndex::Measured)
                .ok_or(EvmError::Overflow(name))
        } else {
            Ok(PerformanceIndex::NotAssessable)
        }
    }
}
