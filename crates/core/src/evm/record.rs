//! EVM records: one set of measures and metrics per scope per data date.

use chrono::{DateTime, NaiveDate, Utc};
use meridian_shared::types::{
    AuditInfo, ControlAccountId, EvmRecordId, ProjectId, UserId, WorkPackageId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::evm::calculator::{EvmCalculator, EvmMetrics, EvmValues, PerformanceStatus};
use crate::evm::error::EvmError;

/// Level of the cost hierarchy an EVM record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "level", content = "id", rename_all = "snake_case")]
pub enum EvmScope {
    /// A single work package.
    WorkPackage(WorkPackageId),
    /// A control account and everything below it.
    ControlAccount(ControlAccountId),
    /// A whole project.
    Project(ProjectId),
}

impl EvmScope {
    /// Returns the level name.
    #[must_use]
    pub const fn level(&self) -> &'static str {
        match self {
            Self::WorkPackage(_) => "work_package",
            Self::ControlAccount(_) => "control_account",
            Self::Project(_) => "project",
        }
    }
}

impl std::fmt::Display for EvmScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WorkPackage(id) => write!(f, "work_package:{id}"),
            Self::ControlAccount(id) => write!(f, "control_account:{id}"),
            Self::Project(id) => write!(f, "project:{id}"),
        }
    }
}

/// Measures and derived metrics for one scope at one data date.
///
/// Once approved or flagged as baseline the record is read-only. Records
/// are never deleted; a later data date supersedes an earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmRecord {
    id: EvmRecordId,
    project_id: ProjectId,
    scope: EvmScope,
    data_date: NaiveDate,
    values: EvmValues,
    metrics: EvmMetrics,
    is_baseline: bool,
    is_approved: bool,
    approved_by: Option<UserId>,
    approved_at: Option<DateTime<Utc>>,
    audit: AuditInfo,
}

impl EvmRecord {
    /// Computes metrics for `values` and wraps them in a new record.
    pub fn new(
        project_id: ProjectId,
        scope: EvmScope,
        data_date: NaiveDate,
        values: EvmValues,
        created_by: UserId,
    ) -> Result<Self, EvmError> {
        let metrics = EvmCalculator::calculate(&values)?;
        Ok(Self {
            id: EvmRecordId::new(),
            project_id,
            scope,
            data_date,
            values,
            metrics,
            is_baseline: false,
            is_approved: false,
            approved_by: None,
            approved_at: None,
            audit: AuditInfo::new(created_by),
        })
    }

    /// Replaces the measures and recomputes every metric.
    ///
    /// Nothing changes if the record is read-only or the new values are
    /// rejected.
    ///
    /// # Errors
    ///
    /// * `EvmError::RecordApproved` / `EvmError::RecordBaselined` if read-only
    /// * any error from `EvmCalculator::calculate`
    pub fn update_values(&mut self, values: EvmValues, updated_by: UserId) -> Result<(), EvmError> {
        self.ensure_writable()?;
        let metrics = EvmCalculator::calculate(&values)?;
        self.values = values;
        self.metrics = metrics;
        self.audit.touch(updated_by);
        Ok(())
    }

    /// Approves the record, making it read-only.
    pub fn approve(&mut self, approved_by: UserId) -> Result<(), EvmError> {
        if self.is_approved {
            return Err(EvmError::RecordApproved(self.id));
        }
        self.is_approved = true;
        self.approved_by = Some(approved_by);
        self.approved_at = Some(Utc::now());
        self.audit.touch(approved_by);
        Ok(())
    }

    /// Returns an error if the record may not be edited.
    pub fn ensure_writable(&self) -> Result<(), EvmError> {
        if self.is_approved {
            Err(EvmError::RecordApproved(self.id))
        } else if self.is_baseline {
            Err(EvmError::RecordBaselined(self.id))
        } else {
            Ok(())
        }
    }

    pub(crate) fn set_baseline_flag(&mut self, is_baseline: bool) {
        self.is_baseline = is_baseline;
    }

    /// Record id.
    #[must_use]
    pub const fn id(&self) -> EvmRecordId {
        self.id
    }

    /// Owning project.
    #[must_use]
    pub const fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// Scope the record describes.
    #[must_use]
    pub const fn scope(&self) -> EvmScope {
        self.scope
    }

    /// Data date of the measures.
    #[must_use]
    pub const fn data_date(&self) -> NaiveDate {
        self.data_date
    }

    /// Base measures.
    #[must_use]
    pub const fn values(&self) -> &EvmValues {
        &self.values
    }

    /// Derived metrics.
    #[must_use]
    pub const fn metrics(&self) -> &EvmMetrics {
        &self.metrics
    }

    /// Whether this is the scope's baseline record.
    #[must_use]
    pub const fn is_baseline(&self) -> bool {
        self.is_baseline
    }

    /// Whether the record has been approved.
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.is_approved
    }

    /// Approver, if approved.
    #[must_use]
    pub const fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    /// Approval time, if approved.
    #[must_use]
    pub const fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    /// Audit information.
    #[must_use]
    pub const fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    /// Flat summary for dashboards and reports.
    #[must_use]
    pub fn summary(&self) -> EvmSummary {
        EvmSummary::from_parts(self.data_date, &self.values, &self.metrics)
    }
}

/// Flat EVM summary consumed by reporting layers.
///
/// Field names are a published contract and serialize exactly as
/// `dataDate, PV, EV, AC, BAC, CV, SV, CPI, SPI, EAC, VAC, status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmSummary {
    /// Data date.
    #[serde(rename = "dataDate")]
    pub data_date: NaiveDate,
    /// Planned value.
    #[serde(rename = "PV")]
    pub pv: Decimal,
    /// Earned value.
    #[serde(rename = "EV")]
    pub ev: Decimal,
    /// Actual cost.
    #[serde(rename = "AC")]
    pub ac: Decimal,
    /// Budget at completion.
    #[serde(rename = "BAC")]
    pub bac: Decimal,
    /// Cost variance.
    #[serde(rename = "CV")]
    pub cv: Decimal,
    /// Schedule variance.
    #[serde(rename = "SV")]
    pub sv: Decimal,
    /// Cost performance index (1.0 when not assessable).
    #[serde(rename = "CPI")]
    pub cpi: Decimal,
    /// Schedule performance index (1.0 when not assessable).
    #[serde(rename = "SPI")]
    pub spi: Decimal,
    /// Estimate at completion.
    #[serde(rename = "EAC")]
    pub eac: Decimal,
    /// Variance at completion.
    #[serde(rename = "VAC")]
    pub vac: Decimal,
    /// Performance status.
    pub status: PerformanceStatus,
}

impl EvmSummary {
    /// Builds a summary from measures and metrics.
    #[must_use]
    pub const fn from_parts(data_date: NaiveDate, values: &EvmValues, metrics: &EvmMetrics) -> Self {
        Self {
            data_date,
            pv: values.pv,
            ev: values.ev,
            ac: values.ac,
            bac: values.bac,
            cv: metrics.cv,
            sv: metrics.sv,
            cpi: metrics.cpi.value(),
            spi: metrics.spi.value(),
            eac: metrics.eac,
            vac: metrics.vac,
            status: metrics.status,
        }
    }
}
