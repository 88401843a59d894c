use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConvocationId, EmployeeId, SectorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvocationStatus {
    Pending,
    Accepted,
    Declined,
    Expired,
    Cancelled,
}

impl ConvocationStatus {
    /// A convocation is immutable once it reaches any of these (spec §3,
    /// "Lifecycle rules").
    pub fn is_terminal(self) -> bool {
        !matches!(self, ConvocationStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvocationOrigin {
    Baseline,
    Adjustment,
    Reschedule,
    Manual,
}

/// `(employee, sector, date, start_time, end_time, break_minutes,
/// total_hours, status, origin, sent_at, response_deadline, responded_at,
/// replaced_convocation_id?, replacement_convocation_id?,
/// legal_validation_passed, legal_validation_errors,
/// legal_validation_warnings)` (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Convocation {
    pub employee_id: EmployeeId,
    pub sector_id: SectorId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub break_minutes: i64,
    pub total_hours: f64,
    pub status: ConvocationStatus,
    pub origin: ConvocationOrigin,
    pub sent_at: Option<DateTime<Utc>>,
    pub response_deadline: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
    pub decline_reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub replaced_convocation_id: Option<ConvocationId>,
    pub replacement_convocation_id: Option<ConvocationId>,
    pub legal_validation_passed: bool,
    pub legal_validation_errors: Vec<String>,
    pub legal_validation_warnings: Vec<String>,
}

impl Convocation {
    pub fn is_expired_as_of(&self, now: DateTime<Utc>) -> bool {
        self.status == ConvocationStatus::Pending && self.response_deadline < now
    }
}
