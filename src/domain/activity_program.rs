use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ActivityId, SectorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramWeekStatus {
    Draft,
    Locked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramItemSource {
    Constant,
    Variable,
    Recurring,
    Eventual,
}

/// Per-week activity program (SPEC_FULL §3 supplement) the Demand Engine
/// reads `minutes_constant` from and the Agenda Engine reads its pool of
/// CONSTANT/RECURRING/EVENTUAL items from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityProgramWeek {
    pub sector_id: SectorId,
    pub week_start: NaiveDate,
    pub status: ProgramWeekStatus,
}

impl ActivityProgramWeek {
    /// A LOCKED program week is immutable; mutation attempts raise a
    /// `ConflictError` (SPEC_FULL §3 supplement).
    pub fn can_mutate(&self) -> bool {
        self.status == ProgramWeekStatus::Draft
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityProgramItem {
    pub activity_id: ActivityId,
    pub target_date: NaiveDate,
    pub source: ProgramItemSource,
    pub minutes: f64,
}
