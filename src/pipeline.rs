//! The explicit pipeline context object (spec §9, Design Notes: "replace
//! [the monolithic session] with an explicit pipeline context object").
//!
//! Every engine call takes one of these by `&mut` reference instead of
//! reading ambient mutable state, so trace steps never leak between calls
//! the way the Python source's `AgendaGenerationService._trace_steps` did.

use chrono::{DateTime, Utc};

use crate::domain::rules::RuleConstraints;
use crate::domain::sector::SectorOperationalParameters;
use crate::domain::trace::TraceSink;
use crate::ids::SectorId;

pub struct PipelineContext<'a> {
    pub sector_id: SectorId,
    pub as_of: DateTime<Utc>,
    pub rule_snapshot: RuleConstraints,
    pub params: SectorOperationalParameters,
    /// Read once from the MANDATORY SYSTEM `INTERMITTENT_MODE` rule at
    /// context construction time (spec §9, Open Question: "surface 'mode'
    /// as part of the pipeline context").
    pub intermittent_mode: bool,
    pub trace: TraceSink<'a>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(sector_id: SectorId, as_of: DateTime<Utc>, rule_snapshot: RuleConstraints, params: SectorOperationalParameters, trace: TraceSink<'a>) -> Self {
        let intermittent_mode = rule_snapshot.intermittent_mode;
        Self { sector_id, as_of, rule_snapshot, params, intermittent_mode, trace }
    }
}
