use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AgentRunId, SectorId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunType {
    Forecast,
    Demand,
    Schedule,
    Assignment,
    Agenda,
    Convocations,
    Suggestion,
    FullPipeline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

/// One engine invocation's structured trace (spec §2: "each component
/// records a structured trace... for post-hoc explanation"). Field shape
/// recovered from `original_source/backend/app/models/agent_run.py`
/// (SPEC_FULL §3 supplement) since `spec.md` names the entity without
/// listing its fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRun {
    pub sector_id: SectorId,
    pub week_start: NaiveDate,
    pub run_type: RunType,
    pub status: RunStatus,
    pub inputs_snapshot: serde_json::Value,
    pub outputs_summary: serde_json::Value,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<AgentTraceStep>,
}

impl AgentRun {
    pub fn start(sector_id: SectorId, week_start: NaiveDate, run_type: RunType, now: DateTime<Utc>) -> Self {
        Self {
            sector_id,
            week_start,
            run_type,
            status: RunStatus::Running,
            inputs_snapshot: serde_json::Value::Null,
            outputs_summary: serde_json::Value::Null,
            error_message: None,
            created_at: now,
            finished_at: None,
            steps: Vec::new(),
        }
    }

    pub fn push_step(&mut self, step_key: impl Into<String>, description: impl Into<String>) -> &mut AgentTraceStep {
        let step_order = self.steps.len() as i32;
        self.steps.push(AgentTraceStep {
            step_order,
            step_key: step_key.into(),
            description: description.into(),
            applied_rules: serde_json::Value::Null,
            calculations: serde_json::Value::Null,
            constraints_violated: serde_json::Value::Null,
        });
        self.steps.last_mut().expect("just pushed")
    }

    pub fn finish(&mut self, status: RunStatus, now: DateTime<Utc>) {
        self.status = status;
        self.finished_at = Some(now);
    }

    /// Trace steps must be read in `step_order` (spec §5, "Ordering
    /// guarantees").
    pub fn ordered_steps(&self) -> Vec<&AgentTraceStep> {
        let mut steps: Vec<&AgentTraceStep> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.step_order);
        steps
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTraceStep {
    pub step_order: i32,
    pub step_key: String,
    pub description: String,
    pub applied_rules: serde_json::Value,
    pub calculations: serde_json::Value,
    pub constraints_violated: serde_json::Value,
}

/// Threaded through every engine call instead of held as ambient mutable
/// state (SPEC_FULL §9 Design Notes). Each engine call appends its own
/// steps to the `AgentRun` passed in; nothing survives across calls by
/// accident.
pub struct TraceSink<'a> {
    pub run: &'a mut AgentRun,
}

impl<'a> TraceSink<'a> {
    pub fn new(run: &'a mut AgentRun) -> Self {
        Self { run }
    }

    pub fn step(&mut self, step_key: &str, description: &str) -> &mut AgentTraceStep {
        self.run.push_step(step_key, description)
    }
}
