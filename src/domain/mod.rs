//! The persisted entity shapes of spec.md §3, one module per family.

pub mod activity;
pub mod activity_program;
pub mod agenda;
pub mod calendar;
pub mod convocation;
pub mod datalake;
pub mod demand;
pub mod forecast;
pub mod rules;
pub mod schedule;
pub mod sector;
pub mod suggestion;
pub mod trace;
pub mod weekday;
