//! One module per pipeline component (spec §2, components B-J; A lives in
//! [`crate::store`]). Every entry point takes a [`crate::pipeline::PipelineContext`]
//! and a [`crate::store::Store`] handle rather than holding state itself,
//! per the Design Notes' explicit-context choice.

pub mod agenda;
pub mod assignment;
pub mod convocation;
pub mod demand;
pub mod forecast;
pub mod rules;
pub mod schedule;
pub mod stats;
pub mod suggestion;
