//! Core pipeline for Preprint Alert.
//!
//! This crate holds the run state machine ([`state`]), the model-backed
//! stages ([`stages`]) and the controller that ties them to the feed and
//! content fetcher ([`pipeline`]).

pub mod pipeline;
pub mod stages;
pub mod state;

pub use pipeline::{
    EMPTY_REPORT, EmptyReason, Pipeline, PipelineOptions, ProgressReporter, RunOutcome,
    SilentProgress,
};
pub use state::RunState;
