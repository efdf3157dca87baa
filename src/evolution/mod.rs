//! # Evolution
//!
//! The run context and everything the generation loop needs around it: options, the
//! evaluation callback, statistics and reporting, stopping rules and restart.
pub mod builder;
pub mod challenge;
pub mod launcher;
pub mod options;
pub mod report;
pub mod restart;
pub mod stopping;

pub use builder::GeneticAlgorithmBuilder;
pub use challenge::Challenge;
pub use launcher::{EndOfGenerationFn, GeneticAlgorithm, RunSummary, StopConditionFn};
pub use options::{EvolutionOptions, EvolutionOptionsBuilder, LogLevel, ReportOptions, StoppingRules};
pub use report::Statistics;
