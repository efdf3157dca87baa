//! # pgalib
//!
//! A parallel genetic algorithm engine. A run is set up once from a [`genome::Representation`]
//! and [`evolution::EvolutionOptions`], then driven generation by generation on rank 0 while
//! any other ranks of the group evaluate individuals on its behalf.
//!
//! ```rust
//! use pgalib::evolution::{EvolutionOptions, GeneticAlgorithm};
//! use pgalib::genome::{BinaryRepresentation, BinaryString};
//!
//! let options = EvolutionOptions::builder()
//!     .population_size(50)
//!     .max_iterations(100)
//!     .seed(42)
//!     .build()?;
//! let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(20), options).build()?;
//! let summary = ga.run(&|g: &BinaryString| g.count_ones() as f64)?;
//! assert!(summary.best_evaluation > 10.0);
//! # Ok::<(), pgalib::GeneticError>(())
//! ```
pub mod error;
pub mod evolution;
pub mod fitness;
pub mod genome;
pub mod parallel;
pub mod population;
pub mod rng;
pub mod selection;
pub mod strategy;

// Re-export commonly used types for convenience
pub use error::{GeneticError, OptionExt, Result, ResultExt};
pub use evolution::{Challenge, EvolutionOptions, GeneticAlgorithm, RunSummary};
pub use fitness::Direction;
pub use genome::Representation;
pub use population::{Individual, Population, PopulationId};
