//! # Error Types
//!
//! Every failure the engine can hit is reported as a [`GeneticError`]. The
//! engine never terminates the process on its own: a fatal condition is an
//! `Err` that unwinds the run, and the caller decides what to do with it.
//! Non-fatal conditions are logged through `tracing::warn!` instead.
//!
//! ## Examples
//!
//! Using the `Result` type:
//!
//! ```rust
//! use pgalib::error::{GeneticError, Result};
//!
//! fn check_population(size: usize) -> Result<()> {
//!     if size % 2 != 0 {
//!         return Err(GeneticError::Configuration(
//!             "Population size must be even".to_string(),
//!         ));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_population(10).is_ok());
//! assert!(check_population(11).is_err());
//! ```
//!
//! Using the `ResultExt` trait to add context to foreign errors:
//!
//! ```rust
//! use pgalib::error::{Result, ResultExt};
//! use std::io::Write;
//!
//! fn write_header(sink: &mut dyn Write) -> Result<()> {
//!     writeln!(sink, "Iter #     Field      Value").context("Failed to write report header")
//! }
//!
//! let mut out = Vec::new();
//! write_header(&mut out).unwrap();
//! ```
//!
//! Using the `OptionExt` trait to convert `Option` to `Result`:
//!
//! ```rust
//! use pgalib::error::{GeneticError, OptionExt};
//!
//! fn best_of(evaluations: &[f64]) -> pgalib::error::Result<f64> {
//!     evaluations
//!         .iter()
//!         .cloned()
//!         .reduce(f64::max)
//!         .ok_or_else_genetic(|| GeneticError::EmptyPopulation)
//! }
//! ```

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Represents errors that can occur in the genetic algorithm engine.
#[derive(Error, Debug)]
pub enum GeneticError {
    /// An invalid parameter or an invalid combination of parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The fitness transform could not be applied.
    #[error("Fitness calculation error: {0}")]
    FitnessCalculation(String),

    /// The mating pool was used incorrectly.
    #[error("Selection error: {0}")]
    Selection(String),

    /// A binary encode or decode request was malformed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A message could not be delivered or understood.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Error that occurs when an empty population is encountered.
    #[error("Empty population error: Cannot operate on an empty population")]
    EmptyPopulation,

    /// An index or allele value lies outside its valid range.
    #[error("Bounds error: {0}")]
    OutOfBounds(String),

    /// Error that occurs when NaN or infinity values are encountered.
    #[error("Invalid numeric value: {0}")]
    InvalidNumericValue(String),

    /// Error that occurs when an I/O operation fails.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generic error with a custom message.
    #[error("{0}")]
    Other(String),
}

/// A specialized Result type for genetic algorithm operations.
pub type Result<T> = std::result::Result<T, GeneticError>;

/// Extension trait for Result to add context to errors.
///
/// ## Examples
///
/// ```rust
/// use pgalib::error::ResultExt;
///
/// fn parse_seed(text: &str) -> pgalib::error::Result<u64> {
///     text.parse::<u64>().context("Failed to parse seed")
/// }
///
/// assert!(parse_seed("42").is_ok());
/// assert!(parse_seed("forty-two").is_err());
/// ```
pub trait ResultExt<T, E> {
    /// Converts the error to a `GeneticError::Other` prefixed with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| GeneticError::Other(format!("{}: {}", context, e)))
    }
}

/// Extension trait for Option to convert to Result with a custom error.
pub trait OptionExt<T> {
    /// Converts an `Option<T>` to a `Result<T, GeneticError>` using
    /// a closure to generate the error.
    fn ok_or_else_genetic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> GeneticError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_else_genetic<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> GeneticError,
    {
        self.ok_or_else(err_fn)
    }
}
