use std::fmt::Debug;

use tracing::debug;

use super::{
    ProbabilisticTournamentSelection, RouletteWheelSelection, StochasticUniversalSelection,
    TournamentSelection,
};
use crate::error::{GeneticError, Result};
use crate::rng::RandomNumberGenerator;

/// Trait for selection strategies in genetic algorithms.
///
/// A strategy reads the fitness of every member of a population buffer and
/// returns the indices of the members chosen for mating, with repetition.
///
/// # Examples
///
/// ```
/// use pgalib::selection::{SelectionStrategy, TournamentSelection};
/// use pgalib::rng::RandomNumberGenerator;
/// use pgalib::error::Result;
///
/// fn main() -> Result<()> {
///     let fitness = vec![0.5, 0.8, 0.3, 0.9, 0.1];
///     let mut rng = RandomNumberGenerator::from_seed(3);
///
///     let selected = TournamentSelection.select(&fitness, 4, &mut rng)?;
///
///     assert_eq!(selected.len(), 4);
///     assert!(selected.iter().all(|&i| i < fitness.len()));
///
///     Ok(())
/// }
/// ```
pub trait SelectionStrategy: Debug + Send + Sync {
    /// Selects `num_to_select` member indices.
    ///
    /// # Errors
    ///
    /// Returns an error if `fitness` is empty or contains a negative or
    /// non-finite value.
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>>;
}

/// Checks the preconditions shared by every strategy.
pub(crate) fn check_fitness(fitness: &[f64]) -> Result<()> {
    if fitness.is_empty() {
        return Err(GeneticError::EmptyPopulation);
    }
    if let Some(i) = fitness.iter().position(|f| !f.is_finite() || *f < 0.0) {
        return Err(GeneticError::Selection(format!(
            "Selection requires finite non-negative fitness, individual {} has {}",
            i, fitness[i]
        )));
    }
    Ok(())
}

/// The selection scheme of a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionType {
    /// Roulette wheel.
    Proportional,
    /// Stochastic universal sampling.
    StochasticUniversal,
    /// Binary tournament.
    #[default]
    Tournament,
    /// Binary tournament won by the fitter member with a fixed probability.
    ProbabilisticTournament,
}

impl SelectionType {
    /// Builds the strategy for this scheme.
    pub fn strategy(self, tournament_probability: f64) -> Box<dyn SelectionStrategy> {
        match self {
            SelectionType::Proportional => Box::new(RouletteWheelSelection),
            SelectionType::StochasticUniversal => Box::new(StochasticUniversalSelection),
            SelectionType::Tournament => Box::new(TournamentSelection),
            SelectionType::ProbabilisticTournament => {
                Box::new(ProbabilisticTournamentSelection::new(tournament_probability))
            }
        }
    }
}

/// The shuffled list of selected indices for one generation, handed out
/// one at a time.
#[derive(Debug, Clone, Default)]
pub struct MatingPool {
    selected: Vec<usize>,
    cursor: usize,
}

impl MatingPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the pool with `size` selections and shuffles it.
    pub fn fill(
        &mut self,
        strategy: &dyn SelectionStrategy,
        fitness: &[f64],
        rng: &mut RandomNumberGenerator,
    ) -> Result<()> {
        let size = fitness.len();
        self.selected = strategy.select(fitness, size, rng)?;
        for i in 0..self.selected.len() {
            let j = rng.random_index(self.selected.len());
            self.selected.swap(i, j);
        }
        self.cursor = 0;
        debug!(pool = ?self.selected, "Mating pool filled");
        Ok(())
    }

    /// Returns the next selected index.
    ///
    /// # Errors
    ///
    /// Fails once every selection of the current pool has been consumed.
    pub fn next_index(&mut self) -> Result<usize> {
        let index = self.selected.get(self.cursor).copied().ok_or_else(|| {
            GeneticError::Selection(format!(
                "select_next called more than {} times since the last selection",
                self.selected.len()
            ))
        })?;
        self.cursor += 1;
        Ok(index)
    }

    /// Rewinds the cursor without reselecting.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }
}
