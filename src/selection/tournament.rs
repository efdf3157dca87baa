use crate::error::{GeneticError, Result};
use crate::rng::RandomNumberGenerator;
use crate::selection::selection_strategy::{check_fitness, SelectionStrategy};

/// A selection strategy that runs binary tournaments.
///
/// Each selection draws two members uniformly at random, with replacement,
/// and keeps the one with the higher fitness. On a tie the second draw wins.
///
/// # Examples
///
/// ```
/// use pgalib::selection::{SelectionStrategy, TournamentSelection};
/// use pgalib::rng::RandomNumberGenerator;
///
/// let mut rng = RandomNumberGenerator::from_seed(11);
/// let picked = TournamentSelection.select(&[1.0, 9.0], 50, &mut rng).unwrap();
/// // Index 0 only wins when it is drawn twice.
/// assert!(picked.iter().filter(|&&i| i == 1).count() > 25);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TournamentSelection;

impl SelectionStrategy for TournamentSelection {
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>> {
        check_fitness(fitness)?;
        Ok((0..num_to_select)
            .map(|_| {
                let first = rng.random_index(fitness.len());
                let second = rng.random_index(fitness.len());
                if fitness[first] > fitness[second] {
                    first
                } else {
                    second
                }
            })
            .collect())
    }
}

/// A binary tournament whose fitter contestant wins only with probability
/// `probability`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy)]
pub struct ProbabilisticTournamentSelection {
    probability: f64,
}

impl ProbabilisticTournamentSelection {
    pub fn new(probability: f64) -> Self {
        Self { probability }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl Default for ProbabilisticTournamentSelection {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl SelectionStrategy for ProbabilisticTournamentSelection {
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>> {
        check_fitness(fitness)?;
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(GeneticError::Selection(format!(
                "Tournament probability must lie in [0, 1], got {}",
                self.probability
            )));
        }
        Ok((0..num_to_select)
            .map(|_| {
                let first = rng.random_index(fitness.len());
                let second = rng.random_index(fitness.len());
                let (better, worse) = if fitness[first] > fitness[second] {
                    (first, second)
                } else {
                    (second, first)
                };
                if rng.random_flip(self.probability) {
                    better
                } else {
                    worse
                }
            })
            .collect())
    }
}
