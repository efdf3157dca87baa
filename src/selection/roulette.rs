use crate::error::Result;
use crate::rng::RandomNumberGenerator;
use crate::selection::selection_strategy::{check_fitness, SelectionStrategy};

/// A selection strategy that selects individuals through roulette wheel selection.
///
/// Roulette wheel selection (also known as fitness proportionate selection) selects
/// individuals with probability proportional to their fitness. Each draw is
/// independent: a uniform value in `[0, sum)` is located by a linear scan of
/// the running fitness total.
///
/// When every fitness is zero the wheel has no area and each draw is uniform.
///
/// # Examples
///
/// ```
/// use pgalib::selection::{RouletteWheelSelection, SelectionStrategy};
/// use pgalib::rng::RandomNumberGenerator;
///
/// let mut rng = RandomNumberGenerator::from_seed(1);
/// let picked = RouletteWheelSelection.select(&[0.0, 0.0, 5.0], 10, &mut rng).unwrap();
/// assert!(picked.iter().all(|&i| i == 2));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default)]
pub struct RouletteWheelSelection;

impl RouletteWheelSelection {
    /// Spins the wheel once.
    pub(crate) fn spin(fitness: &[f64], sum: f64, rng: &mut RandomNumberGenerator) -> usize {
        if sum <= 0.0 {
            return rng.random_index(fitness.len());
        }
        let r = sum * rng.random01();
        let mut i = 0;
        let mut running = fitness[0];
        while r >= running && i + 1 < fitness.len() {
            i += 1;
            running += fitness[i];
        }
        i
    }
}

impl SelectionStrategy for RouletteWheelSelection {
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>> {
        check_fitness(fitness)?;
        let sum: f64 = fitness.iter().sum();
        Ok((0..num_to_select)
            .map(|_| Self::spin(fitness, sum, rng))
            .collect())
    }
}
