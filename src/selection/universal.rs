use crate::error::Result;
use crate::rng::RandomNumberGenerator;
use crate::selection::selection_strategy::{check_fitness, SelectionStrategy};

/// Stochastic universal sampling.
///
/// Each member's expected number of copies is `fitness / mean_fitness`
/// (scaled to the number of selections). A single offset `r` in `[0, 1)` is
/// drawn and the running total of expected values emits an index every time
/// it crosses `r, r + 1, r + 2, ...`, so a member with expectation `e` is
/// chosen either `floor(e)` or `ceil(e)` times.
///
/// # Examples
///
/// ```
/// use pgalib::selection::{SelectionStrategy, StochasticUniversalSelection};
/// use pgalib::rng::RandomNumberGenerator;
///
/// let mut rng = RandomNumberGenerator::from_seed(1);
/// let picked = StochasticUniversalSelection.select(&[3.0, 1.0], 4, &mut rng).unwrap();
/// assert_eq!(picked.iter().filter(|&&i| i == 0).count(), 3);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default)]
pub struct StochasticUniversalSelection;

impl SelectionStrategy for StochasticUniversalSelection {
    fn select(
        &self,
        fitness: &[f64],
        num_to_select: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Result<Vec<usize>> {
        check_fitness(fitness)?;
        let sum: f64 = fitness.iter().sum();
        if sum <= 0.0 {
            return Ok((0..num_to_select)
                .map(|_| rng.random_index(fitness.len()))
                .collect());
        }

        let scale = num_to_select as f64 / sum;
        let mut selected = Vec::with_capacity(num_to_select);
        let mut r = rng.random01();
        let mut running = 0.0;
        for (i, f) in fitness.iter().enumerate() {
            running += f * scale;
            while running > r && selected.len() < num_to_select {
                selected.push(i);
                r += 1.0;
            }
        }

        // Rounding in the running total can leave the last pointer uncovered.
        if selected.len() < num_to_select {
            let last = fitness
                .iter()
                .rposition(|f| *f > 0.0)
                .unwrap_or(fitness.len() - 1);
            selected.resize(num_to_select, last);
        }
        Ok(selected)
    }
}
