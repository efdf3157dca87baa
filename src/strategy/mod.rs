//! # BreedStrategy
//!
//! The `BreedStrategy` trait defines the interface for strategies responsible for building
//! the next population buffer from the current one.
//!
//! Both shipped policies start the same way: the `PopSize - NumReplace` members chosen by
//! the [`PopReplaceType`] are copied unchanged into the next buffer, then the remaining
//! slots are filled with offspring of pairs drawn from the [`MatingPool`]:
//!
//! - [`MutationAndCrossover`]: crossover with probability `crossover_prob`, after which both
//!   children are also mutated; otherwise both parents are copied unchanged.
//! - [`MutationOrCrossover`]: crossover with probability `crossover_prob`, otherwise each
//!   parent is copied and mutated. Exactly one operator is applied per offspring.
//!
//! When duplicate avoidance is enabled every offspring passes through
//! [`duplicates::insert_unique`] before it lands in the buffer.
pub mod duplicates;
pub mod mutation_and_crossover;
pub mod mutation_or_crossover;

use std::fmt::Debug;

use tracing::trace;

use crate::{
    error::{GeneticError, Result},
    genome::{OperatorTable, Representation},
    population::Population,
    rng::RandomNumberGenerator,
    selection::MatingPool,
};

pub use mutation_and_crossover::MutationAndCrossover;
pub use mutation_or_crossover::MutationOrCrossover;

/// How the unchanged survivors of a generation are chosen.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PopReplaceType {
    /// The members with the highest fitness.
    #[default]
    Best,
    /// Uniform draws, a member may survive more than once.
    RandomWithReplacement,
    /// Uniform draws, each member survives at most once.
    RandomWithoutReplacement,
}

/// The reproduction policy of a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReproductionPolicy {
    MutationAndCrossover,
    #[default]
    MutationOrCrossover,
}

impl ReproductionPolicy {
    /// Builds the strategy implementing this policy.
    pub fn strategy<R: Representation>(self) -> Box<dyn BreedStrategy<R>> {
        match self {
            ReproductionPolicy::MutationAndCrossover => Box::new(MutationAndCrossover),
            ReproductionPolicy::MutationOrCrossover => Box::new(MutationOrCrossover),
        }
    }
}

/// The parameters a breeding pass reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BreedConfig {
    pub crossover_prob: f64,
    pub mutation_prob: f64,
    pub num_replace: usize,
    pub pop_replace: PopReplaceType,
    pub no_duplicates: bool,
    /// Upper bound on the change rounds spent on one duplicate candidate.
    pub max_duplicate_attempts: usize,
}

/// # BreedStrategy
///
/// Fills `dest` from `source`. The pool must have been filled from `source`'s fitness.
pub trait BreedStrategy<R: Representation>: Debug + Send + Sync {
    /// Builds the next generation into `dest`.
    ///
    /// ## Errors
    ///
    /// This method can fail if:
    /// - the two buffers differ in size
    /// - `num_replace` exceeds the population size
    /// - the mating pool runs out of selections
    fn breed(
        &self,
        operators: &OperatorTable<R>,
        config: &BreedConfig,
        pool: &mut MatingPool,
        source: &Population<R::Genome>,
        dest: &mut Population<R::Genome>,
        rng: &mut RandomNumberGenerator,
    ) -> Result<()>;
}

/// Copies the `size - num_replace` survivors into the first slots of `dest`
/// and returns how many were copied.
pub(crate) fn copy_survivors<R: Representation>(
    operators: &OperatorTable<R>,
    config: &BreedConfig,
    source: &Population<R::Genome>,
    dest: &mut Population<R::Genome>,
    rng: &mut RandomNumberGenerator,
) -> Result<usize> {
    let size = source.size();
    if dest.size() != size {
        return Err(GeneticError::Configuration(format!(
            "Population buffers differ in size: {} and {}",
            size,
            dest.size()
        )));
    }
    if config.num_replace > size {
        return Err(GeneticError::Configuration(format!(
            "Cannot replace {} members of a population of {}",
            config.num_replace, size
        )));
    }
    let keep = size - config.num_replace;

    let survivors: Vec<usize> = match config.pop_replace {
        PopReplaceType::Best => source.sorted_by_fitness().into_iter().take(keep).collect(),
        PopReplaceType::RandomWithReplacement => {
            (0..keep).map(|_| rng.random_index(size)).collect()
        }
        PopReplaceType::RandomWithoutReplacement => {
            let mut order: Vec<usize> = (0..size).collect();
            for i in 0..size {
                let j = rng.random_index(size);
                order.swap(i, j);
            }
            order.truncate(keep);
            order
        }
    };

    for (slot, &member) in survivors.iter().enumerate() {
        operators.copy_member(source, member, dest, slot);
    }
    trace!(kept = keep, "Survivors copied");
    Ok(keep)
}

/// Mutates one individual and marks it stale if any allele changed.
pub(crate) fn mutate_individual<R: Representation>(
    operators: &OperatorTable<R>,
    individual: &mut crate::population::Individual<R::Genome>,
    rate: f64,
    rng: &mut RandomNumberGenerator,
) -> usize {
    let count = operators.mutate(&mut individual.genome, rate, rng);
    if count > 0 {
        individual.evaluation_current = false;
    }
    count
}

/// Crosses members `m1` and `m2` of `source` into the two scratch slots of `dest`.
pub(crate) fn crossover_into_scratch<R: Representation>(
    operators: &OperatorTable<R>,
    source: &Population<R::Genome>,
    m1: usize,
    m2: usize,
    dest: &mut Population<R::Genome>,
    rng: &mut RandomNumberGenerator,
) -> Result<()> {
    let parent1 = &source.get(m1)?.genome;
    let parent2 = &source.get(m2)?.genome;
    let (t1, t2) = (dest.temp1(), dest.temp2());
    let (child1, child2) = dest.pair_mut(t1, t2);
    operators.crossover(parent1, parent2, &mut child1.genome, &mut child2.genome, rng);
    child1.evaluation_current = false;
    child2.evaluation_current = false;
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::genome::{BinaryRepresentation, CrossoverParams, CrossoverType, Overrides};

    pub fn operators(len: usize) -> OperatorTable<BinaryRepresentation> {
        OperatorTable::new(
            BinaryRepresentation::new(len),
            Overrides::default(),
            CrossoverParams {
                kind: CrossoverType::TwoPoint,
                uniform_prob: 0.6,
            },
        )
    }

    pub fn config(num_replace: usize) -> BreedConfig {
        BreedConfig {
            crossover_prob: 0.85,
            mutation_prob: 0.05,
            num_replace,
            pop_replace: PopReplaceType::Best,
            no_duplicates: false,
            max_duplicate_attempts: 100,
        }
    }

    /// An evaluated population whose fitness equals its member index.
    pub fn population(
        ops: &OperatorTable<BinaryRepresentation>,
        size: usize,
        rng: &mut RandomNumberGenerator,
    ) -> Population<crate::genome::BinaryString> {
        let mut pop = Population::new(size, |_| ops.create(true, rng));
        for (i, m) in pop.members_mut().iter_mut().enumerate() {
            m.set_evaluation(i as f64);
            m.fitness = i as f64;
        }
        pop
    }
}
