use tracing::trace;

use super::{
    copy_survivors, crossover_into_scratch, duplicates::insert_unique, mutate_individual,
    BreedConfig, BreedStrategy,
};
use crate::{
    error::Result,
    genome::{OperatorTable, Representation},
    population::Population,
    rng::RandomNumberGenerator,
    selection::MatingPool,
};

/// # MutationAndCrossover
///
/// Each selected pair is recombined with probability `crossover_prob`; the two
/// children are then both mutated before insertion. Pairs that are not
/// recombined are copied into the next buffer untouched, unless duplicate
/// avoidance has to change them.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationAndCrossover;

impl<R: Representation> BreedStrategy<R> for MutationAndCrossover {
    fn breed(
        &self,
        operators: &OperatorTable<R>,
        config: &BreedConfig,
        pool: &mut MatingPool,
        source: &Population<R::Genome>,
        dest: &mut Population<R::Genome>,
        rng: &mut RandomNumberGenerator,
    ) -> Result<()> {
        let size = source.size();
        let mut n = copy_survivors(operators, config, source, dest, rng)?;
        let (t1, t2) = (dest.temp1(), dest.temp2());

        while n < size {
            let m1 = pool.next_index()?;
            let m2 = pool.next_index()?;
            if rng.random_flip(config.crossover_prob) {
                crossover_into_scratch(operators, source, m1, m2, dest, rng)?;

                mutate_individual(operators, dest.get_mut(t1)?, config.mutation_prob, rng);
                insert_unique(operators, config, dest, t1, n, rng);
                n += 1;

                if n < size {
                    mutate_individual(operators, dest.get_mut(t2)?, config.mutation_prob, rng);
                    insert_unique(operators, config, dest, t2, n, rng);
                    n += 1;
                }
            } else {
                // Unchanged parents still pass the duplicate check.
                operators.copy_member(source, m1, dest, t1);
                insert_unique(operators, config, dest, t1, n, rng);
                n += 1;
                if n < size {
                    operators.copy_member(source, m2, dest, t2);
                    insert_unique(operators, config, dest, t2, n, rng);
                    n += 1;
                }
            }
        }
        trace!(size, "Generation bred with mutation and crossover");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::TournamentSelection;
    use crate::strategy::test_support::{config, operators, population};

    #[test]
    fn test_fills_whole_buffer_with_odd_replacement() {
        let mut rng = RandomNumberGenerator::from_seed(12);
        let ops = operators(24);
        let source = population(&ops, 10, &mut rng);
        let mut dest = Population::new(10, |_| ops.create(false, &mut rng));
        let mut pool = MatingPool::new();
        pool.fill(&TournamentSelection, &source.fitness_values(), &mut rng).unwrap();

        MutationAndCrossover
            .breed(&ops, &config(3), &mut pool, &source, &mut dest, &mut rng)
            .unwrap();

        // Survivors are the seven fittest, still evaluated.
        for slot in 0..7 {
            assert_eq!(dest.get(slot).unwrap(), source.get(9 - slot).unwrap());
        }
        // Three offspring consume two pairs from the pool.
        assert_eq!(pool.selected().len(), 10);
        assert!(pool.next_index().is_ok());
    }

    #[test]
    fn test_without_crossover_parents_are_copied_verbatim() {
        let mut rng = RandomNumberGenerator::from_seed(13);
        let ops = operators(24);
        let source = population(&ops, 6, &mut rng);
        let mut dest = Population::new(6, |_| ops.create(false, &mut rng));
        let mut pool = MatingPool::new();
        pool.fill(&TournamentSelection, &source.fitness_values(), &mut rng).unwrap();
        let mut cfg = config(6);
        cfg.crossover_prob = 0.0;

        MutationAndCrossover
            .breed(&ops, &cfg, &mut pool, &source, &mut dest, &mut rng)
            .unwrap();

        for (slot, &parent) in pool.selected().iter().enumerate() {
            assert_eq!(dest.get(slot).unwrap(), source.get(parent).unwrap());
            assert!(dest.get(slot).unwrap().is_evaluation_current());
        }
    }

    #[test]
    fn test_crossover_children_are_stale() {
        let mut rng = RandomNumberGenerator::from_seed(14);
        let ops = operators(24);
        let source = population(&ops, 6, &mut rng);
        let mut dest = Population::new(6, |_| ops.create(false, &mut rng));
        let mut pool = MatingPool::new();
        pool.fill(&TournamentSelection, &source.fitness_values(), &mut rng).unwrap();
        let mut cfg = config(4);
        cfg.crossover_prob = 1.0;

        MutationAndCrossover
            .breed(&ops, &cfg, &mut pool, &source, &mut dest, &mut rng)
            .unwrap();

        assert_eq!(dest.pending(), vec![2, 3, 4, 5]);
    }
}
