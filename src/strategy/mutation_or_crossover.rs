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

/// # MutationOrCrossover
///
/// Each selected pair is either recombined (probability `crossover_prob`) or
/// each parent is copied and mutated. An offspring never receives both
/// operators. Every offspring goes through duplicate avoidance.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutationOrCrossover;

impl<R: Representation> BreedStrategy<R> for MutationOrCrossover {
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

                insert_unique(operators, config, dest, t1, n, rng);
                n += 1;
                if n < size {
                    insert_unique(operators, config, dest, t2, n, rng);
                    n += 1;
                }
            } else {
                operators.copy_member(source, m1, dest, t1);
                mutate_individual(operators, dest.get_mut(t1)?, config.mutation_prob, rng);
                insert_unique(operators, config, dest, t1, n, rng);
                n += 1;

                if n < size {
                    operators.copy_member(source, m2, dest, t2);
                    mutate_individual(operators, dest.get_mut(t2)?, config.mutation_prob, rng);
                    insert_unique(operators, config, dest, t2, n, rng);
                    n += 1;
                }
            }
        }
        trace!(size, "Generation bred with mutation or crossover");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::TournamentSelection;
    use crate::strategy::test_support::{config, operators, population};

    fn breed(cfg: crate::strategy::BreedConfig, seed: u64) -> (Population<crate::genome::BinaryString>, Population<crate::genome::BinaryString>, MatingPool) {
        let mut rng = RandomNumberGenerator::from_seed(seed);
        let ops = operators(32);
        let source = population(&ops, 8, &mut rng);
        let mut dest = Population::new(8, |_| ops.create(false, &mut rng));
        let mut pool = MatingPool::new();
        pool.fill(&TournamentSelection, &source.fitness_values(), &mut rng).unwrap();
        MutationOrCrossover
            .breed(&ops, &cfg, &mut pool, &source, &mut dest, &mut rng)
            .unwrap();
        (source, dest, pool)
    }

    #[test]
    fn test_mutation_only_offspring_stay_close_to_parents() {
        let mut cfg = config(8);
        cfg.crossover_prob = 0.0;
        cfg.mutation_prob = 0.0;
        let (source, dest, pool) = breed(cfg, 21);

        // A zero mutation rate leaves each copy identical and still evaluated.
        for (slot, &parent) in pool.selected().iter().enumerate() {
            assert_eq!(dest.get(slot).unwrap().genome(), source.get(parent).unwrap().genome());
            assert!(dest.get(slot).unwrap().is_evaluation_current());
        }
    }

    #[test]
    fn test_full_mutation_marks_offspring_stale() {
        let mut cfg = config(8);
        cfg.crossover_prob = 0.0;
        cfg.mutation_prob = 1.0;
        let (source, dest, pool) = breed(cfg, 22);

        for (slot, &parent) in pool.selected().iter().enumerate() {
            let child = dest.get(slot).unwrap();
            assert!(!child.is_evaluation_current());
            assert_eq!(child.genome().hamming(source.get(parent).unwrap().genome()), 32);
        }
    }

    #[test]
    fn test_no_duplicates_in_bred_buffer() {
        let mut cfg = config(6);
        cfg.no_duplicates = true;
        cfg.mutation_prob = 0.0;
        cfg.crossover_prob = 0.0;
        let (_, dest, _) = breed(cfg, 23);

        let members = dest.members();
        for i in 0..members.len() {
            for j in 0..i {
                assert_ne!(members[i].genome(), members[j].genome());
            }
        }
    }
}
