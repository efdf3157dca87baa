use tracing::info;

use crate::{
    error::Result,
    fitness::Direction,
    genome::{OperatorTable, Representation},
    population::Population,
    rng::RandomNumberGenerator,
};

/// Reseeds `dest` from the best member of `source`.
///
/// Slot 0 receives an unchanged copy of the best member; every other slot
/// receives a copy resampled allele by allele with probability `allele_prob`.
/// All slots are marked stale.
pub fn restart<R: Representation>(
    operators: &OperatorTable<R>,
    source: &Population<R::Genome>,
    dest: &mut Population<R::Genome>,
    direction: Direction,
    allele_prob: f64,
    rng: &mut RandomNumberGenerator,
) -> Result<()> {
    let best = source.best_index(direction)?;
    info!(best, "Restarting the algorithm");

    operators.copy_member(source, best, dest, 0);
    dest.get_mut(0)?.set_evaluation_current(false);
    for slot in 1..dest.size() {
        operators.copy_within(dest, 0, slot);
        let member = dest.get_mut(slot)?;
        operators.resample(&mut member.genome, allele_prob, rng);
        member.set_evaluation_current(false);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{
        CrossoverParams, CrossoverType, IntegerRepresentation, Overrides,
    };

    #[test]
    fn test_restart_seeds_from_best_and_marks_stale() {
        let ops = OperatorTable::new(
            IntegerRepresentation::new(6).with_range(0, 9),
            Overrides::default(),
            CrossoverParams {
                kind: CrossoverType::OnePoint,
                uniform_prob: 0.5,
            },
        );
        let mut rng = RandomNumberGenerator::from_seed(31);
        let mut source = Population::new(4, |_| ops.create(true, &mut rng));
        for (i, m) in source.members_mut().iter_mut().enumerate() {
            m.set_evaluation(i as f64);
        }
        let mut dest = Population::new(4, |_| ops.create(false, &mut rng));

        restart(&ops, &source, &mut dest, Direction::Maximize, 0.5, &mut rng).unwrap();

        assert_eq!(dest.get(0).unwrap().genome(), source.get(3).unwrap().genome());
        assert_eq!(dest.pending(), vec![0, 1, 2, 3]);
        for m in dest.members() {
            assert!(m.genome().iter().all(|a| (0..=9).contains(a)));
        }
    }

    #[test]
    fn test_restart_with_zero_probability_copies_best_everywhere() {
        let ops = OperatorTable::new(
            IntegerRepresentation::new(6).with_range(0, 9),
            Overrides::default(),
            CrossoverParams {
                kind: CrossoverType::OnePoint,
                uniform_prob: 0.5,
            },
        );
        let mut rng = RandomNumberGenerator::from_seed(32);
        let mut source = Population::new(4, |_| ops.create(true, &mut rng));
        for (i, m) in source.members_mut().iter_mut().enumerate() {
            m.set_evaluation(-(i as f64));
        }
        let mut dest = Population::new(4, |_| ops.create(false, &mut rng));

        restart(&ops, &source, &mut dest, Direction::Maximize, 0.0, &mut rng).unwrap();

        for m in dest.members() {
            assert_eq!(m.genome(), source.get(0).unwrap().genome());
        }
    }
}
