//! Duplicate avoidance.
//!
//! A candidate about to be written to slot `n` of a buffer is compared with
//! slots `[0, n)`. While it matches one of them it is changed: mutated at an
//! escalating rate until at least one allele moves. The number of change
//! rounds is bounded; once the bound is hit the candidate is re-initialised
//! from scratch and inserted even if it still matches.

use tracing::{trace, warn};

use crate::genome::{OperatorTable, Representation};
use crate::population::Population;
use crate::rng::RandomNumberGenerator;

use super::BreedConfig;

/// Growth factor of the mutation rate between failed change attempts.
const RATE_ESCALATION: f64 = 1.1;

/// Starting rate used when the configured mutation probability is zero.
const MIN_CHANGE_RATE: f64 = 0.01;

/// True if `candidate` matches any of the first `n` slots of `pop`.
pub fn is_duplicate<R: Representation>(
    operators: &OperatorTable<R>,
    candidate: &R::Genome,
    pop: &Population<R::Genome>,
    n: usize,
) -> bool {
    pop.slots()[..n]
        .iter()
        .any(|other| operators.duplicate(candidate, &other.genome))
}

/// Mutates `genome` at an escalating rate until an allele changes.
///
/// Returns `false` if the rate passed 1.0 without any change.
pub fn change<R: Representation>(
    operators: &OperatorTable<R>,
    genome: &mut R::Genome,
    mutation_prob: f64,
    rng: &mut RandomNumberGenerator,
) -> bool {
    let mut rate = if mutation_prob > 0.0 {
        mutation_prob
    } else {
        MIN_CHANGE_RATE
    };
    while rate <= 1.0 {
        if operators.mutate(genome, rate, rng) > 0 {
            return true;
        }
        rate *= RATE_ESCALATION;
    }
    warn!("Could not change string, mutation rate escalated past 1.0");
    false
}

/// Copies scratch slot `scratch` of `pop` into slot `n`, first changing it
/// until it is unique among `[0, n)` when duplicate avoidance is on.
pub fn insert_unique<R: Representation>(
    operators: &OperatorTable<R>,
    config: &BreedConfig,
    pop: &mut Population<R::Genome>,
    scratch: usize,
    n: usize,
    rng: &mut RandomNumberGenerator,
) {
    if config.no_duplicates {
        let mut attempts = 0;
        while is_duplicate(operators, &pop.slots()[scratch].genome, pop, n) {
            let candidate = &mut pop.slots_mut()[scratch];
            if attempts >= config.max_duplicate_attempts {
                operators.initialize(&mut candidate.genome, rng);
                candidate.evaluation_current = false;
                if is_duplicate(operators, &pop.slots()[scratch].genome, pop, n) {
                    warn!(
                        slot = n,
                        attempts, "Duplicate survived re-initialisation, inserting anyway"
                    );
                }
                break;
            }
            if change(operators, &mut candidate.genome, config.mutation_prob, rng) {
                candidate.evaluation_current = false;
            }
            attempts += 1;
        }
        if attempts > 0 {
            trace!(slot = n, attempts, "Duplicate candidate changed");
        }
    }
    operators.copy_within(pop, scratch, n);
}
