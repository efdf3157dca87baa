//! # Stopping policy
//!
//! The built-in stopping check is the logical OR of three rules, each gated by
//! its enabled flag:
//!
//! - iteration limit: `iteration > max_iterations` (always enabled)
//! - no change: `iters_of_same >= max_no_change`
//! - too similar: `percent_same >= max_similarity`
//!
//! A user supplied predicate replaces the check entirely; it may still call
//! [`check_stopping_conditions`] to extend the built-in rules.

use std::cmp::Ordering;

use super::options::EvolutionOptions;
use super::report::Statistics;

/// Evaluates the built-in stopping rules.
pub fn check_stopping_conditions(options: &EvolutionOptions, stats: &Statistics) -> bool {
    let rules = options.get_stopping_rules();
    let mut done = stats.iteration > options.get_max_iterations();
    if rules.no_change && stats.iters_of_same >= options.get_max_no_change() {
        done = true;
    }
    if rules.too_similar && stats.percent_same >= options.get_max_similarity() {
        done = true;
    }
    done
}

/// Percentage of the population in the largest group of identical evaluations.
pub fn similarity(evaluations: &[f64]) -> usize {
    if evaluations.is_empty() {
        return 0;
    }
    let mut sorted = evaluations.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut longest = 1;
    let mut run = 1;
    for pair in sorted.windows(2) {
        if pair[1] == pair[0] {
            run += 1;
        } else {
            run = 1;
        }
        longest = longest.max(run);
    }
    100 * longest / evaluations.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::options::StoppingRules;

    fn options(rules: StoppingRules) -> EvolutionOptions {
        EvolutionOptions::builder()
            .max_iterations(10)
            .max_no_change(5)
            .max_similarity(80)
            .stopping_rules(rules)
            .build()
            .unwrap()
    }

    #[test]
    fn test_iteration_limit_is_strict() {
        let o = options(StoppingRules::default());
        let mut stats = Statistics::default();
        stats.iteration = 10;
        assert!(!check_stopping_conditions(&o, &stats));
        stats.iteration = 11;
        assert!(check_stopping_conditions(&o, &stats));
    }

    #[test]
    fn test_no_change_only_when_enabled() {
        let mut stats = Statistics::default();
        stats.iters_of_same = 5;
        assert!(!check_stopping_conditions(&options(StoppingRules::default()), &stats));
        let rules = StoppingRules {
            no_change: true,
            ..StoppingRules::default()
        };
        assert!(check_stopping_conditions(&options(rules), &stats));
    }

    #[test]
    fn test_too_similar() {
        let rules = StoppingRules {
            too_similar: true,
            ..StoppingRules::default()
        };
        let mut stats = Statistics::default();
        stats.percent_same = 79;
        assert!(!check_stopping_conditions(&options(rules), &stats));
        stats.percent_same = 80;
        assert!(check_stopping_conditions(&options(rules), &stats));
    }

    #[test]
    fn test_similarity_counts_final_run() {
        assert_eq!(similarity(&[1.0, 2.0, 3.0, 3.0]), 50);
        assert_eq!(similarity(&[3.0, 1.0, 3.0, 3.0]), 75);
        assert_eq!(similarity(&[1.0, 2.0, 3.0, 4.0]), 25);
        assert_eq!(similarity(&[2.0; 5]), 100);
    }
}
