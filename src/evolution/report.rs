//! # Statistics and reporting
//!
//! [`Statistics`] carries the running figures the driver updates once per
//! completed generation. [`write_report`] renders them in the classic column
//! layout:
//!
//! ```text
//! Iter #     Field      Value
//! 20         Best       1.900000e1
//!            Average    1.512000e1
//! ```

use std::io::Write;

use crate::{
    error::Result,
    fitness::{mean, Direction},
    genome::{OperatorTable, Representation},
    population::Population,
};

use super::options::ReportOptions;

/// Running statistics of a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    /// Completed generations.
    pub iteration: usize,
    /// Consecutive generations whose best evaluation equalled the recorded best.
    pub iters_of_same: usize,
    /// Best evaluation of the latest generation.
    pub best: Option<f64>,
    /// Size of the largest group of equal evaluations, in percent.
    pub percent_same: usize,
    /// Mean of every evaluation seen so far.
    pub online: f64,
    /// Mean of the per-generation best evaluations so far.
    pub offline: f64,
    /// Mean evaluation of the latest generation.
    pub average: f64,
}

impl Statistics {
    /// Folds one generation's evaluations into the online mean.
    ///
    /// Call after `iteration` has been advanced.
    pub fn update_online(&mut self, evaluations: &[f64]) {
        let iter = self.iteration as f64;
        let n = evaluations.len() as f64;
        let total: f64 = evaluations.iter().sum();
        self.online = (self.online * n * (iter - 1.0) + total) / iter / n;
    }

    /// Folds one generation's best evaluation into the offline mean.
    pub fn update_offline(&mut self, best: f64) {
        let iter = self.iteration as f64;
        self.offline = ((iter - 1.0) * self.offline + best) / iter;
    }

    pub fn update_average(&mut self, evaluations: &[f64]) {
        self.average = mean(evaluations);
    }

    /// Records the best evaluation of a generation and advances the
    /// no-change counter.
    pub fn track_best(&mut self, best: f64) {
        if self.best == Some(best) {
            self.iters_of_same += 1;
        } else {
            self.best = Some(best);
            self.iters_of_same = 1;
        }
    }
}

/// Mean Hamming distance over all member pairs, if the representation defines one.
pub fn mean_hamming<R: Representation>(
    operators: &OperatorTable<R>,
    pop: &Population<R::Genome>,
) -> Option<f64> {
    let members = pop.members();
    let mut total = 0usize;
    let mut pairs = 0usize;
    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            total += operators.distance(members[i].genome(), members[j].genome())?;
            pairs += 1;
        }
    }
    if pairs == 0 {
        return Some(0.0);
    }
    Some(total as f64 / pairs as f64)
}

/// Writes the report block of one generation.
pub fn write_report<R: Representation>(
    sink: &mut dyn Write,
    operators: &OperatorTable<R>,
    pop: &Population<R::Genome>,
    stats: &Statistics,
    direction: Direction,
    report: ReportOptions,
) -> Result<()> {
    let best = pop.best_index(direction)?;
    writeln!(sink, "Iter #     Field      Value")?;
    writeln!(
        sink,
        "{:<11}Best       {:e}",
        stats.iteration,
        pop.get(best)?.evaluation()
    )?;
    if report.worst {
        let worst = pop.worst_index(direction)?;
        writeln!(sink, "           Worst      {:e}", pop.get(worst)?.evaluation())?;
    }
    if report.average {
        writeln!(sink, "           Average    {:e}", stats.average)?;
    }
    if report.offline {
        writeln!(sink, "           Offline    {:e}", stats.offline)?;
    }
    if report.online {
        writeln!(sink, "           Online     {:e}", stats.online)?;
    }
    if report.hamming {
        if let Some(h) = mean_hamming(operators, pop) {
            writeln!(sink, "           Hamming    {:e}", h)?;
        }
    }
    if report.best_string {
        operators.print(pop.get(best)?.genome(), sink)?;
    }
    sink.flush()?;
    Ok(())
}

/// Prints every member: index, evaluation, fitness, flag, then the genome.
pub fn print_population<R: Representation>(
    sink: &mut dyn Write,
    operators: &OperatorTable<R>,
    pop: &Population<R::Genome>,
) -> Result<()> {
    for (i, member) in pop.members().iter().enumerate() {
        writeln!(
            sink,
            "#{:4}: [{:e}] [{:e}] {}",
            i,
            member.evaluation(),
            member.fitness(),
            if member.is_evaluation_current() { "up to date" } else { "stale" }
        )?;
        operators.print(member.genome(), sink)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::{
        BinaryRepresentation, BinaryString, CrossoverParams, CrossoverType, Overrides,
    };

    fn operators() -> OperatorTable<BinaryRepresentation> {
        OperatorTable::new(
            BinaryRepresentation::new(4),
            Overrides::default(),
            CrossoverParams {
                kind: CrossoverType::OnePoint,
                uniform_prob: 0.5,
            },
        )
    }

    fn population() -> Population<BinaryString> {
        let genomes = [
            [true, true, true, true],
            [false, false, false, false],
            [true, false, true, false],
            [true, true, false, false],
        ];
        let mut pop = Population::new(4, |i| BinaryString::from_bits(&genomes[i % 4]));
        for (m, e) in pop.members_mut().iter_mut().zip([4.0, 0.0, 2.0, 2.0]) {
            m.set_evaluation(e);
        }
        pop
    }

    #[test]
    fn test_online_and_offline_means() {
        let mut stats = Statistics::default();
        stats.iteration = 1;
        stats.update_online(&[1.0, 3.0]);
        stats.update_offline(3.0);
        stats.iteration = 2;
        stats.update_online(&[5.0, 7.0]);
        stats.update_offline(7.0);
        assert!((stats.online - 4.0).abs() < 1e-12);
        assert!((stats.offline - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_track_best_counts_repeats() {
        let mut stats = Statistics::default();
        stats.track_best(1.0);
        assert_eq!(stats.iters_of_same, 1);
        stats.track_best(1.0);
        stats.track_best(1.0);
        assert_eq!(stats.iters_of_same, 3);
        stats.track_best(2.0);
        assert_eq!(stats.iters_of_same, 1);
        assert_eq!(stats.best, Some(2.0));
    }

    #[test]
    fn test_mean_hamming() {
        let h = mean_hamming(&operators(), &population()).unwrap();
        // Pairwise distances: 4, 2, 2, 2, 2, 2.
        assert!((h - 14.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_layout() {
        let mut stats = Statistics::default();
        stats.iteration = 20;
        stats.average = 2.0;
        let report = ReportOptions {
            worst: true,
            average: true,
            ..ReportOptions::default()
        };
        let mut out = Vec::new();
        write_report(&mut out, &operators(), &population(), &stats, Direction::Maximize, report)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Iter #     Field      Value");
        assert_eq!(lines[1], "20         Best       4e0");
        assert_eq!(lines[2], "           Worst      0e0");
        assert_eq!(lines[3], "           Average    2e0");
    }

    #[test]
    fn test_print_population_marks_stale_members() {
        let mut pop = population();
        pop.get_mut(1).unwrap().genome_mut().set(0, true);
        let mut out = Vec::new();
        print_population(&mut out, &operators(), &pop).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("#   1: [0e0] [0e0] stale"));
        assert!(text.contains("#   0: [4e0] [0e0] up to date"));
    }
}
