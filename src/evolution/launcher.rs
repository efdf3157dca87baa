use std::cell::Cell;
use std::fmt;
use std::io::Write;

use tracing::{debug, info};

use super::{
    builder::GeneticAlgorithmBuilder,
    challenge::Challenge,
    options::{EvolutionOptions, LogLevel, ReportOptions},
    report::{print_population, write_report, Statistics},
    restart::restart,
    stopping::{check_stopping_conditions, similarity},
};
use crate::{
    error::{GeneticError, OptionExt, Result},
    fitness::apply_fitness,
    genome::{OperatorTable, Representation},
    parallel::{scheduler, Communicator, SingleProcess},
    population::{Population, PopulationId},
    rng::RandomNumberGenerator,
    selection::{MatingPool, SelectionStrategy},
    strategy::{BreedConfig, BreedStrategy},
};

/// A user stopping predicate. Replaces the built-in rules.
pub type StopConditionFn<R> = Box<dyn Fn(&GeneticAlgorithm<R>) -> Result<bool> + Send>;

/// A hook run after every completed generation.
pub type EndOfGenerationFn<G> = Box<dyn FnMut(usize, &mut Population<G>) + Send>;

/// The outcome of a run, as seen by rank 0.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary<G> {
    /// The best genome of the final population.
    pub best: G,
    /// Its evaluation.
    pub best_evaluation: f64,
    /// Completed generations.
    pub iterations: usize,
    /// Best evaluation of the initial population, then of every completed generation.
    pub trajectory: Vec<f64>,
    pub statistics: Statistics,
}

/// The run context: parameters, both population buffers, the random stream,
/// the bound operators and the running statistics.
///
/// Every rank of a run owns one. Rank 0 makes every decision; the other ranks only
/// take part in the evaluation passes.
pub struct GeneticAlgorithm<R: Representation> {
    pub(super) operators: OperatorTable<R>,
    pub(super) options: EvolutionOptions,
    pub(super) breed_config: BreedConfig,
    pub(super) breed_strategy: Box<dyn BreedStrategy<R>>,
    pub(super) selection_strategy: Box<dyn SelectionStrategy>,
    pub(super) pool: MatingPool,
    pub(super) old: Population<R::Genome>,
    pub(super) new: Population<R::Genome>,
    pub(super) rng: RandomNumberGenerator,
    pub(super) rank: usize,
    pub(super) stats: Statistics,
    pub(super) trajectory: Vec<f64>,
    pub(super) stop_condition: Option<StopConditionFn<R>>,
    pub(super) in_stop_condition: Cell<bool>,
    pub(super) end_of_generation: Option<EndOfGenerationFn<R::Genome>>,
    pub(super) report_sink: Option<Box<dyn Write + Send>>,
}

impl<R: Representation> GeneticAlgorithm<R> {
    /// Starts the setup of a run.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pgalib::evolution::{EvolutionOptions, GeneticAlgorithm};
    /// use pgalib::genome::{BinaryRepresentation, BinaryString};
    ///
    /// let options = EvolutionOptions::builder()
    ///     .population_size(30)
    ///     .max_iterations(50)
    ///     .seed(1)
    ///     .build()
    ///     .unwrap();
    /// let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(16), options)
    ///     .build()
    ///     .unwrap();
    /// let summary = ga.run(&|g: &BinaryString| g.count_ones() as f64).unwrap();
    /// assert_eq!(summary.iterations, 51);
    /// assert!(summary.best_evaluation >= 10.0);
    /// ```
    pub fn builder(representation: R, options: EvolutionOptions) -> GeneticAlgorithmBuilder<R> {
        GeneticAlgorithmBuilder::new(representation, options)
    }

    /// Runs the whole algorithm in this process.
    pub fn run<C>(&mut self, challenge: &C) -> Result<RunSummary<R::Genome>>
    where
        C: Challenge<R::Genome> + ?Sized,
    {
        self.run_distributed(challenge, &SingleProcess)?
            .ok_or_else_genetic(|| {
                GeneticError::Other("A single process run produced no summary".to_string())
            })
    }

    /// Runs the algorithm as one rank of a group.
    ///
    /// Every rank must call this with the same options. Rank 0 returns the summary,
    /// every other rank returns `None` once rank 0 decides the run is over.
    ///
    /// # Errors
    ///
    /// Fails on a rank mismatch between setup and `comm`, on a transport failure,
    /// on a failing stop condition, or when the fitness transform rejects the
    /// evaluations.
    #[tracing::instrument(
        level = "info",
        skip_all,
        fields(rank = comm.rank(), population = self.options.get_population_size())
    )]
    pub fn run_distributed<C, M>(
        &mut self,
        challenge: &C,
        comm: &M,
    ) -> Result<Option<RunSummary<R::Genome>>>
    where
        C: Challenge<R::Genome> + ?Sized,
        M: Communicator + ?Sized,
    {
        if comm.rank() != self.rank {
            return Err(GeneticError::Configuration(format!(
                "Context was set up for rank {} but runs as rank {}",
                self.rank,
                comm.rank()
            )));
        }
        let root = comm.rank() == 0;
        let params = self.options.fitness_params();
        if root {
            info!(ranks = comm.size(), "Starting run");
        }

        self.evaluate_pass(PopulationId::Old, challenge, comm)?;
        if root {
            apply_fitness(&mut self.old, &params)?;
            let best = self.old.best_index(params.direction)?;
            self.trajectory.push(self.old.get(best)?.evaluation());
        }

        loop {
            let done = if root { self.done()? } else { false };
            if comm.broadcast_flag(done)? {
                break;
            }

            let restarted = if root { self.restart_or_breed()? } else { false };
            let restarted = comm.broadcast_flag(restarted)?;

            self.evaluate_pass(PopulationId::New, challenge, comm)?;
            if root {
                apply_fitness(&mut self.new, &params)?;
                if restarted {
                    std::mem::swap(&mut self.old, &mut self.new);
                } else {
                    self.update_generation()?;
                }
            }

            // The end-of-generation hook may have edited the current buffer.
            let stale = root && !self.old.pending().is_empty();
            if comm.broadcast_flag(stale)? {
                self.evaluate_pass(PopulationId::Old, challenge, comm)?;
                if root {
                    apply_fitness(&mut self.old, &params)?;
                }
            }

            if root && !restarted {
                self.report()?;
            }
        }

        if !root {
            debug!("Worker finished");
            return Ok(None);
        }
        let best = self.old.best_index(params.direction)?;
        let member = self.old.get(best)?;
        info!(
            iterations = self.stats.iteration,
            best = member.evaluation(),
            "Run finished"
        );
        Ok(Some(RunSummary {
            best: member.genome().clone(),
            best_evaluation: member.evaluation(),
            iterations: self.stats.iteration,
            trajectory: self.trajectory.clone(),
            statistics: self.stats.clone(),
        }))
    }

    fn evaluate_pass<C, M>(&mut self, id: PopulationId, challenge: &C, comm: &M) -> Result<()>
    where
        C: Challenge<R::Genome> + ?Sized,
        M: Communicator + ?Sized,
    {
        let representation = self.operators.representation();
        if comm.rank() != 0 {
            scheduler::run_worker(representation, challenge, comm)?;
            return Ok(());
        }
        let pop = match id {
            PopulationId::Old => &mut self.old,
            PopulationId::New => &mut self.new,
        };
        scheduler::evaluate(representation, pop, challenge, comm)?;
        Ok(())
    }

    /// Builds the next buffer, by restart when it is due and by selection and
    /// reproduction otherwise. Returns true for a restart.
    fn restart_or_breed(&mut self) -> Result<bool> {
        let frequency = self.options.get_restart_frequency();
        let due = self.stats.iters_of_same > 0 && self.stats.iters_of_same % frequency == 0;
        if self.options.get_restart() && due {
            self.stats.iters_of_same += 1;
            restart(
                &self.operators,
                &self.old,
                &mut self.new,
                self.options.get_direction(),
                self.options.get_restart_allele_prob(),
                &mut self.rng,
            )?;
            return Ok(true);
        }

        self.pool.fill(
            self.selection_strategy.as_ref(),
            &self.old.fitness_values(),
            &mut self.rng,
        )?;
        self.breed_strategy.breed(
            &self.operators,
            &self.breed_config,
            &mut self.pool,
            &self.old,
            &mut self.new,
            &mut self.rng,
        )?;
        Ok(false)
    }

    /// Closes a generation: statistics, the end-of-generation hook, buffer swap.
    fn update_generation(&mut self) -> Result<()> {
        let direction = self.options.get_direction();
        let evaluations = self.new.evaluations();
        let best = self.new.get(self.new.best_index(direction)?)?.evaluation();

        self.stats.iteration += 1;
        self.stats.update_average(&evaluations);
        self.stats.update_online(&evaluations);
        self.stats.update_offline(best);
        self.stats.track_best(best);
        if self.options.get_stopping_rules().too_similar {
            self.stats.percent_same = similarity(&evaluations);
        }
        self.trajectory.push(best);

        match self.options.get_log_level() {
            LogLevel::Verbose => info!(
                iteration = self.stats.iteration,
                best,
                average = self.stats.average,
                online = self.stats.online,
                offline = self.stats.offline,
                iters_of_same = self.stats.iters_of_same,
                "Generation complete"
            ),
            LogLevel::Minimal => info!(iteration = self.stats.iteration, best, "Generation complete"),
            LogLevel::None => {}
        }

        if let Some(hook) = self.end_of_generation.as_mut() {
            hook(self.stats.iteration, &mut self.new);
        }
        std::mem::swap(&mut self.old, &mut self.new);
        Ok(())
    }

    fn report(&mut self) -> Result<()> {
        if self.stats.iteration % self.options.get_print_frequency() != 0 {
            return Ok(());
        }
        if let Some(sink) = self.report_sink.as_mut() {
            write_report(
                sink.as_mut(),
                &self.operators,
                &self.old,
                &self.stats,
                self.options.get_direction(),
                self.options.get_report_options(),
            )?;
        }
        Ok(())
    }

    /// Decides on rank 0 whether the run is over.
    ///
    /// Uses the stop condition when one is installed, the built-in rules otherwise.
    ///
    /// # Errors
    ///
    /// Fails when called from inside the stop condition, which would never return.
    pub fn done(&self) -> Result<bool> {
        match &self.stop_condition {
            Some(stop) => {
                if self.in_stop_condition.replace(true) {
                    return Err(GeneticError::Configuration(
                        "The stop condition must not call done(), use check_stopping_conditions()"
                            .to_string(),
                    ));
                }
                let result = stop(self);
                self.in_stop_condition.set(false);
                result
            }
            None => Ok(self.check_stopping_conditions()),
        }
    }

    /// The built-in stopping rules.
    pub fn check_stopping_conditions(&self) -> bool {
        check_stopping_conditions(&self.options, &self.stats)
    }

    pub fn population(&self, id: PopulationId) -> &Population<R::Genome> {
        match id {
            PopulationId::Old => &self.old,
            PopulationId::New => &self.new,
        }
    }

    /// Mutable access to a buffer, for seeding or editing members before a run.
    pub fn population_mut(&mut self, id: PopulationId) -> &mut Population<R::Genome> {
        match id {
            PopulationId::Old => &mut self.old,
            PopulationId::New => &mut self.new,
        }
    }

    /// Index of the best member of a buffer.
    pub fn best_index(&self, id: PopulationId) -> Result<usize> {
        self.population(id).best_index(self.options.get_direction())
    }

    pub fn operators(&self) -> &OperatorTable<R> {
        &self.operators
    }

    pub fn options(&self) -> &EvolutionOptions {
        &self.options
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Completed generations.
    pub fn iteration(&self) -> usize {
        self.stats.iteration
    }

    /// The best evaluation of the initial population, then of every completed generation.
    pub fn trajectory(&self) -> &[f64] {
        &self.trajectory
    }

    /// The resolved mutation probability.
    pub fn mutation_prob(&self) -> f64 {
        self.breed_config.mutation_prob
    }

    /// The resolved replacement count.
    pub fn num_replace(&self) -> usize {
        self.breed_config.num_replace
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    /// Changes the report period. Allowed at any time.
    pub fn set_print_frequency(&mut self, frequency: usize) -> Result<()> {
        if frequency == 0 {
            return Err(GeneticError::Configuration(
                "Print frequency must be positive".to_string(),
            ));
        }
        self.options.set_print_frequency(frequency);
        Ok(())
    }

    /// Changes the optional report lines. Allowed at any time.
    pub fn set_report_options(&mut self, report: ReportOptions) {
        self.options.set_report_options(report);
    }

    /// Writes every member of a buffer to `sink`.
    pub fn print_population(&self, sink: &mut dyn Write, id: PopulationId) -> Result<()> {
        print_population(sink, &self.operators, self.population(id))
    }
}

impl<R: Representation> fmt::Debug for GeneticAlgorithm<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneticAlgorithm")
            .field("operators", &self.operators)
            .field("options", &self.options)
            .field("breed_strategy", &self.breed_strategy)
            .field("selection_strategy", &self.selection_strategy)
            .field("rank", &self.rank)
            .field("stats", &self.stats)
            .field("stop_condition", &self.stop_condition.is_some())
            .field("end_of_generation", &self.end_of_generation.is_some())
            .field("report_sink", &self.report_sink.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::evolution::options::StoppingRules;
    use crate::genome::{BinaryRepresentation, BinaryString};

    fn ones(g: &BinaryString) -> f64 {
        g.count_ones() as f64
    }

    fn options(max_iterations: usize) -> EvolutionOptions {
        EvolutionOptions::builder()
            .population_size(20)
            .max_iterations(max_iterations)
            .seed(5)
            .build()
            .unwrap()
    }

    /// A `Write` whose contents stay readable after the run takes ownership.
    #[derive(Clone, Default)]
    struct SharedSink(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_iteration_limit_runs_one_past_max() {
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(16), options(7))
            .build()
            .unwrap();
        let summary = ga.run(&ones).unwrap();
        assert_eq!(summary.iterations, 8);
        assert_eq!(summary.trajectory.len(), 9);
        assert_eq!(ga.iteration(), 8);
    }

    #[test]
    fn test_trajectory_never_drops_below_elite() {
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(24), options(30))
            .build()
            .unwrap();
        let summary = ga.run(&ones).unwrap();
        for pair in summary.trajectory.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert_eq!(summary.best_evaluation, *summary.trajectory.last().unwrap());
        assert_eq!(summary.best.count_ones() as f64, summary.best_evaluation);
    }

    #[test]
    fn test_same_seed_same_run() {
        let run = || {
            GeneticAlgorithm::builder(BinaryRepresentation::new(24), options(15))
                .build()
                .unwrap()
                .run(&ones)
                .unwrap()
        };
        assert_eq!(run().trajectory, run().trajectory);
    }

    #[test]
    fn test_stop_condition_replaces_builtin_rules() {
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(16), options(1000))
            .with_stop_condition(|ga| Ok(ga.iteration() >= 3))
            .build()
            .unwrap();
        assert_eq!(ga.run(&ones).unwrap().iterations, 3);
    }

    #[test]
    fn test_stop_condition_cannot_call_done() {
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(16), options(10))
            .with_stop_condition(|ga| ga.done())
            .build()
            .unwrap();
        assert!(matches!(ga.run(&ones), Err(GeneticError::Configuration(_))));
    }

    #[test]
    fn test_no_change_rule() {
        let o = EvolutionOptions::builder()
            .population_size(10)
            .max_no_change(4)
            .stopping_rules(StoppingRules {
                no_change: true,
                ..StoppingRules::default()
            })
            .seed(2)
            .build()
            .unwrap();
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(8), o)
            .build()
            .unwrap();
        // A flat landscape never improves.
        let summary = ga.run(&|_: &BinaryString| 1.0).unwrap();
        assert_eq!(summary.iterations, 4);
        assert_eq!(summary.statistics.iters_of_same, 4);
    }

    #[test]
    fn test_end_of_generation_hook_sees_every_generation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let record = Arc::clone(&seen);
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(16), options(4))
            .with_end_of_generation(move |iteration, _pop| record.lock().unwrap().push(iteration))
            .build()
            .unwrap();
        ga.run(&ones).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_hook_edits_are_reevaluated() {
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(16), options(3))
            .with_end_of_generation(|_, pop| {
                let genome = pop.get_mut(0).unwrap().genome_mut();
                for i in 0..genome.len() {
                    genome.set(i, true);
                }
            })
            .build()
            .unwrap();
        let summary = ga.run(&ones).unwrap();
        assert_eq!(summary.best_evaluation, 16.0);
        assert!(ga.population(PopulationId::Old).pending().is_empty());
    }

    #[test]
    fn test_restart_does_not_count_as_generation() {
        let o = EvolutionOptions::builder()
            .population_size(10)
            .max_iterations(12)
            .restart(true)
            .restart_frequency(3)
            .seed(8)
            .build()
            .unwrap();
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(8), o)
            .build()
            .unwrap();
        let summary = ga.run(&|_: &BinaryString| 0.0).unwrap();
        // Restarts happen but only completed generations are counted.
        assert_eq!(summary.iterations, 13);
        assert_eq!(summary.trajectory.len(), 14);
    }

    #[test]
    fn test_report_written_every_print_frequency() {
        let sink = SharedSink::default();
        let o = EvolutionOptions::builder()
            .population_size(10)
            .max_iterations(9)
            .print_frequency(5)
            .seed(4)
            .build()
            .unwrap();
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(8), o)
            .with_report_sink(Box::new(sink.clone()))
            .build()
            .unwrap();
        ga.run(&ones).unwrap();
        let text = String::from_utf8(sink.0.lock().unwrap().clone()).unwrap();
        let best_lines: Vec<&str> = text.lines().filter(|l| l.contains("Best")).collect();
        assert_eq!(best_lines.len(), 2);
        assert!(best_lines[0].starts_with("5 "));
        assert!(best_lines[1].starts_with("10 "));
    }

    #[test]
    fn test_print_frequency_must_be_positive() {
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(8), options(1))
            .build()
            .unwrap();
        assert!(ga.set_print_frequency(0).is_err());
        assert!(ga.set_print_frequency(3).is_ok());
        assert_eq!(ga.options().get_print_frequency(), 3);
    }

    #[test]
    fn test_rank_mismatch_rejected() {
        let mut ga = GeneticAlgorithm::builder(BinaryRepresentation::new(8), options(1))
            .with_rank(2)
            .build()
            .unwrap();
        assert!(matches!(ga.run(&ones), Err(GeneticError::Configuration(_))));
    }
}
