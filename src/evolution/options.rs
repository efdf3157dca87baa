//! # EvolutionOptions
//!
//! The `EvolutionOptions` struct holds every tunable of a run: population size, replacement
//! count, operator probabilities, the selection and reproduction schemes, the fitness
//! transform, the stopping rules, restart, and reporting.
//!
//! Options that do not depend on the genome are validated by [`EvolutionOptions::validate`],
//! which the builder calls in `build()`. Genome dependent checks and defaults (the mutation
//! probability defaults to `1 / string_length`) are resolved when the run is set up.
//!
//! ## Example
//!
//! ```rust
//! use pgalib::evolution::options::{EvolutionOptions, LogLevel};
//! use pgalib::fitness::Direction;
//! use pgalib::selection::SelectionType;
//!
//! // Create a new EvolutionOptions instance with custom parameters
//! let options = EvolutionOptions::builder()
//!     .direction(Direction::Minimize)
//!     .population_size(40)
//!     .max_iterations(500)
//!     .selection_type(SelectionType::StochasticUniversal)
//!     .log_level(LogLevel::Minimal)
//!     .build()
//!     .unwrap();
//! assert_eq!(options.get_num_replace(), 4);
//!
//! // Create a new EvolutionOptions instance with default parameters
//! let default_options = EvolutionOptions::default();
//! assert_eq!(default_options.get_population_size(), 100);
//! ```

use crate::{
    error::{GeneticError, Result},
    fitness::{Direction, FitnessMinType, FitnessParams, FitnessType},
    genome::CrossoverType,
    selection::SelectionType,
    strategy::{PopReplaceType, ReproductionPolicy},
};

/// How much the driver logs per generation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Every statistic of every generation.
    Verbose,
    /// The best evaluation of every generation.
    Minimal,
    /// Run start and finish only.
    #[default]
    None,
}

/// Optional report lines printed after the `Best` line.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportOptions {
    pub worst: bool,
    pub average: bool,
    pub offline: bool,
    pub online: bool,
    /// Mean pairwise Hamming distance, for representations that define one.
    pub hamming: bool,
    /// The best genome, printed with the representation's `print`.
    pub best_string: bool,
}

/// Stopping rules in addition to the iteration limit, which is always active.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoppingRules {
    /// Stop once the best evaluation is unchanged for `max_no_change` generations.
    pub no_change: bool,
    /// Stop once `max_similarity` percent of the population shares one evaluation.
    pub too_similar: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct EvolutionOptions {
    direction: Direction,
    population_size: usize,
    /// `None` resolves to `ceil(0.1 * population_size)`.
    num_replace: Option<usize>,
    max_iterations: usize,
    max_no_change: usize,
    max_similarity: usize,
    stopping_rules: StoppingRules,
    crossover_type: CrossoverType,
    crossover_prob: f64,
    uniform_crossover_prob: f64,
    /// `None` resolves to `1 / string_length` at setup.
    mutation_prob: Option<f64>,
    selection_type: SelectionType,
    tournament_prob: f64,
    reproduction: ReproductionPolicy,
    pop_replace: PopReplaceType,
    fitness_type: FitnessType,
    fitness_min_type: FitnessMinType,
    rank_max: f64,
    cmax_multiplier: f64,
    no_duplicates: bool,
    max_duplicate_attempts: usize,
    restart: bool,
    restart_frequency: usize,
    restart_allele_prob: f64,
    random_init: bool,
    print_frequency: usize,
    report_options: ReportOptions,
    log_level: LogLevel,
    seed: Option<u64>,
}

impl EvolutionOptions {
    /// Returns a builder for creating an `EvolutionOptions` instance.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pgalib::evolution::options::EvolutionOptions;
    ///
    /// let options = EvolutionOptions::builder()
    ///     .population_size(50)
    ///     .max_iterations(200)
    ///     .seed(7)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(options.get_seed(), Some(7));
    /// ```
    pub fn builder() -> EvolutionOptionsBuilder {
        EvolutionOptionsBuilder::default()
    }

    /// Checks every parameter that does not depend on the genome.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 || self.population_size % 2 != 0 {
            return Err(GeneticError::Configuration(format!(
                "Population size must be even and at least 2, got {}",
                self.population_size
            )));
        }
        if let Some(n) = self.num_replace {
            if n > self.population_size {
                return Err(GeneticError::Configuration(format!(
                    "Replacement count {} exceeds population size {}",
                    n, self.population_size
                )));
            }
        }
        for (name, p) in [
            ("Crossover probability", Some(self.crossover_prob)),
            ("Uniform crossover probability", Some(self.uniform_crossover_prob)),
            ("Tournament probability", Some(self.tournament_prob)),
            ("Restart allele probability", Some(self.restart_allele_prob)),
            ("Mutation probability", self.mutation_prob),
        ] {
            if let Some(p) = p {
                if !(0.0..=1.0).contains(&p) {
                    return Err(GeneticError::Configuration(format!(
                        "{} must lie in [0, 1], got {}",
                        name, p
                    )));
                }
            }
        }
        if !(1.0..=2.0).contains(&self.rank_max) {
            return Err(GeneticError::Configuration(format!(
                "Ranking maximum must lie in [1, 2], got {}",
                self.rank_max
            )));
        }
        if !self.cmax_multiplier.is_finite() || self.cmax_multiplier < 1.0 {
            return Err(GeneticError::InvalidNumericValue(format!(
                "Cmax multiplier must be finite and at least 1, got {}",
                self.cmax_multiplier
            )));
        }
        if self.max_similarity == 0 || self.max_similarity > 100 {
            return Err(GeneticError::Configuration(format!(
                "Maximum similarity must be a percentage in [1, 100], got {}",
                self.max_similarity
            )));
        }
        if self.max_no_change == 0 {
            return Err(GeneticError::Configuration(
                "Maximum no-change generations must be positive".to_string(),
            ));
        }
        if self.restart_frequency == 0 {
            return Err(GeneticError::Configuration(
                "Restart frequency must be positive".to_string(),
            ));
        }
        if self.print_frequency == 0 {
            return Err(GeneticError::Configuration(
                "Print frequency must be positive".to_string(),
            ));
        }
        if self.no_duplicates && self.stopping_rules.too_similar {
            return Err(GeneticError::Configuration(
                "Duplicate avoidance is inconsistent with the too-similar stopping rule"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// The fitness transform parameters of the run.
    pub fn fitness_params(&self) -> FitnessParams {
        FitnessParams {
            direction: self.direction,
            fitness_type: self.fitness_type,
            min_type: self.fitness_min_type,
            rank_max: self.rank_max,
            cmax_multiplier: self.cmax_multiplier,
        }
    }

    pub fn get_direction(&self) -> Direction {
        self.direction
    }

    pub fn get_population_size(&self) -> usize {
        self.population_size
    }

    /// The replacement count, defaulted to 10% of the population rounded up.
    pub fn get_num_replace(&self) -> usize {
        self.num_replace
            .unwrap_or_else(|| (self.population_size as f64 * 0.1).ceil() as usize)
    }

    pub fn get_max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn get_max_no_change(&self) -> usize {
        self.max_no_change
    }

    pub fn get_max_similarity(&self) -> usize {
        self.max_similarity
    }

    pub fn get_stopping_rules(&self) -> StoppingRules {
        self.stopping_rules
    }

    pub fn get_crossover_type(&self) -> CrossoverType {
        self.crossover_type
    }

    pub fn get_crossover_prob(&self) -> f64 {
        self.crossover_prob
    }

    pub fn get_uniform_crossover_prob(&self) -> f64 {
        self.uniform_crossover_prob
    }

    /// The configured mutation probability, `None` until resolved at setup.
    pub fn get_mutation_prob(&self) -> Option<f64> {
        self.mutation_prob
    }

    pub fn get_selection_type(&self) -> SelectionType {
        self.selection_type
    }

    pub fn get_tournament_prob(&self) -> f64 {
        self.tournament_prob
    }

    pub fn get_reproduction(&self) -> ReproductionPolicy {
        self.reproduction
    }

    pub fn get_pop_replace(&self) -> PopReplaceType {
        self.pop_replace
    }

    pub fn get_fitness_type(&self) -> FitnessType {
        self.fitness_type
    }

    pub fn get_fitness_min_type(&self) -> FitnessMinType {
        self.fitness_min_type
    }

    pub fn get_rank_max(&self) -> f64 {
        self.rank_max
    }

    pub fn get_cmax_multiplier(&self) -> f64 {
        self.cmax_multiplier
    }

    pub fn get_no_duplicates(&self) -> bool {
        self.no_duplicates
    }

    pub fn get_max_duplicate_attempts(&self) -> usize {
        self.max_duplicate_attempts
    }

    pub fn get_restart(&self) -> bool {
        self.restart
    }

    pub fn get_restart_frequency(&self) -> usize {
        self.restart_frequency
    }

    pub fn get_restart_allele_prob(&self) -> f64 {
        self.restart_allele_prob
    }

    pub fn get_random_init(&self) -> bool {
        self.random_init
    }

    pub fn get_print_frequency(&self) -> usize {
        self.print_frequency
    }

    pub fn get_report_options(&self) -> ReportOptions {
        self.report_options
    }

    pub fn get_log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn get_seed(&self) -> Option<u64> {
        self.seed
    }

    /// Sets the optimisation direction.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Sets the population size.
    pub fn set_population_size(&mut self, population_size: usize) {
        self.population_size = population_size;
    }

    /// Sets the number of members replaced each generation.
    pub fn set_num_replace(&mut self, num_replace: usize) {
        self.num_replace = Some(num_replace);
    }

    /// Sets the iteration limit.
    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }

    /// Sets the stopping rules.
    pub fn set_stopping_rules(&mut self, rules: StoppingRules) {
        self.stopping_rules = rules;
    }

    /// Sets the mutation probability.
    pub fn set_mutation_prob(&mut self, p: f64) {
        self.mutation_prob = Some(p);
    }

    /// Sets the crossover probability.
    pub fn set_crossover_prob(&mut self, p: f64) {
        self.crossover_prob = p;
    }

    /// Sets the selection scheme.
    pub fn set_selection_type(&mut self, selection_type: SelectionType) {
        self.selection_type = selection_type;
    }

    /// Turns duplicate avoidance on or off.
    pub fn set_no_duplicates(&mut self, no_duplicates: bool) {
        self.no_duplicates = no_duplicates;
    }

    /// Sets the report period in generations.
    pub fn set_print_frequency(&mut self, frequency: usize) {
        self.print_frequency = frequency;
    }

    /// Sets the optional report lines.
    pub fn set_report_options(&mut self, report: ReportOptions) {
        self.report_options = report;
    }

    /// Sets the log level.
    pub fn set_log_level(&mut self, log_level: LogLevel) {
        self.log_level = log_level;
    }

    /// Sets the base random seed.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
    }
}

impl Default for EvolutionOptions {
    fn default() -> Self {
        EvolutionOptionsBuilder::default().assemble()
    }
}

/// Builder for `EvolutionOptions`.
///
/// Provides a fluent interface for constructing `EvolutionOptions` instances.
#[derive(Debug, Clone, Default)]
pub struct EvolutionOptionsBuilder {
    direction: Option<Direction>,
    population_size: Option<usize>,
    num_replace: Option<usize>,
    max_iterations: Option<usize>,
    max_no_change: Option<usize>,
    max_similarity: Option<usize>,
    stopping_rules: Option<StoppingRules>,
    crossover_type: Option<CrossoverType>,
    crossover_prob: Option<f64>,
    uniform_crossover_prob: Option<f64>,
    mutation_prob: Option<f64>,
    selection_type: Option<SelectionType>,
    tournament_prob: Option<f64>,
    reproduction: Option<ReproductionPolicy>,
    pop_replace: Option<PopReplaceType>,
    fitness_type: Option<FitnessType>,
    fitness_min_type: Option<FitnessMinType>,
    rank_max: Option<f64>,
    cmax_multiplier: Option<f64>,
    no_duplicates: Option<bool>,
    max_duplicate_attempts: Option<usize>,
    restart: Option<bool>,
    restart_frequency: Option<usize>,
    restart_allele_prob: Option<f64>,
    random_init: Option<bool>,
    print_frequency: Option<usize>,
    report_options: Option<ReportOptions>,
    log_level: Option<LogLevel>,
    seed: Option<u64>,
}

impl EvolutionOptionsBuilder {
    /// Sets the optimisation direction. Defaults to maximisation.
    pub fn direction(mut self, value: Direction) -> Self {
        self.direction = Some(value);
        self
    }

    /// Sets the population size.
    pub fn population_size(mut self, value: usize) -> Self {
        self.population_size = Some(value);
        self
    }

    /// Sets the number of members replaced each generation.
    pub fn num_replace(mut self, value: usize) -> Self {
        self.num_replace = Some(value);
        self
    }

    /// Sets the iteration limit.
    pub fn max_iterations(mut self, value: usize) -> Self {
        self.max_iterations = Some(value);
        self
    }

    /// Sets the no-change limit.
    pub fn max_no_change(mut self, value: usize) -> Self {
        self.max_no_change = Some(value);
        self
    }

    /// Sets the similarity percentage that stops the run.
    pub fn max_similarity(mut self, value: usize) -> Self {
        self.max_similarity = Some(value);
        self
    }

    /// Sets the stopping rules.
    pub fn stopping_rules(mut self, value: StoppingRules) -> Self {
        self.stopping_rules = Some(value);
        self
    }

    pub fn crossover_type(mut self, value: CrossoverType) -> Self {
        self.crossover_type = Some(value);
        self
    }

    pub fn crossover_prob(mut self, value: f64) -> Self {
        self.crossover_prob = Some(value);
        self
    }

    pub fn uniform_crossover_prob(mut self, value: f64) -> Self {
        self.uniform_crossover_prob = Some(value);
        self
    }

    pub fn mutation_prob(mut self, value: f64) -> Self {
        self.mutation_prob = Some(value);
        self
    }

    pub fn selection_type(mut self, value: SelectionType) -> Self {
        self.selection_type = Some(value);
        self
    }

    pub fn tournament_prob(mut self, value: f64) -> Self {
        self.tournament_prob = Some(value);
        self
    }

    pub fn reproduction(mut self, value: ReproductionPolicy) -> Self {
        self.reproduction = Some(value);
        self
    }

    pub fn pop_replace(mut self, value: PopReplaceType) -> Self {
        self.pop_replace = Some(value);
        self
    }

    pub fn fitness_type(mut self, value: FitnessType) -> Self {
        self.fitness_type = Some(value);
        self
    }

    pub fn fitness_min_type(mut self, value: FitnessMinType) -> Self {
        self.fitness_min_type = Some(value);
        self
    }

    pub fn rank_max(mut self, value: f64) -> Self {
        self.rank_max = Some(value);
        self
    }

    pub fn cmax_multiplier(mut self, value: f64) -> Self {
        self.cmax_multiplier = Some(value);
        self
    }

    pub fn no_duplicates(mut self, value: bool) -> Self {
        self.no_duplicates = Some(value);
        self
    }

    pub fn max_duplicate_attempts(mut self, value: usize) -> Self {
        self.max_duplicate_attempts = Some(value);
        self
    }

    pub fn restart(mut self, value: bool) -> Self {
        self.restart = Some(value);
        self
    }

    pub fn restart_frequency(mut self, value: usize) -> Self {
        self.restart_frequency = Some(value);
        self
    }

    pub fn restart_allele_prob(mut self, value: f64) -> Self {
        self.restart_allele_prob = Some(value);
        self
    }

    pub fn random_init(mut self, value: bool) -> Self {
        self.random_init = Some(value);
        self
    }

    pub fn print_frequency(mut self, value: usize) -> Self {
        self.print_frequency = Some(value);
        self
    }

    pub fn report_options(mut self, value: ReportOptions) -> Self {
        self.report_options = Some(value);
        self
    }

    pub fn log_level(mut self, value: LogLevel) -> Self {
        self.log_level = Some(value);
        self
    }

    pub fn seed(mut self, value: u64) -> Self {
        self.seed = Some(value);
        self
    }

    fn assemble(self) -> EvolutionOptions {
        EvolutionOptions {
            direction: self.direction.unwrap_or(Direction::Maximize),
            population_size: self.population_size.unwrap_or(100),
            num_replace: self.num_replace,
            max_iterations: self.max_iterations.unwrap_or(1000),
            max_no_change: self.max_no_change.unwrap_or(100),
            max_similarity: self.max_similarity.unwrap_or(95),
            stopping_rules: self.stopping_rules.unwrap_or_default(),
            crossover_type: self.crossover_type.unwrap_or(CrossoverType::TwoPoint),
            crossover_prob: self.crossover_prob.unwrap_or(0.85),
            uniform_crossover_prob: self.uniform_crossover_prob.unwrap_or(0.6),
            mutation_prob: self.mutation_prob,
            selection_type: self.selection_type.unwrap_or_default(),
            tournament_prob: self.tournament_prob.unwrap_or(0.6),
            reproduction: self.reproduction.unwrap_or_default(),
            pop_replace: self.pop_replace.unwrap_or_default(),
            fitness_type: self.fitness_type.unwrap_or_default(),
            fitness_min_type: self.fitness_min_type.unwrap_or_default(),
            rank_max: self.rank_max.unwrap_or(1.2),
            cmax_multiplier: self.cmax_multiplier.unwrap_or(1.01),
            no_duplicates: self.no_duplicates.unwrap_or(false),
            max_duplicate_attempts: self.max_duplicate_attempts.unwrap_or(100),
            restart: self.restart.unwrap_or(false),
            restart_frequency: self.restart_frequency.unwrap_or(50),
            restart_allele_prob: self.restart_allele_prob.unwrap_or(0.5),
            random_init: self.random_init.unwrap_or(true),
            print_frequency: self.print_frequency.unwrap_or(10),
            report_options: self.report_options.unwrap_or_default(),
            log_level: self.log_level.unwrap_or_default(),
            seed: self.seed,
        }
    }

    /// Builds and validates the `EvolutionOptions` instance.
    pub fn build(self) -> Result<EvolutionOptions> {
        let options = self.assemble();
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let o = EvolutionOptions::default();
        assert_eq!(o.get_population_size(), 100);
        assert_eq!(o.get_max_iterations(), 1000);
        assert_eq!(o.get_max_no_change(), 100);
        assert_eq!(o.get_max_similarity(), 95);
        assert_eq!(o.get_num_replace(), 10);
        assert_eq!(o.get_crossover_type(), CrossoverType::TwoPoint);
        assert_eq!(o.get_selection_type(), SelectionType::Tournament);
        assert_eq!(o.get_reproduction(), ReproductionPolicy::MutationOrCrossover);
        assert_eq!(o.get_crossover_prob(), 0.85);
        assert_eq!(o.get_mutation_prob(), None);
        assert_eq!(o.get_restart_frequency(), 50);
        assert_eq!(o.get_print_frequency(), 10);
        assert!(o.get_random_init());
        assert!(o.validate().is_ok());
    }

    #[test]
    fn test_num_replace_rounds_up() {
        let o = EvolutionOptions::builder().population_size(42).build().unwrap();
        assert_eq!(o.get_num_replace(), 5);
    }

    #[test]
    fn test_odd_population_rejected() {
        let err = EvolutionOptions::builder().population_size(7).build().unwrap_err();
        assert!(matches!(err, GeneticError::Configuration(_)));
    }

    #[test]
    fn test_probability_range_checked() {
        assert!(EvolutionOptions::builder().crossover_prob(1.5).build().is_err());
        assert!(EvolutionOptions::builder().mutation_prob(-0.1).build().is_err());
        assert!(EvolutionOptions::builder().rank_max(2.5).build().is_err());
    }

    #[test]
    fn test_cmax_multiplier_below_one_rejected() {
        assert!(matches!(
            EvolutionOptions::builder().cmax_multiplier(0.5).build(),
            Err(GeneticError::InvalidNumericValue(_))
        ));
        assert!(EvolutionOptions::builder().cmax_multiplier(1.0).build().is_ok());
    }

    #[test]
    fn test_duplicates_and_similarity_conflict() {
        let result = EvolutionOptions::builder()
            .no_duplicates(true)
            .stopping_rules(StoppingRules {
                too_similar: true,
                ..StoppingRules::default()
            })
            .build();
        match result {
            Err(GeneticError::Configuration(msg)) => assert!(msg.contains("too-similar")),
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_setters_are_revalidated() {
        let mut o = EvolutionOptions::default();
        o.set_population_size(3);
        assert!(o.validate().is_err());
        o.set_population_size(4);
        o.set_num_replace(5);
        assert!(o.validate().is_err());
    }
}
