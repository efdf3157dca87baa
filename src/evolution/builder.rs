use std::cell::Cell;
use std::io::Write;

use tracing::{debug, warn};

use crate::{
    error::{GeneticError, Result},
    genome::{CrossoverParams, CrossoverType, OperatorTable, Overrides, Representation},
    population::Population,
    rng::RandomNumberGenerator,
    selection::MatingPool,
    strategy::BreedConfig,
};

use super::{
    launcher::{EndOfGenerationFn, GeneticAlgorithm, StopConditionFn},
    options::EvolutionOptions,
    report::Statistics,
};

/// Setup of a [`GeneticAlgorithm`].
///
/// Everything structural is fixed by [`build`](Self::build): the operator table, the
/// resolved parameters and both population buffers. There is no way to change them
/// afterwards.
pub struct GeneticAlgorithmBuilder<R: Representation> {
    representation: R,
    options: EvolutionOptions,
    overrides: Overrides<R::Genome>,
    stop_condition: Option<StopConditionFn<R>>,
    end_of_generation: Option<EndOfGenerationFn<R::Genome>>,
    report_sink: Option<Box<dyn Write + Send>>,
    rank: usize,
}

impl<R: Representation> GeneticAlgorithmBuilder<R> {
    pub fn new(representation: R, options: EvolutionOptions) -> Self {
        Self {
            representation,
            options,
            overrides: Overrides::default(),
            stop_condition: None,
            end_of_generation: None,
            report_sink: None,
            rank: 0,
        }
    }

    /// Replaces operators of the representation for this run.
    pub fn with_overrides(mut self, overrides: Overrides<R::Genome>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replaces the built-in stopping rules with `stop`.
    ///
    /// The predicate may call [`GeneticAlgorithm::check_stopping_conditions`] to extend
    /// the built-in rules, but not [`GeneticAlgorithm::done`].
    pub fn with_stop_condition<F>(mut self, stop: F) -> Self
    where
        F: Fn(&GeneticAlgorithm<R>) -> Result<bool> + Send + 'static,
    {
        self.stop_condition = Some(Box::new(stop));
        self
    }

    /// Installs a hook run on rank 0 after every completed generation, with the
    /// iteration number and the generation just built.
    pub fn with_end_of_generation<F>(mut self, hook: F) -> Self
    where
        F: FnMut(usize, &mut Population<R::Genome>) + Send + 'static,
    {
        self.end_of_generation = Some(Box::new(hook));
        self
    }

    /// Sends the periodic report to `sink`. Without a sink no report is written.
    pub fn with_report_sink(mut self, sink: Box<dyn Write + Send>) -> Self {
        self.report_sink = Some(sink);
        self
    }

    /// The rank this context will run as. Seeds the generator with `seed + rank`.
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank;
        self
    }

    pub fn build(self) -> Result<GeneticAlgorithm<R>> {
        let options = self.options;
        options.validate()?;
        self.representation.validate()?;

        let len = self.representation.string_length();
        if len < 2 {
            return Err(GeneticError::Configuration(format!(
                "String length must be greater than one, got {}",
                len
            )));
        }
        if options.get_crossover_type() == CrossoverType::TwoPoint && len < 3 {
            return Err(GeneticError::Configuration(format!(
                "Two-point crossover needs a string length above two, got {}",
                len
            )));
        }

        let mutation_prob = options.get_mutation_prob().unwrap_or(1.0 / len as f64);
        let num_replace = options.get_num_replace();
        if num_replace == 0 {
            warn!("Replacement count is zero, the population will never change");
        }

        let mut rng = RandomNumberGenerator::for_rank(options.get_seed(), self.rank);
        let operators = OperatorTable::new(
            self.representation,
            self.overrides,
            CrossoverParams {
                kind: options.get_crossover_type(),
                uniform_prob: options.get_uniform_crossover_prob(),
            },
        );

        let size = options.get_population_size();
        let random_init = options.get_random_init();
        let old = Population::new(size, |_| operators.create(random_init, &mut rng));
        let new = Population::new(size, |_| operators.create(false, &mut rng));

        let breed_config = BreedConfig {
            crossover_prob: options.get_crossover_prob(),
            mutation_prob,
            num_replace,
            pop_replace: options.get_pop_replace(),
            no_duplicates: options.get_no_duplicates(),
            max_duplicate_attempts: options.get_max_duplicate_attempts(),
        };
        debug!(
            rank = self.rank,
            size,
            len,
            mutation_prob,
            num_replace,
            "Run context set up"
        );

        Ok(GeneticAlgorithm {
            breed_strategy: options.get_reproduction().strategy(),
            selection_strategy: options
                .get_selection_type()
                .strategy(options.get_tournament_prob()),
            operators,
            breed_config,
            options,
            pool: MatingPool::new(),
            old,
            new,
            rng,
            rank: self.rank,
            stats: Statistics::default(),
            trajectory: Vec::new(),
            stop_condition: self.stop_condition,
            in_stop_condition: Cell::new(false),
            end_of_generation: self.end_of_generation,
            report_sink: self.report_sink,
        })
    }
}
