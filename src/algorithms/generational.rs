//! Generational Genetic Algorithm
//!
//! This module implements an elitist generational genetic algorithm over a
//! memoized, minimized fitness function. The engine is an unbounded stream
//! of generations: each call to [`GenerationalGA::advance`] (or
//! [`Iterator::next`]) breeds one generation from the previous one, and the
//! caller decides when to stop.
//!
//! One generation runs these steps in order:
//!
//! 1. evaluate every individual without a cached fitness, sort ascending
//!    (stable), trim the cache and emit the population;
//! 2. keep the `elite` best as they are and fill every other slot with an
//!    independent selection over the whole population;
//! 3. trim the cache;
//! 4. for every non-elite slot, with probability `crossover_rate`, cross the
//!    slot's occupant with a partner drawn uniformly from the emitted
//!    population;
//! 5. evaluate, sort and trim again;
//! 6. keep the elites and fill every other slot with a mutated copy of an
//!    individual drawn uniformly from the crossed population.

use std::marker::PhantomData;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::diagnostics::{EvolutionResult, EvolutionStats, GenerationStats, PhaseTimings};
use crate::error::{EvoResult, EvolutionError};
use crate::fitness::cache::FitnessCache;
use crate::fitness::evaluator::{BatchEvaluator, DefaultEvaluator};
use crate::fitness::traits::{compare_optional, Fitness, FitnessValue};
use crate::genome::traits::EvolutionaryGenome;
use crate::operators::traits::{CrossoverOperator, MutationOperator, SelectionOperator};
use crate::termination::{EvolutionState, TerminationCriterion};

/// Configuration for the generational GA
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    /// Number of best individuals carried over unchanged
    pub elite_count: usize,
    /// Probability that a non-elite slot undergoes crossover
    pub crossover_rate: f64,
    /// Requested fitness cache capacity; never below the population size
    pub retain: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            elite_count: 20,
            crossover_rate: 0.7,
            retain: 0,
        }
    }
}

impl EvolutionConfig {
    /// Check the configuration against an initial population size
    pub fn validate(&self, population_size: usize) -> EvoResult<()> {
        if population_size == 0 {
            return Err(EvolutionError::EmptyPopulation);
        }
        if self.elite_count >= population_size {
            return Err(EvolutionError::InvalidConfiguration {
                elite: self.elite_count,
                population: population_size,
            });
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(EvolutionError::Configuration(format!(
                "Crossover rate must be within [0, 1], got {}",
                self.crossover_rate
            )));
        }
        Ok(())
    }

    /// Effective cache capacity for a population of the given size
    pub fn cache_capacity(&self, population_size: usize) -> usize {
        self.retain.max(population_size)
    }
}

/// Builder for GenerationalGA
pub struct GenerationalGABuilder<G, F, S, C, M, Fit, E>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    config: EvolutionConfig,
    population: Option<Vec<G>>,
    selection: Option<S>,
    crossover: Option<C>,
    mutation: Option<M>,
    fitness: Option<Fit>,
    evaluator: E,
    _phantom: PhantomData<F>,
}

impl<G, F> GenerationalGABuilder<G, F, (), (), (), (), DefaultEvaluator>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: EvolutionConfig::default(),
            population: None,
            selection: None,
            crossover: None,
            mutation: None,
            fitness: None,
            evaluator: DefaultEvaluator::default(),
            _phantom: PhantomData,
        }
    }
}

impl<G, F> Default for GenerationalGABuilder<G, F, (), (), (), (), DefaultEvaluator>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<G, F, S, C, M, Fit, E> GenerationalGABuilder<G, F, S, C, M, Fit, E>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Replace the whole configuration
    pub fn config(mut self, config: EvolutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the number of elite individuals to preserve
    pub fn elite_count(mut self, count: usize) -> Self {
        self.config.elite_count = count;
        self
    }

    /// Set the crossover rate
    pub fn crossover_rate(mut self, rate: f64) -> Self {
        self.config.crossover_rate = rate;
        self
    }

    /// Set the requested fitness cache capacity
    pub fn retain(mut self, retain: usize) -> Self {
        self.config.retain = retain;
        self
    }

    /// Set the initial population
    pub fn population<I>(mut self, population: I) -> Self
    where
        I: IntoIterator<Item = G>,
    {
        self.population = Some(population.into_iter().collect());
        self
    }

    /// Set the selection operator
    pub fn selection<NewS>(self, selection: NewS) -> GenerationalGABuilder<G, F, NewS, C, M, Fit, E>
    where
        NewS: SelectionOperator<G, F>,
    {
        GenerationalGABuilder {
            config: self.config,
            population: self.population,
            selection: Some(selection),
            crossover: self.crossover,
            mutation: self.mutation,
            fitness: self.fitness,
            evaluator: self.evaluator,
            _phantom: PhantomData,
        }
    }

    /// Set the crossover operator
    pub fn crossover<NewC>(self, crossover: NewC) -> GenerationalGABuilder<G, F, S, NewC, M, Fit, E>
    where
        NewC: CrossoverOperator<G>,
    {
        GenerationalGABuilder {
            config: self.config,
            population: self.population,
            selection: self.selection,
            crossover: Some(crossover),
            mutation: self.mutation,
            fitness: self.fitness,
            evaluator: self.evaluator,
            _phantom: PhantomData,
        }
    }

    /// Set the mutation operator
    pub fn mutation<NewM>(self, mutation: NewM) -> GenerationalGABuilder<G, F, S, C, NewM, Fit, E>
    where
        NewM: MutationOperator<G>,
    {
        GenerationalGABuilder {
            config: self.config,
            population: self.population,
            selection: self.selection,
            crossover: self.crossover,
            mutation: Some(mutation),
            fitness: self.fitness,
            evaluator: self.evaluator,
            _phantom: PhantomData,
        }
    }

    /// Set the fitness function
    pub fn fitness<NewFit>(self, fitness: NewFit) -> GenerationalGABuilder<G, F, S, C, M, NewFit, E>
    where
        NewFit: Fitness<Genome = G, Value = F>,
    {
        GenerationalGABuilder {
            config: self.config,
            population: self.population,
            selection: self.selection,
            crossover: self.crossover,
            mutation: self.mutation,
            fitness: Some(fitness),
            evaluator: self.evaluator,
            _phantom: PhantomData,
        }
    }

    /// Set the batch evaluator
    pub fn evaluator<NewE>(self, evaluator: NewE) -> GenerationalGABuilder<G, F, S, C, M, Fit, NewE> {
        GenerationalGABuilder {
            config: self.config,
            population: self.population,
            selection: self.selection,
            crossover: self.crossover,
            mutation: self.mutation,
            fitness: self.fitness,
            evaluator,
            _phantom: PhantomData,
        }
    }
}

impl<G, F, S, C, M, Fit, E> GenerationalGABuilder<G, F, S, C, M, Fit, E>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
    S: SelectionOperator<G, F>,
    C: CrossoverOperator<G>,
    M: MutationOperator<G>,
    Fit: Fitness<Genome = G, Value = F>,
    E: BatchEvaluator<Fit>,
{
    /// Build the GenerationalGA instance driven by `rng`
    #[allow(clippy::type_complexity)]
    pub fn build<R: Rng>(self, rng: R) -> EvoResult<GenerationalGA<G, F, S, C, M, Fit, E, R>> {
        let population = self.population.ok_or_else(|| {
            EvolutionError::Configuration("Initial population must be specified".to_string())
        })?;

        let selection = self.selection.ok_or_else(|| {
            EvolutionError::Configuration("Selection operator must be specified".to_string())
        })?;

        let crossover = self.crossover.ok_or_else(|| {
            EvolutionError::Configuration("Crossover operator must be specified".to_string())
        })?;

        let mutation = self.mutation.ok_or_else(|| {
            EvolutionError::Configuration("Mutation operator must be specified".to_string())
        })?;

        let fitness = self.fitness.ok_or_else(|| {
            EvolutionError::Configuration("Fitness function must be specified".to_string())
        })?;

        self.config.validate(population.len())?;

        let capacity = self.config.cache_capacity(population.len());
        debug!(
            population = population.len(),
            elite = self.config.elite_count,
            capacity,
            "building generational GA"
        );

        Ok(GenerationalGA {
            config: self.config,
            population,
            cache: FitnessCache::new(capacity),
            selection,
            crossover,
            mutation,
            fitness,
            evaluator: self.evaluator,
            rng,
            generation: 0,
            evaluations: 0,
            started: false,
            current: GenerationStats::from_fitness::<F>(&[], 0, 0),
            stats: EvolutionStats::new(),
            best_history: Vec::new(),
        })
    }
}

/// Build a generational GA from its parts
///
/// Equivalent to going through [`GenerationalGA::builder`]; fails with
/// [`EvolutionError::InvalidConfiguration`] when the elite count is not below
/// the population size.
#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn evolve<G, F, S, C, M, Fit, E, R>(
    population: Vec<G>,
    fitness: Fit,
    mutation: M,
    crossover: C,
    selection: S,
    evaluator: E,
    config: EvolutionConfig,
    rng: R,
) -> EvoResult<GenerationalGA<G, F, S, C, M, Fit, E, R>>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
    S: SelectionOperator<G, F>,
    C: CrossoverOperator<G>,
    M: MutationOperator<G>,
    Fit: Fitness<Genome = G, Value = F>,
    E: BatchEvaluator<Fit>,
    R: Rng,
{
    GenerationalGABuilder::new()
        .config(config)
        .population(population)
        .fitness(fitness)
        .mutation(mutation)
        .crossover(crossover)
        .selection(selection)
        .evaluator(evaluator)
        .build(rng)
}

/// Owned snapshot of one generation
#[derive(Clone, Debug)]
pub struct Generation<G, F> {
    /// Generation number, starting at 0
    pub generation: usize,
    /// Population sorted best first
    pub population: Vec<G>,
    /// Fitness of each member of `population`, in the same order
    pub fitness: Vec<F>,
    /// Statistics of this generation
    pub stats: GenerationStats,
}

impl<G, F> Generation<G, F> {
    /// Best individual and its fitness
    pub fn best(&self) -> Option<(&G, &F)> {
        self.population.first().zip(self.fitness.first())
    }
}

/// Borrowed view of the generation just produced
#[derive(Debug)]
pub struct GenerationView<'a, G, F>
where
    G: EvolutionaryGenome,
{
    /// Generation number, starting at 0
    pub generation: usize,
    /// Population sorted best first
    pub population: &'a [G],
    /// Fitness cache after this generation was evaluated
    pub cache: &'a FitnessCache<G, F>,
    /// Statistics of this generation
    pub stats: &'a GenerationStats,
}

impl<'a, G, F> GenerationView<'a, G, F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Best individual and its fitness
    pub fn best(&self) -> Option<(&'a G, &'a F)> {
        let best = self.population.first()?;
        self.cache.peek(best).map(|fitness| (best, fitness))
    }

    /// Fitness of a member without touching cache recency
    pub fn fitness_of(&self, genome: &G) -> Option<&'a F> {
        self.cache.peek(genome)
    }

    /// Copy the view into an owned snapshot
    pub fn to_generation(&self) -> Generation<G, F> {
        Generation {
            generation: self.generation,
            population: self.population.to_vec(),
            fitness: cached_fitness(self.population, self.cache),
            stats: self.stats.clone(),
        }
    }
}

/// Generational Genetic Algorithm
///
/// Owns the population, the fitness cache, the random source and the
/// statistics of every generation produced so far. Nothing is evaluated until
/// the first generation is requested.
pub struct GenerationalGA<G, F, S, C, M, Fit, E = DefaultEvaluator, R = StdRng>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    config: EvolutionConfig,
    population: Vec<G>,
    cache: FitnessCache<G, F>,
    selection: S,
    crossover: C,
    mutation: M,
    fitness: Fit,
    evaluator: E,
    rng: R,
    generation: usize,
    evaluations: usize,
    started: bool,
    current: GenerationStats,
    stats: EvolutionStats,
    best_history: Vec<f64>,
}

impl<G, F> GenerationalGA<G, F, (), (), (), (), DefaultEvaluator, StdRng>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Create a builder for GenerationalGA
    pub fn builder() -> GenerationalGABuilder<G, F, (), (), (), (), DefaultEvaluator> {
        GenerationalGABuilder::new()
    }
}

impl<G, F, S, C, M, Fit, E, R> GenerationalGA<G, F, S, C, M, Fit, E, R>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Configuration in use
    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Current population; sorted once a generation has been produced
    pub fn population(&self) -> &[G] {
        &self.population
    }

    /// Fitness cache
    pub fn cache(&self) -> &FitnessCache<G, F> {
        &self.cache
    }

    /// Number of the last produced generation
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Total fitness evaluations so far
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Statistics of every generation produced so far
    pub fn stats(&self) -> &EvolutionStats {
        &self.stats
    }
}

impl<G, F, S, C, M, Fit, E, R> GenerationalGA<G, F, S, C, M, Fit, E, R>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
    S: SelectionOperator<G, F>,
    C: CrossoverOperator<G>,
    M: MutationOperator<G>,
    Fit: Fitness<Genome = G, Value = F>,
    E: BatchEvaluator<Fit>,
    R: Rng,
{
    /// Produce the next generation and borrow it
    pub fn advance(&mut self) -> GenerationView<'_, G, F> {
        self.step();
        GenerationView {
            generation: self.generation,
            population: &self.population,
            cache: &self.cache,
            stats: &self.current,
        }
    }

    /// Run until `criterion` is met
    ///
    /// The criterion is checked after every produced generation, including
    /// the first. Calling `run` again continues from the current state: the
    /// criterion sees the whole fitness history, not only this call's.
    pub fn run<T>(&mut self, criterion: &T) -> EvoResult<EvolutionResult<G, F>>
    where
        T: TerminationCriterion<G, F> + ?Sized,
    {
        let start_time = Instant::now();

        let reason = loop {
            self.step();

            let fitness = cached_fitness(&self.population, &self.cache);
            let state = EvolutionState {
                generation: self.generation,
                evaluations: self.evaluations,
                best_fitness: self.current.best_fitness,
                population: &self.population,
                fitness: &fitness,
                fitness_history: &self.best_history,
            };
            if let Some(reason) = criterion.check(&state) {
                break reason;
            }
        };

        self.stats.runtime += start_time.elapsed();
        info!(
            generation = self.generation,
            evaluations = self.evaluations,
            best = self.current.best_fitness,
            evictions = self.cache.evictions(),
            %reason,
            "evolution finished"
        );
        self.stats.stop = Some(reason);

        let best_genome = self
            .population
            .first()
            .cloned()
            .ok_or(EvolutionError::EmptyPopulation)?;
        let best_fitness = self
            .cache
            .peek(&best_genome)
            .cloned()
            .ok_or(EvolutionError::EmptyPopulation)?;

        Ok(EvolutionResult {
            best_genome,
            best_fitness,
            generations: self.generation,
            evaluations: self.evaluations,
            stats: self.stats.clone(),
        })
    }

    fn step(&mut self) {
        let mut timings = PhaseTimings::default();

        if self.started {
            let elite = self.config.elite_count;
            let parents = std::mem::take(&mut self.population);

            let start = Instant::now();
            let selected =
                self.selection
                    .select_population(&parents, &mut self.cache, elite, &mut self.rng);
            self.cache.trim();
            timings.select = start.elapsed();

            let start = Instant::now();
            let offspring = self.recombine(&parents, selected);
            timings.recombine = start.elapsed();

            let start = Instant::now();
            let offspring = self.evaluate_and_sort(offspring);
            timings.evaluate += start.elapsed();

            let start = Instant::now();
            self.population = self.mutate(&offspring);
            timings.mutate = start.elapsed();

            self.generation += 1;
        } else {
            self.started = true;
        }

        let start = Instant::now();
        let population = std::mem::take(&mut self.population);
        self.population = self.evaluate_and_sort(population);
        timings.evaluate += start.elapsed();

        self.current =
            GenerationStats::observe(&self.population, &self.cache, self.generation, self.evaluations)
                .with_timings(timings);
        self.best_history.push(self.current.best_fitness);
        self.stats.record(self.current.clone());

        debug!(
            generation = self.generation,
            evaluations = self.evaluations,
            cache = self.cache.len(),
            best = self.current.best_fitness,
            mean = self.current.mean_fitness,
            "generation evaluated"
        );
    }

    /// Evaluate missing fitness, sort ascending and trim the cache
    ///
    /// Sorting reads every member through the cache, so the trim can only
    /// evict entries older than the whole population.
    fn evaluate_and_sort(&mut self, population: Vec<G>) -> Vec<G> {
        self.evaluations += self
            .cache
            .evaluate_missing(&population, &self.fitness, &self.evaluator);
        let sorted = sort_by_fitness(population, &mut self.cache);
        self.cache.trim();
        sorted
    }

    fn recombine(&mut self, parents: &[G], selected: Vec<G>) -> Vec<G> {
        let elite = self.config.elite_count;
        let rate = self.config.crossover_rate;
        let mut offspring = Vec::with_capacity(selected.len());
        for (slot, occupant) in selected.into_iter().enumerate() {
            if slot < elite || self.rng.gen::<f64>() >= rate {
                offspring.push(occupant);
                continue;
            }
            let partner = &parents[self.rng.gen_range(0..parents.len())];
            offspring.push(self.crossover.crossover(&occupant, partner, &mut self.rng));
        }
        offspring
    }

    fn mutate(&mut self, offspring: &[G]) -> Vec<G> {
        let elite = self.config.elite_count.min(offspring.len());
        let mut next = Vec::with_capacity(offspring.len());
        next.extend_from_slice(&offspring[..elite]);
        for _ in elite..offspring.len() {
            let mut child = offspring[self.rng.gen_range(0..offspring.len())].clone();
            self.mutation.mutate(&mut child, &mut self.rng);
            next.push(child);
        }
        next
    }
}

impl<G, F, S, C, M, Fit, E, R> Iterator for GenerationalGA<G, F, S, C, M, Fit, E, R>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
    S: SelectionOperator<G, F>,
    C: CrossoverOperator<G>,
    M: MutationOperator<G>,
    Fit: Fitness<Genome = G, Value = F>,
    E: BatchEvaluator<Fit>,
    R: Rng,
{
    type Item = Generation<G, F>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.advance().to_generation())
    }
}

/// Stable ascending sort by cached fitness; uncached members go last
fn sort_by_fitness<G, F>(population: Vec<G>, cache: &mut FitnessCache<G, F>) -> Vec<G>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    let mut keyed: Vec<(Option<F>, G)> = population
        .into_iter()
        .map(|genome| (cache.get(&genome).cloned(), genome))
        .collect();
    keyed.sort_by(|a, b| compare_optional(a.0.as_ref(), b.0.as_ref()));
    keyed.into_iter().map(|(_, genome)| genome).collect()
}

fn cached_fitness<G, F>(population: &[G], cache: &FitnessCache<G, F>) -> Vec<F>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    population
        .iter()
        .filter_map(|genome| cache.peek(genome).cloned())
        .collect()
}
