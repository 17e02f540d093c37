//! Termination criteria
//!
//! The generation stream never ends on its own. [`GenerationalGA::run`]
//! consults a criterion after every generation it produces and stops at the
//! first [`StopReason`] the criterion reports.
//!
//! [`GenerationalGA::run`]: crate::algorithms::generational::GenerationalGA::run

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagnostics::diversity;
use crate::fitness::traits::FitnessValue;
use crate::genome::traits::EvolutionaryGenome;

/// Snapshot handed to a criterion after each generation
#[derive(Clone, Debug)]
pub struct EvolutionState<'a, G, F = f64>
where
    G: EvolutionaryGenome,
    F: FitnessValue,
{
    /// Number of the generation just produced
    pub generation: usize,
    /// Total fitness evaluations so far
    pub evaluations: usize,
    /// Best fitness of the current generation
    pub best_fitness: f64,
    /// Current population, sorted best first
    pub population: &'a [G],
    /// Fitness of each member of `population`, in the same order
    pub fitness: &'a [F],
    /// Best fitness of every generation the engine has produced, oldest first
    pub fitness_history: &'a [f64],
}

/// Why a run stopped
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StopReason {
    /// The generation limit was reached
    MaxGenerations(usize),
    /// The evaluation budget was used up
    MaxEvaluations(usize),
    /// The best fitness reached the target
    TargetReached {
        /// Best fitness at the time of the check
        best: f64,
        /// Target plus tolerance
        target: f64,
    },
    /// The best fitness did not improve enough over a window of generations
    Stagnated {
        /// Number of generations looked back
        window: usize,
    },
    /// Too few distinct individuals remained
    LowDiversity(f64),
    /// Every criterion of an [`AllOf`] fired
    All(Vec<StopReason>),
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::MaxGenerations(limit) => write!(f, "reached generation {}", limit),
            StopReason::MaxEvaluations(limit) => write!(f, "used {} evaluations", limit),
            StopReason::TargetReached { best, target } => {
                write!(f, "best fitness {} within target {}", best, target)
            }
            StopReason::Stagnated { window } => {
                write!(f, "no improvement over {} generations", window)
            }
            StopReason::LowDiversity(diversity) => write!(f, "diversity fell to {:.3}", diversity),
            StopReason::All(reasons) => {
                let parts: Vec<String> = reasons.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(" and "))
            }
        }
    }
}

/// Decides when a run stops
pub trait TerminationCriterion<G: EvolutionaryGenome, F: FitnessValue = f64> {
    /// Reason to stop after the current generation, if any
    fn check(&self, state: &EvolutionState<'_, G, F>) -> Option<StopReason>;

    /// Check if evolution should terminate
    fn should_terminate(&self, state: &EvolutionState<'_, G, F>) -> bool {
        self.check(state).is_some()
    }
}

/// Stop once generation `n` has been produced
///
/// Generations are numbered from 0, so a run stopped by `MaxGenerations(n)`
/// has produced `n + 1` generations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxGenerations(pub usize);

impl MaxGenerations {
    /// Create a new max generations criterion
    pub fn new(max: usize) -> Self {
        Self(max)
    }
}

impl<G: EvolutionaryGenome, F: FitnessValue> TerminationCriterion<G, F> for MaxGenerations {
    fn check(&self, state: &EvolutionState<'_, G, F>) -> Option<StopReason> {
        (state.generation >= self.0).then_some(StopReason::MaxGenerations(self.0))
    }
}

/// Stop once the fitness function has been called `n` times
///
/// Cache hits are free, so a converged population can run for many
/// generations without spending evaluations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxEvaluations(pub usize);

impl MaxEvaluations {
    /// Create a new max evaluations criterion
    pub fn new(max: usize) -> Self {
        Self(max)
    }
}

impl<G: EvolutionaryGenome, F: FitnessValue> TerminationCriterion<G, F> for MaxEvaluations {
    fn check(&self, state: &EvolutionState<'_, G, F>) -> Option<StopReason> {
        (state.evaluations >= self.0).then_some(StopReason::MaxEvaluations(self.0))
    }
}

/// Stop when the best fitness improved by less than `epsilon` during the
/// last `window` generations
///
/// The comparison is against the best fitness `window` generations ago, so
/// at least `window + 1` generations must exist. A comparison that is not a
/// number (both values infinite) counts as no improvement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FitnessStagnation {
    /// Number of generations to look back
    pub window: usize,
    /// Minimum improvement that keeps the run going
    pub epsilon: f64,
}

impl FitnessStagnation {
    /// Create a new fitness stagnation criterion
    pub fn new(window: usize, epsilon: f64) -> Self {
        Self { window, epsilon }
    }
}

impl<G: EvolutionaryGenome, F: FitnessValue> TerminationCriterion<G, F> for FitnessStagnation {
    fn check(&self, state: &EvolutionState<'_, G, F>) -> Option<StopReason> {
        let history = state.fitness_history;
        let now = *history.last()?;
        let before = *history.iter().rev().nth(self.window)?;
        let improved = before - now >= self.epsilon;
        (!improved).then_some(StopReason::Stagnated {
            window: self.window,
        })
    }
}

/// Stop once the best fitness is at or below `target + tolerance`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetFitness {
    /// Target fitness value
    pub target: f64,
    /// Slack added to the target
    pub tolerance: f64,
}

impl TargetFitness {
    /// Create a new target fitness criterion
    pub fn new(target: f64) -> Self {
        Self {
            target,
            tolerance: 0.0,
        }
    }

    /// Create with a tolerance
    pub fn with_tolerance(target: f64, tolerance: f64) -> Self {
        Self { target, tolerance }
    }
}

impl<G: EvolutionaryGenome, F: FitnessValue> TerminationCriterion<G, F> for TargetFitness {
    fn check(&self, state: &EvolutionState<'_, G, F>) -> Option<StopReason> {
        let target = self.target + self.tolerance;
        (state.best_fitness <= target).then_some(StopReason::TargetReached {
            best: state.best_fitness,
            target,
        })
    }
}

/// Stop when the fraction of distinct individuals drops below a threshold
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiversityThreshold {
    /// Minimum fraction of distinct individuals
    pub min_diversity: f64,
}

impl DiversityThreshold {
    /// Create a new diversity threshold criterion
    pub fn new(min_diversity: f64) -> Self {
        Self { min_diversity }
    }
}

impl<G: EvolutionaryGenome, F: FitnessValue> TerminationCriterion<G, F> for DiversityThreshold {
    fn check(&self, state: &EvolutionState<'_, G, F>) -> Option<StopReason> {
        let current = diversity(state.population);
        (current < self.min_diversity).then_some(StopReason::LowDiversity(current))
    }
}

/// Boxed criterion held by the combinators
pub type BoxedCriterion<G, F> = Box<dyn TerminationCriterion<G, F>>;

/// Stops as soon as any inner criterion does, reporting the first one listed
pub struct AnyOf<G: EvolutionaryGenome, F: FitnessValue = f64> {
    criteria: Vec<BoxedCriterion<G, F>>,
}

impl<G: EvolutionaryGenome, F: FitnessValue> AnyOf<G, F> {
    /// Create a new AnyOf combinator
    pub fn new(criteria: Vec<BoxedCriterion<G, F>>) -> Self {
        Self { criteria }
    }

    /// Add another criterion
    pub fn or<T>(mut self, criterion: T) -> Self
    where
        T: TerminationCriterion<G, F> + 'static,
    {
        self.criteria.push(Box::new(criterion));
        self
    }
}

impl<G: EvolutionaryGenome, F: FitnessValue> TerminationCriterion<G, F> for AnyOf<G, F> {
    fn check(&self, state: &EvolutionState<'_, G, F>) -> Option<StopReason> {
        self.criteria.iter().find_map(|c| c.check(state))
    }
}

/// Stops once every inner criterion fires in the same generation
///
/// An empty `AllOf` never stops.
pub struct AllOf<G: EvolutionaryGenome, F: FitnessValue = f64> {
    criteria: Vec<BoxedCriterion<G, F>>,
}

impl<G: EvolutionaryGenome, F: FitnessValue> AllOf<G, F> {
    /// Create a new AllOf combinator
    pub fn new(criteria: Vec<BoxedCriterion<G, F>>) -> Self {
        Self { criteria }
    }

    /// Add another criterion
    pub fn and<T>(mut self, criterion: T) -> Self
    where
        T: TerminationCriterion<G, F> + 'static,
    {
        self.criteria.push(Box::new(criterion));
        self
    }
}

impl<G: EvolutionaryGenome, F: FitnessValue> TerminationCriterion<G, F> for AllOf<G, F> {
    fn check(&self, state: &EvolutionState<'_, G, F>) -> Option<StopReason> {
        if self.criteria.is_empty() {
            return None;
        }
        self.criteria
            .iter()
            .map(|c| c.check(state))
            .collect::<Option<Vec<_>>>()
            .map(StopReason::All)
    }
}

pub mod prelude {
    pub use super::{
        AllOf, AnyOf, DiversityThreshold, EvolutionState, FitnessStagnation, MaxEvaluations,
        MaxGenerations, StopReason, TargetFitness, TerminationCriterion,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::generational::GenerationalGA;
    use crate::fitness::evaluator::SequentialEvaluator;
    use crate::fitness::traits::FnFitness;
    use crate::operators::crossover::TwoPointCrossover;
    use crate::operators::selection::TournamentSelection;
    use crate::operators::traits::MutationOperator;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// Leaves every genome as it is
    struct Frozen;

    impl MutationOperator<Vec<i64>> for Frozen {
        fn mutate<R: Rng>(&self, _genome: &mut Vec<i64>, _rng: &mut R) {}
    }

    fn sum(genome: &Vec<i64>) -> i64 {
        genome.iter().sum()
    }

    type Ga = GenerationalGA<
        Vec<i64>,
        i64,
        TournamentSelection,
        TwoPointCrossover,
        Frozen,
        FnFitness<Vec<i64>, fn(&Vec<i64>) -> i64, i64>,
        SequentialEvaluator,
    >;

    fn engine(population: Vec<Vec<i64>>) -> Ga {
        GenerationalGA::builder()
            .population(population)
            .fitness(FnFitness::new(sum as fn(&Vec<i64>) -> i64))
            .selection(TournamentSelection::binary())
            .crossover(TwoPointCrossover)
            .mutation(Frozen)
            .elite_count(1)
            .evaluator(SequentialEvaluator)
            .build(StdRng::seed_from_u64(0))
            .unwrap()
    }

    /// A population that can never change: every genome is `[0]`
    fn frozen_engine() -> Ga {
        engine(vec![vec![0]; 5])
    }

    fn state(history: &[f64]) -> EvolutionState<'_, Vec<i64>, i64> {
        EvolutionState {
            generation: history.len().saturating_sub(1),
            evaluations: 0,
            best_fitness: history.last().copied().unwrap_or(f64::INFINITY),
            population: &[],
            fitness: &[],
            fitness_history: history,
        }
    }

    #[test]
    fn test_max_generations_counts_from_zero() {
        let result = frozen_engine().run(&MaxGenerations::new(4)).unwrap();
        assert_eq!(result.generations, 4);
        assert_eq!(result.stats.num_generations(), 5);
        assert_eq!(result.stats.stop, Some(StopReason::MaxGenerations(4)));
    }

    #[test]
    fn test_max_evaluations_ignores_cache_hits() {
        // one distinct genome: a single evaluation however long the run
        let mut ga = frozen_engine();
        let criterion: AnyOf<Vec<i64>, i64> = AnyOf::new(vec![Box::new(MaxEvaluations::new(2))])
            .or(MaxGenerations(6));
        let result = ga.run(&criterion).unwrap();
        assert_eq!(result.evaluations, 1);
        assert_eq!(result.stats.stop, Some(StopReason::MaxGenerations(6)));

        let mut ga = engine(vec![vec![1], vec![2], vec![3], vec![4]]);
        let result = ga.run(&MaxEvaluations::new(4)).unwrap();
        assert_eq!(result.generations, 0);
        assert_eq!(result.stats.stop, Some(StopReason::MaxEvaluations(4)));
    }

    #[test]
    fn test_target_fitness_reports_best() {
        let mut ga = engine(vec![vec![3], vec![1], vec![2]]);
        let result = ga.run(&TargetFitness::with_tolerance(0.5, 0.5)).unwrap();
        assert_eq!(result.generations, 0);
        assert_eq!(
            result.stats.stop,
            Some(StopReason::TargetReached {
                best: 1.0,
                target: 1.0
            })
        );

        assert!(!TargetFitness::new(0.0).should_terminate(&state(&[0.5])));
    }

    #[test]
    fn test_stagnation_needs_full_window() {
        let result = frozen_engine().run(&FitnessStagnation::new(3, 1e-9)).unwrap();
        assert_eq!(result.generations, 3);
        assert_eq!(result.stats.stop, Some(StopReason::Stagnated { window: 3 }));
    }

    #[test]
    fn test_stagnation_spans_resumed_runs() {
        let mut ga = frozen_engine();
        ga.run(&MaxGenerations::new(1)).unwrap();

        // generations 0 and 1 already count towards the window
        let result = ga.run(&FitnessStagnation::new(3, 1e-9)).unwrap();
        assert_eq!(result.generations, 3);
        assert_eq!(result.stats.num_generations(), 4);
        assert_eq!(result.stats.stop, Some(StopReason::Stagnated { window: 3 }));
    }

    #[test]
    fn test_stagnation_compares_against_window_start() {
        let criterion = FitnessStagnation::new(2, 0.5);

        // best dropped by 1.0 over the last two generations
        assert!(!criterion.should_terminate(&state(&[9.0, 3.0, 2.5, 2.0])));
        // only 0.25 over the last two
        assert!(criterion.should_terminate(&state(&[9.0, 2.25, 2.1, 2.0])));
        assert!(!criterion.should_terminate(&state(&[2.0, 2.0])));
        assert!(criterion.should_terminate(&state(&[f64::INFINITY; 3])));
    }

    #[test]
    fn test_diversity_threshold_on_converged_population() {
        let result = frozen_engine().run(&DiversityThreshold::new(0.5)).unwrap();
        assert_eq!(result.generations, 0);
        assert_eq!(result.stats.stop, Some(StopReason::LowDiversity(0.2)));
    }

    #[test]
    fn test_any_of_reports_first_listed() {
        let criterion: AnyOf<Vec<i64>, i64> = AnyOf::new(vec![])
            .or(TargetFitness::new(-1.0))
            .or(MaxGenerations::new(2))
            .or(FitnessStagnation::new(2, 1e-9));
        let result = frozen_engine().run(&criterion).unwrap();
        assert_eq!(result.generations, 2);
        assert_eq!(result.stats.stop, Some(StopReason::MaxGenerations(2)));
    }

    #[test]
    fn test_all_of_waits_for_every_criterion() {
        let criterion: AllOf<Vec<i64>, i64> = AllOf::new(vec![])
            .and(MaxGenerations::new(1))
            .and(FitnessStagnation::new(3, 1e-9));
        let result = frozen_engine().run(&criterion).unwrap();
        assert_eq!(result.generations, 3);
        assert_eq!(
            result.stats.stop,
            Some(StopReason::All(vec![
                StopReason::MaxGenerations(1),
                StopReason::Stagnated { window: 3 },
            ]))
        );
        assert_eq!(
            result.stats.stop.unwrap().to_string(),
            "reached generation 1 and no improvement over 3 generations"
        );
    }

    #[test]
    fn test_empty_all_of_never_stops() {
        let criterion: AllOf<Vec<i64>, i64> = AllOf::new(vec![]);
        assert!(!criterion.should_terminate(&state(&[0.0; 10])));
    }
}
