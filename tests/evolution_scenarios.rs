//! End-to-end scenarios for the generational engine and grammar decoding

use std::collections::{BTreeSet, HashMap};

use evogram::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sum(genome: &Vec<i64>) -> i64 {
    genome.iter().sum()
}

/// Adds one to every gene
struct Increment;

impl MutationOperator<Vec<i64>> for Increment {
    fn mutate<R: Rng>(&self, genome: &mut Vec<i64>, _rng: &mut R) {
        for gene in genome.iter_mut() {
            *gene += 1;
        }
    }
}

#[test]
fn elite_survives_first_breeding() {
    let mut ga = GenerationalGA::builder()
        .population(vec![vec![1], vec![2], vec![3], vec![4]])
        .fitness(FnFitness::new(sum))
        .selection(TournamentSelection::binary())
        .crossover(TwoPointCrossover)
        .mutation(Increment)
        .elite_count(1)
        .build(StdRng::seed_from_u64(0))
        .unwrap();

    let first = ga.next().unwrap();
    assert_eq!(first.population[0], vec![1]);
    assert_eq!(first.fitness, vec![1, 2, 3, 4]);

    let second = ga.next().unwrap();
    assert_eq!(second.generation, 1);
    assert_eq!(second.population.len(), 4);
    assert_eq!(second.population[0], vec![1]);
    assert!(second.population[1..].iter().all(|g| g[0] >= 2));
}

#[test]
fn first_generation_caches_exactly_initial_individuals() {
    let initial = vec![vec![5, 1], vec![2], vec![5, 1], vec![0, 0, 3], vec![2]];
    let mut ga = GenerationalGA::builder()
        .population(initial.clone())
        .fitness(FnFitness::new(sum))
        .selection(TournamentSelection::binary())
        .crossover(TwoPointCrossover)
        .mutation(Increment)
        .elite_count(2)
        .build(StdRng::seed_from_u64(1))
        .unwrap();

    let view = ga.advance();
    let distinct: BTreeSet<&Vec<i64>> = initial.iter().collect();
    let cached: BTreeSet<&Vec<i64>> = view.cache.iter().map(|(genome, _)| genome).collect();
    assert_eq!(cached, distinct);
    assert_eq!(view.cache.len(), 3);
    assert_eq!(ga.evaluations(), 3);
}

#[test]
fn elite_not_below_population_is_rejected() {
    for elite in [4, 5, 100] {
        let result = evolve(
            vec![vec![1], vec![2], vec![3], vec![4]],
            FnFitness::new(sum),
            Increment,
            TwoPointCrossover,
            TournamentSelection::binary(),
            SequentialEvaluator,
            EvolutionConfig {
                elite_count: elite,
                ..Default::default()
            },
            StdRng::seed_from_u64(0),
        );
        assert_eq!(
            result.err(),
            Some(EvolutionError::InvalidConfiguration {
                elite,
                population: 4
            })
        );
    }
}

#[test]
fn config_roundtrips_through_json() {
    let config = EvolutionConfig {
        elite_count: 5,
        crossover_rate: 0.8,
        retain: 256,
    };
    let json = serde_json::to_string(&config).unwrap();
    let parsed: EvolutionConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);

    let partial: EvolutionConfig = serde_json::from_str(r#"{"retain": 64}"#).unwrap();
    assert_eq!(partial.retain, 64);
    assert_eq!(partial.elite_count, 20);
}

#[test]
fn codon_decoding_is_reproducible() {
    // three codons, then the seeded fallback takes over
    let grammar = ArithmeticGrammar::new(
        vec![Expr::Const(0.0), Expr::Const(1.0)],
        vec![BinaryOp::Add],
    );
    let codons = [0, 0, 1];
    let first = grammar.decode(&codons, 10);
    for _ in 0..10 {
        assert_eq!(grammar.decode(&codons, 10), first);
    }
}

#[test]
fn closure_evaluator_sees_every_missing_genome() {
    type SumFitness = FnFitness<Vec<i64>, fn(&Vec<i64>) -> i64, i64>;
    let evaluator = FnEvaluator(|fitness: &SumFitness, genomes: &[Vec<i64>]| -> Vec<i64> {
        genomes.iter().map(|g| fitness.evaluate(g)).collect()
    });
    let mut ga = GenerationalGA::builder()
        .population(vec![vec![3], vec![1], vec![2]])
        .fitness(FnFitness::new(sum as fn(&Vec<i64>) -> i64))
        .selection(TournamentSelection::binary())
        .crossover(TwoPointCrossover)
        .mutation(Increment)
        .elite_count(1)
        .evaluator(evaluator)
        .build(StdRng::seed_from_u64(2))
        .unwrap();

    let first = ga.next().unwrap();
    assert_eq!(first.best(), Some((&vec![1], &1)));
}

#[test]
fn symbolic_regression_improves() {
    let grammar = ArithmeticGrammar::new(
        vec![Expr::var("x"), Expr::Const(1.0)],
        BinaryOp::ALL.to_vec(),
    );
    let points: Vec<f64> = (0..20).map(|i| i as f64 / 10.0).collect();
    let loss = |codons: &Codons| -> f64 {
        let Ok(expr) = grammar.decode(codons.as_slice(), 40) else {
            return f64::INFINITY;
        };
        let mut bindings = HashMap::new();
        let mut total = 0.0;
        for &x in &points {
            bindings.insert("x".to_string(), x);
            match expr.eval(&bindings) {
                Some(y) => total += (y - (x * x + x)).abs(),
                None => return f64::INFINITY,
            }
        }
        total
    };

    let mut rng = StdRng::seed_from_u64(7);
    let space = CodonSpace::with_range(4, 60);
    let mut ga = GenerationalGA::builder()
        .population(space.samples(60, &mut rng))
        .fitness(FnFitness::new(loss))
        .selection(TournamentSelection::binary())
        .crossover(RippleCrossover::new(60))
        .mutation(space)
        .elite_count(3)
        .crossover_rate(0.8)
        .retain(128)
        .build(rng)
        .unwrap();

    let result = ga.run(&MaxGenerations::new(40)).unwrap();
    let history = result.stats.best_fitness_history();
    assert!(history.windows(2).all(|w| w[1] <= w[0]));
    assert!(result.best_fitness <= history[0]);
    assert!(ga.cache().len() <= 128);
}
