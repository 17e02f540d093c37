//! Symbolic Regression with Grammatical Evolution
//!
//! This example evolves codon strings that decode, through an arithmetic
//! grammar, into expressions approximating
//!
//!     f(x) = x^4 + x^3 + x^2 + x
//!
//! over 200 sample points in [-1, 1]. Fitness is the L1 loss; individuals
//! that fail to decode or divide by zero get an infinite loss.
//!
//! Run with `RUST_LOG=evogram=debug` to see per-generation statistics.

use std::collections::HashMap;

use evogram::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::EnvFilter;

const MAX_DEPTH: usize = 40;
const MAX_GENERATIONS: usize = 2000;

fn target(x: f64) -> f64 {
    x.powi(4) + x.powi(3) + x.powi(2) + x
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Symbolic Regression ===\n");

    let mut rng = StdRng::seed_from_u64(42);

    let grammar = ArithmeticGrammar::new(
        vec![Expr::var("x"), Expr::Const(1.0)],
        BinaryOp::ALL.to_vec(),
    );

    // Four codon values cover the largest choice (the four operators)
    let space = CodonSpace::with_range(4, 100);

    let mut table: Vec<(f64, f64)> = Vec::with_capacity(200);
    while table.len() < 200 {
        let x = rng.gen_range(-1.0..1.0);
        if table.iter().all(|&(seen, _)| seen != x) {
            table.push((x, target(x)));
        }
    }

    let loss = |codons: &Codons| -> f64 {
        let expr = match grammar.decode(codons.as_slice(), MAX_DEPTH) {
            Ok(expr) => expr,
            Err(_) => return f64::INFINITY,
        };
        let mut bindings = HashMap::with_capacity(1);
        let mut total = 0.0;
        for &(x, y) in &table {
            bindings.insert("x".to_string(), x);
            match expr.eval(&bindings) {
                Some(predicted) => total += (y - predicted).abs(),
                None => return f64::INFINITY,
            }
        }
        total
    };

    let mut ga = GenerationalGA::builder()
        .population(space.samples(120, &mut rng))
        .fitness(FnFitness::new(loss))
        .selection(TournamentSelection::binary())
        .crossover(RippleCrossover::new(space.max_len))
        .mutation(space)
        .elite_count(5)
        .crossover_rate(0.8)
        .retain(256)
        .build(rng)?;

    let mut best: Option<(Codons, f64)> = None;
    for generation in ga.by_ref().take(MAX_GENERATIONS) {
        let Some((genome, &score)) = generation.best() else {
            break;
        };
        println!(
            "{}: L={}, SCORE={}",
            generation.generation + 1,
            genome.len(),
            score
        );
        if generation.generation % 100 == 0 {
            if let Ok(expr) = grammar.decode(genome.as_slice(), MAX_DEPTH) {
                println!("\t{}", expr);
            }
        }
        best = Some((genome.clone(), score));
        if score < 1e-6 {
            break;
        }
    }

    let (genome, score) = best.ok_or(EvolutionError::EmptyPopulation)?;
    println!("\nBest loss:   {:.6}", score);
    println!("Evaluations: {}", ga.evaluations());
    println!("Cache size:  {}", ga.cache().len());
    println!("Run:         {}", ga.stats().summary());
    match grammar.decode(genome.as_slice(), MAX_DEPTH) {
        Ok(expr) => println!("Expression:  {}", expr),
        Err(err) => println!("Expression:  <{}>", err),
    }

    Ok(())
}
