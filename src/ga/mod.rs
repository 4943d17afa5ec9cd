//! Generational evolutionary search over real-valued gene vectors.
//!
//! An individual is a fixed shape of chromosomes (each a `Vec<f32>` with
//! its own bounds) plus a cached fitness. The caller supplies only the
//! [`FitnessFunction`]; the engine owns every individual for the whole run
//! and recycles their storage instead of allocating new ones.
//!
//! # Generation
//!
//! 1. Evaluate individuals whose fitness is stale, then sort best-first
//! 2. Fill the mating pool with a [`SelectionOperator`]
//! 3. Cross random pool pairs into recycled slots until the new quota is met
//! 4. Copy the elites, keep a random sample of the rest, recycle the remainder
//! 5. Mutate the randomly kept individuals
//! 6. Evaluate the new population and swap it in
//!
//! # Key Types
//!
//! - [`EvolutionConfig`]: Population partition, probabilities, gene layout
//! - [`GaEngine`]: Runs, stops and resumes the loop
//! - [`Operators`]: Selection, crossover and mutation of one engine
//! - [`Observer`] / [`GenerationReport`]: Per-generation progress
//!
//! # Submodules
//!
//! - [`operators`]: Arithmetic, blend (BLX-α) and full crossover; single-gene mutation
//! - [`benchmarks`]: Schwefel and Sphere test functions
//!
//! # References
//!
//! - Holland (1975), *Adaptation in Natural and Artificial Systems*
//! - Goldberg (1989), *Genetic Algorithms in Search, Optimization, and Machine Learning*
//! - Eshelman & Schaffer (1993), "Real-Coded Genetic Algorithms and Interval-Schemata"

pub mod benchmarks;
mod config;
mod distribution;
mod error;
mod individual;
pub mod operators;
mod population;
mod runner;
mod selection;
mod types;

pub use config::{ChromosomeSpec, Criterion, EvolutionConfig, GeneBounds, PopulationSizes};
pub use distribution::Distribution;
pub use error::EvolutionError;
pub use individual::Individual;
pub use operators::{
    ArithmeticCrossover, BlendCrossover, CrossoverOperator, FullCrossover, MutationOperator,
    SingleMutation,
};
pub use population::{Arena, BestFitness, Population, PopulationView};
pub use runner::{GaEngine, Operators};
pub use selection::{RouletteWheelSelection, SelectionOperator, TournamentSelection};
pub use types::{FitnessFunction, GenerationReport, Observer, ProcessState, StopHandle};
