//! Generational evolutionary search for real-valued optimization.
//!
//! Candidates are fixed-shape sets of `f32` chromosomes with per-chromosome
//! bounds. The user supplies a fitness function (a benchmark function, a
//! neural-network evaluation, a simulator); the engine handles selection,
//! crossover, elitism, random retention and mutation.
//!
//! - **Zero-allocation loop**: every individual is allocated up front and
//!   recycled through a queue
//! - **Pluggable operators**: tournament or roulette-wheel selection,
//!   arithmetic, blend (BLX-α) or full crossover, single-gene mutation
//! - **Controllable runs**: stop from another thread, resume later,
//!   observe each generation
//! - **Reproducible**: one master seed drives every random stream
//!
//! # Features
//!
//! - `parallel`: evaluate fitness on the rayon thread pool
//! - `serde`: (de)serialize configuration and operator parameters
//!
//! # Architecture
//!
//! Everything lives in [`ga`]. It contains no domain concepts; what the
//! genes mean is up to the fitness function.

pub mod ga;
