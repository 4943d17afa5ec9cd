//! Standard test functions for real-valued optimization.
//!
//! All functions read every gene of every chromosome and are meant to be
//! minimized.
//!
//! # References
//!
//! - Schwefel (1981), *Numerical Optimization of Computer Models*
//! - Jamil & Yang (2013), "A Literature Survey of Benchmark Functions for
//!   Global Optimization Problems"

/// Schwefel function: `-Σ x·sin(√|x|)`.
///
/// Deceptive and multimodal. On `[-500, 500]` the global minimum is about
/// `-418.9829` per gene, at `x ≈ 420.9687`, far from the next-best basins.
pub fn schwefel(chromosomes: &[Vec<f32>]) -> anyhow::Result<f32> {
    let value: f64 = chromosomes
        .iter()
        .flatten()
        .map(|&x| {
            let x = f64::from(x);
            -x * x.abs().sqrt().sin()
        })
        .sum();
    Ok(value as f32)
}

/// Sphere function: `Σ x²`. Minimum 0 at the origin.
pub fn sphere(chromosomes: &[Vec<f32>]) -> anyhow::Result<f32> {
    Ok(chromosomes.iter().flatten().map(|x| x * x).sum())
}
