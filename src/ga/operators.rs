//! Real-valued crossover and mutation operators.
//!
//! All operators work chromosome by chromosome on individuals of identical
//! shape and receive the per-chromosome bounds from the engine.
//!
//! # Crossover Operators
//!
//! - [`ArithmeticCrossover`]: convex combination with one shared blend factor
//! - [`BlendCrossover`]: BLX-α, uniform sampling in an extended, bounded interval
//! - [`FullCrossover`]: alternating gene exchange
//!
//! # Mutation Operators
//!
//! - [`SingleMutation`]: resample one locus per chromosome
//!
//! # References
//!
//! - Michalewicz (1996), *Genetic Algorithms + Data Structures = Evolution Programs*
//! - Eshelman & Schaffer (1993), "Real-Coded Genetic Algorithms and
//!   Interval-Schemata"

use super::config::GeneBounds;
use super::individual::Individual;
use rand::Rng;

// ============================================================================
// Crossover operators
// ============================================================================

/// Combines two parents into two pre-allocated children in place.
pub trait CrossoverOperator {
    /// Overwrites every gene of both children.
    ///
    /// Parents and children share one shape; `bounds` holds one entry per
    /// chromosome.
    fn cross<R: Rng>(
        &self,
        parent1: &Individual,
        parent2: &Individual,
        child1: &mut Individual,
        child2: &mut Individual,
        bounds: &[GeneBounds],
        rng: &mut R,
    );
}

/// Applies `f` to every chromosome of the four individuals, in order.
fn for_each_chromosome<F>(
    parent1: &Individual,
    parent2: &Individual,
    child1: &mut Individual,
    child2: &mut Individual,
    mut f: F,
) where
    F: FnMut(usize, &[f32], &[f32], &mut [f32], &mut [f32]),
{
    let parents = parent1.chromosomes().iter().zip(parent2.chromosomes());
    let children = child1.chromosomes_mut().zip(child2.chromosomes_mut());
    for (i, ((p1, p2), (c1, c2))) in parents.zip(children).enumerate() {
        f(i, p1, p2, c1, c2);
    }
}

/// Arithmetic crossover.
///
/// Draws one blend factor α ∈ [0, 1) per call and sets
/// `child1 = α·p1 + (1−α)·p2`, `child2 = α·p2 + (1−α)·p1` for every gene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArithmeticCrossover;

impl CrossoverOperator for ArithmeticCrossover {
    fn cross<R: Rng>(
        &self,
        parent1: &Individual,
        parent2: &Individual,
        child1: &mut Individual,
        child2: &mut Individual,
        _bounds: &[GeneBounds],
        rng: &mut R,
    ) {
        let alpha: f32 = rng.random();
        let beta = 1.0 - alpha;
        for_each_chromosome(parent1, parent2, child1, child2, |_, p1, p2, c1, c2| {
            for j in 0..c1.len() {
                c1[j] = alpha * p1[j] + beta * p2[j];
                c2[j] = alpha * p2[j] + beta * p1[j];
            }
        });
    }
}

/// BLX-α crossover with border.
///
/// For parent genes `a`, `b` the sampling interval is centred on
/// `(a + b) / 2` with half-width `(1 + 2α)·|a − b| / 2`, then clamped to the
/// chromosome's bounds. Each child gene is drawn uniformly from it, so
/// children never leave the bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlendCrossover {
    alpha: f32,
}

impl BlendCrossover {
    /// Creates the operator; negative `alpha` is treated as 0.
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha: alpha.max(0.0),
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

impl Default for BlendCrossover {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl CrossoverOperator for BlendCrossover {
    fn cross<R: Rng>(
        &self,
        parent1: &Individual,
        parent2: &Individual,
        child1: &mut Individual,
        child2: &mut Individual,
        bounds: &[GeneBounds],
        rng: &mut R,
    ) {
        let spread = 1.0 + 2.0 * self.alpha;
        for_each_chromosome(parent1, parent2, child1, child2, |i, p1, p2, c1, c2| {
            let border = bounds[i];
            for j in 0..c1.len() {
                let sum = p1[j] + p2[j];
                let delta = spread * (p1[j] - p2[j]).abs();
                let left = border.clamp((sum - delta) * 0.5);
                let right = border.clamp((sum + delta) * 0.5);
                let width = right - left;
                c1[j] = border.clamp(width * rng.random::<f32>() + left);
                c2[j] = border.clamp(width * rng.random::<f32>() + left);
            }
        });
    }
}

/// Alternating ("full") crossover.
///
/// `child1` takes even-indexed genes from `parent1` and odd-indexed genes
/// from `parent2`; `child2` mirrors it. Deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FullCrossover;

impl CrossoverOperator for FullCrossover {
    fn cross<R: Rng>(
        &self,
        parent1: &Individual,
        parent2: &Individual,
        child1: &mut Individual,
        child2: &mut Individual,
        _bounds: &[GeneBounds],
        _rng: &mut R,
    ) {
        for_each_chromosome(parent1, parent2, child1, child2, |_, p1, p2, c1, c2| {
            for j in 0..c1.len() {
                if j % 2 == 0 {
                    c1[j] = p1[j];
                    c2[j] = p2[j];
                } else {
                    c1[j] = p2[j];
                    c2[j] = p1[j];
                }
            }
        });
    }
}

// ============================================================================
// Mutation operators
// ============================================================================

/// Perturbs an individual in place.
pub trait MutationOperator {
    /// Mutates `individual`; its cached fitness must end up cleared.
    fn mutate<R: Rng>(&self, individual: &mut Individual, bounds: &[GeneBounds], rng: &mut R);
}

/// Single-locus reset: in every non-empty chromosome, one random gene is
/// redrawn uniformly from the chromosome's bounds.
///
/// # Complexity
/// O(chromosome count)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleMutation;

impl MutationOperator for SingleMutation {
    fn mutate<R: Rng>(&self, individual: &mut Individual, bounds: &[GeneBounds], rng: &mut R) {
        for (chromosome, border) in individual.chromosomes_mut().zip(bounds) {
            if chromosome.is_empty() {
                continue;
            }
            let locus = rng.random_range(0..chromosome.len());
            chromosome[locus] = border.sample(rng);
        }
    }
}
