//! Start-population gene distributions.

use super::config::GeneBounds;
use super::individual::Individual;
use rand::Rng;

/// How the genes of a freshly allocated population are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Distribution {
    /// Leave every gene at zero.
    None,

    /// Uniform within each chromosome's `[min, max]`.
    #[default]
    Uniform,

    /// Standard normal rescaled to each chromosome's bounds:
    /// mean at the midpoint, standard deviation of half the range.
    ///
    /// Draws are not clamped, so roughly a third of the genes fall
    /// outside the bounds.
    Normal,
}

impl Distribution {
    /// Fills every gene of `individual` independently and clears its fitness.
    ///
    /// `bounds` must hold one entry per chromosome.
    pub fn fill<R: Rng>(&self, individual: &mut Individual, bounds: &[GeneBounds], rng: &mut R) {
        for (chromosome, bounds) in individual.chromosomes_mut().zip(bounds) {
            match self {
                Distribution::None => {}
                Distribution::Uniform => {
                    for gene in chromosome.iter_mut() {
                        *gene = bounds.sample(rng);
                    }
                }
                Distribution::Normal => {
                    let factor = bounds.range() * 0.5;
                    let bias = bounds.midpoint();
                    let mut pairs = chromosome.chunks_exact_mut(2);
                    for pair in &mut pairs {
                        let (z1, z2) = standard_normal_pair(rng);
                        pair[0] = factor * z1 + bias;
                        pair[1] = factor * z2 + bias;
                    }
                    if let [last] = pairs.into_remainder() {
                        let (z1, _) = standard_normal_pair(rng);
                        *last = factor * z1 + bias;
                    }
                }
            }
        }
    }
}

/// Two independent standard normal samples (Marsaglia polar method).
///
/// Each attempt consumes two uniform draws; attempts outside the unit
/// disc (or at its centre) are rejected.
pub(crate) fn standard_normal_pair<R: Rng>(rng: &mut R) -> (f32, f32) {
    loop {
        let x = 2.0 * rng.random::<f64>() - 1.0;
        let y = 2.0 * rng.random::<f64>() - 1.0;
        let s = x * x + y * y;
        if s > 0.0 && s <= 1.0 {
            let factor = (-2.0 * s.ln() / s).sqrt();
            return ((x * factor) as f32, (y * factor) as f32);
        }
    }
}
