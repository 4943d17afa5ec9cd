//! Engine configuration.
//!
//! [`EvolutionConfig`] holds every parameter that is read once when the
//! engine is created. Operators and the fitness function are passed to
//! [`GaEngine::new`](super::GaEngine::new) alongside it.

use super::distribution::Distribution;
use super::error::EvolutionError;
use rand::Rng;

/// Direction of optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Criterion {
    /// Lower fitness is better.
    #[default]
    Minimize,
    /// Higher fitness is better.
    Maximize,
}

impl Criterion {
    /// Returns `true` if `candidate` is strictly better than `incumbent`.
    #[inline]
    pub fn is_better(self, candidate: f32, incumbent: f32) -> bool {
        match self {
            Criterion::Minimize => candidate < incumbent,
            Criterion::Maximize => candidate > incumbent,
        }
    }

    /// The value every real fitness improves upon.
    #[inline]
    pub fn worst(self) -> f32 {
        match self {
            Criterion::Minimize => f32::MAX,
            Criterion::Maximize => f32::MIN,
        }
    }
}

/// Closed interval `[min, max]` a chromosome's genes are drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneBounds {
    pub min: f32,
    pub max: f32,
}

impl GeneBounds {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Width of the interval.
    #[inline]
    pub fn range(&self) -> f32 {
        self.max - self.min
    }

    /// Midpoint of the interval.
    #[inline]
    pub fn midpoint(&self) -> f32 {
        (self.max + self.min) * 0.5
    }

    #[inline]
    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.min).min(self.max)
    }

    /// Uniform draw from the interval.
    #[inline]
    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        self.clamp(self.range() * rng.random::<f32>() + self.min)
    }

    fn validate(&self, index: usize) -> Result<(), EvolutionError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(EvolutionError::invalid(format!(
                "chromosome {index}: bounds must be finite (min={}, max={})",
                self.min, self.max
            )));
        }
        if self.min > self.max {
            return Err(EvolutionError::invalid(format!(
                "chromosome {index}: lower bound must not exceed upper (min={}, max={})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Shape and bounds of one chromosome (gene segment).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChromosomeSpec {
    /// Number of genes in the segment.
    pub length: usize,
    /// Bounds used by the distribution, mutation and bounded crossover.
    pub bounds: GeneBounds,
}

impl ChromosomeSpec {
    pub fn new(length: usize, min: f32, max: f32) -> Self {
        Self {
            length,
            bounds: GeneBounds::new(min, max),
        }
    }
}

/// Population partition derived from an [`EvolutionConfig`].
///
/// `elite + (old - elite) + new == population` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationSizes {
    /// Total number of individuals per generation.
    pub population: usize,
    /// Crossover children produced per generation (always even).
    pub new: usize,
    /// Individuals carried over from the previous generation.
    pub old: usize,
    /// Best individuals carried over unconditionally (subset of `old`).
    pub elite: usize,
}

impl PopulationSizes {
    /// Randomly retained (non-elite) carry-over count.
    #[inline]
    pub fn retained(&self) -> usize {
        self.old - self.elite
    }

    /// Number of individuals ever allocated for a run.
    #[inline]
    pub fn arena(&self) -> usize {
        self.population + self.new
    }
}

/// Configuration for the evolutionary engine.
///
/// # Builder Pattern
///
/// ```
/// use u_evolution::ga::{ChromosomeSpec, Criterion, EvolutionConfig};
///
/// let config = EvolutionConfig::default()
///     .with_population_size(200)
///     .with_chromosomes(vec![ChromosomeSpec::new(30, -5.0, 5.0)])
///     .with_new_population_fraction(0.6)
///     .with_elite_fraction(0.1)
///     .with_criterion(Criterion::Minimize)
///     .with_seed(42);
///
/// let sizes = config.sizes();
/// assert_eq!(sizes.new, 120);
/// assert_eq!(sizes.old, 80);
/// assert_eq!(sizes.elite, 8);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvolutionConfig {
    /// Number of individuals in each generation.
    pub population_size: usize,

    /// Fraction of each generation produced by crossover (0.0–1.0).
    ///
    /// The resulting count is rounded down to an even number.
    pub new_population_fraction: f64,

    /// Fraction of the carried-over part kept as elites (0.0–1.0).
    pub elite_fraction: f64,

    /// Keep at least one elite whenever anything is carried over.
    pub always_elite: bool,

    /// Probability that a drawn parent pair is actually crossed (0.0–1.0).
    pub crossover_probability: f64,

    /// Probability that a randomly retained individual is mutated (0.0–1.0).
    pub mutation_probability: f64,

    /// Generations executed per call to `run`.
    pub iteration_count: usize,

    /// Ordered chromosome shapes and bounds shared by every individual.
    pub chromosomes: Vec<ChromosomeSpec>,

    /// Optimization direction.
    pub criterion: Criterion,

    /// How the start population's genes are drawn.
    pub distribution: Distribution,

    /// Evaluate pending individuals with rayon (requires the `parallel` feature).
    pub parallel: bool,

    /// Master seed every random stream is derived from.
    ///
    /// `None` draws one from the thread RNG; it is logged at `info` level.
    pub seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            new_population_fraction: 0.6,
            elite_fraction: 0.1,
            always_elite: true,
            crossover_probability: 0.9,
            mutation_probability: 0.1,
            iteration_count: 500,
            chromosomes: Vec::new(),
            criterion: Criterion::Minimize,
            distribution: Distribution::Uniform,
            parallel: false,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    pub fn with_new_population_fraction(mut self, fraction: f64) -> Self {
        self.new_population_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_elite_fraction(mut self, fraction: f64) -> Self {
        self.elite_fraction = fraction.clamp(0.0, 1.0);
        self
    }

    pub fn with_always_elite(mut self, always: bool) -> Self {
        self.always_elite = always;
        self
    }

    pub fn with_crossover_probability(mut self, p: f64) -> Self {
        self.crossover_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_mutation_probability(mut self, p: f64) -> Self {
        self.mutation_probability = p.clamp(0.0, 1.0);
        self
    }

    pub fn with_iteration_count(mut self, n: usize) -> Self {
        self.iteration_count = n;
        self
    }

    pub fn with_chromosomes(mut self, chromosomes: Vec<ChromosomeSpec>) -> Self {
        self.chromosomes = chromosomes;
        self
    }

    /// Appends one chromosome to the structure.
    pub fn with_chromosome(mut self, length: usize, min: f32, max: f32) -> Self {
        self.chromosomes.push(ChromosomeSpec::new(length, min, max));
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Chromosome lengths in order.
    pub fn structure(&self) -> Vec<usize> {
        self.chromosomes.iter().map(|c| c.length).collect()
    }

    /// Per-chromosome bounds in order.
    pub fn bounds(&self) -> Vec<GeneBounds> {
        self.chromosomes.iter().map(|c| c.bounds).collect()
    }

    /// Derives the population partition.
    ///
    /// Does not validate; fractions outside `[0, 1]` give meaningless sizes.
    pub fn sizes(&self) -> PopulationSizes {
        let population = self.population_size;
        let mut new = (self.new_population_fraction * population as f64) as usize;
        if new % 2 != 0 {
            new -= 1;
        }
        let new = new.min(population - population % 2);
        let old = population - new;
        let mut elite = (self.elite_fraction * old as f64) as usize;
        if elite == 0 && self.always_elite && old != 0 {
            elite = 1;
        }
        PopulationSizes {
            population,
            new,
            old,
            elite: elite.min(old),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), EvolutionError> {
        if self.population_size == 0 {
            return Err(EvolutionError::invalid("population_size must be at least 1"));
        }
        check_unit("new_population_fraction", self.new_population_fraction)?;
        check_unit("elite_fraction", self.elite_fraction)?;
        check_unit("crossover_probability", self.crossover_probability)?;
        check_unit("mutation_probability", self.mutation_probability)?;
        if self.chromosomes.is_empty() {
            return Err(EvolutionError::invalid(
                "chromosome structure must contain at least one chromosome",
            ));
        }
        for (i, chromosome) in self.chromosomes.iter().enumerate() {
            chromosome.bounds.validate(i)?;
        }

        let sizes = self.sizes();
        if sizes.new % 2 != 0 || sizes.elite > sizes.old {
            return Err(EvolutionError::invalid(format!(
                "inconsistent population partition: {sizes:?}"
            )));
        }
        if sizes.new > 0 && self.crossover_probability <= 0.0 {
            return Err(EvolutionError::DegenerateCrossing {
                new_population_size: sizes.new,
            });
        }
        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), EvolutionError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EvolutionError::invalid(format!(
            "{name} must lie in [0, 1], got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> EvolutionConfig {
        EvolutionConfig::default().with_chromosome(4, -1.0, 1.0)
    }

    #[test]
    fn test_default_config() {
        let config = EvolutionConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.iteration_count, 500);
        assert_eq!(config.criterion, Criterion::Minimize);
        assert_eq!(config.distribution, Distribution::Uniform);
        assert!(config.always_elite);
        assert!(!config.parallel);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_builder_pattern() {
        let config = EvolutionConfig::default()
            .with_population_size(40)
            .with_new_population_fraction(0.5)
            .with_elite_fraction(0.2)
            .with_always_elite(false)
            .with_crossover_probability(0.8)
            .with_mutation_probability(0.05)
            .with_iteration_count(7)
            .with_chromosome(3, 0.0, 1.0)
            .with_chromosome(2, -2.0, 2.0)
            .with_criterion(Criterion::Maximize)
            .with_distribution(Distribution::Normal)
            .with_seed(9);

        assert_eq!(config.population_size, 40);
        assert_eq!(config.structure(), vec![3, 2]);
        assert_eq!(
            config.bounds(),
            vec![GeneBounds::new(0.0, 1.0), GeneBounds::new(-2.0, 2.0)]
        );
        assert_eq!(config.criterion, Criterion::Maximize);
        assert_eq!(config.seed, Some(9));
        assert!(!config.always_elite);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_clamp_rates() {
        let config = EvolutionConfig::default()
            .with_new_population_fraction(1.5)
            .with_elite_fraction(-0.5)
            .with_crossover_probability(2.0)
            .with_mutation_probability(-1.0);
        assert!((config.new_population_fraction - 1.0).abs() < 1e-12);
        assert!(config.elite_fraction.abs() < 1e-12);
        assert!((config.crossover_probability - 1.0).abs() < 1e-12);
        assert!(config.mutation_probability.abs() < 1e-12);
    }

    #[test]
    fn test_new_population_forced_even() {
        let sizes = base()
            .with_population_size(10)
            .with_new_population_fraction(0.5)
            .sizes();
        assert_eq!(sizes.new, 4);
        assert_eq!(sizes.old, 6);
    }

    #[test]
    fn test_elite_promoted_when_always_elite() {
        let sizes = base()
            .with_population_size(10)
            .with_new_population_fraction(0.5)
            .with_elite_fraction(0.0)
            .sizes();
        assert_eq!(sizes.elite, 1);

        let sizes = base()
            .with_population_size(10)
            .with_new_population_fraction(0.5)
            .with_elite_fraction(0.0)
            .with_always_elite(false)
            .sizes();
        assert_eq!(sizes.elite, 0);
    }

    #[test]
    fn test_no_elite_without_carry_over() {
        let sizes = base()
            .with_population_size(10)
            .with_new_population_fraction(1.0)
            .sizes();
        assert_eq!(sizes.new, 10);
        assert_eq!(sizes.old, 0);
        assert_eq!(sizes.elite, 0);
    }

    #[test]
    fn test_odd_population_full_offspring() {
        let sizes = base()
            .with_population_size(7)
            .with_new_population_fraction(1.0)
            .sizes();
        assert_eq!(sizes.new, 6);
        assert_eq!(sizes.old, 1);
        assert_eq!(sizes.elite, 1);
    }

    #[test]
    fn test_partition_sums_to_population() {
        for population in 1..60 {
            for step in 0..=10 {
                let fraction = step as f64 / 10.0;
                let sizes = base()
                    .with_population_size(population)
                    .with_new_population_fraction(fraction)
                    .with_elite_fraction(1.0 - fraction)
                    .sizes();
                assert_eq!(sizes.elite + sizes.retained() + sizes.new, population);
                assert_eq!(sizes.new % 2, 0);
            }
        }
    }

    #[test]
    fn test_validate_empty_structure() {
        let config = EvolutionConfig::default();
        assert!(matches!(
            config.validate(),
            Err(EvolutionError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_zero_population() {
        let config = base().with_population_size(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_fraction_out_of_range() {
        let mut config = base();
        config.elite_fraction = 1.5;
        assert!(matches!(
            config.validate(),
            Err(EvolutionError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_validate_inverted_bounds() {
        let config = EvolutionConfig::default().with_chromosome(3, 1.0, -1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_non_finite_bounds() {
        let config = EvolutionConfig::default().with_chromosome(3, f32::NEG_INFINITY, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_crossing_probability() {
        let config = base().with_crossover_probability(0.0);
        assert!(matches!(
            config.validate(),
            Err(EvolutionError::DegenerateCrossing { new_population_size: 60 })
        ));
    }

    #[test]
    fn test_zero_crossing_ok_without_offspring() {
        let config = base()
            .with_new_population_fraction(0.0)
            .with_crossover_probability(0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_criterion_ordering() {
        assert!(Criterion::Minimize.is_better(1.0, 2.0));
        assert!(!Criterion::Minimize.is_better(2.0, 2.0));
        assert!(Criterion::Maximize.is_better(3.0, 2.0));
        assert!(Criterion::Minimize.is_better(1e30, Criterion::Minimize.worst()));
        assert!(Criterion::Maximize.is_better(-1e30, Criterion::Maximize.worst()));
    }

    #[test]
    fn test_bounds_helpers() {
        let bounds = GeneBounds::new(-4.0, 2.0);
        assert_eq!(bounds.range(), 6.0);
        assert_eq!(bounds.midpoint(), -1.0);
        assert_eq!(bounds.clamp(5.0), 2.0);
        assert_eq!(bounds.clamp(-9.0), -4.0);
        assert!(bounds.contains(0.0));
        assert!(!bounds.contains(2.5));
    }
}
