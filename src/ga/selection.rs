//! Selection operators: fill the mating pool from a sorted population.
//!
//! # References
//!
//! - Blickle & Thiele (1996), "A Comparison of Selection Schemes used in
//!   Evolutionary Algorithms"
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use super::config::Criterion;
use super::error::EvolutionError;
use super::population::{BestFitness, PopulationView};
use rand::Rng;

/// Fills a mating pool with population positions.
pub trait SelectionOperator {
    /// Writes one population position into every slot of `pool`.
    ///
    /// `best` is the record of the current (sorted) population.
    fn select<R: Rng>(
        &mut self,
        pool: &mut [usize],
        population: &PopulationView<'_>,
        best: &BestFitness,
        criterion: Criterion,
        rng: &mut R,
    ) -> Result<(), EvolutionError>;

    /// Whether the operator works under `criterion`.
    ///
    /// Checked once when the engine is created.
    fn supports(&self, _criterion: Criterion) -> bool {
        true
    }
}

/// Tournament selection: each pool slot gets the best of `size` uniformly
/// drawn positions (with replacement).
///
/// Higher `size` = stronger selection pressure.
/// - 2: light pressure (good for diversity)
/// - 3-5: moderate pressure (typical default)
/// - >5: strong pressure (risk of premature convergence)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TournamentSelection {
    size: usize,
}

impl TournamentSelection {
    /// Creates a tournament of `size` players (at least 1).
    pub fn new(size: usize) -> Self {
        Self { size: size.max(1) }
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for TournamentSelection {
    fn default() -> Self {
        Self::new(3)
    }
}

impl SelectionOperator for TournamentSelection {
    fn select<R: Rng>(
        &mut self,
        pool: &mut [usize],
        population: &PopulationView<'_>,
        _best: &BestFitness,
        criterion: Criterion,
        rng: &mut R,
    ) -> Result<(), EvolutionError> {
        let n = population.len();
        if n == 0 {
            return Err(EvolutionError::invalid("cannot select from empty population"));
        }

        for slot in pool.iter_mut() {
            let mut winner = rng.random_range(0..n);
            let mut winner_fitness = population.fitness(winner);
            for _ in 1..self.size {
                let player = rng.random_range(0..n);
                let fitness = population.fitness(player);
                if criterion.is_better(fitness, winner_fitness) {
                    winner = player;
                    winner_fitness = fitness;
                }
            }
            *slot = winner;
        }
        Ok(())
    }
}

/// Fitness-proportionate (roulette-wheel) selection.
///
/// Position `i` owns a wheel segment of width `fitness[i] / total`. Only
/// meaningful when larger fitness is better and every fitness is
/// non-negative, so it is defined for [`Criterion::Maximize`] only and
/// rejects populations holding a negative fitness.
///
/// # Complexity
/// O(n) per generation to build the wheel, O(log n) per draw
#[derive(Debug, Clone, Default)]
pub struct RouletteWheelSelection {
    segments: Vec<f32>,
}

impl RouletteWheelSelection {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_segments(&mut self, population: &PopulationView<'_>, total: f32) {
        self.segments.clear();
        let mut cumulative = 0.0f32;
        for position in 0..population.len() {
            cumulative += population.fitness(position) / total;
            self.segments.push(cumulative);
        }
        // Absorb rounding so every draw lands on a segment.
        if let Some(last) = self.segments.last_mut() {
            *last = 1.0;
        }
    }

    /// Segment owning `value`: the first whose upper bound is `>= value`.
    fn locate(&self, value: f32) -> usize {
        self.segments
            .partition_point(|&bound| bound < value)
            .min(self.segments.len() - 1)
    }
}

impl SelectionOperator for RouletteWheelSelection {
    fn select<R: Rng>(
        &mut self,
        pool: &mut [usize],
        population: &PopulationView<'_>,
        best: &BestFitness,
        criterion: Criterion,
        rng: &mut R,
    ) -> Result<(), EvolutionError> {
        if criterion == Criterion::Minimize {
            return Err(EvolutionError::unsupported(
                "roulette-wheel selection is defined for maximization only",
            ));
        }
        if population.is_empty() {
            return Err(EvolutionError::invalid("cannot select from empty population"));
        }
        if let Some(position) = (0..population.len()).find(|&p| population.fitness(p) < 0.0) {
            return Err(EvolutionError::unsupported(format!(
                "roulette-wheel selection needs non-negative fitness, got {} at position {position}",
                population.fitness(position)
            )));
        }
        if !(best.total.is_finite() && best.total > 0.0) {
            return Err(EvolutionError::unsupported(format!(
                "roulette-wheel selection needs a positive fitness sum, got {}",
                best.total
            )));
        }

        self.build_segments(population, best.total);
        for slot in pool.iter_mut() {
            *slot = self.locate(rng.random::<f32>());
        }
        Ok(())
    }

    fn supports(&self, criterion: Criterion) -> bool {
        criterion == Criterion::Maximize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ga::population::tests::evaluated;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn counts<S: SelectionOperator>(
        selection: &mut S,
        values: &[f32],
        criterion: Criterion,
        draws: usize,
    ) -> Vec<u32> {
        let (arena, population) = evaluated(values);
        let view = population.view(&arena);
        let best = BestFitness::scan(&view, criterion);
        let mut rng = StdRng::seed_from_u64(42);
        let mut pool = vec![usize::MAX; draws];
        selection
            .select(&mut pool, &view, &best, criterion, &mut rng)
            .unwrap();

        let mut counts = vec![0u32; values.len()];
        for &position in &pool {
            counts[position] += 1;
        }
        counts
    }

    #[test]
    fn test_tournament_favors_best_minimize() {
        let counts = counts(
            &mut TournamentSelection::new(4),
            &[10.0, 5.0, 1.0, 8.0],
            Criterion::Minimize,
            10_000,
        );
        assert!(counts[2] > 6000, "expected best >60%, got {counts:?}");
    }

    #[test]
    fn test_tournament_favors_best_maximize() {
        let counts = counts(
            &mut TournamentSelection::new(4),
            &[10.0, 5.0, 1.0, 8.0],
            Criterion::Maximize,
            10_000,
        );
        assert!(counts[0] > 6000, "expected best >60%, got {counts:?}");
    }

    #[test]
    fn test_tournament_size_1_is_random() {
        let counts = counts(
            &mut TournamentSelection::new(1),
            &[10.0, 5.0, 1.0, 8.0],
            Criterion::Minimize,
            10_000,
        );
        for &c in &counts {
            assert!(c > 2000, "expected uniform, got counts: {counts:?}");
        }
    }

    #[test]
    fn test_tournament_size_zero_clamped() {
        assert_eq!(TournamentSelection::new(0).size(), 1);
    }

    #[test]
    fn test_tournament_empty_population() {
        let (arena, population) = evaluated(&[]);
        let view = population.view(&arena);
        let best = BestFitness::empty(Criterion::Minimize);
        let mut pool = vec![0; 2];
        let mut rng = StdRng::seed_from_u64(1);
        let result =
            TournamentSelection::new(3).select(&mut pool, &view, &best, Criterion::Minimize, &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn test_roulette_proportional() {
        let counts = counts(
            &mut RouletteWheelSelection::new(),
            &[1.0, 2.0, 7.0],
            Criterion::Maximize,
            20_000,
        );
        let share = |c: u32| c as f64 / 20_000.0;
        assert!((share(counts[0]) - 0.1).abs() < 0.02, "{counts:?}");
        assert!((share(counts[1]) - 0.2).abs() < 0.02, "{counts:?}");
        assert!((share(counts[2]) - 0.7).abs() < 0.02, "{counts:?}");
    }

    #[test]
    fn test_roulette_zero_fitness_never_selected() {
        let counts = counts(
            &mut RouletteWheelSelection::new(),
            &[3.0, 0.0, 1.0],
            Criterion::Maximize,
            5_000,
        );
        assert_eq!(counts[1], 0, "{counts:?}");
    }

    #[test]
    fn test_roulette_rejects_minimize() {
        let (arena, population) = evaluated(&[1.0, 2.0]);
        let view = population.view(&arena);
        let best = BestFitness::scan(&view, Criterion::Minimize);
        let mut pool = vec![usize::MAX; 4];
        let mut rng = StdRng::seed_from_u64(1);

        let mut roulette = RouletteWheelSelection::new();
        assert!(!roulette.supports(Criterion::Minimize));
        let result = roulette.select(&mut pool, &view, &best, Criterion::Minimize, &mut rng);
        assert!(matches!(
            result,
            Err(EvolutionError::UnsupportedConfiguration(_))
        ));
        // Pool untouched.
        assert!(pool.iter().all(|&p| p == usize::MAX));
    }

    #[test]
    fn test_roulette_rejects_non_positive_sum() {
        let (arena, population) = evaluated(&[-1.0, 0.5]);
        let view = population.view(&arena);
        let best = BestFitness::scan(&view, Criterion::Maximize);
        let mut pool = vec![0; 2];
        let mut rng = StdRng::seed_from_u64(1);
        let result =
            RouletteWheelSelection::new().select(&mut pool, &view, &best, Criterion::Maximize, &mut rng);
        assert!(result.is_err());
    }

    #[test]
    fn test_roulette_rejects_negative_fitness() {
        // Positive sum, but the wheel would not be monotone.
        let (arena, population) = evaluated(&[4.0, -1.0, 2.0]);
        let view = population.view(&arena);
        let best = BestFitness::scan(&view, Criterion::Maximize);
        assert!(best.total > 0.0);
        let mut pool = vec![usize::MAX; 3];
        let mut rng = StdRng::seed_from_u64(1);

        let result =
            RouletteWheelSelection::new().select(&mut pool, &view, &best, Criterion::Maximize, &mut rng);
        assert!(matches!(
            result,
            Err(EvolutionError::UnsupportedConfiguration(_))
        ));
        assert!(pool.iter().all(|&p| p == usize::MAX));
    }

    #[test]
    fn test_roulette_boundary_rule() {
        let mut roulette = RouletteWheelSelection {
            segments: vec![0.25, 0.5, 1.0],
        };
        assert_eq!(roulette.locate(0.0), 0);
        assert_eq!(roulette.locate(0.25), 0);
        assert_eq!(roulette.locate(0.2500001), 1);
        assert_eq!(roulette.locate(0.5), 1);
        assert_eq!(roulette.locate(0.75), 2);
        assert_eq!(roulette.locate(1.0), 2);
        roulette.segments = vec![1.0];
        assert_eq!(roulette.locate(0.99), 0);
    }
}
