//! Generational evolutionary loop.
//!
//! [`GaEngine`] orchestrates one run:
//! evaluate → sort → cross → keep elites → retain at random → mutate →
//! re-evaluate → swap buffers → repeat.
//!
//! All individuals are allocated once, when the engine is created:
//! `population_size` residents plus `new_population_size` spares that
//! circulate through the recycle queue as crossover children. No
//! individual is allocated or dropped while the loop runs.

use super::config::{Criterion, EvolutionConfig, GeneBounds, PopulationSizes};
use super::error::EvolutionError;
use super::individual::Individual;
use super::operators::{CrossoverOperator, MutationOperator};
use super::population::{Arena, BestFitness, Population, PopulationView};
use super::selection::SelectionOperator;
use super::types::{FitnessFunction, GenerationReport, Observer, ProcessState, StopHandle};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, instrument, warn};

/// The three variation operators of a run.
#[derive(Debug, Clone, Default)]
pub struct Operators<S, C, M> {
    pub selection: S,
    pub crossover: C,
    pub mutation: M,
}

impl<S, C, M> Operators<S, C, M> {
    pub fn new(selection: S, crossover: C, mutation: M) -> Self {
        Self {
            selection,
            crossover,
            mutation,
        }
    }
}

/// Independent random streams, all derived from one master seed.
#[derive(Debug, Clone)]
struct RngStreams {
    /// Crossing rolls, parent draws, random retention, mutation rolls.
    engine: StdRng,
    selection: StdRng,
    crossover: StdRng,
    mutation: StdRng,
    distribution: StdRng,
}

impl RngStreams {
    fn from_seed(seed: u64) -> Self {
        let mut master = StdRng::seed_from_u64(seed);
        let mut derive = || StdRng::seed_from_u64(master.random());
        Self {
            engine: derive(),
            selection: derive(),
            crossover: derive(),
            mutation: derive(),
            distribution: derive(),
        }
    }
}

/// State of the current population taken before a generation starts, so a
/// failed generation can be rolled back.
///
/// Storage is allocated once; taking and restoring a checkpoint does not
/// allocate.
#[derive(Debug, Clone)]
struct Checkpoint {
    slots: Vec<usize>,
    best: BestFitness,
    /// Arena ids mutated so far, in order.
    mutated: Vec<usize>,
    /// Pre-mutation copies; entry `k` belongs to `mutated[k]`.
    saved: Vec<Individual>,
}

impl Checkpoint {
    fn new(structure: &[usize], sizes: &PopulationSizes, criterion: Criterion) -> Self {
        Self {
            slots: Vec::with_capacity(sizes.population),
            best: BestFitness::empty(criterion),
            mutated: Vec::with_capacity(sizes.retained()),
            saved: (0..sizes.retained())
                .map(|_| Individual::new(structure))
                .collect(),
        }
    }

    fn take(&mut self, population: &Population, best: BestFitness) {
        self.slots.clear();
        self.slots.extend_from_slice(population.ids());
        self.best = best;
        self.mutated.clear();
    }

    /// Records `individual` before it is mutated.
    fn save(&mut self, id: usize, individual: &Individual) {
        self.saved[self.mutated.len()].copy_from(individual);
        self.mutated.push(id);
    }
}

/// Generational evolutionary search engine.
///
/// # Usage
///
/// ```
/// use u_evolution::ga::{
///     benchmarks, BlendCrossover, EvolutionConfig, GaEngine, Operators,
///     SingleMutation, TournamentSelection,
/// };
///
/// let config = EvolutionConfig::default()
///     .with_population_size(50)
///     .with_chromosome(10, -500.0, 500.0)
///     .with_iteration_count(20)
///     .with_seed(42);
/// let operators = Operators::new(
///     TournamentSelection::new(5),
///     BlendCrossover::new(0.5),
///     SingleMutation,
/// );
///
/// let mut engine = GaEngine::new(config, operators, benchmarks::schwefel).unwrap();
/// engine.run().unwrap();
/// let genes = engine.result().unwrap();
/// assert_eq!(genes[0].len(), 10);
/// ```
pub struct GaEngine<F, S, C, M> {
    config: EvolutionConfig,
    sizes: PopulationSizes,
    bounds: Vec<GeneBounds>,
    seed: u64,

    fitness: F,
    selection: S,
    crossover: C,
    mutation: M,

    arena: Arena,
    population: Population,
    buffer: Population,
    mating_pool: Vec<usize>,
    best: BestFitness,
    checkpoint: Checkpoint,

    rngs: RngStreams,
    state: ProcessState,
    stop: StopHandle,
    generation: usize,
    history: Vec<f32>,
}

impl<F, S, C, M> GaEngine<F, S, C, M>
where
    F: FitnessFunction,
    S: SelectionOperator,
    C: CrossoverOperator,
    M: MutationOperator,
{
    /// Validates `config`, derives the population partition and allocates
    /// every individual the run will use.
    ///
    /// The master seed is `config.seed`, or a fresh random one.
    #[instrument(level = "debug", skip_all, fields(population_size = config.population_size))]
    pub fn new(
        config: EvolutionConfig,
        operators: Operators<S, C, M>,
        fitness: F,
    ) -> Result<Self, EvolutionError> {
        config.validate()?;
        if !operators.selection.supports(config.criterion) {
            return Err(EvolutionError::unsupported(format!(
                "selection operator does not support {:?}",
                config.criterion
            )));
        }
        if config.parallel && !cfg!(feature = "parallel") {
            warn!("parallel evaluation requested but the `parallel` feature is disabled");
        }

        let sizes = config.sizes();
        let structure = config.structure();
        let seed = config.seed.unwrap_or_else(rand::random);
        info!(
            seed,
            population = sizes.population,
            new = sizes.new,
            old = sizes.old,
            elite = sizes.elite,
            chromosomes = structure.len(),
            "initialized evolutionary engine"
        );

        Ok(Self {
            bounds: config.bounds(),
            sizes,
            seed,
            fitness,
            selection: operators.selection,
            crossover: operators.crossover,
            mutation: operators.mutation,
            arena: Arena::new(&structure, sizes.population, sizes.new),
            population: Population::filled(sizes.population),
            buffer: Population::with_capacity(sizes.population),
            mating_pool: vec![0; sizes.new],
            best: BestFitness::empty(config.criterion),
            checkpoint: Checkpoint::new(&structure, &sizes, config.criterion),
            rngs: RngStreams::from_seed(seed),
            state: ProcessState::NotStarted,
            stop: StopHandle::new(),
            generation: 0,
            history: Vec::new(),
            config,
        })
    }

    /// Runs up to `iteration_count` generations.
    ///
    /// Returns the number of generations executed.
    pub fn run(&mut self) -> Result<usize, EvolutionError> {
        self.run_with_observer(&mut ())
    }

    /// Runs up to `iteration_count` generations, reporting progress.
    ///
    /// The first call builds and evaluates the start population. After a
    /// stop request the engine is `Stopped` and a further call resumes from
    /// the current population. An error aborts the run and leaves the engine
    /// `Failed`; the generation in flight is rolled back, so the current
    /// population is exactly the last completed one.
    pub fn run_with_observer<O: Observer>(
        &mut self,
        observer: &mut O,
    ) -> Result<usize, EvolutionError> {
        match self.state {
            ProcessState::NotStarted => {
                self.state = ProcessState::InProgress;
                if let Err(err) = self.create_start_population() {
                    warn!(error = %err, "failed to evaluate start population");
                    self.state = ProcessState::Failed;
                    return Err(err);
                }
            }
            ProcessState::Stopped => self.state = ProcessState::InProgress,
            state => return Err(EvolutionError::InvalidState { state }),
        }

        let mut executed = 0;
        let outcome = loop {
            if executed == self.config.iteration_count {
                break Ok(ProcessState::Finished);
            }
            if self.stop.take() {
                break Ok(ProcessState::Stopped);
            }
            match self.next_generation() {
                Ok(report) => {
                    executed += 1;
                    self.history.push(report.best_fitness);
                    observer.on_generation(&report);
                }
                Err(err) => break Err(err),
            }
        };

        match outcome {
            Ok(state) => {
                self.state = state;
                info!(
                    generations = executed,
                    best = self.best.value,
                    state = ?state,
                    "evolutionary run ended"
                );
                observer.on_finished(executed);
                Ok(executed)
            }
            Err(err) => {
                self.state = ProcessState::Failed;
                warn!(error = %err, generation = self.generation + 1, "evolutionary run aborted");
                Err(err)
            }
        }
    }

    /// Genes of the best individual of the current population.
    pub fn result(&self) -> Result<&[Vec<f32>], EvolutionError> {
        match self.state {
            ProcessState::Stopped | ProcessState::Finished => Ok(self
                .arena
                .get(self.population.id(self.best.position))
                .chromosomes()),
            state => Err(EvolutionError::NotReady { state }),
        }
    }

    /// Requests a stop at the next generation boundary.
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// Handle for requesting a stop from another thread or an observer.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> ProcessState {
        self.state
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn sizes(&self) -> PopulationSizes {
        self.sizes
    }

    /// Master seed of this engine.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generations completed over the engine's lifetime.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Best fitness of the current population, once it has been evaluated.
    pub fn best_fitness(&self) -> Option<f32> {
        match self.state {
            ProcessState::NotStarted => None,
            _ => Some(self.best.value),
        }
    }

    /// Best-fitness record of the current population.
    pub fn best(&self) -> &BestFitness {
        &self.best
    }

    /// Best fitness after each completed generation.
    pub fn fitness_history(&self) -> &[f32] {
        &self.history
    }

    /// The current population.
    pub fn population(&self) -> PopulationView<'_> {
        self.population.view(&self.arena)
    }

    /// Number of individuals allocated for this run.
    pub fn arena_len(&self) -> usize {
        self.arena.len()
    }

    fn create_start_population(&mut self) -> Result<(), EvolutionError> {
        let distribution = self.config.distribution;
        for &id in self.population.ids() {
            distribution.fill(
                self.arena.get_mut(id),
                &self.bounds,
                &mut self.rngs.distribution,
            );
        }
        let (best, evaluations) = self.evaluate(Buffer::Current)?;
        self.best = best;
        debug!(evaluations, best = best.value, "start population evaluated");
        Ok(())
    }

    /// Advances one generation, or rolls back and returns the error.
    fn next_generation(&mut self) -> Result<GenerationReport, EvolutionError> {
        self.checkpoint.take(&self.population, self.best);
        self.advance().inspect_err(|_| self.rollback())
    }

    fn advance(&mut self) -> Result<GenerationReport, EvolutionError> {
        // Either the start population or the previous generation's buffer;
        // both were fully evaluated and scanned into `self.best`.
        debug_assert!(self
            .population
            .ids()
            .iter()
            .all(|&id| self.arena.get(id).is_fitness_available()));

        self.population
            .sort_by_fitness(&self.arena, self.config.criterion);
        self.best.position = 0;

        self.buffer.reset();
        let (crossings, crossing_attempts) = self.add_crossing_individuals()?;
        self.add_elite_and_old_individuals();
        let mutations = self.mutate_retained();

        let (best, evaluations) = self.evaluate(Buffer::Next)?;

        std::mem::swap(&mut self.population, &mut self.buffer);
        self.recycle_dropped();
        self.best = best;
        self.generation += 1;

        let report = GenerationReport {
            generation: self.generation,
            best_fitness: best.value,
            fitness_sum: best.total,
            crossings,
            crossing_attempts,
            mutations,
            evaluations,
        };
        debug!(
            generation = report.generation,
            best = report.best_fitness,
            crossings,
            mutations,
            evaluations,
            "generation completed"
        );
        Ok(report)
    }

    /// Undoes a generation that failed before the buffer swap.
    fn rollback(&mut self) {
        for (k, &id) in self.checkpoint.mutated.iter().enumerate() {
            self.arena.get_mut(id).copy_from(&self.checkpoint.saved[k]);
        }
        let children = self.sizes.new.min(self.buffer.len());
        for position in 0..children {
            self.arena.release(self.buffer.id(position));
        }
        self.buffer.reset();
        self.population.restore(&self.checkpoint.slots);
        self.best = self.checkpoint.best;
        debug!(
            mutated = self.checkpoint.mutated.len(),
            children, "rolled back failed generation"
        );
    }

    /// Fills the first `new` slots of the buffer with crossover children.
    ///
    /// Returns (crossings, attempts).
    fn add_crossing_individuals(&mut self) -> Result<(usize, usize), EvolutionError> {
        let new = self.sizes.new;
        if new == 0 {
            return Ok((0, 0));
        }

        let view = self.population.view(&self.arena);
        self.selection.select(
            &mut self.mating_pool,
            &view,
            &self.best,
            self.config.criterion,
            &mut self.rngs.selection,
        )?;

        let mut produced = 0;
        let mut attempts = 0;
        while produced < new {
            attempts += 1;
            if self.rngs.engine.random::<f64>() >= self.config.crossover_probability {
                continue;
            }
            let first = self.mating_pool[self.rngs.engine.random_range(0..new)];
            let second = self.mating_pool[self.rngs.engine.random_range(0..new)];
            let parents = (self.population.id(first), self.population.id(second));
            let children = (
                self.arena
                    .acquire()
                    .expect("recycle queue holds new_population_size ids"),
                self.arena
                    .acquire()
                    .expect("recycle queue holds new_population_size ids"),
            );

            let crossover = &self.crossover;
            let bounds = &self.bounds;
            let rng = &mut self.rngs.crossover;
            self.arena.breed(parents, children, |p1, p2, c1, c2| {
                crossover.cross(p1, p2, c1, c2, bounds, rng)
            });

            self.buffer.push(children.0);
            self.buffer.push(children.1);
            produced += 2;
        }
        Ok((produced / 2, attempts))
    }

    /// Copies elites and draws the randomly retained individuals. The rest
    /// stays at positions `old..population` until [`Self::recycle_dropped`].
    fn add_elite_and_old_individuals(&mut self) {
        let PopulationSizes {
            population,
            old,
            elite,
            ..
        } = self.sizes;

        for position in 0..elite {
            self.buffer.push(self.population.id(position));
        }

        // Partial Fisher–Yates over the non-elite tail.
        for start in elite..old {
            let index = self.rngs.engine.random_range(start..population);
            if index != start {
                self.population.swap(start, index);
            }
            self.buffer.push(self.population.id(start));
        }
    }

    /// Recycles the individuals the previous population did not pass on.
    /// Runs after the swap, so the previous population is in `buffer`.
    fn recycle_dropped(&mut self) {
        for position in self.sizes.old..self.sizes.population {
            self.arena.release(self.buffer.id(position));
        }
    }

    /// Mutates the randomly retained range of the buffer only; elites and
    /// fresh children are left untouched.
    fn mutate_retained(&mut self) -> usize {
        let start = self.sizes.new + self.sizes.elite;
        let mut mutations = 0;
        for position in start..self.sizes.population {
            if self.rngs.engine.random::<f64>() < self.config.mutation_probability {
                let id = self.buffer.id(position);
                self.checkpoint.save(id, self.arena.get(id));
                let individual = self.arena.get_mut(id);
                self.mutation
                    .mutate(individual, &self.bounds, &mut self.rngs.mutation);
                individual.invalidate_fitness();
                mutations += 1;
            }
        }
        mutations
    }

    fn evaluate(&mut self, which: Buffer) -> Result<(BestFitness, usize), EvolutionError> {
        let population = match which {
            Buffer::Current => &self.population,
            Buffer::Next => &self.buffer,
        };
        evaluate_population(
            &self.fitness,
            &mut self.arena,
            population,
            self.config.criterion,
            self.config.parallel,
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Buffer {
    Current,
    Next,
}

/// Evaluates every individual of `population` without a cached fitness,
/// then scans the population for its best-fitness record.
///
/// Returns the record and the number of fitness-function calls.
fn evaluate_population<F: FitnessFunction>(
    fitness: &F,
    arena: &mut Arena,
    population: &Population,
    criterion: Criterion,
    parallel: bool,
) -> Result<(BestFitness, usize), EvolutionError> {
    #[cfg(feature = "parallel")]
    let evaluations = if parallel {
        evaluate_parallel(fitness, arena, population)?
    } else {
        evaluate_sequential(fitness, arena, population)?
    };
    #[cfg(not(feature = "parallel"))]
    let evaluations = {
        let _ = parallel;
        evaluate_sequential(fitness, arena, population)?
    };

    let best = BestFitness::scan(&population.view(arena), criterion);
    Ok((best, evaluations))
}

fn evaluate_sequential<F: FitnessFunction>(
    fitness: &F,
    arena: &mut Arena,
    population: &Population,
) -> Result<usize, EvolutionError> {
    let mut evaluations = 0;
    for &id in population.ids() {
        let individual = arena.get_mut(id);
        if individual.is_fitness_available() {
            continue;
        }
        let value = checked(fitness.fitness(individual.chromosomes())?)?;
        individual.set_fitness(value);
        evaluations += 1;
    }
    Ok(evaluations)
}

#[cfg(feature = "parallel")]
fn evaluate_parallel<F: FitnessFunction>(
    fitness: &F,
    arena: &mut Arena,
    population: &Population,
) -> Result<usize, EvolutionError> {
    use rayon::prelude::*;

    let pending: Vec<usize> = population
        .ids()
        .iter()
        .copied()
        .filter(|&id| !arena.get(id).is_fitness_available())
        .collect();
    let shared: &Arena = arena;
    let values = pending
        .par_iter()
        .map(|&id| fitness.fitness(shared.get(id).chromosomes()))
        .collect::<anyhow::Result<Vec<f32>>>()?;

    for (&id, value) in pending.iter().zip(values) {
        arena.get_mut(id).set_fitness(checked(value)?);
    }
    Ok(pending.len())
}

#[inline]
fn checked(value: f32) -> Result<f32, EvolutionError> {
    if value.is_nan() {
        Err(EvolutionError::InvalidFitness { value })
    } else {
        Ok(value)
    }
}

// ============================================================================
// Tests
// ============================================================================
