//! Contracts between the engine and its collaborators.
//!
//! - [`FitnessFunction`]: consumed, scores one individual's genes
//! - [`Observer`]: emitted, receives per-generation progress
//! - [`StopHandle`]: lets another thread request a stop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Scores an individual.
///
/// The engine calls this only for individuals whose genes changed since
/// their last evaluation and caches the returned value. Implementations
/// may be arbitrarily expensive (e.g. a neural-network forward pass) but
/// must not hold on to the gene slices after returning.
///
/// `Send + Sync` because evaluation may run on rayon workers when the
/// `parallel` feature is enabled.
///
/// Closures implement this trait:
///
/// ```
/// use u_evolution::ga::FitnessFunction;
///
/// let sphere = |genes: &[Vec<f32>]| -> anyhow::Result<f32> {
///     Ok(genes.iter().flatten().map(|x| x * x).sum())
/// };
/// assert_eq!(sphere.fitness(&[vec![1.0, 2.0]]).unwrap(), 5.0);
/// ```
pub trait FitnessFunction: Send + Sync {
    /// Computes the fitness of one gene set.
    ///
    /// An error aborts the run.
    fn fitness(&self, chromosomes: &[Vec<f32>]) -> anyhow::Result<f32>;
}

impl<F> FitnessFunction for F
where
    F: Fn(&[Vec<f32>]) -> anyhow::Result<f32> + Send + Sync,
{
    fn fitness(&self, chromosomes: &[Vec<f32>]) -> anyhow::Result<f32> {
        self(chromosomes)
    }
}

/// Lifecycle of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProcessState {
    /// Created, start population not yet built.
    NotStarted,
    /// Inside `run`.
    InProgress,
    /// Stopped on request; `run` resumes from the current population.
    Stopped,
    /// Ran the configured number of generations.
    Finished,
    /// A run was aborted by an error.
    Failed,
}

/// Progress of one completed generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationReport {
    /// 1-based generation index, counted over the lifetime of the engine.
    pub generation: usize,
    /// Best fitness of the new population.
    pub best_fitness: f32,
    /// Sum of the new population's fitness values.
    pub fitness_sum: f32,
    /// Parent pairs actually crossed (`new_population_size / 2`).
    pub crossings: usize,
    /// Parent pairs considered, including those rejected by the crossing roll.
    pub crossing_attempts: usize,
    /// Individuals mutated.
    pub mutations: usize,
    /// Fitness-function calls made for this generation.
    pub evaluations: usize,
}

/// Receives progress notifications from a run.
///
/// `()` ignores everything; any `FnMut(&GenerationReport)` observes
/// generations only.
pub trait Observer {
    /// Called after every completed generation.
    fn on_generation(&mut self, _report: &GenerationReport) {}

    /// Called once when a run ends normally or on a stop request, with the
    /// number of generations that run executed.
    fn on_finished(&mut self, _generations: usize) {}
}

impl Observer for () {}

impl<F> Observer for F
where
    F: FnMut(&GenerationReport),
{
    fn on_generation(&mut self, report: &GenerationReport) {
        self(report)
    }
}

/// Shared stop request flag.
///
/// The engine checks it before each generation, so a stop takes effect
/// once the in-flight generation completes.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Clears a pending request. Returns whether one was pending.
    pub(crate) fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}
