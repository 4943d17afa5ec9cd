//! Fixed-shape real-valued individual.

/// A candidate solution: an ordered set of `f32` chromosomes plus a cached
/// fitness value.
///
/// The shape (chromosome count and each chromosome's length) is fixed at
/// construction. Every mutable access to the genes clears the cached
/// fitness, so the engine re-evaluates exactly the individuals whose genes
/// changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Individual {
    chromosomes: Vec<Vec<f32>>,
    fitness: f32,
    fitness_available: bool,
}

impl Individual {
    /// Creates a zero-filled individual with the given chromosome lengths.
    pub fn new(structure: &[usize]) -> Self {
        Self {
            chromosomes: structure.iter().map(|&len| vec![0.0; len]).collect(),
            fitness: 0.0,
            fitness_available: false,
        }
    }

    /// Wraps existing gene vectors. The fitness starts out unavailable.
    pub fn from_chromosomes(chromosomes: Vec<Vec<f32>>) -> Self {
        Self {
            chromosomes,
            fitness: 0.0,
            fitness_available: false,
        }
    }

    #[inline]
    pub fn chromosomes(&self) -> &[Vec<f32>] {
        &self.chromosomes
    }

    /// Mutable view of one chromosome. Clears the cached fitness.
    #[inline]
    pub fn chromosome_mut(&mut self, index: usize) -> &mut [f32] {
        self.fitness_available = false;
        &mut self.chromosomes[index]
    }

    /// Mutable views of every chromosome, in order. Clears the cached fitness.
    pub fn chromosomes_mut(&mut self) -> impl Iterator<Item = &mut [f32]> + '_ {
        self.fitness_available = false;
        self.chromosomes.iter_mut().map(Vec::as_mut_slice)
    }

    /// Overwrites genes and cached fitness with those of `other` without
    /// reallocating.
    ///
    /// # Panics
    /// Panics if the shapes differ.
    pub(crate) fn copy_from(&mut self, other: &Individual) {
        assert_eq!(self.chromosomes.len(), other.chromosomes.len());
        for (dst, src) in self.chromosomes.iter_mut().zip(&other.chromosomes) {
            dst.copy_from_slice(src);
        }
        self.fitness = other.fitness;
        self.fitness_available = other.fitness_available;
    }

    #[inline]
    pub fn chromosome_count(&self) -> usize {
        self.chromosomes.len()
    }

    /// Total number of genes across all chromosomes.
    pub fn gene_count(&self) -> usize {
        self.chromosomes.iter().map(Vec::len).sum()
    }

    /// Returns `true` if `structure` lists this individual's chromosome lengths.
    pub fn has_shape(&self, structure: &[usize]) -> bool {
        self.chromosomes.len() == structure.len()
            && self
                .chromosomes
                .iter()
                .zip(structure)
                .all(|(c, &len)| c.len() == len)
    }

    /// The cached fitness, if it is still valid.
    #[inline]
    pub fn fitness(&self) -> Option<f32> {
        self.fitness_available.then_some(self.fitness)
    }

    /// Last fitness value stored, valid or not.
    #[inline]
    pub(crate) fn raw_fitness(&self) -> f32 {
        self.fitness
    }

    #[inline]
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
        self.fitness_available = true;
    }

    #[inline]
    pub fn is_fitness_available(&self) -> bool {
        self.fitness_available
    }

    #[inline]
    pub fn invalidate_fitness(&mut self) {
        self.fitness_available = false;
    }
}
