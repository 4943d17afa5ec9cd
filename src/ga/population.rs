//! Population storage: individual arena, slot populations and the
//! best-fitness record.
//!
//! Individuals live in an [`Arena`] that is allocated once per run and never
//! grows. A [`Population`] is a fixed-capacity list of arena ids with a
//! logical size cursor, so two of them can be used as double buffers
//! without copying individuals. Arena ids that are in neither buffer wait
//! in the arena's recycle queue until crossover reuses them as children.

use super::config::Criterion;
use super::individual::Individual;
use std::collections::VecDeque;

/// Fixed set of individuals plus a FIFO of ids available for reuse.
#[derive(Debug, Clone)]
pub struct Arena {
    individuals: Vec<Individual>,
    recycle: VecDeque<usize>,
}

impl Arena {
    /// Allocates `resident + spare` individuals of the given shape.
    ///
    /// Ids `0..resident` are meant for the first population; ids
    /// `resident..resident + spare` seed the recycle queue.
    pub(crate) fn new(structure: &[usize], resident: usize, spare: usize) -> Self {
        let individuals = (0..resident + spare)
            .map(|_| Individual::new(structure))
            .collect();
        let mut recycle = VecDeque::with_capacity(spare);
        recycle.extend(resident..resident + spare);
        Self {
            individuals,
            recycle,
        }
    }

    /// Total number of individuals owned by the arena.
    #[inline]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    #[inline]
    pub fn get(&self, id: usize) -> &Individual {
        &self.individuals[id]
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: usize) -> &mut Individual {
        &mut self.individuals[id]
    }

    /// Ids currently waiting for reuse.
    pub fn recycled(&self) -> impl Iterator<Item = usize> + '_ {
        self.recycle.iter().copied()
    }

    #[inline]
    pub fn recycled_len(&self) -> usize {
        self.recycle.len()
    }

    /// Takes the oldest recycled id.
    #[inline]
    pub(crate) fn acquire(&mut self) -> Option<usize> {
        self.recycle.pop_front()
    }

    /// Marks `id` as no longer part of any population.
    #[inline]
    pub(crate) fn release(&mut self, id: usize) {
        self.individuals[id].invalidate_fitness();
        self.recycle.push_back(id);
    }

    /// Runs `breed` with shared access to two parents and exclusive access
    /// to two children.
    ///
    /// Children must be distinct from each other and from both parents;
    /// the parents may be the same id. Both children end up with their
    /// fitness cleared.
    pub(crate) fn breed<F>(&mut self, parents: (usize, usize), children: (usize, usize), breed: F)
    where
        F: FnOnce(&Individual, &Individual, &mut Individual, &mut Individual),
    {
        debug_assert_ne!(children.0, children.1);
        debug_assert!(children.0 != parents.0 && children.0 != parents.1);
        debug_assert!(children.1 != parents.0 && children.1 != parents.1);

        // Moving the children out leaves empty placeholders; no allocation.
        let mut first = std::mem::take(&mut self.individuals[children.0]);
        let mut second = std::mem::take(&mut self.individuals[children.1]);
        breed(
            &self.individuals[parents.0],
            &self.individuals[parents.1],
            &mut first,
            &mut second,
        );
        first.invalidate_fitness();
        second.invalidate_fitness();
        self.individuals[children.0] = first;
        self.individuals[children.1] = second;
    }
}

/// Fixed-capacity, append-only list of arena ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Population {
    slots: Vec<usize>,
    size: usize,
}

impl Population {
    /// Creates an empty population able to hold `capacity` ids.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![0; capacity],
            size: 0,
        }
    }

    /// Creates a full population holding ids `0..size`.
    pub(crate) fn filled(size: usize) -> Self {
        Self {
            slots: (0..size).collect(),
            size,
        }
    }

    /// Logical size.
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Arena ids in slot order.
    #[inline]
    pub fn ids(&self) -> &[usize] {
        &self.slots[..self.size]
    }

    /// Arena id at `position`.
    #[inline]
    pub fn id(&self, position: usize) -> usize {
        self.ids()[position]
    }

    /// Empties the population without releasing its storage.
    #[inline]
    pub(crate) fn reset(&mut self) {
        self.size = 0;
    }

    /// Appends an id at the size cursor.
    ///
    /// # Panics
    /// Panics if the population is already at capacity.
    #[inline]
    pub(crate) fn push(&mut self, id: usize) {
        assert!(self.size < self.slots.len(), "population capacity exceeded");
        self.slots[self.size] = id;
        self.size += 1;
    }

    /// Replaces the contents with `ids`, in order.
    pub(crate) fn restore(&mut self, ids: &[usize]) {
        assert!(ids.len() <= self.slots.len(), "population capacity exceeded");
        self.slots[..ids.len()].copy_from_slice(ids);
        self.size = ids.len();
    }

    #[inline]
    pub(crate) fn swap(&mut self, a: usize, b: usize) {
        self.slots[..self.size].swap(a, b);
    }

    /// Sorts the population in place so that slot 0 holds the best
    /// individual under `criterion`.
    ///
    /// Quicksort with the midpoint element as pivot, ascending for
    /// minimization and descending for maximization. Every individual must
    /// carry a non-NaN fitness.
    pub(crate) fn sort_by_fitness(&mut self, arena: &Arena, criterion: Criterion) {
        if self.size < 2 {
            return;
        }
        let last = self.size as isize - 1;
        let fitness = |id: usize| arena.get(id).raw_fitness();
        quicksort(&mut self.slots[..self.size], 0, last, &fitness, criterion);
    }

    /// Read-only view pairing this population with the arena it indexes.
    #[inline]
    pub fn view<'a>(&'a self, arena: &'a Arena) -> PopulationView<'a> {
        PopulationView {
            population: self,
            arena,
        }
    }
}

fn quicksort<F>(slots: &mut [usize], mut first: isize, mut last: isize, fitness: &F, criterion: Criterion)
where
    F: Fn(usize) -> f32,
{
    while first < last {
        let pivot = fitness(slots[(first + (last - first) / 2) as usize]);
        let mut left = first;
        let mut right = last;
        while left <= right {
            while criterion.is_better(fitness(slots[left as usize]), pivot) {
                left += 1;
            }
            while criterion.is_better(pivot, fitness(slots[right as usize])) {
                right -= 1;
            }
            if left <= right {
                slots.swap(left as usize, right as usize);
                left += 1;
                right -= 1;
            }
        }

        // Recurse into the shorter side, iterate on the longer one.
        if right - first < last - left {
            quicksort(slots, first, right, fitness, criterion);
            first = left;
        } else {
            quicksort(slots, left, last, fitness, criterion);
            last = right;
        }
    }
}

/// Shared view of a population's individuals in slot order.
#[derive(Debug, Clone, Copy)]
pub struct PopulationView<'a> {
    population: &'a Population,
    arena: &'a Arena,
}

impl<'a> PopulationView<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.population.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.population.is_empty()
    }

    #[inline]
    pub fn individual(&self, position: usize) -> &'a Individual {
        self.arena.get(self.population.id(position))
    }

    /// Last computed fitness of the individual at `position`.
    #[inline]
    pub fn fitness(&self, position: usize) -> f32 {
        self.individual(position).raw_fitness()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Individual> + 'a {
        let arena = self.arena;
        self.population.ids().iter().map(move |&id| arena.get(id))
    }
}

/// Best fitness of an evaluated population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestFitness {
    /// Best fitness value under the run's criterion.
    pub value: f32,
    /// Slot position of the best individual.
    pub position: usize,
    /// Sum of all fitness values (denominator for proportional selection).
    pub total: f32,
}

impl BestFitness {
    /// Record for a population that has not been evaluated yet.
    pub fn empty(criterion: Criterion) -> Self {
        Self {
            value: criterion.worst(),
            position: 0,
            total: 0.0,
        }
    }

    /// Scans an evaluated population.
    pub fn scan(view: &PopulationView<'_>, criterion: Criterion) -> Self {
        let mut best = Self::empty(criterion);
        for position in 0..view.len() {
            let value = view.fitness(position);
            best.total += value;
            if criterion.is_better(value, best.value) {
                best.value = value;
                best.position = position;
            }
        }
        best
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Arena with one single-gene individual per value, all evaluated,
    /// and a full population over it.
    pub(crate) fn evaluated(values: &[f32]) -> (Arena, Population) {
        let mut arena = Arena::new(&[1], values.len(), 0);
        for (id, &value) in values.iter().enumerate() {
            arena.get_mut(id).chromosome_mut(0)[0] = value;
            arena.get_mut(id).set_fitness(value);
        }
        (arena, Population::filled(values.len()))
    }

    fn sorted_fitness(values: &[f32], criterion: Criterion) -> Vec<f32> {
        let (arena, mut population) = evaluated(values);
        population.sort_by_fitness(&arena, criterion);
        let view = population.view(&arena);
        (0..view.len()).map(|i| view.fitness(i)).collect()
    }

    #[test]
    fn test_arena_layout() {
        let arena = Arena::new(&[2, 3], 4, 2);
        assert_eq!(arena.len(), 6);
        assert_eq!(arena.recycled().collect::<Vec<_>>(), vec![4, 5]);
        assert!(arena.get(5).has_shape(&[2, 3]));
    }

    #[test]
    fn test_acquire_release_fifo() {
        let mut arena = Arena::new(&[1], 2, 2);
        assert_eq!(arena.acquire(), Some(2));
        arena.get_mut(0).set_fitness(1.0);
        arena.release(0);
        assert!(!arena.get(0).is_fitness_available());
        assert_eq!(arena.acquire(), Some(3));
        assert_eq!(arena.acquire(), Some(0));
        assert_eq!(arena.acquire(), None);
    }

    #[test]
    fn test_breed_gives_disjoint_access() {
        let mut arena = Arena::new(&[2], 2, 2);
        arena.get_mut(0).chromosome_mut(0).copy_from_slice(&[1.0, 2.0]);
        arena.get_mut(1).chromosome_mut(0).copy_from_slice(&[3.0, 4.0]);
        arena.get_mut(2).set_fitness(9.0);

        arena.breed((0, 1), (2, 3), |p1, p2, c1, c2| {
            c1.chromosome_mut(0).copy_from_slice(&p2.chromosomes()[0]);
            c2.chromosome_mut(0).copy_from_slice(&p1.chromosomes()[0]);
        });

        assert_eq!(arena.get(2).chromosomes()[0], vec![3.0, 4.0]);
        assert_eq!(arena.get(3).chromosomes()[0], vec![1.0, 2.0]);
        assert!(!arena.get(2).is_fitness_available());
        assert_eq!(arena.len(), 4);
    }

    #[test]
    fn test_breed_same_parent() {
        let mut arena = Arena::new(&[1], 1, 2);
        arena.get_mut(0).chromosome_mut(0)[0] = 5.0;
        arena.breed((0, 0), (1, 2), |p1, p2, c1, c2| {
            c1.chromosome_mut(0)[0] = p1.chromosomes()[0][0];
            c2.chromosome_mut(0)[0] = p2.chromosomes()[0][0];
        });
        assert_eq!(arena.get(1).chromosomes()[0][0], 5.0);
        assert_eq!(arena.get(2).chromosomes()[0][0], 5.0);
    }

    #[test]
    fn test_population_reset_keeps_capacity() {
        let mut population = Population::with_capacity(3);
        population.push(7);
        population.push(8);
        assert_eq!(population.ids(), &[7, 8]);
        population.reset();
        assert!(population.is_empty());
        assert_eq!(population.capacity(), 3);
        population.push(1);
        assert_eq!(population.id(0), 1);
    }

    #[test]
    fn test_population_restore() {
        let mut population = Population::filled(4);
        let saved = population.ids().to_vec();
        population.swap(0, 3);
        population.reset();
        population.push(9);
        population.restore(&saved);
        assert_eq!(population.ids(), &[0, 1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "population capacity exceeded")]
    fn test_push_past_capacity_panics() {
        let mut population = Population::with_capacity(1);
        population.push(0);
        population.push(1);
    }

    #[test]
    fn test_sort_minimize() {
        let sorted = sorted_fitness(&[5.0, -1.0, 3.0, 3.0, 10.0, 0.5], Criterion::Minimize);
        assert_eq!(sorted, vec![-1.0, 0.5, 3.0, 3.0, 5.0, 10.0]);
    }

    #[test]
    fn test_sort_maximize() {
        let sorted = sorted_fitness(&[5.0, -1.0, 3.0, 3.0, 10.0, 0.5], Criterion::Maximize);
        assert_eq!(sorted, vec![10.0, 5.0, 3.0, 3.0, 0.5, -1.0]);
    }

    #[test]
    fn test_sort_trivial_sizes() {
        assert!(sorted_fitness(&[], Criterion::Minimize).is_empty());
        assert_eq!(sorted_fitness(&[2.0], Criterion::Maximize), vec![2.0]);
        assert_eq!(sorted_fitness(&[2.0, 1.0], Criterion::Minimize), vec![1.0, 2.0]);
    }

    #[test]
    fn test_sort_all_equal() {
        let sorted = sorted_fitness(&[4.0; 33], Criterion::Minimize);
        assert!(sorted.iter().all(|&v| v == 4.0));
    }

    #[test]
    fn test_best_fitness_scan() {
        let (arena, population) = evaluated(&[3.0, 1.0, 2.0]);
        let view = population.view(&arena);

        let min = BestFitness::scan(&view, Criterion::Minimize);
        assert_eq!(min.value, 1.0);
        assert_eq!(min.position, 1);
        assert_eq!(min.total, 6.0);

        let max = BestFitness::scan(&view, Criterion::Maximize);
        assert_eq!(max.value, 3.0);
        assert_eq!(max.position, 0);
    }

    proptest! {
        #[test]
        fn prop_sort_puts_extremum_first(values in prop::collection::vec(-1e6f32..1e6, 1..200)) {
            for criterion in [Criterion::Minimize, Criterion::Maximize] {
                let sorted = sorted_fitness(&values, criterion);
                let extremum = match criterion {
                    Criterion::Minimize => values.iter().cloned().fold(f32::INFINITY, f32::min),
                    Criterion::Maximize => values.iter().cloned().fold(f32::NEG_INFINITY, f32::max),
                };
                prop_assert_eq!(sorted[0], extremum);
                for pair in sorted.windows(2) {
                    prop_assert!(!criterion.is_better(pair[1], pair[0]));
                }
            }
        }

        #[test]
        fn prop_sort_is_permutation(values in prop::collection::vec(-100f32..100.0, 0..100)) {
            let (arena, mut population) = evaluated(&values);
            population.sort_by_fitness(&arena, Criterion::Minimize);
            let mut ids = population.ids().to_vec();
            ids.sort_unstable();
            prop_assert_eq!(ids, (0..values.len()).collect::<Vec<_>>());
        }
    }
}
