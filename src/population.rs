//! # Individuals and populations
//!
//! An [`Individual`] owns one genome plus its evaluation metadata. A
//! [`Population`] is an indexed buffer of `size + 2` individuals: the last two
//! slots are scratch space for offspring that have not been inserted yet.
//!
//! The run context keeps two populations, the current generation and the
//! next one, and swaps them at every generation boundary.
//!
//! The `evaluation_current` flag is the contract between the genetic operators
//! and the evaluation scheduler: any write to a genome clears it, and only
//! [`Individual::set_evaluation`] sets it again.

use std::cmp::Ordering;

use crate::error::{GeneticError, Result};
use crate::fitness::Direction;

/// Names one of the two population buffers of a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopulationId {
    /// The current generation.
    Old,
    /// The generation under construction.
    New,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Individual<G> {
    pub(crate) genome: G,
    pub(crate) evaluation: f64,
    pub(crate) fitness: f64,
    pub(crate) evaluation_current: bool,
}

impl<G> Individual<G> {
    pub fn new(genome: G) -> Self {
        Self {
            genome,
            evaluation: 0.0,
            fitness: 0.0,
            evaluation_current: false,
        }
    }

    pub fn genome(&self) -> &G {
        &self.genome
    }

    /// Mutable access to the alleles. Marks the evaluation stale.
    pub fn genome_mut(&mut self) -> &mut G {
        self.evaluation_current = false;
        &mut self.genome
    }

    pub fn evaluation(&self) -> f64 {
        self.evaluation
    }

    /// Records a fresh evaluation and marks it current.
    pub fn set_evaluation(&mut self, value: f64) {
        self.evaluation = value;
        self.evaluation_current = true;
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn is_evaluation_current(&self) -> bool {
        self.evaluation_current
    }

    pub fn set_evaluation_current(&mut self, current: bool) {
        self.evaluation_current = current;
    }
}

/// A population buffer with two trailing scratch slots.
#[derive(Debug, Clone)]
pub struct Population<G> {
    members: Vec<Individual<G>>,
    size: usize,
}

impl<G: Clone> Population<G> {
    /// Builds a buffer of `size` members plus two scratch slots, each
    /// genome produced by `create`.
    pub fn new(size: usize, mut create: impl FnMut(usize) -> G) -> Self {
        let members = (0..size + 2).map(|i| Individual::new(create(i))).collect();
        Self { members, size }
    }
}

impl<G> Individual<G> {
    /// Takes over `src`'s metadata, with `copy` writing the genome.
    fn assign_from(&mut self, src: &Individual<G>, copy: impl Fn(&G, &mut G)) {
        copy(&src.genome, &mut self.genome);
        self.evaluation = src.evaluation;
        self.fitness = src.fitness;
        self.evaluation_current = src.evaluation_current;
    }
}

impl<G> Population<G> {
    /// Copies slot `from` of `source` into slot `to` of `self`.
    pub fn copy_from(
        &mut self,
        to: usize,
        source: &Population<G>,
        from: usize,
        copy: impl Fn(&G, &mut G),
    ) {
        self.members[to].assign_from(&source.members[from], copy);
    }

    /// Copies one slot of this buffer into another.
    pub fn copy_within(&mut self, from: usize, to: usize, copy: impl Fn(&G, &mut G)) {
        if from < to {
            let (head, tail) = self.members.split_at_mut(to);
            tail[0].assign_from(&head[from], copy);
        } else if from > to {
            let (head, tail) = self.members.split_at_mut(from);
            head[to].assign_from(&tail[0], copy);
        }
    }

    /// Number of members, scratch slots excluded.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Index of the first scratch slot.
    pub fn temp1(&self) -> usize {
        self.size
    }

    /// Index of the second scratch slot.
    pub fn temp2(&self) -> usize {
        self.size + 1
    }

    pub fn get(&self, index: usize) -> Result<&Individual<G>> {
        self.members.get(index).ok_or_else(|| {
            GeneticError::OutOfBounds(format!(
                "Individual index {} exceeds buffer of {}",
                index,
                self.members.len()
            ))
        })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Individual<G>> {
        let len = self.members.len();
        self.members.get_mut(index).ok_or_else(|| {
            GeneticError::OutOfBounds(format!(
                "Individual index {} exceeds buffer of {}",
                index, len
            ))
        })
    }

    /// The members, scratch slots excluded.
    pub fn members(&self) -> &[Individual<G>] {
        &self.members[..self.size]
    }

    pub fn members_mut(&mut self) -> &mut [Individual<G>] {
        &mut self.members[..self.size]
    }

    pub(crate) fn slots(&self) -> &[Individual<G>] {
        &self.members
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [Individual<G>] {
        &mut self.members
    }

    /// Mutable access to two distinct slots at once.
    pub(crate) fn pair_mut(&mut self, a: usize, b: usize) -> (&mut Individual<G>, &mut Individual<G>) {
        debug_assert_ne!(a, b);
        if a < b {
            let (lo, hi) = self.members.split_at_mut(b);
            (&mut lo[a], &mut hi[0])
        } else {
            let (lo, hi) = self.members.split_at_mut(a);
            (&mut hi[0], &mut lo[b])
        }
    }

    pub fn evaluations(&self) -> Vec<f64> {
        self.members().iter().map(|m| m.evaluation).collect()
    }

    pub fn fitness_values(&self) -> Vec<f64> {
        self.members().iter().map(|m| m.fitness).collect()
    }

    /// Indices of members whose evaluation is stale.
    pub fn pending(&self) -> Vec<usize> {
        (0..self.size)
            .filter(|&i| !self.members[i].evaluation_current)
            .collect()
    }

    fn require_current(&self, operation: &str) -> Result<()> {
        if let Some(i) = self.members().iter().position(|m| !m.evaluation_current) {
            return Err(GeneticError::FitnessCalculation(format!(
                "{}: evaluation of individual {} is not up to date",
                operation, i
            )));
        }
        Ok(())
    }

    /// Index of the best member by evaluation for the given direction.
    ///
    /// Fails if any member's evaluation is stale.
    pub fn best_index(&self, direction: Direction) -> Result<usize> {
        self.require_current("best_index")?;
        self.extreme(|a, b| direction.is_better(a, b))
    }

    /// Index of the worst member by evaluation for the given direction.
    pub fn worst_index(&self, direction: Direction) -> Result<usize> {
        self.require_current("worst_index")?;
        self.extreme(|a, b| direction.is_better(b, a))
    }

    fn extreme(&self, prefer: impl Fn(f64, f64) -> bool) -> Result<usize> {
        if self.size == 0 {
            return Err(GeneticError::EmptyPopulation);
        }
        let mut best = 0;
        for i in 1..self.size {
            if prefer(self.members[i].evaluation, self.members[best].evaluation) {
                best = i;
            }
        }
        Ok(best)
    }

    /// Member indices ordered by fitness, highest first. Ties keep index order.
    pub fn sorted_by_fitness(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.size).collect();
        order.sort_by(|&a, &b| {
            self.members[b]
                .fitness
                .partial_cmp(&self.members[a].fitness)
                .unwrap_or(Ordering::Equal)
        });
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population(evals: &[f64]) -> Population<u32> {
        let mut pop = Population::new(evals.len(), |i| i as u32);
        for (m, &e) in pop.members_mut().iter_mut().zip(evals) {
            m.set_evaluation(e);
        }
        pop
    }

    #[test]
    fn test_scratch_slots() {
        let pop = Population::new(4, |_| 0u8);
        assert_eq!(pop.size(), 4);
        assert_eq!(pop.slots().len(), 6);
        assert_eq!(pop.temp1(), 4);
        assert_eq!(pop.temp2(), 5);
        assert!(pop.get(5).is_ok());
        assert!(matches!(pop.get(6), Err(GeneticError::OutOfBounds(_))));
    }

    #[test]
    fn test_new_individual_is_stale() {
        let pop = Population::new(2, |_| 0u8);
        assert_eq!(pop.pending(), vec![0, 1]);
        assert!(pop.members().iter().all(|m| m.evaluation() == 0.0 && m.fitness() == 0.0));
    }

    #[test]
    fn test_genome_mut_marks_stale() {
        let mut ind = Individual::new(vec![1, 2]);
        ind.set_evaluation(3.0);
        assert!(ind.is_evaluation_current());
        ind.genome_mut()[0] = 5;
        assert!(!ind.is_evaluation_current());
    }

    #[test]
    fn test_best_and_worst() {
        let pop = population(&[3.0, -1.0, 7.0, 7.0, 0.5]);
        assert_eq!(pop.best_index(Direction::Maximize).unwrap(), 2);
        assert_eq!(pop.worst_index(Direction::Maximize).unwrap(), 1);
        assert_eq!(pop.best_index(Direction::Minimize).unwrap(), 1);
        assert_eq!(pop.worst_index(Direction::Minimize).unwrap(), 2);
    }

    #[test]
    fn test_best_requires_current_evaluations() {
        let mut pop = population(&[1.0, 2.0]);
        pop.get_mut(1).unwrap().genome_mut();
        assert!(matches!(
            pop.best_index(Direction::Maximize),
            Err(GeneticError::FitnessCalculation(_))
        ));
    }

    #[test]
    fn test_copy_between_buffers() {
        let src = population(&[4.0, 5.0]);
        let mut dst = Population::new(2, |_| 99u32);
        dst.copy_from(0, &src, 1, |s, d| d.clone_from(s));
        assert_eq!(dst.get(0).unwrap(), src.get(1).unwrap());
        dst.copy_from(0, &src, 1, |s, d| d.clone_from(s));
        assert_eq!(dst.get(0).unwrap(), src.get(1).unwrap());
    }

    #[test]
    fn test_copy_within_both_directions() {
        let mut pop = population(&[1.0, 2.0, 3.0]);
        pop.copy_within(0, 2, |s, d| d.clone_from(s));
        assert_eq!(pop.get(2).unwrap(), pop.get(0).unwrap());
        pop.copy_within(1, 0, |s, d| d.clone_from(s));
        assert_eq!(pop.get(0).unwrap().evaluation(), 2.0);
        pop.copy_within(1, 1, |_, _| panic!("self copy"));
    }

    #[test]
    fn test_sorted_by_fitness() {
        let mut pop = population(&[0.0; 4]);
        for (m, f) in pop.members_mut().iter_mut().zip([0.2, 0.9, 0.2, 0.5]) {
            m.fitness = f;
        }
        assert_eq!(pop.sorted_by_fitness(), vec![1, 3, 0, 2]);
    }

    #[test]
    fn test_pair_mut() {
        let mut pop = Population::new(3, |i| i as u32);
        let (a, b) = pop.pair_mut(3, 1);
        assert_eq!((*a.genome(), *b.genome()), (3, 1));
    }
}
