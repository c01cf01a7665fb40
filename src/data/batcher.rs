// ============================================================
// Layer 4 - Compounding Batch Scheduler
// ============================================================
// Cuts the training set into minibatches whose size GROWS
// across the epoch:
//
//   target_0 = start
//   target_k = min(target_{k-1} * growth, end)
//
// With the defaults (4.0, 32.0, 1.001) the first batches hold
// 4 examples and the size creeps upwards until it is capped
// at 32. Small early batches give many cheap updates while the
// model is far from a solution; larger later batches give
// steadier gradients.
//
// Each batch takes floor(target) examples (at least 1). The
// last batch takes whatever remains, so:
//   - every example appears in exactly one batch per epoch
//   - no example is dropped or duplicated
//   - all batches but the last equal their floored target
//
// The scheduler re-shuffles the whole training set before
// slicing, once per epoch. The batches are yielded lazily as
// borrowed slices; the iterator is finite and cannot restart.
//
// Reference: Smith et al. (2018) "Don't Decay the Learning Rate,
//            Increase the Batch Size"
//            Rust Book §13 (Iterators)

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::domain::error::IntentError;

// ─── BatchSchedule ────────────────────────────────────────────────────────────
/// Parameters of the compounding batch-size sequence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchSchedule {
    pub start:  f64,
    pub end:    f64,
    pub growth: f64,
}

impl Default for BatchSchedule {
    fn default() -> Self {
        Self { start: 4.0, end: 32.0, growth: 1.001 }
    }
}

impl BatchSchedule {
    pub fn validate(&self) -> Result<(), IntentError> {
        if !(self.start >= 1.0 && self.start <= self.end) {
            return Err(IntentError::InvalidConfig(format!(
                "batch schedule needs 1 <= start <= end, got start={} end={}",
                self.start, self.end
            )));
        }
        if !(self.growth >= 1.0 && self.growth.is_finite()) {
            return Err(IntentError::InvalidConfig(format!(
                "batch growth must be a finite factor >= 1, got {}",
                self.growth
            )));
        }
        Ok(())
    }

    /// The infinite sequence of target sizes.
    pub fn sizes(&self) -> Compounding {
        Compounding { phase: Phase::Growing(self.start), end: self.end, growth: self.growth }
    }
}

// ─── Compounding ──────────────────────────────────────────────────────────────
// Two-state machine: Growing until the target reaches `end`,
// then Capped forever.
#[derive(Debug, Clone, Copy)]
enum Phase {
    Growing(f64),
    Capped,
}

#[derive(Debug, Clone)]
pub struct Compounding {
    phase:  Phase,
    end:    f64,
    growth: f64,
}

impl Iterator for Compounding {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        match self.phase {
            Phase::Growing(target) if target < self.end => {
                self.phase = Phase::Growing(target * self.growth);
                Some(target)
            }
            _ => {
                self.phase = Phase::Capped;
                Some(self.end)
            }
        }
    }
}

// ─── Minibatches ──────────────────────────────────────────────────────────────
/// Lazy iterator over one epoch's batches.
pub struct Minibatches<'a, T> {
    remaining: &'a [T],
    sizes:     Compounding,
}

impl<'a, T> Minibatches<'a, T> {
    pub fn new(items: &'a [T], schedule: &BatchSchedule) -> Self {
        Self { remaining: items, sizes: schedule.sizes() }
    }
}

impl<'a, T> Iterator for Minibatches<'a, T> {
    type Item = &'a [T];

    fn next(&mut self) -> Option<&'a [T]> {
        if self.remaining.is_empty() {
            return None;
        }
        let target = self.sizes.next().unwrap_or(1.0);
        let size   = (target.floor() as usize).max(1).min(self.remaining.len());

        let (batch, rest) = self.remaining.split_at(size);
        self.remaining = rest;
        Some(batch)
    }
}

// ─── BatchScheduler ───────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    schedule: BatchSchedule,
}

impl BatchScheduler {
    pub fn new(schedule: BatchSchedule) -> Self {
        Self { schedule }
    }

    /// Shuffle the full training set in place, then hand out
    /// this epoch's batches.
    pub fn epoch<'a, T, R: Rng + ?Sized>(
        &self,
        examples: &'a mut [T],
        rng:      &mut R,
    ) -> Minibatches<'a, T> {
        examples.shuffle(rng);
        let examples: &'a [T] = examples;
        Minibatches::new(examples, &self.schedule)
    }
}
