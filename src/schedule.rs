//! Step series for the benchmark loop
//!
//! Benchmark lengths are `min(s₀ + k·stride, L)` for `k = 0, 1, …`, stopping
//! right after the first length equal to `L`. The first point is always run,
//! so a source shorter than the initial step still yields one point at `L`.

use crate::error::{BenchError, Result};

/// Default first step, in nucleotides
pub const DEFAULT_INITIAL_STEP: usize = 100;

/// Default increment between steps, in nucleotides
pub const DEFAULT_STRIDE: usize = 50;

/// Parameters of a step series over a source of fixed length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSchedule {
    initial_step: usize,
    stride: usize,
    total_len: usize,
}

impl StepSchedule {
    /// Build a schedule, rejecting zero steps, strides or lengths
    pub fn new(initial_step: usize, stride: usize, total_len: usize) -> Result<Self> {
        if initial_step == 0 {
            return Err(BenchError::invalid_schedule("initial step must be at least 1"));
        }
        if stride == 0 {
            return Err(BenchError::invalid_schedule("stride must be at least 1"));
        }
        if total_len == 0 {
            return Err(BenchError::invalid_schedule("source sequence is empty"));
        }
        Ok(Self {
            initial_step,
            stride,
            total_len,
        })
    }

    pub fn initial_step(&self) -> usize {
        self.initial_step
    }

    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn total_len(&self) -> usize {
        self.total_len
    }

    /// Number of benchmark points the series visits
    pub fn point_count(&self) -> usize {
        if self.initial_step >= self.total_len {
            1
        } else {
            // steps strictly below L, plus the final capped point
            (self.total_len - self.initial_step).div_ceil(self.stride) + 1
        }
    }

    /// Iterate over the sub-sequence lengths in order
    pub fn lengths(&self) -> StepLengths {
        StepLengths {
            step: self.initial_step,
            stride: self.stride,
            total_len: self.total_len,
            done: false,
        }
    }
}

impl IntoIterator for StepSchedule {
    type Item = usize;
    type IntoIter = StepLengths;

    fn into_iter(self) -> StepLengths {
        self.lengths()
    }
}

/// Iterator over benchmark lengths, see [`StepSchedule`]
#[derive(Debug, Clone)]
pub struct StepLengths {
    step: usize,
    stride: usize,
    total_len: usize,
    done: bool,
}

impl Iterator for StepLengths {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.done {
            return None;
        }
        let length = self.step.min(self.total_len);
        if length == self.total_len {
            self.done = true;
        } else {
            self.step = self.step.saturating_add(self.stride);
        }
        Some(length)
    }
}
