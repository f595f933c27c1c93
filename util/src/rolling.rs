//! Fixed-capacity rolling-mean filter
//!
//! A [`RollingWindow`] is a bounded FIFO over a scalar signal. Pushing past
//! capacity evicts the oldest sample, and the window exposes the arithmetic
//! mean of its current contents. There is no weighting and no outlier
//! rejection, this is a straight moving average used to smooth noisy sensor
//! streams before they are fed into a regulator.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;
use std::collections::VecDeque;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A bounded window over a scalar signal exposing the rolling mean.
#[derive(Debug, Clone)]
pub struct RollingWindow<T: Float> {
    /// Samples currently in the window, oldest at the front.
    samples: VecDeque<T>,

    /// Maximum number of samples held at once.
    capacity: usize,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<T: Float> RollingWindow<T> {
    /// Create a new empty window with the given capacity.
    ///
    /// # Panics
    /// - Panics if `capacity` is zero, a zero-capacity window could never
    ///   produce a mean.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "RollingWindow capacity must be non-zero");

        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a new sample into the window, evicting the oldest sample if the
    /// window is at capacity.
    pub fn push(&mut self, sample: T) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }

        self.samples.push_back(sample);
    }

    /// Get the arithmetic mean of the current contents, or `None` if the
    /// window is empty.
    pub fn mean(&self) -> Option<T> {
        if self.samples.is_empty() {
            return None;
        }

        let sum = self
            .samples
            .iter()
            .fold(T::zero(), |acc, &s| acc + s);

        // Length is non-zero so the conversion and division are safe
        Some(sum / T::from(self.samples.len())?)
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_empty_window_has_no_mean() {
        let window: RollingWindow<f64> = RollingWindow::new(5);

        assert!(window.is_empty());
        assert_eq!(window.mean(), None);
    }

    #[test]
    fn test_mean_matches_contents() {
        let mut window = RollingWindow::new(5);

        window.push(1.0);
        assert_eq!(window.mean(), Some(1.0));

        window.push(2.0);
        window.push(3.0);
        assert_eq!(window.mean(), Some(2.0));
    }

    #[test]
    fn test_capacity_never_exceeded() {
        let mut window = RollingWindow::new(5);

        for i in 0..20 {
            window.push(i as f64);
            assert!(window.len() <= 5);
        }
    }

    #[test]
    fn test_oldest_first_eviction() {
        let mut window = RollingWindow::new(5);

        // Six distinct values, the first must be evicted
        for v in &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0] {
            window.push(*v);
        }

        assert_eq!(window.len(), 5);

        // Mean of {2, 3, 4, 5, 6}
        assert_eq!(window.mean(), Some(4.0));
    }

    #[test]
    #[should_panic]
    fn test_zero_capacity_panics() {
        let _: RollingWindow<f64> = RollingWindow::new(0);
    }
}
