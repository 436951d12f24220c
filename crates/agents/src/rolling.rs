//! Fixed-size rolling window over recent values.
//!
//! Holds the per-token step-close prices the trend policy compares against.

use std::collections::VecDeque;

/// The most recent `capacity` values.
///
/// # Example
/// ```
/// use agents::RollingWindow;
///
/// let mut window = RollingWindow::new(3);
/// window.push(1.0);
/// window.push(2.0);
/// window.push(3.0);
/// assert_eq!(window.mean(), Some(2.0));
///
/// window.push(4.0); // evicts 1.0
/// assert_eq!(window.mean(), Some(3.0));
/// ```
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// Create a window holding up to `capacity` values. A capacity of zero
    /// is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, returning the evicted one when the window was full.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        let evicted = if self.values.len() == self.capacity {
            self.values.pop_front()
        } else {
            None
        };
        self.values.push_back(value);
        evicted
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Mean of the stored values, `None` while empty.
    /// Recomputed on every call, so values of wildly different magnitude
    /// never leave residue behind after eviction.
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            None
        } else {
            Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
        }
    }

    /// Most recent value.
    #[inline]
    pub fn last(&self) -> Option<f64> {
        self.values.back().copied()
    }

    /// Values from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
