//! Fixed-capacity ring buffer for rolling step statistics

use std::time::Duration;

#[derive(Debug)]
pub struct RingBuffer<T> {
    samples: Vec<T>,
    capacity: usize,
    index: usize,
}

impl<T> RingBuffer<T> {
    /// A capacity of zero is bumped to one so `push` always has a slot.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            index: 0,
        }
    }

    pub fn push(&mut self, sample: T) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.index] = sample;
        }
        self.index = (self.index + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl RingBuffer<Duration> {
    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }

        let sum: Duration = self.samples.iter().sum();
        sum / self.samples.len() as u32
    }

    pub fn min_max(&self) -> (Duration, Duration) {
        let min = self.samples.iter().min().copied().unwrap_or(Duration::ZERO);
        let max = self.samples.iter().max().copied().unwrap_or(Duration::ZERO);
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_window_rolls_over() {
        let mut buffer = RingBuffer::new(3);

        buffer.push(Duration::from_millis(2));
        buffer.push(Duration::from_millis(4));
        assert_eq!(buffer.average(), Duration::from_millis(3));

        buffer.push(Duration::from_millis(6));
        buffer.push(Duration::from_millis(8));
        // Oldest sample (2ms) has been overwritten
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.average(), Duration::from_millis(6));
        assert_eq!(
            buffer.min_max(),
            (Duration::from_millis(4), Duration::from_millis(8))
        );
    }

    #[test]
    fn test_empty_buffer_reports_zero() {
        let buffer = RingBuffer::<Duration>::new(0);
        assert!(buffer.is_empty());
        assert_eq!(buffer.average(), Duration::ZERO);
        assert_eq!(buffer.min_max(), (Duration::ZERO, Duration::ZERO));
    }
}
