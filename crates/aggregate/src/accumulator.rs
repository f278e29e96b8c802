/// Running sum and sample count behind one bucket's average.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Accumulator {
    sum: f64,
    count: u64,
}

impl Accumulator {
    pub fn from_parts(sum: f64, count: u64) -> Self {
        Self { sum, count }
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn merge(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    pub fn absorb(&mut self, other: &Accumulator) {
        self.sum += other.sum;
        self.count += other.count;
    }

    /// `None` until at least one value has been merged.
    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.sum / self.count as f64)
    }
}
