/// Square count table: rows are true classes, columns predicted classes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    n: usize,
    counts: Vec<u64>,
}

impl ConfusionMatrix {
    pub fn new(num_classes: usize) -> Self {
        Self {
            n: num_classes,
            counts: vec![0; num_classes * num_classes],
        }
    }

    #[inline]
    pub fn num_classes(&self) -> usize {
        self.n
    }

    /// Widens the table to `num_classes`, keeping existing counts.
    pub fn grow(&mut self, num_classes: usize) {
        if num_classes <= self.n {
            return;
        }
        let mut counts = vec![0; num_classes * num_classes];
        for t in 0..self.n {
            for p in 0..self.n {
                counts[t * num_classes + p] = self.counts[t * self.n + p];
            }
        }
        self.n = num_classes;
        self.counts = counts;
    }

    pub fn add(&mut self, true_class: usize, predicted_class: usize) {
        self.grow(true_class.max(predicted_class) + 1);
        self.counts[true_class * self.n + predicted_class] += 1;
    }

    pub fn count(&self, true_class: usize, predicted_class: usize) -> u64 {
        if true_class >= self.n || predicted_class >= self.n {
            return 0;
        }
        self.counts[true_class * self.n + predicted_class]
    }

    pub fn row(&self, true_class: usize) -> &[u64] {
        &self.counts[true_class * self.n..(true_class + 1) * self.n]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u64]> {
        (0..self.n).map(|t| self.row(t))
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn correct(&self) -> u64 {
        (0..self.n).map(|c| self.count(c, c)).sum()
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            f64::NAN
        } else {
            self.correct() as f64 / total as f64
        }
    }
}
