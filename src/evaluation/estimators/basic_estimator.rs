use crate::evaluation::estimators::Estimator;

/// Running mean over the accepted observations.
#[derive(Debug, Default, Clone, Copy)]
pub struct BasicEstimator {
    count: u64,
    sum: f64,
}

impl Estimator for BasicEstimator {
    #[inline]
    fn add(&mut self, v: f64) {
        if v.is_nan() {
            return;
        }
        self.count += 1;
        self.sum += v;
    }

    #[inline]
    fn estimation(&self) -> f64 {
        if self.count > 0 {
            self.sum / self.count as f64
        } else {
            f64::NAN
        }
    }

    #[inline]
    fn count(&self) -> u64 {
        self.count
    }
}
