/// Incremental scalar estimator.
///
/// Values arrive one at a time through [`Estimator::add`]; `NaN` marks an
/// observation that does not apply and must be ignored.
pub trait Estimator {
    fn add(&mut self, v: f64);

    /// Current estimate, `NaN` before any observation.
    fn estimation(&self) -> f64;

    /// Number of observations taken into account.
    fn count(&self) -> u64;
}
