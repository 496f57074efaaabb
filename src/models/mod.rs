pub mod valuation;
pub mod dilution;
pub mod path;

/// Source of uniform draws in [0, 1) feeding the normal sampler.
/// Production wraps a `rand` generator; tests inject a fixed sequence.
pub trait UniformSource {
    fn next_uniform(&mut self) -> f64;
}

/// Adapter from any `rand::Rng` to `UniformSource`.
#[derive(Debug, Clone)]
pub struct RngSource<R>(pub R);

impl<R: rand::Rng> UniformSource for RngSource<R> {
    #[inline]
    fn next_uniform(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}
