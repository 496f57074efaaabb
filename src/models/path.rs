use crate::errors::{EngineError, EngineResult};
use crate::models::UniformSource;
use std::f64::consts::PI;

/// Floor on the first Box-Muller uniform so ln(U1) stays finite.
const MIN_UNIFORM: f64 = 1e-15;

/// Standard normal draw via Box-Muller: Z = sqrt(-2 ln U1) * cos(2 pi U2).
/// Consumes exactly two uniforms.
#[inline]
pub fn standard_normal<U: UniformSource + ?Sized>(source: &mut U) -> f64 {
    let u1 = source.next_uniform().max(MIN_UNIFORM);
    let u2 = source.next_uniform();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Discretized geometric Brownian motion over a unit horizon.
///
/// S_{t+dt} = S_t * exp((mu - sigma^2/2) * dt + sigma * sqrt(dt) * Z)
///
/// with dt = 1 / num_steps. Per-step constants are precomputed once so the
/// hot loop is one normal draw, one multiply-add and one exp.
#[derive(Debug, Clone, Copy)]
pub struct PathSimulator {
    start_price: f64,
    num_steps: usize,
    drift_dt: f64,
    vol_sqrt_dt: f64,
}

impl PathSimulator {
    /// Rejects inputs that would produce NaN or infinite paths.
    pub fn new(start_price: f64, drift: f64, sigma: f64, num_steps: usize) -> EngineResult<Self> {
        if !start_price.is_finite() || start_price <= 0.0 {
            return Err(EngineError::Validation(format!(
                "start price must be positive and finite, got {start_price}"
            )));
        }
        if num_steps == 0 {
            return Err(EngineError::Validation("step count must be positive".into()));
        }
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(EngineError::Validation(format!(
                "volatility must be non-negative and finite, got {sigma}"
            )));
        }
        if !drift.is_finite() {
            return Err(EngineError::Validation(format!("drift must be finite, got {drift}")));
        }

        let dt = 1.0 / num_steps as f64;
        Ok(Self {
            start_price,
            num_steps,
            drift_dt: (drift - 0.5 * sigma * sigma) * dt,
            vol_sqrt_dt: sigma * dt.sqrt(),
        })
    }

    #[inline]
    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    #[inline]
    fn step<U: UniformSource + ?Sized>(&self, price: f64, source: &mut U) -> f64 {
        let z = standard_normal(source);
        price * (self.drift_dt + self.vol_sqrt_dt * z).exp()
    }

    /// Full trajectory: num_steps + 1 prices, the first being the start price.
    pub fn path<U: UniformSource + ?Sized>(&self, source: &mut U) -> Vec<f64> {
        let mut path = Vec::with_capacity(self.num_steps + 1);
        let mut price = self.start_price;
        path.push(price);
        for _ in 0..self.num_steps {
            price = self.step(price, source);
            path.push(price);
        }
        path
    }

    /// Terminal price only. Consumes the same draws as `path`, without allocating.
    pub fn terminal<U: UniformSource + ?Sized>(&self, source: &mut U) -> f64 {
        let mut price = self.start_price;
        for _ in 0..self.num_steps {
            price = self.step(price, source);
        }
        price
    }
}

/// One stochastic price trajectory of length `num_steps + 1`.
pub fn simulate_path<U: UniformSource + ?Sized>(
    start_price: f64,
    drift: f64,
    sigma: f64,
    num_steps: usize,
    source: &mut U,
) -> EngineResult<Vec<f64>> {
    Ok(PathSimulator::new(start_price, drift, sigma, num_steps)?.path(source))
}
