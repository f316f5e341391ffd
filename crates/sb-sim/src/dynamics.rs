//! Transient model trait and fixed-step integration.

use crate::error::SimResult;

/// A dynamic system `x' = f(t, x)`.
///
/// The derivative is expressed in the state type itself, so the integrator
/// only needs element-wise addition and scaling.
pub trait TransientModel {
    type State: Clone;

    fn initial_state(&self) -> Self::State;

    /// State derivative at `(t, x)`.
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}

pub trait Integrator {
    /// Advance `x` from `t` to `t + dt`.
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Explicit first-order Euler. Exact for the piecewise-linear flows of the
/// boiler as long as inputs only change between steps.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &mut M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x' = -x
    struct Decay;

    impl TransientModel for Decay {
        type State = f64;

        fn initial_state(&self) -> f64 {
            1.0
        }

        fn rhs(&mut self, _t: f64, x: &f64) -> SimResult<f64> {
            Ok(-x)
        }

        fn add(&self, a: &f64, b: &f64) -> f64 {
            a + b
        }

        fn scale(&self, a: &f64, s: f64) -> f64 {
            a * s
        }
    }

    #[test]
    fn euler_decay_converges() {
        let mut m = Decay;
        let mut x = m.initial_state();
        let dt = 1e-3;
        for i in 0..1000 {
            x = ForwardEuler.step(&mut m, i as f64 * dt, &x, dt).unwrap();
        }
        assert!((x - (-1.0_f64).exp()).abs() < 1e-3);
    }
}
