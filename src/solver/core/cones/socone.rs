use super::{rectify_to_mean, Cone};
use crate::algebra::*;
use core::marker::PhantomData;

// -------------------------------------
// Second Order Cone
// -------------------------------------

/// The second order cone { (t,x) : ‖x‖ ≤ t }
#[derive(Debug, Clone)]
pub struct SecondOrderCone<T: FloatT = f64> {
    dim: usize,
    phantom: PhantomData<T>,
}

impl<T> SecondOrderCone<T>
where
    T: FloatT,
{
    pub fn new(dim: usize) -> Self {
        assert!(dim >= 1);
        Self {
            dim,
            phantom: PhantomData,
        }
    }
}

impl<T> Cone<T> for SecondOrderCone<T>
where
    T: FloatT,
{
    fn dim(&self) -> usize {
        self.dim
    }

    fn is_elementwise(&self) -> bool {
        false
    }

    fn rectify_equilibration(&self, δ: &mut [T], e: &[T]) -> bool {
        rectify_to_mean(δ, e)
    }

    fn project(&mut self, x: &mut [T]) {
        let (t, v) = x.split_at_mut(1);
        let t0 = t[0];
        let nv = v.norm();

        if nv <= t0 {
            // already in the cone
        } else if nv <= -t0 {
            // in the polar cone
            t[0] = T::zero();
            v.fill(T::zero());
        } else {
            let two: T = (2.).as_T();
            let a = (t0 + nv) / two;
            t[0] = a;
            v.scale(a / nv);
        }
    }
}
