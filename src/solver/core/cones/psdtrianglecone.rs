#![allow(non_snake_case)]
use super::{rectify_to_mean, Cone};
use crate::algebra::{scalarmath::triangular_number, *};

// ------------------------------------
// Positive Semidefinite Cone (Scaled triangular form)
// ------------------------------------
//
// An n×n symmetric matrix X is represented by its upper triangle,
// packed columnwise, with off-diagonal entries scaled by √2 so that
// inner products of packed vectors match the trace inner product.

#[derive(Debug, Clone)]
struct PSDConeData<T> {
    // dense copy of the matrix, overwritten by the eigenvalues
    X: Vec<T>,
    // eigenvectors, columnwise
    Z: Vec<T>,
}

/// The cone of positive semidefinite matrices in packed triangular form
#[derive(Debug, Clone)]
pub struct PSDTriangleCone<T> {
    n: usize,
    numel: usize,
    data: Box<PSDConeData<T>>, // Boxed so that the PSDCone enum_dispatch variant isn't huge
}

impl<T> PSDTriangleCone<T>
where
    T: FloatT,
{
    pub fn new(n: usize) -> Self {
        Self {
            n,
            numel: triangular_number(n),
            data: Box::new(PSDConeData {
                X: vec![T::zero(); n * n],
                Z: vec![T::zero(); n * n],
            }),
        }
    }

    /// side dimension of the matrix
    pub fn side(&self) -> usize {
        self.n
    }
}

impl<T> Cone<T> for PSDTriangleCone<T>
where
    T: FloatT,
{
    fn dim(&self) -> usize {
        self.numel
    }

    fn is_elementwise(&self) -> bool {
        false
    }

    fn rectify_equilibration(&self, δ: &mut [T], e: &[T]) -> bool {
        rectify_to_mean(δ, e)
    }

    fn project(&mut self, x: &mut [T]) {
        let n = self.n;
        if n == 0 {
            return;
        }
        let data = &mut *self.data;
        svec_to_mat(&mut data.X, x, n);
        jacobi_eig(&mut data.X, &mut data.Z, n);

        // X = Σ max(λᵢ,0) zᵢzᵢᵀ, accumulated straight into the packed vector
        x.fill(T::zero());
        let sqrt2 = T::SQRT_2();
        for k in 0..n {
            let λ = data.X[k * n + k];
            if λ <= T::zero() {
                continue;
            }
            let z = &data.Z[k * n..(k + 1) * n];
            let mut idx = 0;
            for col in 0..n {
                for row in 0..=col {
                    let v = λ * z[row] * z[col];
                    x[idx] += if row == col { v } else { v * sqrt2 };
                    idx += 1;
                }
            }
        }
    }
}
