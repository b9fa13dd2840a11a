#![allow(non_snake_case)]
// Small dense kernels on column major matrices stored in plain
// slices.  Used by the PSD projection and the PSD completion of
// decomposed duals.

use crate::algebra::*;

// unpack a scaled triangle into a full symmetric column major matrix
pub(crate) fn svec_to_mat<T: FloatT>(M: &mut [T], x: &[T], n: usize) {
    let isqrt2 = T::FRAC_1_SQRT_2();
    let mut idx = 0;
    for col in 0..n {
        for row in 0..=col {
            let v = if row == col { x[idx] } else { x[idx] * isqrt2 };
            M[col * n + row] = v;
            M[row * n + col] = v;
            idx += 1;
        }
    }
}

// Cyclic Jacobi eigendecomposition of the symmetric matrix X.  On
// return the diagonal of X holds the eigenvalues and the columns of Z
// the corresponding eigenvectors.  Follows the rotation scheme of the
// totsu solver's projection.
pub(crate) fn jacobi_eig<T: FloatT>(X: &mut [T], Z: &mut [T], n: usize) {
    const MAX_SWEEPS: usize = 100;

    let tol = T::epsilon() * T::epsilon();
    let two: T = (2.).as_T();

    Z.fill(T::zero());
    for i in 0..n {
        Z[i * n + i] = T::one();
    }

    for _ in 0..MAX_SWEEPS {
        let mut converged = true;

        for i in 0..n {
            for j in (i + 1)..n {
                let a = X[i * n + i];
                let b = X[j * n + j];
                let d = X[j * n + i];

                if !(d * d > tol * a * b && d * d > tol) {
                    continue;
                }
                converged = false;

                let zeta = (b - a) / (two * d);
                let t = if zeta > T::zero() {
                    T::one() / (zeta + T::sqrt(T::one() + zeta * zeta))
                } else {
                    -T::one() / (-zeta + T::sqrt(T::one() + zeta * zeta))
                };
                let c = T::recip(T::sqrt(T::one() + t * t));
                let s = c * t;

                // X ← Jᵀ X J, applied as column then row rotations
                for k in 0..n {
                    let xi = X[i * n + k];
                    let xj = X[j * n + k];
                    X[i * n + k] = c * xi - s * xj;
                    X[j * n + k] = s * xi + c * xj;
                }
                for k in 0..n {
                    let xi = X[k * n + i];
                    let xj = X[k * n + j];
                    X[k * n + i] = c * xi - s * xj;
                    X[k * n + j] = s * xi + c * xj;

                    let zi = Z[i * n + k];
                    let zj = Z[j * n + k];
                    Z[i * n + k] = c * zi - s * zj;
                    Z[j * n + k] = s * zi + c * zj;
                }
                X[i * n + i] = c * c * a + s * s * b - two * c * s * d;
                X[j * n + j] = s * s * a + c * c * b + two * c * s * d;
                X[j * n + i] = T::zero();
                X[i * n + j] = T::zero();
            }
        }

        if converged {
            break;
        }
    }
}

// pack a full symmetric column major matrix into a scaled triangle
pub(crate) fn mat_to_svec<T: FloatT>(x: &mut [T], M: &[T], n: usize) {
    let sqrt2 = T::SQRT_2();
    let mut idx = 0;
    for col in 0..n {
        for row in 0..=col {
            let v = M[col * n + row];
            x[idx] = if row == col { v } else { v * sqrt2 };
            idx += 1;
        }
    }
}

// B ← A⁺B for a symmetric k×k matrix A and a k×c matrix B.  Eigenvalues
// below a relative tolerance are treated as zero.  A is overwritten.
pub(crate) fn sym_pinv_solve<T: FloatT>(A: &mut [T], B: &mut [T], k: usize, c: usize) {
    if k == 0 {
        return;
    }
    let mut Z = vec![T::zero(); k * k];
    jacobi_eig(A, &mut Z, k);

    let λmax = (0..k).fold(T::zero(), |acc, i| T::max(acc, A[i * k + i].abs()));
    let tol = λmax * T::epsilon() * k.as_T();

    // C = diag(1/λ) Zᵀ B
    let mut C = vec![T::zero(); k * c];
    for j in 0..c {
        let bj = &B[j * k..(j + 1) * k];
        for i in 0..k {
            let λ = A[i * k + i];
            if λ.abs() > tol {
                C[j * k + i] = Z[i * k..(i + 1) * k].dot(bj) / λ;
            }
        }
    }

    // B = Z C
    for j in 0..c {
        let bj = &mut B[j * k..(j + 1) * k];
        bj.fill(T::zero());
        for i in 0..k {
            bj.axpby(C[j * k + i], &Z[i * k..(i + 1) * k], T::one());
        }
    }
}
