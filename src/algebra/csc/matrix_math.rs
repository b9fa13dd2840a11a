#![allow(non_snake_case)]
use crate::algebra::*;
use std::iter::zip;

impl<T: FloatT> MatrixVectorMultiply for CscMatrix<T> {
    type T = T;

    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        csc_axpby_N(self, y, x, a, b);
    }
}

impl<T: FloatT> MatrixVectorMultiply for Adjoint<'_, CscMatrix<T>> {
    type T = T;

    fn gemv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        csc_axpby_T(self.src, y, x, a, b);
    }
}

impl<T: FloatT> SymMatrixVectorMultiply for Symmetric<'_, CscMatrix<T>> {
    type T = T;

    fn symv(&self, y: &mut [T], x: &[T], a: T, b: T) {
        csc_symv(self.src, y, x, a, b);
    }
}

impl<T: FloatT> MatrixMath for CscMatrix<T> {
    type T = T;

    fn scale(&mut self, c: T) {
        self.nzval.scale(c);
    }

    fn negate(&mut self) {
        self.nzval.negate();
    }

    fn col_norms(&self, norms: &mut [T]) {
        norms.fill(T::zero());
        self.col_norms_no_reset(norms);
    }

    fn col_norms_no_reset(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.n);

        for (i, v) in norms.iter_mut().enumerate() {
            let rng = self.colptr[i]..self.colptr[i + 1];
            *v = self.nzval[rng]
                .iter()
                .fold(*v, |m, &nzval| T::max(m, T::abs(nzval)));
        }
    }

    fn col_norms_sym(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.n);
        norms.fill(T::zero());

        for col in 0..self.n {
            for j in self.colptr[col]..self.colptr[col + 1] {
                let tmp = T::abs(self.nzval[j]);
                let row = self.rowval[j];
                norms[col] = T::max(norms[col], tmp);
                norms[row] = T::max(norms[row], tmp);
            }
        }
    }

    fn row_norms(&self, norms: &mut [T]) {
        norms.fill(T::zero());
        self.row_norms_no_reset(norms);
    }

    fn row_norms_no_reset(&self, norms: &mut [T]) {
        assert_eq!(norms.len(), self.m);

        for (&row, &val) in zip(&self.rowval, &self.nzval) {
            norms[row] = T::max(norms[row], T::abs(val));
        }
    }

    fn row_sums(&self, sums: &mut [T]) {
        assert_eq!(sums.len(), self.m);
        sums.fill(T::zero());

        for (&row, &val) in zip(&self.rowval, &self.nzval) {
            sums[row] += val;
        }
    }

    fn lscale(&mut self, l: &[T]) {
        for (val, row) in zip(&mut self.nzval, &self.rowval) {
            *val *= l[*row];
        }
    }

    fn lrscale(&mut self, l: &[T], r: &[T]) {
        assert_eq!(r.len(), self.n);

        for (col, &ri) in r.iter().enumerate() {
            let (first, last) = (self.colptr[col], self.colptr[col + 1]);
            let vals = &mut self.nzval[first..last];
            let rows = &self.rowval[first..last];

            for (val, row) in zip(vals, rows) {
                *val *= l[*row] * ri;
            }
        }
    }

    fn quad_form(&self, y: &[T], x: &[T]) -> T {
        csc_quad_form(self, y, x)
    }
}

// y = a*A*x + b*y, with A holding only its upper triangle
fn csc_symv<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    assert!(A.is_square());
    assert_eq!(x.len(), A.n);
    assert_eq!(y.len(), A.n);

    scale_by_b(y, b);

    for (col, &xcol) in x.iter().enumerate() {
        let rng = A.colptr[col]..A.colptr[col + 1];

        for (&row, &Aij) in zip(&A.rowval[rng.clone()], &A.nzval[rng]) {
            y[row] += a * Aij * xcol;

            if row != col {
                //don't double up on the diagonal
                y[col] += a * Aij * x[row];
            }
        }
    }
}

#[allow(clippy::comparison_chain)]
fn csc_quad_form<T: FloatT>(M: &CscMatrix<T>, y: &[T], x: &[T]) -> T {
    assert!(M.is_square());
    assert_eq!(x.len(), M.n);
    assert_eq!(y.len(), M.n);

    let mut out = T::zero();

    for col in 0..M.n {
        let mut tmp1 = T::zero();
        let mut tmp2 = T::zero();

        let rng = M.colptr[col]..M.colptr[col + 1];

        for (&Mv, &row) in zip(&M.nzval[rng.clone()], &M.rowval[rng]) {
            if row < col {
                //triu terms only
                tmp1 += Mv * x[row];
                tmp2 += Mv * y[row];
            } else if row == col {
                out += Mv * x[col] * y[col];
            } else {
                panic!("Input matrix should be triu form.");
            }
        }
        out += tmp1 * y[col] + tmp2 * x[col];
    }
    out
}

fn scale_by_b<T: FloatT>(y: &mut [T], b: T) {
    if b == T::zero() {
        y.fill(T::zero());
    } else if b == -T::one() {
        y.negate();
    } else if b != T::one() {
        y.scale(b);
    }
}

// sparse matrix-vector multiply, no transpose
fn csc_axpby_N<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    assert_eq!(x.len(), A.n);
    assert_eq!(y.len(), A.m);

    scale_by_b(y, b);

    if a == T::zero() {
        return;
    }

    for (j, &xj) in x.iter().enumerate() {
        let ax = a * xj;
        for i in A.colptr[j]..A.colptr[j + 1] {
            y[A.rowval[i]] += A.nzval[i] * ax;
        }
    }
}

// sparse matrix-vector multiply, transposed
fn csc_axpby_T<T: FloatT>(A: &CscMatrix<T>, y: &mut [T], x: &[T], a: T, b: T) {
    assert_eq!(x.len(), A.m);
    assert_eq!(y.len(), A.n);

    scale_by_b(y, b);

    if a == T::zero() {
        return;
    }

    for (j, yj) in y.iter_mut().enumerate() {
        let rng = A.colptr[j]..A.colptr[j + 1];
        let acc = zip(&A.nzval[rng.clone()], &A.rowval[rng])
            .fold(T::zero(), |acc, (&v, &row)| acc + v * x[row]);
        *yj += a * acc;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_matrix() -> CscMatrix<f64> {
        // A = [1  ⋅  2]
        //     [⋅  3  ⋅]
        //     [4  ⋅ -5]
        //     [⋅  6  ⋅]
        CscMatrix::new(
            4,
            3,
            vec![0, 2, 4, 6],
            vec![0, 2, 1, 3, 0, 2],
            vec![1., 4., 3., 6., 2., -5.],
        )
    }

    #[test]
    fn test_gemv() {
        let A = test_matrix();
        let x = vec![1., -1., 2.];
        let mut y = vec![1.; 4];

        A.gemv(&mut y, &x, 1., 0.);
        assert_eq!(y, vec![5., -3., -6., -6.]);

        A.gemv(&mut y, &x, 2., -1.);
        assert_eq!(y, vec![5., -3., -6., -6.]);

        let z = vec![1., 0., 1., 2.];
        let mut w = vec![0.; 3];
        A.t().gemv(&mut w, &z, 1., 0.);
        assert_eq!(w, vec![5., 12., -3.]);
    }

    #[test]
    fn test_symv_and_quad_form() {
        // P = [4 1; 1 2], triu
        let P = CscMatrix::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![4., 1., 2.]);
        let x = vec![1., 2.];
        let mut y = vec![0.; 2];

        P.sym().symv(&mut y, &x, 1., 0.);
        assert_eq!(y, vec![6., 5.]);
        assert_eq!(P.quad_form(&x, &x), 16.);
    }

    #[test]
    fn test_norms_and_scaling() {
        let mut A = test_matrix();

        let mut cnorms = vec![0.; 3];
        A.col_norms(&mut cnorms);
        assert_eq!(cnorms, vec![4., 6., 5.]);

        let mut rnorms = vec![0.; 4];
        A.row_norms(&mut rnorms);
        assert_eq!(rnorms, vec![2., 3., 5., 6.]);

        let mut sums = vec![0.; 4];
        A.row_sums(&mut sums);
        assert_eq!(sums, vec![3., 3., -1., 6.]);

        A.lrscale(&[1., 2., 1., 1.], &[2., 1., 1.]);
        assert_eq!(A.nzval, vec![2., 8., 6., 6., 2., -5.]);

        let P = CscMatrix::new(2, 2, vec![0, 1, 3], vec![0, 0, 1], vec![4., -7., 2.]);
        let mut pnorms = vec![0.; 2];
        P.col_norms_sym(&mut pnorms);
        assert_eq!(pnorms, vec![7., 7.]);
    }
}
