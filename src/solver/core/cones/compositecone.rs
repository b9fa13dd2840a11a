use super::*;
use std::iter::zip;
use std::ops::Range;

// -------------------------------------
// default composite cone type
// -------------------------------------

/// Ordered collection of cones, each occupying a contiguous range of rows
#[derive(Debug, Clone)]
pub struct CompositeCone<T: FloatT = f64> {
    cones: Vec<SupportedCone<T>>,

    // a copy of the user description of every cone
    types: Vec<SupportedConeT>,

    //overall size of the composite cone
    pub(crate) numel: usize,

    //ranges for the indices of the constituent cones
    pub(crate) rng_cones: Vec<Range<usize>>,
}

impl<T> CompositeCone<T>
where
    T: FloatT,
{
    pub fn new(types: &[SupportedConeT]) -> Self {
        // make an internal copy to protect from user modification
        let types = types.to_vec();
        let cones: Vec<SupportedCone<T>> = types.iter().map(make_cone).collect();

        let numel = cones.iter().map(|c| c.dim()).sum();
        let rng_cones = make_rng_cones(&cones);

        Self {
            cones,
            types,
            numel,
            rng_cones,
        }
    }

    pub fn len(&self) -> usize {
        self.cones.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cones.is_empty()
    }
    pub fn iter(&self) -> std::slice::Iter<'_, SupportedCone<T>> {
        self.cones.iter()
    }
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, SupportedCone<T>> {
        self.cones.iter_mut()
    }

    /// user descriptions of the cones, in order
    pub fn types(&self) -> &[SupportedConeT] {
        &self.types
    }

    /// row ranges of the cones, in order
    pub fn rng_cones(&self) -> &[Range<usize>] {
        &self.rng_cones
    }
}

fn make_rng_cones<T>(cones: &[SupportedCone<T>]) -> Vec<Range<usize>>
where
    T: FloatT,
{
    let mut start = 0;
    cones
        .iter()
        .map(|cone| {
            let stop = start + cone.dim();
            let rng = start..stop;
            start = stop;
            rng
        })
        .collect()
}

impl<T> Cone<T> for CompositeCone<T>
where
    T: FloatT,
{
    fn dim(&self) -> usize {
        self.numel
    }

    fn is_elementwise(&self) -> bool {
        self.cones.iter().all(|c| c.is_elementwise())
    }

    fn rectify_equilibration(&self, δ: &mut [T], e: &[T]) -> bool {
        let mut any_changed = false;

        // default is to do nothing at all
        δ.fill(T::one());
        for (cone, rng) in zip(&self.cones, &self.rng_cones) {
            let δi = &mut δ[rng.clone()];
            let ei = &e[rng.clone()];
            any_changed |= cone.rectify_equilibration(δi, ei);
        }
        any_changed
    }

    fn project(&mut self, x: &mut [T]) {
        for (cone, rng) in zip(&mut self.cones, &self.rng_cones) {
            cone.project(&mut x[rng.clone()]);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algebra::VectorMath;

    #[test]
    fn test_composite_ranges_and_projection() {
        let types = [
            SupportedConeT::ZeroConeT(2),
            SupportedConeT::NonnegativeConeT(3),
            SupportedConeT::PSDTriangleConeT(2),
            SupportedConeT::SecondOrderConeT(3),
        ];
        let mut K = CompositeCone::<f64>::new(&types);

        assert_eq!(K.len(), 4);
        assert_eq!(K.dim(), 11);
        assert_eq!(K.rng_cones(), &[0..2, 2..5, 5..8, 8..11]);
        assert!(!K.is_elementwise());

        let mut x = vec![1., -1., 2., -3., 0., 1., 0., -1., 0., 3., 4.];
        K.project(&mut x);
        let expected = vec![0., 0., 2., 0., 0., 1., 0., 0., 2.5, 1.5, 2.];
        assert!(x.norm_inf_diff(&expected) < 1e-12);
    }

    #[test]
    fn test_composite_rectify() {
        let types = [
            SupportedConeT::NonnegativeConeT(2),
            SupportedConeT::SecondOrderConeT(2),
        ];
        let K = CompositeCone::<f64>::new(&types);
        let e = vec![2., 3., 1., 3.];
        let mut δ = vec![0.; 4];

        assert!(K.rectify_equilibration(&mut δ, &e));
        let mut rectified = e.clone();
        rectified.hadamard(&δ);
        assert_eq!(rectified, vec![2., 3., 2., 2.]);
    }
}
