// Index arithmetic for packed triangular storage.  Symmetric matrices
// are stored as the upper triangle, columnwise, i.e. the (r,c) entry
// with r <= c sits at position c*(c+1)/2 + r.

/// k-th triangular number, i.e. the length of a packed k×k triangle
pub(crate) fn triangular_number(k: usize) -> usize {
    (k * (k + 1)) >> 1
}

/// 0-based position of the k-th diagonal entry in a packed triangle.
/// Same as triangular_number(k+1) - 1
pub(crate) fn triangular_index(k: usize) -> usize {
    (k * (k + 3)) >> 1
}

/// Packed position of entry (r,c).  Lower triangular
/// coordinates are reflected into the upper triangle
pub(crate) fn coord_to_upper_triangular_index(coord: (usize, usize)) -> usize {
    let (r, c) = if coord.0 <= coord.1 {
        coord
    } else {
        (coord.1, coord.0)
    };
    triangular_number(c) + r
}

/// Inverse of `coord_to_upper_triangular_index`, always returning r <= c
pub(crate) fn upper_triangular_index_to_coord(idx: usize) -> (usize, usize) {
    let mut c = ((((8 * idx + 1) as f64).sqrt() - 1.) / 2.) as usize;
    while triangular_number(c) > idx {
        c -= 1;
    }
    while triangular_number(c + 1) <= idx {
        c += 1;
    }
    (idx - triangular_number(c), c)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_triangular_coords() {
        let mut idx = 0;
        for c in 0..20 {
            for r in 0..=c {
                assert_eq!(coord_to_upper_triangular_index((r, c)), idx);
                assert_eq!(coord_to_upper_triangular_index((c, r)), idx);
                assert_eq!(upper_triangular_index_to_coord(idx), (r, c));
                idx += 1;
            }
            assert_eq!(triangular_index(c), idx - 1);
        }
    }
}
