//! Scalar error metrics between equally-shaped arrays.

use ndarray::{ArrayBase, Data, Dimension, Zip};

use crate::error::{PerfCoreError, Result};

/// Mean absolute error between `actual` and `predicted`.
///
/// Both arrays must have exactly the same shape; no broadcasting is
/// performed. The accumulation happens in `f64` regardless of the element
/// type, so integer and `f32` inputs are both accepted.
///
/// # Errors
/// * [`PerfCoreError::ShapeMismatch`] if the shapes differ.
/// * [`PerfCoreError::EmptyInput`] if the arrays have no elements.
///
/// # Example
/// ```
/// use ndarray::array;
/// use perf_core::mae;
///
/// let actual = array![0.0f32, 0.0];
/// let predicted = array![1.0f32, 1.0];
/// assert_eq!(mae(&actual, &predicted).unwrap(), 1.0);
/// ```
pub fn mae<A, S1, S2, D>(actual: &ArrayBase<S1, D>, predicted: &ArrayBase<S2, D>) -> Result<f64>
where
    A: Copy + Into<f64>,
    S1: Data<Elem = A>,
    S2: Data<Elem = A>,
    D: Dimension,
{
    if actual.shape() != predicted.shape() {
        return Err(PerfCoreError::ShapeMismatch {
            expected: actual.shape().to_vec(),
            got: predicted.shape().to_vec(),
        });
    }
    if actual.is_empty() {
        return Err(PerfCoreError::EmptyInput { what: "actual" });
    }

    let total = Zip::from(actual)
        .and(predicted)
        .fold(0.0f64, |acc, &a, &p| acc + (a.into() - p.into()).abs());

    Ok(total / actual.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn test_identical_arrays() {
        let a = array![1, 2, 3];
        assert_eq!(mae(&a, &a.clone()).unwrap(), 0.0);
    }

    #[test]
    fn test_unit_offset() {
        let actual = array![0, 0];
        let predicted = array![1, 1];
        assert_eq!(mae(&actual, &predicted).unwrap(), 1.0);
    }

    #[test]
    fn test_mixed_signs() {
        let actual = array![[1.0f32, -2.0], [3.0, 0.5]];
        let predicted = array![[0.0f32, 2.0], [3.0, -0.5]];
        // |1| + |-4| + |0| + |1| = 6, over 4 elements
        assert!((mae(&actual, &predicted).unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_views_are_accepted() {
        let volume = Array3::<f32>::from_elem((4, 4, 4), 2.0);
        let other = Array3::<f32>::from_elem((4, 4, 4), 1.0);
        let err = mae(&volume.view(), &other.view()).unwrap();
        assert!((err - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = array![[1.0f64, 2.0], [3.0, 4.0]];
        let b = array![[1.0f64, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let err = mae(&a, &b).unwrap_err();
        assert_eq!(
            err,
            PerfCoreError::ShapeMismatch {
                expected: vec![2, 2],
                got: vec![2, 3],
            }
        );
    }

    #[test]
    fn test_empty_input() {
        let a = ndarray::Array1::<f64>::zeros(0);
        assert!(matches!(
            mae(&a, &a.clone()),
            Err(PerfCoreError::EmptyInput { .. })
        ));
    }
}
