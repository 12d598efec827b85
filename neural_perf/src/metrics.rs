//! Tensor metrics and conversion to ndarray.

use burn::prelude::*;
use burn::tensor::ElementConversion;
use ndarray::Array4;
use perf_core::PerfCoreError;

use crate::error::{NeuralPerfError, Result};

/// Mean absolute error between two tensors of identical shape.
///
/// Same quantity as [`perf_core::mae`], computed on the tensors' device.
pub fn mae_tensor<B: Backend, const D: usize>(
    actual: Tensor<B, D>,
    predicted: Tensor<B, D>,
) -> Result<f64> {
    let expected = actual.dims();
    let got = predicted.dims();
    if expected != got {
        return Err(PerfCoreError::ShapeMismatch {
            expected: expected.to_vec(),
            got: got.to_vec(),
        }
        .into());
    }
    if expected.iter().product::<usize>() == 0 {
        return Err(PerfCoreError::EmptyInput { what: "actual" }.into());
    }

    let mean = (actual - predicted).abs().mean().into_scalar();
    Ok(mean.elem::<f64>())
}

/// Copy a `[batch, channel, height, width]` tensor into an ndarray.
pub fn tensor_to_array4<B: Backend>(tensor: Tensor<B, 4>) -> Result<Array4<f32>> {
    let [batch, channels, height, width] = tensor.dims();
    let values = tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| NeuralPerfError::InvalidData(format!("{e:?}")))?;
    Array4::from_shape_vec((batch, channels, height, width), values)
        .map_err(|e| NeuralPerfError::InvalidData(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_mae_tensor_matches_array_mae() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 2>::from_floats([[1.0, 2.0], [3.0, 4.0]], &device);
        let b = Tensor::<TestBackend, 2>::from_floats([[2.0, 2.0], [1.0, 4.0]], &device);
        let value = mae_tensor(a, b).unwrap();
        assert!((value - 0.75).abs() < 1e-6);

        let x = ndarray::array![[1.0f32, 2.0], [3.0, 4.0]];
        let y = ndarray::array![[2.0f32, 2.0], [1.0, 4.0]];
        assert!((perf_core::mae(&x, &y).unwrap() - value).abs() < 1e-6);
    }

    #[test]
    fn test_mae_tensor_shape_mismatch() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 2>::zeros([2, 3], &device);
        let b = Tensor::<TestBackend, 2>::zeros([3, 2], &device);
        assert!(matches!(
            mae_tensor(a, b),
            Err(NeuralPerfError::Core(PerfCoreError::ShapeMismatch { .. }))
        ));
    }

    #[test]
    fn test_mae_tensor_empty() {
        let device = Default::default();
        let a = Tensor::<TestBackend, 2>::zeros([0, 3], &device);
        let b = Tensor::<TestBackend, 2>::zeros([0, 3], &device);
        assert!(matches!(
            mae_tensor(a, b),
            Err(NeuralPerfError::Core(PerfCoreError::EmptyInput { .. }))
        ));
    }

    #[test]
    fn test_tensor_to_array4_layout() {
        let device = Default::default();
        let tensor = Tensor::<TestBackend, 1, Int>::arange(0..24, &device)
            .float()
            .reshape([2, 1, 3, 4]);
        let array = tensor_to_array4(tensor).unwrap();
        assert_eq!(array.shape(), &[2, 1, 3, 4]);
        assert_eq!(array[[0, 0, 0, 1]], 1.0);
        assert_eq!(array[[0, 0, 2, 3]], 11.0);
        assert_eq!(array[[1, 0, 0, 0]], 12.0);
    }
}
