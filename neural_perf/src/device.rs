//! Mapping device indices to backend devices.

use burn::backend::Autodiff;
use burn::tensor::backend::Backend;

/// Backends whose devices can be addressed by a numeric index.
pub trait DeviceIndex: Backend {
    /// Device number `index`.
    fn device_at(index: usize) -> Self::Device;
}

impl<B: DeviceIndex> DeviceIndex for Autodiff<B> {
    fn device_at(index: usize) -> Self::Device {
        B::device_at(index)
    }
}

/// The CPU backend has one device; every index maps to it.
#[cfg(feature = "ndarray")]
impl DeviceIndex for burn::backend::NdArray {
    fn device_at(_index: usize) -> Self::Device {
        burn::backend::ndarray::NdArrayDevice::Cpu
    }
}

#[cfg(feature = "wgpu")]
impl DeviceIndex for burn::backend::Wgpu {
    fn device_at(index: usize) -> Self::Device {
        burn::backend::wgpu::WgpuDevice::DiscreteGpu(index)
    }
}

#[cfg(all(test, feature = "ndarray"))]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;

    #[test]
    fn test_cpu_indices_share_device() {
        assert_eq!(NdArray::device_at(0), NdArrayDevice::Cpu);
        assert_eq!(NdArray::device_at(3), NdArrayDevice::Cpu);
        assert_eq!(Autodiff::<NdArray>::device_at(1), NdArrayDevice::Cpu);
    }
}
