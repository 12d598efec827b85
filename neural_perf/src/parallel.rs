//! Data-parallel execution across several devices.

use burn::module::Module;
use burn::prelude::*;

use crate::nn::GeneratorNetwork;

/// A module replicated on several devices.
///
/// The forward pass splits the batch into one chunk per replica, runs each
/// chunk on its replica's device and concatenates the results on the
/// primary device (the first one).
#[derive(Debug, Clone)]
pub struct DataParallel<B: Backend, M> {
    replicas: Vec<(B::Device, M)>,
}

impl<B: Backend, M: Module<B>> DataParallel<B, M> {
    /// Replicate `module` onto `devices`. The first device is primary.
    ///
    /// Returns `None` when `devices` is empty.
    pub fn new(module: M, devices: Vec<B::Device>) -> Option<Self> {
        if devices.is_empty() {
            return None;
        }
        Some(Self::replicate(module, devices))
    }

    /// `devices` must not be empty.
    fn replicate(module: M, devices: Vec<B::Device>) -> Self {
        let replicas = devices
            .into_iter()
            .map(|device| {
                let replica = module.clone().fork(&device);
                (device, replica)
            })
            .collect();
        Self { replicas }
    }

    /// Replace the network with `f(primary replica)`, replicated again onto
    /// the same devices.
    pub fn map_module(self, f: impl FnOnce(M) -> M) -> Self {
        let devices: Vec<B::Device> = self.devices().cloned().collect();
        Self::replicate(f(self.into_module()), devices)
    }

    /// The replica on the primary device.
    pub fn module(&self) -> &M {
        &self.replicas[0].1
    }

    /// Consume the wrapper, returning the primary replica.
    pub fn into_module(self) -> M {
        self.replicas
            .into_iter()
            .next()
            .map(|(_, module)| module)
            .unwrap_or_else(|| unreachable!("DataParallel always holds a replica"))
    }

    /// The primary device.
    pub fn primary_device(&self) -> &B::Device {
        &self.replicas[0].0
    }

    /// Devices in replica order.
    pub fn devices(&self) -> impl Iterator<Item = &B::Device> {
        self.replicas.iter().map(|(device, _)| device)
    }

    /// Number of replicas.
    pub fn num_replicas(&self) -> usize {
        self.replicas.len()
    }

    /// Run `forward` on batch chunks, one per replica.
    pub fn forward_with<const D: usize, const DO: usize, F>(
        &self,
        input: Tensor<B, D>,
        forward: F,
    ) -> Tensor<B, DO>
    where
        F: Fn(&M, Tensor<B, D>) -> Tensor<B, DO>,
    {
        let chunks = input.chunk(self.replicas.len(), 0);
        let primary = self.primary_device();
        let outputs = chunks
            .into_iter()
            .zip(&self.replicas)
            .map(|(chunk, (device, replica))| {
                forward(replica, chunk.to_device(device)).to_device(primary)
            })
            .collect();
        Tensor::cat(outputs, 0)
    }
}

/// A generator on one device, or replicated across several.
#[derive(Debug, Clone)]
pub enum GeneratorHandle<B: Backend, M> {
    /// Single-device network.
    Single(M),
    /// Data-parallel network.
    Parallel(DataParallel<B, M>),
}

impl<B: Backend, M: Module<B>> GeneratorHandle<B, M> {
    /// The underlying network (the primary replica when parallel).
    pub fn module(&self) -> &M {
        match self {
            GeneratorHandle::Single(module) => module,
            GeneratorHandle::Parallel(parallel) => parallel.module(),
        }
    }

    /// Consume the handle, returning the network.
    pub fn into_module(self) -> M {
        match self {
            GeneratorHandle::Single(module) => module,
            GeneratorHandle::Parallel(parallel) => parallel.into_module(),
        }
    }

    /// Replace the network with `f(network)`, keeping the device layout.
    pub fn map_module(self, f: impl FnOnce(M) -> M) -> Self {
        match self {
            GeneratorHandle::Single(module) => GeneratorHandle::Single(f(module)),
            GeneratorHandle::Parallel(parallel) => GeneratorHandle::Parallel(parallel.map_module(f)),
        }
    }

    /// Whether the network is replicated.
    pub fn is_parallel(&self) -> bool {
        matches!(self, GeneratorHandle::Parallel(_))
    }

    /// Generate images from `input`.
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, 4>
    where
        M: GeneratorNetwork<B, D>,
    {
        match self {
            GeneratorHandle::Single(module) => module.generate(input),
            GeneratorHandle::Parallel(parallel) => {
                parallel.forward_with(input, |module, chunk| module.generate(chunk))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::nn::UnetGenerator;
    use burn::backend::ndarray::NdArrayDevice;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn small_unet() -> UnetGenerator<TestBackend> {
        let config = GeneratorConfig::new().with_num_downs(2).with_ngf(2);
        UnetGenerator::new(3, 1, &config, &NdArrayDevice::Cpu)
    }

    #[test]
    fn test_empty_device_list() {
        assert!(DataParallel::<TestBackend, _>::new(small_unet(), vec![]).is_none());
    }

    #[test]
    fn test_parallel_matches_single() {
        let net = small_unet();
        let devices = vec![NdArrayDevice::Cpu; 3];
        let parallel = DataParallel::new(net.clone(), devices).unwrap();
        assert_eq!(parallel.num_replicas(), 3);

        let input = Tensor::<TestBackend, 4>::random(
            [5, 3, 8, 8],
            burn::tensor::Distribution::Uniform(-1.0, 1.0),
            &NdArrayDevice::Cpu,
        );
        let single = GeneratorHandle::Single(net).forward(input.clone());
        let split = GeneratorHandle::Parallel(parallel).forward(input);

        assert_eq!(split.dims(), [5, 1, 8, 8]);
        let diff: f32 = (single - split).abs().max().into_scalar();
        assert!(diff < 1e-5);
    }

    #[test]
    fn test_map_module_keeps_replicas() {
        let parallel = DataParallel::new(small_unet(), vec![NdArrayDevice::Cpu; 3]).unwrap();
        let handle = GeneratorHandle::Parallel(parallel).map_module(|net| net.no_grad());

        match &handle {
            GeneratorHandle::Parallel(parallel) => {
                assert_eq!(parallel.num_replicas(), 3);
                assert_eq!(parallel.devices().count(), 3);
            }
            GeneratorHandle::Single(_) => panic!("map_module dropped the replicas"),
        }

        let single = GeneratorHandle::<TestBackend, _>::Single(small_unet()).map_module(|net| net);
        assert!(!single.is_parallel());
    }

    #[test]
    fn test_batch_smaller_than_replicas() {
        let parallel = DataParallel::new(small_unet(), vec![NdArrayDevice::Cpu; 4]).unwrap();
        let handle = GeneratorHandle::Parallel(parallel);
        assert!(handle.is_parallel());

        let input = Tensor::<TestBackend, 4>::zeros([2, 3, 4, 4], &NdArrayDevice::Cpu);
        assert_eq!(handle.forward(input).dims(), [2, 1, 4, 4]);
    }
}
