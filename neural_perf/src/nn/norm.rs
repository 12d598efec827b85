//! Selectable normalisation layer.

use burn::module::Module;
use burn::nn::{BatchNorm, BatchNormConfig, InstanceNorm, InstanceNormConfig};
use burn::prelude::*;

use crate::config::NormLayer;

/// Batch or instance normalisation over `D` spatial dimensions.
///
/// Exactly one of the two layers is present, chosen by [`NormLayer`].
#[derive(Module, Debug)]
pub struct Norm<B: Backend, const D: usize> {
    batch: Option<BatchNorm<B, D>>,
    instance: Option<InstanceNorm<B>>,
}

impl<B: Backend, const D: usize> Norm<B, D> {
    /// Create a normalisation layer over `num_features` channels.
    pub fn new(layer: NormLayer, num_features: usize, device: &B::Device) -> Self {
        match layer {
            NormLayer::BatchNorm => Self {
                batch: Some(BatchNormConfig::new(num_features).init(device)),
                instance: None,
            },
            NormLayer::InstanceNorm => Self {
                batch: None,
                instance: Some(
                    InstanceNormConfig::new(num_features)
                        .with_affine(false)
                        .init(device),
                ),
            },
        }
    }

    /// The configured layer kind.
    pub fn layer(&self) -> NormLayer {
        if self.batch.is_some() {
            NormLayer::BatchNorm
        } else {
            NormLayer::InstanceNorm
        }
    }

    /// Normalise `[batch, channels, ...spatial]`.
    pub fn forward<const DI: usize>(&self, input: Tensor<B, DI>) -> Tensor<B, DI> {
        match (&self.batch, &self.instance) {
            (Some(norm), _) => norm.forward(input),
            (None, Some(norm)) => norm.forward(input),
            (None, None) => input,
        }
    }
}
