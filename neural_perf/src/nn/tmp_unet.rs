//! Temporal stem followed by a U-Net.

use burn::module::Module;
use burn::nn::conv::{Conv3d, Conv3dConfig};
use burn::nn::PaddingConfig3d;
use burn::prelude::*;
use burn::tensor::activation::leaky_relu;

use crate::config::{GeneratorConfig, NormLayer};
use crate::nn::norm::Norm;
use crate::nn::unet::UnetGenerator;

/// Generator for image time series kept on their own axis.
///
/// A 3x3x3 convolution with normalisation and LeakyReLU extracts `ngf`
/// spatio-temporal features, which are averaged over time and decoded by a
/// [`UnetGenerator`].
///
/// Input shape: `[batch, input_nc, time, height, width]`
/// Output shape: `[batch, output_nc, height, width]`
#[derive(Module, Debug)]
pub struct TmpAndUnet<B: Backend> {
    stem: Conv3d<B>,
    stem_norm: Norm<B, 3>,
    unet: UnetGenerator<B>,
}

impl<B: Backend> TmpAndUnet<B> {
    /// Create the network.
    pub fn new(
        input_nc: usize,
        output_nc: usize,
        config: &GeneratorConfig,
        device: &B::Device,
    ) -> Self {
        let features = config.ngf;
        let stem = Conv3dConfig::new([input_nc, features], [3, 3, 3])
            .with_padding(PaddingConfig3d::Explicit(1, 1, 1))
            .with_bias(config.norm_layer != NormLayer::BatchNorm)
            .init(device);

        Self {
            stem,
            stem_norm: Norm::new(config.norm_layer, features, device),
            unet: UnetGenerator::new(features, output_nc, config, device),
        }
    }

    /// The 2D decoder.
    pub fn unet(&self) -> &UnetGenerator<B> {
        &self.unet
    }

    /// Forward pass.
    pub fn forward(&self, input: Tensor<B, 5>) -> Tensor<B, 4> {
        let x = self.stem.forward(input);
        let x = leaky_relu(self.stem_norm.forward(x), 0.2);
        let x = x.mean_dim(2).squeeze::<4>(2);
        self.unet.forward(x)
    }

    pub(crate) fn record_levels_match(&self, record: &TmpAndUnetRecord<B>) -> bool {
        self.unet.record_levels_match(&record.unet)
    }
}
