//! U-Net generator.

use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::PaddingConfig2d;
use burn::prelude::*;
use burn::tensor::activation::{leaky_relu, relu, tanh};
use burn::tensor::module::interpolate;
use burn::tensor::ops::{InterpolateMode, InterpolateOptions};

use crate::config::{GeneratorConfig, NormLayer};
use crate::nn::norm::Norm;

const LEAKY_SLOPE: f64 = 0.2;

/// Encoder level: stride-2 convolution, optional norm, LeakyReLU.
#[derive(Module, Debug)]
pub struct DownLevel<B: Backend> {
    conv: Conv2d<B>,
    norm: Option<Norm<B, 2>>,
}

impl<B: Backend> DownLevel<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        norm: Option<NormLayer>,
        device: &B::Device,
    ) -> Self {
        let bias = !matches!(norm, Some(NormLayer::BatchNorm));
        Self {
            conv: Conv2dConfig::new([in_channels, out_channels], [4, 4])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(bias)
                .init(device),
            norm: norm.map(|layer| Norm::new(layer, out_channels, device)),
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = match &self.norm {
            Some(norm) => norm.forward(x),
            None => x,
        };
        leaky_relu(x, LEAKY_SLOPE)
    }
}

/// Decoder level: 2x upsampling, then norm + ReLU, or tanh at the output.
#[derive(Module, Debug)]
pub struct UpLevel<B: Backend> {
    deconv: Option<ConvTranspose2d<B>>,
    conv: Option<Conv2d<B>>,
    norm: Option<Norm<B, 2>>,
    outermost: bool,
}

impl<B: Backend> UpLevel<B> {
    fn new(
        in_channels: usize,
        out_channels: usize,
        norm: Option<NormLayer>,
        ups: bool,
        device: &B::Device,
    ) -> Self {
        let outermost = norm.is_none();
        let bias = !matches!(norm, Some(NormLayer::BatchNorm));

        let (deconv, conv) = if ups {
            let conv = Conv2dConfig::new([in_channels, out_channels], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .with_bias(bias)
                .init(device);
            (None, Some(conv))
        } else {
            let deconv = ConvTranspose2dConfig::new([in_channels, out_channels], [4, 4])
                .with_stride([2, 2])
                .with_padding([1, 1])
                .with_bias(bias)
                .init(device);
            (Some(deconv), None)
        };

        Self {
            deconv,
            conv,
            norm: norm.map(|layer| Norm::new(layer, out_channels, device)),
            outermost,
        }
    }

    fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = match (&self.deconv, &self.conv) {
            (Some(deconv), _) => deconv.forward(x),
            (None, Some(conv)) => {
                let [_, _, height, width] = x.dims();
                let x = interpolate(
                    x,
                    [2 * height, 2 * width],
                    InterpolateOptions::new(InterpolateMode::Nearest),
                );
                conv.forward(x)
            }
            (None, None) => x,
        };

        if self.outermost {
            return tanh(x);
        }
        let x = match &self.norm {
            Some(norm) => norm.forward(x),
            None => x,
        };
        relu(x)
    }
}

/// Encoder/decoder generator with skip connections.
///
/// Level `i` of the encoder has `ngf * min(2^i, 8)` channels and halves the
/// spatial size. The decoder mirrors it and concatenates the matching
/// encoder output onto every level except the outermost, which maps to the
/// output channels through tanh. Inputs must have height and width
/// divisible by `2^num_downs`.
///
/// Input shape: `[batch, input_nc, height, width]`
/// Output shape: `[batch, output_nc, height, width]`
#[derive(Module, Debug)]
pub struct UnetGenerator<B: Backend> {
    /// Encoder levels, outermost first.
    down: Vec<DownLevel<B>>,
    /// Decoder levels, innermost first.
    up: Vec<UpLevel<B>>,
    input_nc: usize,
    output_nc: usize,
}

impl<B: Backend> UnetGenerator<B> {
    /// Create a U-Net mapping `input_nc` channels to `output_nc` channels.
    pub fn new(
        input_nc: usize,
        output_nc: usize,
        config: &GeneratorConfig,
        device: &B::Device,
    ) -> Self {
        let levels = config.num_downs;
        let channels = |level: usize| config.level_channels(level);

        let down = (0..levels)
            .map(|i| {
                let in_channels = if i == 0 { input_nc } else { channels(i - 1) };
                // no norm on the outermost and innermost encoder levels
                let norm = (i > 0 && i + 1 < levels).then_some(config.norm_layer);
                DownLevel::new(in_channels, channels(i), norm, device)
            })
            .collect();

        let up = (0..levels)
            .rev()
            .map(|i| {
                let in_channels = if i + 1 == levels {
                    channels(i)
                } else {
                    2 * channels(i)
                };
                let (out_channels, norm) = if i == 0 {
                    (output_nc, None)
                } else {
                    (channels(i - 1), Some(config.norm_layer))
                };
                UpLevel::new(in_channels, out_channels, norm, config.ups, device)
            })
            .collect();

        Self {
            down,
            up,
            input_nc,
            output_nc,
        }
    }

    /// Number of encoder levels.
    pub fn num_levels(&self) -> usize {
        self.down.len()
    }

    /// Input channel count.
    pub fn input_channels(&self) -> usize {
        self.input_nc
    }

    /// Output channel count.
    pub fn output_channels(&self) -> usize {
        self.output_nc
    }

    /// Forward pass.
    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut skips = Vec::with_capacity(self.down.len());
        let mut x = input;
        for level in &self.down {
            x = level.forward(x);
            skips.push(x.clone());
        }
        // the innermost output feeds the decoder directly
        skips.pop();

        for level in &self.up {
            x = level.forward(x);
            if let Some(skip) = skips.pop() {
                x = Tensor::cat(vec![x, skip], 1);
            }
        }
        x
    }

    /// Whether `record` has the same number of levels as this network.
    pub(crate) fn record_levels_match(&self, record: &UnetGeneratorRecord<B>) -> bool {
        record.down.len() == self.down.len() && record.up.len() == self.up.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    fn small_config() -> GeneratorConfig {
        GeneratorConfig::new().with_num_downs(3).with_ngf(4)
    }

    #[test]
    fn test_forward_shape() {
        let device = Default::default();
        let net = UnetGenerator::<TestBackend>::new(80, 1, &small_config(), &device);
        assert_eq!(net.num_levels(), 3);

        let input = Tensor::<TestBackend, 4>::ones([2, 80, 16, 16], &device);
        assert_eq!(net.forward(input).dims(), [2, 1, 16, 16]);
    }

    #[test]
    fn test_upsampling_decoder_shape() {
        let device = Default::default();
        let config = small_config()
            .with_ups(true)
            .with_norm_layer(NormLayer::InstanceNorm);
        let net = UnetGenerator::<TestBackend>::new(3, 2, &config, &device);

        let input = Tensor::<TestBackend, 4>::ones([1, 3, 8, 16], &device);
        assert_eq!(net.forward(input).dims(), [1, 2, 8, 16]);
    }

    #[test]
    fn test_output_bounded_by_tanh() {
        let device = Default::default();
        let net = UnetGenerator::<TestBackend>::new(4, 1, &small_config(), &device);
        let input = Tensor::<TestBackend, 4>::random(
            [1, 4, 8, 8],
            burn::tensor::Distribution::Uniform(-10.0, 10.0),
            &device,
        );
        let max_abs: f32 = net.forward(input).abs().max().into_scalar();
        assert!(max_abs <= 1.0);
    }

    #[test]
    fn test_single_level() {
        let device = Default::default();
        let config = GeneratorConfig::new().with_num_downs(1).with_ngf(2);
        let net = UnetGenerator::<TestBackend>::new(5, 1, &config, &device);
        let input = Tensor::<TestBackend, 4>::zeros([1, 5, 4, 4], &device);
        assert_eq!(net.forward(input).dims(), [1, 1, 4, 4]);
    }

    #[test]
    fn test_record_level_check() {
        let device = Default::default();
        let net = UnetGenerator::<TestBackend>::new(4, 1, &small_config(), &device);
        let deeper = UnetGenerator::<TestBackend>::new(
            4,
            1,
            &small_config().with_num_downs(4),
            &device,
        );
        assert!(net.record_levels_match(&net.clone().into_record()));
        assert!(!net.record_levels_match(&deeper.into_record()));
    }
}
