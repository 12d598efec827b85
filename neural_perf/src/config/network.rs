//! Generator architecture configuration.

use std::fmt;
use std::str::FromStr;

use burn::config::Config;
use serde::{Deserialize, Serialize};

use crate::error::NeuralPerfError;

/// Normalisation used inside the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormLayer {
    /// Batch normalisation with running statistics.
    BatchNorm,
    /// Per-sample instance normalisation without affine parameters.
    InstanceNorm,
}

impl NormLayer {
    /// Name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            NormLayer::BatchNorm => "batchnorm",
            NormLayer::InstanceNorm => "instancenorm",
        }
    }
}

impl fmt::Display for NormLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NormLayer {
    type Err = NeuralPerfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "batchnorm" => Ok(NormLayer::BatchNorm),
            "instancenorm" => Ok(NormLayer::InstanceNorm),
            other => Err(NeuralPerfError::config(format!(
                "unknown normalization layer '{other}' (expected 'batchnorm' or 'instancenorm')"
            ))),
        }
    }
}

/// Generator architecture variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    /// 2D U-Net over temporal frames stacked as channels.
    Unet,
    /// 3D temporal stem followed by a 2D U-Net.
    TmpAndUnet,
}

impl GeneratorKind {
    /// Name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            GeneratorKind::Unet => "unet",
            GeneratorKind::TmpAndUnet => "tmpandunet",
        }
    }
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorKind {
    type Err = NeuralPerfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unet" => Ok(GeneratorKind::Unet),
            "tmpandunet" => Ok(GeneratorKind::TmpAndUnet),
            other => Err(NeuralPerfError::config(format!(
                "unknown generator type '{other}' (expected 'unet' or 'tmpandunet')"
            ))),
        }
    }
}

/// Hyperparameters shared by both generator variants.
#[derive(Config, Debug)]
pub struct GeneratorConfig {
    /// Number of stride-2 downsampling levels.
    #[config(default = 7)]
    pub num_downs: usize,

    /// Channel count of the first encoder level.
    #[config(default = 64)]
    pub ngf: usize,

    /// Decode with nearest upsampling + convolution instead of transposed
    /// convolution.
    #[config(default = false)]
    pub ups: bool,

    /// Normalisation layer.
    #[config(default = "NormLayer::BatchNorm")]
    pub norm_layer: NormLayer,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorConfig {
    /// Channels of encoder level `level`: `ngf * min(2^level, 8)`.
    pub fn level_channels(&self, level: usize) -> usize {
        self.ngf * (1usize << level.min(3))
    }

    /// Spatial size divisor required of inputs (`2^num_downs`).
    pub fn size_divisor(&self) -> usize {
        1usize << self.num_downs
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.num_downs == 0 {
            return Err("num_downs must be positive".to_string());
        }
        if self.num_downs > 16 {
            return Err(format!("num_downs {} is too deep (maximum 16)", self.num_downs));
        }
        if self.ngf == 0 {
            return Err("ngf must be positive".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generator_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.num_downs, 7);
        assert_eq!(config.ngf, 64);
        assert!(!config.ups);
        assert_eq!(config.norm_layer, NormLayer::BatchNorm);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_level_channels_cap_at_eight_times() {
        let config = GeneratorConfig::new().with_ngf(4);
        let channels: Vec<usize> = (0..6).map(|i| config.level_channels(i)).collect();
        assert_eq!(channels, vec![4, 8, 16, 32, 32, 32]);
        assert_eq!(config.size_divisor(), 128);
    }

    #[test]
    fn test_norm_layer_parsing() {
        assert_eq!("batchnorm".parse::<NormLayer>().unwrap(), NormLayer::BatchNorm);
        assert_eq!(
            "InstanceNorm".parse::<NormLayer>().unwrap(),
            NormLayer::InstanceNorm
        );
        let err = "groupnorm".parse::<NormLayer>().unwrap_err();
        assert!(matches!(err, NeuralPerfError::InvalidConfig { .. }));
        assert!(err.to_string().contains("groupnorm"));
    }

    #[test]
    fn test_generator_kind_parsing() {
        assert_eq!("unet".parse::<GeneratorKind>().unwrap(), GeneratorKind::Unet);
        assert_eq!(
            "tmpandunet".parse::<GeneratorKind>().unwrap(),
            GeneratorKind::TmpAndUnet
        );
        assert!("resnet".parse::<GeneratorKind>().is_err());
        assert_eq!(GeneratorKind::TmpAndUnet.to_string(), "tmpandunet");
    }

    #[test]
    fn test_validate_rejects_zero_levels() {
        assert!(GeneratorConfig::new().with_num_downs(0).validate().is_err());
        assert!(GeneratorConfig::new().with_ngf(0).validate().is_err());
    }
}
