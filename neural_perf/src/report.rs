//! Figures from generator tensors.

use std::path::Path;

use burn::prelude::*;
use perf_io::{save_figs, FigurePaths, ImageTriplet, LossHistory};

use crate::config::EvalConfig;
use crate::error::Result;
use crate::metrics::tensor_to_array4;

/// Write the batch-mode figures for `epoch` from `[batch, channel, height,
/// width]` tensors, using the row count of `config`.
pub fn save_generated_figs<B: Backend>(
    config: &EvalConfig,
    epoch: usize,
    input: Tensor<B, 4>,
    target: Tensor<B, 4>,
    generated: Tensor<B, 4>,
    losses: &LossHistory,
    prefix: impl AsRef<Path>,
) -> Result<FigurePaths> {
    let input = tensor_to_array4(input)?;
    let target = tensor_to_array4(target)?;
    let generated = tensor_to_array4(generated.detach())?;

    let images = ImageTriplet::batch(input.view(), target.view(), generated.view());
    let paths = save_figs(epoch, &images, losses, prefix, &config.figure_config())?;
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_save_generated_figs() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let config = EvalConfig::new(dir.path().display().to_string()).with_nr_imgs_gen(2);

        let input = Tensor::<TestBackend, 4>::ones([2, 1, 8, 8], &device);
        let target = Tensor::<TestBackend, 4>::zeros([2, 1, 8, 8], &device);
        let generated = Tensor::<TestBackend, 4>::random(
            [2, 1, 8, 8],
            burn::tensor::Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let losses = LossHistory::new(vec![0.5], vec![1.0], vec![0.3]);

        let paths = save_generated_figs(
            &config,
            1,
            input,
            target,
            generated,
            &losses,
            dir.path().join("eval_"),
        )
        .unwrap();
        assert!(paths.panels.is_file());
        assert!(paths.losses.is_file());
        assert!(paths.archive.is_file());
    }
}
