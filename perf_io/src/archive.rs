//! Training loss histories and their compressed NumPy archive.
//!
//! The archive holds three 1D `float64` arrays under the keys `d`
//! (discriminator), `g` (generator) and `val` (validation), readable with
//! `numpy.load`.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use ndarray::{Array1, Ix1, OwnedRepr};
use ndarray_npy::{NpzReader, NpzWriter};

use crate::error::{PerfIoError, Result};

/// Archive key of the discriminator losses.
pub const KEY_D: &str = "d";
/// Archive key of the generator losses.
pub const KEY_G: &str = "g";
/// Archive key of the validation losses.
pub const KEY_VAL: &str = "val";

/// Per-epoch loss sequences of a training run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LossHistory {
    /// Discriminator loss per epoch.
    pub d: Vec<f64>,
    /// Generator loss per epoch.
    pub g: Vec<f64>,
    /// Validation loss per epoch.
    pub val: Vec<f64>,
}

impl LossHistory {
    /// Create a history from existing sequences.
    pub fn new(d: Vec<f64>, g: Vec<f64>, val: Vec<f64>) -> Self {
        Self { d, g, val }
    }

    /// Append one epoch's losses.
    pub fn push_epoch(&mut self, d: f64, g: f64, val: f64) {
        self.d.push(d);
        self.g.push(g);
        self.val.push(val);
    }

    /// Number of epochs recorded in the longest sequence.
    pub fn epochs(&self) -> usize {
        self.d.len().max(self.g.len()).max(self.val.len())
    }

    /// True when no sequence holds a value.
    pub fn is_empty(&self) -> bool {
        self.epochs() == 0
    }

    /// The three sequences with their chart captions.
    pub(crate) fn series(&self) -> [(&'static str, &[f64]); 3] {
        [
            ("Discriminator", &self.d),
            ("Generator", &self.g),
            ("Validation loss", &self.val),
        ]
    }
}

/// Path of the loss archive for `prefix`: `<prefix>losses.npz`.
pub fn archive_path(prefix: impl AsRef<Path>) -> PathBuf {
    crate::figures::prefixed(prefix.as_ref(), "losses.npz")
}

/// Write `history` to `<prefix>losses.npz` and return the path.
pub fn save_losses(prefix: impl AsRef<Path>, history: &LossHistory) -> Result<PathBuf> {
    let path = archive_path(prefix);
    write_npz(BufWriter::new(File::create(&path)?), history)?;
    log::info!(
        "saved loss archive {} ({} epochs)",
        path.display(),
        history.epochs()
    );
    Ok(path)
}

/// Write the three loss arrays to `writer` and flush it. Errors from a
/// flush on drop would be lost.
fn write_npz<W: Write + Seek>(writer: W, history: &LossHistory) -> Result<()> {
    let mut npz = NpzWriter::new_compressed(writer);
    npz.add_array(KEY_D, &Array1::from(history.d.clone()))?;
    npz.add_array(KEY_G, &Array1::from(history.g.clone()))?;
    npz.add_array(KEY_VAL, &Array1::from(history.val.clone()))?;
    npz.finish()?.flush()?;
    Ok(())
}

/// Read the loss archive written by [`save_losses`] for `prefix`.
pub fn load_losses(prefix: impl AsRef<Path>) -> Result<LossHistory> {
    let path = archive_path(prefix);
    let mut npz = NpzReader::new(File::open(&path)?)?;
    let names = npz.names()?;

    let mut read = |key: &str| -> Result<Vec<f64>> {
        let name = names
            .iter()
            .find(|name| name.trim_end_matches(".npy") == key)
            .ok_or_else(|| {
                PerfIoError::InvalidInput(format!(
                    "archive {} has no '{key}' array",
                    path.display()
                ))
            })?;
        let array = npz.by_name::<OwnedRepr<f64>, Ix1>(name)?;
        Ok(array.to_vec())
    };

    Ok(LossHistory {
        d: read(KEY_D)?,
        g: read(KEY_G)?,
        val: read(KEY_VAL)?,
    })
}
