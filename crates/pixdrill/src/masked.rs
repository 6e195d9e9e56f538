//! Masked pixel arrays.

use raster_access::RasterError;
use serde::{Deserialize, Serialize};

/// A band-major `(bands, rows, cols)` array of pixel values with a per-pixel
/// null mask. `mask[i] == true` means `data[i]` is null.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaskedArray {
    bands: usize,
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    mask: Vec<bool>,
}

impl MaskedArray {
    /// An array with no pixels.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from per-band row-major arrays.
    ///
    /// Pixels equal to their band's null value are masked. A NaN null value
    /// masks NaN pixels. Bands without a null value are not masked.
    ///
    /// Fails if a band does not hold `rows * cols` values.
    pub fn from_bands(
        band_data: Vec<Vec<f64>>,
        rows: usize,
        cols: usize,
        nulls: &[Option<f64>],
    ) -> Result<Self, RasterError> {
        let bands = band_data.len();
        let mut data = Vec::with_capacity(bands * rows * cols);
        let mut mask = Vec::with_capacity(bands * rows * cols);

        for (idx, band) in band_data.into_iter().enumerate() {
            if band.len() != rows * cols {
                return Err(RasterError::read_failed(format!(
                    "band {} returned {} values for a {}x{} window",
                    idx,
                    band.len(),
                    cols,
                    rows
                )));
            }
            let null = nulls.get(idx).copied().flatten();
            mask.extend(band.iter().map(|&v| is_null(v, null)));
            data.extend(band);
        }

        Ok(Self {
            bands,
            rows,
            cols,
            data,
            mask,
        })
    }

    /// `(bands, rows, cols)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.bands, self.rows, self.cols)
    }

    pub fn bands(&self) -> usize {
        self.bands
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of elements across all bands.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of non-null elements.
    pub fn count(&self) -> usize {
        self.mask.iter().filter(|m| !**m).count()
    }

    /// Number of null elements.
    pub fn count_null(&self) -> usize {
        self.mask.iter().filter(|m| **m).count()
    }

    /// Raw values, band-major.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Null mask, band-major.
    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    /// Raw values of one band.
    pub fn band(&self, band: usize) -> &[f64] {
        let len = self.rows * self.cols;
        &self.data[band * len..(band + 1) * len]
    }

    /// Value at a position, `None` when null.
    pub fn get(&self, band: usize, row: usize, col: usize) -> Option<f64> {
        let idx = self.index(band, row, col);
        if self.mask[idx] {
            None
        } else {
            Some(self.data[idx])
        }
    }

    pub fn is_masked(&self, band: usize, row: usize, col: usize) -> bool {
        self.mask[self.index(band, row, col)]
    }

    /// Iterate over the non-null values of every band.
    pub fn valid(&self) -> impl Iterator<Item = f64> + '_ {
        self.data
            .iter()
            .zip(self.mask.iter())
            .filter(|(_, m)| !**m)
            .map(|(v, _)| *v)
    }

    /// Store `value` at a position and mark it null.
    pub fn set_null(&mut self, band: usize, row: usize, col: usize, value: f64) {
        let idx = self.index(band, row, col);
        self.data[idx] = value;
        self.mask[idx] = true;
    }

    fn index(&self, band: usize, row: usize, col: usize) -> usize {
        (band * self.rows + row) * self.cols + col
    }
}

fn is_null(value: f64, null: Option<f64>) -> bool {
    match null {
        Some(n) if n.is_nan() => value.is_nan(),
        Some(n) => value == n,
        None => false,
    }
}
