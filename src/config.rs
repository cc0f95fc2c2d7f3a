//! Repository configuration

use std::path::PathBuf;

/// Configuration for a [`crate::repository::SwatchRepository`]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RepositoryConfig {
    /// Directory scanned for `*.acb` / `*.ase` files
    pub swatch_dir: PathBuf,
    /// ΔE00 threshold below which a query is treated as "probably white"
    pub achromatic_threshold_white: f64,
    /// ΔE00 threshold below which a query is treated as "probably black"
    pub achromatic_threshold_black: f64,
    /// Whether the probable-achromatic shortcut bypasses exact-match search
    /// even when an exact swatch exists in-book
    pub bypass_exact_on_probable_achromatic: bool,
    /// Default cap on `nearest` results returned by `search_by_hex`
    pub default_search_limit: usize,
    /// Number of top results annotated (and usage-scored) in expert mode
    pub expert_top_n: usize,
    /// Pixel count above which a raster is downsampled before clustering
    pub max_raster_pixels: u32,
}

impl RepositoryConfig {
    /// Build a config pointed at `swatch_dir`, with every other field at its default
    pub fn new(swatch_dir: impl Into<PathBuf>) -> Self {
        Self {
            swatch_dir: swatch_dir.into(),
            ..Self::default()
        }
    }

    /// Set the probable-achromatic ΔE00 thresholds, clamped to `[0,10]`
    pub fn with_achromatic_thresholds(mut self, white: f64, black: f64) -> Self {
        self.achromatic_threshold_white = white.clamp(0.0, 10.0);
        self.achromatic_threshold_black = black.clamp(0.0, 10.0);
        self
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            swatch_dir: PathBuf::from("."),
            achromatic_threshold_white: 2.0,
            achromatic_threshold_black: 2.0,
            bypass_exact_on_probable_achromatic: true,
            default_search_limit: 200,
            expert_top_n: 5,
            max_raster_pixels: 220_000,
        }
    }
}
