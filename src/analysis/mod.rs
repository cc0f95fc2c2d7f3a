//! Artwork analysis orchestrator (C6)
//!
//! Runs dominant-color extraction per layer, maps each cluster to its
//! nearest swatch via the repository, then aggregates an overall summary
//! across layers.

use std::collections::HashMap;

use image::RgbaImage;

use crate::color::ColorConverter;
use crate::dominant::{self, ClusterSet};
use crate::error::SwatchResult;
use crate::repository::{MatchItem, SearchMode, SwatchRepository};

/// Per-layer weight applied when folding into [`SummaryColor::weighted_score`]
const WEIGHT_VISIBLE: f64 = 1.0;
const WEIGHT_HIDDEN: f64 = 0.4;
const WEIGHT_OPACITY_ZERO: f64 = 0.2;
const WEIGHT_CLIPPED: f64 = 0.7;

/// One rendered layer as supplied by the external layer producer, or the
/// single synthetic layer built for a raw raster input.
pub struct LayerInput {
    /// Display name
    pub name: String,
    /// Decoded RGBA pixels
    pub rgba: RgbaImage,
    /// Whether the layer is currently shown
    pub visible: bool,
    /// Whether the layer's opacity is exactly zero
    pub opacity_zero: bool,
    /// Whether the layer is clipped to another layer
    pub clipped: bool,
    /// Optional caller-supplied preview thumbnail, passed through unchanged
    pub preview_data_url: Option<String>,
}

impl LayerInput {
    /// Build the single synthetic layer used for a plain raster (non-layered) input.
    pub fn from_raster(filename: &str, rgba: RgbaImage) -> Self {
        Self {
            name: format!("Image {filename}"),
            rgba,
            visible: true,
            opacity_zero: false,
            clipped: false,
            preview_data_url: None,
        }
    }

    fn weight(&self) -> f64 {
        let mut weight = if self.visible { WEIGHT_VISIBLE } else { WEIGHT_HIDDEN };
        if self.opacity_zero {
            weight *= WEIGHT_OPACITY_ZERO;
        }
        if self.clipped {
            weight *= WEIGHT_CLIPPED;
        }
        weight
    }
}

/// Request parameters for [`analyze_layers`]
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions<'a> {
    /// Clustering noise dial, `[0,100]`
    pub noise: f64,
    /// Whether to drop a dominant border background cluster
    pub ignore_background: bool,
    /// Explicit cap on clusters per layer; `None` means auto
    pub max_colors: Option<u32>,
    /// Cap on the aggregated summary's length; `None` means unlimited
    pub summary_max_colors: Option<usize>,
    /// Palette to match against
    pub book_id: &'a str,
    /// Normal or expert ranking/detail
    pub mode: SearchMode,
    /// Pixel count above which a layer is downsampled before clustering
    pub max_raster_pixels: u32,
}

/// Internal per-cluster bookkeeping, never returned to callers. Carries the
/// cluster's aggregation weight alongside its match so summary accumulation
/// can see it without smuggling a mutable weight field onto the public type.
#[derive(Debug, Clone)]
struct InternalCluster {
    detected_hex: String,
    weight: f64,
    matched: MatchItem,
    delta_e: Option<f64>,
    reliability: Option<&'static str>,
}

/// One detected-color-to-swatch mapping within a single layer
#[derive(Debug, Clone)]
pub struct PublicColor {
    /// Hex of the detected cluster centroid
    pub detected_hex: String,
    /// Nearest swatch match
    pub matched: MatchItem,
    /// CIEDE2000 distance, expert mode only
    pub delta_e: Option<f64>,
    /// Reliability label, expert mode only
    pub reliability: Option<&'static str>,
}

impl From<&InternalCluster> for PublicColor {
    fn from(cluster: &InternalCluster) -> Self {
        Self {
            detected_hex: cluster.detected_hex.clone(),
            matched: cluster.matched.clone(),
            delta_e: cluster.delta_e,
            reliability: cluster.reliability,
        }
    }
}

/// One layer's analysis result
#[derive(Debug, Clone)]
pub struct LayerResult {
    /// Layer display name
    pub layer_name: String,
    /// Whether the layer is currently shown
    pub visible: bool,
    /// Pass-through preview thumbnail, if supplied
    pub preview_data_url: Option<String>,
    /// Detected colors, heaviest first
    pub colors: Vec<PublicColor>,
    /// `"visible"`, `"hidden"`, `"opacity_zero"`, or `"clipped"`, first match wins
    pub layer_state: &'static str,
}

fn layer_state(layer: &LayerInput) -> &'static str {
    if layer.opacity_zero {
        "opacity_zero"
    } else if layer.clipped {
        "clipped"
    } else if !layer.visible {
        "hidden"
    } else {
        "visible"
    }
}

/// One aggregated swatch across all analyzed layers
#[derive(Debug, Clone)]
pub struct SummaryColor {
    /// Owning book id
    pub book_id: Option<String>,
    /// Swatch name
    pub name: String,
    /// Matched hex
    pub hex: String,
    /// Number of distinct layers this swatch appeared in
    pub occurrences: usize,
    /// Ordered, deduplicated layer names it appeared in
    pub layers: Vec<String>,
    /// Expert mode only: sum of per-layer weights
    pub weighted_score: Option<f64>,
}

/// Full result of [`analyze_layers`]
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    /// Number of layers analyzed
    pub layer_count: usize,
    /// Per-layer detail, in input order
    pub layers: Vec<LayerResult>,
    /// Cross-layer aggregation, sorted by `(-weighted_score, -occurrences, name)`
    pub summary_colors: Vec<SummaryColor>,
}

fn analyze_one_layer(repository: &SwatchRepository, layer: &LayerInput, options: &AnalysisOptions) -> SwatchResult<Vec<InternalCluster>> {
    let clusters: ClusterSet = dominant::extract_clusters(
        &layer.rgba,
        options.noise,
        options.ignore_background,
        options.max_colors,
        options.max_raster_pixels,
    );

    let mut colors = Vec::with_capacity(clusters.len());

    for cluster in &clusters {
        let detected_hex = ColorConverter::rgb_to_hex(cluster.rgb);
        let matched = repository.nearest_in_book(cluster.rgb, options.book_id, options.mode)?;

        let (delta_e, reliability) = match &matched.expert {
            Some(expert) => (Some(expert.delta_e), Some(expert.reliability)),
            None => (None, None),
        };

        colors.push(InternalCluster {
            detected_hex,
            weight: cluster.weight,
            matched,
            delta_e,
            reliability,
        });
    }

    Ok(colors)
}

/// Run C5 + nearest-match lookup over every layer and aggregate a summary.
pub fn analyze_layers(repository: &SwatchRepository, layers: &[LayerInput], options: &AnalysisOptions) -> SwatchResult<AnalysisResult> {
    struct SummaryAccum {
        book_id: Option<String>,
        name: String,
        hex: String,
        layers: Vec<String>,
        weighted_score: f64,
    }

    let mut layer_results = Vec::with_capacity(layers.len());
    let mut summary: HashMap<(String, String, String), SummaryAccum> = HashMap::new();

    for layer in layers {
        let clusters = analyze_one_layer(repository, layer, options)?;
        let layer_weight = layer.weight();

        for cluster in &clusters {
            let book_id = cluster.matched.book_id.clone().unwrap_or_default();
            let key = (book_id.clone(), cluster.matched.name.clone(), cluster.matched.hex.clone());
            let entry = summary.entry(key).or_insert_with(|| SummaryAccum {
                book_id: cluster.matched.book_id.clone(),
                name: cluster.matched.name.clone(),
                hex: cluster.matched.hex.clone(),
                layers: Vec::new(),
                weighted_score: 0.0,
            });
            if !entry.layers.contains(&layer.name) {
                entry.layers.push(layer.name.clone());
            }
            if options.mode.is_expert() {
                entry.weighted_score += layer_weight;
            }
        }

        layer_results.push(LayerResult {
            layer_name: layer.name.clone(),
            visible: layer.visible,
            preview_data_url: layer.preview_data_url.clone(),
            colors: clusters.iter().map(PublicColor::from).collect(),
            layer_state: layer_state(layer),
        });
    }

    let mut summary_colors: Vec<SummaryColor> = summary
        .into_values()
        .map(|accum| SummaryColor {
            book_id: accum.book_id,
            name: accum.name,
            hex: accum.hex,
            occurrences: accum.layers.len(),
            layers: accum.layers,
            weighted_score: if options.mode.is_expert() { Some(accum.weighted_score) } else { None },
        })
        .collect();

    summary_colors.sort_by(|a, b| {
        let score_a = a.weighted_score.unwrap_or(0.0);
        let score_b = b.weighted_score.unwrap_or(0.0);
        score_b
            .partial_cmp(&score_a)
            .unwrap()
            .then_with(|| b.occurrences.cmp(&a.occurrences))
            .then_with(|| a.name.cmp(&b.name))
    });

    if let Some(cap) = options.summary_max_colors {
        summary_colors.truncate(cap);
    }

    Ok(AnalysisResult {
        layer_count: layers.len(),
        layers: layer_results,
        summary_colors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepositoryConfig;
    use image::Rgba;
    use std::io::Write as _;
    use std::path::PathBuf;

    fn write_minimal_acb(dir: &std::path::Path, filename: &str) {
        let mut data = Vec::new();
        data.extend_from_slice(b"8BCB");
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        for _ in 0..4 {
            data.extend_from_slice(&0u32.to_be_bytes());
        }
        data.extend_from_slice(&2u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());

        let names = ["Red", "Green"];
        let rgbs: [[u8; 3]; 2] = [[255, 0, 0], [0, 255, 0]];
        for (name, rgb) in names.iter().zip(rgbs.iter()) {
            let utf16: Vec<u16> = name.encode_utf16().collect();
            data.extend_from_slice(&(utf16.len() as u32).to_be_bytes());
            for unit in utf16 {
                data.extend_from_slice(&unit.to_be_bytes());
            }
            data.extend_from_slice(b"C00001");
            data.extend_from_slice(rgb);
        }

        let mut file = std::fs::File::create(dir.join(filename)).unwrap();
        file.write_all(&data).unwrap();
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("swatchmatch-analysis-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn single_layer_maps_cluster_to_nearest_swatch() {
        let dir = temp_dir("single");
        write_minimal_acb(&dir, "sample.acb");
        let repository = SwatchRepository::new(RepositoryConfig::new(&dir));
        let books = repository.list_books(SearchMode::Normal).unwrap();
        let book_id = books[0].id.clone();

        let mut image = RgbaImage::new(2, 2);
        for y in 0..2 {
            for x in 0..2 {
                image.put_pixel(x, y, Rgba([250, 5, 5, 255]));
            }
        }
        let layer = LayerInput::from_raster("test.png", image);

        let options = AnalysisOptions {
            noise: 50.0,
            ignore_background: false,
            max_colors: None,
            summary_max_colors: None,
            book_id: &book_id,
            mode: SearchMode::Normal,
            max_raster_pixels: 220_000,
        };

        let result = analyze_layers(&repository, &[layer], &options).unwrap();
        assert_eq!(result.layer_count, 1);
        assert_eq!(result.layers[0].colors[0].matched.name, "Red");
        assert_eq!(result.summary_colors.len(), 1);
        assert_eq!(result.summary_colors[0].occurrences, 1);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn expert_mode_weights_hidden_layers_lower() {
        let dir = temp_dir("weighted");
        write_minimal_acb(&dir, "sample.acb");
        let repository = SwatchRepository::new(RepositoryConfig::new(&dir));
        let books = repository.list_books(SearchMode::Normal).unwrap();
        let book_id = books[0].id.clone();

        let mut red_image = RgbaImage::new(2, 2);
        for y in 0..2 {
            for x in 0..2 {
                red_image.put_pixel(x, y, Rgba([250, 5, 5, 255]));
            }
        }
        let visible_layer = LayerInput {
            name: "Visible".into(),
            rgba: red_image.clone(),
            visible: true,
            opacity_zero: false,
            clipped: false,
            preview_data_url: None,
        };
        let hidden_layer = LayerInput {
            name: "Hidden".into(),
            rgba: red_image,
            visible: false,
            opacity_zero: false,
            clipped: false,
            preview_data_url: None,
        };

        let options = AnalysisOptions {
            noise: 50.0,
            ignore_background: false,
            max_colors: None,
            summary_max_colors: None,
            book_id: &book_id,
            mode: SearchMode::Expert,
            max_raster_pixels: 220_000,
        };

        let result = analyze_layers(&repository, &[visible_layer, hidden_layer], &options).unwrap();
        assert_eq!(result.summary_colors.len(), 1);
        assert_eq!(result.summary_colors[0].occurrences, 2);
        let expected = WEIGHT_VISIBLE + WEIGHT_HIDDEN;
        assert!((result.summary_colors[0].weighted_score.unwrap() - expected).abs() < 1e-9);
        std::fs::remove_dir_all(&dir).ok();
    }
}
