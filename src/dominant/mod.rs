//! Dominant-color extraction (per-layer clustering, single "noise" dial)
//!
//! Downscale, bin into a quantized histogram, greedily merge nearby bins,
//! optionally drop a border-dominated background cluster, then filter by
//! weight share.

use std::collections::HashMap;

use image::{imageops::FilterType, RgbaImage};

use crate::color::Rgb8;

/// Pixel count above which a raster is downscaled before clustering
const DEFAULT_MAX_RASTER_PIXELS: u32 = 220_000;
/// Alpha below which a pixel is treated as fully transparent and skipped
const ALPHA_CUTOFF: u8 = 16;

/// All the knobs the single `noise` dial expands into
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseProfile {
    /// `round(2 + detail*22)`, clamped to `[2,24]`
    pub auto_max_colors: u32,
    /// `similar_distance^2 * 3`, the greedy-merge threshold in squared RGB distance
    pub merge_threshold2: f64,
    /// `max(0.003, 0.24 - detail*0.232)`, the minimum cluster weight share kept
    pub min_cluster_ratio: f64,
    /// Right-shift applied to each channel before binning, `[0,3]`
    pub quant_shift: u32,
}

/// Expand the `[0,100]` noise dial into concrete clustering parameters
pub fn noise_profile(noise: f64) -> NoiseProfile {
    let n = noise.clamp(0.0, 100.0) / 100.0;
    let detail = n.powf(1.15);

    let auto_max_colors = (2.0 + detail * 22.0).round().clamp(2.0, 24.0) as u32;
    let similar_distance = (22.0 - detail * 18.0).clamp(4.0, 22.0);
    let merge_threshold2 = similar_distance * similar_distance * 3.0;
    let min_cluster_ratio = (0.24 - detail * 0.232).max(0.003);
    let quant_shift = ((1.0 - detail) * 3.0).round().clamp(0.0, 3.0) as u32;

    NoiseProfile {
        auto_max_colors,
        merge_threshold2,
        min_cluster_ratio,
        quant_shift,
    }
}

/// One dominant color and its accumulated alpha-weighted pixel weight
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cluster {
    /// Representative sRGB color
    pub rgb: Rgb8,
    /// Accumulated alpha-weighted pixel weight (not normalized)
    pub weight: f64,
}

/// An ordered list of dominant-color clusters, heaviest first
pub type ClusterSet = Vec<Cluster>;

#[derive(Default, Clone, Copy)]
struct Accum {
    w: f64,
    rw: f64,
    gw: f64,
    bw: f64,
}

impl Accum {
    fn add(&mut self, rgb: Rgb8, weight: f64) {
        self.w += weight;
        self.rw += rgb.0 as f64 * weight;
        self.gw += rgb.1 as f64 * weight;
        self.bw += rgb.2 as f64 * weight;
    }

    fn centroid(&self) -> Rgb8 {
        (
            (self.rw / self.w).round().clamp(0.0, 255.0) as u8,
            (self.gw / self.w).round().clamp(0.0, 255.0) as u8,
            (self.bw / self.w).round().clamp(0.0, 255.0) as u8,
        )
    }
}

fn rgb_distance2(a: Rgb8, b: Rgb8) -> f64 {
    let dr = a.0 as f64 - b.0 as f64;
    let dg = a.1 as f64 - b.1 as f64;
    let db = a.2 as f64 - b.2 as f64;
    dr * dr + dg * dg + db * db
}

fn downscale_if_needed(image: &RgbaImage, max_pixels: u32) -> RgbaImage {
    let (width, height) = image.dimensions();
    let pixel_count = width as u64 * height as u64;
    if pixel_count <= max_pixels as u64 {
        return image.clone();
    }

    let scale = (max_pixels as f64 / pixel_count as f64).sqrt();
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);
    image::imageops::resize(image, new_width, new_height, FilterType::Triangle)
}

/// One bin keyed by quantized (r,g,b), with main-histogram and (if on the
/// outer border) border-histogram accumulators.
fn build_histograms(
    image: &RgbaImage,
    quant_shift: u32,
) -> (HashMap<(u8, u8, u8), Accum>, HashMap<(u8, u8, u8), Accum>) {
    let (width, height) = image.dimensions();
    let mut main_hist: HashMap<(u8, u8, u8), Accum> = HashMap::new();
    let mut border_hist: HashMap<(u8, u8, u8), Accum> = HashMap::new();

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        if a < ALPHA_CUTOFF {
            continue;
        }

        let key = (r >> quant_shift, g >> quant_shift, b >> quant_shift);
        let weight = a as f64 / 255.0;
        main_hist.entry(key).or_default().add((r, g, b), weight);

        let on_border = x == 0 || y == 0 || x == width - 1 || y == height - 1;
        if on_border {
            border_hist.entry(key).or_default().add((r, g, b), weight);
        }
    }

    (main_hist, border_hist)
}

fn greedy_merge(mut clusters: Vec<Cluster>, merge_threshold2: f64) -> Vec<Cluster> {
    clusters.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap());

    let mut merged: Vec<Cluster> = Vec::new();
    for cluster in clusters {
        let existing = merged
            .iter_mut()
            .find(|candidate| rgb_distance2(candidate.rgb, cluster.rgb) <= merge_threshold2);
        match existing {
            Some(candidate) => candidate.weight += cluster.weight,
            None => merged.push(cluster),
        }
    }

    merged.sort_by(|a, b| b.weight.partial_cmp(&a.weight).unwrap());
    merged
}

/// Dominant border color (weighted centroid of the heaviest border bin) and
/// its share of total border weight
fn dominant_border_color(border_hist: &HashMap<(u8, u8, u8), Accum>) -> Option<(Rgb8, f64)> {
    let total: f64 = border_hist.values().map(|accum| accum.w).sum();
    if total <= 0.0 {
        return None;
    }

    border_hist
        .values()
        .max_by(|a, b| a.w.partial_cmp(&b.w).unwrap())
        .map(|accum| (accum.centroid(), accum.w / total))
}

/// Drop the top cluster when the image is overwhelmingly one color and that
/// color also dominates the border, per §4.5 step 7.
fn suppress_background(
    clusters: Vec<(Cluster, f64)>,
    border_hist: &HashMap<(u8, u8, u8), Accum>,
    merge_threshold2: f64,
) -> Vec<(Cluster, f64)> {
    let Some((top, top_ratio)) = clusters.first().copied() else {
        return clusters;
    };

    let Some((border_rgb, border_share)) = dominant_border_color(border_hist) else {
        return clusters;
    };

    let suppress_threshold2 = 120.0_f64.max(2.0 * merge_threshold2);
    let close_to_border = rgb_distance2(top.rgb, border_rgb) <= suppress_threshold2;

    if top_ratio >= 0.90 && border_share >= 0.80 && close_to_border {
        clusters[1..].to_vec()
    } else {
        clusters
    }
}

/// Extract the dominant-color cluster set from an RGBA raster.
///
/// `max_colors_cap` of `None` means "auto"; `Some(0)` is treated the same way.
pub fn extract_clusters(
    image: &RgbaImage,
    noise: f64,
    ignore_background: bool,
    max_colors_cap: Option<u32>,
    max_raster_pixels: u32,
) -> ClusterSet {
    let profile = noise_profile(noise);
    let max_raster_pixels = if max_raster_pixels == 0 {
        DEFAULT_MAX_RASTER_PIXELS
    } else {
        max_raster_pixels
    };

    let scaled = downscale_if_needed(image, max_raster_pixels);
    let (main_hist, border_hist) = build_histograms(&scaled, profile.quant_shift);
    if main_hist.is_empty() {
        return Vec::new();
    }

    let raw_clusters: Vec<Cluster> = main_hist
        .values()
        .map(|accum| Cluster {
            rgb: accum.centroid(),
            weight: accum.w,
        })
        .collect();

    let merged = greedy_merge(raw_clusters, profile.merge_threshold2);
    let total_weight: f64 = merged.iter().map(|c| c.weight).sum();
    if total_weight <= 0.0 {
        return Vec::new();
    }

    let mut with_ratio: Vec<(Cluster, f64)> = merged
        .into_iter()
        .map(|cluster| {
            let ratio = cluster.weight / total_weight;
            (cluster, ratio)
        })
        .collect();

    if ignore_background {
        with_ratio = suppress_background(with_ratio, &border_hist, profile.merge_threshold2);
        if with_ratio.is_empty() {
            return Vec::new();
        }
    }

    let mut filtered: Vec<Cluster> = with_ratio
        .iter()
        .filter(|(_, ratio)| *ratio >= profile.min_cluster_ratio)
        .map(|(cluster, _)| *cluster)
        .collect();

    if filtered.is_empty() {
        if let Some((first, _)) = with_ratio.first() {
            filtered.push(*first);
        }
    }

    let cap = match max_colors_cap {
        Some(0) | None => profile.auto_max_colors,
        Some(explicit) => explicit.min(profile.auto_max_colors),
    };
    filtered.truncate(cap as usize);
    filtered
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn set_pixel(image: &mut RgbaImage, x: u32, y: u32, rgba: [u8; 4]) {
        image.put_pixel(x, y, Rgba(rgba));
    }

    #[test]
    fn noise_100_auto_max_is_24() {
        assert_eq!(noise_profile(100.0).auto_max_colors, 24);
    }

    #[test]
    fn noise_monotonicity_on_auto_max_colors() {
        let low = noise_profile(10.0).auto_max_colors;
        let high = noise_profile(90.0).auto_max_colors;
        assert!(high >= low);
    }

    #[test]
    fn four_by_two_primaries_yield_three_capped_clusters() {
        let mut image = RgbaImage::new(4, 2);
        set_pixel(&mut image, 0, 0, [255, 0, 0, 255]);
        set_pixel(&mut image, 1, 0, [255, 0, 0, 255]);
        set_pixel(&mut image, 2, 0, [0, 255, 0, 255]);
        set_pixel(&mut image, 3, 0, [0, 255, 0, 255]);
        set_pixel(&mut image, 0, 1, [0, 0, 255, 255]);
        set_pixel(&mut image, 1, 1, [0, 0, 255, 255]);
        set_pixel(&mut image, 2, 1, [0, 0, 0, 0]);
        set_pixel(&mut image, 3, 1, [0, 0, 0, 0]);

        let clusters = extract_clusters(&image, 100.0, false, Some(3), 220_000);
        assert_eq!(clusters.len(), 3);
        let rgbs: Vec<Rgb8> = clusters.iter().map(|c| c.rgb).collect();
        assert!(rgbs.contains(&(255, 0, 0)));
        assert!(rgbs.contains(&(0, 255, 0)));
        assert!(rgbs.contains(&(0, 0, 255)));
    }

    #[test]
    fn near_identical_tones_merge_to_one_cluster() {
        let mut image = RgbaImage::new(6, 1);
        let tones: [[u8; 3]; 6] = [
            [220, 30, 30],
            [221, 29, 31],
            [219, 31, 29],
            [222, 30, 30],
            [220, 28, 30],
            [218, 30, 32],
        ];
        for (x, rgb) in tones.iter().enumerate() {
            set_pixel(&mut image, x as u32, 0, [rgb[0], rgb[1], rgb[2], 255]);
        }

        let clusters = extract_clusters(&image, 35.0, false, None, 220_000);
        assert_eq!(clusters.len(), 1);
        assert!(clusters[0].rgb.0 > 180);
        assert!(clusters[0].rgb.1 < 80);
        assert!(clusters[0].rgb.2 < 80);
    }

    #[test]
    fn background_suppression_drops_dominant_border_white() {
        let mut image = RgbaImage::new(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                set_pixel(&mut image, x, y, [255, 255, 255, 255]);
            }
        }
        for y in 0..3 {
            for x in 0..3 {
                set_pixel(&mut image, x, y, [255, 0, 0, 255]);
            }
        }

        let clusters = extract_clusters(&image, 10.0, true, None, 220_000);
        let hexes: Vec<Rgb8> = clusters.iter().map(|c| c.rgb).collect();
        assert!(hexes.contains(&(255, 0, 0)));
        assert!(!hexes.contains(&(255, 255, 255)));
    }

    #[test]
    fn striped_border_keeps_background_when_not_dominant() {
        let mut image = RgbaImage::new(10, 10);
        for y in 0..10 {
            for x in 0..10 {
                set_pixel(&mut image, x, y, [255, 255, 255, 255]);
            }
        }
        // Stripe half the border green so the border is not >=80% one color.
        for x in 0..10 {
            if x % 2 == 0 {
                set_pixel(&mut image, x, 0, [0, 255, 0, 255]);
                set_pixel(&mut image, x, 9, [0, 255, 0, 255]);
            }
        }
        for y in 0..10 {
            if y % 2 == 0 {
                set_pixel(&mut image, 0, y, [0, 255, 0, 255]);
                set_pixel(&mut image, 9, y, [0, 255, 0, 255]);
            }
        }
        // Interior red square, well inside the border.
        for y in 3..6 {
            for x in 3..6 {
                set_pixel(&mut image, x, y, [255, 0, 0, 255]);
            }
        }

        let clusters = extract_clusters(&image, 10.0, true, None, 220_000);
        let hexes: Vec<Rgb8> = clusters.iter().map(|c| c.rgb).collect();
        assert!(hexes.contains(&(255, 255, 255)));
    }
}
