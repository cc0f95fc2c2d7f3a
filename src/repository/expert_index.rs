//! Per-book derived data (precomputed Lab/CMYK, duplicate families),
//! cached to disk as JSON and rebuilt when the source file changes.
//!
//! Persistence follows the registry-save pattern elsewhere in this codebase,
//! generalized to write atomically (temp file + rename) so a crash mid-write
//! can never leave a corrupt cache file behind.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::book::{Book, ColorRecord};
use crate::color::{ColorConverter, Lab};
use crate::error::SwatchResult;
use crate::repository::cache::CacheIdentity;

/// Colorspace-family / print-condition metadata inferred from a book's file
/// stem plus a few fields carried over from the parsed header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookMetadata {
    /// ACB/ASE header version
    pub version: u32,
    /// ACB book id, if present
    pub book_id: Option<u16>,
    /// `coated` | `uncoated` | `unknown`
    pub kind: String,
    /// `standard` | `extended-gamut` | `metallic` | `pastel-neon`
    pub gamut: String,
    /// The book's free-text description field
    pub notes: String,
}

/// Precomputed per-color data embedded in an [`ExpertIndex`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertColorEntry {
    /// Swatch name
    pub name: String,
    /// Six-byte code, if non-empty
    pub code: Option<String>,
    /// `#RRGGBB`
    pub hex: String,
    /// sRGB triple
    pub rgb: [u8; 3],
    /// CIELAB relative to D50
    pub lab_d50: [f64; 3],
    /// CIELAB relative to D65
    pub lab_d65: [f64; 3],
    /// Approximate CMYK fractions derived from sRGB
    pub cmyk_approx: [f64; 4],
}

/// A member of a [`DuplicateFamily`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateMember {
    /// Swatch name
    pub name: String,
    /// `#RRGGBB`
    pub hex: String,
    /// Six-byte code, if non-empty
    pub code: Option<String>,
}

/// A group of colors whose pairwise ΔE₀₀ against the family's base is ≤ 1.5
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicateFamily {
    /// Name of the lowest-index (first-encountered) member
    pub base_name: String,
    /// Number of members; always ≥ 2
    pub size: usize,
    /// Every member, including the base
    pub members: Vec<DuplicateMember>,
}

/// The derived, disk-cacheable view of a [`Book`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertIndex {
    /// Catalog id of the owning book
    pub book_id: String,
    /// Source filename
    pub filename: String,
    /// Cache-identity mtime, as seconds since the epoch
    pub mtime: u64,
    /// Cache-identity file size
    pub size: u64,
    /// Cache-identity partial hash
    pub partial_hash: String,
    /// Inferred metadata
    pub metadata: BookMetadata,
    /// Precomputed per-color data, in the book's display order
    pub colors: Vec<ExpertColorEntry>,
    /// Groups of near-duplicate colors
    pub families: Vec<DuplicateFamily>,
}

impl ExpertIndex {
    /// Whether this cached index was computed from the same file identity
    pub fn matches(&self, identity: &CacheIdentity) -> bool {
        self.size == identity.size && self.partial_hash == identity.partial_hash
    }
}

/// Infer `{type, gamut}` metadata from a book's file stem
pub fn infer_metadata(stem: &str, book: &Book) -> BookMetadata {
    let lower = stem.to_ascii_lowercase();
    let kind = if lower.contains("uncoated") {
        "uncoated"
    } else if lower.contains("coated") {
        "coated"
    } else {
        "unknown"
    };
    let gamut = if lower.contains("metallic") {
        "metallic"
    } else if lower.contains("pastel") || lower.contains("neon") {
        "pastel-neon"
    } else if lower.contains("extended") || lower.contains("gamut") {
        "extended-gamut"
    } else {
        "standard"
    };

    BookMetadata {
        version: book.version,
        book_id: book.book_id,
        kind: kind.to_string(),
        gamut: gamut.to_string(),
        notes: book.description.clone(),
    }
}

/// Pairwise ΔE₀₀ threshold under which two colors are folded into the same
/// duplicate family
const DUPLICATE_FAMILY_THRESHOLD: f64 = 1.5;

fn build_families(colors: &[ColorRecord], labs_d50: &[Lab]) -> Vec<DuplicateFamily> {
    struct Building {
        base_index: usize,
        members: Vec<usize>,
    }

    let mut families: Vec<Building> = Vec::new();
    for (index, lab) in labs_d50.iter().enumerate() {
        let home = families
            .iter_mut()
            .find(|family| labs_d50[family.base_index].delta_e_ciede2000(*lab) <= DUPLICATE_FAMILY_THRESHOLD);
        match home {
            Some(family) => family.members.push(index),
            None => families.push(Building {
                base_index: index,
                members: vec![index],
            }),
        }
    }

    families
        .into_iter()
        .filter(|family| family.members.len() >= 2)
        .map(|family| DuplicateFamily {
            base_name: colors[family.base_index].name.clone(),
            size: family.members.len(),
            members: family
                .members
                .iter()
                .map(|&index| DuplicateMember {
                    name: colors[index].name.clone(),
                    hex: colors[index].hex.clone(),
                    code: non_empty(&colors[index].code),
                })
                .collect(),
        })
        .collect()
}

fn non_empty(code: &str) -> Option<String> {
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

/// Compute a fresh [`ExpertIndex`] for `book`
pub fn build(book_id: &str, filename: &str, identity: &CacheIdentity, book: &Book, metadata: BookMetadata) -> ExpertIndex {
    let labs_d50: Vec<Lab> = book
        .colors
        .iter()
        .map(|color| {
            let rgb = ColorConverter::hex_to_rgb(&color.hex).unwrap_or((0, 0, 0));
            ColorConverter::rgb_to_lab_d50(rgb)
        })
        .collect();

    let colors = book
        .colors
        .iter()
        .zip(&labs_d50)
        .map(|(color, lab_d50)| {
            let rgb = ColorConverter::hex_to_rgb(&color.hex).unwrap_or((0, 0, 0));
            let lab_d65 = ColorConverter::rgb_to_lab_d65(rgb);
            let cmyk = ColorConverter::rgb_to_cmyk(rgb);
            ExpertColorEntry {
                name: color.name.clone(),
                code: non_empty(&color.code),
                hex: color.hex.clone(),
                rgb: [rgb.0, rgb.1, rgb.2],
                lab_d50: lab_d50.to_array(),
                lab_d65: lab_d65.to_array(),
                cmyk_approx: [cmyk.0, cmyk.1, cmyk.2, cmyk.3],
            }
        })
        .collect();

    let families = build_families(&book.colors, &labs_d50);

    let mtime_secs = identity
        .mtime
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    ExpertIndex {
        book_id: book_id.to_string(),
        filename: filename.to_string(),
        mtime: mtime_secs,
        size: identity.size,
        partial_hash: identity.partial_hash.clone(),
        metadata,
        colors,
        families,
    }
}

/// Load a cached index from `path` and validate it against `identity`.
/// Returns `None` on any read/parse/mismatch failure — a miss just triggers
/// a rebuild, it is never an error surfaced to the caller.
pub fn load_if_matching(path: &Path, identity: &CacheIdentity) -> Option<ExpertIndex> {
    let content = fs::read_to_string(path).ok()?;
    let index: ExpertIndex = serde_json::from_str(&content).ok()?;
    if index.matches(identity) {
        Some(index)
    } else {
        None
    }
}

/// Write `index` to `path` atomically: serialize to a sibling temp file,
/// then rename over the destination.
pub fn write_atomic(path: &Path, index: &ExpertIndex) -> SwatchResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let temp_path: PathBuf = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(index)?;
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::BookFormat;

    fn sample_book() -> Book {
        Book {
            format: BookFormat::Acb,
            version: 1,
            book_id: Some(1),
            title: "Title".into(),
            prefix: String::new(),
            suffix: String::new(),
            description: String::new(),
            color_count: 2,
            colorspace_name: "RGB".into(),
            colors: vec![
                ColorRecord {
                    name: "Red A".into(),
                    code: "A".into(),
                    hex: "#FF0000".into(),
                },
                ColorRecord {
                    name: "Red B".into(),
                    code: "B".into(),
                    hex: "#FE0101".into(),
                },
            ],
            filename: String::new(),
        }
    }

    #[test]
    fn near_duplicate_colors_form_one_family() {
        let book = sample_book();
        let identity = CacheIdentity {
            mtime: std::time::SystemTime::UNIX_EPOCH,
            size: 10,
            partial_hash: "deadbeef".into(),
        };
        let metadata = infer_metadata("pantone solid coated-v4", &book);
        let index = build("pantone-solid-coated-v4-acb", "book.acb", &identity, &book, metadata);
        assert_eq!(index.families.len(), 1);
        assert_eq!(index.families[0].size, 2);
        assert_eq!(index.families[0].base_name, "Red A");
    }

    #[test]
    fn metadata_infers_coated_and_standard_gamut() {
        let book = sample_book();
        let metadata = infer_metadata("PANTONE solid coated-V4", &book);
        assert_eq!(metadata.kind, "coated");
        assert_eq!(metadata.gamut, "standard");
    }
}
