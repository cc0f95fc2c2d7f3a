//! Swatch-book catalog, cache, and nearest-match search (C4)
//!
//! Owns the only mutable shared state in the engine: the directory listing,
//! the per-book parse cache, and the in-process usage scores. All three live
//! behind their own `parking_lot::RwLock`, shared-read/exclusive-write.

mod cache;
mod expert_index;
mod usage;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::book::{Book, BookFormat, ColorRecord};
use crate::color::{ColorConverter, Lab};
use crate::config::RepositoryConfig;
use crate::error::{SwatchError, SwatchResult};
use crate::formats::{parse_acb_bytes, parse_ase_bytes};

pub use cache::{CacheEntry, CacheIdentity};
pub use expert_index::{BookMetadata, DuplicateFamily, DuplicateMember, ExpertColorEntry, ExpertIndex};
pub use usage::UsageScore;

const DEFAULT_PALETTE_FILENAME: &str = "pantone solid coated-v4.acb";
const CACHE_SUBDIR: &str = ".swatchmatch-cache";

/// Whether a search/detail request wants the richer expert-mode fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Plain hex/name/code results
    Normal,
    /// Adds `delta_e`, `reliability`, `score`, duplicate families, usage ranking
    Expert,
}

impl SearchMode {
    pub(crate) fn is_expert(self) -> bool {
        matches!(self, SearchMode::Expert)
    }
}

/// One row of [`SwatchRepository::list_books`]
#[derive(Debug, Clone)]
pub struct BookSummary {
    /// Catalog-stable slug id
    pub id: String,
    /// File name on disk
    pub filename: String,
    /// File stem, used as a display title
    pub title: String,
    /// Source format
    pub format: BookFormat,
    /// `None` if the file failed to parse
    pub color_count: Option<u16>,
    /// `None` if the file failed to parse
    pub colorspace: Option<String>,
    /// Parse failure message, if any
    pub error: Option<String>,
    /// Expert-mode only: number of duplicate-color families
    pub duplicate_family_count: Option<usize>,
}

/// Full detail view of one book
#[derive(Debug, Clone)]
pub struct BookDetails {
    /// Catalog-stable slug id
    pub id: String,
    /// File stem, used as a display title
    pub title: String,
    /// File name on disk
    pub filename: String,
    /// Source format
    pub format: BookFormat,
    /// Declared colorspace label
    pub colorspace: String,
    /// Every retained color record, in display order
    pub colors: Vec<ColorRecord>,
    /// Present only in expert mode
    pub metadata: Option<BookMetadata>,
    /// Present only in expert mode
    pub families: Option<Vec<DuplicateFamily>>,
}

/// Expert-mode-only fields attached to a [`MatchItem`]
#[derive(Debug, Clone)]
pub struct ExpertMatchDetails {
    /// CIEDE2000 distance between the query and this swatch
    pub delta_e: f64,
    /// `reliability_label(delta_e)`
    pub reliability: &'static str,
    /// `delta_e + rarity_penalty - usage_bonus`
    pub score: f64,
    /// Short human-readable explanation
    pub reason: String,
}

/// One matched or candidate swatch
#[derive(Debug, Clone)]
pub struct MatchItem {
    /// `None` only for the forced-achromatic synthetic match
    pub book_id: Option<String>,
    /// Title of the owning book (or a fixed label for forced-achromatic)
    pub book_title: String,
    /// File name of the owning book
    pub filename: String,
    /// Swatch name
    pub name: String,
    /// Swatch code, if non-empty
    pub code: Option<String>,
    /// `#RRGGBB`
    pub hex: String,
    /// `search_by_hex`: squared sRGB channel distance. `nearest_in_book`: ΔE00.
    pub distance: f64,
    /// Present only in expert mode
    pub expert: Option<ExpertMatchDetails>,
}

/// Result of [`SwatchRepository::search_by_hex`]
#[derive(Debug, Clone)]
pub struct SearchHexResult {
    /// Normalized, uppercase hex of the query
    pub query: String,
    /// Human-readable scope label
    pub scope: String,
    /// `Some(id)` when scoped to exactly one book
    pub scope_book_id: Option<String>,
    /// Count of exact hex matches found
    pub exact_count: usize,
    /// Exact hex matches, capped at the configured limit
    pub exact_matches: Vec<MatchItem>,
    /// Nearest matches sorted by score ascending, capped at the configured limit
    pub nearest: Vec<MatchItem>,
    /// The parsed query color
    pub input_rgb: crate::color::Rgb8,
}

fn forced_achromatic_name(hex: &str) -> Option<&'static str> {
    match hex {
        "#FFFFFF" => Some("BLANCO"),
        "#000000" => Some("NEGRO"),
        _ => None,
    }
}

fn forced_achromatic_item(hex: &str, book_id: Option<String>, book_title: String, filename: String) -> Option<MatchItem> {
    let name = forced_achromatic_name(hex)?;
    Some(MatchItem {
        book_id,
        book_title,
        filename,
        name: name.to_string(),
        code: None,
        hex: hex.to_string(),
        distance: 0.0,
        expert: None,
    })
}

fn rgb_distance2(a: crate::color::Rgb8, b: crate::color::Rgb8) -> f64 {
    let dr = a.0 as f64 - b.0 as f64;
    let dg = a.1 as f64 - b.1 as f64;
    let db = a.2 as f64 - b.2 as f64;
    dr * dr + dg * dg + db * db
}

/// Catalog + cache + usage scores for a directory of `.acb`/`.ase` files
pub struct SwatchRepository {
    config: RepositoryConfig,
    catalog: RwLock<Vec<(String, PathBuf)>>,
    cache: RwLock<std::collections::HashMap<String, CacheEntry>>,
    usage: RwLock<UsageScore>,
}

impl SwatchRepository {
    /// Open a repository rooted at `config.swatch_dir`. The directory is not
    /// scanned until the first request.
    pub fn new(config: RepositoryConfig) -> Self {
        Self {
            config,
            catalog: RwLock::new(Vec::new()),
            cache: RwLock::new(std::collections::HashMap::new()),
            usage: RwLock::new(UsageScore::new()),
        }
    }

    /// Current configuration
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    fn refresh_catalog(&self) -> SwatchResult<()> {
        let dir = &self.config.swatch_dir;
        if !dir.exists() {
            return Err(SwatchError::DirectoryNotFound(dir.clone()));
        }
        if !dir.is_dir() {
            return Err(SwatchError::DirectoryNotFound(dir.clone()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| BookFormat::from_extension(ext).is_some())
                    .unwrap_or(false)
            })
            .collect();
        files.sort_by_key(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.to_ascii_lowercase())
                .unwrap_or_default()
        });

        let mut used_ids = HashSet::new();
        let mut catalog = Vec::with_capacity(files.len());
        for path in files {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let ext = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
            let seed = format!("{stem}-{ext}");
            let id = cache::unique_slug(&seed, &mut used_ids);
            catalog.push((id, path));
        }

        log::debug!("catalog refresh found {} swatch book(s) in {}", catalog.len(), dir.display());
        *self.catalog.write() = catalog;
        Ok(())
    }

    fn resolve_scope(&self, book_id: Option<&str>) -> SwatchResult<Vec<(String, PathBuf)>> {
        let catalog = self.catalog.read();
        match book_id {
            Some(id) => catalog
                .iter()
                .find(|(entry_id, _)| entry_id == id)
                .map(|(id, path)| vec![(id.clone(), path.clone())])
                .ok_or_else(|| SwatchError::BookNotFound(id.to_string())),
            None => Ok(catalog.clone()),
        }
    }

    fn parse_book(path: &Path) -> SwatchResult<Book> {
        let bytes = std::fs::read(path)?;
        let source = path.to_string_lossy().to_string();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let mut book = match extension.as_str() {
            "acb" => parse_acb_bytes(&bytes, &source)?,
            "ase" => parse_ase_bytes(&bytes, &source)?,
            other => return Err(SwatchError::UnsupportedFormat(other.to_string())),
        };
        book.filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        Ok(book)
    }

    fn load_cached(&self, id: &str, path: &Path) -> SwatchResult<Arc<Book>> {
        let identity = CacheIdentity::compute(path)?;

        if let Some(entry) = self.cache.read().get(id) {
            if entry.identity == identity {
                log::debug!("cache hit for book '{id}'");
                return entry
                    .outcome
                    .clone()
                    .map_err(|msg| SwatchError::Parse { source: path.display().to_string(), offset: 0, context: msg });
            }
        }

        let mut cache = self.cache.write();
        if let Some(entry) = cache.get(id) {
            if entry.identity == identity {
                log::debug!("cache hit for book '{id}' (post-upgrade re-check)");
                return entry
                    .outcome
                    .clone()
                    .map_err(|msg| SwatchError::Parse { source: path.display().to_string(), offset: 0, context: msg });
            }
        }

        log::debug!("cache miss for book '{id}', parsing {}", path.display());
        let outcome = Self::parse_book(path).map(Arc::new).map_err(|err| err.to_string());
        if let Err(msg) = &outcome {
            log::warn!("failed to parse book '{id}' ({}): {msg}", path.display());
        }
        let result = outcome.clone();
        cache.insert(
            id.to_string(),
            CacheEntry {
                identity,
                outcome,
                expert_index: None,
            },
        );
        drop(cache);

        result.map_err(|msg| SwatchError::Parse { source: path.display().to_string(), offset: 0, context: msg })
    }

    fn expert_index_path(&self, id: &str) -> PathBuf {
        self.config.swatch_dir.join(CACHE_SUBDIR).join(format!("{id}.json"))
    }

    fn get_or_build_expert_index(&self, id: &str, path: &Path, book: &Book) -> SwatchResult<Arc<ExpertIndex>> {
        let identity = CacheIdentity::compute(path)?;

        if let Some(entry) = self.cache.read().get(id) {
            if let Some(index) = &entry.expert_index {
                if index.matches(&identity) {
                    return Ok(Arc::clone(index));
                }
            }
        }

        let index_path = self.expert_index_path(id);
        let loaded = expert_index::load_if_matching(&index_path, &identity);
        let index = match loaded {
            Some(index) => {
                log::debug!("expert index cache hit for book '{id}'");
                index
            }
            None => {
                log::debug!("rebuilding expert index for book '{id}'");
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                let metadata = expert_index::infer_metadata(stem, book);
                let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
                let built = expert_index::build(id, filename, &identity, book, metadata);
                expert_index::write_atomic(&index_path, &built)?;
                built
            }
        };

        let index = Arc::new(index);
        if let Some(entry) = self.cache.write().get_mut(id) {
            entry.expert_index = Some(Arc::clone(&index));
        }
        Ok(index)
    }

    /// List every `.acb`/`.ase` file in the swatch directory. Per-file parse
    /// errors are reported inline and never abort the listing.
    pub fn list_books(&self, mode: SearchMode) -> SwatchResult<Vec<BookSummary>> {
        self.refresh_catalog()?;
        let catalog = self.catalog.read().clone();

        let mut summaries = Vec::with_capacity(catalog.len());
        for (id, path) in catalog {
            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            let title = path.file_stem().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            let format = BookFormat::from_extension(path.extension().and_then(|e| e.to_str()).unwrap_or_default())
                .unwrap_or(BookFormat::Acb);

            match self.load_cached(&id, &path) {
                Ok(book) => {
                    let duplicate_family_count = if mode.is_expert() {
                        self.get_or_build_expert_index(&id, &path, &book)
                            .ok()
                            .map(|index| index.families.len())
                    } else {
                        None
                    };
                    summaries.push(BookSummary {
                        id,
                        filename,
                        title,
                        format,
                        color_count: Some(book.color_count),
                        colorspace: Some(book.colorspace_name.clone()),
                        error: None,
                        duplicate_family_count,
                    });
                }
                Err(err) => summaries.push(BookSummary {
                    id,
                    filename,
                    title,
                    format,
                    color_count: None,
                    colorspace: None,
                    error: Some(err.to_string()),
                    duplicate_family_count: None,
                }),
            }
        }
        Ok(summaries)
    }

    /// Full color list for one book, with families/metadata in expert mode.
    pub fn get_book_details(&self, id: &str, mode: SearchMode) -> SwatchResult<BookDetails> {
        self.refresh_catalog()?;
        let (id, path) = self
            .resolve_scope(Some(id))?
            .into_iter()
            .next()
            .expect("resolve_scope(Some) returns exactly one entry or errors");

        let book = self.load_cached(&id, &path)?;
        let format = BookFormat::from_extension(path.extension().and_then(|e| e.to_str()).unwrap_or_default())
            .unwrap_or(BookFormat::Acb);

        let (metadata, families) = if mode.is_expert() {
            let index = self.get_or_build_expert_index(&id, &path, &book)?;
            (Some(index.metadata.clone()), Some(index.families.clone()))
        } else {
            (None, None)
        };

        Ok(BookDetails {
            id: id.clone(),
            title: path.file_stem().and_then(|n| n.to_str()).unwrap_or_default().to_string(),
            filename: path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string(),
            format,
            colorspace: book.colorspace_name.clone(),
            colors: book.colors.clone(),
            metadata,
            families,
        })
    }

    /// The file literally named `pantone solid coated-v4.acb`, else the
    /// first `.acb`, else the first catalog entry, else `None`.
    pub fn get_default_palette_id(&self) -> SwatchResult<Option<String>> {
        self.refresh_catalog()?;
        let catalog = self.catalog.read();

        if let Some((id, _)) = catalog
            .iter()
            .find(|(_, path)| path.file_name().and_then(|n| n.to_str()).map(|n| n.eq_ignore_ascii_case(DEFAULT_PALETTE_FILENAME)).unwrap_or(false))
        {
            return Ok(Some(id.clone()));
        }

        if let Some((id, _)) = catalog
            .iter()
            .find(|(_, path)| path.extension().and_then(|e| e.to_str()).map(|e| e.eq_ignore_ascii_case("acb")).unwrap_or(false))
        {
            return Ok(Some(id.clone()));
        }

        Ok(catalog.first().map(|(id, _)| id.clone()))
    }

    /// The display title (file stem) for `id`
    pub fn get_palette_title(&self, id: &str) -> SwatchResult<String> {
        self.refresh_catalog()?;
        let (_, path) = self
            .resolve_scope(Some(id))?
            .into_iter()
            .next()
            .expect("resolve_scope(Some) returns exactly one entry or errors");
        Ok(path.file_stem().and_then(|n| n.to_str()).unwrap_or_default().to_string())
    }

    /// Case-insensitive substring search over name/code/hex, paginated.
    pub fn search_book_text(&self, id: &str, query: &str, offset: usize, limit: usize, _mode: SearchMode) -> SwatchResult<Vec<ColorRecord>> {
        self.refresh_catalog()?;
        let (id, path) = self
            .resolve_scope(Some(id))?
            .into_iter()
            .next()
            .expect("resolve_scope(Some) returns exactly one entry or errors");
        let book = self.load_cached(&id, &path)?;

        let needle = query.to_ascii_lowercase();
        let matches: Vec<ColorRecord> = book
            .colors
            .iter()
            .filter(|color| {
                color.name.to_ascii_lowercase().contains(&needle)
                    || color.code.to_ascii_lowercase().contains(&needle)
                    || color.hex.to_ascii_lowercase().contains(&needle)
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(matches)
    }

    /// Search a HEX/RGB/HSL/CMYK query across one or all books.
    pub fn search_by_hex(&self, query: &str, book_id: Option<&str>, mode: SearchMode) -> SwatchResult<SearchHexResult> {
        self.refresh_catalog()?;

        let target_rgb = ColorConverter::hex_to_rgb(query).or_else(|_| crate::color::parse_color_input(query))?;
        let target_hex = ColorConverter::rgb_to_hex(target_rgb);
        let target_lab_d50 = ColorConverter::rgb_to_lab_d50(target_rgb);

        let scoped = self.resolve_scope(book_id)?;
        let scope = if scoped.len() == 1 {
            scoped[0].1.file_stem().and_then(|n| n.to_str()).unwrap_or_default().to_string()
        } else {
            format!("Todas las paletas ({})", scoped.len())
        };
        let scope_book_id = if scoped.len() == 1 { Some(scoped[0].0.clone()) } else { None };

        if let Some(item) = forced_achromatic_item(
            &target_hex,
            scope_book_id.clone(),
            scope.clone(),
            scoped.first().map(|(_, p)| p.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string()).unwrap_or_default(),
        ) {
            return Ok(SearchHexResult {
                query: target_hex,
                scope,
                scope_book_id,
                exact_count: 1,
                exact_matches: vec![item.clone()],
                nearest: vec![item],
                input_rgb: target_rgb,
            });
        }

        if mode.is_expert() {
            let delta_white = target_lab_d50.delta_e_ciede2000(ColorConverter::rgb_to_lab_d50((255, 255, 255)));
            let delta_black = target_lab_d50.delta_e_ciede2000(ColorConverter::rgb_to_lab_d50((0, 0, 0)));
            let (delta_e, label) = if delta_white <= self.config.achromatic_threshold_white {
                (delta_white, "BLANCO probable")
            } else if delta_black <= self.config.achromatic_threshold_black {
                (delta_black, "NEGRO probable")
            } else {
                (f64::MAX, "")
            };

            if self.config.bypass_exact_on_probable_achromatic && !label.is_empty() {
                let reliability = crate::color::reliability_label(delta_e);
                let item = MatchItem {
                    book_id: scope_book_id.clone(),
                    book_title: scope.clone(),
                    filename: String::new(),
                    name: label.to_string(),
                    code: None,
                    hex: target_hex.clone(),
                    distance: delta_e,
                    expert: Some(ExpertMatchDetails {
                        delta_e,
                        reliability,
                        score: delta_e,
                        reason: format!("Acromatico probable ({reliability})"),
                    }),
                };
                return Ok(SearchHexResult {
                    query: target_hex,
                    scope,
                    scope_book_id,
                    exact_count: 0,
                    exact_matches: Vec::new(),
                    nearest: vec![item],
                    input_rgb: target_rgb,
                });
            }
        }

        let mut exact_matches = Vec::new();
        let mut ranked: Vec<(f64, MatchItem)> = Vec::new();
        let usage = self.usage.read();

        for (id, path) in &scoped {
            let Ok(book) = self.load_cached(id, path) else {
                continue;
            };
            let book_title = path.file_stem().and_then(|n| n.to_str()).unwrap_or_default().to_string();
            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();

            for color in &book.colors {
                let Ok(swatch_rgb) = ColorConverter::hex_to_rgb(&color.hex) else {
                    continue;
                };
                let delta_e = target_lab_d50.delta_e_ciede2000(ColorConverter::rgb_to_lab_d50(swatch_rgb));
                let rarity_penalty = if color.code.is_empty() { 0.2 } else { 0.0 };
                let usage_bonus = usage.bonus(id, &color.name);
                let score = if mode.is_expert() { delta_e + rarity_penalty - usage_bonus } else { delta_e };

                let item = MatchItem {
                    book_id: Some(id.clone()),
                    book_title: book_title.clone(),
                    filename: filename.clone(),
                    name: color.name.clone(),
                    code: non_empty(&color.code),
                    hex: color.hex.clone(),
                    distance: rgb_distance2(target_rgb, swatch_rgb),
                    expert: None,
                };

                if color.hex.eq_ignore_ascii_case(&target_hex) {
                    exact_matches.push(item.clone());
                }
                ranked.push((score, item));
            }
        }
        drop(usage);

        ranked.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let limit = self.config.default_search_limit;
        exact_matches.truncate(limit);

        let mut nearest: Vec<MatchItem> = ranked.into_iter().take(limit).map(|(_, item)| item).collect();

        if mode.is_expert() {
            let mut usage = self.usage.write();
            for item in nearest.iter_mut().take(self.config.expert_top_n) {
                let delta_e = target_lab_d50.delta_e_ciede2000(ColorConverter::rgb_to_lab_d50(ColorConverter::hex_to_rgb(&item.hex).unwrap_or((0, 0, 0))));
                let reliability = crate::color::reliability_label(delta_e);
                let rarity_penalty = if item.code.is_none() { 0.2 } else { 0.0 };
                if let Some(book_id) = &item.book_id {
                    let usage_bonus = usage.bonus(book_id, &item.name);
                    item.expert = Some(ExpertMatchDetails {
                        delta_e,
                        reliability,
                        score: delta_e + rarity_penalty - usage_bonus,
                        reason: format!("Coincidencia {reliability} (dE00={delta_e:.2})"),
                    });
                    usage.record_top5(book_id, std::iter::once(item.name.as_str()));
                }
            }
        }

        Ok(SearchHexResult {
            query: target_hex,
            scope,
            scope_book_id,
            exact_count: exact_matches.len(),
            exact_matches,
            nearest,
            input_rgb: target_rgb,
        })
    }

    /// Find the single nearest swatch in one book.
    pub fn nearest_in_book(&self, rgb: crate::color::Rgb8, book_id: &str, mode: SearchMode) -> SwatchResult<MatchItem> {
        self.refresh_catalog()?;
        let (id, path) = self
            .resolve_scope(Some(book_id))?
            .into_iter()
            .next()
            .expect("resolve_scope(Some) returns exactly one entry or errors");

        let book_title = path.file_stem().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_string();
        let target_hex = ColorConverter::rgb_to_hex(rgb);

        if let Some(item) = forced_achromatic_item(&target_hex, Some(id.clone()), book_title.clone(), filename.clone()) {
            return Ok(item);
        }

        let book = self.load_cached(&id, &path)?;
        if book.is_empty() {
            return Err(SwatchError::EmptyBook(id));
        }

        let target_lab_d50 = ColorConverter::rgb_to_lab_d50(rgb);
        let mut best: Option<(f64, &ColorRecord)> = None;
        for color in &book.colors {
            let Ok(swatch_rgb) = ColorConverter::hex_to_rgb(&color.hex) else {
                continue;
            };
            let delta_e = target_lab_d50.delta_e_ciede2000(ColorConverter::rgb_to_lab_d50(swatch_rgb));
            match &best {
                Some((best_delta, _)) if *best_delta <= delta_e => {}
                _ => best = Some((delta_e, color)),
            }
        }

        let (delta_e, color) = best.expect("non-empty book always yields a nearest match");
        let expert = if mode.is_expert() {
            let reliability = crate::color::reliability_label(delta_e);
            let rarity_penalty = if color.code.is_empty() { 0.2 } else { 0.0 };
            let usage_bonus = self.usage.read().bonus(&id, &color.name);
            Some(ExpertMatchDetails {
                delta_e,
                reliability,
                score: delta_e + rarity_penalty - usage_bonus,
                reason: format!("Coincidencia {reliability} (dE00={delta_e:.2})"),
            })
        } else {
            None
        };

        Ok(MatchItem {
            book_id: Some(id),
            book_title,
            filename,
            name: color.name.clone(),
            code: non_empty(&color.code),
            hex: color.hex.clone(),
            distance: delta_e,
            expert,
        })
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn _assert_lab_helper(_lab: Lab) {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_minimal_acb(dir: &Path, filename: &str) {
        let mut data = Vec::new();
        data.extend_from_slice(b"8BCB");
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        for _ in 0..4 {
            data.extend_from_slice(&0u32.to_be_bytes());
        }
        data.extend_from_slice(&1u16.to_be_bytes()); // color count
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes()); // RGB colorspace

        let name: Vec<u16> = "Red".encode_utf16().collect();
        data.extend_from_slice(&(name.len() as u32).to_be_bytes());
        for unit in name {
            data.extend_from_slice(&unit.to_be_bytes());
        }
        data.extend_from_slice(b"R0001");
        data.push(0);
        data.extend_from_slice(&[255, 0, 0]);

        let mut file = std::fs::File::create(dir.join(filename)).unwrap();
        file.write_all(&data).unwrap();
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("swatchmatch-test-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn list_books_reports_one_entry() {
        let dir = temp_dir("list");
        write_minimal_acb(&dir, "sample.acb");
        let repo = SwatchRepository::new(RepositoryConfig::new(&dir));
        let books = repo.list_books(SearchMode::Normal).unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].filename, "sample.acb");
        assert_eq!(books[0].color_count, Some(1));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn default_palette_prefers_named_file() {
        let dir = temp_dir("default");
        write_minimal_acb(&dir, "other.acb");
        write_minimal_acb(&dir, "pantone solid coated-v4.acb");
        let repo = SwatchRepository::new(RepositoryConfig::new(&dir));
        let id = repo.get_default_palette_id().unwrap().unwrap();
        assert_eq!(repo.get_palette_title(&id).unwrap(), "pantone solid coated-v4");
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn forced_achromatic_search_returns_blanco() {
        let dir = temp_dir("forced");
        write_minimal_acb(&dir, "sample.acb");
        let repo = SwatchRepository::new(RepositoryConfig::new(&dir));
        let result = repo.search_by_hex("#FFFFFF", None, SearchMode::Normal).unwrap();
        assert_eq!(result.exact_count, 1);
        assert_eq!(result.nearest[0].name, "BLANCO");
        assert_eq!(result.nearest[0].distance, 0.0);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn nearest_in_book_finds_closest_swatch() {
        let dir = temp_dir("nearest");
        write_minimal_acb(&dir, "sample.acb");
        let repo = SwatchRepository::new(RepositoryConfig::new(&dir));
        let books = repo.list_books(SearchMode::Normal).unwrap();
        let id = &books[0].id;
        let result = repo.nearest_in_book((250, 10, 10), id, SearchMode::Expert).unwrap();
        assert_eq!(result.name, "Red");
        assert!(result.expert.is_some());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn cache_returns_same_book_when_file_unchanged() {
        let dir = temp_dir("cache");
        write_minimal_acb(&dir, "sample.acb");
        let repo = SwatchRepository::new(RepositoryConfig::new(&dir));
        let books = repo.list_books(SearchMode::Normal).unwrap();
        let id = &books[0].id;
        let path = dir.join("sample.acb");
        let first = repo.load_cached(id, &path).unwrap();
        let second = repo.load_cached(id, &path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        std::fs::remove_dir_all(&dir).ok();
    }
}
