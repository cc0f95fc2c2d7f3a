//! # swatchmatch-core
//!
//! Core engine for matching artwork and color queries against Adobe swatch
//! books (ACB/ASE).
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  swatchmatch-core                         │
//! ├───────────┬───────────┬───────────┬───────────────────┤
//! │  Formats  │   Color   │Repository │      Analysis       │
//! │ (ACB/ASE) │   Math    │ (catalog, │   (dominant-color    │
//! │  parsers  │ (Lab/ΔE00)│  cache)   │   + nearest-match)   │
//! └───────────┴───────────┴───────────┴───────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`formats`]: binary decoders for `.acb` and `.ase` swatch books
//! - [`book`]: the shared parsed data model ([`book::Book`], [`book::ColorRecord`])
//! - [`color`]: sRGB/Lab/CIEDE2000 conversions and color-query parsing
//! - [`dominant`]: noise-dial-driven dominant-color clustering for artwork
//! - [`repository`]: catalog refresh, on-disk cache, hex/nearest search
//! - [`analysis`]: per-layer extraction + aggregation orchestrator
//! - [`config`]: [`config::RepositoryConfig`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod book;
pub mod color;
pub mod config;
pub mod dominant;
pub mod error;
pub mod formats;
pub mod repository;

pub use analysis::{AnalysisOptions, AnalysisResult, LayerInput, LayerResult, PublicColor, SummaryColor};
pub use book::{Book, BookFormat, ColorRecord};
pub use color::{parse_color_input, reliability_label, ColorConverter, Lab, Rgb8, Xyz};
pub use config::RepositoryConfig;
pub use dominant::{extract_clusters, Cluster, ClusterSet, NoiseProfile};
pub use error::{SwatchError, SwatchResult};
pub use formats::{parse_acb_bytes, parse_ase_bytes};
pub use repository::{
    BookDetails, BookSummary, ExpertMatchDetails, MatchItem, SearchHexResult, SearchMode, SwatchRepository,
};

/// Crate version, as declared in `Cargo.toml`
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
