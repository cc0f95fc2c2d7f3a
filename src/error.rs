//! Error types for the swatchmatch core engine

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum SwatchError {
    /// Binary parse failure in an ACB/ASE file, location-tagged
    #[error("{source}: parse error at offset {offset} while reading {context}")]
    Parse {
        /// Originating file path or `<memory>`
        source: String,
        /// Byte offset into the input where the failure occurred
        offset: usize,
        /// What was being read (field/record name)
        context: String,
    },

    /// Requested book id does not exist in the catalog
    #[error("book not found: {0}")]
    BookNotFound(String),

    /// Swatch directory is missing or not a directory
    #[error("swatch directory not found: {0}")]
    DirectoryNotFound(std::path::PathBuf),

    /// A color query string could not be parsed
    #[error("invalid color input: {0}")]
    InvalidColorInput(String),

    /// Nearest-match requested against a book with zero colors
    #[error("book has no colors: {0}")]
    EmptyBook(String),

    /// File extension is neither `.acb` nor `.ase`
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// ACB colorspace byte outside {0 (RGB), 2 (CMYK), 7 (Lab)}
    #[error("unsupported colorspace {1} in {0}")]
    UnsupportedColorspace(String, u16),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Raster decode error from the `image` crate
    #[error("image decode error: {0}")]
    ImageError(#[from] image::ImageError),
}

/// Result type alias for core operations
pub type SwatchResult<T> = Result<T, SwatchError>;

impl From<serde_json::Error> for SwatchError {
    fn from(err: serde_json::Error) -> Self {
        SwatchError::Parse {
            source: "<expert-index>".into(),
            offset: 0,
            context: err.to_string(),
        }
    }
}
