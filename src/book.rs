//! Parsed swatch-book data model shared by the ACB and ASE parsers

/// Which binary format a [`Book`] was decoded from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BookFormat {
    /// Adobe Color Book (`8BCB`)
    Acb,
    /// Adobe Swatch Exchange (`ASEF`)
    Ase,
}

impl BookFormat {
    /// Upper-case label used in `list_books` output (`"ACB"` / `"ASE"`)
    pub fn label(self) -> &'static str {
        match self {
            BookFormat::Acb => "ACB",
            BookFormat::Ase => "ASE",
        }
    }

    /// Determine the format from a file extension (case-insensitive, with or
    /// without the leading dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "acb" => Some(BookFormat::Acb),
            "ase" => Some(BookFormat::Ase),
            _ => None,
        }
    }
}

/// A single named entry in a [`Book`]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ColorRecord {
    /// Display name, non-empty (empty-name records are skipped during parse)
    pub name: String,
    /// Six-byte Latin-1 token for ACB, `"<MODEL>/<type>"` for ASE; may be empty
    pub code: String,
    /// `#RRGGBB`, uppercase
    pub hex: String,
}

/// A parsed swatch collection, decoded from either an ACB or ASE file
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Book {
    /// Source format
    pub format: BookFormat,
    /// ACB: the file's declared version. ASE: `major*100 + minor`.
    pub version: u32,
    /// ACB only; `None` for ASE books
    pub book_id: Option<u16>,
    /// Book title (ACB only; empty for ASE)
    pub title: String,
    /// Swatch name prefix (ACB only; empty for ASE)
    pub prefix: String,
    /// Swatch name suffix (ACB only; empty for ASE)
    pub suffix: String,
    /// Free-text description
    pub description: String,
    /// `color_count` as declared by the header; may exceed `colors.len()`
    /// because of skipped placeholder records
    pub color_count: u16,
    /// Declared colorspace label: `"RGB"`, `"CMYK"`, `"Lab"`, `"Mixed"`, etc.
    pub colorspace_name: String,
    /// Ordered list of colors; ordering is display order
    pub colors: Vec<ColorRecord>,
    /// Set by the repository once the file is located on disk
    #[serde(skip)]
    pub filename: String,
}

impl Book {
    /// Number of colors actually retained (use this for display, never
    /// `color_count`, which may count skipped placeholders)
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the book has no displayable colors at all
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_label_matches_extension() {
        assert_eq!(BookFormat::from_extension(".acb"), Some(BookFormat::Acb));
        assert_eq!(BookFormat::from_extension("ASE"), Some(BookFormat::Ase));
        assert_eq!(BookFormat::from_extension("txt"), None);
        assert_eq!(BookFormat::Acb.label(), "ACB");
    }
}
