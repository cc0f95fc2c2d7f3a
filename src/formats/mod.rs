//! Binary swatch-book parsers

mod acb;
mod ase;
mod reader;

pub use acb::parse_acb_bytes;
pub use ase::parse_ase_bytes;
