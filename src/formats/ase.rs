//! ASE (Adobe Swatch Exchange) parser
//!
//! Block-based: signature `ASEF`, version, block count, then that many
//! `{type, length, payload}` blocks parsed independently of one another.

use std::collections::HashSet;

use super::reader::ByteReader;
use crate::book::{Book, BookFormat, ColorRecord};
use crate::color::ColorConverter;
use crate::error::{SwatchError, SwatchResult};

const BLOCK_GROUP_START: u16 = 0xC001;
const BLOCK_GROUP_END: u16 = 0xC002;
const BLOCK_COLOR: u16 = 0x0001;

/// Parse an ASE file's raw bytes into a [`Book`].
pub fn parse_ase_bytes(data: &[u8], source: &str) -> SwatchResult<Book> {
    let mut reader = ByteReader::new(data, source);

    let signature = reader.read_bytes(4, "signature")?;
    if signature != b"ASEF" {
        return Err(SwatchError::Parse {
            source: source.to_string(),
            offset: 0,
            context: format!("invalid signature {signature:?}, expected b\"ASEF\""),
        });
    }

    let major = reader.read_u16("version major")?;
    let minor = reader.read_u16("version minor")?;
    let block_count = reader.read_u32("block count")?;

    let mut colors = Vec::new();
    let mut models_seen: HashSet<String> = HashSet::new();
    let mut group_stack: Vec<String> = Vec::new();

    for block_index in 0..block_count {
        let block_type = reader.read_u16(&format!("block {block_index} type"))?;
        let block_length = reader.read_u32(&format!("block {block_index} length"))? as usize;
        let payload = reader.read_bytes(block_length, &format!("block {block_index} payload"))?;
        let mut block_reader = ByteReader::new(payload, format!("{source} block {block_index}"));

        match block_type {
            BLOCK_GROUP_START => {
                let group_name = block_reader.read_ase_string("group name")?;
                if !group_name.is_empty() {
                    group_stack.push(group_name);
                }
            }
            BLOCK_GROUP_END => {
                group_stack.pop();
            }
            BLOCK_COLOR => {
                let color_name = block_reader.read_ase_string("color name")?;
                if color_name.is_empty() {
                    continue;
                }

                let model_raw = block_reader.read_bytes(4, "color model")?;
                let model_key = String::from_utf8_lossy(model_raw).trim().to_ascii_uppercase();
                models_seen.insert(model_key.clone());

                let rgb = read_ase_rgb(&mut block_reader, &model_key, source, block_index)?;
                let color_type = if block_reader.remaining() >= 2 {
                    block_reader.read_u16("color type")?
                } else {
                    2
                };
                let code = format_color_code(&model_key, color_type);

                let display_name = match group_stack.last() {
                    Some(group) => format!("{color_name} [{group}]"),
                    None => color_name,
                };

                colors.push(ColorRecord {
                    name: display_name,
                    code,
                    hex: ColorConverter::rgb_to_hex(rgb),
                });
            }
            _ => {}
        }
    }

    let colorspace_name = if models_seen.len() > 1 {
        "Mixed".to_string()
    } else {
        models_seen
            .into_iter()
            .next()
            .unwrap_or_else(|| "Unknown".to_string())
    };

    Ok(Book {
        format: BookFormat::Ase,
        version: major as u32 * 100 + minor as u32,
        book_id: None,
        title: String::new(),
        prefix: String::new(),
        suffix: String::new(),
        description: format!("ASE {major}.{minor}"),
        color_count: colors.len() as u16,
        colorspace_name,
        colors,
        filename: String::new(),
    })
}

fn read_ase_rgb(
    reader: &mut ByteReader<'_>,
    model_key: &str,
    source: &str,
    block_index: u32,
) -> SwatchResult<(u8, u8, u8)> {
    match model_key {
        "RGB" => {
            let r = reader.read_f32("RGB r")?;
            let g = reader.read_f32("RGB g")?;
            let b = reader.read_f32("RGB b")?;
            let channel = |v: f32| (v as f64 * 255.0).round().clamp(0.0, 255.0) as u8;
            Ok((channel(r), channel(g), channel(b)))
        }
        "CMYK" => {
            let c = reader.read_f32("CMYK c")? as f64;
            let m = reader.read_f32("CMYK m")? as f64;
            let y = reader.read_f32("CMYK y")? as f64;
            let k = reader.read_f32("CMYK k")? as f64;
            Ok(ColorConverter::cmyk_to_rgb(c, m, y, k))
        }
        "LAB" => {
            let l = reader.read_f32("Lab l")? as f64;
            let a = reader.read_f32("Lab a")? as f64;
            let b = reader.read_f32("Lab b")? as f64;
            Ok(ColorConverter::lab_to_rgb(crate::color::Lab::new(l, a, b)))
        }
        "GRAY" => {
            let gray = reader.read_f32("Gray")? as f64;
            Ok(ColorConverter::gray_to_rgb(gray))
        }
        other => Err(SwatchError::Parse {
            source: source.to_string(),
            offset: reader.pos(),
            context: format!("unsupported ASE model '{other}' in block {block_index}"),
        }),
    }
}

fn format_color_code(model_key: &str, color_type: u16) -> String {
    let type_name = match color_type {
        0 => "global".to_string(),
        1 => "spot".to_string(),
        2 => "process".to_string(),
        other => other.to_string(),
    };
    format!("{model_key}/{type_name}")
}
