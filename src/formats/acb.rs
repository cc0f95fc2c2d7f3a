//! ACB (Adobe Color Book) parser
//!
//! Big-endian, signature `8BCB`, four Pascal UTF-16BE header strings, then
//! `color_count` fixed-layout records whose components vary by colorspace.

use super::reader::ByteReader;
use crate::book::{Book, BookFormat, ColorRecord};
use crate::color::ColorConverter;
use crate::error::{SwatchError, SwatchResult};

/// Maximum length this implementation treats as a plausible next-record
/// name length when disambiguating the optional 8-byte trailer.
const MAX_PLAUSIBLE_NAME_LENGTH: u32 = 32768;

/// Parse an ACB file's raw bytes into a [`Book`].
pub fn parse_acb_bytes(data: &[u8], source: &str) -> SwatchResult<Book> {
    let mut reader = ByteReader::new(data, source);

    let signature = reader.read_bytes(4, "signature")?;
    if signature != b"8BCB" {
        return Err(SwatchError::Parse {
            source: source.to_string(),
            offset: 0,
            context: format!("invalid signature {signature:?}, expected b\"8BCB\""),
        });
    }

    let version = reader.read_u16("version")? as u32;
    let book_id = reader.read_u16("book id")?;
    let title = reader.read_pascal_utf16be_string("title")?;
    let prefix = reader.read_pascal_utf16be_string("prefix")?;
    let suffix = reader.read_pascal_utf16be_string("suffix")?;
    let description = reader.read_pascal_utf16be_string("description")?;

    let color_count = reader.read_u16("color count")?;
    let _page_size = reader.read_u16("page size")?;
    let _page_selector_offset = reader.read_u16("page selector offset")?;
    let colorspace = reader.read_u16("colorspace/library identifier")?;
    let colorspace_name = match colorspace {
        0 => "RGB".to_string(),
        2 => "CMYK".to_string(),
        7 => "Lab".to_string(),
        other => return Err(SwatchError::UnsupportedColorspace(source.to_string(), other)),
    };

    let mut colors = Vec::with_capacity(color_count as usize);
    for index in 0..color_count {
        let record_context = format!("record {}/{}", index + 1, color_count);
        let name = reader.read_pascal_utf16be_string(&format!("{record_context} name"))?;
        if name.is_empty() {
            // Placeholder record: no code, no components, no trailer to consume.
            continue;
        }

        let code_raw = reader.read_bytes(6, &format!("{record_context} color code"))?;
        let code = String::from_utf8_lossy(code_raw).trim().to_string();

        let rgb = match colorspace {
            0 => {
                let bytes = reader.read_bytes(3, &format!("{record_context} RGB components"))?;
                (bytes[0], bytes[1], bytes[2])
            }
            2 => {
                let bytes = reader.read_bytes(4, &format!("{record_context} CMYK components"))?;
                ColorConverter::cmyk_bytes_to_rgb(bytes[0], bytes[1], bytes[2], bytes[3])
            }
            7 => {
                let bytes = reader.read_bytes(3, &format!("{record_context} Lab components"))?;
                ColorConverter::lab_bytes_to_rgb(bytes[0], bytes[1], bytes[2])
            }
            _ => unreachable!("colorspace validated when the header was read"),
        };

        let remaining_records = color_count - index - 1;
        consume_optional_spot_identifier(&mut reader, remaining_records);

        colors.push(ColorRecord {
            name,
            code,
            hex: ColorConverter::rgb_to_hex(rgb),
        });
    }

    Ok(Book {
        format: BookFormat::Acb,
        version,
        book_id: Some(book_id),
        title,
        prefix,
        suffix,
        description,
        color_count,
        colorspace_name,
        colors,
        filename: String::new(),
    })
}

/// An 8-byte optional "spot/process identifier" may follow the color bytes
/// of a non-final record. Disambiguate by peeking ahead: if the next `u32`
/// already looks like a plausible next-record name length, no trailer is
/// present; if the `u32` eight bytes further on looks plausible instead,
/// consume the trailer. Otherwise leave the stream untouched.
fn consume_optional_spot_identifier(reader: &mut ByteReader<'_>, remaining_records: u16) {
    if remaining_records == 0 {
        return;
    }

    if looks_like_next_record(reader, 0) {
        return;
    }

    if reader.remaining() >= 8 && looks_like_next_record(reader, 8) {
        let _ = reader.read_bytes(8, "optional spot/process identifier");
    }
}

fn looks_like_next_record(reader: &ByteReader<'_>, offset: usize) -> bool {
    let name_length = match reader.peek_u32(offset) {
        Some(value) => value,
        None => return false,
    };

    let remaining_after_offset = reader.remaining() - offset;
    if name_length == 0 {
        return remaining_after_offset >= 4;
    }

    if name_length > MAX_PLAUSIBLE_NAME_LENGTH {
        return false;
    }

    let required = 4 + (name_length as usize) * 2;
    required <= remaining_after_offset
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16be_pascal(s: &str) -> Vec<u8> {
        let units: Vec<u16> = s.encode_utf16().collect();
        let mut out = (units.len() as u32).to_be_bytes().to_vec();
        for unit in units {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        out
    }

    fn minimal_rgb_book(records: &[(&str, &str, [u8; 3])]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"8BCB");
        data.extend_from_slice(&1u16.to_be_bytes()); // version
        data.extend_from_slice(&1u16.to_be_bytes()); // book id
        data.extend_from_slice(&utf16be_pascal("Title"));
        data.extend_from_slice(&utf16be_pascal(""));
        data.extend_from_slice(&utf16be_pascal(""));
        data.extend_from_slice(&utf16be_pascal(""));
        data.extend_from_slice(&(records.len() as u16).to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes()); // page size
        data.extend_from_slice(&0u16.to_be_bytes()); // page selector offset
        data.extend_from_slice(&0u16.to_be_bytes()); // colorspace RGB
        for (name, code, rgb) in records {
            data.extend_from_slice(&utf16be_pascal(name));
            if name.is_empty() {
                continue;
            }
            let mut code_bytes = [0u8; 6];
            for (i, b) in code.as_bytes().iter().take(6).enumerate() {
                code_bytes[i] = *b;
            }
            data.extend_from_slice(&code_bytes);
            data.extend_from_slice(rgb);
        }
        data
    }

    #[test]
    fn minimal_acb_skips_empty_name_record() {
        let data = minimal_rgb_book(&[
            ("", "", [0, 0, 0]),
            ("PANTONE 186 C", "C0186 ", [0xE4, 0x00, 0x2B]),
        ]);
        let book = parse_acb_bytes(&data, "<memory>").unwrap();
        assert_eq!(book.color_count, 2);
        assert_eq!(book.len(), 1);
        assert_eq!(book.colors[0].name, "PANTONE 186 C");
        assert_eq!(book.colors[0].code, "C0186");
        assert_eq!(book.colors[0].hex, "#E4002B");
    }

    #[test]
    fn invalid_signature_is_rejected() {
        let mut data = minimal_rgb_book(&[]);
        data[0] = b'X';
        assert!(parse_acb_bytes(&data, "<memory>").is_err());
    }

    #[test]
    fn unsupported_colorspace_is_rejected() {
        let mut data = Vec::new();
        data.extend_from_slice(b"8BCB");
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        data.extend_from_slice(&utf16be_pascal(""));
        data.extend_from_slice(&utf16be_pascal(""));
        data.extend_from_slice(&utf16be_pascal(""));
        data.extend_from_slice(&utf16be_pascal(""));
        data.extend_from_slice(&0u16.to_be_bytes()); // color count
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&0u16.to_be_bytes());
        data.extend_from_slice(&3u16.to_be_bytes()); // unsupported colorspace
        assert!(parse_acb_bytes(&data, "<memory>").is_err());
    }
}
