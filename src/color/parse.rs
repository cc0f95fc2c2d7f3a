//! Parsing of `#hex` / `rgb()` / `hsl()` / `cmyk()` color query strings

use super::{ColorConverter, Rgb8};
use crate::error::{SwatchError, SwatchResult};

/// Parse a user-supplied color query into an RGB triple.
///
/// Accepts `#RGB`/`#RRGGBB`, a bare hex string, `rgb(r,g,b)`, `hsl(h,s%,l%)`,
/// and `cmyk(c%,m%,y%,k%)`. Whitespace-tolerant, case-insensitive prefixes.
pub fn parse_color_input(value: &str) -> SwatchResult<Rgb8> {
    let text = value.trim();
    if text.is_empty() {
        return Err(SwatchError::InvalidColorInput("empty color query".into()));
    }

    if text.starts_with('#') || is_bare_hex(text) {
        return ColorConverter::hex_to_rgb(text);
    }

    let lower = text.to_ascii_lowercase();
    if lower.starts_with("rgb(") && text.ends_with(')') {
        let parts = body_parts(text, 3, "rgb()")?;
        let r = parts[0].parse::<f64>().map_err(|_| invalid(text))?;
        let g = parts[1].parse::<f64>().map_err(|_| invalid(text))?;
        let b = parts[2].parse::<f64>().map_err(|_| invalid(text))?;
        return Ok((
            ColorConverter::clamp8(r),
            ColorConverter::clamp8(g),
            ColorConverter::clamp8(b),
        ));
    }

    if lower.starts_with("hsl(") && text.ends_with(')') {
        let parts = percent_body_parts(text, 3, "hsl()")?;
        let h = parts[0].parse::<f64>().map_err(|_| invalid(text))?.rem_euclid(360.0);
        let s = (parts[1].parse::<f64>().map_err(|_| invalid(text))? / 100.0).clamp(0.0, 1.0);
        let l = (parts[2].parse::<f64>().map_err(|_| invalid(text))? / 100.0).clamp(0.0, 1.0);
        return Ok(ColorConverter::hsl_to_rgb(h, s, l));
    }

    if lower.starts_with("cmyk(") && text.ends_with(')') {
        let parts = percent_body_parts(text, 4, "cmyk()")?;
        let c = (parts[0].parse::<f64>().map_err(|_| invalid(text))? / 100.0).clamp(0.0, 1.0);
        let m = (parts[1].parse::<f64>().map_err(|_| invalid(text))? / 100.0).clamp(0.0, 1.0);
        let y = (parts[2].parse::<f64>().map_err(|_| invalid(text))? / 100.0).clamp(0.0, 1.0);
        let k = (parts[3].parse::<f64>().map_err(|_| invalid(text))? / 100.0).clamp(0.0, 1.0);
        return Ok(ColorConverter::cmyk_to_rgb(c, m, y, k));
    }

    Err(invalid(text))
}

fn is_bare_hex(text: &str) -> bool {
    matches!(text.len(), 3 | 6) && text.chars().all(|c| c.is_ascii_hexdigit())
}

fn invalid(text: &str) -> SwatchError {
    SwatchError::InvalidColorInput(format!(
        "unsupported color format, use HEX, rgb(), hsl() or cmyk(): {text}"
    ))
}

fn body(text: &str, label: &str) -> SwatchResult<&str> {
    let open = text.find('(').ok_or_else(|| invalid(label))?;
    Ok(&text[open + 1..text.len() - 1])
}

fn body_parts(text: &str, expected: usize, label: &str) -> SwatchResult<Vec<String>> {
    let parts: Vec<String> = body(text, label)?
        .split(',')
        .map(|s| s.trim().to_string())
        .collect();
    if parts.len() != expected {
        return Err(invalid(text));
    }
    Ok(parts)
}

fn percent_body_parts(text: &str, expected: usize, label: &str) -> SwatchResult<Vec<String>> {
    let parts: Vec<String> = body(text, label)?
        .split(',')
        .map(|s| s.trim().trim_end_matches('%').to_string())
        .collect();
    if parts.len() != expected {
        return Err(invalid(text));
    }
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hex_parses() {
        assert_eq!(parse_color_input("#abc").unwrap(), (170, 187, 204));
    }

    #[test]
    fn bare_hex_parses() {
        assert_eq!(parse_color_input("AABBCC").unwrap(), (170, 187, 204));
    }

    #[test]
    fn rgb_function_parses() {
        assert_eq!(parse_color_input("rgb(10, 20, 30)").unwrap(), (10, 20, 30));
    }

    #[test]
    fn hsl_function_parses() {
        let (r, g, b) = parse_color_input("hsl(0, 100%, 50%)").unwrap();
        assert_eq!((r, g, b), (255, 0, 0));
    }

    #[test]
    fn cmyk_function_parses() {
        let (r, g, b) = parse_color_input("cmyk(0%, 100%, 100%, 0%)").unwrap();
        assert_eq!((r, g, b), (255, 0, 0));
    }

    #[test]
    fn every_rgb_to_hex_output_round_trips() {
        for rgb in [(0, 0, 0), (255, 255, 255), (12, 200, 77)] {
            let hex = ColorConverter::rgb_to_hex(rgb);
            assert_eq!(parse_color_input(&hex).unwrap(), rgb);
        }
    }

    #[test]
    fn unsupported_format_is_rejected() {
        assert!(parse_color_input("not-a-color").is_err());
        assert!(parse_color_input("").is_err());
    }
}
