//! Color utility functions shared across the workbench.
//!
//! Annotation colors are stored as the hex strings the color picker produces;
//! rendering needs them as RGB bytes.

/// Color used when an annotation's stored color cannot be parsed.
pub const FALLBACK_RGB: [u8; 3] = [255, 0, 0];

/// Parse `#RGB` or `#RRGGBB` (leading `#` optional, case-insensitive).
///
/// # Returns
/// RGB bytes, or `None` if the string is not a hex color
pub fn parse_hex_color(color: &str) -> Option<[u8; 3]> {
    let hex = color.trim().strip_prefix('#').unwrap_or(color.trim());
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    match hex.len() {
        3 => {
            let mut rgb = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                rgb[i] = v * 17;
            }
            Some(rgb)
        }
        6 => {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            Some([channel(0)?, channel(2)?, channel(4)?])
        }
        _ => None,
    }
}

/// Parse a color, falling back to [`FALLBACK_RGB`].
pub fn rgb_or_fallback(color: &str) -> [u8; 3] {
    parse_hex_color(color).unwrap_or_else(|| {
        log::warn!("Unparseable annotation color '{}', using red", color);
        FALLBACK_RGB
    })
}
