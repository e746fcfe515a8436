//! PNG chart rendering for the validation reports
//!
//! Charts are drawn on an in-memory raster, PNG-encoded, base64-encoded and
//! URL-escaped so they can be inlined as `data:image/png;base64,...` URIs.

pub mod bar;
pub mod canvas;
pub mod pie;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::Rgb;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::model::report::TallyField;
use crate::model::ChartColors;
use canvas::Canvas;

pub use bar::{render_bar_chart, BarChartAttrs, ChartBar};
pub use pie::{render_pie_chart, PieChartAttrs};

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ChartError {
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Invalid chart attributes: {0}")]
    InvalidAttributes(String),

    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] image::ImageError),
}

/// Parse a `#RRGGBB` color
pub fn parse_color(hex: &str) -> Result<Rgb<u8>, ChartError> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ChartError::InvalidColor(hex.to_string()));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&digits[i..i + 2], 16)
            .map_err(|_| ChartError::InvalidColor(hex.to_string()))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Configured color for a plotted count
pub fn series_color(colors: &ChartColors, field: TallyField) -> &str {
    match field {
        TallyField::Valid => &colors.valid,
        TallyField::Invalid => &colors.invalid,
        TallyField::NoSoftware | TallyField::Total => &colors.no_software,
    }
}

/// Unreserved characters and `/` pass through unescaped
const PAYLOAD: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

fn escape_payload(b64: &str) -> String {
    utf8_percent_encode(b64, PAYLOAD).to_string()
}

/// PNG-encode, then base64 and URL-escape the canvas
pub fn encode_canvas(canvas: &Canvas) -> Result<String, ChartError> {
    let png = canvas.to_png()?;
    Ok(escape_payload(&STANDARD.encode(png)))
}

/// Wrap an encoded chart in a data URI
pub fn data_uri(encoded: &str) -> String {
    format!("data:image/png;base64,{}", encoded)
}

#[cfg(test)]
pub(crate) fn decode_chart(encoded: &str) -> Vec<u8> {
    let b64 = percent_encoding::percent_decode_str(encoded)
        .decode_utf8()
        .unwrap();
    STANDARD.decode(b64.as_bytes()).unwrap()
}
