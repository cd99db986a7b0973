//! Shift-JIS decoding and the CDataMoji metadata/bitmap side channel.
//!
//! JWW strings are length-prefixed Shift-JIS byte runs. Decoding never
//! fails: trailing NUL padding is stripped first, then malformed byte
//! sequences are replaced with `U+FFFD` by `encoding_rs`'s WHATWG-compliant
//! Shift-JIS decoder. Bad text must never abort decoding of structural
//! data — see `spec.md` §4.2.

use encoding_rs::SHIFT_JIS;

/// Decodes a raw Shift-JIS byte run (already stripped of its length
/// prefix) to UTF-8, trimming trailing NUL padding first.
pub fn decode_sjis(bytes: &[u8]) -> String {
    let trimmed = trim_trailing_nul(bytes);
    let (decoded, _encoding, _had_errors) = SHIFT_JIS.decode(trimmed);
    decoded.into_owned()
}

fn trim_trailing_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != 0)
        .map(|pos| pos + 1)
        .unwrap_or(0);
    &bytes[..end]
}

/// The recognized CDataMoji metadata keys (`spec.md` §4.5). Any other
/// `^@`-prefixed content falls through to a plain Text entity.
pub const METADATA_KEYS: &[&str] = &[
    "printer_paper_size",
    "draw_bmp_touka",
    "view_direct2d",
    "printer_bmp_zentai",
    "printer_orientation",
    "printer_d2d_bmp",
];

pub const BITMAP_PREFIX: &str = "^@BM";
pub const METADATA_PREFIX: &str = "^@";

/// Classification of a decoded CDataMoji `content` string, per the
/// three-way dispatch in `spec.md` §4.5.
pub enum MojiContent<'a> {
    /// `^@BM` followed by `path|x|y|width|height|rotation`.
    Bitmap { params: &'a str },
    /// `^@<key>=<value>` where `key` is one of [`METADATA_KEYS`].
    Metadata { key: &'a str, value: &'a str },
    /// Anything else: an ordinary piece of drawing text.
    PlainText,
}

pub fn classify_moji_content(content: &str) -> MojiContent<'_> {
    if let Some(params) = content.strip_prefix(BITMAP_PREFIX) {
        return MojiContent::Bitmap { params };
    }
    if let Some(rest) = content.strip_prefix(METADATA_PREFIX) {
        if let Some((key, value)) = rest.split_once('=') {
            if METADATA_KEYS.contains(&key) {
                return MojiContent::Metadata { key, value };
            }
        }
    }
    MojiContent::PlainText
}

/// Parses the `path|x|y|width|height|rotation` payload of a `^@BM`
/// bitmap reference. Trailing fields may be absent and default to `0`;
/// an empty `params` string yields an empty path and all-zero numerics
/// (`spec.md` §8 boundary case).
pub struct BitmapRef {
    pub path: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
}

pub fn parse_bitmap_ref(params: &str) -> BitmapRef {
    let mut fields = params.split('|');
    let path = fields.next().unwrap_or("").to_string();
    let x = next_f64(&mut fields);
    let y = next_f64(&mut fields);
    let width = next_f64(&mut fields);
    let height = next_f64(&mut fields);
    let rotation = next_f64(&mut fields);
    BitmapRef {
        path,
        x,
        y,
        width,
        height,
        rotation,
    }
}

fn next_f64<'a>(fields: &mut impl Iterator<Item = &'a str>) -> f64 {
    fields
        .next()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_round_trips() {
        assert_eq!(decode_sjis(b"hello"), "hello");
    }

    #[test]
    fn trailing_nul_is_stripped() {
        assert_eq!(decode_sjis(b"hi\0\0\0"), "hi");
    }

    #[test]
    fn half_width_katakana_decodes() {
        // 0xB1 is half-width katakana "ｱ" (U+FF71) in Shift-JIS.
        let decoded = decode_sjis(&[0xB1]);
        assert_eq!(decoded, "\u{FF71}");
    }

    #[test]
    fn invalid_byte_is_replaced_not_fatal() {
        // 0x81 alone (a lead byte with no valid trail byte) must decode to
        // the replacement character rather than panicking or erroring.
        let decoded = decode_sjis(&[0x81, 0x20]);
        assert!(decoded.contains('\u{FFFD}'));
    }

    #[test]
    fn classify_bitmap_with_no_params() {
        match classify_moji_content("^@BM") {
            MojiContent::Bitmap { params } => assert_eq!(params, ""),
            _ => panic!("expected Bitmap"),
        }
        let bmp = parse_bitmap_ref("");
        assert_eq!(bmp.path, "");
        assert_eq!(bmp.x, 0.0);
        assert_eq!(bmp.rotation, 0.0);
    }

    #[test]
    fn classify_bitmap_with_params() {
        match classify_moji_content("^@BMimg/a.png|1|2|3|4|5") {
            MojiContent::Bitmap { params } => {
                let bmp = parse_bitmap_ref(params);
                assert_eq!(bmp.path, "img/a.png");
                assert_eq!(bmp.x, 1.0);
                assert_eq!(bmp.y, 2.0);
                assert_eq!(bmp.width, 3.0);
                assert_eq!(bmp.height, 4.0);
                assert_eq!(bmp.rotation, 5.0);
            }
            _ => panic!("expected Bitmap"),
        }
    }

    #[test]
    fn classify_known_metadata_key() {
        match classify_moji_content("^@printer_orientation=landscape") {
            MojiContent::Metadata { key, value } => {
                assert_eq!(key, "printer_orientation");
                assert_eq!(value, "landscape");
            }
            _ => panic!("expected Metadata"),
        }
    }

    #[test]
    fn unknown_metadata_key_falls_through_to_text() {
        assert!(matches!(
            classify_moji_content("^@some_unknown_key=value"),
            MojiContent::PlainText
        ));
    }

    #[test]
    fn plain_text_falls_through() {
        assert!(matches!(
            classify_moji_content("hello world"),
            MojiContent::PlainText
        ));
    }
}
