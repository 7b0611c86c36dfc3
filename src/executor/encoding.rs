//! Byte-stream decoding for the runtime boundary.
//!
//! The delegated runtime's transport does not guarantee an output encoding:
//! the environment listing in particular arrives as UTF-16LE on the host
//! platform the runtime ships with. Assuming a fixed encoding silently
//! corrupts output instead of failing loudly, so decoding tries a
//! prioritized table of encodings and reports which one was used.

/// Encodings attempted by [`decode`], in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf16Le,
    Utf16Be,
    Utf8,
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TextEncoding::Utf16Le => write!(f, "utf-16le"),
            TextEncoding::Utf16Be => write!(f, "utf-16be"),
            TextEncoding::Utf8 => write!(f, "utf-8"),
        }
    }
}

/// The fallback order is a data table, not inline conditional logic.
pub const DECODE_ORDER: [TextEncoding; 3] = [
    TextEncoding::Utf16Le,
    TextEncoding::Utf16Be,
    TextEncoding::Utf8,
];

/// Decode `bytes`, attempting each entry of [`DECODE_ORDER`] in turn and
/// returning the text together with the encoding that produced it. Total:
/// when nothing matches strictly, the bytes are decoded as UTF-8 with
/// replacement characters.
pub fn decode(bytes: &[u8]) -> (String, TextEncoding) {
    for encoding in DECODE_ORDER {
        if let Some(text) = try_decode(bytes, encoding) {
            return (text, encoding);
        }
    }
    (
        String::from_utf8_lossy(bytes).into_owned(),
        TextEncoding::Utf8,
    )
}

fn try_decode(bytes: &[u8], encoding: TextEncoding) -> Option<String> {
    match encoding {
        TextEncoding::Utf16Le => {
            if !looks_utf16(bytes, false) {
                return None;
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok().map(strip_bom)
        }
        TextEncoding::Utf16Be => {
            if !looks_utf16(bytes, true) {
                return None;
            }
            let units: Vec<u16> = bytes
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok().map(strip_bom)
        }
        TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
    }
}

/// UTF-16 evidence: a byte-order mark, or at least half of the high bytes
/// being NUL (true for any mostly-Latin text, and what distinguishes real
/// UTF-16 from UTF-8 that merely has an even length).
fn looks_utf16(bytes: &[u8], big_endian: bool) -> bool {
    if bytes.len() < 2 || bytes.len() % 2 != 0 {
        return false;
    }
    let bom = if big_endian { [0xFE, 0xFF] } else { [0xFF, 0xFE] };
    if bytes[..2] == bom {
        return true;
    }
    let high_parity = if big_endian { 0 } else { 1 };
    let nul_high_bytes = bytes
        .iter()
        .enumerate()
        .filter(|(i, b)| i % 2 == high_parity && **b == 0)
        .count();
    nul_high_bytes * 2 >= bytes.len() / 2
}

fn strip_bom(text: String) -> String {
    text.strip_prefix('\u{feff}')
        .map(str::to_string)
        .unwrap_or(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str, bom: bool) -> Vec<u8> {
        let mut bytes = Vec::new();
        if bom {
            bytes.extend_from_slice(&[0xFF, 0xFE]);
        }
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn detects_utf16le_with_bom() {
        let (text, encoding) = decode(&utf16le("Ubuntu-22.04\ndocker-desktop\n", true));
        assert_eq!(encoding, TextEncoding::Utf16Le);
        assert_eq!(text, "Ubuntu-22.04\ndocker-desktop\n");
    }

    #[test]
    fn detects_utf16le_without_bom() {
        let (text, encoding) = decode(&utf16le("Ubuntu", false));
        assert_eq!(encoding, TextEncoding::Utf16Le);
        assert_eq!(text, "Ubuntu");
    }

    #[test]
    fn detects_utf16be() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "hello".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        let (text, encoding) = decode(&bytes);
        assert_eq!(encoding, TextEncoding::Utf16Be);
        assert_eq!(text, "hello");
    }

    #[test]
    fn plain_utf8_is_not_mistaken_for_utf16() {
        let (text, encoding) = decode(b"PLAY RECAP\nrouter1 : ok=2\n");
        assert_eq!(encoding, TextEncoding::Utf8);
        assert_eq!(text, "PLAY RECAP\nrouter1 : ok=2\n");
    }

    #[test]
    fn invalid_bytes_fall_back_to_lossy_utf8() {
        let (text, encoding) = decode(&[0x66, 0x6F, 0xFF, 0x6F]);
        assert_eq!(encoding, TextEncoding::Utf8);
        assert!(text.contains('\u{fffd}'));
    }

    #[test]
    fn fallback_table_order() {
        assert_eq!(
            DECODE_ORDER,
            [
                TextEncoding::Utf16Le,
                TextEncoding::Utf16Be,
                TextEncoding::Utf8
            ]
        );
    }
}
