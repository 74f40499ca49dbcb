//! MIME encoding utilities.
//!
//! Supports Base64 bodies, Quoted-Printable text, and RFC 2047 header encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt::Write as _;

/// Maximum line length for encoded bodies (RFC 2045).
const MAX_LINE_LENGTH: usize = 76;

/// Maximum length of a single RFC 2047 encoded word.
const MAX_ENCODED_WORD: usize = 75;

/// Encodes data as Base64 without line breaks.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 wrapped at 76 columns with CRLF line endings.
#[must_use]
pub fn encode_base64_lines(data: &[u8]) -> String {
    let encoded = encode_base64(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);
    for chunk in encoded.as_bytes().chunks(MAX_LINE_LENGTH) {
        // Base64 output is pure ASCII
        result.push_str(&String::from_utf8_lossy(chunk));
        result.push_str("\r\n");
    }
    result
}

/// Returns true if the text can travel as-is in a 7-bit body.
#[must_use]
pub fn is_seven_bit_safe(text: &str) -> bool {
    text.is_ascii()
        && !text.contains('\0')
        && text.lines().all(|line| line.len() <= 998)
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Line breaks in the input become hard CRLF breaks; long lines get soft breaks.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::new();

    for (index, line) in text.split('\n').enumerate() {
        if index > 0 {
            result.push_str("\r\n");
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        let bytes = line.as_bytes();
        let mut line_length = 0;

        for (i, byte) in bytes.iter().enumerate() {
            let is_last = i + 1 == bytes.len();
            let mut encoded = String::new();
            match byte {
                // Trailing whitespace must be encoded
                b' ' | b'\t' if is_last => {
                    let _ = write!(encoded, "={byte:02X}");
                }
                b'!'..=b'<' | b'>'..=b'~' | b' ' | b'\t' => encoded.push(char::from(*byte)),
                _ => {
                    let _ = write!(encoded, "={byte:02X}");
                }
            }

            // Keep room for the soft break marker
            if line_length + encoded.len() > MAX_LINE_LENGTH - 1 {
                result.push_str("=\r\n");
                line_length = 0;
            }
            line_length += encoded.len();
            result.push_str(&encoded);
        }
    }

    result
}

/// Encodes a header value using RFC 2047 `B` encoded words when needed.
///
/// Plain ASCII text without `=?` sequences is returned unchanged. Longer
/// values are split into several encoded words on character boundaries.
#[must_use]
pub fn encode_rfc2047(text: &str) -> String {
    if text.is_ascii() && !text.contains("=?") {
        return text.to_string();
    }

    // "=?utf-8?B?" + "?=" leaves this much room for base64 text
    let overhead = "=?utf-8?B??=".len();
    let max_raw = (MAX_ENCODED_WORD - overhead) / 4 * 3;

    let mut words = Vec::new();
    let mut chunk = String::new();
    for ch in text.chars() {
        if chunk.len() + ch.len_utf8() > max_raw {
            words.push(format!("=?utf-8?B?{}?=", encode_base64(chunk.as_bytes())));
            chunk.clear();
        }
        chunk.push(ch);
    }
    if !chunk.is_empty() {
        words.push(format!("=?utf-8?B?{}?=", encode_base64(chunk.as_bytes())));
    }

    words.join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base64_lines_wrap_at_76() {
        let data = vec![b'a'; 200];
        let encoded = encode_base64_lines(&data);
        for line in encoded.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(line.len() <= 76);
        }
        assert!(encoded.ends_with("\r\n"));
    }

    #[test]
    fn test_base64_empty() {
        assert_eq!(encode_base64_lines(b""), "");
    }

    #[test]
    fn test_quoted_printable_ascii_unchanged() {
        assert_eq!(encode_quoted_printable("Hello, World!"), "Hello, World!");
    }

    #[test]
    fn test_quoted_printable_non_ascii() {
        assert_eq!(encode_quoted_printable("Nota: 7,5 señor"), "Nota: 7,5 se=C3=B1or");
    }

    #[test]
    fn test_quoted_printable_hard_breaks_and_trailing_space() {
        assert_eq!(encode_quoted_printable("a \nb"), "a=20\r\nb");
    }

    #[test]
    fn test_quoted_printable_escapes_equals() {
        assert_eq!(encode_quoted_printable("a=b"), "a=3Db");
    }

    #[test]
    fn test_rfc2047_ascii_passthrough() {
        assert_eq!(encode_rfc2047("Grades"), "Grades");
    }

    #[test]
    fn test_rfc2047_non_ascii() {
        assert_eq!(encode_rfc2047("José"), "=?utf-8?B?Sm9zw6k=?=");
    }

    #[test]
    fn test_rfc2047_splits_long_values() {
        let text = "Calificación ".repeat(10);
        let encoded = encode_rfc2047(&text);
        for word in encoded.split(' ') {
            assert!(word.len() <= 75, "{word}");
            assert!(word.starts_with("=?utf-8?B?"));
        }
    }

    proptest! {
        #[test]
        fn quoted_printable_lines_stay_short(text in "\\PC{0,300}") {
            let encoded = encode_quoted_printable(&text);
            for line in encoded.split("\r\n") {
                prop_assert!(line.len() <= 76);
            }
        }
    }
}
