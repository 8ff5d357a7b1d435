//! Percent-encoding for locator paths and parameter values.
//!
//! Only RFC 3986 unreserved characters pass through unescaped (plus `/ : @`
//! in paths); everything else is written as `%XX` with uppercase hex digits.
//! Decoding accepts either case. `+` is not treated as a space.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::error::{ParseError, UriResult};

/// Escaped in parameter names and values: everything but `- _ . ~`.
pub const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Escaped in paths: as [`COMPONENT`], but segment separators stay literal.
pub const PATH: &AsciiSet = &COMPONENT.remove(b'/').remove(b':').remove(b'@');

/// Percent-encode `input`, escaping every byte in `set`.
pub fn encode(input: &str, set: &'static AsciiSet) -> String {
    utf8_percent_encode(input, set).to_string()
}

/// Decode `%XX` escapes in `input`.
///
/// Fails on a truncated or non-hex escape, or when the decoded bytes are
/// not valid UTF-8.
pub fn decode(input: &str) -> UriResult<String> {
    let invalid = || ParseError::InvalidEscape {
        input: input.to_string(),
    };
    // The decoder passes malformed escapes through verbatim; reject them.
    let bytes = input.as_bytes();
    for (i, _) in input.match_indices('%') {
        let well_formed = bytes
            .get(i + 1..i + 3)
            .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(invalid());
        }
    }
    percent_decode_str(input)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreserved_passes_through() {
        assert_eq!(encode("abc-XYZ_0.9~", COMPONENT), "abc-XYZ_0.9~");
    }

    #[test]
    fn reserved_is_escaped() {
        assert_eq!(encode("a b&c=d", COMPONENT), "a%20b%26c%3Dd");
        assert_eq!(encode("a/b", COMPONENT), "a%2Fb");
        assert_eq!(encode("a/b", PATH), "a/b");
        assert_eq!(encode("a+b", COMPONENT), "a%2Bb");
    }

    #[test]
    fn multibyte_is_escaped_per_byte() {
        assert_eq!(encode("é", COMPONENT), "%C3%A9");
        assert_eq!(decode("%C3%A9").unwrap(), "é");
    }

    #[test]
    fn decode_accepts_lowercase_hex() {
        assert_eq!(decode("a%2fb").unwrap(), "a/b");
    }

    #[test]
    fn decode_keeps_plus() {
        assert_eq!(decode("a+b").unwrap(), "a+b");
    }

    #[test]
    fn reject_truncated_escape() {
        assert!(decode("abc%2").is_err());
        assert!(decode("abc%").is_err());
    }

    #[test]
    fn reject_non_hex_escape() {
        assert!(decode("%zz").is_err());
        assert!(decode("%%41").is_err());
    }

    #[test]
    fn reject_invalid_utf8() {
        assert!(decode("%FF%FE").is_err());
    }

    #[test]
    fn encoded_percent_round_trips() {
        assert_eq!(encode("100%", COMPONENT), "100%25");
        assert_eq!(decode("100%25").unwrap(), "100%");
    }
}
