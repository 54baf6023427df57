//! Reversible mapping between make/model names and directory names.
//!
//! Characters that are unsafe in a path component on any common platform are
//! percent-encoded. `%` itself is escaped too, so [`restore_component`] is an
//! exact inverse of [`sanitize_component`]. Non-ASCII characters are always
//! encoded.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use std::str::Utf8Error;

/// Bytes escaped in a path component
const UNSAFE: &AsciiSet = &CONTROLS
    .add(b'/')
    .add(b'\\')
    .add(b':')
    .add(b'*')
    .add(b'?')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'|')
    .add(b'%');

/// Turn a name into a single safe path component
pub fn sanitize_component(name: &str) -> String {
    // "." and ".." would resolve to the current or parent directory
    if name == "." || name == ".." {
        return "%2E".repeat(name.len());
    }

    utf8_percent_encode(name, UNSAFE).to_string()
}

/// Recover the original name from a sanitized path component.
///
/// Malformed escapes are kept verbatim. A bare `:` never comes out of
/// [`sanitize_component`]; it is how older macOS datasets stored `/`
/// (`Chevrolet/C:K/1994`), so it restores to `/`.
pub fn restore_component(component: &str) -> Result<String, Utf8Error> {
    let component = component.replace(':', "%2F");
    percent_decode_str(&component)
        .decode_utf8()
        .map(|name| name.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restore(component: &str) -> String {
        restore_component(component).unwrap()
    }

    #[test]
    fn test_plain_names_unchanged() {
        assert_eq!(sanitize_component("Chevrolet"), "Chevrolet");
        assert_eq!(sanitize_component("Model S"), "Model S");
        assert_eq!(restore("Model S"), "Model S");
    }

    #[test]
    fn test_slash_is_escaped() {
        assert_eq!(sanitize_component("C/K"), "C%2FK");
        assert_eq!(sanitize_component("C/V"), "C%2FV");
        assert!(!sanitize_component("a/b\\c:d").contains(['/', '\\', ':']));
    }

    #[test]
    fn test_round_trip() {
        let names = [
            "C/K",
            "RAM C/V",
            "100%",
            "Mazda3",
            "what?<>|*\"",
            "Citroën 2CV",
            "%2F",
            "tab\there",
            "a:b",
        ];
        for name in names {
            assert_eq!(restore(&sanitize_component(name)), name);
        }
    }

    #[test]
    fn test_non_ascii_is_encoded() {
        assert_eq!(sanitize_component("Citroën"), "Citro%C3%ABn");
    }

    #[test]
    fn test_dot_components() {
        assert_eq!(sanitize_component("."), "%2E");
        assert_eq!(sanitize_component(".."), "%2E%2E");
        assert_eq!(restore("%2E%2E"), "..");
        assert_eq!(sanitize_component("e.Golf"), "e.Golf");
    }

    #[test]
    fn test_malformed_escapes_kept() {
        assert_eq!(restore("50%"), "50%");
        assert_eq!(restore("%zz"), "%zz");
        assert_eq!(restore("%4"), "%4");
    }

    #[test]
    fn test_truncated_utf8_is_an_error() {
        assert!(restore_component("Citro%C3").is_err());
    }

    #[test]
    fn test_legacy_colon_restores_to_slash() {
        assert_eq!(restore("C:K"), "C/K");
        assert_eq!(restore("C:V"), "C/V");
    }
}
