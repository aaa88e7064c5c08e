//! JSON Pointer (RFC 6901) utilities.
//!
//! This crate implements the string layer of [JSON Pointer (RFC 6901)](https://tools.ietf.org/html/rfc6901):
//! escaping, parsing, formatting, validation, and a lazily-tokenized cursor
//! used when walking a pointer against a document one token at a time.
//!
//! # Example
//!
//! ```
//! use xson_json_pointer::{parse_json_pointer, format_json_pointer};
//!
//! let path = parse_json_pointer("/foo/bar");
//! assert_eq!(path, vec!["foo".to_string(), "bar".to_string()]);
//!
//! let pointer = format_json_pointer(&path);
//! assert_eq!(pointer, "/foo/bar");
//! ```

pub mod cursor;
pub use cursor::JsonPointer;

pub mod validate;
pub use validate::{validate_json_pointer, ValidationError};

/// A step in a JSON Pointer path: an object key or a decimal array index.
pub type PathStep = String;

/// A JSON Pointer path, in traversal order.
pub type Path = Vec<PathStep>;

/// Unescapes a JSON Pointer path component.
///
/// Per RFC 6901, `~1` is replaced with `/` and `~0` is replaced with `~`.
///
/// # Example
///
/// ```
/// use xson_json_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// assert_eq!(unescape_component("no-escapes"), "no-escapes");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~1 must be replaced before ~0
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a JSON Pointer path component.
///
/// Per RFC 6901, `/` is replaced with `~1` and `~` is replaced with `~0`.
///
/// # Example
///
/// ```
/// use xson_json_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a JSON Pointer string into path components.
///
/// The empty string denotes the document root and yields an empty path.
/// The leading `/` is stripped and each component is unescaped.
///
/// # Example
///
/// ```
/// use xson_json_pointer::parse_json_pointer;
///
/// assert_eq!(parse_json_pointer(""), Vec::<String>::new());
/// assert_eq!(parse_json_pointer("/"), vec![""]);
/// assert_eq!(parse_json_pointer("/a~0b/c~1d"), vec!["a~b", "c/d"]);
/// ```
pub fn parse_json_pointer(pointer: &str) -> Path {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer[1..].split('/').map(unescape_component).collect()
}

/// Format path components back into a JSON Pointer string.
///
/// Exact inverse of [`parse_json_pointer`]: the empty path yields the empty
/// string, every component is escaped and prefixed with `/`.
pub fn format_json_pointer(path: &[PathStep]) -> String {
    if path.is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(path.len() * 8);
    for step in path {
        out.push('/');
        out.push_str(&escape_component(step));
    }
    out
}

/// Returns true if the component is a valid array index: a decimal integer
/// with no sign and no leading zeros (except `"0"` itself).
pub fn is_valid_index(component: &str) -> bool {
    if component.is_empty() {
        return false;
    }
    if component.len() > 1 && component.starts_with('0') {
        return false;
    }
    component.bytes().all(|b| b.is_ascii_digit())
}
