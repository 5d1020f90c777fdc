//! URI component encoding/decoding.
//!
//! Follows RFC 3986 component rules: the unreserved set passes through,
//! everything else is percent-escaped UTF-8 byte-wise. Decoding is
//! tolerant because the input comes from an untrusted renderer: malformed
//! percent sequences are left as literal characters rather than failing.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Everything outside the RFC 3986 unreserved set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn encode_uri_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

pub fn decode_uri_component(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}
