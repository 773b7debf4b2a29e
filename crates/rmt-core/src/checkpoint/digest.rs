//! MD5 helpers: content digest for checkpoints, hex etags for parts.

use base64::prelude::{Engine as _, BASE64_STANDARD};
use md5::{Digest, Md5};

/// Base64 of the MD5 of `data` (the `Content-MD5` header form).
pub fn content_md5(data: &[u8]) -> String {
    BASE64_STANDARD.encode(Md5::digest(data))
}

/// Uppercase hex MD5 of `data`, the etag form object stores use for simple parts.
pub fn md5_hex(data: &[u8]) -> String {
    hex::encode_upper(Md5::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_md5_of_empty_input() {
        assert_eq!(content_md5(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
    }

    #[test]
    fn md5_hex_known_values() {
        assert_eq!(md5_hex(b""), "D41D8CD98F00B204E9800998ECF8427E");
        assert_eq!(md5_hex(b"hello\n"), "B1946AC92492D2347C6235B4D2611184");
    }
}
