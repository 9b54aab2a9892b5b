use base64::{engine::general_purpose, Engine as _};

/// Encodes a string to Base64 format.
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Reverses a URL-safe Base64 string to standard Base64 format.
pub fn url_safe_base64_reverse(input: &str) -> String {
    input.replace('-', "+").replace('_', "/")
}

/// Pads a Base64 payload with `=` up to a multiple of four characters.
///
/// Existing padding is dropped first so over-padded input is normalised too.
pub fn pad_base64(input: &str) -> String {
    let mut padded = input.trim_end_matches('=').to_string();
    let remainder = padded.len() % 4;
    if remainder != 0 {
        padded.push_str(&"=".repeat(4 - remainder));
    }
    padded
}

/// Decodes a possibly unpadded Base64 payload written in either the
/// standard or the URL-safe alphabet.
///
/// Whitespace inside the payload is ignored.
pub fn base64_decode_lenient(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    general_purpose::STANDARD.decode(pad_base64(&url_safe_base64_reverse(&compact)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad_base64() {
        assert_eq!(pad_base64("YQ"), "YQ==");
        assert_eq!(pad_base64("YWI"), "YWI=");
        assert_eq!(pad_base64("YWJj"), "YWJj");
        assert_eq!(pad_base64("YQ==="), "YQ==");
    }

    #[test]
    fn test_decode_lenient_accepts_both_alphabets() {
        // "??>" encodes to "Pz8+" in the standard alphabet
        assert_eq!(base64_decode_lenient("Pz8-").unwrap(), b"??>");
        assert_eq!(base64_decode_lenient("Pz8+").unwrap(), b"??>");
        assert_eq!(
            base64_decode_lenient(&base64_encode("hello")).unwrap(),
            b"hello"
        );
        assert_eq!(base64_decode_lenient("aGVsbG8").unwrap(), b"hello");
    }

    #[test]
    fn test_decode_lenient_rejects_garbage() {
        assert!(base64_decode_lenient("!!!!").is_err());
    }
}
