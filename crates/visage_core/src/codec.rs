//! Transport codec for face image payloads.
//!
//! Clients send captured frames as base64, usually wrapped in a data URI
//! (`data:image/png;base64,...`). The codec strips the prefix when present,
//! decodes the body, and fails closed on anything malformed. A decode failure
//! is a [`CodecError`], reported to the caller as a bad upload; it is never
//! folded into a verification outcome.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::CodecError;

/// Decode a transport-encoded face image into raw bytes.
///
/// Accepts either bare base64 or a data-URI-prefixed payload. Rejects empty
/// input, invalid base64, and payloads that decode to zero bytes.
pub fn decode_face_image(payload: &str) -> Result<Vec<u8>, CodecError> {
    let body = strip_data_uri_prefix(payload);
    if body.is_empty() {
        return Err(CodecError::EmptyPayload);
    }

    let bytes = STANDARD.decode(body)?;
    if bytes.is_empty() {
        return Err(CodecError::EmptyImage);
    }

    Ok(bytes)
}

/// Encode raw image bytes the way clients produce them.
///
/// The inverse of [`decode_face_image`] for bare payloads.
pub fn encode_face_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Require that `bytes` parse as a real image in a supported format.
///
/// Used at registration so a reference credential can never be stored in a
/// form the comparison backend cannot read.
pub fn ensure_decodable_image(bytes: &[u8]) -> Result<(), CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::EmptyImage);
    }
    image::load_from_memory(bytes)?;
    Ok(())
}

/// Strip a `data:<media-type>;base64,` marker if the payload carries one.
fn strip_data_uri_prefix(payload: &str) -> &str {
    if payload.starts_with("data:") {
        match payload.split_once(',') {
            Some((_, body)) => body,
            None => "",
        }
    } else {
        payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_bare_payloads() {
        let original: Vec<u8> = (0u8..=255).collect();
        let encoded = encode_face_image(&original);
        assert_eq!(decode_face_image(&encoded).unwrap(), original);
    }

    #[test]
    fn round_trips_data_uri_payloads() {
        let original = b"\x89PNG\r\n\x1a\n not a real png".to_vec();
        let payload = format!("data:image/png;base64,{}", encode_face_image(&original));
        assert_eq!(decode_face_image(&payload).unwrap(), original);
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(matches!(
            decode_face_image(""),
            Err(CodecError::EmptyPayload)
        ));
        // A bare prefix with no body is just as empty.
        assert!(matches!(
            decode_face_image("data:image/png;base64,"),
            Err(CodecError::EmptyPayload)
        ));
        assert!(matches!(
            decode_face_image("data:image/png;base64"),
            Err(CodecError::EmptyPayload)
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        assert!(matches!(
            decode_face_image("this is !!! not base64"),
            Err(CodecError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn rejects_payload_decoding_to_zero_bytes() {
        // Whitespace-only body decodes to nothing with the standard engine's
        // strict handling, so exercise the explicit empty-image branch via
        // ensure_decodable_image instead.
        assert!(matches!(
            ensure_decodable_image(&[]),
            Err(CodecError::EmptyImage)
        ));
    }

    #[test]
    fn rejects_bytes_that_are_not_an_image() {
        assert!(matches!(
            ensure_decodable_image(b"definitely not an image"),
            Err(CodecError::UnreadableImage(_))
        ));
    }

    #[test]
    fn accepts_a_minimal_png() {
        // 1x1 transparent PNG.
        let png = decode_face_image(
            "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk\
             YPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==",
        )
        .unwrap();
        ensure_decodable_image(&png).unwrap();
    }
}
