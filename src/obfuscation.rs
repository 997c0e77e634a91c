//! The `hiddenSub` scrambling: base64, reverse the characters, base64 again.
//!
//! This only keeps subtitle text out of casual view in the published JSON. It is not
//! encryption.

use crate::error::ObfuscationError;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

pub fn conceal(plain: &str) -> String {
    let inner = BASE64_STANDARD.encode(plain.as_bytes());
    let reversed: String = inner.chars().rev().collect();
    BASE64_STANDARD.encode(reversed.as_bytes())
}

pub fn reveal(hidden: &str) -> Result<String, ObfuscationError> {
    let outer = BASE64_STANDARD
        .decode(hidden.trim())
        .map_err(ObfuscationError::OuterBase64)?;
    if !outer.is_ascii() {
        return Err(ObfuscationError::NotAscii);
    }
    // ASCII, so reversing bytes is the same as reversing characters.
    let reversed: Vec<u8> = outer.into_iter().rev().collect();
    let inner = BASE64_STANDARD
        .decode(&reversed)
        .map_err(ObfuscationError::InnerBase64)?;
    Ok(String::from_utf8(inner)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn matches_browser_encoding() {
        // btoa(btoa("Hi").split('').reverse().join('')) == "PWtHUw=="
        assert_eq!(conceal("Hi"), "PWtHUw==");
        assert_eq!(reveal("PWtHUw==").unwrap(), "Hi");
    }

    #[test]
    fn multibyte_text_survives() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\n안녕하세요 — こんにちは\n";
        assert_eq!(reveal(&conceal(text)).unwrap(), text);
    }

    #[test]
    fn empty_string_round_trips() {
        assert_eq!(conceal(""), "");
        assert_eq!(reveal("").unwrap(), "");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            reveal("not base64!!"),
            Err(ObfuscationError::OuterBase64(_))
        ));
        // Valid outer layer whose reversed payload is not base64.
        let outer = BASE64_STANDARD.encode("@@@@");
        assert!(matches!(
            reveal(&outer),
            Err(ObfuscationError::InnerBase64(_))
        ));
        let non_ascii = BASE64_STANDARD.encode([0xffu8, 0xfe]);
        assert!(matches!(reveal(&non_ascii), Err(ObfuscationError::NotAscii)));
    }

    #[test]
    fn rejects_invalid_utf8_payload() {
        let inner = BASE64_STANDARD.encode([0xc3u8, 0x28]);
        let reversed: String = inner.chars().rev().collect();
        let hidden = BASE64_STANDARD.encode(reversed);
        assert!(matches!(reveal(&hidden), Err(ObfuscationError::Utf8(_))));
    }

    proptest! {
        #[test]
        fn reveal_inverts_conceal(text in any::<String>()) {
            prop_assert_eq!(reveal(&conceal(&text)).unwrap(), text);
        }
    }
}
