//! Wire forms for lists and maps stored as flat descriptor strings.
//!
//! The descriptor store only keeps strings, so collections are framed as
//! `[a,b]` and `{k=v,k2=v2}`. The Base64 variant encodes every key and value
//! on its own, which keeps user input containing `=`, `,`, `{` or `}` from
//! breaking the framing.

use crate::error::DecodeError;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use std::collections::BTreeMap;

/// Standard alphabet, unpadded on encode, padding optional on decode.
const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode a list as `[a,b,c]`.
pub fn encode_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined = items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("[{joined}]")
}

/// Decode a `[a,b,c]` list. Blank input yields an empty list.
pub fn decode_list(s: &str) -> Vec<String> {
    unframe(s, '[', ']')
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encode a map as `{k=v,k2=v2}`.
pub fn encode_map(items: &BTreeMap<String, String>) -> String {
    frame_map(items.iter().map(|(k, v)| format!("{k}={v}")))
}

/// Decode a `{k=v,...}` map, splitting each entry on its first `=`.
pub fn decode_map(s: &str) -> Result<BTreeMap<String, String>, DecodeError> {
    let mut map = BTreeMap::new();
    for token in map_tokens(s) {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| DecodeError::MissingSeparator {
                token: token.to_string(),
            })?;
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}

/// Encode a map with every key and value Base64-encoded (no padding).
pub fn encode_map_base64(items: &BTreeMap<String, String>) -> String {
    frame_map(items.iter().map(|(k, v)| {
        format!(
            "{}={}",
            TOKEN_ENGINE.encode(k.as_bytes()),
            TOKEN_ENGINE.encode(v.as_bytes())
        )
    }))
}

/// Decode a map produced by [`encode_map_base64`].
///
/// Padded tokens are accepted. A Base64 string never starts with `=`, so the
/// whole run of `=` after the key is the separator.
pub fn decode_map_base64(s: &str) -> Result<BTreeMap<String, String>, DecodeError> {
    let mut map = BTreeMap::new();
    for token in map_tokens(s) {
        let (key, rest) = token
            .split_once('=')
            .ok_or_else(|| DecodeError::MissingSeparator {
                token: token.to_string(),
            })?;
        let value = rest.trim_start_matches('=');
        map.insert(decode_part(token, key)?, decode_part(token, value)?);
    }
    Ok(map)
}

fn decode_part(token: &str, part: &str) -> Result<String, DecodeError> {
    let bytes = TOKEN_ENGINE
        .decode(part.as_bytes())
        .map_err(|e| DecodeError::InvalidBase64 {
            token: token.to_string(),
            reason: e.to_string(),
        })?;
    String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 {
        token: token.to_string(),
    })
}

fn frame_map<I: Iterator<Item = String>>(entries: I) -> String {
    format!("{{{}}}", entries.collect::<Vec<_>>().join(","))
}

fn map_tokens(s: &str) -> impl Iterator<Item = &str> {
    unframe(s, '{', '}')
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn unframe(s: &str, open: char, close: char) -> &str {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_prefix(open).unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix(close).unwrap_or(trimmed);
    trimmed.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("testKey1".to_string(), "testValue1".to_string());
        map.insert("testKey2".to_string(), "testValue2".to_string());
        map
    }

    #[test]
    fn test_list_round_trip() {
        let encoded = encode_list(["testValue1", "testValue2"]);
        assert_eq!(encoded, "[testValue1,testValue2]");
        assert_eq!(decode_list(&encoded), vec!["testValue1", "testValue2"]);
    }

    #[test]
    fn test_list_tolerates_spacing_and_empty_tokens() {
        assert_eq!(decode_list(" [a, b,,c ] "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_inputs_decode_to_empty_collections() {
        assert!(decode_list("").is_empty());
        assert!(decode_list("   ").is_empty());
        assert!(decode_list("[]").is_empty());
        assert!(decode_map("").unwrap().is_empty());
        assert!(decode_map("{}").unwrap().is_empty());
        assert!(decode_map_base64("").unwrap().is_empty());
    }

    #[test]
    fn test_map_round_trip() {
        let map = sample_map();
        let encoded = encode_map(&map);
        assert_eq!(encoded, "{testKey1=testValue1,testKey2=testValue2}");
        assert_eq!(decode_map(&encoded).unwrap(), map);
    }

    #[test]
    fn test_map_splits_on_first_equals() {
        let decoded = decode_map("{expr=a=b}").unwrap();
        assert_eq!(decoded.get("expr"), Some(&"a=b".to_string()));
    }

    #[test]
    fn test_map_accepts_spaced_separator() {
        let decoded = decode_map("{testKey1=testValue1, testKey2=testValue2}").unwrap();
        assert_eq!(decoded, sample_map());
    }

    #[test]
    fn test_map_rejects_token_without_separator() {
        let err = decode_map("{a=1,broken}").unwrap_err();
        assert_eq!(
            err,
            DecodeError::MissingSeparator {
                token: "broken".to_string()
            }
        );
    }

    #[test]
    fn test_base64_map_survives_delimiters_in_values() {
        let mut map = BTreeMap::new();
        map.insert("NOTE".to_string(), "{a=b, c}".to_string());
        map.insert("key=with,comma".to_string(), String::new());
        map.insert("TARGET".to_string(), "$(assignee)".to_string());

        let encoded = encode_map_base64(&map);
        assert!(!encoded.contains("$("));
        assert_eq!(decode_map_base64(&encoded).unwrap(), map);
    }

    #[test]
    fn test_base64_map_is_unpadded() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), "bc".to_string());
        assert_eq!(encode_map_base64(&map), "{YQ=YmM}");
    }

    #[test]
    fn test_base64_map_accepts_padding() {
        let decoded = decode_map_base64("{YQ===YmM=, dGVzdEtleTE=dGVzdFZhbHVlMQ==}").unwrap();
        assert_eq!(decoded.get("a"), Some(&"bc".to_string()));
        assert_eq!(decoded.get("testKey1"), Some(&"testValue1".to_string()));
    }

    #[test]
    fn test_base64_map_rejects_invalid_parts() {
        let err = decode_map_base64("{YQ=!!!}").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBase64 { .. }));

        let err = decode_map_base64("{%%%=YQ}").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidBase64 { .. }));

        let err = decode_map_base64("{YQ}").unwrap_err();
        assert!(matches!(err, DecodeError::MissingSeparator { .. }));
    }

    #[test]
    fn test_base64_map_rejects_non_utf8() {
        // 0xff 0xfe
        let err = decode_map_base64("{YQ=//4}").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidUtf8 { .. }));
    }
}
