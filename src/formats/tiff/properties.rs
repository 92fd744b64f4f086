//! String properties packed into custom LONG tags
//!
//! A property `key=value` is stored NUL-terminated and zero-padded to a
//! multiple of four bytes, each group of four bytes forming one LONG with
//! the first byte most significant. The tag number is derived from the key:
//! `PROPERTY_BASE_TAG + (h mod PROPERTY_TAG_RANGE)` where `h` is the first
//! eight bytes of the key's SHA-256 digest read big-endian.
//!
//! Different keys can land on the same tag. Setting a key whose tag already
//! holds another key fails with [`Error::PropertyCollision`].

use std::collections::BTreeMap;
use sha2::{Digest, Sha256};
use crate::error::{Error, Result};

/// First tag of the property range
pub const PROPERTY_BASE_TAG: u16 = 50100;

/// Number of tags in the property range
pub const PROPERTY_TAG_RANGE: u16 = 1000;

/// Custom tags of one layer, by tag number
pub type CustomTags = BTreeMap<u16, Vec<u32>>;

/// Tag number a property key is stored under
pub fn property_tag(key: &str) -> u16 {
    let digest = Sha256::digest(key.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    let slot = u64::from_be_bytes(head) % PROPERTY_TAG_RANGE as u64;
    PROPERTY_BASE_TAG + slot as u16
}

pub fn is_property_tag(tag: u16) -> bool {
    (PROPERTY_BASE_TAG..PROPERTY_BASE_TAG + PROPERTY_TAG_RANGE).contains(&tag)
}

/// Packs a string into NUL-terminated big-endian words
pub fn encode(text: &str) -> Vec<u32> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks_exact(4)
        .map(|w| u32::from_be_bytes([w[0], w[1], w[2], w[3]]))
        .collect()
}

/// Unpacks words up to the first NUL byte
pub fn decode(words: &[u32]) -> String {
    let bytes: Vec<u8> = words
        .iter()
        .flat_map(|w| w.to_be_bytes())
        .take_while(|&b| b != 0)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Splits `key=value` at the first `=`
fn split_pair(text: &str) -> Option<(&str, &str)> {
    text.split_once('=')
}

fn validate(key: &str, value: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::Invalid("property key is empty".to_string()));
    }
    if key.contains('=') || key.contains('\0') {
        return Err(Error::Invalid(format!(
            "property key '{}' contains '=' or NUL",
            key.escape_debug()
        )));
    }
    if value.contains('\0') {
        return Err(Error::Invalid(format!("value of property '{}' contains NUL", key)));
    }
    Ok(())
}

/// Stores a property, returning the tag it was written to
pub fn set(tags: &mut CustomTags, key: &str, value: &str) -> Result<u16> {
    validate(key, value)?;
    let tag = property_tag(key);

    if let Some(words) = tags.get(&tag) {
        let text = decode(words);
        let existing = split_pair(&text).map(|(k, _)| k).unwrap_or(text.as_str());
        if existing != key {
            return Err(Error::PropertyCollision {
                key: key.to_string(),
                existing: existing.to_string(),
                tag,
            });
        }
    }

    tags.insert(tag, encode(&format!("{}={}", key, value)));
    Ok(tag)
}

/// Looks a property up by key
pub fn get(tags: &CustomTags, key: &str) -> Option<String> {
    let text = decode(tags.get(&property_tag(key))?);
    match split_pair(&text) {
        Some((k, v)) if k == key => Some(v.to_string()),
        _ => None,
    }
}

/// Every property stored in the range
pub fn all(tags: &CustomTags) -> BTreeMap<String, String> {
    tags.range(PROPERTY_BASE_TAG..PROPERTY_BASE_TAG + PROPERTY_TAG_RANGE)
        .filter_map(|(_, words)| {
            let text = decode(words);
            split_pair(&text).map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect()
}

/// Removes a property, returning its value
pub fn remove(tags: &mut CustomTags, key: &str) -> Option<String> {
    let value = get(tags, key)?;
    tags.remove(&property_tag(key));
    Some(value)
}
