//! Shareable links carrying one sheet in the query string.
//!
//! Current links hold compact single-letter-key JSON compressed with
//! LZ-string's URI-safe alphabet (`?data=<lz>&name=<sheet>`). Older links
//! hold plain percent-encoded JSON with full field names; those are still
//! accepted when the compressed reading fails.

use crate::ir::{GoalNode, Sheet};
use crate::parser::parse_coord;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_LINK_NAME: &str = "URLツリー";

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("unreadable link data (compressed: {compressed}; plain JSON: {legacy})")]
    Decode { compressed: String, legacy: String },
    #[error("failed to encode sheet: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactNode {
    #[serde(rename = "i", default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(rename = "p", default, deserialize_with = "lenient_string")]
    pub parent_id: String,
    #[serde(rename = "n", default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(rename = "d", default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(rename = "c", default, deserialize_with = "lenient_string")]
    pub icon_url: String,
    #[serde(rename = "u", default, deserialize_with = "lenient_string")]
    pub url: String,
    #[serde(default, deserialize_with = "lenient_coord")]
    pub x: i32,
    #[serde(default, deserialize_with = "lenient_coord")]
    pub y: i32,
}

impl From<&GoalNode> for CompactNode {
    fn from(node: &GoalNode) -> Self {
        Self {
            id: node.id.clone(),
            parent_id: node.parent_id.clone(),
            name: node.name.clone(),
            description: node.description.clone(),
            icon_url: node.icon_url.clone(),
            url: node.url.clone(),
            x: node.x,
            y: node.y,
        }
    }
}

impl From<CompactNode> for GoalNode {
    fn from(node: CompactNode) -> Self {
        Self {
            id: node.id,
            parent_id: node.parent_id,
            name: node.name,
            description: node.description,
            icon_url: node.icon_url,
            url: node.url,
            x: node.x,
            y: node.y,
        }
    }
}

/// Node shape of links made before compression was introduced.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyNode {
    #[serde(default, deserialize_with = "lenient_string")]
    id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    parent_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    icon_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    url: String,
    #[serde(default, deserialize_with = "lenient_coord")]
    x: i32,
    #[serde(default, deserialize_with = "lenient_coord")]
    y: i32,
}

impl From<LegacyNode> for GoalNode {
    fn from(node: LegacyNode) -> Self {
        Self {
            id: node.id,
            parent_id: node.parent_id,
            name: node.name,
            description: node.description,
            icon_url: node.icon_url,
            url: node.url,
            x: node.x,
            y: node.y,
        }
    }
}

/// Falsy JSON values become the empty string; numbers keep their digits.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null | Value::Bool(false) => String::new(),
        Value::Number(n) if n.as_f64() == Some(0.0) => String::new(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

fn lenient_coord<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
            .unwrap_or(0),
        Value::String(s) => parse_coord(&s),
        _ => 0,
    })
}

/// Compact JSON of `sheet`, LZ-compressed into URI-safe characters.
pub fn encode_sheet(sheet: &Sheet) -> Result<String, ShareError> {
    let compact: Vec<CompactNode> = sheet.nodes.iter().map(CompactNode::from).collect();
    let json = serde_json::to_string(&compact)?;
    Ok(lz_str::compress_to_encoded_uri_component(json.as_str()))
}

/// `<base>?data=<payload>&name=<sheet name>`
pub fn share_url(base: &str, sheet: &Sheet) -> Result<String, ShareError> {
    let payload = encode_sheet(sheet)?;
    let name = utf8_percent_encode(&sheet.name, URI_COMPONENT);
    Ok(format!("{base}?data={payload}&name={name}"))
}

/// Reads a `data` value that has already been through query-string decoding.
pub fn decode_payload(data: &str) -> Result<Vec<GoalNode>, ShareError> {
    let compressed = match decode_compressed(data) {
        Ok(nodes) => return Ok(nodes),
        Err(err) => err,
    };
    match decode_legacy(data) {
        Ok(nodes) => {
            log::info!("restored link in the plain JSON format");
            Ok(nodes)
        }
        Err(legacy) => Err(ShareError::Decode { compressed, legacy }),
    }
}

fn decode_compressed(data: &str) -> Result<Vec<GoalNode>, String> {
    // Query decoding turns the alphabet's '+' into spaces.
    let restored = data.replace(' ', "+");
    let wide = lz_str::decompress_from_encoded_uri_component(restored.as_str())
        .ok_or_else(|| "decompression failed".to_string())?;
    let json = String::from_utf16(&wide).map_err(|err| err.to_string())?;
    if json.is_empty() {
        return Err("decompressed to nothing".to_string());
    }
    let nodes: Vec<CompactNode> = serde_json::from_str(&json).map_err(|err| err.to_string())?;
    Ok(nodes.into_iter().map(GoalNode::from).collect())
}

fn decode_legacy(data: &str) -> Result<Vec<GoalNode>, String> {
    let json = percent_decode_str(data)
        .decode_utf8()
        .map_err(|err| err.to_string())?;
    let nodes: Vec<LegacyNode> = serde_json::from_str(&json).map_err(|err| err.to_string())?;
    Ok(nodes.into_iter().map(GoalNode::from).collect())
}

/// The `data` and `name` parameters of a share link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub data: String,
    pub name: String,
}

impl ShareLink {
    /// Parses a query string (leading `?` optional). `None` when there is no
    /// `data` parameter, which is the normal case for links without a tree.
    pub fn from_query(query: &str) -> Option<Self> {
        let query = query.trim_start_matches('?');
        let mut data = None;
        let mut name = None;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match decode_query_component(key).as_str() {
                "data" if data.is_none() => data = Some(decode_query_component(value)),
                "name" if name.is_none() => name = Some(decode_query_component(value)),
                _ => {}
            }
        }
        let data = data.filter(|d| !d.is_empty())?;
        let name = name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_LINK_NAME.to_string());
        Some(Self { data, name })
    }

    /// Accepts a full URL or a bare query string.
    pub fn from_url(url: &str) -> Option<Self> {
        let without_fragment = url.split('#').next().unwrap_or(url);
        match without_fragment.split_once('?') {
            Some((_, query)) => Self::from_query(query),
            None => Self::from_query(without_fragment),
        }
    }

    pub fn restore(&self) -> Result<Sheet, ShareError> {
        let nodes = decode_payload(&self.data)?;
        Ok(Sheet::new(self.name.clone(), nodes))
    }
}

/// `application/x-www-form-urlencoded` decoding of one component.
fn decode_query_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
