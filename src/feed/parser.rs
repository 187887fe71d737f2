//! RSS document decoding.
//!
//! `parse_feed` is a total function over arbitrary bytes: it either returns a
//! fully-populated channel or `ParseError::Malformed`, never a partial
//! structure and never a panic. Item order is preserved exactly as it appears
//! in the document.
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    /// Input did not decode as an RSS document.
    #[error("Malformed feed document: {0}")]
    Malformed(#[from] quick_xml::DeError),
}

/// `<rss>` document root. Only the channel matters; attributes like
/// `version` are ignored.
#[derive(Debug, Deserialize)]
struct RssDocument {
    channel: RssChannel,
}

/// Channel metadata plus its items in document order.
///
/// Title, link, and description are required by the document shape; a
/// channel missing any of them is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RssChannel {
    pub title: String,
    pub link: String,
    pub description: String,
    #[serde(rename = "item", default)]
    pub items: Vec<RssItem>,
}

/// One `<item>` element. Real-world items omit fields freely, so every
/// field defaults to empty rather than failing the whole document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RssItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "pubDate", default)]
    pub pub_date: String,
}

/// Decode RSS bytes into a channel.
///
/// After the structural decode, HTML entities in the channel title and
/// description and in every item title and description are unescaped exactly
/// once. Links and publish dates are not free text and pass through
/// untouched.
pub fn parse_feed(bytes: &[u8]) -> Result<RssChannel, ParseError> {
    let document: RssDocument = quick_xml::de::from_reader(bytes)?;

    let mut channel = document.channel;
    channel.title = decode_entities(&channel.title);
    channel.description = decode_entities(&channel.description);
    for item in &mut channel.items {
        item.title = decode_entities(&item.title);
        item.description = decode_entities(&item.description);
    }
    Ok(channel)
}

/// The XML layer already resolved the predefined XML entities; this second
/// pass handles HTML entities that feeds commonly double-escape into text
/// fields (`&amp;amp;`, `&amp;#8217;`, named entities like `&nbsp;`).
fn decode_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

// ============================================================================
// Tests
// ============================================================================
