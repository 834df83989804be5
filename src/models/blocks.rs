//! Block-structured document content.
//!
//! Documents are stored as raw block JSON and parsed into these types only
//! at render time. The model is deliberately lenient: unknown block types,
//! unknown marks, and missing fields all deserialize to explicit fallback
//! values so rendering stays total.

use serde::{Deserialize, Deserializer, Serialize};

/// Block type tag with a closed set of variants.
///
/// Any tag not in the set maps to `Unknown`, which renders as a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Paragraph,
    Heading,
    BulletList,
    OrderedList,
    Blockquote,
    CodeBlock,
    Image,
    Unknown,
}

impl BlockKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "paragraph" => BlockKind::Paragraph,
            "heading" => BlockKind::Heading,
            "bulletList" => BlockKind::BulletList,
            "orderedList" => BlockKind::OrderedList,
            "blockquote" => BlockKind::Blockquote,
            "codeBlock" => BlockKind::CodeBlock,
            "image" => BlockKind::Image,
            _ => BlockKind::Unknown,
        }
    }
}

impl Default for BlockKind {
    fn default() -> Self {
        BlockKind::Paragraph
    }
}

impl<'de> Deserialize<'de> for BlockKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(BlockKind::from_tag(&tag))
    }
}

/// Inline style marks. Unrecognized marks deserialize to `Other` and are
/// ignored by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mark {
    Bold,
    Italic,
    Underline,
    Strike,
    Code,
    Link,
    Other,
}

impl Mark {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "bold" => Mark::Bold,
            "italic" => Mark::Italic,
            "underline" => Mark::Underline,
            "strike" => Mark::Strike,
            "code" => Mark::Code,
            "link" => Mark::Link,
            _ => Mark::Other,
        }
    }
}

impl<'de> Deserialize<'de> for Mark {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let tag = String::deserialize(deserializer)?;
        Ok(Mark::from_tag(&tag))
    }
}

/// A leaf of styled text within a block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineNode {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub styles: Vec<Mark>,
    /// Target of a `link` mark. Defaults to `#` at render time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

/// Block content payload: a plain string, a run of inline nodes, or any
/// other JSON value (coerced to its string representation when rendered).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockContent {
    Text(String),
    Inline(Vec<InlineNode>),
    Other(serde_json::Value),
}

impl Default for BlockContent {
    fn default() -> Self {
        BlockContent::Text(String::new())
    }
}

/// Type-specific block attributes. Unknown props are dropped on parse.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockProps {
    /// Heading level, clamped to 1..=6 at render time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<i64>,
    /// Code block language.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Image source URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Image alt text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// One node of structured document content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type", default)]
    pub kind: BlockKind,
    #[serde(default)]
    pub content: BlockContent,
    /// Sub-blocks, used by list blocks for their items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Block>,
    #[serde(default)]
    pub props: BlockProps,
}
