//! Block-to-HTML rendering.
//!
//! Pure conversion from block JSON to an HTML string, with no I/O. The
//! conversion is lossy by design and total: input that does not parse as a
//! block sequence degrades to a single paragraph holding the escaped raw
//! input. Every text leaf and attribute value passes through escaping
//! before any tag wrapping, so raw HTML in content can never reach the
//! output unescaped.

use crate::models::{Block, BlockContent, BlockKind, InlineNode, Mark};

/// Render a raw block-JSON string to HTML.
pub fn render_blocks(blocks_json: &str) -> String {
    match serde_json::from_str::<Vec<Block>>(blocks_json) {
        Ok(blocks) => blocks.iter().map(render_block).collect(),
        Err(_) => format!("<p>{}</p>", escape_text(blocks_json)),
    }
}

fn render_block(block: &Block) -> String {
    match block.kind {
        BlockKind::Heading => {
            let level = block.props.level.unwrap_or(1).clamp(1, 6);
            format!(
                "<h{}>{}</h{}>",
                level,
                render_content(&block.content),
                level
            )
        }
        BlockKind::BulletList => format!("<ul>{}</ul>", render_list_items(block)),
        BlockKind::OrderedList => format!("<ol>{}</ol>", render_list_items(block)),
        BlockKind::Blockquote => {
            format!("<blockquote>{}</blockquote>", render_content(&block.content))
        }
        BlockKind::CodeBlock => {
            let code = escape_text(&content_text(&block.content));
            match block.props.language.as_deref().filter(|l| !l.is_empty()) {
                Some(lang) => format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>",
                    escape_attr(lang),
                    code
                ),
                None => format!("<pre><code>{}</code></pre>", code),
            }
        }
        BlockKind::Image => match block.props.src.as_deref().filter(|s| !s.is_empty()) {
            Some(src) => format!(
                "<figure><img src=\"{}\" alt=\"{}\" /></figure>",
                escape_attr(src),
                escape_attr(block.props.alt.as_deref().unwrap_or(""))
            ),
            None => String::new(),
        },
        BlockKind::Paragraph | BlockKind::Unknown => {
            format!("<p>{}</p>", render_content(&block.content))
        }
    }
}

/// List items come from `children` when present; otherwise the block's own
/// content becomes a single item.
fn render_list_items(block: &Block) -> String {
    if block.children.is_empty() {
        return format!("<li>{}</li>", render_content(&block.content));
    }
    block
        .children
        .iter()
        .map(|child| format!("<li>{}</li>", render_content(&child.content)))
        .collect()
}

fn render_content(content: &BlockContent) -> String {
    match content {
        BlockContent::Text(text) => escape_text(text),
        BlockContent::Inline(nodes) => nodes.iter().map(render_inline).collect(),
        BlockContent::Other(value) => escape_text(&value.to_string()),
    }
}

/// Wrap escaped text in tags for each present mark, in fixed precedence
/// order: bold, italic, underline, strike, code, link. Earlier marks end up
/// innermost. Presence checks keep duplicated marks from double-wrapping.
fn render_inline(node: &InlineNode) -> String {
    let mut html = escape_text(&node.text);
    if node.styles.contains(&Mark::Bold) {
        html = format!("<strong>{}</strong>", html);
    }
    if node.styles.contains(&Mark::Italic) {
        html = format!("<em>{}</em>", html);
    }
    if node.styles.contains(&Mark::Underline) {
        html = format!("<u>{}</u>", html);
    }
    if node.styles.contains(&Mark::Strike) {
        html = format!("<s>{}</s>", html);
    }
    if node.styles.contains(&Mark::Code) {
        html = format!("<code>{}</code>", html);
    }
    if node.styles.contains(&Mark::Link) {
        let href = node.href.as_deref().unwrap_or("#");
        html = format!("<a href=\"{}\">{}</a>", escape_attr(href), html);
    }
    html
}

/// Plain text of the content with inline markup stripped.
fn content_text(content: &BlockContent) -> String {
    match content {
        BlockContent::Text(text) => text.clone(),
        BlockContent::Inline(nodes) => nodes.iter().map(|n| n.text.as_str()).collect(),
        BlockContent::Other(value) => value.to_string(),
    }
}

/// Escape text content for `&`, `<`, `>`, `"`, `'`.
pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape attribute values; backticks are escaped in addition to the text set.
pub fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '`' => out.push_str("&#96;"),
            _ => out.push(ch),
        }
    }
    out
}
