//! Rich-text document rendering seam

use crate::error::ResolveError;
use serde_json::Value;

/// Renders a rich-text document envelope (`{"type": "doc", ...}`) to markup
pub trait RichTextRenderer: Send + Sync {
    /// Render a document
    ///
    /// # Errors
    /// Returns `ResolveError::RichText` for documents it cannot render.
    fn render(&self, document: &Value) -> Result<String, ResolveError>;
}

/// Renderer that keeps only the text
///
/// Block nodes (paragraphs, headings, list items) end with a newline; the
/// trailing newline of the last block is trimmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextRenderer;

const BLOCK_TYPES: &[&str] = &["paragraph", "heading", "list_item", "blockquote", "code_block"];

impl PlainTextRenderer {
    fn walk(node: &Value, out: &mut String) -> Result<(), ResolveError> {
        let Value::Object(map) = node else {
            return Err(ResolveError::RichText(format!("expected object, got {node}")));
        };

        let kind = map.get("type").and_then(Value::as_str).unwrap_or_default();
        match kind {
            "text" => {
                if let Some(text) = map.get("text").and_then(Value::as_str) {
                    out.push_str(text);
                }
            }
            "hard_break" => out.push('\n'),
            _ => {
                if let Some(children) = map.get("content") {
                    let children = children.as_array().ok_or_else(|| {
                        ResolveError::RichText(format!("'{kind}' content is not a list"))
                    })?;
                    for child in children {
                        Self::walk(child, out)?;
                    }
                }
                if BLOCK_TYPES.contains(&kind) {
                    out.push('\n');
                }
            }
        }
        Ok(())
    }
}

impl RichTextRenderer for PlainTextRenderer {
    fn render(&self, document: &Value) -> Result<String, ResolveError> {
        let mut out = String::new();
        Self::walk(document, &mut out)?;
        Ok(out.trim_end_matches('\n').to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_paragraphs() {
        let doc = json!({
            "type": "doc",
            "content": [
                {"type": "paragraph", "content": [{"type": "text", "text": "Hello "}, {"type": "text", "text": "world"}]},
                {"type": "paragraph", "content": [{"type": "text", "text": "Bye"}]}
            ]
        });

        assert_eq!(PlainTextRenderer.render(&doc).unwrap(), "Hello world\nBye");
    }

    #[test]
    fn rejects_malformed_content() {
        let doc = json!({"type": "doc", "content": "oops"});
        let err = PlainTextRenderer.render(&doc).unwrap_err();
        assert!(matches!(err, ResolveError::RichText(_)));
    }

    #[test]
    fn empty_document_renders_empty() {
        let doc = json!({"type": "doc", "content": []});
        assert_eq!(PlainTextRenderer.render(&doc).unwrap(), "");
    }
}
