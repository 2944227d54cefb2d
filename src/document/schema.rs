use super::{Block, Document, Inline};

pub const PARAGRAPH_TYPE: &str = "paragraph";
pub const TOKEN_TYPE: &str = "token";

/// Node kinds a paragraph may contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InlineKind {
    Text,
    Token,
}

pub struct InlineRule {
    pub node_type: &'static str,
    pub is_void: bool,
    pub validate_name: fn(&str) -> bool,
}

pub const PARAGRAPH_CHILDREN: &[InlineKind] = &[InlineKind::Text, InlineKind::Token];

pub const INLINE_RULES: &[InlineRule] = &[InlineRule {
    node_type: TOKEN_TYPE,
    is_void: true,
    validate_name: token_name_is_valid,
}];

/// Token names are free-form.
fn token_name_is_valid(_name: &str) -> bool {
    true
}

pub fn inline_rule(node_type: &str) -> Option<&'static InlineRule> {
    INLINE_RULES.iter().find(|rule| rule.node_type == node_type)
}

pub fn is_void(node_type: &str) -> bool {
    inline_rule(node_type).is_some_and(|rule| rule.is_void)
}

pub fn paragraph_allows(kind: InlineKind) -> bool {
    PARAGRAPH_CHILDREN.contains(&kind)
}

pub(crate) fn ensure_document_initialized(document: &mut Document) {
    if document.blocks.is_empty() {
        document.blocks.push(Block::new());
    }
}

/// Checks a block against the paragraph rules. Blocks built through the
/// public constructors always pass.
pub fn block_is_valid(block: &Block) -> bool {
    let mut previous_was_text = false;
    for inline in block.inlines() {
        match inline {
            Inline::Text(text) => {
                if text.is_empty() || previous_was_text || !paragraph_allows(InlineKind::Text) {
                    return false;
                }
                previous_was_text = true;
            }
            Inline::Token(token) => {
                let Some(rule) = inline_rule(token.node_type()) else {
                    return false;
                };
                if !paragraph_allows(InlineKind::Token) || !(rule.validate_name)(token.name()) {
                    return false;
                }
                previous_was_text = false;
            }
        }
    }
    true
}

pub fn document_is_valid(document: &Document) -> bool {
    !document.blocks().is_empty() && document.blocks().iter().all(block_is_valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Token;

    #[test]
    fn token_is_void() {
        assert!(is_void(TOKEN_TYPE));
        assert!(!is_void(PARAGRAPH_TYPE));
    }

    #[test]
    fn any_token_name_is_valid() {
        let block = Block::with_inlines(vec![
            Inline::Token(Token::new("")),
            Inline::Token(Token::new("Whirling Dervish Inc")),
        ]);
        assert!(block_is_valid(&block));
    }

    #[test]
    fn initialized_document_is_valid() {
        let mut document = Document { blocks: Vec::new() };
        assert!(!document_is_valid(&document));
        ensure_document_initialized(&mut document);
        assert!(document_is_valid(&document));
    }
}
