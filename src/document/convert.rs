//! Bridge between the token document and `tdoc` (FTML on disk).
//!
//! Tokens are stored as link spans whose target carries the `token:` scheme.
//! Other inline styling is flattened to plain text on load, and nested
//! paragraph structure (quotes, lists, checklists) is flattened into
//! top-level paragraphs.

use std::io::Cursor;

use tdoc::{ChecklistItem, InlineStyle, Paragraph, Span, parse, writer::Writer};
use thiserror::Error;

use super::{Block, Document, Inline, Token};

pub const TOKEN_LINK_SCHEME: &str = "token:";

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("failed to parse FTML: {0}")]
    Parse(String),
    #[error("failed to render FTML: {0}")]
    Write(String),
}

pub fn parse_ftml(content: &str) -> Result<Document, ConvertError> {
    let parsed = parse(Cursor::new(content.to_string()))
        .map_err(|err| ConvertError::Parse(err.to_string()))?;
    Ok(from_tdoc(&parsed))
}

pub fn write_ftml(document: &Document) -> Result<String, ConvertError> {
    let writer = Writer::new();
    writer
        .write_to_string(&to_tdoc(document))
        .map_err(|err| ConvertError::Write(err.to_string()))
}

pub fn from_tdoc(document: &tdoc::Document) -> Document {
    let mut blocks = Vec::new();
    for paragraph in &document.paragraphs {
        collect_paragraph_blocks(paragraph, &mut blocks);
    }
    Document::from_blocks(blocks)
}

pub fn to_tdoc(document: &Document) -> tdoc::Document {
    let paragraphs = document
        .blocks()
        .iter()
        .map(|block| Paragraph::new_text().with_content(block_to_spans(block)))
        .collect();
    tdoc::Document::new().with_paragraphs(paragraphs)
}

fn collect_paragraph_blocks(paragraph: &Paragraph, blocks: &mut Vec<Block>) {
    match paragraph {
        Paragraph::Text { content }
        | Paragraph::Header1 { content }
        | Paragraph::Header2 { content }
        | Paragraph::Header3 { content }
        | Paragraph::CodeBlock { content } => blocks.push(spans_to_block(content)),
        Paragraph::Quote { children } => {
            for child in children {
                collect_paragraph_blocks(child, blocks);
            }
        }
        Paragraph::OrderedList { entries } | Paragraph::UnorderedList { entries } => {
            for entry in entries {
                for child in entry {
                    collect_paragraph_blocks(child, blocks);
                }
            }
        }
        Paragraph::Checklist { items } => {
            for item in items {
                collect_checklist_item_blocks(item, blocks);
            }
        }
    }
}

fn collect_checklist_item_blocks(item: &ChecklistItem, blocks: &mut Vec<Block>) {
    blocks.push(spans_to_block(&item.content));
    for child in &item.children {
        collect_checklist_item_blocks(child, blocks);
    }
}

fn spans_to_block(spans: &[Span]) -> Block {
    let mut inlines = Vec::new();
    for span in spans {
        collect_span_inlines(span, &mut inlines);
    }
    Block::with_inlines(inlines)
}

fn collect_span_inlines(span: &Span, inlines: &mut Vec<Inline>) {
    if let Some(name) = token_name_from_span(span) {
        inlines.push(Inline::Token(Token::new(name)));
        return;
    }
    if !span.text.is_empty() {
        inlines.push(Inline::Text(span.text.clone()));
    }
    for child in &span.children {
        collect_span_inlines(child, inlines);
    }
}

fn token_name_from_span(span: &Span) -> Option<&str> {
    if span.style != InlineStyle::Link {
        return None;
    }
    span.link_target
        .as_deref()
        .and_then(|target| target.strip_prefix(TOKEN_LINK_SCHEME))
}

fn block_to_spans(block: &Block) -> Vec<Span> {
    let mut spans: Vec<Span> = block
        .inlines()
        .iter()
        .map(|inline| match inline {
            Inline::Text(text) => Span::new_text(text.as_str()),
            Inline::Token(token) => token_span(token),
        })
        .collect();
    if spans.is_empty() {
        spans.push(Span::new_text(""));
    }
    spans
}

fn token_span(token: &Token) -> Span {
    let mut span = Span::new_text(token.name());
    span.style = InlineStyle::Link;
    span.link_target = Some(format!("{TOKEN_LINK_SCHEME}{}", token.name()));
    span
}
