//! Markdown parsing for step bodies
//!
//! Step content is authored in markdown. This turns it into a flat list of
//! blocks the content panel knows how to draw. Inline markers (backticks,
//! emphasis) are kept in the text and styled at render time.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

/// A block of step content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    /// A heading (level 1-6)
    Heading { level: u8, text: String },
    Paragraph(String),
    Code { language: Option<String>, code: String },
    UnorderedList(Vec<String>),
    OrderedList(Vec<String>),
    Blockquote(String),
    HorizontalRule,
}

impl ContentBlock {
    /// Plain text of the block, if it has any
    pub fn plain_text(&self) -> Option<String> {
        match self {
            ContentBlock::Heading { text, .. }
            | ContentBlock::Paragraph(text)
            | ContentBlock::Blockquote(text) => Some(text.clone()),
            ContentBlock::Code { code, .. } => Some(code.clone()),
            ContentBlock::UnorderedList(items) | ContentBlock::OrderedList(items) => {
                Some(items.join("\n"))
            }
            ContentBlock::HorizontalRule => None,
        }
    }
}

/// Where text events are currently being collected
#[derive(Default)]
struct Collector {
    blocks: Vec<ContentBlock>,
    text: String,
    heading: Option<u8>,
    code: Option<(Option<String>, String)>,
    list: Option<(bool, Vec<String>)>,
    list_depth: usize,
    item: String,
    quote: Option<String>,
}

impl Collector {
    fn flush_text(&mut self) {
        let trimmed = self.text.trim();
        if !trimmed.is_empty() {
            self.blocks.push(ContentBlock::Paragraph(trimmed.to_string()));
        }
        self.text.clear();
    }

    /// Append inline text to whichever container is open
    fn push_str(&mut self, s: &str) {
        if let Some((_, code)) = self.code.as_mut() {
            code.push_str(s);
        } else if self.list.is_some() {
            self.item.push_str(s);
        } else if let Some(quote) = self.quote.as_mut() {
            quote.push_str(s);
        } else {
            self.text.push_str(s);
        }
    }
}

/// Parse a markdown string into content blocks
pub fn parse(markdown: &str) -> Vec<ContentBlock> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let mut c = Collector::default();

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                c.flush_text();
                c.heading = Some(heading_level_to_u8(level));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some(level) = c.heading.take() {
                    let text = std::mem::take(&mut c.text).trim().to_string();
                    if !text.is_empty() {
                        c.blocks.push(ContentBlock::Heading { level, text });
                    }
                }
            }

            Event::End(TagEnd::Paragraph) => {
                if let Some(quote) = c.quote.as_mut() {
                    quote.push('\n');
                } else if c.list.is_none() {
                    c.flush_text();
                }
            }

            Event::Start(Tag::CodeBlock(kind)) => {
                c.flush_text();
                let language = match kind {
                    CodeBlockKind::Fenced(lang) if !lang.is_empty() => Some(lang.to_string()),
                    _ => None,
                };
                c.code = Some((language, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((language, code)) = c.code.take() {
                    c.blocks.push(ContentBlock::Code {
                        language,
                        code: code.trim_end().to_string(),
                    });
                }
            }

            Event::Start(Tag::List(first)) => {
                c.flush_text();
                // Nested lists are flattened into the outermost one
                if c.list_depth == 0 {
                    c.list = Some((first.is_some(), Vec::new()));
                }
                c.list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                c.list_depth = c.list_depth.saturating_sub(1);
                if c.list_depth == 0 {
                    if let Some((ordered, items)) = c.list.take() {
                        if !items.is_empty() {
                            c.blocks.push(if ordered {
                                ContentBlock::OrderedList(items)
                            } else {
                                ContentBlock::UnorderedList(items)
                            });
                        }
                    }
                }
            }
            Event::Start(Tag::Item) => {
                // A nested list starts inside an item; close out the parent text first
                let item = std::mem::take(&mut c.item).trim().to_string();
                if let (false, Some((_, items))) = (item.is_empty(), c.list.as_mut()) {
                    items.push(item);
                }
            }
            Event::End(TagEnd::Item) => {
                let item = std::mem::take(&mut c.item).trim().to_string();
                if let (false, Some((_, items))) = (item.is_empty(), c.list.as_mut()) {
                    items.push(item);
                }
            }

            Event::Start(Tag::BlockQuote(_)) => {
                c.flush_text();
                c.quote = Some(String::new());
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                if let Some(quote) = c.quote.take() {
                    let quote = quote.trim().to_string();
                    if !quote.is_empty() {
                        c.blocks.push(ContentBlock::Blockquote(quote));
                    }
                }
            }

            Event::Rule => {
                c.flush_text();
                c.blocks.push(ContentBlock::HorizontalRule);
            }

            Event::Text(text) => c.push_str(&text),
            Event::Code(code) => {
                c.push_str("`");
                c.push_str(&code);
                c.push_str("`");
            }
            Event::Start(Tag::Strong) | Event::End(TagEnd::Strong) => c.push_str("**"),
            Event::Start(Tag::Emphasis) | Event::End(TagEnd::Emphasis) => c.push_str("*"),

            Event::SoftBreak | Event::HardBreak => {
                if c.code.is_some() || c.quote.is_some() {
                    c.push_str("\n");
                } else {
                    c.push_str(" ");
                }
            }

            _ => {}
        }
    }

    c.flush_text();
    c.blocks
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
