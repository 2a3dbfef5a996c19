// Markdown import/export for marked documents
// A note remembers its Markdown source. Writing an edited document back only
// rewrites link syntax, everything else is kept byte for byte.

use crate::host::{LinkHost, LinkMark, LinkSpan, TextRange};
use crate::marked_document::MarkedDocument;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkdownError {
    /// The document text no longer matches the parsed note
    TextChanged,
    /// A new link over this range would cut through other markup
    Unplaceable(TextRange),
}

impl fmt::Display for MarkdownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkdownError::TextChanged => {
                write!(f, "the note text changed, links cannot be written back")
            }
            MarkdownError::Unplaceable(range) => write!(
                f,
                "cannot add a link over {range} without rewriting the surrounding markup"
            ),
        }
    }
}

impl std::error::Error for MarkdownError {}

/// A link together with where its syntax and its text sit in the source
#[derive(Debug, Clone)]
struct SourceLink {
    span: LinkSpan,
    source: Range<usize>,
    inner: Range<usize>,
}

/// A piece of flattened text and the source bytes it came from
#[derive(Debug, Clone)]
struct TextRun {
    chars: Range<usize>,
    source: Range<usize>,
    /// Source and text are identical, so every position maps
    verbatim: bool,
    block: usize,
    /// Open emphasis-like spans around the run
    context: Vec<usize>,
    /// Outside images and code blocks
    placeable: bool,
}

impl TextRun {
    fn source_offset(&self, pos: usize, source: &str) -> Option<usize> {
        if pos == self.chars.start {
            return Some(self.source.start);
        }
        if pos == self.chars.end {
            return Some(self.source.end);
        }
        if !self.verbatim {
            return None;
        }
        source[self.source.clone()]
            .char_indices()
            .nth(pos - self.chars.start)
            .map(|(i, _)| self.source.start + i)
    }
}

struct OpenLink {
    start: usize,
    href: String,
    source: Range<usize>,
    inner: Option<Range<usize>>,
}

/// A parsed Markdown note
pub struct MarkdownNote {
    source: String,
    document: MarkedDocument,
    links: Vec<SourceLink>,
    runs: Vec<TextRun>,
}

impl MarkdownNote {
    /// Parse Markdown into plain text with link marks.
    ///
    /// Blocks are separated by a blank line, soft and hard breaks become a
    /// newline. Positions of the resulting links are character offsets into
    /// the flattened text.
    pub fn parse(source: impl Into<String>) -> Self {
        let source = source.into();
        let mut flat = Flattener::default();
        let mut links = Vec::new();
        let mut runs = Vec::new();
        let mut open_link: Option<OpenLink> = None;
        let mut inline_stack: Vec<usize> = Vec::new();
        let mut next_inline = 0usize;
        let mut block = 0usize;
        let mut image_depth = 0usize;
        let mut in_code_block = false;

        for (event, range) in Parser::new(&source).into_offset_iter() {
            if let Some(link) = &mut open_link
                && !matches!(event, Event::End(TagEnd::Link))
            {
                link.inner = Some(match link.inner.take() {
                    Some(inner) => inner.start.min(range.start)..inner.end.max(range.end),
                    None => range.clone(),
                });
            }

            match event {
                Event::Start(Tag::Link { dest_url, .. }) => {
                    flat.break_block();
                    open_link = Some(OpenLink {
                        start: flat.len,
                        href: dest_url.to_string(),
                        source: range,
                        inner: None,
                    });
                }
                Event::End(TagEnd::Link) => {
                    if let Some(link) = open_link.take()
                        && link.start < flat.len
                        && let Some(inner) = link.inner
                    {
                        links.push(SourceLink {
                            span: LinkSpan {
                                range: TextRange::new(link.start, flat.len),
                                mark: LinkMark::new(link.href),
                            },
                            source: link.source,
                            inner,
                        });
                    }
                }
                Event::Start(Tag::Emphasis | Tag::Strong | Tag::Strikethrough) => {
                    inline_stack.push(next_inline);
                    next_inline += 1;
                }
                Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough) => {
                    inline_stack.pop();
                }
                Event::Start(Tag::Image { .. }) => image_depth += 1,
                Event::End(TagEnd::Image) => image_depth = image_depth.saturating_sub(1),
                Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                Event::Text(t) | Event::Code(t) => {
                    if let Some(chars) = flat.push(&t) {
                        runs.push(TextRun {
                            chars,
                            verbatim: source[range.clone()] == *t,
                            source: range,
                            block,
                            context: inline_stack.clone(),
                            placeable: image_depth == 0 && !in_code_block,
                        });
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    if let Some(chars) = flat.push("\n") {
                        runs.push(TextRun {
                            chars,
                            source: range,
                            verbatim: false,
                            block,
                            context: inline_stack.clone(),
                            placeable: false,
                        });
                    }
                }
                Event::End(
                    TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::CodeBlock | TagEnd::Item,
                ) => {
                    flat.block_ended = true;
                    in_code_block = false;
                    block += 1;
                }
                _ => {}
            }
        }

        let spans = links.iter().map(|link: &SourceLink| link.span.clone()).collect();
        MarkdownNote {
            document: MarkedDocument::with_links(flat.text, spans),
            source,
            links,
            runs,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The note as a fresh document
    pub fn document(&self) -> MarkedDocument {
        self.document.clone()
    }

    /// Write `doc` back as Markdown.
    ///
    /// Unchanged links keep their syntax, removed links leave their text
    /// behind, re-pointed links get a new destination and new links are
    /// wrapped around their text. Fails when the text itself was changed or
    /// when a new link would cut through other markup.
    pub fn render(&self, doc: &MarkedDocument) -> Result<String, MarkdownError> {
        if doc.text() != self.document.text() {
            return Err(MarkdownError::TextChanged);
        }
        let current = doc.links();
        if current == self.document.links() {
            return Ok(self.source.clone());
        }

        let mut added: Vec<LinkSpan> = current
            .iter()
            .filter(|span| !self.links.iter().any(|link| link.span == **span))
            .cloned()
            .collect();
        let mut edits: Vec<(Range<usize>, String, TextRange)> = Vec::new();

        for link in &self.links {
            if current.contains(&link.span) {
                continue;
            }
            let range = link.span.range;
            if let Some(i) = added.iter().position(|span| span.range == range) {
                let span = added.remove(i);
                let inner = &self.source[link.inner.clone()];
                let syntax = format!("[{}]({})", inner, destination(&span.mark.href));
                edits.push((link.source.clone(), syntax, range));
            } else {
                edits.push((link.source.start..link.inner.start, String::new(), range));
                edits.push((link.inner.end..link.source.end, String::new(), range));
            }
        }

        for span in &added {
            let (from, to) = self
                .placement(span.range)
                .ok_or(MarkdownError::Unplaceable(span.range))?;
            edits.push((from..from, "[".to_string(), span.range));
            edits.push((to..to, format!("]({})", destination(&span.mark.href)), span.range));
        }
        edits.sort_by_key(|(source, _, _)| (source.start, source.end));

        let mut out = String::with_capacity(self.source.len() + 16);
        let mut pos = 0usize;
        for (source, replacement, range) in edits {
            if source.start < pos {
                return Err(MarkdownError::Unplaceable(range));
            }
            out.push_str(&self.source[pos..source.start]);
            out.push_str(&replacement);
            pos = source.end;
        }
        out.push_str(&self.source[pos..]);
        Ok(out)
    }

    /// Source offsets for the opening and closing bracket of a new link
    fn placement(&self, range: TextRange) -> Option<(usize, usize)> {
        let first = self.runs.iter().find(|run| run.chars.contains(&range.from))?;
        let last = self
            .runs
            .iter()
            .find(|run| run.chars.start < range.to && range.to <= run.chars.end)?;
        if !first.placeable
            || !last.placeable
            || first.block != last.block
            || first.context != last.context
        {
            return None;
        }

        let from = first.source_offset(range.from, &self.source)?;
        let to = last.source_offset(range.to, &self.source)?;
        if from > to
            || escaped(&self.source, from)
            || escaped(&self.source, to)
            || !balanced_brackets(&self.source[from..to])
        {
            return None;
        }
        Some((from, to))
    }
}

/// Parse Markdown into a document, dropping the source
pub fn parse_markdown(content: &str) -> MarkedDocument {
    MarkdownNote::parse(content).document
}

#[derive(Default)]
struct Flattener {
    text: String,
    len: usize,
    block_ended: bool,
}

impl Flattener {
    /// Emit the pending blank line between blocks, if any
    fn break_block(&mut self) {
        if self.block_ended && !self.text.is_empty() {
            self.text.push_str("\n\n");
            self.len += 2;
        }
        self.block_ended = false;
    }

    fn push(&mut self, s: &str) -> Option<Range<usize>> {
        if s.is_empty() {
            return None;
        }
        self.break_block();
        let start = self.len;
        self.text.push_str(s);
        self.len += s.chars().count();
        Some(start..self.len)
    }
}

/// Whether the byte at `pos` is preceded by an odd run of backslashes
fn escaped(source: &str, pos: usize) -> bool {
    source[..pos].chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn balanced_brackets(source: &str) -> bool {
    let mut depth = 0i32;
    let mut chars = source.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn destination(href: &str) -> String {
    if href.chars().any(|c| c.is_whitespace() || c == '(' || c == ')') {
        format!("<{}>", href)
    } else {
        href.to_string()
    }
}
