use once_cell::sync::Lazy;
use regex::Regex;

// Non-greedy so "**a** and **b**" yields two separate spans. A lone
// unmatched ** never matches and stays literal text.
static STRONG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Strong(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Inline> },
    List(Vec<Vec<Inline>>),
    Paragraph(Vec<Inline>),
}

pub fn parse_inlines(text: &str) -> Vec<Inline> {
    let mut spans = Vec::new();
    let mut last = 0;

    for caps in STRONG_RE.captures_iter(text) {
        let whole = caps.get(0).unwrap();
        if whole.start() > last {
            spans.push(Inline::Text(text[last..whole.start()].to_string()));
        }
        spans.push(Inline::Strong(caps[1].to_string()));
        last = whole.end();
    }
    if last < text.len() {
        spans.push(Inline::Text(text[last..].to_string()));
    }

    spans
}

// A heading line is the entire line: "#"-run of 1..=3 at column zero, one
// space, then the heading text (which may be empty). "####" and "#x" fall
// through to paragraph handling.
fn heading_level(line: &str) -> Option<(u8, &str)> {
    for (level, prefix) in [(3u8, "### "), (2, "## "), (1, "# ")] {
        if let Some(rest) = line.strip_prefix(prefix) {
            return Some((level, rest));
        }
    }
    None
}

pub fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut open_list: Option<Vec<Vec<Inline>>> = None;

    for line in text.lines() {
        if let Some((level, rest)) = heading_level(line) {
            if let Some(items) = open_list.take() {
                blocks.push(Block::List(items));
            }
            blocks.push(Block::Heading {
                level,
                spans: parse_inlines(rest),
            });
            continue;
        }

        let stripped = line.trim();
        if let Some(item) = stripped.strip_prefix("- ") {
            open_list
                .get_or_insert_with(Vec::new)
                .push(parse_inlines(item));
            continue;
        }

        // Blank lines render nothing and leave an open list open.
        if stripped.is_empty() {
            continue;
        }

        if let Some(items) = open_list.take() {
            blocks.push(Block::List(items));
        }
        blocks.push(Block::Paragraph(parse_inlines(stripped)));
    }

    if let Some(items) = open_list.take() {
        blocks.push(Block::List(items));
    }

    blocks
}

fn render_inlines(spans: &[Inline]) -> String {
    let mut out = String::new();
    for span in spans {
        match span {
            Inline::Text(t) => out.push_str(t),
            Inline::Strong(t) => {
                out.push_str("<b>");
                out.push_str(t);
                out.push_str("</b>");
            }
        }
    }
    out
}

pub fn format(text: &str) -> String {
    let mut lines = Vec::new();

    for block in parse(text) {
        match block {
            Block::Heading { level, spans } => {
                lines.push(format!("<h{0}>{1}</h{0}>", level, render_inlines(&spans)));
            }
            Block::List(items) => {
                lines.push("<ul>".to_string());
                for item in &items {
                    lines.push(format!("<li>{}</li>", render_inlines(item)));
                }
                lines.push("</ul>".to_string());
            }
            Block::Paragraph(spans) => {
                lines.push(format!("<p>{}</p>", render_inlines(&spans)));
            }
        }
    }

    lines.join("\n")
}
