use std::ops::Range;

use regex::RegexBuilder;

pub const HIGHLIGHT_OPEN: &str = "<span class=\"highlight\">";
pub const HIGHLIGHT_CLOSE: &str = "</span>";

const UNSAFE_CHARS: [char; 5] = ['&', '<', '>', '"', '\''];

/// Sanitized text plus the merged, ordered byte ranges that matched the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Highlighted {
    text: String,
    spans: Vec<Range<usize>>,
}

impl Highlighted {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn spans(&self) -> &[Range<usize>] {
        &self.spans
    }

    pub fn matched(&self) -> Vec<&str> {
        self.spans.iter().map(|span| &self.text[span.clone()]).collect()
    }

    pub fn render(&self, open: &str, close: &str) -> String {
        let marker_len = self.spans.len() * (open.len() + close.len());
        let mut out = String::with_capacity(self.text.len() + marker_len);
        let mut cursor = 0;
        for span in &self.spans {
            out.push_str(&self.text[cursor..span.start]);
            out.push_str(open);
            out.push_str(&self.text[span.clone()]);
            out.push_str(close);
            cursor = span.end;
        }
        out.push_str(&self.text[cursor..]);
        out
    }

    pub fn to_markup(&self) -> String {
        self.render(HIGHLIGHT_OPEN, HIGHLIGHT_CLOSE)
    }
}

pub fn sanitize(input: &str) -> String {
    input.chars().filter(|c| !UNSAFE_CHARS.contains(c)).collect()
}

pub fn highlight_spans(text: &str, query: &str) -> Highlighted {
    let text = sanitize(text);
    let query = sanitize(query);

    let mut spans: Vec<Range<usize>> = Vec::new();
    for token in query.split_whitespace() {
        let Ok(pattern) = RegexBuilder::new(&regex::escape(token))
            .case_insensitive(true)
            .build()
        else {
            continue;
        };
        spans.extend(pattern.find_iter(&text).map(|found| found.range()));
    }

    Highlighted {
        spans: merge_spans(spans),
        text,
    }
}

/// Wraps every case-insensitive occurrence of each query word in the highlight
/// marker. The result never carries `& < > " '` outside the marker itself.
pub fn highlight(text: &str, query: &str) -> String {
    highlight_spans(text, query).to_markup()
}

fn merge_spans(mut spans: Vec<Range<usize>>) -> Vec<Range<usize>> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| b.end.cmp(&a.end)));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => {
                last.end = last.end.max(span.end);
            }
            _ => merged.push(span),
        }
    }
    merged
}
