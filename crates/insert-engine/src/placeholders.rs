//! Bracket-delimited placeholder markers inside inserted content.

/// One `[name]` span, byte offsets relative to the content it was scanned
/// from. `inner_*` excludes the brackets.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PlaceholderSpan {
    pub start: usize,
    pub end: usize,
    pub inner_start: usize,
    pub inner_end: usize,
}

/// Scan `content` for placeholders in document order. Empty brackets are not
/// placeholders; nesting is not recognized.
pub fn scan(content: &str) -> Vec<PlaceholderSpan> {
    let mut spans = Vec::new();
    let bytes = content.as_bytes();
    let mut cursor = 0;
    while let Some(open) = find_byte(bytes, b'[', cursor) {
        let Some(close) = find_byte(bytes, b']', open + 1) else {
            break;
        };
        if close > open + 1 {
            spans.push(PlaceholderSpan {
                start: open,
                end: close + 1,
                inner_start: open + 1,
                inner_end: close,
            });
        }
        cursor = close + 1;
    }
    spans
}

fn find_byte(bytes: &[u8], needle: u8, from: usize) -> Option<usize> {
    bytes
        .iter()
        .skip(from)
        .position(|b| *b == needle)
        .map(|offset| from + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_placeholders_in_order() {
        let spans = scan("Summarize [topic] in [n] words");
        assert_eq!(spans.len(), 2);
        assert_eq!(&"Summarize [topic] in [n] words"[spans[0].inner_start..spans[0].inner_end], "topic");
        assert_eq!(&"Summarize [topic] in [n] words"[spans[1].inner_start..spans[1].inner_end], "n");
    }

    #[test]
    fn empty_brackets_are_skipped() {
        assert!(scan("nothing [] here").is_empty());
    }

    #[test]
    fn unclosed_bracket_stops_the_scan() {
        let spans = scan("one [a] then [broken");
        assert_eq!(spans.len(), 1);
    }
}
