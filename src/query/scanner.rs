//! Quote-aware helpers shared by the statement parsers.
//!
//! Statement parsing is pattern based. To keep keywords, commas and
//! operators that appear inside string literals from being matched, the
//! parsers run their patterns over a *masked* copy of the text where every
//! quoted character is replaced by filler of the same byte length. Offsets
//! found in the mask are then used to slice the original text.

const FILL: char = '_';

/// Replace the contents of quoted spans (quotes included) with filler.
///
/// An unterminated quote masks to the end of the input.
pub fn mask_quoted(text: &str) -> String {
    let mut masked = String::with_capacity(text.len());
    let mut quote: Option<char> = None;

    for ch in text.chars() {
        match quote {
            None if ch == '\'' || ch == '"' => {
                quote = Some(ch);
                push_fill(&mut masked, ch);
            }
            None => masked.push(ch),
            Some(open) => {
                if ch == open {
                    quote = None;
                }
                push_fill(&mut masked, ch);
            }
        }
    }

    masked
}

fn push_fill(out: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        out.push(FILL);
    }
}

/// Split on `sep` where it is neither quoted nor nested in parentheses.
/// Pieces are trimmed; an empty input yields no pieces.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let masked = mask_quoted(text);
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (pos, ch) in masked.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                pieces.push(text[start..pos].trim());
                start = pos + c.len_utf8();
            }
            _ => {}
        }
    }

    let tail = text[start..].trim();
    if !tail.is_empty() || !pieces.is_empty() {
        pieces.push(tail);
    }
    pieces
}

/// Whitespace tokenization that keeps quoted spans and parenthesized
/// groups (`DECIMAL(10, 2)`) in one token.
pub fn split_tokens(text: &str) -> Vec<&str> {
    let masked = mask_quoted(text);
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut start: Option<usize> = None;

    for (pos, ch) in masked.char_indices() {
        if ch.is_whitespace() && depth == 0 {
            if let Some(begin) = start.take() {
                tokens.push(&text[begin..pos]);
            }
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if start.is_none() {
            start = Some(pos);
        }
    }

    if let Some(begin) = start {
        tokens.push(&text[begin..]);
    }
    tokens
}

/// Split on a whitespace-delimited keyword (case-insensitive) outside quotes.
pub fn split_keyword<'a>(text: &'a str, keyword: &str) -> Vec<&'a str> {
    let masked = mask_quoted(text).to_ascii_uppercase();
    let keyword = keyword.to_ascii_uppercase();
    let bytes = masked.as_bytes();
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut search = 0;

    while let Some(found) = masked[search..].find(&keyword) {
        let at = search + found;
        let end = at + keyword.len();
        let spaced_before = at > 0 && bytes[at - 1].is_ascii_whitespace();
        let spaced_after = end < bytes.len() && bytes[end].is_ascii_whitespace();
        if spaced_before && spaced_after {
            pieces.push(text[start..at].trim());
            start = end;
        }
        search = end;
    }

    pieces.push(text[start..].trim());
    pieces
}

/// Byte offset of the first unquoted occurrence of `needle`
pub fn find_unquoted(text: &str, needle: &str) -> Option<usize> {
    mask_quoted(text).find(needle)
}

/// Like [`find_unquoted`], ignoring ASCII case
pub fn find_unquoted_ignore_case(text: &str, needle: &str) -> Option<usize> {
    mask_quoted(text)
        .to_ascii_uppercase()
        .find(&needle.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_preserves_byte_offsets() {
        let text = "name = 'é, AND x' AND id = 1";
        let masked = mask_quoted(text);
        assert_eq!(masked.len(), text.len());
        assert!(!masked.contains('é'));
        assert_eq!(masked.find("AND id"), text.rfind("AND id"));
    }

    #[test]
    fn test_split_top_level_respects_quotes_and_parens() {
        assert_eq!(
            split_top_level("1, 'a, b', \"c,d\", 4", ','),
            vec!["1", "'a, b'", "\"c,d\"", "4"]
        );
        assert_eq!(
            split_top_level("id INT, price DECIMAL(10,2)", ','),
            vec!["id INT", "price DECIMAL(10,2)"]
        );
        assert!(split_top_level("   ", ',').is_empty());
        assert_eq!(split_top_level("a,", ','), vec!["a", ""]);
    }

    #[test]
    fn test_split_tokens_keeps_groups() {
        assert_eq!(
            split_tokens("note TEXT DEFAULT 'hello world'\n NOT NULL"),
            vec!["note", "TEXT", "DEFAULT", "'hello world'", "NOT", "NULL"]
        );
        assert_eq!(split_tokens("price DECIMAL(10, 2)"), vec!["price", "DECIMAL(10, 2)"]);
    }

    #[test]
    fn test_split_keyword_needs_whitespace_on_both_sides() {
        assert_eq!(
            split_keyword("brand = 'X' and age > 3 AND city = 'Portland'", "AND"),
            vec!["brand = 'X'", "age > 3", "city = 'Portland'"]
        );
        assert_eq!(split_keyword("band = 'Tom AND Jerry'", "AND"), vec!["band = 'Tom AND Jerry'"]);
        assert_eq!(split_keyword("ORacle = 1", "OR"), vec!["ORacle = 1"]);
    }

    #[test]
    fn test_find_unquoted_skips_literals() {
        assert_eq!(find_unquoted("a = '>='", ">="), None);
        assert_eq!(find_unquoted("a >= 3", ">="), Some(2));
        assert_eq!(find_unquoted_ignore_case("name like 'a%'", " LIKE "), Some(4));
    }
}
