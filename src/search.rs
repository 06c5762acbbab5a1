//! Case-insensitive search within extracted text.
//!
//! The query is matched literally: characters that would be special in a
//! regular expression carry no meaning here.

/// A run of text that either matches the query or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub is_match: bool,
}

/// Split `text` into ordered segments, flagging each occurrence of `query`.
///
/// Concatenating the segments always reproduces `text`. An empty query yields
/// the whole text as a single non-matching segment.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut segments = Vec::new();
    let mut last = 0;
    for (start, end) in find_matches(text, query) {
        if start > last {
            segments.push(Segment {
                text: &text[last..start],
                is_match: false,
            });
        }
        segments.push(Segment {
            text: &text[start..end],
            is_match: true,
        });
        last = end;
    }
    if last < text.len() {
        segments.push(Segment {
            text: &text[last..],
            is_match: false,
        });
    }
    segments
}

/// Number of non-overlapping occurrences of `query` in `text`.
pub fn count_matches(text: &str, query: &str) -> usize {
    find_matches(text, query).len()
}

/// Byte ranges of non-overlapping case-insensitive matches, left to right.
pub fn find_matches(text: &str, query: &str) -> Vec<(usize, usize)> {
    let needle: Vec<char> = query.chars().flat_map(char::to_lowercase).collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches = Vec::new();
    let mut skip_until = 0;
    for (start, _) in text.char_indices() {
        if start < skip_until {
            continue;
        }
        if let Some(end) = match_at(text, start, &needle) {
            matches.push((start, end));
            skip_until = end;
        }
    }
    matches
}

/// If `needle` (already lowercased) matches at byte `start`, return the end
/// byte offset. The match must end on a character boundary of `text`.
fn match_at(text: &str, start: usize, needle: &[char]) -> Option<usize> {
    let mut pos = 0;
    for (offset, c) in text[start..].char_indices() {
        for lower in c.to_lowercase() {
            if pos == needle.len() || needle[pos] != lower {
                return None;
            }
            pos += 1;
        }
        if pos == needle.len() {
            return Some(start + offset + c.len_utf8());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joined(segments: &[Segment<'_>]) -> String {
        segments.iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_highlight_case_insensitive() {
        let segments = highlight("Hello world, HELLO again", "hello");
        assert_eq!(
            segments,
            vec![
                Segment {
                    text: "Hello",
                    is_match: true
                },
                Segment {
                    text: " world, ",
                    is_match: false
                },
                Segment {
                    text: "HELLO",
                    is_match: true
                },
                Segment {
                    text: " again",
                    is_match: false
                },
            ]
        );
    }

    #[test]
    fn test_empty_query_returns_whole_text() {
        let segments = highlight("some text", "");
        assert_eq!(segments.len(), 1);
        assert!(!segments[0].is_match);
        assert!(highlight("", "x").is_empty());
    }

    #[test]
    fn test_regex_characters_are_literal() {
        assert_eq!(count_matches("cost is $5.00 (approx.)", "(approx.)"), 1);
        assert_eq!(count_matches("a.c abc", "a.c"), 1);
        assert_eq!(count_matches("x*y", "*"), 1);
    }

    #[test]
    fn test_matches_do_not_overlap() {
        assert_eq!(find_matches("aaaa", "aa"), vec![(0, 2), (2, 4)]);
    }

    #[test]
    fn test_unicode_text_reassembles() {
        let text = "Straße und STRASSE, Ärger und ärger";
        let segments = highlight(text, "ärger");
        assert_eq!(joined(&segments), text);
        assert_eq!(segments.iter().filter(|s| s.is_match).count(), 2);
    }

    #[test]
    fn test_no_match() {
        let segments = highlight("nothing here", "absent");
        assert_eq!(segments.len(), 1);
        assert_eq!(count_matches("nothing here", "absent"), 0);
    }
}
