/// A run of a suggestion name, either plain or matching the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Match(&'a str),
}

/// Split `text` into runs, marking every case-insensitive occurrence of
/// `query`. The query is matched literally; matches do not overlap.
pub fn highlight<'a>(text: &'a str, query: &str) -> Vec<Segment<'a>> {
    let needle: Vec<char> = query.chars().collect();
    if needle.is_empty() {
        return if text.is_empty() { Vec::new() } else { vec![Segment::Plain(text)] };
    }

    let mut segments = Vec::new();
    let mut plain_start = 0;
    let mut pos = 0;

    while pos < text.len() {
        match match_len(&text[pos..], &needle) {
            Some(len) => {
                if plain_start < pos {
                    segments.push(Segment::Plain(&text[plain_start..pos]));
                }
                segments.push(Segment::Match(&text[pos..pos + len]));
                pos += len;
                plain_start = pos;
            }
            None => {
                pos += text[pos..].chars().next().map_or(1, char::len_utf8);
            }
        }
    }

    if plain_start < text.len() {
        segments.push(Segment::Plain(&text[plain_start..]));
    }
    segments
}

/// Byte length of the prefix of `haystack` matching `needle`, if any.
fn match_len(haystack: &str, needle: &[char]) -> Option<usize> {
    let mut chars = haystack.char_indices();
    let mut end = 0;
    for &wanted in needle {
        let (i, c) = chars.next()?;
        if !same_letter(c, wanted) {
            return None;
        }
        end = i + c.len_utf8();
    }
    Some(end)
}

fn same_letter(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use Segment::{Match, Plain};

    #[test]
    fn marks_case_insensitive_prefix() {
        assert_eq!(highlight("London", "lon"), vec![Match("Lon"), Plain("don")]);
    }

    #[test]
    fn marks_every_occurrence() {
        assert_eq!(
            highlight("Baden-Baden", "baden"),
            vec![Match("Baden"), Plain("-"), Match("Baden")]
        );
    }

    #[test]
    fn no_match_is_one_plain_run() {
        assert_eq!(highlight("Paris", "xyz"), vec![Plain("Paris")]);
        assert_eq!(highlight("Paris", ""), vec![Plain("Paris")]);
    }

    #[test]
    fn query_is_literal_not_a_pattern() {
        assert_eq!(highlight("St. Louis", "t."), vec![Plain("S"), Match("t."), Plain(" Louis")]);
        assert_eq!(highlight("Stalouis", "t."), vec![Plain("Stalouis")]);
    }

    #[test]
    fn handles_multibyte_text() {
        assert_eq!(highlight("Zürich", "ZÜR"), vec![Match("Zür"), Plain("ich")]);
        assert_eq!(highlight("Malmö", "ö"), vec![Plain("Malm"), Match("ö")]);
    }
}
