//! Bracket-depth scanner for generated TypeScript.
//!
//! One state machine classifies every character as code, quoted text or
//! comment and tracks the nesting depth of `[`, `{` and `(`. The locator and
//! the codec's array/object splitter are both built on [`scan`]. It knows
//! about string literals (single, double, template) and comments, nothing
//! else: regular expression literals and `${}` nesting inside template
//! literals are not understood.

use std::ops::ControlFlow;

/// Lexical class of a scanned character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexeme {
    /// Regular source text, including brackets and whitespace.
    Code,
    /// Part of a string literal, quotes included.
    Quoted,
    /// Part of a line or block comment, delimiters included.
    Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Quoted(char),
    Escaped(char),
    LineComment,
    BlockCommentOpen,
    BlockComment,
    BlockCommentClose,
}

/// Walk `text`, calling `visit(byte_index, char, lexeme, depth)` for every character.
///
/// For an opening bracket `depth` is the level it opens; its matching closing
/// bracket reports the same level. Scanning stops when `visit` breaks.
pub fn scan<F>(text: &str, mut visit: F)
where
    F: FnMut(usize, char, Lexeme, usize) -> ControlFlow<()>,
{
    let mut state = State::Code;
    let mut depth = 0usize;
    let mut chars = text.char_indices().peekable();

    while let Some((index, ch)) = chars.next() {
        let next = chars.peek().map(|&(_, c)| c);
        let (lexeme, level) = match state {
            State::Code => match ch {
                '\'' | '"' | '`' => {
                    state = State::Quoted(ch);
                    (Lexeme::Quoted, depth)
                }
                '/' if next == Some('/') => {
                    state = State::LineComment;
                    (Lexeme::Comment, depth)
                }
                '/' if next == Some('*') => {
                    state = State::BlockCommentOpen;
                    (Lexeme::Comment, depth)
                }
                '[' | '{' | '(' => {
                    depth += 1;
                    (Lexeme::Code, depth - 1)
                }
                ']' | '}' | ')' => {
                    depth = depth.saturating_sub(1);
                    (Lexeme::Code, depth)
                }
                _ => (Lexeme::Code, depth),
            },
            State::Quoted(quote) => {
                if ch == '\\' {
                    state = State::Escaped(quote);
                } else if ch == quote {
                    state = State::Code;
                }
                (Lexeme::Quoted, depth)
            }
            State::Escaped(quote) => {
                state = State::Quoted(quote);
                (Lexeme::Quoted, depth)
            }
            State::LineComment => {
                if ch == '\n' {
                    state = State::Code;
                    (Lexeme::Code, depth)
                } else {
                    (Lexeme::Comment, depth)
                }
            }
            State::BlockCommentOpen => {
                state = State::BlockComment;
                (Lexeme::Comment, depth)
            }
            State::BlockComment => {
                if ch == '*' && next == Some('/') {
                    state = State::BlockCommentClose;
                }
                (Lexeme::Comment, depth)
            }
            State::BlockCommentClose => {
                state = State::Code;
                (Lexeme::Comment, depth)
            }
        };

        if visit(index, ch, lexeme, level).is_break() {
            return;
        }
    }
}

/// Split `text` at every top-level `separator` outside strings and comments.
///
/// Pieces are returned untrimmed; a trailing separator yields a final
/// whitespace-only piece.
#[must_use]
pub fn split_top_level(text: &str, separator: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    scan(text, |index, ch, lexeme, depth| {
        if ch == separator && lexeme == Lexeme::Code && depth == 0 {
            pieces.push(&text[start..index]);
            start = index + ch.len_utf8();
        }
        ControlFlow::Continue(())
    });
    pieces.push(&text[start..]);
    pieces
}

/// Split an object entry at its first top-level `:`.
#[must_use]
pub fn split_key_value(entry: &str) -> Option<(&str, &str)> {
    let mut colon = None;
    scan(entry, |index, ch, lexeme, depth| {
        if ch == ':' && lexeme == Lexeme::Code && depth == 0 {
            colon = Some(index);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    colon.map(|index| (&entry[..index], &entry[index + 1..]))
}

/// Byte range of `text` from its first to its last character of code,
/// ignoring surrounding whitespace and comments.
#[must_use]
pub fn code_bounds(text: &str) -> Option<(usize, usize)> {
    let mut first = None;
    let mut last_end = 0;
    scan(text, |index, ch, lexeme, _| {
        if lexeme != Lexeme::Comment && !ch.is_whitespace() {
            first.get_or_insert(index);
            last_end = index + ch.len_utf8();
        }
        ControlFlow::Continue(())
    });
    first.map(|start| (start, last_end))
}

/// Strip surrounding whitespace and comments, keeping interior comments.
#[must_use]
pub fn trim_code(text: &str) -> &str {
    code_bounds(text).map_or("", |(start, end)| &text[start..end])
}

/// Byte index of the bracket closing the one at `open_index`.
///
/// Returns `None` if `open_index` is not an opening bracket or the bracket is
/// never closed.
#[must_use]
pub fn matching_close(text: &str, open_index: usize) -> Option<usize> {
    let tail = text.get(open_index..)?;
    if !tail.starts_with(['[', '{', '(']) {
        return None;
    }
    let mut close = None;
    scan(tail, |index, ch, lexeme, depth| {
        if index > 0 && lexeme == Lexeme::Code && depth == 0 && matches!(ch, ']' | '}' | ')') {
            close = Some(open_index + index);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    close
}

/// Byte index of the first `[` or `{` in code.
#[must_use]
pub fn first_opening_bracket(text: &str) -> Option<usize> {
    let mut found = None;
    scan(text, |index, ch, lexeme, _| {
        if lexeme == Lexeme::Code && matches!(ch, '[' | '{') {
            found = Some(index);
            return ControlFlow::Break(());
        }
        ControlFlow::Continue(())
    });
    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trimmed(pieces: Vec<&str>) -> Vec<&str> {
        pieces
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    #[test]
    fn test_split_respects_nesting() {
        let pieces = split_top_level("a, [b, c], { d: e, f: g }, h(i, j)", ',');
        assert_eq!(trimmed(pieces), ["a", "[b, c]", "{ d: e, f: g }", "h(i, j)"]);
    }

    #[test]
    fn test_split_respects_strings() {
        let pieces = split_top_level(r#"'a,b', "c,d", `e,f`, 'it\'s, fine'"#, ',');
        assert_eq!(
            trimmed(pieces),
            ["'a,b'", "\"c,d\"", "`e,f`", r"'it\'s, fine'"]
        );
    }

    #[test]
    fn test_split_respects_comments() {
        let text = "a, /* b, c */ d, // e, f\n g";
        let pieces = split_top_level(text, ',');
        assert_eq!(trimmed(pieces), ["a", "/* b, c */ d", "// e, f\n g"]);
    }

    #[test]
    fn test_split_trailing_separator() {
        let pieces = split_top_level("a, b,", ',');
        assert_eq!(pieces.len(), 3);
        assert_eq!(trimmed(pieces), ["a", "b"]);
    }

    #[test]
    fn test_brackets_in_strings_ignored() {
        assert_eq!(matching_close("['[', ']']", 0), Some(9));
        assert_eq!(matching_close("{ a: '}' }", 0), Some(9));
    }

    #[test]
    fn test_brackets_in_comments_ignored() {
        let text = "[\n  // ]\n  /* [ */ 1\n]";
        assert_eq!(matching_close(text, 0), Some(text.len() - 1));
    }

    #[test]
    fn test_block_comment_edge() {
        // "/*/" does not close the comment it opens
        let text = "[ /*/ ] */ 1 ]";
        assert_eq!(matching_close(text, 0), Some(text.len() - 1));
    }

    #[test]
    fn test_matching_close_unbalanced() {
        assert_eq!(matching_close("[1, [2]", 0), None);
        assert_eq!(matching_close("abc", 0), None);
    }

    #[test]
    fn test_split_key_value() {
        assert_eq!(split_key_value("a: b"), Some(("a", " b")));
        assert_eq!(
            split_key_value("'x:y': { z: 1 }"),
            Some(("'x:y'", " { z: 1 }"))
        );
        assert_eq!(split_key_value("shorthand"), None);
    }

    #[test]
    fn test_trim_code() {
        assert_eq!(trim_code("\n  // lead\n  'a' // trail\n"), "'a'");
        assert_eq!(trim_code("/* a */ x /* b */ y /* c */"), "x /* b */ y");
        assert_eq!(trim_code("  // only a comment\n"), "");
    }

    #[test]
    fn test_code_bounds() {
        assert_eq!(code_bounds("  a, // b\n"), Some((2, 4)));
        assert_eq!(code_bounds("/* x */"), None);
    }

    #[test]
    fn test_first_opening_bracket() {
        assert_eq!(first_opening_bracket("x: Record<'a', 'b'> = {"), Some(22));
        assert_eq!(first_opening_bracket("'[' + foo"), None);
    }
}
