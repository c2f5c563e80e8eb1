/// Classification of a label lexer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokKind {
    /// A run of word characters: keywords, identifiers, numbers, dates.
    Word,
    /// `"…"` text; `terminated` is false when input ended first.
    String {
        /// Whether the closing quote was found.
        terminated: bool,
    },
    /// `'…'` symbol; `terminated` is false when input ended first.
    Symbol {
        /// Whether the closing quote was found.
        terminated: bool,
    },
    /// `<…>` units expression; `terminated` is false when no `>` followed.
    Units {
        /// Whether the closing `>` was found.
        terminated: bool,
    },
    /// `/* … */`; `terminated` is false when input ended first.
    Comment {
        /// Whether the closing `*/` was found.
        terminated: bool,
    },
    /// `=`
    Equals,
    /// `^` pointer marker.
    Caret,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// Any other single character.
    Other,
}

/// A token that borrows its text directly from the source input with no allocation.
///
/// `text` is always exactly `&input[start..end]`, delimiters included.
#[derive(Debug)]
pub struct Token<'a> {
    /// The classification of this token.
    pub kind: TokKind,
    /// Borrowed slice of the source input for this token.
    pub text: &'a str,
    /// Byte offset of the first character.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
}

impl Token<'_> {
    /// Text between the delimiters of a string, symbol, units, or comment token.
    pub fn inner(&self) -> &str {
        let (open, close) = match self.kind {
            TokKind::String { terminated }
            | TokKind::Symbol { terminated }
            | TokKind::Units { terminated } => (1, usize::from(terminated)),
            TokKind::Comment { terminated } => (2, if terminated { 2 } else { 0 }),
            _ => (0, 0),
        };
        &self.text[open..self.text.len() - close]
    }
}

/// Whether `b` may appear inside a word token.
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b':' | b'+' | b'-' | b'#')
}

/// Tokenize label text. Whitespace and line terminators (CR, LF, CRLF) are
/// separators only and produce no tokens.
///
/// Non-ASCII bytes never match a delimiter test, so they are carried inside
/// whatever token surrounds them or emitted as `Other`.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut toks = Vec::new();
    let b = input.as_bytes();
    let mut i = 0usize;
    while i < b.len() {
        let c = b[i];
        let start = i;
        let kind = match c {
            c if c.is_ascii_whitespace() => {
                i += 1;
                continue;
            }
            b'"' | b'\'' => {
                i += 1;
                while i < b.len() && b[i] != c {
                    i += 1;
                }
                let terminated = i < b.len();
                if terminated {
                    i += 1;
                }
                if c == b'"' {
                    TokKind::String { terminated }
                } else {
                    TokKind::Symbol { terminated }
                }
            }
            b'<' => {
                i += 1;
                while i < b.len() && b[i] != b'>' && b[i] != b'\n' && b[i] != b'\r' {
                    i += 1;
                }
                let terminated = i < b.len() && b[i] == b'>';
                if terminated {
                    i += 1;
                }
                TokKind::Units { terminated }
            }
            b'/' if b.get(i + 1) == Some(&b'*') => {
                i += 2;
                let mut terminated = false;
                while i < b.len() {
                    if b[i] == b'*' && b.get(i + 1) == Some(&b'/') {
                        i += 2;
                        terminated = true;
                        break;
                    }
                    i += 1;
                }
                TokKind::Comment { terminated }
            }
            b'=' => single(&mut i, TokKind::Equals),
            b'^' => single(&mut i, TokKind::Caret),
            b'(' => single(&mut i, TokKind::LParen),
            b')' => single(&mut i, TokKind::RParen),
            b'{' => single(&mut i, TokKind::LBrace),
            b'}' => single(&mut i, TokKind::RBrace),
            b',' => single(&mut i, TokKind::Comma),
            c if is_word_byte(c) => {
                i += 1;
                while i < b.len() && is_word_byte(b[i]) {
                    i += 1;
                }
                TokKind::Word
            }
            _ => {
                // Advance a whole UTF-8 character so slices stay on boundaries.
                i += 1;
                while i < b.len() && !input.is_char_boundary(i) {
                    i += 1;
                }
                TokKind::Other
            }
        };
        toks.push(Token {
            kind,
            text: &input[start..i],
            start,
            end: i,
        });
    }
    toks
}

fn single(i: &mut usize, kind: TokKind) -> TokKind {
    *i += 1;
    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn assignment() {
        let toks = tokenize("LINES = 512\r\n");
        assert_eq!(toks.len(), 3);
        assert_eq!(toks[0].text, "LINES");
        assert_eq!(toks[1].kind, TokKind::Equals);
        assert_eq!(toks[2].text, "512");
    }

    #[test]
    fn pointer_with_units() {
        assert_eq!(
            kinds("^IMAGE = 1234 <BYTES>"),
            vec![
                TokKind::Caret,
                TokKind::Word,
                TokKind::Equals,
                TokKind::Word,
                TokKind::Units { terminated: true },
            ]
        );
    }

    #[test]
    fn strings_span_lines() {
        let toks = tokenize("DESC = \"two\nlines\"");
        assert_eq!(toks[2].kind, TokKind::String { terminated: true });
        assert_eq!(toks[2].inner(), "two\nlines");
    }

    #[test]
    fn unterminated_string_runs_to_end() {
        let toks = tokenize("A = \"open");
        assert_eq!(toks[2].kind, TokKind::String { terminated: false });
        assert_eq!(toks[2].inner(), "open");
    }

    #[test]
    fn comments_are_tokens() {
        let toks = tokenize("/* note */ A = 1 /* open");
        assert_eq!(toks[0].kind, TokKind::Comment { terminated: true });
        assert_eq!(toks[0].inner(), " note ");
        assert_eq!(toks.last().unwrap().kind, TokKind::Comment { terminated: false });
    }

    #[test]
    fn dates_and_radix_are_single_words() {
        let toks = tokenize("T = 2001-02-03T04:05:06.5Z M = 16#FF#");
        assert_eq!(toks[2].text, "2001-02-03T04:05:06.5Z");
        assert_eq!(toks[5].text, "16#FF#");
    }

    #[test]
    fn non_ascii_is_other() {
        let toks = tokenize("A = \u{00e9}");
        assert_eq!(toks[2].kind, TokKind::Other);
        assert_eq!(toks[2].text, "\u{00e9}");
    }
}
