//! Balanced-brace span scanning over script text.
//!
//! Inline application state is a JavaScript object literal, so a plain
//! regex cannot find where it ends: string values routinely contain `{`,
//! `}` and escaped quotes. The scanner walks the text once and tracks
//! whether it is inside a quoted string.

/// Quote character that opened the string currently being scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
}

impl Quote {
    fn closing_char(self) -> char {
        match self {
            Self::Single => '\'',
            Self::Double => '"',
        }
    }

    fn state(self) -> ScanState {
        match self {
            Self::Single => ScanState::SingleQuoted,
            Self::Double => ScanState::DoubleQuoted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    /// The previous character was a backslash inside a string.
    AfterEscape(Quote),
}

/// Returns the balanced `{...}` object that opens at byte offset `start`.
///
/// `start` must point at a `{`. Braces inside single- or double-quoted
/// strings do not count toward depth, and a backslash inside a string
/// escapes the next character. Returns `None` when `start` is not an
/// opening brace or the object never closes.
#[must_use]
pub fn balanced_object(text: &str, start: usize) -> Option<&str> {
    let rest = text.get(start..)?;
    if !rest.starts_with('{') {
        return None;
    }

    let mut state = ScanState::Normal;
    let mut depth: usize = 0;

    for (i, c) in rest.char_indices() {
        state = match state {
            ScanState::Normal => match c {
                '"' => ScanState::DoubleQuoted,
                '\'' => ScanState::SingleQuoted,
                '{' => {
                    depth += 1;
                    ScanState::Normal
                }
                '}' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(&rest[..=i]);
                    }
                    ScanState::Normal
                }
                _ => ScanState::Normal,
            },
            ScanState::SingleQuoted | ScanState::DoubleQuoted => {
                let quote = if state == ScanState::SingleQuoted {
                    Quote::Single
                } else {
                    Quote::Double
                };
                match c {
                    '\\' => ScanState::AfterEscape(quote),
                    c if c == quote.closing_char() => ScanState::Normal,
                    _ => state,
                }
            }
            ScanState::AfterEscape(quote) => quote.state(),
        };
    }

    None
}

/// Balanced object for the nearest `{` before byte offset `pos`.
#[must_use]
pub fn enclosing_object(text: &str, pos: usize) -> Option<&str> {
    let open = text.get(..pos)?.rfind('{')?;
    balanced_object(text, open)
}
