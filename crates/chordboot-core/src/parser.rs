//! Tokenizer shared by every chordboot configuration file.
//!
//! A line holds whitespace separated fields. A `"` opens a quoted span in
//! which whitespace and `#` are literal, and an unquoted `#` ends the line.
//! Quoting is positional rather than shell-like:
//!
//! * an opening quote starts the token afresh, dropping anything unquoted
//!   that preceded it in the same field;
//! * a closing quote ends the token text, and unquoted characters that follow
//!   it up to the next separator are ignored;
//! * an unterminated quote runs to the end of the line.
//!
//! `""` is a valid, empty token and is distinct from "no more tokens".

/// Cursor over the fields of one configuration line.
///
/// Tokens borrow from the line, so repeated calls walk the same buffer the
/// way the loaders need: label then path, name then values, and so on.
#[derive(Debug, Clone)]
pub struct LineParser<'a> {
    line: &'a str,
    pos: usize,
    finished: bool,
}

impl<'a> LineParser<'a> {
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            pos: 0,
            finished: false,
        }
    }

    /// Return the next field, or `None` once the line (or a comment) ends.
    pub fn next_token(&mut self) -> Option<&'a str> {
        if self.finished {
            return None;
        }

        let bytes = self.line.as_bytes();
        let mut start = self.pos;
        let mut end: Option<usize> = None;
        let mut quoted = false;
        let mut seen = false;

        for (idx, byte) in bytes.iter().enumerate().skip(self.pos) {
            match byte {
                b'"' => {
                    seen = true;
                    if quoted {
                        end = Some(idx);
                    } else {
                        start = idx + 1;
                        end = None;
                    }
                    quoted = !quoted;
                }
                b' ' | b'\t' | b'\n' | b'\r' => {
                    if quoted {
                        continue;
                    }
                    if !seen {
                        start = idx + 1;
                        continue;
                    }
                    self.pos = idx + 1;
                    return Some(&self.line[start..end.unwrap_or(idx)]);
                }
                b'#' if !quoted => {
                    self.finished = true;
                    return seen.then(|| &self.line[start..end.unwrap_or(idx)]);
                }
                _ => seen = true,
            }
        }

        self.finished = true;
        if !seen {
            return None;
        }
        let stop = if quoted {
            bytes.len()
        } else {
            end.unwrap_or(bytes.len())
        };
        Some(&self.line[start..stop])
    }
}

impl<'a> Iterator for LineParser<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Collect every field of `line`.
pub fn tokenize(line: &str) -> Vec<&str> {
    LineParser::new(line).collect()
}

/// Parse an integer the way C's `strtol(.., 0)` does.
///
/// Leading whitespace and a sign are accepted, `0x` selects hex and a leading
/// `0` selects octal. Parsing stops at the first invalid digit; a token with
/// no digits yields 0. Overflow saturates before the sign is applied.
pub fn parse_c_integer(token: &str) -> i64 {
    let trimmed = token.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let has_hex_prefix = (rest.starts_with("0x") || rest.starts_with("0X"))
        && rest[2..].chars().next().is_some_and(|ch| ch.is_ascii_hexdigit());
    let (radix, digits) = if has_hex_prefix {
        (16, &rest[2..])
    } else if rest.starts_with('0') {
        (8, rest)
    } else {
        (10, rest)
    };

    let mut value: u64 = 0;
    for ch in digits.chars() {
        let Some(digit) = ch.to_digit(radix) else {
            break;
        };
        value = value
            .saturating_mul(u64::from(radix))
            .saturating_add(u64::from(digit));
    }

    let value = value as i64;
    if negative {
        value.wrapping_neg()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_comment_lines_yield_nothing() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \t  ").is_empty());
        assert!(tokenize("# a comment").is_empty());
        assert!(tokenize("   # indented comment \"quoted\"").is_empty());
        assert!(tokenize("\n").is_empty());
    }

    #[test]
    fn quoted_spans_keep_whitespace() {
        assert_eq!(tokenize("a \"b c\" d"), vec!["a", "b c", "d"]);
        assert_eq!(
            tokenize("\"Boot mode\" \"androidboot.mode\" \"normal\" \"recovery\""),
            vec!["Boot mode", "androidboot.mode", "normal", "recovery"]
        );
    }

    #[test]
    fn unquoted_hash_ends_the_line() {
        assert_eq!(tokenize("x#comment"), vec!["x"]);
        assert_eq!(tokenize("x y # trailing"), vec!["x", "y"]);
        assert_eq!(tokenize("\"a#b\" c#d e"), vec!["a#b", "c"]);
    }

    #[test]
    fn empty_quotes_are_a_token() {
        let mut parser = LineParser::new("\"\"");
        assert_eq!(parser.next_token(), Some(""));
        assert_eq!(parser.next_token(), None);

        assert_eq!(tokenize("name \"\" value"), vec!["name", "", "value"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_line() {
        assert_eq!(tokenize("a \"b c  d"), vec!["a", "b c  d"]);
    }

    #[test]
    fn quotes_restart_and_seal_a_field() {
        assert_eq!(tokenize("ab\"cd\"ef gh"), vec!["cd", "gh"]);
    }

    #[test]
    fn cursor_is_exhausted_after_the_last_field() {
        let mut parser = LineParser::new("label path\n");
        assert_eq!(parser.next_token(), Some("label"));
        assert_eq!(parser.next_token(), Some("path"));
        assert_eq!(parser.next_token(), None);
        assert_eq!(parser.next_token(), None);
    }

    #[test]
    fn carriage_returns_separate_fields() {
        assert_eq!(tokenize("114 115\r\n"), vec!["114", "115"]);
    }

    #[test]
    fn c_integers_honour_base_prefixes() {
        assert_eq!(parse_c_integer("28"), 28);
        assert_eq!(parse_c_integer("0x1c"), 28);
        assert_eq!(parse_c_integer("0X1C"), 28);
        assert_eq!(parse_c_integer("034"), 28);
        assert_eq!(parse_c_integer("  42abc"), 42);
        assert_eq!(parse_c_integer("-1"), -1);
        assert_eq!(parse_c_integer("+7"), 7);
        assert_eq!(parse_c_integer("on"), 0);
        assert_eq!(parse_c_integer("0x"), 0);
        assert_eq!(parse_c_integer(""), 0);
    }
}
