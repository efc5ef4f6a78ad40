//! USDA tokenizer.
//!
//! Splits USDA text into a flat list of line-tagged tokens. Comments and
//! whitespace are dropped, except for the `#usda 1.0` magic line which is
//! kept as a [`Token::Magic`] so the parser can check the header.

use std::iter::Peekable;
use std::str::Chars;

use super::parser::{ParseError, ParseResult};

/// A lexical token of the USDA text format.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// Header line `#usda <version>` (only at the very start of the file)
    Magic(String),

    /// Bare word: keywords, type names, property names (may contain `:` and `.`)
    Identifier(String),

    /// Quoted string, escapes resolved
    String(String),

    /// Numeric literal, kept as text until the parser decides int vs float
    Number(String),

    /// `</Some/Path>` contents
    Path(String),

    /// `@asset/path@` contents
    Asset(String),

    /// One of `( ) [ ] { } = , : ;`
    Punctuation(char),
}

/// A token plus the 1-based line it starts on.
pub type Spanned = (usize, Token);

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

/// Tokenize USDA source text.
pub fn tokenize(source: &str) -> ParseResult<Vec<Spanned>> {
    let mut lexer = Lexer {
        chars: source.chars().peekable(),
        line: 1,
    };
    let mut tokens = Vec::new();

    if let Some(rest) = source.strip_prefix("#usda") {
        let header = rest.lines().next().unwrap_or("");
        tokens.push((1, Token::Magic(header.trim().to_string())));
        lexer.skip_line();
    }

    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }

    Ok(tokens)
}

impl<'a> Lexer<'a> {
    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::Syntax {
            line: self.line,
            message: message.into(),
        }
    }

    fn next_token(&mut self) -> ParseResult<Option<Spanned>> {
        loop {
            let c = match self.chars.peek() {
                Some(&c) => c,
                None => return Ok(None),
            };

            if c.is_whitespace() {
                self.bump();
                continue;
            }

            if c == '#' {
                self.skip_line();
                continue;
            }

            let line = self.line;
            let token = match c {
                '"' | '\'' => Token::String(self.read_string()?),
                '<' => Token::Path(self.read_delimited('<', '>')?),
                '@' => Token::Asset(self.read_delimited('@', '@')?),
                '(' | ')' | '[' | ']' | '{' | '}' | '=' | ',' | ':' | ';' => {
                    self.bump();
                    Token::Punctuation(c)
                }
                c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => Token::Number(self.read_number()?),
                c if c.is_ascii_alphabetic() || c == '_' => Token::Identifier(self.read_identifier()),
                other => return Err(self.error(format!("Unexpected character {:?}", other))),
            };

            return Ok(Some((line, token)));
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == ':' || c == '.' {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    fn read_number(&mut self) -> ParseResult<String> {
        let mut text = String::new();
        if let Some(&sign) = self.chars.peek() {
            if sign == '-' || sign == '+' {
                text.push(sign);
                self.bump();
            }
        }

        // -inf / +inf
        if matches!(self.chars.peek(), Some(c) if c.is_ascii_alphabetic()) {
            let word = self.read_identifier();
            if word == "inf" {
                text.push_str(&word);
                return Ok(text);
            }
            return Err(self.error(format!("Invalid number: {}{}", text, word)));
        }

        let mut prev = '\0';
        while let Some(&c) = self.chars.peek() {
            let exponent_sign = (c == '-' || c == '+') && (prev == 'e' || prev == 'E');
            if c.is_ascii_digit() || c == '.' || c == 'e' || c == 'E' || exponent_sign {
                text.push(c);
                prev = c;
                self.bump();
            } else {
                break;
            }
        }

        if !text.chars().any(|c| c.is_ascii_digit()) {
            return Err(self.error(format!("Invalid number: {:?}", text)));
        }
        Ok(text)
    }

    fn read_delimited(&mut self, open: char, close: char) -> ParseResult<String> {
        let start = self.line;
        self.bump(); // opening delimiter
        let mut text = String::new();
        loop {
            match self.bump() {
                Some(c) if c == close => return Ok(text),
                Some('\n') => {
                    return Err(ParseError::Syntax {
                        line: start,
                        message: format!("Unterminated {}...{} literal", open, close),
                    })
                }
                Some(c) => text.push(c),
                None => return Err(ParseError::UnexpectedEof),
            }
        }
    }

    fn read_string(&mut self) -> ParseResult<String> {
        let quote = match self.bump() {
            Some(q) => q,
            None => return Err(ParseError::UnexpectedEof),
        };

        // Triple-quoted strings may span lines and are taken verbatim
        if self.chars.peek() == Some(&quote) {
            self.bump();
            if self.chars.peek() != Some(&quote) {
                return Ok(String::new());
            }
            self.bump();
            let mut text = String::new();
            let mut run = 0;
            loop {
                match self.bump() {
                    Some(c) if c == quote => {
                        run += 1;
                        if run == 3 {
                            return Ok(text);
                        }
                    }
                    Some(c) => {
                        for _ in 0..run {
                            text.push(quote);
                        }
                        run = 0;
                        text.push(c);
                    }
                    None => return Err(ParseError::UnexpectedEof),
                }
            }
        }

        let mut text = String::new();
        loop {
            match self.bump() {
                Some(c) if c == quote => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some('r') => text.push('\r'),
                    Some(other) => text.push(other),
                    None => return Err(ParseError::UnexpectedEof),
                },
                Some('\n') => return Err(self.error("Newline in string literal")),
                Some(c) => text.push(c),
                None => return Err(ParseError::UnexpectedEof),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|(_, t)| t).collect()
    }

    #[test]
    fn test_header_and_comments() {
        let toks = tokens("#usda 1.0\n# a comment\ndef \"World\" {}\n");
        assert_eq!(toks[0], Token::Magic("1.0".to_string()));
        assert_eq!(toks[1], Token::Identifier("def".to_string()));
        assert_eq!(toks[2], Token::String("World".to_string()));
        assert_eq!(toks.len(), 5);
    }

    #[test]
    fn test_literals() {
        let toks = tokens(r#"rel x = [</World/Sphere>] @./a.usda@ -1.5e-3 -inf 'hi\n'"#);
        assert_eq!(toks[4], Token::Path("/World/Sphere".to_string()));
        assert_eq!(toks[6], Token::Asset("./a.usda".to_string()));
        assert_eq!(toks[7], Token::Number("-1.5e-3".to_string()));
        assert_eq!(toks[8], Token::Number("-inf".to_string()));
        assert_eq!(toks[9], Token::String("hi\n".to_string()));
    }

    #[test]
    fn test_namespaced_identifiers() {
        let toks = tokens("double3 xformOp:translate.timeSamples = { 0: (1, 2, 3) }");
        assert_eq!(toks[1], Token::Identifier("xformOp:translate.timeSamples".to_string()));
        assert_eq!(toks[5], Token::Punctuation(':'));
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let toks = tokens("comment = \"\"\"first\nsecond\"\"\"\nkind");
        assert_eq!(toks[2], Token::String("first\nsecond".to_string()));
        let spanned = tokenize("comment = \"\"\"first\nsecond\"\"\"\nkind").unwrap();
        assert_eq!(spanned[3].0, 3);
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        assert!(tokenize("\"abc").is_err());
        assert!(tokenize("\"abc\ndef\"").is_err());
    }
}
