use std::rc::Rc;

use crate::common::source::Source;
use crate::common::span::{Span, Spanned};
use crate::compiler::token::{Keyword, Punct, Token};

/// Scans a source into a stream of tokens, ending with `Token::Eof`.
///
/// The scanner never fails: unrecognized bytes and unterminated
/// literals come out as `Token::Unknown` and the parser decides what
/// to make of them. Newlines are significant and survive as
/// `Token::Eol`; all other whitespace and both comment forms are
/// stripped.
pub fn lex(source: Rc<Source>) -> Vec<Spanned<Token>> {
    let mut lexer = Lexer::new(source);

    loop {
        let token = lexer.next_token();
        let done = token.item == Token::Eof;
        lexer.tokens.push(token);
        if done { break; }
    }

    lexer.tokens
}

struct Lexer {
    source: Rc<Source>,
    offset: usize,
    tokens: Vec<Spanned<Token>>,
}

impl Lexer {
    fn new(source: Rc<Source>) -> Lexer {
        Lexer { source, offset: 0, tokens: vec![] }
    }

    fn rest(&self) -> &str {
        &self.source.contents[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.rest().chars();
        chars.next();
        chars.next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.offset += c.len_utf8();
        Some(c)
    }

    fn spanned(&self, token: Token, start: usize) -> Spanned<Token> {
        Spanned::new(token, Span::new(&self.source, start, self.offset - start))
    }

    /// Strips whitespace (but not newlines) and comments.
    /// An unclosed block comment is silently swallowed to the end of
    /// the source.
    fn strip(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() && c != '\n' => {
                    self.bump();
                },
                Some('/') if self.peek_next() == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' { break; }
                        self.bump();
                    }
                },
                Some('/') if self.peek_next() == Some('*') => {
                    self.bump();
                    self.bump();
                    while let Some(c) = self.bump() {
                        if c == '*' && self.peek() == Some('/') {
                            self.bump();
                            break;
                        }
                    }
                },
                _ => break,
            }
        }
    }

    fn next_token(&mut self) -> Spanned<Token> {
        self.strip();
        let start = self.offset;

        let c = match self.peek() {
            Some(c) => c,
            None => return self.spanned(Token::Eof, start),
        };

        if c == '\n' {
            self.bump();
            return self.spanned(Token::Eol, start);
        }
        if c.is_ascii_alphabetic() || c == '_' {
            return self.word(start);
        }
        if c.is_ascii_digit() {
            return self.number(start);
        }
        if c == '"' {
            let contents = self.string_contents();
            let token = match contents {
                Ok(raw)  => Token::Str(raw),
                Err(raw) => Token::Unknown(raw),
            };
            return self.spanned(token, start);
        }
        if c == '@' {
            self.bump();
            if self.peek() != Some('"') {
                return self.spanned(Token::Unknown("@".to_string()), start);
            }
            let token = match self.string_contents() {
                Ok(raw)  => Token::FormatStr(raw),
                Err(raw) => Token::Unknown(raw),
            };
            return self.spanned(token, start);
        }

        self.punct(start)
    }

    fn word(&mut self, start: usize) -> Spanned<Token> {
        while let Some(c) = self.peek() {
            if !c.is_ascii_alphanumeric() && c != '_' { break; }
            self.bump();
        }

        let word = &self.source.contents[start..self.offset];
        let token = match Keyword::from_str(word) {
            Some(keyword) => Token::Keyword(keyword),
            None          => Token::Ident(word.to_string()),
        };

        self.spanned(token, start)
    }

    fn number(&mut self, start: usize) -> Spanned<Token> {
        let mut has_decimal = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                self.bump();
            } else if c == '.' && !has_decimal {
                // only an interior dot belongs to the number:
                // `1.` is the number 1 followed by '.'
                match self.peek_next() {
                    Some(next) if next.is_ascii_digit() => {
                        has_decimal = true;
                        self.bump();
                    },
                    _ => break,
                }
            } else {
                break;
            }
        }

        let lexeme = &self.source.contents[start..self.offset];
        let token = match lexeme.parse::<f64>() {
            Ok(value) => Token::Number(value),
            Err(_)    => Token::Unknown(lexeme.to_string()),
        };

        self.spanned(token, start)
    }

    /// Consumes a `"`-delimited literal, starting at the opening
    /// quote. Returns the contents with escapes still encoded, as
    /// `Err` if the closing quote never showed up.
    fn string_contents(&mut self) -> Result<String, String> {
        self.bump();
        let start = self.offset;

        loop {
            match self.peek() {
                None => {
                    return Err(self.source.contents[start..self.offset].to_string());
                },
                Some('"') => {
                    let raw = self.source.contents[start..self.offset].to_string();
                    self.bump();
                    return Ok(raw);
                },
                Some('\\') if self.peek_next().is_some() => {
                    self.bump();
                    self.bump();
                },
                Some(_) => {
                    self.bump();
                },
            }
        }
    }

    fn punct(&mut self, start: usize) -> Spanned<Token> {
        let first = self.bump().unwrap_or('\0');
        let second = self.peek();

        // operators that have a two-character variant take it greedily
        let long = match (first, second) {
            ('+', Some('=')) => Some(Punct::PlusAssign),
            ('-', Some('=')) => Some(Punct::MinusAssign),
            ('*', Some('=')) => Some(Punct::StarAssign),
            ('/', Some('=')) => Some(Punct::SlashAssign),
            ('=', Some('=')) => Some(Punct::Equal),
            ('!', Some('=')) => Some(Punct::NotEqual),
            ('<', Some('=')) => Some(Punct::LessEqual),
            ('>', Some('=')) => Some(Punct::GreaterEqual),
            ('&', Some('&')) => Some(Punct::AndAnd),
            ('|', Some('|')) => Some(Punct::OrOr),
            _ => None,
        };
        if let Some(punct) = long {
            self.bump();
            return self.spanned(Token::Punct(punct), start);
        }

        let short = match first {
            '+' => Punct::Plus,
            '-' => Punct::Minus,
            '*' => Punct::Star,
            '/' => Punct::Slash,
            '%' => Punct::Percent,
            '=' => Punct::Assign,
            '<' => Punct::Less,
            '>' => Punct::Greater,
            '!' => Punct::Bang,
            '&' => Punct::Amp,
            '|' => Punct::Pipe,
            '(' => Punct::OpenParen,
            ')' => Punct::CloseParen,
            '{' => Punct::OpenBrace,
            '}' => Punct::CloseBrace,
            '[' => Punct::OpenBracket,
            ']' => Punct::CloseBracket,
            ',' => Punct::Comma,
            '.' => Punct::Dot,
            ':' => Punct::Colon,
            ';' => Punct::Semicolon,
            other => {
                return self.spanned(Token::Unknown(other.to_string()), start);
            },
        };

        self.spanned(Token::Punct(short), start)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        lex(Source::source(source)).into_iter().map(|t| t.item).collect()
    }

    #[test]
    fn lex_empty() {
        // no source code? one Eof token!
        assert_eq!(kinds(""), vec![Token::Eof]);
    }

    #[test]
    fn lex_assignment() {
        let source = Source::source("heck = true");

        let result = vec![
            Spanned::new(Token::Ident("heck".to_string()), Span::new(&source, 0, 4)),
            Spanned::new(Token::Punct(Punct::Assign),      Span::new(&source, 5, 1)),
            Spanned::new(Token::Keyword(Keyword::True),    Span::new(&source, 7, 4)),
            Spanned::new(Token::Eof,                       Span::new(&source, 11, 0)),
        ];

        assert_eq!(lex(source), result);
    }

    #[test]
    fn newlines_are_tokens() {
        assert_eq!(
            kinds("a\n\nb"),
            vec![
                Token::Ident("a".to_string()),
                Token::Eol,
                Token::Eol,
                Token::Ident("b".to_string()),
                Token::Eof,
            ],
        );
    }

    #[test]
    fn comments_are_stripped() {
        assert_eq!(
            kinds("a // a line comment\nb /* a block\ncomment */ c"),
            vec![
                Token::Ident("a".to_string()),
                Token::Eol,
                Token::Ident("b".to_string()),
                Token::Ident("c".to_string()),
                Token::Eof,
            ],
        );
    }

    #[test]
    fn unclosed_block_comment_is_silent() {
        assert_eq!(kinds("a /* never closed"), vec![
            Token::Ident("a".to_string()),
            Token::Eof,
        ]);
    }

    #[test]
    fn numbers() {
        assert_eq!(kinds("1 23.5"), vec![
            Token::Number(1.0),
            Token::Number(23.5),
            Token::Eof,
        ]);

        // a trailing dot is not part of the number
        assert_eq!(kinds("1."), vec![
            Token::Number(1.0),
            Token::Punct(Punct::Dot),
            Token::Eof,
        ]);

        // neither is a second one
        assert_eq!(kinds("1.2.3"), vec![
            Token::Number(1.2),
            Token::Punct(Punct::Dot),
            Token::Number(3.0),
            Token::Eof,
        ]);
    }

    #[test]
    fn strings() {
        assert_eq!(
            kinds(r#""hello" "esc\"aped""#),
            vec![
                Token::Str("hello".to_string()),
                Token::Str(r#"esc\"aped"#.to_string()),
                Token::Eof,
            ],
        );
    }

    #[test]
    fn unterminated_string_is_unknown() {
        assert_eq!(kinds(r#""oops"#), vec![
            Token::Unknown("oops".to_string()),
            Token::Eof,
        ]);
    }

    #[test]
    fn format_strings() {
        assert_eq!(kinds(r#"@"hi {name}""#), vec![
            Token::FormatStr("hi {name}".to_string()),
            Token::Eof,
        ]);

        // a stray @ is not a format string
        assert_eq!(kinds("@x"), vec![
            Token::Unknown("@".to_string()),
            Token::Ident("x".to_string()),
            Token::Eof,
        ]);
    }

    #[test]
    fn operators_take_the_longest_match() {
        assert_eq!(
            kinds("<= < == = && & += %"),
            vec![
                Token::Punct(Punct::LessEqual),
                Token::Punct(Punct::Less),
                Token::Punct(Punct::Equal),
                Token::Punct(Punct::Assign),
                Token::Punct(Punct::AndAnd),
                Token::Punct(Punct::Amp),
                Token::Punct(Punct::PlusAssign),
                Token::Punct(Punct::Percent),
                Token::Eof,
            ],
        );
    }

    #[test]
    fn unknown_bytes_do_not_stop_the_scanner() {
        assert_eq!(kinds("a ` b"), vec![
            Token::Ident("a".to_string()),
            Token::Unknown("`".to_string()),
            Token::Ident("b".to_string()),
            Token::Eof,
        ]);
    }
}
