use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Token {
    Word(String),
    RedirectIn,  // <
    RedirectOut, // >
    Pipe,        // |
    And,         // &&
    Or,          // ||
    End,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Word(word) => write!(f, "`{}`", word),
            Token::RedirectIn => write!(f, "`<`"),
            Token::RedirectOut => write!(f, "`>`"),
            Token::Pipe => write!(f, "`|`"),
            Token::And => write!(f, "`&&`"),
            Token::Or => write!(f, "`||`"),
            Token::End => write!(f, "end of input"),
        }
    }
}

// ASCII whitespace as C `isspace` sees it; other Unicode spaces belong to words.
pub fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0b' | '\x0c' | '\r')
}

/// Forward-only tokenizer; once [`Token::End`] is returned every further call returns it again.
pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.peek_char() {
            None => Token::End,
            Some(c) => match c {
                '"' => self.read_quoted_string(),
                '<' => {
                    self.read_char();
                    Token::RedirectIn
                }
                '>' => {
                    self.read_char();
                    Token::RedirectOut
                }
                '&' if self.peek_second() == Some('&') => {
                    self.read_char();
                    self.read_char();
                    Token::And
                }
                '|' => {
                    self.read_char();
                    if self.peek_char() == Some('|') {
                        self.read_char();
                        Token::Or
                    } else {
                        Token::Pipe
                    }
                }
                _ => self.read_word(),
            },
        }
    }

    fn read_char(&mut self) -> Option<char> {
        self.input.next()
    }

    fn peek_char(&mut self) -> Option<char> {
        self.input.peek().copied()
    }

    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.input.clone();
        ahead.next();
        ahead.next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if !is_space(c) {
                break;
            }
            self.read_char();
        }
    }

    // A bare word only ends at whitespace; operators glued to it stay part of it.
    fn read_word(&mut self) -> Token {
        let mut word = String::new();

        while let Some(c) = self.peek_char() {
            if is_space(c) {
                break;
            }
            self.read_char();
            if c == '\\' {
                if let Some(escaped) = self.read_char() {
                    word.push(escaped);
                }
            } else {
                word.push(c);
            }
        }

        Token::Word(word)
    }

    fn read_quoted_string(&mut self) -> Token {
        self.read_char();
        let mut string = String::new();
        let mut escaped = false;

        while let Some(c) = self.read_char() {
            match (escaped, c) {
                (true, _) => {
                    string.push(c);
                    escaped = false;
                }
                (false, '\\') => escaped = true,
                (false, '"') => break,
                (false, c) => string.push(c),
            }
        }

        Token::Word(string)
    }
}
