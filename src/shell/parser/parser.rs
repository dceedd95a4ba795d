use std::fmt;

use super::ast::{Command, Connector, Pipeline, Program};
use super::lexer::{Lexer, Token};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A `<` or `>` that is not followed by a file name.
    MissingRedirectTarget { operator: Token, found: Token },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingRedirectTarget { operator, found } => write!(
                f,
                "expected a file name after {}, found {}",
                operator, found
            ),
        }
    }
}

impl std::error::Error for ParseError {}

pub fn parse(input: &str) -> Result<Program, ParseError> {
    Parser::new(input).parse()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    program: Program,
    pipeline: Pipeline,
    command: Command,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            lexer: Lexer::new(input),
            program: Program {
                pipelines: Vec::new(),
                connectors: Vec::new(),
            },
            pipeline: Pipeline::default(),
            command: Command::default(),
        }
    }

    pub fn parse(mut self) -> Result<Program, ParseError> {
        loop {
            match self.lexer.next_token() {
                Token::End => break,
                Token::RedirectIn => {
                    let path = self.parse_redirect_target(Token::RedirectIn)?;
                    self.command.input_redirect = Some(path);
                }
                Token::RedirectOut => {
                    let path = self.parse_redirect_target(Token::RedirectOut)?;
                    self.command.output_redirect = Some(path);
                }
                Token::Word(word) => {
                    if self.command.name.is_empty() {
                        self.command.name = word;
                    } else {
                        self.command.args.push(word);
                    }
                }
                Token::Pipe => self.finish_command(),
                Token::And => self.finish_pipeline(Some(Connector::And)),
                Token::Or => self.finish_pipeline(Some(Connector::Or)),
            }
        }

        self.finish_pipeline(None);
        Ok(self.program)
    }

    fn parse_redirect_target(&mut self, operator: Token) -> Result<String, ParseError> {
        match self.lexer.next_token() {
            Token::Word(path) => Ok(path),
            found => Err(ParseError::MissingRedirectTarget { operator, found }),
        }
    }

    fn finish_command(&mut self) {
        let command = std::mem::take(&mut self.command);
        self.pipeline.commands.push(command);
    }

    fn finish_pipeline(&mut self, connector: Option<Connector>) {
        self.finish_command();
        let pipeline = std::mem::take(&mut self.pipeline);
        self.program.pipelines.push(pipeline);
        if let Some(connector) = connector {
            self.program.connectors.push(connector);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(pipeline: &Pipeline) -> Vec<&str> {
        pipeline.commands.iter().map(|c| c.name.as_str()).collect()
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_simple_command() {
        let program = parse("ls -l").unwrap();

        assert_eq!(program.pipelines.len(), 1);
        assert!(program.connectors.is_empty());
        let cmd = &program.pipelines[0].commands[0];
        assert_eq!(cmd.name, "ls");
        assert_eq!(cmd.args, vec!["-l"]);
        assert_eq!(cmd.input_redirect, None);
        assert_eq!(cmd.output_redirect, None);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_empty_input_yields_one_empty_command() {
        for input in ["", "   "] {
            let program = parse(input).unwrap();
            assert_eq!(program.pipelines.len(), 1);
            assert_eq!(program.pipelines[0].commands, vec![Command::default()]);
            assert!(program.connectors.is_empty());
        }
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_pipeline() {
        let program = parse("ls -l | grep foo | wc -l").unwrap();

        assert_eq!(program.pipelines.len(), 1);
        let pipeline = &program.pipelines[0];
        assert_eq!(names(pipeline), vec!["ls", "grep", "wc"]);
        assert_eq!(pipeline.commands[1].args, vec!["foo"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_connectors_in_source_order() {
        let program = parse("a && b | c || d && e").unwrap();

        assert_eq!(program.pipelines.len(), 4);
        assert_eq!(
            program.connectors,
            vec![Connector::And, Connector::Or, Connector::And]
        );
        assert_eq!(names(&program.pipelines[1]), vec!["b", "c"]);
        assert_eq!(names(&program.pipelines[3]), vec!["e"]);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_quoted_operators_are_not_connectors() {
        let program = parse(r#"echo "a && b" "x || y""#).unwrap();

        assert_eq!(program.pipelines.len(), 1);
        assert_eq!(
            program.pipelines[0].commands[0].args,
            vec!["a && b", "x || y"]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirection() {
        let program = parse("sort < in.txt -r > out.txt").unwrap();
        let cmd = &program.pipelines[0].commands[0];

        assert_eq!(cmd.name, "sort");
        assert_eq!(cmd.args, vec!["-r"]);
        assert_eq!(cmd.input_redirect.as_deref(), Some("in.txt"));
        assert_eq!(cmd.output_redirect.as_deref(), Some("out.txt"));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_redirection_before_name_and_last_one_wins() {
        let program = parse("> a > b cat").unwrap();
        let cmd = &program.pipelines[0].commands[0];

        assert_eq!(cmd.name, "cat");
        assert_eq!(cmd.output_redirect.as_deref(), Some("b"));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_empty_stages_are_kept() {
        let program = parse("| cat &&").unwrap();

        assert_eq!(program.pipelines.len(), 2);
        assert_eq!(names(&program.pipelines[0]), vec!["", "cat"]);
        assert_eq!(program.pipelines[1].commands, vec![Command::default()]);
    }

    #[test]
    fn test_redirect_without_target() {
        assert_eq!(
            parse("cat <"),
            Err(ParseError::MissingRedirectTarget {
                operator: Token::RedirectIn,
                found: Token::End,
            })
        );
        assert_eq!(
            parse("echo > | cat"),
            Err(ParseError::MissingRedirectTarget {
                operator: Token::RedirectOut,
                found: Token::Pipe,
            })
        );
    }

    #[test]
    fn test_parse_error_message() {
        let err = ParseError::MissingRedirectTarget {
            operator: Token::RedirectOut,
            found: Token::And,
        };
        assert_eq!(
            err.to_string(),
            "expected a file name after `>`, found `&&`"
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn test_display_round_trip() {
        let inputs = [
            "ls -l | grep foo > out.txt && echo done || echo failed",
            r#"echo "a b\"c" "" "back\\slash" < "in file""#,
            "| cat && ",
            "1984 < /dev/null || x&&y",
            "echo a\u{a0}b\u{2028}c",
            "",
        ];
        for input in inputs {
            let program = parse(input).unwrap();
            let rendered = program.to_string();
            assert_eq!(parse(&rendered).unwrap(), program, "rendered: {}", rendered);
        }
    }
}
