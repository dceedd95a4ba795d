use std::fmt;

use super::lexer::is_space;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub args: Vec<String>,
    pub input_redirect: Option<String>,
    pub output_redirect: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And, // &&
    Or,  // ||
}

impl Connector {
    pub fn allows(self, last_status: i32) -> bool {
        match self {
            Connector::And => last_status == 0,
            Connector::Or => last_status != 0,
        }
    }
}

/// A parsed command line: `pipelines.len() == connectors.len() + 1` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub pipelines: Vec<Pipeline>,
    pub connectors: Vec<Connector>,
}

impl Program {
    pub fn steps(&self) -> impl Iterator<Item = (Option<Connector>, &Pipeline)> {
        std::iter::once(None)
            .chain(self.connectors.iter().copied().map(Some))
            .zip(self.pipelines.iter())
    }
}

fn needs_quoting(word: &str) -> bool {
    word.is_empty()
        || word
            .chars()
            .any(|c| is_space(c) || "\"\\<>|&".contains(c))
}

struct Quoted<'a>(&'a str);

impl fmt::Display for Quoted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !needs_quoting(self.0) {
            return f.write_str(self.0);
        }
        f.write_str("\"")?;
        for c in self.0.chars() {
            if c == '"' || c == '\\' {
                f.write_str("\\")?;
            }
            write!(f, "{}", c)?;
        }
        f.write_str("\"")
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        // An empty name with nothing after it is an empty stage, not an empty word.
        if !self.name.is_empty() || !self.args.is_empty() {
            parts.push(Quoted(&self.name).to_string());
        }
        parts.extend(self.args.iter().map(|arg| Quoted(arg).to_string()));
        if let Some(path) = &self.input_redirect {
            parts.push(format!("< {}", Quoted(path)));
        }
        if let Some(path) = &self.output_redirect {
            parts.push(format!("> {}", Quoted(path)));
        }
        f.write_str(&parts.join(" "))
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stages: Vec<String> = self.commands.iter().map(|c| c.to_string()).collect();
        f.write_str(&stages.join(" | "))
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connector::And => f.write_str("&&"),
            Connector::Or => f.write_str("||"),
        }
    }
}

// Renders a normalized command line that parses back to an equal program.
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (connector, pipeline) in self.steps() {
            if let Some(connector) = connector {
                write!(f, " {} ", connector)?;
            }
            write!(f, "{}", pipeline)?;
        }
        Ok(())
    }
}
