//! Serve-mode command parsing
//!
//! ```text
//! watch | toggle                  toggle the watch session
//! build                           one-shot build
//! build-filters <glob>...         build restricted to the given globs
//! answer <id> <text>              answer a pending prompt
//! quit                            stop any watch and exit
//! ```

use std::fmt;

/// A command read from stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    Toggle,
    Build { filters: Vec<String> },
    Answer { id: u64, text: String },
    Quit,
}

/// Why a line could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Unknown(String),
    MissingFilters,
    BadAnswer(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Unknown(cmd) => write!(f, "Unknown command: {}", cmd),
            ParseError::MissingFilters => write!(f, "build-filters needs at least one glob"),
            ParseError::BadAnswer(line) => write!(f, "Malformed answer: {}", line),
        }
    }
}

impl HostCommand {
    /// Parse one stdin line; `Ok(None)` for blank lines
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head {
            "watch" | "toggle" => HostCommand::Toggle,
            "build" => HostCommand::Build {
                filters: Vec::new(),
            },
            "build-filters" => {
                let filters: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
                if filters.is_empty() {
                    return Err(ParseError::MissingFilters);
                }
                HostCommand::Build { filters }
            }
            "answer" => {
                let (id, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
                let id = id
                    .parse::<u64>()
                    .map_err(|_| ParseError::BadAnswer(line.to_string()))?;
                HostCommand::Answer {
                    id,
                    text: text.trim().to_string(),
                }
            }
            "q" | "quit" => HostCommand::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}
