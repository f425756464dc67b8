//! Line commands for the cashier console.

use thiserror::Error;

/// Errors parsing a console line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    Unknown(String),

    #[error("{0} needs an argument")]
    MissingArgument(&'static str),

    #[error("invalid order number: {0}")]
    InvalidPosition(String),
}

/// A cashier console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Connect to the broker at this host.
    Connect(String),
    /// Show the queue.
    List,
    /// Forward the order at this zero-based position to the kitchen.
    Forward(usize),
    /// Cancel the order at this zero-based position.
    Cancel(usize),
    Help,
    Quit,
}

impl Command {
    /// Parse one console line.
    ///
    /// While the host prompt is visible a line that is not a command is
    /// taken as the host to connect to.
    pub fn parse(line: &str, prompt_visible: bool) -> Result<Self, ParseError> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let position = |name: &'static str| {
            if rest.is_empty() {
                return Err(ParseError::MissingArgument(name));
            }
            match rest.parse::<usize>() {
                Ok(n) if n > 0 => Ok(n - 1),
                _ => Err(ParseError::InvalidPosition(rest.to_string())),
            }
        };

        match verb.to_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "connect" if rest.is_empty() => Err(ParseError::MissingArgument("connect")),
            "connect" => Ok(Command::Connect(rest.to_string())),
            "list" | "ls" => Ok(Command::List),
            "forward" | "fw" => Ok(Command::Forward(position("forward")?)),
            "cancel" => Ok(Command::Cancel(position("cancel")?)),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            _ if prompt_visible && rest.is_empty() => Ok(Command::Connect(line.to_string())),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Help text listing the commands.
pub const HELP: &str = "\
connect <host>  connect to the broker
list            show waiting orders
forward <n>     send order n to the kitchen
cancel <n>      drop order n
quit            leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_queue_commands_are_one_based() {
        assert_eq!(Command::parse("forward 1", false), Ok(Command::Forward(0)));
        assert_eq!(Command::parse(" cancel  3 ", false), Ok(Command::Cancel(2)));
        assert_eq!(
            Command::parse("forward 0", false),
            Err(ParseError::InvalidPosition("0".to_string()))
        );
        assert_eq!(
            Command::parse("cancel", false),
            Err(ParseError::MissingArgument("cancel"))
        );
    }

    #[test]
    fn test_bare_host_only_while_prompt_visible() {
        assert_eq!(
            Command::parse("192.168.0.10", true),
            Ok(Command::Connect("192.168.0.10".to_string()))
        );
        assert_eq!(
            Command::parse("192.168.0.10", false),
            Err(ParseError::Unknown("192.168.0.10".to_string()))
        );
        // Command words win over hosts.
        assert_eq!(Command::parse("list", true), Ok(Command::List));
    }

    #[test]
    fn test_parse_connect() {
        assert_eq!(
            Command::parse("connect localhost", false),
            Ok(Command::Connect("localhost".to_string()))
        );
        assert_eq!(
            Command::parse("connect", true),
            Err(ParseError::MissingArgument("connect"))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("   ", true), Err(ParseError::Empty));
        assert_eq!(
            Command::parse("forward all", false),
            Err(ParseError::InvalidPosition("all".to_string()))
        );
        assert_eq!(
            Command::parse("bake cake", true),
            Err(ParseError::Unknown("bake".to_string()))
        );
    }
}
