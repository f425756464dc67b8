//! Line commands for the kiosk console.

use std::str::FromStr;

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

    #[error("invalid cart position: {0}")]
    InvalidPosition(String),
}

/// A kiosk console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the menu.
    Menu,
    /// Select a flavor.
    Pick(String),
    /// Toggle an add-on (or a combo component).
    Toggle(String),
    /// Confirm the selection into the cart.
    Add,
    /// Remove the cart line at this zero-based position.
    Remove(usize),
    /// Show the cart and total.
    Cart,
    /// Submit the cart under this customer name.
    Send(String),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };

        let arg = |name: &'static str| {
            if rest.is_empty() {
                Err(ParseError::MissingArgument(name))
            } else {
                Ok(rest.to_string())
            }
        };

        match verb.to_lowercase().as_str() {
            "" => Err(ParseError::Empty),
            "menu" => Ok(Command::Menu),
            "pick" => Ok(Command::Pick(arg("pick")?)),
            "toggle" => Ok(Command::Toggle(arg("toggle")?)),
            "add" => Ok(Command::Add),
            "remove" => {
                let n = arg("remove")?;
                match n.parse::<usize>() {
                    Ok(position) if position > 0 => Ok(Command::Remove(position - 1)),
                    _ => Err(ParseError::InvalidPosition(n)),
                }
            }
            "cart" => Ok(Command::Cart),
            "send" => Ok(Command::Send(arg("send")?)),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

/// Help text listing the commands.
pub const HELP: &str = "\
menu                 show flavors and prices
pick <flavor>        select a flavor
toggle <ingredient>  add or remove an ingredient
add                  put the selection in the cart
remove <n>           remove cart line n
cart                 show the cart and total
send <name>          send the order
quit                 leave";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!("menu".parse(), Ok(Command::Menu));
        assert_eq!("  ADD ".parse(), Ok(Command::Add));
        assert_eq!("cart".parse(), Ok(Command::Cart));
        assert_eq!("exit".parse(), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_arguments_keep_spaces() {
        assert_eq!(
            "pick The Nutella Academy".parse(),
            Ok(Command::Pick("The Nutella Academy".to_string()))
        );
        assert_eq!(
            "toggle Cobertura de Chocolate".parse(),
            Ok(Command::Toggle("Cobertura de Chocolate".to_string()))
        );
        assert_eq!("send  Ana Paula ".parse(), Ok(Command::Send("Ana Paula".to_string())));
    }

    #[test]
    fn test_parse_remove_is_one_based() {
        assert_eq!("remove 1".parse(), Ok(Command::Remove(0)));
        assert_eq!(
            "remove 0".parse::<Command>(),
            Err(ParseError::InvalidPosition("0".to_string()))
        );
        assert_eq!(
            "remove x".parse::<Command>(),
            Err(ParseError::InvalidPosition("x".to_string()))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Command>(), Err(ParseError::Empty));
        assert_eq!("pick".parse::<Command>(), Err(ParseError::MissingArgument("pick")));
        assert_eq!(
            "dance".parse::<Command>(),
            Err(ParseError::Unknown("dance".to_string()))
        );
    }
}
