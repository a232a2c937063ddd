//! Special commands parser for the interactive conversation
//!
//! Special commands steer the conversation instead of being posted as an
//! answer. They let users:
//! - Switch between product picking and URL input
//! - Pick a product, a regret factor or an answer option by number
//! - Rate a generated summary
//! - Restart the conversation for the same or a new product
//!
//! Commands are prefixed with `/`; the command word is case-insensitive,
//! arguments keep their case.

use crate::entry_mode::EntryMode;
use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// A product, factor or option reference: a 1-based list number or a name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Index(usize),
    Name(String),
}

impl Selection {
    fn parse(arg: &str) -> Self {
        match arg.parse::<usize>() {
            Ok(n) if n > 0 => Self::Index(n),
            _ => Self::Name(arg.to_string()),
        }
    }

    /// Resolves against a list, returning the picked item
    ///
    /// Names are matched by `name_of`; an index past the end resolves to
    /// nothing.
    pub fn resolve<'a, T>(&self, items: &'a [T], name_of: impl Fn(&T) -> &str) -> Option<&'a T> {
        match self {
            Self::Index(n) => n.checked_sub(1).and_then(|i| items.get(i)),
            Self::Name(name) => items.iter().find(|item| name_of(item) == name),
        }
    }
}

/// Special commands that can be executed during the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Switch between product picking and URL input
    SwitchMode(EntryMode),

    /// Analyze a product from a product page URL
    SubmitUrl(String),

    /// Print the product catalog
    ListProducts,

    /// Analyze a catalog product, by list number or name
    SelectProduct(Selection),

    /// Look up reviews for a regret factor, by list number or key
    SelectFactor(Selection),

    /// Answer with one of the offered options, by list number or text
    ChooseOption(Selection),

    /// Rate a summary; `target` is the 1-based pending rating, default first
    Rate { stars: u8, target: Option<usize> },

    /// Restart with the same product
    Reset,

    /// Start over with a new product
    NewProduct,

    /// Display conversation status
    ShowStatus,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be posted to the conversation as typed text.
    None,
}

fn missing(command: &str, usage: &str) -> CommandError {
    CommandError::MissingArgument {
        command: command.to_string(),
        usage: usage.to_string(),
    }
}

fn unsupported(command: &str, arg: &str) -> CommandError {
    CommandError::UnsupportedArgument {
        command: command.to_string(),
        arg: arg.to_string(),
    }
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an invalid argument.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use reviewlens::commands::special_commands::{parse_special_command, Selection, SpecialCommand};
/// use reviewlens::entry_mode::EntryMode;
///
/// let cmd = parse_special_command("/mode url").unwrap();
/// assert_eq!(cmd, SpecialCommand::SwitchMode(EntryMode::Url));
///
/// let cmd = parse_special_command("/factor 2").unwrap();
/// assert_eq!(cmd, SpecialCommand::SelectFactor(Selection::Index(2)));
///
/// let cmd = parse_special_command("소음이 심한가요?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (word, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((word, rest)) => (word.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match word.as_str() {
        "/mode" => {
            if arg.is_empty() {
                return Err(missing("/mode", "/mode <product|url>"));
            }
            EntryMode::parse_str(arg)
                .map(SpecialCommand::SwitchMode)
                .map_err(|_| unsupported("/mode", arg))
        }
        "/product" | "/catalog" if arg.is_empty() => {
            Ok(SpecialCommand::SwitchMode(EntryMode::Product))
        }
        "/url" if arg.is_empty() => Ok(SpecialCommand::SwitchMode(EntryMode::Url)),
        "/url" => Ok(SpecialCommand::SubmitUrl(arg.to_string())),

        "/products" | "/list" => Ok(SpecialCommand::ListProducts),

        "/select" | "/product" | "/catalog" => {
            if arg.is_empty() {
                Err(missing("/select", "/select <number|product name>"))
            } else {
                Ok(SpecialCommand::SelectProduct(Selection::parse(arg)))
            }
        }
        "/factor" | "/f" => {
            if arg.is_empty() {
                Err(missing("/factor", "/factor <number|factor key>"))
            } else {
                Ok(SpecialCommand::SelectFactor(Selection::parse(arg)))
            }
        }
        "/choose" | "/c" => {
            if arg.is_empty() {
                Err(missing("/choose", "/choose <number|option>"))
            } else {
                Ok(SpecialCommand::ChooseOption(Selection::parse(arg)))
            }
        }

        "/rate" => parse_rate(arg),

        "/reset" | "/restart" => Ok(SpecialCommand::Reset),
        "/new" => Ok(SpecialCommand::NewProduct),

        "/status" => Ok(SpecialCommand::ShowStatus),
        "/help" | "/?" => Ok(SpecialCommand::Help),

        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),

        _ => Err(CommandError::UnknownCommand(word)),
    }
}

fn parse_rate(arg: &str) -> Result<SpecialCommand, CommandError> {
    const USAGE: &str = "/rate <1-5> [rating number]";
    let mut parts = arg.split_whitespace();
    let stars = parts.next().ok_or_else(|| missing("/rate", USAGE))?;
    let stars = match stars.parse::<u8>() {
        Ok(n) if (1..=5).contains(&n) => n,
        _ => return Err(unsupported("/rate", stars)),
    };
    let target = match parts.next() {
        Some(n) => match n.parse::<usize>() {
            Ok(n) if n > 0 => Some(n),
            _ => return Err(unsupported("/rate", n)),
        },
        None => None,
    };
    if let Some(extra) = parts.next() {
        return Err(unsupported("/rate", extra));
    }
    Ok(SpecialCommand::Rate { stars, target })
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for the ReviewLens Conversation
================================================

ENTRY MODE:
  /mode product   - Pick a product from the catalog
  /product        - Shorthand for /mode product
  /mode url       - Paste a product page URL
  /url            - Shorthand for /mode url
  /url <link>     - Analyze the product at <link>

PRODUCTS:
  /products       - Show the product catalog
  /select <n>     - Analyze product number <n> (or give its name)

DURING ANALYSIS:
  /factor <n>     - Show reviews for regret point <n> (or give its key)
  /choose <n>     - Answer with option <n> (or give the option text)
  <text>          - Anything else is sent as your answer or question

RATINGS:
  /rate <1-5>     - Rate the first summary still waiting for a rating
  /rate <1-5> <n> - Rate pending summary number <n>

RESTARTING:
  /reset          - Start over with the same product
  /new            - Start over with a new product

OTHER COMMANDS:
  /status         - Show conversation status
  /help           - Show this help message
  exit, quit      - Exit the conversation

EXAMPLES:
  /select 1
  /factor 2
  /rate 5
  https://smartstore.naver.com/brand/products/4827391
"#
    );
}
