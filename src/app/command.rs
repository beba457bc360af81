//! Command parsing for the `:` command line

use crate::tutor::TutorModel;

/// Parsed command from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Quit the application: :q or :quit
    Quit,
    /// Show help: :help or :h
    Help,
    /// Forget all progress, after confirmation: :reset
    Reset,
    /// Jump to a phase by its 1-based number: :phase 2
    Phase(usize),
    /// Jump to a step by 1-based phase and step numbers: :step 1 3
    Step { phase: usize, step: usize },
    /// Ask the tutor about the current step: :explain or :e
    Explain,
    /// Save an API key for the tutor: :tutor-key <api-key>
    TutorKey(String),
    /// Forget the saved API key: :tutor-forget
    TutorForget,
    /// Pick the tutor model: :tutor-model <haiku|sonnet|opus>
    TutorModel(TutorModel),
    /// List earned badges: :badges
    Badges,
    /// Clear message: (empty command)
    Nop,
}

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    Ok(Command),
    UnknownCommand(String),
    /// Command needs an argument
    MissingArgument(String),
    /// Argument was given but makes no sense
    InvalidArgument { command: String, argument: String },
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> ParseResult {
    let input = input.trim();

    if input.is_empty() {
        return ParseResult::Ok(Command::Nop);
    }

    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim()).unwrap_or("");

    match cmd.to_lowercase().as_str() {
        "quit" | "q" => ParseResult::Ok(Command::Quit),
        "help" | "h" | "?" => ParseResult::Ok(Command::Help),
        "reset" => ParseResult::Ok(Command::Reset),
        "phase" | "p" => match ordinal("phase", args) {
            Ok(phase) => ParseResult::Ok(Command::Phase(phase)),
            Err(result) => result,
        },
        "step" | "s" => {
            let mut numbers = args.split_whitespace();
            let (Some(phase), Some(step)) = (numbers.next(), numbers.next()) else {
                return ParseResult::MissingArgument("step".to_string());
            };
            match (ordinal("step", phase), ordinal("step", step)) {
                (Ok(phase), Ok(step)) => ParseResult::Ok(Command::Step { phase, step }),
                (Err(result), _) | (_, Err(result)) => result,
            }
        }
        "explain" | "e" => ParseResult::Ok(Command::Explain),
        "tutor-key" | "tk" => {
            if args.is_empty() {
                ParseResult::MissingArgument("tutor-key".to_string())
            } else {
                ParseResult::Ok(Command::TutorKey(args.to_string()))
            }
        }
        "tutor-forget" => ParseResult::Ok(Command::TutorForget),
        "tutor-model" | "tm" => {
            if args.is_empty() {
                return ParseResult::MissingArgument("tutor-model".to_string());
            }
            match TutorModel::parse(args) {
                Some(model) => ParseResult::Ok(Command::TutorModel(model)),
                None => ParseResult::InvalidArgument {
                    command: "tutor-model".to_string(),
                    argument: args.to_string(),
                },
            }
        }
        "badges" | "b" => ParseResult::Ok(Command::Badges),
        _ => ParseResult::UnknownCommand(cmd.to_string()),
    }
}

/// Parse a 1-based number into a 0-based index
fn ordinal(command: &str, arg: &str) -> Result<usize, ParseResult> {
    if arg.is_empty() {
        return Err(ParseResult::MissingArgument(command.to_string()));
    }
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ParseResult::InvalidArgument {
            command: command.to_string(),
            argument: arg.to_string(),
        }),
    }
}
