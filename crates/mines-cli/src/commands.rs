//! REPL command parsing.

use mines_core::BOARD_TILES;

/// One line of user input.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Fetch the user profile.
    User,
    /// Start a round; missing values fall back to the configured defaults.
    Start {
        /// Bet amount.
        bet: Option<f64>,
        /// Mine count.
        mines: Option<u32>,
    },
    /// Reveal a tile.
    Pick(u32),
    /// Cash out the active round.
    CashOut,
    /// Set or clear the client seed.
    Seed(Option<String>),
    /// Print the current state.
    State,
    /// Print the command list.
    Help,
    /// Exit.
    Quit,
}

/// Why a line could not be parsed.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// First word is not a command.
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    /// A required argument was not given.
    #[error("missing {0}")]
    Missing(&'static str),
    /// An argument did not parse.
    #[error("invalid {what}: '{value}'")]
    Invalid {
        /// Argument name.
        what: &'static str,
        /// Raw input.
        value: String,
    },
}

/// Help text printed by `help`.
pub const HELP: &str = "\
commands:
  user                  fetch balance and limits
  start [bet] [mines]   start a new round
  pick <index>          reveal tile 0-24
  cashout               take the current win
  seed [value]          set (or clear) the client seed
  state                 show the current round
  help                  show this list
  quit                  exit";

/// Parse one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<Command>, ParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let command = match head.to_lowercase().as_str() {
        "user" | "balance" => Command::User,
        "start" | "bet" => Command::Start {
            bet: words.next().map(|v| number(v, "bet")).transpose()?,
            mines: words.next().map(|v| number(v, "mine count")).transpose()?,
        },
        "pick" | "p" => {
            let raw = words.next().ok_or(ParseError::Missing("tile index"))?;
            let tile: u32 = number(raw, "tile index")?;
            if tile >= BOARD_TILES {
                return Err(ParseError::Invalid {
                    what: "tile index",
                    value: raw.to_string(),
                });
            }
            Command::Pick(tile)
        }
        "cashout" | "cash-out" | "c" => Command::CashOut,
        "seed" => Command::Seed(words.next().map(str::to_string)),
        "state" | "s" => Command::State,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn number<T: std::str::FromStr>(raw: &str, what: &'static str) -> Result<T, ParseError> {
    raw.parse().map_err(|_| ParseError::Invalid {
        what,
        value: raw.to_string(),
    })
}
