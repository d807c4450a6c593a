//! Text rendering of boards and events.

use std::fmt::Write as _;

use mines_core::{GameState, Session, SessionEvent};

const BOARD_WIDTH: u32 = 5;

/// Draw the board for `session`.
///
/// `.` hidden, `o` revealed safe, `*` disclosed mine, `X` the mine that ended
/// the round.
pub fn board(session: &Session) -> String {
    let mut out = String::new();
    for row_start in (0..session.number_of_tiles).step_by(BOARD_WIDTH as usize) {
        let row_end = (row_start + BOARD_WIDTH).min(session.number_of_tiles);
        let cells: Vec<&str> = (row_start..row_end)
            .map(|tile| {
                if session.fatal_tile == Some(tile) {
                    "X"
                } else if session.tiles_revealed.contains(&tile) {
                    "o"
                } else if session.mine_positions.contains(&tile) {
                    "*"
                } else {
                    "."
                }
            })
            .collect();
        let _ = writeln!(out, "  {:>2}  {}", row_start, cells.join(" "));
    }
    out
}

/// One-line summary of the round.
pub fn summary(session: &Session, state: GameState) -> String {
    format!(
        "session {} | {state:?} | bet {:.2} | mines {} | revealed {}/{} | multiplier x{:.2} | next x{:.2} ({:.2}) | cash out {:.2}",
        session.session_id,
        session.bet_amount,
        session.mine_count,
        session.tiles_revealed.len(),
        session.safe_tiles(),
        session.current_multiplier,
        session.next_multiplier,
        session.next_win_amount,
        session.cash_out_amount,
    )
}

/// Console line for a published event.
pub fn describe(event: &SessionEvent) -> String {
    let body = match event {
        SessionEvent::UserInfoUpdated(profile) => {
            format!("user {} balance {:.2}", profile.user_id, profile.balance)
        }
        SessionEvent::GameSessionStarted(session) => format!(
            "session {} started: bet {:.2}, {} mines",
            session.session_id, session.bet_amount, session.mine_count
        ),
        SessionEvent::PickTileResponseReceived(response) if response.is_loss() => {
            format!("mine hit! mines were at {:?}", response.mine_positions)
        }
        SessionEvent::PickTileResponseReceived(response) if response.is_completed() => {
            "board cleared".to_string()
        }
        SessionEvent::PickTileResponseReceived(response) => match response.next_multiplier {
            Some(next) => format!("safe, next multiplier x{next:.2}"),
            None => "safe".to_string(),
        },
        SessionEvent::CashOutReceived(response) => format!(
            "cashed out x{:.2} for {:.2}",
            response.multiplier, response.win_amount
        ),
        SessionEvent::RequestError(err) => format!("error {err}"),
    };
    format!("[{}] {body}", event.kind())
}
