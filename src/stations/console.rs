//! Line-oriented operator console shared by the station binaries.
//!
//! Each input line is parsed with clap, e.g. `balls team1 orange -2`, `penalty add team2
//! late_start`, `save` for the control station and `table 3`, `next` for a view station.

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc,
};
use tracing::warn;

use super::{control::ControlCommand, view::ViewCommand};
use crate::state::{
    match_state::{BallColor, InvalidTableId, TableId, TeamSide},
    penalty::PenaltyCode,
};

/// Operator line that could not be turned into a command.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// Unknown verb, missing argument or bad value; the message is clap's usage text.
    #[error("{0}")]
    Usage(String),
    /// The table id is not valid.
    #[error(transparent)]
    Table(#[from] InvalidTableId),
}

impl From<clap::Error> for ConsoleError {
    fn from(err: clap::Error) -> Self {
        ConsoleError::Usage(err.render().to_string())
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Team {
    Team1,
    Team2,
}

impl From<Team> for TeamSide {
    fn from(team: Team) -> Self {
        match team {
            Team::Team1 => TeamSide::Team1,
            Team::Team2 => TeamSide::Team2,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Color {
    Orange,
    Purple,
}

impl From<Color> for BallColor {
    fn from(color: Color) -> Self {
        match color {
            Color::Orange => BallColor::Orange,
            Color::Purple => BallColor::Purple,
        }
    }
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct ControlLine {
    #[command(subcommand)]
    input: ControlInput,
}

#[derive(Debug, Subcommand)]
enum ControlInput {
    /// Score another table.
    Table { id: String },
    /// Add to (or subtract from) a ball counter.
    Balls {
        team: Team,
        color: Color,
        #[arg(allow_negative_numbers = true)]
        delta: i32,
    },
    /// Edit the penalties of a team.
    Penalty {
        #[command(subcommand)]
        action: PenaltyAction,
    },
    /// Set the game number.
    Game { number: String },
    /// Rename a team; the rest of the line is the name.
    Name {
        team: Team,
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
    /// Store the current match.
    Save,
    /// Clear the current match.
    Reset,
}

#[derive(Debug, Subcommand)]
enum PenaltyAction {
    Add { team: Team, code: String },
    Remove { team: Team, code: String },
    /// Replace the whole list; no code clears it.
    Set { team: Team, codes: Vec<String> },
}

#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_help_flag = true)]
struct ViewLine {
    #[command(subcommand)]
    input: ViewInput,
}

#[derive(Debug, Subcommand)]
enum ViewInput {
    /// Follow a table.
    Table { id: String },
    /// Go back to table selection.
    Change,
    /// The "next" key.
    Next,
}

/// Parse one control-station input line.
pub fn parse_control(line: &str) -> Result<ControlCommand, ConsoleError> {
    let parsed = ControlLine::try_parse_from(line.split_whitespace())?;
    Ok(match parsed.input {
        ControlInput::Table { id } => ControlCommand::SelectTable(TableId::parse(id)?),
        ControlInput::Balls { team, color, delta } => ControlCommand::AdjustBalls {
            side: team.into(),
            color: color.into(),
            delta,
        },
        ControlInput::Penalty { action } => match action {
            PenaltyAction::Add { team, code } => ControlCommand::AddPenalty {
                side: team.into(),
                code: PenaltyCode::from(code),
            },
            PenaltyAction::Remove { team, code } => ControlCommand::RemovePenalty {
                side: team.into(),
                code: PenaltyCode::from(code),
            },
            PenaltyAction::Set { team, codes } => ControlCommand::SetPenalties {
                side: team.into(),
                codes: codes.into_iter().map(PenaltyCode::from).collect(),
            },
        },
        ControlInput::Game { number } => ControlCommand::SetGameNumber(number),
        ControlInput::Name { team, name } => ControlCommand::SetTeamName {
            side: team.into(),
            name: name.join(" "),
        },
        ControlInput::Save => ControlCommand::Save,
        ControlInput::Reset => ControlCommand::Reset,
    })
}

/// Parse one view-station input line. An empty line is the "next" key.
pub fn parse_view(line: &str) -> Result<ViewCommand, ConsoleError> {
    if line.trim().is_empty() {
        return Ok(ViewCommand::Advance);
    }
    let parsed = ViewLine::try_parse_from(line.split_whitespace())?;
    Ok(match parsed.input {
        ViewInput::Table { id } => ViewCommand::SelectTable(TableId::parse(id)?),
        ViewInput::Change => ViewCommand::ChangeTable,
        ViewInput::Next => ViewCommand::Advance,
    })
}

/// Feed parsed lines of `input` to `commands` until the input ends or the station stops.
///
/// Lines that do not parse are reported and skipped. Blank lines are skipped too unless the
/// parser accepts them.
pub async fn read_commands<R, C, F>(input: R, parse: F, commands: mpsc::UnboundedSender<C>)
where
    R: AsyncBufRead + Unpin,
    F: Fn(&str) -> Result<C, ConsoleError>,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "operator input unreadable");
                break;
            }
        };
        match parse(&line) {
            Ok(command) => {
                if commands.send(command).is_err() {
                    break;
                }
            }
            Err(_) if line.trim().is_empty() => {}
            Err(err) => warn!(%line, error = %err, "ignoring operator input"),
        }
    }
}
