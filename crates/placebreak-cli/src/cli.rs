//! Command-line definitions for the `placebreak` binary.
//!
//! All clap-derived types live here. Execution lives in `run`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use placebreak_types::{ActionType, Direction, Location};

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(
    name = "placebreak",
    version = env!("CARGO_PKG_VERSION"),
    about = "Inspect and edit the place-and-break patch tag store"
)]
pub(crate) struct Cli {
    /// Configuration file (YAML). Defaults apply when it does not exist.
    #[arg(long, short = 'c', env = "PLACEBREAK_CONFIG", default_value = "placebreak.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Tag a location, replacing any existing tag
    Tag {
        /// Location as `world,x,y,z`
        #[arg(value_parser = parse_location)]
        location: Location,
        /// Expire after the ephemeral window instead of persisting
        #[arg(long)]
        ephemeral: bool,
        /// Block material; restricted materials are skipped
        #[arg(long)]
        material: Option<String>,
    },
    /// Remove the tag at a location
    Untag {
        /// Location as `world,x,y,z`
        #[arg(value_parser = parse_location)]
        location: Location,
        /// Block material; restricted materials are skipped
        #[arg(long)]
        material: Option<String>,
    },
    /// Print the tag stored at a location
    Show {
        /// Location as `world,x,y,z`
        #[arg(value_parser = parse_location)]
        location: Location,
    },
    /// Decide whether an action at a location is a place-and-break exploit
    Check {
        /// Action type, e.g. BREAK, TNT_BREAK, PLACE, FISH
        action: ActionType,
        /// Location as `world,x,y,z`
        #[arg(value_parser = parse_location)]
        location: Location,
        /// Block material; restricted materials are never exploits
        #[arg(long)]
        material: Option<String>,
    },
    /// Move the tags of blocks one step in a direction, as a piston does
    Move {
        /// Direction of the push
        #[arg(long, value_enum)]
        direction: DirectionArg,
        /// Locations of the moved blocks, each as `world,x,y,z`
        #[arg(required = true, value_parser = parse_location)]
        locations: Vec<Location>,
        /// Material shared by the moved blocks; restricted materials are skipped
        #[arg(long)]
        material: Option<String>,
    },
}

/// Named piston directions.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DirectionArg {
    Up,
    Down,
    North,
    South,
    East,
    West,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => Self::UP,
            DirectionArg::Down => Self::DOWN,
            DirectionArg::North => Self::NORTH,
            DirectionArg::South => Self::SOUTH,
            DirectionArg::East => Self::EAST,
            DirectionArg::West => Self::WEST,
        }
    }
}

/// Parse `world,x,y,z`. The world name may itself contain commas.
pub(crate) fn parse_location(input: &str) -> Result<Location, CliError> {
    let invalid = |reason: &str| CliError::Location {
        input: input.to_owned(),
        reason: reason.to_owned(),
    };

    let mut parts = input.rsplitn(4, ',');
    let (Some(z), Some(y), Some(x), Some(world)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid("expected world,x,y,z"));
    };

    let world = world.trim();
    if world.is_empty() {
        return Err(invalid("world name is empty"));
    }
    let coordinate = |raw: &str| {
        raw.trim()
            .parse::<i32>()
            .map_err(|e| invalid(&format!("coordinate {raw:?}: {e}")))
    };
    Ok(Location::new(world, coordinate(x)?, coordinate(y)?, coordinate(z)?))
}
