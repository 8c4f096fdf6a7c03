//! Execution of parsed commands against a connected [`PatchService`].

use placebreak_core::{PatchError, PatchService};
use placebreak_store::TagRepository;
use placebreak_types::{Block, Direction, DisplacementSet};

use crate::cli::Command;
use crate::error::CliError;

/// Run `command` and return the text to print.
pub(crate) async fn execute<R: TagRepository>(
    service: &PatchService<R>,
    command: Command,
) -> Result<String, CliError> {
    match command {
        Command::Tag {
            location,
            ephemeral,
            material,
        } => {
            let stored = match material {
                Some(material) => {
                    service
                        .put_block_tag(&Block::new(location.clone(), material), ephemeral)
                        .await?
                }
                None => Some(service.put_tag(location.clone(), ephemeral).await?),
            };
            Ok(match stored {
                Some(tag) => format!(
                    "tagged {location} ({}, id {})",
                    kind(tag.is_ephemeral()),
                    tag.id()
                ),
                None => format!("skipped {location}: material is restricted"),
            })
        }
        Command::Untag { location, material } => {
            let attempted = match material {
                Some(material) => {
                    service
                        .remove_block_tag(&Block::new(location.clone(), material))
                        .await?
                }
                None => {
                    service.remove_tag(&location).await?;
                    true
                }
            };
            Ok(if attempted {
                format!("untagged {location}")
            } else {
                format!("skipped {location}: material is restricted")
            })
        }
        Command::Show { location } => Ok(match service.find_tag(&location).await? {
            Some(tag) => format!(
                "{location}: {} tag {} created {}",
                kind(tag.is_ephemeral()),
                tag.id(),
                tag.created_at().to_rfc3339()
            ),
            None => format!("{location}: untagged"),
        }),
        Command::Check {
            action,
            location,
            material,
        } => {
            if let Some(material) = material {
                let block = Block::new(location.clone(), material);
                let exploit = service.is_block_exploit(action, &block).await?;
                return Ok(format!("{action} at {location}: exploit={exploit}"));
            }
            let verdict = service.verdict(action, &location).await?;
            Ok(format!(
                "{action} at {location}: exploit={} ({verdict:?})",
                verdict.is_exploit()
            ))
        }
        Command::Move {
            direction,
            locations,
            material,
        } => {
            let count = locations.len();
            let direction_vector = Direction::from(direction);
            let moved = match material {
                Some(material) => {
                    let blocks: Vec<Block> = locations
                        .into_iter()
                        .map(|location| Block::new(location, material.as_str()))
                        .collect();
                    service.move_blocks(&blocks, direction_vector).await?
                }
                None => {
                    let displacements = DisplacementSet::from_blocks(locations, direction_vector)
                        .map_err(PatchError::from)?;
                    service.move_tags(&displacements).await?
                }
            };
            Ok(format!(
                "moved {moved} tag(s) across {count} block(s) {direction:?}"
            ))
        }
    }
}

const fn kind(ephemeral: bool) -> &'static str {
    if ephemeral { "ephemeral" } else { "persistent" }
}
