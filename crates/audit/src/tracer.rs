//! Hopper chain connectivity.

use std::collections::HashSet;

use cloudaudit_core::{block_ids, HopperFacing, WorldPos};
use cloudaudit_world::{BlockOracle, OracleError};
use tracing::trace;

/// Follow the hopper chain starting at `start` and report whether it reaches
/// `end`.
///
/// Returns `(true, None)` once `end` is reached (whatever block is there) and
/// `(false, Some(reason))` on a cycle, a non-hopper block or a hopper facing
/// up. Visits each position at most once, so a chain of `n` hoppers costs at
/// most `n + 1` oracle queries.
pub fn is_connected<O>(
    start: WorldPos,
    end: WorldPos,
    oracle: &O,
) -> Result<(bool, Option<String>), OracleError>
where
    O: BlockOracle + ?Sized,
{
    let mut visited = HashSet::new();
    let mut current = start;
    while current != end {
        if !visited.insert(current) {
            return Ok((
                false,
                Some(format!("hopper chain points into itself at {current}")),
            ));
        }
        let block = oracle.block_at(current)?;
        if !block.is(block_ids::HOPPER) {
            return Ok((false, Some(format!("block at {current} is not a hopper"))));
        }
        let facing = match HopperFacing::from_metadata(block.damage) {
            Some(facing) if facing != HopperFacing::Up => facing,
            _ => {
                return Ok((
                    false,
                    Some(format!(
                        "unknown hopper facing {} at {current}",
                        block.damage & 0x7
                    )),
                ))
            }
        };
        let (dx, dy, dz) = facing.step();
        trace!(from = %current, %facing, "Following hopper");
        current = current.offset(dx, dy, dz);
    }
    Ok((true, None))
}
