//! Placement of collectables, obstacles and the player on a fresh board.

use soul_collector_core::{Coordinate, PlacementError};

use crate::random::{take_random, RandomSource};

/// Cells chosen for each entity kind. No cell appears twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Placement {
    pub(crate) collectables: Vec<Coordinate>,
    pub(crate) obstacles: Vec<Coordinate>,
    pub(crate) player: Coordinate,
}

/// Draws cells without replacement from `candidates`.
///
/// Collectables are drawn first, then obstacles, then the player. Fails
/// before drawing anything when the candidates cannot hold every entity.
pub(crate) fn place_objects<R>(
    mut candidates: Vec<Coordinate>,
    collectables: u32,
    obstacles: u32,
    random: &mut R,
) -> Result<Placement, PlacementError>
where
    R: RandomSource + ?Sized,
{
    let available = u32::try_from(candidates.len()).unwrap_or(u32::MAX);
    let required = collectables.saturating_add(obstacles).saturating_add(1);
    if required > available {
        return Err(PlacementError::InsufficientSpace {
            required,
            available,
        });
    }

    let mut draw = |count: u32| -> Vec<Coordinate> {
        (0..count)
            .filter_map(|_| take_random(&mut *random, &mut candidates))
            .collect()
    };

    let collectables = draw(collectables);
    let obstacles = draw(obstacles);
    let player = draw(1)
        .pop()
        .ok_or(PlacementError::InsufficientSpace {
            required,
            available,
        })?;

    Ok(Placement {
        collectables,
        obstacles,
        player,
    })
}
