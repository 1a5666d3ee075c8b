#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that ranks damageable tiles into the next turret volley.

use soul_collector_core::{Health, SortStrategy, TileSnapshot, TileView};

/// Target selection system that reuses a scratch buffer between volleys.
#[derive(Debug, Default)]
pub struct TargetSelector {
    strategy: SortStrategy,
    workspace: Vec<Candidate>,
}

impl TargetSelector {
    /// Creates a selector ranking tiles with the provided algorithm.
    #[must_use]
    pub fn new(strategy: SortStrategy) -> Self {
        Self {
            strategy,
            workspace: Vec::new(),
        }
    }

    /// Algorithm used to rank tiles.
    #[must_use]
    pub const fn strategy(&self) -> SortStrategy {
        self.strategy
    }

    /// Computes the next volley from the provided tile snapshot.
    ///
    /// Destroyed and invulnerable tiles are skipped. The remaining tiles are
    /// ordered by ascending health, ties keeping their view order, and at most
    /// `shots_per_round` of them are written to `out`. The output buffer is
    /// cleared first.
    pub fn select(&mut self, tiles: &TileView, shots_per_round: u32, out: &mut Vec<TileSnapshot>) {
        out.clear();
        if shots_per_round == 0 {
            return;
        }

        self.prepare_workspace(tiles);
        if self.workspace.is_empty() {
            return;
        }

        match self.strategy {
            SortStrategy::ExchangeSort => exchange_sort(&mut self.workspace),
            SortStrategy::InsertionSort => insertion_sort(&mut self.workspace),
        }

        let limit = usize::try_from(shots_per_round).unwrap_or(usize::MAX);
        out.extend(
            self.workspace
                .iter()
                .take(limit)
                .map(|candidate| candidate.snapshot),
        );
    }

    fn prepare_workspace(&mut self, tiles: &TileView) {
        self.workspace.clear();
        self.workspace.reserve(tiles.len());

        for snapshot in tiles.iter().filter(|snapshot| snapshot.is_targetable()) {
            let Health::Points(health) = snapshot.health else {
                continue;
            };
            self.workspace.push(Candidate {
                health,
                snapshot: *snapshot,
            });
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate {
    health: u32,
    snapshot: TileSnapshot,
}

impl Candidate {
    fn follows(&self, other: &Self) -> bool {
        self.health > other.health
    }
}

/// Adjacent exchange passes, stopping after the first pass without a swap.
fn exchange_sort(items: &mut [Candidate]) {
    let len = items.len();
    for pass in 0..len {
        let mut swapped = false;
        for index in 0..len - pass - 1 {
            if items[index].follows(&items[index + 1]) {
                items.swap(index, index + 1);
                swapped = true;
            }
        }
        if !swapped {
            break;
        }
    }
}

/// Inserts each item into the sorted prefix, shifting strictly larger items.
fn insertion_sort(items: &mut [Candidate]) {
    for next in 1..items.len() {
        let mut index = next;
        while index > 0 && items[index - 1].follows(&items[index]) {
            items.swap(index - 1, index);
            index -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use soul_collector_core::Coordinate;

    use super::*;

    fn tile(x: i32, z: i32, health: Health) -> TileSnapshot {
        TileSnapshot {
            coordinate: Coordinate::new(x, z),
            health,
            destroyed: false,
        }
    }

    fn candidates(healths: &[u32]) -> Vec<Candidate> {
        healths
            .iter()
            .enumerate()
            .map(|(index, health)| Candidate {
                health: *health,
                snapshot: tile(index as i32, 0, Health::Points(*health)),
            })
            .collect()
    }

    fn coordinates(items: &[Candidate]) -> Vec<i32> {
        items.iter().map(|candidate| candidate.snapshot.coordinate.x()).collect()
    }

    #[test]
    fn both_sorts_keep_equal_health_in_source_order() {
        let mut exchange = candidates(&[2, 1, 2, 1, 3]);
        let mut insertion = exchange.clone();
        exchange_sort(&mut exchange);
        insertion_sort(&mut insertion);

        assert_eq!(coordinates(&exchange), vec![1, 3, 0, 2, 4]);
        assert_eq!(exchange, insertion);
    }

    #[test]
    fn sorts_handle_trivial_inputs() {
        let mut empty: Vec<Candidate> = Vec::new();
        exchange_sort(&mut empty);
        insertion_sort(&mut empty);
        assert!(empty.is_empty());

        let mut single = candidates(&[4]);
        exchange_sort(&mut single);
        insertion_sort(&mut single);
        assert_eq!(coordinates(&single), vec![0]);
    }

    #[test]
    fn skips_destroyed_and_invulnerable_tiles() {
        let mut destroyed = tile(0, 1, Health::Points(0));
        destroyed.destroyed = true;
        let view = TileView::from_snapshots(vec![
            tile(0, 0, Health::Invulnerable),
            destroyed,
            tile(1, 0, Health::Points(3)),
            tile(2, 0, Health::Points(1)),
        ]);

        let mut selector = TargetSelector::new(SortStrategy::InsertionSort);
        let mut volley = Vec::new();
        selector.select(&view, 5, &mut volley);

        assert_eq!(
            volley,
            vec![tile(2, 0, Health::Points(1)), tile(1, 0, Health::Points(3))]
        );
    }

    #[test]
    fn volley_is_truncated_to_shots_per_round() {
        let view = TileView::from_snapshots(
            (0..6)
                .map(|x| tile(x, 0, Health::Points(6 - x as u32)))
                .collect(),
        );
        let mut selector = TargetSelector::new(SortStrategy::ExchangeSort);
        let mut volley = vec![tile(9, 9, Health::Points(1))];

        selector.select(&view, 3, &mut volley);
        let picked: Vec<_> = volley.iter().map(|tile| tile.coordinate.x()).collect();
        assert_eq!(picked, vec![5, 4, 3]);

        selector.select(&view, 0, &mut volley);
        assert!(volley.is_empty());
    }
}
