use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use soul_collector_core::{
    Command, Coordinate, GameConfig, Health, SortStrategy, TileSnapshot, TileView,
};
use soul_collector_system_target_selection::TargetSelector;
use soul_collector_world::{self as world, query, World};

fn random_view(rng: &mut ChaCha8Rng) -> TileView {
    let size = rng.gen_range(1..=7);
    let mut snapshots = Vec::new();
    for x in 0..size {
        for z in 0..size {
            let health = match rng.gen_range(0..10) {
                0 => Health::Invulnerable,
                _ => Health::Points(rng.gen_range(1..=4)),
            };
            snapshots.push(TileSnapshot {
                coordinate: Coordinate::new(x, z),
                health,
                destroyed: rng.gen_range(0..8) == 0,
            });
        }
    }
    TileView::from_snapshots(snapshots)
}

fn reference_volley(view: &TileView, shots_per_round: u32) -> Vec<TileSnapshot> {
    let mut expected: Vec<TileSnapshot> = view
        .iter()
        .filter(|tile| tile.is_targetable())
        .copied()
        .collect();
    expected.sort_by_key(|tile| tile.health.points());
    expected.truncate(shots_per_round as usize);
    expected
}

#[test]
fn strategies_agree_with_stable_reference_sort() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x7a26_e7);
    let mut exchange = TargetSelector::new(SortStrategy::ExchangeSort);
    let mut insertion = TargetSelector::new(SortStrategy::InsertionSort);
    let mut exchange_volley = Vec::new();
    let mut insertion_volley = Vec::new();

    for _ in 0..200 {
        let view = random_view(&mut rng);
        let shots = rng.gen_range(0..12);

        exchange.select(&view, shots, &mut exchange_volley);
        insertion.select(&view, shots, &mut insertion_volley);

        let expected = reference_volley(&view, shots);
        assert_eq!(exchange_volley, expected);
        assert_eq!(insertion_volley, expected);
    }
}

#[test]
fn volley_from_generated_board_respects_limits() {
    let config = GameConfig {
        shots_per_round: 3,
        seed: 17,
        ..GameConfig::default()
    };
    let mut world = World::new(config).expect("valid config");
    let mut events = Vec::new();
    world::apply(&mut world, Command::NewGame, &mut events);

    let view = query::tile_view(&world);
    let targetable = view.iter().filter(|tile| tile.is_targetable()).count();
    let mut selector = TargetSelector::new(query::config(&world).sort_strategy);
    let mut volley = Vec::new();
    selector.select(&view, 3, &mut volley);

    assert_eq!(volley.len(), targetable.min(3));
    assert!(volley
        .windows(2)
        .all(|pair| pair[0].health.points() <= pair[1].health.points()));
    for target in &volley {
        assert!(!query::collectables(&world).contains(&target.coordinate));
        assert_ne!(target.health, Health::Invulnerable);
    }
}
