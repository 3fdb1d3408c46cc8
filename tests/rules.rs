//! Rule invariants checked over many seeded games.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use skirmish::board::{Board, MapDefinition, PlayerId, MIN_TROOP_INCOME};
use skirmish::config::{GameConfig, PlayerKind};
use skirmish::game::{ActionOutcome, Game};
use skirmish::policy::{play_phase, RandomPolicy};
use skirmish::resolve::{blitz, Phase, RngDice};

fn ai_game(players: usize, seed: u64) -> Game {
    Game::classic(GameConfig {
        players: vec![PlayerKind::Ai; players],
        card_schedule: None,
        seed,
    })
    .unwrap()
}

fn total_troops(board: &Board) -> u32 {
    board.map().region_ids().map(|r| board.troops(r)).sum()
}

#[test]
fn random_deals_are_balanced() {
    let map = MapDefinition::classic();
    for players in 2..=6u8 {
        for seed in 0..20u64 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut board = Board::new(map.clone(), players);
            board.generate_random_board(&mut rng);

            assert!(board.is_consistent());
            assert!(map.region_ids().all(|r| board.owner(r).is_some() && board.troops(r) == 1));

            let counts: Vec<u32> = PlayerId::all(players).map(|p| board.territory_count(p)).collect();
            let min = *counts.iter().min().unwrap();
            let max = *counts.iter().max().unwrap();
            assert!(max - min <= 1, "{} players, seed {}: {:?}", players, seed, counts);
            assert_eq!(counts.iter().sum::<u32>() as usize, map.region_count());
        }
    }
}

#[test]
fn blitz_stops_at_a_terminal_state() {
    let mut rng = SmallRng::seed_from_u64(11);
    let mut dice = RngDice(SmallRng::seed_from_u64(12));
    for _ in 0..2000 {
        let attacker = rng.gen_range(2..40);
        let defender = rng.gen_range(1..40);
        let r = blitz(attacker, defender, &mut dice);

        assert!(r.attacker_remaining >= 1);
        assert!(r.attacker_remaining == 1 || r.defender_remaining == 0);
        assert_eq!(r.attacker_remaining + r.attacker_losses, attacker);
        assert_eq!(r.defender_remaining + r.defender_losses, defender);
        assert!(r.rounds >= 1);
        // Each round removes one or two troops in total.
        let lost = r.attacker_losses + r.defender_losses;
        assert!(lost >= r.rounds && lost <= 2 * r.rounds);
    }
}

#[test]
fn blitz_from_a_single_troop_does_nothing() {
    let mut dice = RngDice(SmallRng::seed_from_u64(1));
    let r = blitz(1, 5, &mut dice);
    assert_eq!(r.rounds, 0);
    assert_eq!(r.attacker_remaining, 1);
    assert_eq!(r.defender_remaining, 5);
}

#[test]
fn income_never_drops_below_minimum() {
    for seed in 0..10u64 {
        let game = ai_game(6, seed);
        for p in PlayerId::all(6) {
            assert!(game.troop_income(p) >= MIN_TROOP_INCOME);
        }
    }
}

#[test]
fn connected_regions_are_owned_and_reachable() {
    for seed in 0..10u64 {
        let game = ai_game(3, seed);
        let board = game.board();
        let map = game.map();
        for source in map.region_ids() {
            let Some(owner) = board.owner(source) else { continue };
            let connected = board.find_connected_territories(owner, source);
            assert!(!connected.contains(&source));
            for &r in &connected {
                assert_eq!(board.owner(r), Some(owner));
                // Every member borders the source or another member.
                assert!(map
                    .neighbors(r)
                    .iter()
                    .any(|n| *n == source || connected.contains(n)));
            }
            for &n in map.neighbors(source) {
                if board.owner(n) == Some(owner) {
                    assert!(connected.contains(&n));
                }
            }
        }
    }
}

#[test]
fn aggressive_games_keep_the_board_consistent() {
    for seed in 1..6u64 {
        let mut game = ai_game(4, seed);
        let mut policy = RandomPolicy::new(seed).with_attack_probability(0.9);

        for _ in 0..40 * 3 * 4 {
            if game.is_over() {
                break;
            }
            let before = total_troops(game.board());
            let player = game.current_player();
            // Eliminated seats keep their turn but have nowhere to deploy.
            let deploy = if game.is_eliminated(player) {
                0
            } else {
                game.remaining_deploy(player)
            };
            let phase = game.phase();

            let mut consistent = true;
            play_phase(&mut game, &mut policy, |g, outcome| {
                consistent &= g.board().is_consistent();
                if let ActionOutcome::Attacked { outcome, .. } = outcome {
                    assert!(outcome.captured() || outcome.moved == 0);
                }
            });
            assert!(consistent, "seed {}", seed);

            let after = total_troops(game.board());
            match phase {
                Phase::Deploy => assert_eq!(after, before + deploy),
                Phase::Attack => assert!(after <= before),
                Phase::Fortify => assert_eq!(after, before),
            }
            game.end_phase();
        }

        if let Some(winner) = game.winner() {
            let map = game.map();
            assert!(map.region_ids().all(|r| game.board().owner(r) == Some(winner)));
        }
    }
}

#[test]
fn turn_order_visits_every_seat() {
    let mut game = ai_game(5, 3);
    let mut seen = Vec::new();
    for _ in 0..5 {
        seen.push(game.current_player());
        assert_eq!(game.phase(), Phase::Deploy);
        for _ in 0..3 {
            game.end_phase();
        }
    }
    assert_eq!(seen, PlayerId::all(5).collect::<Vec<_>>());
    assert_eq!(game.current_player(), PlayerId(1));
    assert_eq!(game.round(), 2);
}
