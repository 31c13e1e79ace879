//! Integration tests for the Conquest rules engine.
//!
//! These tests verify complete game flows from setup through to victory.

use conquest_core::*;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

/// A freshly initialized world-map game with a fixed seed
fn seeded_game(players: usize, seed: u64) -> GameEngine {
    let mut engine = GameEngine::with_seed(GameMap::world(), seed);
    engine
        .initialize_new_game(players)
        .expect("player count should be valid");
    engine
}

/// Helper to get any valid action of a specific type
fn find_action<F>(engine: &GameEngine, player: PlayerId, filter: F) -> Option<PlayerAction>
where
    F: Fn(&PlayerAction) -> bool,
{
    engine.valid_actions(player).into_iter().find(filter)
}

/// Play the whole startup phase with first-available placements
fn complete_startup(engine: &mut GameEngine) {
    let mut iterations = 0;
    let max_iterations = 500;

    while engine.phase == GamePhase::Startup && iterations < max_iterations {
        let player = engine
            .current_player_id()
            .expect("startup has a current player");
        let territory = engine.map.territories_owned_by(player)[0].name.clone();
        engine
            .place_startup_army(player, &territory)
            .expect("startup placement should be legal");
        iterations += 1;
    }

    assert_eq!(
        engine.phase,
        GamePhase::Reinforcement,
        "startup should finish within {} placements",
        max_iterations
    );
}

#[test]
fn test_distribution_is_even_for_every_player_count() {
    for n in 2..=6usize {
        let engine = seeded_game(n, n as u64);
        let granted = (42.0 * 2.75 / n as f64).floor() as u32;

        let mut counts = Vec::new();
        for player in &engine.players {
            let owned = engine.map.owned_count(player.id);
            counts.push(owned);
            // One army already garrisons each owned territory
            assert_eq!(player.unallocated_armies, granted - owned as u32);
        }

        assert_eq!(counts.iter().sum::<usize>(), 42);
        let max = *counts.iter().max().unwrap();
        let min = *counts.iter().min().unwrap();
        assert!(
            max - min <= 1,
            "{} players got uneven territory counts {:?}",
            n,
            counts
        );

        // Conservation: armies on the map plus pools equals the full grant
        let on_map: u32 = engine.map.territories().map(|t| t.armies).sum();
        let in_pools: u32 = engine.players.iter().map(|p| p.unallocated_armies).sum();
        assert_eq!(on_map + in_pools, granted * n as u32);
    }
}

#[test]
fn test_startup_round_robin_until_pools_empty() {
    let mut engine = seeded_game(3, 21);

    // Someone else cannot jump the queue
    let other = engine.players[1].id;
    let other_territory = engine.map.territories_owned_by(other)[0].name.clone();
    assert!(matches!(
        engine.place_startup_army(other, &other_territory),
        Err(GameError::InvalidMove(_))
    ));

    let pools: u32 = engine.players.iter().map(|p| p.unallocated_armies).sum();
    let mut placements = 0;
    while engine.phase == GamePhase::Startup {
        let player = engine.current_player_id().unwrap();
        // A player with an empty pool never gets the startup turn
        assert!(engine.get_player(player).unwrap().unallocated_armies > 0);

        let action = find_action(&engine, player, |a| {
            matches!(a, PlayerAction::PlaceStartupArmy { .. })
        })
        .expect("current player should have startup placements");
        engine.apply_action(player, action).unwrap();

        placements += 1;
        assert!(placements <= pools, "startup should not loop past the pools");
    }

    assert_eq!(placements, pools);
    assert_eq!(engine.turn_number, 1);
    assert_eq!(engine.current_player_id(), Some(engine.players[0].id));
    // Initialization plus one version bump per placement
    assert_eq!(engine.version(), 1 + placements as u64);

    // Everyone's pool is empty except the first player's fresh grant
    for player in engine.players.iter().skip(1) {
        assert_eq!(player.unallocated_armies, 0);
    }
    assert!(engine.players[0].unallocated_armies >= 3);
}

#[test]
fn test_startup_skips_exhausted_pools() {
    let mut engine = seeded_game(3, 29);
    engine.players[0].unallocated_armies = 2;
    engine.players[1].unallocated_armies = 1;
    engine.players[2].unallocated_armies = 1;

    let mut order = Vec::new();
    while engine.phase == GamePhase::Startup {
        let player = engine.current_player_id().unwrap();
        order.push(player);
        let territory = engine.map.territories_owned_by(player)[0].name.clone();
        engine.place_startup_army(player, &territory).unwrap();
    }

    assert_eq!(order, vec![1, 2, 3, 1]);
    assert_eq!(engine.phase, GamePhase::Reinforcement);
    assert_eq!(engine.current_player_id(), Some(1));
    assert_eq!(engine.turn_number, 1);
}

#[test]
fn test_reinforcement_placement_is_all_or_nothing() {
    let mut engine = seeded_game(3, 8);
    complete_startup(&mut engine);

    let player = engine.current_player_id().unwrap();
    let granted = engine.get_player(player).unwrap().unallocated_armies;
    assert!(granted >= 3, "reinforcement grant has a floor of three");

    let target = engine.map.territories_owned_by(player)[0].name.clone();
    let elsewhere = engine.map.territories_owned_by(player)[1].name.clone();

    // Overshooting the pool is rejected without placing anything
    let before = engine.map.territory(&target).unwrap().armies;
    let overshoot = BTreeMap::from([(target.clone(), granted), (elsewhere, 1)]);
    assert!(matches!(
        engine.place_reinforcements(player, overshoot),
        Err(GameError::InvalidMove(_))
    ));
    assert_eq!(engine.map.territory(&target).unwrap().armies, before);
    assert_eq!(engine.get_player(player).unwrap().unallocated_armies, granted);

    // Placing the exact pool lands on the map and empties the counter
    engine
        .place_reinforcements(player, BTreeMap::from([(target.clone(), granted)]))
        .unwrap();
    assert_eq!(
        engine.map.territory(&target).unwrap().armies,
        before + granted
    );
    assert_eq!(engine.get_player(player).unwrap().unallocated_armies, 0);

    engine.end_reinforcement(player).unwrap();
    assert_eq!(engine.phase, GamePhase::Attack);
}

#[test]
fn test_attack_conquest_and_card_draw() {
    let mut engine = seeded_game(2, 3);

    // Craft a lopsided border, keeping the defender alive elsewhere
    engine.phase = GamePhase::Attack;
    engine.map.set_owner("Alaska", 1);
    engine.map.set_armies("Alaska", 30);
    engine.map.set_owner("Kamchatka", 2);
    engine.map.set_armies("Kamchatka", 1);
    engine.map.set_owner("Japan", 2);
    engine.map.set_armies("Japan", 3);

    let deck_before = engine.deck.len();
    let mut conquered = false;

    for _ in 0..40 {
        if engine.pending_conquest.is_some() {
            // Everything but the occupation move is blocked
            assert!(matches!(
                engine.end_attack_phase(1),
                Err(GameError::InvalidMove(_))
            ));
            engine.move_conquest_armies(1, 1).unwrap();
            conquered = true;
            break;
        }

        let armies = engine.map.territory("Alaska").unwrap().armies;
        assert!(armies >= 2, "a 30 v 1 border should not drain the attacker");
        let pair_before = armies + engine.map.territory("Kamchatka").unwrap().armies;

        let events = engine
            .attack(1, "Alaska", "Kamchatka", MAX_ATTACKER_DICE.min(armies - 1), 1)
            .unwrap();

        // One defending die: exactly one army dies per battle
        match &events[0] {
            GameEvent::AttackResolved { outcome, .. } => {
                assert_eq!(outcome.attacker_losses + outcome.defender_losses, 1);
            }
            other => panic!("expected an attack resolution, got {:?}", other),
        }
        let pair_after = engine.map.territory("Alaska").unwrap().armies
            + engine.map.territory("Kamchatka").unwrap().armies;
        assert_eq!(pair_after, pair_before - 1);
    }

    assert!(conquered, "the conquest should land within 40 battles");
    assert_eq!(engine.map.territory("Kamchatka").unwrap().owner, Some(1));
    assert_eq!(engine.map.territory("Kamchatka").unwrap().armies, 1);
    assert!(engine.pending_conquest.is_none());

    // Ending a conquering attack phase draws one card
    let events = engine.end_attack_phase(1).unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::CardDrawn { player: 1, .. })));
    assert_eq!(engine.deck.len(), deck_before - 1);
    assert_eq!(engine.get_player(1).unwrap().hand_size(), 1);
    assert_eq!(engine.phase, GamePhase::Fortification);
}

#[test]
fn test_fortification_once_per_turn() {
    let mut engine = seeded_game(2, 19);
    engine.phase = GamePhase::Fortification;
    engine.map.set_owner("Alaska", 1);
    engine.map.set_armies("Alaska", 5);
    engine.map.set_owner("Northwest Territory", 1);
    engine.map.set_armies("Northwest Territory", 2);
    engine.map.set_owner("Brazil", 1);
    engine.map.set_armies("Brazil", 2);

    // Non-adjacent target rejected with no mutation
    assert!(matches!(
        engine.fortify(1, "Alaska", "Brazil", 2),
        Err(GameError::InvalidMove(_))
    ));
    assert_eq!(engine.map.territory("Alaska").unwrap().armies, 5);

    // Moving the whole garrison is rejected too
    assert!(matches!(
        engine.fortify(1, "Alaska", "Northwest Territory", 5),
        Err(GameError::InvalidMove(_))
    ));

    engine.fortify(1, "Alaska", "Northwest Territory", 3).unwrap();
    assert_eq!(engine.map.territory("Alaska").unwrap().armies, 2);
    assert_eq!(
        engine.map.territory("Northwest Territory").unwrap().armies,
        5
    );

    // Only one fortification per turn
    assert!(matches!(
        engine.fortify(1, "Northwest Territory", "Alaska", 1),
        Err(GameError::InvalidMove(_))
    ));
}

#[test]
fn test_elimination_transfers_cards_and_ends_game() {
    let mut engine = seeded_game(2, 13);

    // Player 1 owns the whole map except a one-army Kamchatka
    let names: Vec<String> = engine.map.territory_names().map(str::to_string).collect();
    for name in &names {
        engine.map.set_owner(name, 1);
        engine.map.set_armies(name, 3);
    }
    engine.map.set_owner("Kamchatka", 2);
    engine.map.set_armies("Kamchatka", 1);
    engine.map.set_armies("Alaska", 30);
    engine.players[1].hand = vec![Card::Cavalry, Card::Artillery];
    engine.players[1].unallocated_armies = 0;
    engine.phase = GamePhase::Attack;

    let mut conquered = false;
    for _ in 0..40 {
        if engine.pending_conquest.is_some() {
            let events = engine.move_conquest_armies(1, 1).unwrap();
            assert!(events.iter().any(|e| matches!(
                e,
                GameEvent::PlayerEliminated {
                    player: 2,
                    by: 1,
                    cards_transferred: 2
                }
            )));
            assert!(events
                .iter()
                .any(|e| matches!(e, GameEvent::GameWon { player: 1 })));
            conquered = true;
            break;
        }

        let armies = engine.map.territory("Alaska").unwrap().armies;
        assert!(armies >= 2, "a 30 v 1 border should not drain the attacker");
        engine
            .attack(1, "Alaska", "Kamchatka", MAX_ATTACKER_DICE.min(armies - 1), 1)
            .unwrap();
    }
    assert!(conquered, "the last stand should fall within 40 battles");

    assert_eq!(engine.winner(), Some(1));
    assert_eq!(engine.get_player(1).unwrap().status, PlayerStatus::Winner);
    assert_eq!(
        engine.get_player(2).unwrap().status,
        PlayerStatus::Eliminated
    );
    assert_eq!(engine.get_player(1).unwrap().hand_size(), 2);
    assert!(engine.get_player(2).unwrap().hand.is_empty());

    // Every further mutating action is rejected
    assert!(matches!(
        engine.advance_turn(1),
        Err(GameError::GameAlreadyOver)
    ));
    assert!(matches!(
        engine.attack(1, "Alaska", "Kamchatka", 1, 1),
        Err(GameError::GameAlreadyOver)
    ));
}

#[test]
fn test_turn_end_grants_base_plus_continent_bonus() {
    let mut engine = seeded_game(2, 17);

    let names: Vec<String> = engine.map.territory_names().map(str::to_string).collect();
    for name in &names {
        engine.map.set_owner(name, 1);
        engine.map.set_armies(name, 2);
    }
    // Player 2 holds all of South America plus six more territories
    let second_holdings = [
        "Venezuela", "Brazil", "Peru", "Argentina", "Alaska", "Japan", "Siam", "Egypt", "Ural",
        "Iceland",
    ];
    for name in second_holdings {
        engine.map.set_owner(name, 2);
    }
    engine.players[1].unallocated_armies = 0;
    engine.phase = GamePhase::Fortification;

    let events = engine.advance_turn(1).unwrap();
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::TurnEnded {
            player: 1,
            next_player: 2
        }
    )));
    // 10 territories / 3 floors to the base of 3; South America pays 2
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::ReinforcementsGranted {
            player: 2,
            base: 3,
            continent_bonus: 2
        }
    )));
    assert_eq!(engine.get_player(2).unwrap().unallocated_armies, 5);
    assert_eq!(engine.phase, GamePhase::Reinforcement);
    assert_eq!(engine.current_player_id(), Some(2));
    assert_eq!(engine.turn_number, 1);
}

#[test]
fn test_snapshot_round_trips_as_json() {
    let engine = seeded_game(3, 23);

    let json = engine.to_json().expect("state should serialize");
    let snapshot: GameSnapshot =
        serde_json::from_str(&json).expect("snapshot should parse back");

    assert_eq!(snapshot.version, engine.version());
    assert_eq!(snapshot.phase, GamePhase::Startup);
    assert_eq!(snapshot.players.len(), 3);
    assert_eq!(snapshot.deck_size, 42);
    assert_eq!(snapshot.current_player, engine.current_player_id());
    assert_eq!(snapshot.map.territory_count(), 42);
}

#[test]
fn test_bot_game_simulation() {
    // Mixed-strategy games must never trip over their own rules
    for seed in 0..3 {
        let mut engine = seeded_game(3, seed);
        let mut bots = vec![
            Bot::with_seed(1, BotStrategy::Aggressive, seed),
            Bot::with_seed(2, BotStrategy::Random, seed + 100),
            Bot::with_seed(3, BotStrategy::Defensive, seed + 200),
        ];

        let outcome =
            run_bots(&mut engine, &mut bots, 150).expect("bots should only pick legal actions");

        match outcome {
            Some(winner) => {
                assert!(engine.map.all_owned_by(winner));
                assert_eq!(engine.winner(), Some(winner));
            }
            None => assert!(engine.turn_number > 150),
        }
        assert!(engine.version() > 0);
    }
}
