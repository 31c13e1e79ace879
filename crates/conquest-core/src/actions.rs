//! Game actions that players can take.
//!
//! This module defines all possible actions in the game and the events
//! that result from those actions.

use crate::card::Card;
use crate::combat::BattleOutcome;
use crate::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// All possible actions a player can take
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerAction {
    // ==================== Startup Phase ====================
    /// Place one army from the startup pool onto an owned territory
    PlaceStartupArmy { territory: String },

    // ==================== Reinforcement Phase ====================
    /// Trade exactly three cards for armies
    TradeCards { cards: Vec<Card> },
    /// Place unallocated armies onto owned territories, all at once
    PlaceArmies { placements: BTreeMap<String, u32> },
    /// Finish reinforcement and move on to the attack phase
    EndReinforcement,

    // ==================== Attack Phase ====================
    /// Roll for battle against an adjacent enemy territory
    Attack {
        from: String,
        to: String,
        attacker_dice: u32,
        defender_dice: u32,
    },
    /// Move armies into a just-conquered territory
    MoveConqueredArmies { count: u32 },
    /// Finish attacking and move on to the fortification phase
    EndAttack,

    // ==================== Fortification Phase ====================
    /// Move armies between two adjacent owned territories (once per turn)
    Fortify {
        from: String,
        to: String,
        count: u32,
    },
    /// End your turn
    EndTurn,
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A new game was set up
    GameInitialized {
        players: Vec<PlayerId>,
        armies_per_player: u32,
    },

    /// Every territory was assigned an initial owner
    TerritoriesDistributed {
        assignments: Vec<(String, PlayerId)>,
    },

    /// A startup army was placed
    StartupArmyPlaced { player: PlayerId, territory: String },

    /// All startup armies have been placed; regular turns begin
    StartupCompleted,

    /// A player received reinforcement armies at the start of their turn
    ReinforcementsGranted {
        player: PlayerId,
        base: u32,
        continent_bonus: u32,
    },

    /// A card set was traded for armies
    CardsTraded {
        player: PlayerId,
        cards: Vec<Card>,
        armies_granted: u32,
    },

    /// Unallocated armies were placed on territories
    ArmiesPlaced {
        player: PlayerId,
        placements: BTreeMap<String, u32>,
    },

    /// The reinforcement phase ended
    ReinforcementEnded { player: PlayerId },

    /// A battle was rolled and losses applied
    AttackResolved {
        attacker: PlayerId,
        defender: PlayerId,
        from: String,
        to: String,
        outcome: BattleOutcome,
    },

    /// A defending territory ran out of armies
    TerritoryConquered { player: PlayerId, territory: String },

    /// Armies were moved into a conquered territory
    ConquestArmiesMoved {
        player: PlayerId,
        from: String,
        to: String,
        count: u32,
    },

    /// The conqueror drew a card
    CardDrawn {
        player: PlayerId,
        card: Card, // Hidden from other players
    },

    /// A player lost their last territory
    PlayerEliminated {
        player: PlayerId,
        by: PlayerId,
        cards_transferred: u32,
    },

    /// The attack phase ended
    AttackEnded { player: PlayerId },

    /// Armies were moved between owned territories
    Fortified {
        player: PlayerId,
        from: String,
        to: String,
        count: u32,
    },

    /// Turn ended
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    /// A player conquered the whole map
    GameWon { player: PlayerId },
}
