//! Core game state machine.
//!
//! This module contains the main `GameEngine` struct and all game logic:
//! phase sequencing, the army and card economy, combat orchestration, and
//! the victory check.

use crate::actions::{GameEvent, PlayerAction};
use crate::card::{is_matched_set, Card, Deck};
use crate::combat::{battle, MAX_ATTACKER_DICE, MAX_DEFENDER_DICE};
use crate::map::GameMap;
use crate::player::{Player, PlayerId, PlayerIdAllocator, PlayerStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Initial armies per player: floor(territories x ratio / players)
const INITIAL_ARMY_RATIO: f64 = 2.75;

/// Armies granted by the first card trade of a game
const BASE_ARMY_VALUE: u32 = 5;

/// How much each successful trade raises the next trade's grant
const ARMY_VALUE_STEP: u32 = 5;

/// Hand size at which trading in becomes mandatory
const MANDATORY_TRADE_HAND: usize = 5;

/// Floor on the per-turn reinforcement grant
const MIN_REINFORCEMENT: u32 = 3;

/// Cards in a tradeable set
const TRADE_SET_SIZE: usize = 3;

/// Game phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Engine constructed, no game started yet
    Entry,

    /// Players, deck, and territories are being handed out
    Setup,

    /// Players alternate placing one startup army at a time
    Startup,

    /// Current player receives armies, trades cards, and places armies
    Reinforcement,

    /// Current player may battle adjacent enemy territories
    Attack,

    /// Current player may make one army transfer before ending the turn
    Fortification,

    /// Game is over
    Victory { winner: PlayerId },
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Player count {given} is out of range (2..={max})")]
    InvalidPlayerCount { given: usize, max: usize },

    #[error("Invalid move: {0}")]
    InvalidMove(String),

    #[error("Invalid trade: {0}")]
    InvalidTrade(String),

    #[error("No cards left in the deck")]
    EmptyDeck,

    #[error("Game is already over")]
    GameAlreadyOver,
}

/// A conquered territory waiting for the attacker's occupation move.
/// While one is pending every other action is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConquest {
    /// Territory the attack was launched from
    pub from: String,
    /// Territory whose defenders were wiped out
    pub to: String,
    /// Player who lost the territory
    pub defender: PlayerId,
}

/// The complete rules engine for one game
#[derive(Debug, Clone)]
pub struct GameEngine {
    /// The world map
    pub map: GameMap,
    /// All players, in seating order
    pub players: Vec<Player>,
    /// Current game phase
    pub phase: GamePhase,
    /// Turn number (1-based once regular play starts)
    pub turn_number: u32,
    /// Armies the next successful card trade grants, shared by all players
    pub army_value: u32,
    /// Card deck drawn from after a conquering attack phase
    pub deck: Deck,
    /// Conquest waiting for its occupation move
    pub pending_conquest: Option<PendingConquest>,
    /// Seat index of the acting player
    current_index: usize,
    /// Whether the acting player conquered a territory this turn
    conquered_this_turn: bool,
    /// Whether the acting player already fortified this turn
    fortified_this_turn: bool,
    /// Bumped by every successful mutating operation
    version: u64,
    allocator: PlayerIdAllocator,
    rng: StdRng,
}

impl GameEngine {
    // ==================== Construction ====================

    /// Create an engine over a map, seeded from system entropy
    pub fn new(map: GameMap) -> Self {
        Self::with_rng(map, StdRng::from_entropy())
    }

    /// Create an engine whose whole game (distribution, card draws, dice)
    /// replays identically for the same seed
    pub fn with_seed(map: GameMap, seed: u64) -> Self {
        Self::with_rng(map, StdRng::seed_from_u64(seed))
    }

    fn with_rng(map: GameMap, rng: StdRng) -> Self {
        Self {
            map,
            players: Vec::new(),
            phase: GamePhase::Entry,
            turn_number: 0,
            army_value: BASE_ARMY_VALUE,
            deck: Deck::new(),
            pending_conquest: None,
            current_index: 0,
            conquered_this_turn: false,
            fortified_this_turn: false,
            version: 0,
            allocator: PlayerIdAllocator::new(),
            rng,
        }
    }

    /// Set up a fresh game: create players, size and fill the deck,
    /// distribute territories, grant initial armies, and garrison one army
    /// on every territory. Callable before the first game and again after a
    /// victory (player ids keep counting up across games unless
    /// [`reset_id_series`](Self::reset_id_series) is called).
    pub fn initialize_new_game(
        &mut self,
        num_players: usize,
    ) -> Result<Vec<GameEvent>, GameError> {
        match self.phase {
            GamePhase::Entry | GamePhase::Victory { .. } => {}
            _ => {
                return Err(GameError::InvalidMove(
                    "a game is already in progress".to_string(),
                ))
            }
        }

        let territory_count = self.map.territory_count();
        if num_players < 2 || num_players > territory_count {
            return Err(GameError::InvalidPlayerCount {
                given: num_players,
                max: territory_count,
            });
        }

        self.phase = GamePhase::Setup;
        self.map.clear_ownership();
        self.players.clear();
        self.deck = Deck::sized_for(territory_count);
        self.army_value = BASE_ARMY_VALUE;
        self.turn_number = 0;
        self.current_index = 0;
        self.pending_conquest = None;
        self.conquered_this_turn = false;
        self.fortified_this_turn = false;

        for _ in 0..num_players {
            let id = self.allocator.allocate();
            self.players.push(Player::new(id, format!("Player {}", id)));
        }
        let ids: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();

        let assignments = self.map.distribute_territories(&ids, &mut self.rng);

        let armies_per_player =
            (territory_count as f64 * INITIAL_ARMY_RATIO / num_players as f64).floor() as u32;
        for player in &mut self.players {
            player.add_unallocated(armies_per_player);
        }

        // One army garrisons every territory, paid from its owner's pool
        let names: Vec<String> = self.map.territory_names().map(str::to_string).collect();
        for name in &names {
            self.map.set_armies(name, 1);
        }
        let owned_counts: Vec<(PlayerId, u32)> = ids
            .iter()
            .map(|&id| (id, self.map.owned_count(id) as u32))
            .collect();
        for (id, owned) in owned_counts {
            if let Some(player) = self.get_player_mut(id) {
                player.unallocated_armies -= owned;
            }
        }

        self.phase = GamePhase::Startup;
        self.version += 1;

        Ok(vec![
            GameEvent::GameInitialized {
                players: ids,
                armies_per_player,
            },
            GameEvent::TerritoriesDistributed { assignments },
        ])
    }

    // ==================== Accessors ====================

    /// Number of players in the game
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by id
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Id of the player whose turn it is
    pub fn current_player_id(&self) -> Option<PlayerId> {
        self.players.get(self.current_index).map(|p| p.id)
    }

    /// The player whose turn it is
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_index)
    }

    /// Check if the game has been won
    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Victory { .. })
    }

    /// Get the winner if the game is finished
    pub fn winner(&self) -> Option<PlayerId> {
        if let GamePhase::Victory { winner } = self.phase {
            Some(winner)
        } else {
            None
        }
    }

    /// State version. Every successful mutating operation increments it;
    /// observers poll the version and re-read state when it moves.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Restart the player id sequence from 1 for the next game
    pub fn reset_id_series(&mut self) {
        self.allocator.reset();
    }

    // ==================== Valid Actions ====================

    /// Get representative legal actions for a player in the current phase.
    /// Bots and hosts pick from this menu; `apply_action` remains the
    /// authority on legality.
    pub fn valid_actions(&self, player: PlayerId) -> Vec<PlayerAction> {
        let mut actions = Vec::new();

        if Some(player) != self.current_player_id() {
            return actions;
        }
        let current = match self.get_player(player) {
            Some(p) => p,
            None => return actions,
        };

        // A pending conquest blocks everything except the occupation move
        if let Some(pending) = &self.pending_conquest {
            let armies = self.map.territory(&pending.from).map_or(0, |t| t.armies);
            for count in 1..armies {
                actions.push(PlayerAction::MoveConqueredArmies { count });
            }
            return actions;
        }

        match &self.phase {
            GamePhase::Entry | GamePhase::Setup | GamePhase::Victory { .. } => {}

            GamePhase::Startup => {
                if current.unallocated_armies > 0 {
                    for territory in self.map.territories_owned_by(player) {
                        actions.push(PlayerAction::PlaceStartupArmy {
                            territory: territory.name.clone(),
                        });
                    }
                }
            }

            GamePhase::Reinforcement => {
                for cards in matched_sets(&current.hand) {
                    actions.push(PlayerAction::TradeCards { cards });
                }
                if current.hand_size() >= MANDATORY_TRADE_HAND {
                    // Trading is the only way forward
                    return actions;
                }
                if current.unallocated_armies > 0 {
                    for territory in self.map.territories_owned_by(player) {
                        actions.push(PlayerAction::PlaceArmies {
                            placements: BTreeMap::from([(
                                territory.name.clone(),
                                current.unallocated_armies,
                            )]),
                        });
                    }
                } else {
                    actions.push(PlayerAction::EndReinforcement);
                }
            }

            GamePhase::Attack => {
                for from in self.map.territories_owned_by(player) {
                    if from.armies < 2 {
                        continue;
                    }
                    for neighbor in &from.neighbors {
                        if let Some(to) = self.map.territory(neighbor) {
                            if to.owner.is_some() && to.owner != Some(player) {
                                actions.push(PlayerAction::Attack {
                                    from: from.name.clone(),
                                    to: to.name.clone(),
                                    attacker_dice: MAX_ATTACKER_DICE.min(from.armies - 1),
                                    defender_dice: MAX_DEFENDER_DICE.min(to.armies),
                                });
                            }
                        }
                    }
                }
                actions.push(PlayerAction::EndAttack);
            }

            GamePhase::Fortification => {
                if !self.fortified_this_turn {
                    for from in self.map.territories_owned_by(player) {
                        if from.armies < 2 {
                            continue;
                        }
                        for neighbor in &from.neighbors {
                            if let Some(to) = self.map.territory(neighbor) {
                                if to.owner == Some(player) {
                                    actions.push(PlayerAction::Fortify {
                                        from: from.name.clone(),
                                        to: to.name.clone(),
                                        count: from.armies - 1,
                                    });
                                }
                            }
                        }
                    }
                }
                actions.push(PlayerAction::EndTurn);
            }
        }

        actions
    }

    // ==================== Action Application ====================

    /// Apply a player action: validate, mutate, and return the resulting
    /// events. On error nothing has changed.
    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: PlayerAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        if matches!(self.phase, GamePhase::Victory { .. }) {
            return Err(GameError::GameAlreadyOver);
        }
        if self.pending_conquest.is_some()
            && !matches!(action, PlayerAction::MoveConqueredArmies { .. })
        {
            return Err(GameError::InvalidMove(
                "a conquered territory is waiting for its occupation move".to_string(),
            ));
        }

        let mut events = Vec::new();

        match action {
            // ==================== Startup Phase ====================
            PlayerAction::PlaceStartupArmy { territory } => {
                if self.phase != GamePhase::Startup {
                    return Err(GameError::InvalidMove(
                        "startup armies can only be placed during startup".to_string(),
                    ));
                }
                self.require_current(player)?;

                match self.map.territory(&territory) {
                    Some(t) if t.owner == Some(player) => {}
                    Some(_) => {
                        return Err(GameError::InvalidMove(format!(
                            "you do not own {}",
                            territory
                        )))
                    }
                    None => {
                        return Err(GameError::InvalidMove(format!(
                            "unknown territory {}",
                            territory
                        )))
                    }
                }
                if !self.players[self.current_index].try_spend_unallocated(1) {
                    return Err(GameError::InvalidMove(
                        "no unallocated armies left".to_string(),
                    ));
                }
                self.map.add_armies(&territory, 1);

                events.push(GameEvent::StartupArmyPlaced { player, territory });
                events.extend(self.advance_startup());
            }

            // ==================== Reinforcement Phase ====================
            PlayerAction::TradeCards { cards } => {
                if self.phase != GamePhase::Reinforcement {
                    return Err(GameError::InvalidMove(
                        "cards are traded during reinforcement".to_string(),
                    ));
                }
                self.require_current(player)?;

                if cards.len() != TRADE_SET_SIZE {
                    return Err(GameError::InvalidTrade(
                        "a trade uses exactly three cards".to_string(),
                    ));
                }
                if !is_matched_set(&cards) {
                    return Err(GameError::InvalidTrade(
                        "cards must be three of a kind or one of each kind".to_string(),
                    ));
                }

                let granted = self.army_value;
                let trader = &mut self.players[self.current_index];
                if !trader.remove_cards(&cards) {
                    return Err(GameError::InvalidTrade(
                        "those cards are not in your hand".to_string(),
                    ));
                }
                trader.add_unallocated(granted);
                self.army_value += ARMY_VALUE_STEP;

                events.push(GameEvent::CardsTraded {
                    player,
                    cards,
                    armies_granted: granted,
                });
            }

            PlayerAction::PlaceArmies { placements } => {
                if self.phase != GamePhase::Reinforcement {
                    return Err(GameError::InvalidMove(
                        "armies are placed during reinforcement".to_string(),
                    ));
                }
                self.require_current(player)?;
                if self.trade_required() {
                    return Err(GameError::InvalidTrade(
                        "a hand of five or more cards must be traded first".to_string(),
                    ));
                }
                if placements.is_empty() {
                    return Err(GameError::InvalidMove("no placements given".to_string()));
                }

                let mut total: u32 = 0;
                for (name, &count) in &placements {
                    if count == 0 {
                        return Err(GameError::InvalidMove(format!(
                            "placement on {} is zero",
                            name
                        )));
                    }
                    match self.map.territory(name) {
                        Some(t) if t.owner == Some(player) => total += count,
                        Some(_) => {
                            return Err(GameError::InvalidMove(format!("you do not own {}", name)))
                        }
                        None => {
                            return Err(GameError::InvalidMove(format!(
                                "unknown territory {}",
                                name
                            )))
                        }
                    }
                }
                if !self.players[self.current_index].try_spend_unallocated(total) {
                    return Err(GameError::InvalidMove(
                        "not enough unallocated armies".to_string(),
                    ));
                }
                for (name, &count) in &placements {
                    self.map.add_armies(name, count);
                }

                events.push(GameEvent::ArmiesPlaced { player, placements });
            }

            PlayerAction::EndReinforcement => {
                if self.phase != GamePhase::Reinforcement {
                    return Err(GameError::InvalidMove(
                        "not in the reinforcement phase".to_string(),
                    ));
                }
                self.require_current(player)?;
                if self.trade_required() {
                    return Err(GameError::InvalidTrade(
                        "a hand of five or more cards must be traded first".to_string(),
                    ));
                }
                if self.players[self.current_index].unallocated_armies > 0 {
                    return Err(GameError::InvalidMove(
                        "all unallocated armies must be placed first".to_string(),
                    ));
                }

                self.phase = GamePhase::Attack;
                events.push(GameEvent::ReinforcementEnded { player });
            }

            // ==================== Attack Phase ====================
            PlayerAction::Attack {
                from,
                to,
                attacker_dice,
                defender_dice,
            } => {
                if self.phase != GamePhase::Attack {
                    return Err(GameError::InvalidMove(
                        "not in the attack phase".to_string(),
                    ));
                }
                self.require_current(player)?;

                let (from_armies, to_armies, defender) = {
                    let from_t = self.map.territory(&from).ok_or_else(|| {
                        GameError::InvalidMove(format!("unknown territory {}", from))
                    })?;
                    let to_t = self.map.territory(&to).ok_or_else(|| {
                        GameError::InvalidMove(format!("unknown territory {}", to))
                    })?;

                    if from_t.owner != Some(player) {
                        return Err(GameError::InvalidMove(
                            "you do not own the attacking territory".to_string(),
                        ));
                    }
                    let defender = match to_t.owner {
                        Some(other) if other != player => other,
                        Some(_) => {
                            return Err(GameError::InvalidMove(
                                "cannot attack your own territory".to_string(),
                            ))
                        }
                        None => {
                            return Err(GameError::InvalidMove(
                                "cannot attack an unowned territory".to_string(),
                            ))
                        }
                    };
                    if !from_t.is_neighbor(&to) {
                        return Err(GameError::InvalidMove(format!(
                            "{} does not border {}",
                            from, to
                        )));
                    }
                    if from_t.armies < 2 {
                        return Err(GameError::InvalidMove(
                            "attacking needs at least two armies".to_string(),
                        ));
                    }
                    (from_t.armies, to_t.armies, defender)
                };

                if attacker_dice < 1
                    || attacker_dice > MAX_ATTACKER_DICE
                    || attacker_dice > from_armies - 1
                {
                    return Err(GameError::InvalidMove(
                        "attacker dice count is out of range".to_string(),
                    ));
                }
                if defender_dice < 1
                    || defender_dice > MAX_DEFENDER_DICE
                    || defender_dice > to_armies
                {
                    return Err(GameError::InvalidMove(
                        "defender dice count is out of range".to_string(),
                    ));
                }

                let outcome = battle(&mut self.rng, attacker_dice, defender_dice);
                let remaining = to_armies - outcome.defender_losses;
                self.map.set_armies(&from, from_armies - outcome.attacker_losses);
                self.map.set_armies(&to, remaining);

                events.push(GameEvent::AttackResolved {
                    attacker: player,
                    defender,
                    from: from.clone(),
                    to: to.clone(),
                    outcome,
                });

                if remaining == 0 {
                    self.conquered_this_turn = true;
                    self.pending_conquest = Some(PendingConquest {
                        from,
                        to: to.clone(),
                        defender,
                    });
                    events.push(GameEvent::TerritoryConquered {
                        player,
                        territory: to,
                    });
                }
            }

            PlayerAction::MoveConqueredArmies { count } => {
                if self.phase != GamePhase::Attack {
                    return Err(GameError::InvalidMove(
                        "not in the attack phase".to_string(),
                    ));
                }
                self.require_current(player)?;

                let pending = match &self.pending_conquest {
                    Some(p) => p.clone(),
                    None => {
                        return Err(GameError::InvalidMove(
                            "no conquest is pending".to_string(),
                        ))
                    }
                };
                let from_armies = self.map.territory(&pending.from).map_or(0, |t| t.armies);
                if count < 1 || count >= from_armies {
                    return Err(GameError::InvalidMove(
                        "the occupation must move at least one army and leave one behind"
                            .to_string(),
                    ));
                }

                self.pending_conquest = None;
                self.map.try_remove_armies(&pending.from, count);
                self.map.set_armies(&pending.to, count);
                self.map.set_owner(&pending.to, player);

                events.push(GameEvent::ConquestArmiesMoved {
                    player,
                    from: pending.from.clone(),
                    to: pending.to.clone(),
                    count,
                });

                // Losing the last territory eliminates the defender and
                // hands their cards to the attacker
                if self.map.owned_count(pending.defender) == 0 {
                    let cards = match self.get_player_mut(pending.defender) {
                        Some(defeated) => {
                            defeated.status = PlayerStatus::Eliminated;
                            defeated.surrender_hand()
                        }
                        None => Vec::new(),
                    };
                    let transferred = cards.len() as u32;
                    if let Some(attacker) = self.get_player_mut(player) {
                        attacker.hand.extend(cards);
                    }
                    events.push(GameEvent::PlayerEliminated {
                        player: pending.defender,
                        by: player,
                        cards_transferred: transferred,
                    });
                }

                events.extend(self.check_victory(player));
            }

            PlayerAction::EndAttack => {
                if self.phase != GamePhase::Attack {
                    return Err(GameError::InvalidMove(
                        "not in the attack phase".to_string(),
                    ));
                }
                self.require_current(player)?;

                // One card per turn with at least one conquest; skipped
                // silently once the deck runs dry
                if self.conquered_this_turn {
                    if let Some(card) = self.deck.draw(&mut self.rng) {
                        self.players[self.current_index].hand.push(card);
                        events.push(GameEvent::CardDrawn { player, card });
                    }
                    self.conquered_this_turn = false;
                }

                self.phase = GamePhase::Fortification;
                events.push(GameEvent::AttackEnded { player });
            }

            // ==================== Fortification Phase ====================
            PlayerAction::Fortify { from, to, count } => {
                if self.phase != GamePhase::Fortification {
                    return Err(GameError::InvalidMove(
                        "not in the fortification phase".to_string(),
                    ));
                }
                self.require_current(player)?;
                if self.fortified_this_turn {
                    return Err(GameError::InvalidMove(
                        "only one fortification per turn".to_string(),
                    ));
                }
                if from == to {
                    return Err(GameError::InvalidMove(
                        "source and target must differ".to_string(),
                    ));
                }

                {
                    let from_t = self.map.territory(&from).ok_or_else(|| {
                        GameError::InvalidMove(format!("unknown territory {}", from))
                    })?;
                    let to_t = self.map.territory(&to).ok_or_else(|| {
                        GameError::InvalidMove(format!("unknown territory {}", to))
                    })?;
                    if from_t.owner != Some(player) || to_t.owner != Some(player) {
                        return Err(GameError::InvalidMove(
                            "both territories must be yours".to_string(),
                        ));
                    }
                    if !from_t.is_neighbor(&to) {
                        return Err(GameError::InvalidMove(format!(
                            "{} does not border {}",
                            from, to
                        )));
                    }
                    if count < 1 || count >= from_t.armies {
                        return Err(GameError::InvalidMove(
                            "must move at least one army and leave one behind".to_string(),
                        ));
                    }
                }

                self.map.try_remove_armies(&from, count);
                self.map.add_armies(&to, count);
                self.fortified_this_turn = true;

                events.push(GameEvent::Fortified {
                    player,
                    from,
                    to,
                    count,
                });
            }

            // ==================== Turn Management ====================
            PlayerAction::EndTurn => {
                if self.phase != GamePhase::Fortification {
                    return Err(GameError::InvalidMove(
                        "turns end from the fortification phase".to_string(),
                    ));
                }
                self.require_current(player)?;

                let len = self.players.len();
                let next_index = (1..=len)
                    .map(|offset| (self.current_index + offset) % len)
                    .find(|&i| self.players[i].is_in_game())
                    .unwrap_or(self.current_index);

                self.current_index = next_index;
                self.fortified_this_turn = false;
                self.conquered_this_turn = false;
                self.turn_number += 1;
                self.phase = GamePhase::Reinforcement;

                let next_player = self.players[next_index].id;
                events.push(GameEvent::TurnEnded {
                    player,
                    next_player,
                });
                events.extend(self.begin_reinforcement());
            }
        }

        self.version += 1;
        Ok(events)
    }

    // ==================== Convenience Wrappers ====================

    /// Place one startup army
    pub fn place_startup_army(
        &mut self,
        player: PlayerId,
        territory: &str,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(
            player,
            PlayerAction::PlaceStartupArmy {
                territory: territory.to_string(),
            },
        )
    }

    /// Trade a matched set of three cards for armies
    pub fn trade_cards(
        &mut self,
        player: PlayerId,
        cards: Vec<Card>,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(player, PlayerAction::TradeCards { cards })
    }

    /// Place unallocated armies, all-or-nothing
    pub fn place_reinforcements(
        &mut self,
        player: PlayerId,
        placements: BTreeMap<String, u32>,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(player, PlayerAction::PlaceArmies { placements })
    }

    /// Leave reinforcement for the attack phase
    pub fn end_reinforcement(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(player, PlayerAction::EndReinforcement)
    }

    /// Roll a battle between two adjacent territories
    pub fn attack(
        &mut self,
        player: PlayerId,
        from: &str,
        to: &str,
        attacker_dice: u32,
        defender_dice: u32,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(
            player,
            PlayerAction::Attack {
                from: from.to_string(),
                to: to.to_string(),
                attacker_dice,
                defender_dice,
            },
        )
    }

    /// Move armies into a just-conquered territory
    pub fn move_conquest_armies(
        &mut self,
        player: PlayerId,
        count: u32,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(player, PlayerAction::MoveConqueredArmies { count })
    }

    /// Leave the attack phase, drawing a card if a conquest happened
    pub fn end_attack_phase(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(player, PlayerAction::EndAttack)
    }

    /// Make the turn's one fortification move
    pub fn fortify(
        &mut self,
        player: PlayerId,
        from: &str,
        to: &str,
        count: u32,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(
            player,
            PlayerAction::Fortify {
                from: from.to_string(),
                to: to.to_string(),
                count,
            },
        )
    }

    /// End the turn and hand play to the next surviving player
    pub fn advance_turn(&mut self, player: PlayerId) -> Result<Vec<GameEvent>, GameError> {
        self.apply_action(player, PlayerAction::EndTurn)
    }

    // ==================== Helper Methods ====================

    fn require_current(&self, player: PlayerId) -> Result<(), GameError> {
        match self.players.get(self.current_index) {
            Some(p) if p.id == player => Ok(()),
            _ => Err(GameError::InvalidMove("not your turn".to_string())),
        }
    }

    fn trade_required(&self) -> bool {
        self.players
            .get(self.current_index)
            .is_some_and(|p| p.hand_size() >= MANDATORY_TRADE_HAND)
    }

    /// After a startup placement, pass to the next player with armies left,
    /// or begin regular turns when every pool is empty
    fn advance_startup(&mut self) -> Vec<GameEvent> {
        let len = self.players.len();
        let next = (1..=len)
            .map(|offset| (self.current_index + offset) % len)
            .find(|&i| self.players[i].unallocated_armies > 0);

        match next {
            Some(index) => {
                self.current_index = index;
                Vec::new()
            }
            None => {
                self.current_index = 0;
                self.turn_number = 1;
                self.phase = GamePhase::Reinforcement;
                let mut events = vec![GameEvent::StartupCompleted];
                events.extend(self.begin_reinforcement());
                events
            }
        }
    }

    /// Grant the acting player their reinforcement armies: max(3, owned/3)
    /// plus the control value of every continent they fully own
    fn begin_reinforcement(&mut self) -> Vec<GameEvent> {
        let player_id = self.players[self.current_index].id;
        let owned = self.map.owned_count(player_id) as u32;
        let base = (owned / 3).max(MIN_REINFORCEMENT);
        let continent_bonus: u32 = self
            .map
            .continents_owned_by(player_id)
            .iter()
            .map(|c| c.control_value)
            .sum();

        self.players[self.current_index].add_unallocated(base + continent_bonus);

        vec![GameEvent::ReinforcementsGranted {
            player: player_id,
            base,
            continent_bonus,
        }]
    }

    fn check_victory(&mut self, player: PlayerId) -> Vec<GameEvent> {
        if !self.map.all_owned_by(player) {
            return Vec::new();
        }
        if let Some(p) = self.get_player_mut(player) {
            p.status = PlayerStatus::Winner;
        }
        self.phase = GamePhase::Victory { winner: player };
        vec![GameEvent::GameWon { player }]
    }
}

/// Serializable view of the whole game for hosts and UIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub turn_number: u32,
    pub current_player: Option<PlayerId>,
    pub army_value: u32,
    pub deck_size: usize,
    pub version: u64,
    pub players: Vec<Player>,
    pub map: GameMap,
    pub pending_conquest: Option<PendingConquest>,
}

impl GameEngine {
    /// Build a serializable snapshot of the current state
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            phase: self.phase.clone(),
            turn_number: self.turn_number,
            current_player: self.current_player_id(),
            army_value: self.army_value,
            deck_size: self.deck.len(),
            version: self.version,
            players: self.players.clone(),
            map: self.map.clone(),
            pending_conquest: self.pending_conquest.clone(),
        }
    }

    /// Snapshot the current state as a JSON string
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.snapshot())
    }
}

/// Distinct tradeable sets a hand can currently form
fn matched_sets(hand: &[Card]) -> Vec<Vec<Card>> {
    let mut sets = Vec::new();
    for kind in Card::ALL {
        if hand.iter().filter(|&&c| c == kind).count() >= 3 {
            sets.push(vec![kind, kind, kind]);
        }
    }
    if Card::ALL.iter().all(|kind| hand.contains(kind)) {
        sets.push(Card::ALL.to_vec());
    }
    sets
}
