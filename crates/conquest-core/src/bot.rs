//! Bot players and the simulation loop.
//!
//! This module provides per-player strategies:
//! - Random: uniform over the legal action menu
//! - Aggressive: trades early, masses armies on contested borders, attacks
//!   while it has the advantage
//! - Defensive: never attacks, spreads armies toward its weakest holdings
//!
//! Human players simply have no bot attached; they drive the engine through
//! `apply_action` directly.

use crate::actions::PlayerAction;
use crate::game::{GameEngine, GameError};
use crate::player::PlayerId;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Bot playing style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotStrategy {
    Random,
    Aggressive,
    Defensive,
}

/// A bot player that can decide on actions
pub struct Bot {
    pub player_id: PlayerId,
    pub strategy: BotStrategy,
    rng: StdRng,
}

impl Bot {
    pub fn new(player_id: PlayerId, strategy: BotStrategy) -> Self {
        Self {
            player_id,
            strategy,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(player_id: PlayerId, strategy: BotStrategy, seed: u64) -> Self {
        Self {
            player_id,
            strategy,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Choose an action from the valid actions
    pub fn choose_action(&mut self, engine: &GameEngine) -> Option<PlayerAction> {
        let valid_actions = engine.valid_actions(self.player_id);
        if valid_actions.is_empty() {
            return None;
        }

        match self.strategy {
            BotStrategy::Random => self.choose_random(&valid_actions),
            BotStrategy::Aggressive => self.choose_aggressive(engine, &valid_actions),
            BotStrategy::Defensive => self.choose_defensive(engine, &valid_actions),
        }
    }

    /// Random: just pick a random valid action
    fn choose_random(&mut self, actions: &[PlayerAction]) -> Option<PlayerAction> {
        actions.choose(&mut self.rng).cloned()
    }

    /// Aggressive: convert cards to armies as soon as possible, pile armies
    /// where the enemy is strongest, and keep attacking while ahead
    fn choose_aggressive(
        &mut self,
        engine: &GameEngine,
        actions: &[PlayerAction],
    ) -> Option<PlayerAction> {
        // Trade whenever a set is ready
        if let Some(trade) = actions
            .iter()
            .find(|a| matches!(a, PlayerAction::TradeCards { .. }))
        {
            return Some(trade.clone());
        }

        // Push everything forward into a conquered territory
        let move_max = actions
            .iter()
            .filter_map(|a| match a {
                PlayerAction::MoveConqueredArmies { count } => Some(*count),
                _ => None,
            })
            .max();
        if let Some(count) = move_max {
            return Some(PlayerAction::MoveConqueredArmies { count });
        }

        // Mass startup and reinforcement armies on the hottest border
        let placement = actions
            .iter()
            .filter(|a| {
                matches!(
                    a,
                    PlayerAction::PlaceStartupArmy { .. } | PlayerAction::PlaceArmies { .. }
                )
            })
            .max_by_key(|a| match a {
                PlayerAction::PlaceStartupArmy { territory } => {
                    self.border_pressure(engine, territory)
                }
                PlayerAction::PlaceArmies { placements } => placements
                    .keys()
                    .next()
                    .map_or(0, |name| self.border_pressure(engine, name)),
                _ => 0,
            });
        if let Some(action) = placement {
            return Some(action.clone());
        }

        // Attack wherever the army advantage is biggest, while there is one
        let best_attack = actions
            .iter()
            .filter_map(|a| match a {
                PlayerAction::Attack { from, to, .. } => {
                    let from_armies = self.armies_on(engine, from);
                    let to_armies = self.armies_on(engine, to);
                    if from_armies > to_armies + 1 {
                        Some((a, from_armies - to_armies))
                    } else {
                        None
                    }
                }
                _ => None,
            })
            .max_by_key(|(_, advantage)| *advantage);
        if let Some((attack, _)) = best_attack {
            return Some(attack.clone());
        }

        // Shift armies toward the most contested front
        let fortify = actions
            .iter()
            .filter_map(|a| match a {
                PlayerAction::Fortify { from, to, .. } => {
                    let gain = self.border_pressure(engine, to) as i64
                        - self.border_pressure(engine, from) as i64;
                    if gain > 0 {
                        Some((a, gain))
                    } else {
                        None
                    }
                }
                _ => None,
            })
            .max_by_key(|(_, gain)| *gain);
        if let Some((action, _)) = fortify {
            return Some(action.clone());
        }

        if let Some(end) = actions.iter().find(|a| {
            matches!(
                a,
                PlayerAction::EndReinforcement | PlayerAction::EndAttack | PlayerAction::EndTurn
            )
        }) {
            return Some(end.clone());
        }

        // Fallback to random
        actions.choose(&mut self.rng).cloned()
    }

    /// Defensive: never attacks, reinforces whatever is thinnest, and only
    /// trades when the hand forces it
    fn choose_defensive(
        &mut self,
        engine: &GameEngine,
        actions: &[PlayerAction],
    ) -> Option<PlayerAction> {
        // Trade only when it is the sole option (mandatory hand limit)
        if actions
            .iter()
            .all(|a| matches!(a, PlayerAction::TradeCards { .. }))
        {
            return actions.first().cloned();
        }

        // A pending conquest still has to be occupied; garrison the minimum
        let move_min = actions
            .iter()
            .filter_map(|a| match a {
                PlayerAction::MoveConqueredArmies { count } => Some(*count),
                _ => None,
            })
            .min();
        if let Some(count) = move_min {
            return Some(PlayerAction::MoveConqueredArmies { count });
        }

        // Shore up the weakest holding
        let placement = actions
            .iter()
            .filter(|a| {
                matches!(
                    a,
                    PlayerAction::PlaceStartupArmy { .. } | PlayerAction::PlaceArmies { .. }
                )
            })
            .min_by_key(|a| match a {
                PlayerAction::PlaceStartupArmy { territory } => self.armies_on(engine, territory),
                PlayerAction::PlaceArmies { placements } => placements
                    .keys()
                    .next()
                    .map_or(u32::MAX, |name| self.armies_on(engine, name)),
                _ => u32::MAX,
            });
        if let Some(action) = placement {
            return Some(action.clone());
        }

        // Never attack
        if actions.iter().any(|a| matches!(a, PlayerAction::EndAttack)) {
            return Some(PlayerAction::EndAttack);
        }

        // Even out armies toward a thin neighbor
        let fortify = actions.iter().find_map(|a| match a {
            PlayerAction::Fortify { from, to, .. } => {
                let from_armies = self.armies_on(engine, from);
                let to_armies = self.armies_on(engine, to);
                if from_armies > to_armies + 1 {
                    Some(PlayerAction::Fortify {
                        from: from.clone(),
                        to: to.clone(),
                        count: (from_armies - to_armies) / 2,
                    })
                } else {
                    None
                }
            }
            _ => None,
        });
        if let Some(action) = fortify {
            return Some(action);
        }

        if let Some(end) = actions
            .iter()
            .find(|a| matches!(a, PlayerAction::EndReinforcement | PlayerAction::EndTurn))
        {
            return Some(end.clone());
        }

        actions.choose(&mut self.rng).cloned()
    }

    /// Total enemy armies on territories bordering `name`
    fn border_pressure(&self, engine: &GameEngine, name: &str) -> u32 {
        let territory = match engine.map.territory(name) {
            Some(t) => t,
            None => return 0,
        };
        territory
            .neighbors
            .iter()
            .filter_map(|n| engine.map.territory(n))
            .filter(|t| t.owner.is_some() && t.owner != Some(self.player_id))
            .map(|t| t.armies)
            .sum()
    }

    fn armies_on(&self, engine: &GameEngine, name: &str) -> u32 {
        engine.map.territory(name).map_or(0, |t| t.armies)
    }
}

/// Play bot turns until someone wins or the turn cap is reached. Returns
/// the winner, or None when the cap stops play first. Stops early when the
/// acting player has no bot (a human seat) or a bot has no move to offer.
pub fn run_bots(
    engine: &mut GameEngine,
    bots: &mut [Bot],
    max_turns: u32,
) -> Result<Option<PlayerId>, GameError> {
    loop {
        if engine.is_finished() {
            return Ok(engine.winner());
        }
        if engine.turn_number > max_turns {
            return Ok(None);
        }

        let current = match engine.current_player_id() {
            Some(id) => id,
            None => {
                return Err(GameError::InvalidMove(
                    "the game has not been initialized".to_string(),
                ))
            }
        };
        let bot = match bots.iter_mut().find(|b| b.player_id == current) {
            Some(b) => b,
            None => return Ok(None),
        };
        let action = match bot.choose_action(engine) {
            Some(a) => a,
            None => return Ok(None),
        };
        engine.apply_action(current, action)?;
    }
}
