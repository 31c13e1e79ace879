//! Conquest - a Risk-style territorial strategy game engine
//!
//! This crate provides the core rules logic for Conquest, including:
//! - World map representation with territories, continents, and adjacency
//! - Card deck and trade-in economy
//! - Dice-based combat resolution
//! - Turn-phase state machine with full rule enforcement
//! - Simple bot strategies and a simulation loop
//!
//! # Architecture
//!
//! The engine is UI-agnostic and synchronous: a driver (controller, bot
//! loop, or test) submits actions, and the engine validates them, mutates
//! state, and returns the resulting events. All randomness flows through
//! one engine-owned RNG, so seeded games replay identically.
//!
//! # Modules
//!
//! - [`map`]: Territories, continents, and the adjacency graph
//! - [`card`]: Cards, trade-in matching, and the draw deck
//! - [`player`]: Player state, colors, and id allocation
//! - [`combat`]: Dice rolling and battle resolution
//! - [`actions`]: Player actions and emitted events
//! - [`game`]: The engine and phase state machine
//! - [`bot`]: Bot strategies and the bot game loop

pub mod actions;
pub mod bot;
pub mod card;
pub mod combat;
pub mod game;
pub mod map;
pub mod player;

// Re-export commonly used types
pub use actions::{GameEvent, PlayerAction};
pub use bot::{run_bots, Bot, BotStrategy};
pub use card::{is_matched_set, Card, Deck};
pub use combat::{BattleOutcome, MAX_ATTACKER_DICE, MAX_DEFENDER_DICE};
pub use game::{GameEngine, GameError, GamePhase, GameSnapshot, PendingConquest};
pub use map::{Continent, GameMap, Territory};
pub use player::{Player, PlayerColor, PlayerId, PlayerIdAllocator, PlayerStatus};
