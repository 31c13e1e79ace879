//! Player state and identity.
//!
//! This module contains:
//! - Player ids and the engine-scoped id allocator
//! - Player colors for display
//! - Per-player state: unallocated armies, hand of cards, status

use crate::card::Card;
use serde::{Deserialize, Serialize};

/// Player identifier. Ids are sequential starting at 1 and stay unique for
/// the lifetime of an engine's id series.
pub type PlayerId = u32;

/// Player color for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerColor {
    Red,
    Blue,
    Green,
    Yellow,
    Black,
    Purple,
}

impl PlayerColor {
    /// Get the color for a player id (cycles through the palette)
    pub fn for_player(id: PlayerId) -> Self {
        match id % 6 {
            1 => PlayerColor::Red,
            2 => PlayerColor::Blue,
            3 => PlayerColor::Green,
            4 => PlayerColor::Yellow,
            5 => PlayerColor::Black,
            _ => PlayerColor::Purple,
        }
    }

    /// Get hex color code for rendering
    pub fn hex_code(&self) -> u32 {
        match self {
            PlayerColor::Red => 0xE74C3C,
            PlayerColor::Blue => 0x3498DB,
            PlayerColor::Green => 0x2ECC71,
            PlayerColor::Yellow => 0xF1C40F,
            PlayerColor::Black => 0x34495E,
            PlayerColor::Purple => 0x9B59B6,
        }
    }
}

/// Whether a player still takes turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    InGame,
    Eliminated,
    Winner,
}

/// Hands out sequential player ids. One allocator belongs to one engine and
/// is reset only at an explicit new-series boundary, never implicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerIdAllocator {
    next: PlayerId,
}

impl PlayerIdAllocator {
    /// Create an allocator whose first id is 1
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Take the next id
    pub fn allocate(&mut self) -> PlayerId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Restart the sequence at 1
    pub fn reset(&mut self) {
        self.next = 1;
    }
}

impl Default for PlayerIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A single player's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Unique id from the engine's allocator
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Display color
    pub color: PlayerColor,
    /// Armies granted but not yet placed on a territory
    pub unallocated_armies: u32,
    /// Cards held, traded in matched sets of three
    pub hand: Vec<Card>,
    /// In-game, eliminated, or winner
    pub status: PlayerStatus,
}

impl Player {
    /// Create a new player
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            color: PlayerColor::for_player(id),
            unallocated_armies: 0,
            hand: Vec::new(),
            status: PlayerStatus::InGame,
        }
    }

    /// Whether this player still holds territories and takes turns
    pub fn is_in_game(&self) -> bool {
        matches!(self.status, PlayerStatus::InGame)
    }

    /// Grant unallocated armies
    pub fn add_unallocated(&mut self, count: u32) {
        self.unallocated_armies += count;
    }

    /// Try to spend unallocated armies, returning false if there are not
    /// enough
    pub fn try_spend_unallocated(&mut self, count: u32) -> bool {
        if self.unallocated_armies < count {
            return false;
        }
        self.unallocated_armies -= count;
        true
    }

    /// Number of cards in hand
    pub fn hand_size(&self) -> usize {
        self.hand.len()
    }

    /// Check the hand contains the given cards as a multiset
    pub fn holds_cards(&self, cards: &[Card]) -> bool {
        let mut remaining = self.hand.clone();
        for card in cards {
            match remaining.iter().position(|c| c == card) {
                Some(pos) => {
                    remaining.swap_remove(pos);
                }
                None => return false,
            }
        }
        true
    }

    /// Remove the given cards from the hand, returning false (and leaving
    /// the hand untouched) if any are missing
    pub fn remove_cards(&mut self, cards: &[Card]) -> bool {
        if !self.holds_cards(cards) {
            return false;
        }
        for card in cards {
            if let Some(pos) = self.hand.iter().position(|c| c == card) {
                self.hand.remove(pos);
            }
        }
        true
    }

    /// Take every card out of the hand (when a player is eliminated their
    /// cards pass to the conqueror)
    pub fn surrender_hand(&mut self) -> Vec<Card> {
        std::mem::take(&mut self.hand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_allocator_is_sequential_from_one() {
        let mut alloc = PlayerIdAllocator::new();
        assert_eq!(alloc.allocate(), 1);
        assert_eq!(alloc.allocate(), 2);
        assert_eq!(alloc.allocate(), 3);
    }

    #[test]
    fn test_id_allocator_reset_starts_new_series() {
        let mut alloc = PlayerIdAllocator::new();
        alloc.allocate();
        alloc.allocate();
        alloc.reset();
        assert_eq!(alloc.allocate(), 1);
    }

    #[test]
    fn test_colors_cycle_through_palette() {
        assert_eq!(PlayerColor::for_player(1), PlayerColor::Red);
        assert_eq!(PlayerColor::for_player(2), PlayerColor::Blue);
        assert_eq!(PlayerColor::for_player(6), PlayerColor::Purple);
        assert_eq!(PlayerColor::for_player(7), PlayerColor::Red);
    }

    #[test]
    fn test_holds_cards_respects_multiplicity() {
        let mut player = Player::new(1, "Test".to_string());
        player.hand = vec![Card::Infantry, Card::Infantry, Card::Cavalry];

        assert!(player.holds_cards(&[Card::Infantry, Card::Infantry]));
        assert!(player.holds_cards(&[Card::Infantry, Card::Cavalry]));
        assert!(!player.holds_cards(&[Card::Infantry, Card::Infantry, Card::Infantry]));
        assert!(!player.holds_cards(&[Card::Artillery]));
    }

    #[test]
    fn test_remove_cards_all_or_nothing() {
        let mut player = Player::new(1, "Test".to_string());
        player.hand = vec![Card::Infantry, Card::Infantry, Card::Cavalry];

        assert!(!player.remove_cards(&[Card::Infantry, Card::Artillery]));
        assert_eq!(player.hand_size(), 3);

        assert!(player.remove_cards(&[Card::Infantry, Card::Cavalry]));
        assert_eq!(player.hand, vec![Card::Infantry]);
    }

    #[test]
    fn test_try_spend_unallocated() {
        let mut player = Player::new(1, "Test".to_string());
        player.add_unallocated(5);

        assert!(player.try_spend_unallocated(3));
        assert_eq!(player.unallocated_armies, 2);
        assert!(!player.try_spend_unallocated(3));
        assert_eq!(player.unallocated_armies, 2);
    }

    #[test]
    fn test_surrender_hand_empties_it() {
        let mut player = Player::new(1, "Test".to_string());
        player.hand = vec![Card::Infantry, Card::Artillery];

        let cards = player.surrender_hand();
        assert_eq!(cards.len(), 2);
        assert!(player.hand.is_empty());
    }
}
