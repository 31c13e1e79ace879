//! Territory cards and the draw deck.
//!
//! This module contains:
//! - Card types earned through conquest and traded in for armies
//! - Trade-in set matching rules
//! - Deck construction sized to the map

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Card types. Cards are value objects; two cards of the same type are
/// interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Card {
    Infantry,
    Cavalry,
    Artillery,
}

impl Card {
    /// All card types
    pub const ALL: [Card; 3] = [Card::Infantry, Card::Cavalry, Card::Artillery];

    /// Number of distinct card types
    pub fn kind_count() -> usize {
        Self::ALL.len()
    }
}

/// Checks whether three cards form a tradeable set: three of the same type,
/// or one of each type. Any other selection (including a size other than 3)
/// does not match.
pub fn is_matched_set(cards: &[Card]) -> bool {
    if cards.len() != 3 {
        return false;
    }
    let all_same = cards[0] == cards[1] && cards[1] == cards[2];
    let all_distinct = cards[0] != cards[1] && cards[1] != cards[2] && cards[0] != cards[2];
    all_same || all_distinct
}

/// The draw deck. Cards leave when drawn and never return; traded-in sets
/// are discarded outright, so the deck only shrinks over a game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Create an empty deck
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the deck for a map with the given territory count, filled by
    /// cycling through the card types in order.
    ///
    /// The size is `territories + (territories % 3) * 3`.
    // TODO: for territory counts that are not a multiple of 3 (e.g. 43 -> 46)
    // this does not round up to a multiple of 3; confirm the intended rule
    // before changing it, since it alters observable deck sizes.
    pub fn sized_for(territory_count: usize) -> Self {
        let kinds = Card::kind_count();
        let size = territory_count + (territory_count % kinds) * kinds;
        let cards = Card::ALL.iter().copied().cycle().take(size).collect();
        Self { cards }
    }

    /// Number of cards remaining
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the deck has run out
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Draw a uniformly random card without replacement, or None if the
    /// deck is empty
    pub fn draw<R: Rng>(&mut self, rng: &mut R) -> Option<Card> {
        if self.cards.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.cards.len());
        Some(self.cards.swap_remove(index))
    }

    /// Count cards of one type still in the deck
    pub fn count_of(&self, kind: Card) -> usize {
        self.cards.iter().filter(|c| **c == kind).count()
    }
}
