//! Dice-based battle resolution.
//!
//! An attack is resolved one exchange at a time: each side rolls its dice,
//! both sets are sorted descending and compared pairwise, and every
//! comparison costs the losing side one army. Ties go to the defender.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Most dice the attacker may roll in one exchange
pub const MAX_ATTACKER_DICE: u32 = 3;

/// Most dice the defender may roll in one exchange
pub const MAX_DEFENDER_DICE: u32 = 2;

/// Roll `count` six-sided dice, sorted descending
pub fn roll_dice<R: Rng>(rng: &mut R, count: u32) -> Vec<u8> {
    let mut rolls: Vec<u8> = std::iter::repeat_with(|| rng.gen_range(1..=6))
        .take(count as usize)
        .collect();
    rolls.sort_unstable_by_key(|&r| Reverse(r));
    rolls
}

/// The result of one attack exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// Attacker rolls, highest first
    pub attacker_rolls: Vec<u8>,
    /// Defender rolls, highest first
    pub defender_rolls: Vec<u8>,
    /// Armies the attacker loses
    pub attacker_losses: u32,
    /// Armies the defender loses
    pub defender_losses: u32,
}

/// Compare two descending-sorted roll sets pairwise up to the shorter
/// length. The higher roll wins each position; a tie counts as a defender
/// win.
pub fn resolve_battle(attacker_rolls: Vec<u8>, defender_rolls: Vec<u8>) -> BattleOutcome {
    let mut attacker_losses = 0;
    let mut defender_losses = 0;

    for (attack, defense) in attacker_rolls.iter().zip(defender_rolls.iter()) {
        if attack > defense {
            defender_losses += 1;
        } else {
            attacker_losses += 1;
        }
    }

    BattleOutcome {
        attacker_rolls,
        defender_rolls,
        attacker_losses,
        defender_losses,
    }
}

/// Roll for both sides and resolve the exchange
pub fn battle<R: Rng>(rng: &mut R, attacker_dice: u32, defender_dice: u32) -> BattleOutcome {
    let attacker_rolls = roll_dice(rng, attacker_dice);
    let defender_rolls = roll_dice(rng, defender_dice);
    resolve_battle(attacker_rolls, defender_rolls)
}
