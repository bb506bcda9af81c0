#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure difficulty model deriving a sector's challenge from its grid position.
//!
//! Difficulty grows with the Euclidean distance of a sector's bottom-left cell
//! from the grid origin. The difficulty number selects the session tier, the
//! items the player starts with, and the ores seeded into generated terrain.

use sector_atlas_core::{DifficultyTier, ItemKind, ItemStack};

/// Difficulty of the sector anchored at `(x, y)`: the floored distance from the origin.
#[must_use]
pub fn difficulty_of(x: i32, y: i32) -> u32 {
    let distance = f64::from(x).hypot(f64::from(y));
    distance.floor() as u32
}

/// Session tier applied to a sector of the provided difficulty.
///
/// The origin sector hosts the tutorial and plays on the hard tier.
#[must_use]
pub const fn tier_for(difficulty: u32) -> DifficultyTier {
    match difficulty {
        0 => DifficultyTier::Hard,
        1..=3 => DifficultyTier::Normal,
        4..=8 => DifficultyTier::Hard,
        _ => DifficultyTier::Insane,
    }
}

/// Items the player starts with on a sector of the provided difficulty.
#[must_use]
pub fn starting_items(difficulty: u32) -> Vec<ItemStack> {
    use ItemKind::{Copper, DenseAlloy, Lead, Silicon, Titanium};

    let stacks: &[(ItemKind, u32)] = if difficulty > 12 {
        &[
            (Copper, 1900),
            (Lead, 500),
            (DenseAlloy, 470),
            (Silicon, 460),
            (Titanium, 230),
        ]
    } else if difficulty > 8 {
        &[(Copper, 1500), (Lead, 400), (DenseAlloy, 340), (Silicon, 250)]
    } else if difficulty > 5 {
        &[(Copper, 950), (Lead, 300), (DenseAlloy, 190), (Silicon, 140)]
    } else if difficulty > 3 {
        &[(Copper, 700), (Lead, 200), (DenseAlloy, 130)]
    } else if difficulty > 1 {
        &[(Copper, 400), (Lead, 100)]
    } else {
        &[]
    };

    stacks
        .iter()
        .map(|(item, amount)| ItemStack::new(*item, *amount))
        .collect()
}

/// Ores seeded into terrain generated for the sector cell at `(x, y)`.
#[must_use]
pub fn ores_for(x: i32, y: i32) -> Vec<ItemKind> {
    match (x, y) {
        (1, 0) => vec![ItemKind::Copper, ItemKind::Lead, ItemKind::Coal],
        _ => vec![ItemKind::Copper],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_floors_euclidean_distance() {
        assert_eq!(difficulty_of(0, 0), 0);
        assert_eq!(difficulty_of(1, 1), 1);
        assert_eq!(difficulty_of(-3, 4), 5);
        assert_eq!(difficulty_of(2, -2), 2);
        assert_eq!(difficulty_of(-9, 0), 9);
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(tier_for(0), DifficultyTier::Hard);
        assert_eq!(tier_for(1), DifficultyTier::Normal);
        assert_eq!(tier_for(3), DifficultyTier::Normal);
        assert_eq!(tier_for(4), DifficultyTier::Hard);
        assert_eq!(tier_for(8), DifficultyTier::Hard);
        assert_eq!(tier_for(9), DifficultyTier::Insane);
        assert_eq!(tier_for(u32::MAX), DifficultyTier::Insane);
    }

    fn amount_of(stacks: &[ItemStack], item: ItemKind) -> Option<u32> {
        stacks
            .iter()
            .find(|stack| stack.item == item)
            .map(|stack| stack.amount)
    }

    #[test]
    fn titanium_only_above_twelve() {
        let thirteen = starting_items(13);
        assert_eq!(amount_of(&thirteen, ItemKind::Titanium), Some(230));
        assert_eq!(amount_of(&thirteen, ItemKind::Copper), Some(1900));

        let twelve = starting_items(12);
        assert_eq!(amount_of(&twelve, ItemKind::Titanium), None);
        assert_eq!(amount_of(&twelve, ItemKind::Silicon), Some(250));
    }

    #[test]
    fn low_difficulties_start_small() {
        assert!(starting_items(0).is_empty());
        assert!(starting_items(1).is_empty());
        assert_eq!(
            starting_items(2),
            vec![
                ItemStack::new(ItemKind::Copper, 400),
                ItemStack::new(ItemKind::Lead, 100)
            ]
        );
    }

    #[test]
    fn middle_thresholds_pick_first_match() {
        assert_eq!(amount_of(&starting_items(4), ItemKind::DenseAlloy), Some(130));
        assert_eq!(amount_of(&starting_items(6), ItemKind::Silicon), Some(140));
        assert_eq!(amount_of(&starting_items(9), ItemKind::Copper), Some(1500));
    }

    #[test]
    fn ores_vary_near_origin() {
        assert_eq!(ores_for(0, 0), vec![ItemKind::Copper]);
        assert_eq!(
            ores_for(1, 0),
            vec![ItemKind::Copper, ItemKind::Lead, ItemKind::Coal]
        );
        assert_eq!(ores_for(-5, 7), vec![ItemKind::Copper]);
    }
}
