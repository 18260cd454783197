//! # Item Generation
//!
//! Loose item tables per depth band, and the one-off equipment found on fixed
//! floors.

use crate::game::{prototypes, Entity};
use crate::generation::{DepthBand, SpawnEntry, SpawnTable};

/// Loose items that can turn up in a room of the given band.
pub fn item_table(band: DepthBand) -> SpawnTable {
    match band {
        DepthBand::Surface => SpawnTable::new(vec![
            SpawnEntry::new("food ration", prototypes::food_ration, 6),
            SpawnEntry::new("lightning scroll", prototypes::lightning_scroll, 1),
        ]),
        DepthBand::Shallow => SpawnTable::new(vec![
            SpawnEntry::new("food ration", prototypes::food_ration, 6),
            SpawnEntry::new("fireball scroll", prototypes::fireball_scroll, 2),
            SpawnEntry::new("confusion scroll", prototypes::confusion_scroll, 1),
            SpawnEntry::new("lightning scroll", prototypes::lightning_scroll, 1),
            SpawnEntry::new("teleport scroll", prototypes::teleport_scroll, 1),
            SpawnEntry::new("throwing dagger", prototypes::throwing_dagger, 2),
        ]),
        DepthBand::Deep => SpawnTable::new(vec![
            SpawnEntry::new("food ration", prototypes::food_ration, 4),
            SpawnEntry::new("fireball scroll", prototypes::fireball_scroll, 2),
            SpawnEntry::new("confusion scroll", prototypes::confusion_scroll, 2),
            SpawnEntry::new("lightning scroll", prototypes::lightning_scroll, 2),
            SpawnEntry::new("freeze scroll", prototypes::freeze_scroll, 2),
            SpawnEntry::new("invisibility scroll", prototypes::invisibility_scroll, 1),
            SpawnEntry::new("teleport scroll", prototypes::teleport_scroll, 1),
            SpawnEntry::new("throwing dagger", prototypes::throwing_dagger, 2),
        ]),
    }
}

/// The piece of equipment waiting on `depth`, if that floor has one.
///
/// # Examples
///
/// ```
/// use undercrawl::equipment_for_depth;
///
/// assert_eq!(equipment_for_depth(-1).unwrap().name, "broken sword");
/// assert!(equipment_for_depth(0).is_none());
/// ```
pub fn equipment_for_depth(depth: i32) -> Option<Entity> {
    let factory: fn() -> Entity = match depth {
        -1 => prototypes::broken_sword,
        -2 => prototypes::worn_outfit,
        -3 => prototypes::wooden_staff,
        -4 => prototypes::amulet_of_vitality,
        -5 => prototypes::knights_blade,
        _ => return None,
    };
    Some(factory())
}
