//! # Prototypes
//!
//! Constructors for every kind of actor, item and prop. Each call returns a
//! fresh, unplaced [`Entity`]; [`crate::EntityArena::spawn`] gives it an id.

use crate::config::PLAYER_INVENTORY_CAPACITY;
use crate::game::{
    Actor, ActorType, Ai, Color, Dialogue, DialogueLine, DialogueTrigger, Entity, EntityKind, EquipSlot, Fighter,
    Interactable, Item, ItemType, Prop, StatBonus,
};

/// Species name of the player entity.
pub const PLAYER_NAME: &str = "Player";

fn actor_entity(name: &str, glyph: char, fg: Color, actor: Actor) -> Entity {
    Entity::new(name, glyph, fg, EntityKind::Actor(Box::new(actor)))
}

fn hostile(mut actor: Actor) -> Actor {
    actor.turn_hostile();
    actor
}

fn with_interactables(mut actor: Actor, interactables: Vec<Interactable>) -> Actor {
    actor.interactables = interactables;
    actor
}

pub fn player() -> Entity {
    let mut actor = Actor::new(
        Fighter::new(25, 0, 1, 1),
        PLAYER_INVENTORY_CAPACITY,
        ActorType::Player,
        Ai::Idle,
        Ai::Idle,
    );
    actor.ai = None;
    actor_entity(PLAYER_NAME, '@', Color::WHITE, actor)
        .with_description("This is you")
        .with_icon("player")
}

pub fn old_man() -> Entity {
    let mut actor = with_interactables(
        Actor::new(Fighter::new(999, 0, 1, 10), 1, ActorType::Npc, Ai::Idle, Ai::hostile_chase()),
        vec![
            Interactable::Talk,
            Interactable::Assault {
                cry: "What are you doing?!".to_string(),
            },
        ],
    );
    actor.dialogue = Some(Dialogue::new(vec![
        DialogueLine::new("I should warn you, if you wander this lost city you will become lost yourself."),
        DialogueLine::new("If you must wander then at least let me give you this.")
            .with_trigger(DialogueTrigger::DropGift),
        DialogueLine::new("I hope you succeed in your endeavors. Be wary of the stairs."),
    ]));
    actor_entity("ragged old man", '☻', Color(0, 0, 120), actor)
        .with_description("Long beard, covered eyes and midnight blue robes. Maybe he can help.")
        .with_icon("old_man")
}

pub fn lost_warrior() -> Entity {
    let actor = hostile(Actor::new(
        Fighter::new(5, 1, 2, 0),
        2,
        ActorType::Monster,
        Ai::random_gait(5),
        Ai::hostile_chase(),
    ));
    actor_entity("lost warrior", 'w', Color::BONE, actor)
        .with_description("Shadow of a former soldier, driven mad by never-ending wander")
        .with_icon("lost_warrior")
}

pub fn walking_skull() -> Entity {
    let mut actor = with_interactables(
        Actor::new(Fighter::new(2, 0, 1, 0), 0, ActorType::Monster, Ai::random_gait(3), Ai::hostile_chase()),
        vec![Interactable::Assault {
            cry: "Shrieeek!".to_string(),
        }],
    );
    actor.blood = Color(120, 116, 116);
    actor_entity("walking skull", 'i', Color::BONE, actor)
        .with_description("Eerie skull walking on two legs. Harmless if left alone")
        .with_icon("skull")
}

pub fn rat() -> Entity {
    let actor = with_interactables(
        Actor::new(Fighter::new(1, 0, 1, 0), 0, ActorType::Critter, Ai::curious_critter(5), Ai::hostile_chase()),
        vec![
            Interactable::Taunt {
                cry: "= ò · ó =".to_string(),
            },
            Interactable::Pet {
                cry: "= ^ · ^ =".to_string(),
            },
        ],
    );
    actor_entity("rat", 'r', Color(100, 100, 100), actor)
        .with_description("A small mammal looking for food")
        .with_icon("rat")
}

pub fn shroom() -> Entity {
    let mut actor = with_interactables(
        Actor::new(Fighter::new(3, 0, 0, 0), 0, ActorType::Critter, Ai::Idle, Ai::Idle),
        vec![Interactable::Bite],
    );
    actor.blood = Color(200, 200, 170);
    actor_entity("shroom", '♣', Color::PURPLE, actor)
        .with_description("A plump cave mushroom. It smells strangely inviting")
        .with_icon("shroom")
}

pub fn wizzo() -> Entity {
    let actor = with_interactables(
        Actor::new(
            Fighter::new(6, 0, 1, 3),
            1,
            ActorType::Monster,
            Ai::Fleeing,
            Ai::RangedCaster {
                range: 4,
                hit_chance: 60,
            },
        ),
        vec![
            Interactable::Scare { turns: 4 },
            Interactable::Assault {
                cry: "Zap you! Zap you all!".to_string(),
            },
        ],
    );
    actor_entity("wizzo", 'z', Color::BLUE, actor)
        .with_description("A jittery little sorcerer who would rather not be seen")
        .with_icon("wizzo")
}

pub fn hungry() -> Entity {
    let actor = with_interactables(
        Actor::new(
            Fighter::new(8, 0, 2, 0),
            0,
            ActorType::Monster,
            Ai::Scavenger { target: None },
            Ai::hostile_chase(),
        ),
        vec![Interactable::Feed { turns: 6, heal: 3 }],
    );
    actor_entity("hungry", 'h', Color::BROWN, actor)
        .with_description("A gaunt creature that eats whatever falls in these tunnels")
        .with_icon("hungry")
}

pub fn microfrog() -> Entity {
    let mut actor = Actor::new(
        Fighter::new(4, 0, 1, 0),
        0,
        ActorType::Player,
        Ai::follower(None, 2),
        Ai::hostile_chase(),
    );
    actor.companion = true;
    actor_entity("microfrog", 'f', Color::GREEN, actor)
        .with_description("A tiny red frog. It seems to think you are its mother")
        .with_icon("microfrog")
}

pub fn cave_orc() -> Entity {
    let actor = hostile(Actor::new(
        Fighter::new(10, 0, 3, 0),
        0,
        ActorType::Monster,
        Ai::hostile_chase(),
        Ai::hostile_chase(),
    ));
    actor_entity("cave orc", 'o', Color(63, 127, 63), actor)
        .with_description("A foul beast from the deepest caves, frenzied in the search for meat and blood")
        .with_icon("orc")
}

pub fn troll() -> Entity {
    let actor = hostile(Actor::new(
        Fighter::new(16, 1, 4, 0),
        0,
        ActorType::Monster,
        Ai::hostile_chase(),
        Ai::hostile_chase(),
    ));
    actor_entity("troll", 'T', Color(0, 127, 0), actor)
        .with_description("Thick hide, thicker skull")
        .with_icon("troll")
}

fn item_entity(name: &str, glyph: char, fg: Color, item: Item) -> Entity {
    Entity::new(name, glyph, fg, EntityKind::Item(item))
}

fn scroll(name: &str, fg: Color, effect: Interactable) -> Entity {
    item_entity(name, '~', fg, Item::new(ItemType::Scroll, vec![effect])).with_icon("scroll")
}

pub fn food_ration() -> Entity {
    item_entity(
        "food ration",
        '%',
        Color(153, 0, 0),
        Item::new(ItemType::Food, vec![Interactable::Eat { amount: 4 }]),
    )
    .with_description("Heals you a certain amount")
    .with_icon("meat")
}

pub fn lightning_scroll() -> Entity {
    scroll(
        "lightning scroll",
        Color::YELLOW,
        Interactable::Lightning { damage: 20, range: 5 },
    )
}

pub fn confusion_scroll() -> Entity {
    scroll(
        "confusion scroll",
        Color(207, 63, 255),
        Interactable::Confusion { turns: 10, radius: 2 },
    )
}

pub fn fireball_scroll() -> Entity {
    scroll(
        "fireball scroll",
        Color::RED,
        Interactable::Fireball { damage: 12, radius: 3 },
    )
}

pub fn freeze_scroll() -> Entity {
    scroll("freeze scroll", Color::ICE, Interactable::Freeze { turns: 8 })
}

pub fn teleport_scroll() -> Entity {
    scroll("teleport scroll", Color(0, 200, 200), Interactable::Teleport)
}

pub fn invisibility_scroll() -> Entity {
    scroll(
        "invisibility scroll",
        Color(220, 220, 255),
        Interactable::Invisibility { turns: 10 },
    )
}

pub fn throwing_dagger() -> Entity {
    item_entity(
        "throwing dagger",
        ')',
        Color::GRAY,
        Item::new(ItemType::Throwable, vec![Interactable::Throw { damage: 3 }]),
    )
    .with_description("Balanced for throwing. You can pick it up again afterwards")
    .with_icon("dagger")
}

pub fn mystery_egg() -> Entity {
    item_entity(
        "mysterious egg",
        'o',
        Color(240, 0, 0),
        Item::new(ItemType::Egg, vec![Interactable::Hatch]),
    )
    .with_description("Red egg emanating a strange power")
    .with_icon("red_egg")
}

pub fn rusty_key() -> Entity {
    item_entity("rusty key", '-', Color::BROWN, Item::new(ItemType::Key, Vec::new()))
        .with_description("Heavy and old. It must open something important")
        .with_icon("key")
}

fn equipment(name: &str, glyph: char, fg: Color, slot: EquipSlot, bonus: StatBonus, description: &str) -> Entity {
    item_entity(name, glyph, fg, Item::equipment(slot, bonus)).with_description(description)
}

pub fn broken_sword() -> Entity {
    equipment(
        "broken sword",
        '/',
        Color::GRAY,
        EquipSlot::Weapon,
        StatBonus::power(1),
        "Dull sword missing its tip.",
    )
}

pub fn worn_outfit() -> Entity {
    equipment(
        "worn outfit",
        '[',
        Color::GRAY,
        EquipSlot::Armor,
        StatBonus::defense(1),
        "It has some holes but it covers you mostly.",
    )
}

pub fn wooden_staff() -> Entity {
    equipment(
        "wooden staff",
        '⌠',
        Color::GRAY,
        EquipSlot::Staff,
        StatBonus::magic(1),
        "A simple wooden staff",
    )
}

pub fn amulet_of_vitality() -> Entity {
    equipment(
        "amulet of vitality",
        'δ',
        Color::WHITE,
        EquipSlot::Amulet,
        StatBonus::hp(5),
        "You can feel yourself healthier",
    )
}

pub fn knights_blade() -> Entity {
    equipment(
        "knight's blade",
        '/',
        Color::WHITE,
        EquipSlot::Weapon,
        StatBonus::power(3),
        "Still sharp after all these years.",
    )
}

fn prop_entity(name: &str, glyph: char, interactables: Vec<Interactable>) -> Entity {
    Entity::new(name, glyph, Color(0, 0, 100), EntityKind::Prop(Prop::new(interactables)))
}

pub fn down_staircase() -> Entity {
    prop_entity("staircase", '▼', vec![Interactable::Descend])
        .with_description("It goes down")
        .with_icon("downstairs")
}

pub fn up_staircase() -> Entity {
    prop_entity("staircase", '▲', vec![Interactable::Ascend])
        .with_description("It goes up")
        .with_icon("upstairs")
}

pub fn sealed_gate() -> Entity {
    let mut gate = prop_entity("sealed gate", '∏', vec![Interactable::Open])
        .with_description("A massive iron gate. Daylight leaks through the cracks")
        .with_icon("gate");
    gate.blocks_movement = true;
    gate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::RenderOrder;

    #[test]
    fn test_player_has_no_ai() {
        let player = player();
        let actor = player.actor().unwrap();
        assert!(actor.ai.is_none());
        assert_eq!(actor.fighter.power(), 1);
        assert_eq!(actor.inventory.capacity, PLAYER_INVENTORY_CAPACITY);
    }

    #[test]
    fn test_monsters_start_hostile() {
        for entity in [cave_orc(), troll(), lost_warrior()] {
            let actor = entity.actor().unwrap();
            assert!(actor.hostile, "{} should start hostile", entity.name);
            assert!(matches!(actor.ai, Some(Ai::HostileChase { .. })));
        }
        for entity in [rat(), walking_skull(), hungry(), wizzo(), shroom(), old_man()] {
            assert!(!entity.actor().unwrap().hostile, "{} should start calm", entity.name);
        }
    }

    #[test]
    fn test_kinds_get_render_order() {
        assert_eq!(rat().render_order, RenderOrder::Actor);
        assert_eq!(food_ration().render_order, RenderOrder::Item);
        assert_eq!(down_staircase().render_order, RenderOrder::Prop);
        assert!(sealed_gate().blocks_movement);
        assert!(!down_staircase().blocks_movement);
    }
}
