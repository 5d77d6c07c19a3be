//! # Entities
//!
//! Game objects that stand on tiles: the player, enemies and items.
//!
//! The variant sets are closed and small, so they are modelled as tagged enums
//! and dispatched with `match` instead of trait objects.

use crate::config;
use crate::Position;
use serde::{Deserialize, Serialize};

/// A game object placed on the level grid.
///
/// Entities live in the level's arena keyed by [`crate::EntityId`]; the
/// occupancy grid only stores ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Display name
    pub name: String,
    /// Rendering symbol, also used by clients to classify cells
    pub glyph: char,
    /// Whether other actors are stopped by this entity
    pub blocks_movement: bool,
    /// Current grid position
    pub position: Position,
    /// Variant-specific data
    pub kind: EntityKind,
}

/// The two families of entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Actor(Actor),
    Item(Item),
}

/// A living entity with hit points and combat stats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub role: ActorRole,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
}

/// Who controls an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorRole {
    /// The single player-controlled fighter
    Player { gold: u32 },
    /// A hostile, AI-controlled fighter
    Enemy(EnemyKind),
}

/// Enemy archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Zombie,
    Vampire,
}

impl EnemyKind {
    pub fn name(self) -> &'static str {
        match self {
            EnemyKind::Zombie => "zombie",
            EnemyKind::Vampire => "vampire",
        }
    }

    pub fn glyph(self) -> char {
        match self {
            EnemyKind::Zombie => 'z',
            EnemyKind::Vampire => 'v',
        }
    }

    /// Base `(hp, attack, defense)`.
    pub fn stats(self) -> (i32, i32, i32) {
        match self {
            EnemyKind::Zombie => (
                config::ZOMBIE_HP,
                config::ZOMBIE_ATTACK,
                config::ZOMBIE_DEFENSE,
            ),
            EnemyKind::Vampire => (
                config::VAMPIRE_HP,
                config::VAMPIRE_ATTACK,
                config::VAMPIRE_DEFENSE,
            ),
        }
    }

    /// Gold the player earns for killing this enemy.
    pub fn gold_reward(self) -> u32 {
        match self {
            EnemyKind::Zombie => config::ZOMBIE_GOLD,
            EnemyKind::Vampire => config::VAMPIRE_GOLD,
        }
    }
}

/// Pick-up items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Item {
    /// Consumed on pickup
    Potion(Potion),
    /// Triggers a level transition; never consumed
    Exit,
}

/// Healing potion with optional permanent stat bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Potion {
    pub heal: i32,
    pub attack_bonus: i32,
    pub defense_bonus: i32,
}

impl Potion {
    /// Standard health potion.
    pub fn health() -> Self {
        Self {
            heal: config::POTION_HEAL,
            attack_bonus: 0,
            defense_bonus: 0,
        }
    }

    /// Heals up to `max_hp` and applies the flat bonuses.
    ///
    /// Returns the amount of hp actually restored.
    pub fn apply(&self, actor: &mut Actor) -> i32 {
        let restored = (actor.max_hp - actor.hp).min(self.heal).max(0);
        actor.hp += restored;
        actor.attack += self.attack_bonus;
        actor.defense += self.defense_bonus;
        restored
    }
}

/// Snapshot of the player's numbers, as exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub defense: i32,
    pub gold: u32,
}

impl Actor {
    /// Creates the player fighter with base stats.
    pub fn player() -> Self {
        Self {
            role: ActorRole::Player { gold: 0 },
            hp: config::PLAYER_HP,
            max_hp: config::PLAYER_HP,
            attack: config::PLAYER_ATTACK,
            defense: config::PLAYER_DEFENSE,
        }
    }

    /// Creates an enemy of the given kind with its base stats.
    pub fn enemy(kind: EnemyKind) -> Self {
        let (hp, attack, defense) = kind.stats();
        Self {
            role: ActorRole::Enemy(kind),
            hp,
            max_hp: hp,
            attack,
            defense,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self.role, ActorRole::Player { .. })
    }

    pub fn is_enemy(&self) -> bool {
        matches!(self.role, ActorRole::Enemy(_))
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0
    }

    /// Applies an incoming attack value, reduced by this actor's defense.
    ///
    /// Returns the damage actually dealt, which is never negative.
    pub fn take_hit(&mut self, attack: i32) -> i32 {
        let dealt = damage(attack, self.defense);
        self.hp -= dealt;
        dealt
    }

    /// Adds gold if this actor is the player.
    pub fn add_gold(&mut self, amount: u32) {
        if let ActorRole::Player { gold } = &mut self.role {
            *gold += amount;
        }
    }

    pub fn gold(&self) -> u32 {
        match self.role {
            ActorRole::Player { gold } => gold,
            ActorRole::Enemy(_) => 0,
        }
    }

    pub fn stats(&self) -> PlayerStats {
        PlayerStats {
            hp: self.hp,
            max_hp: self.max_hp,
            attack: self.attack,
            defense: self.defense,
            gold: self.gold(),
        }
    }
}

/// Damage dealt by an attack against a defense value.
///
/// # Examples
///
/// ```
/// use dungeon_sim::damage;
///
/// assert_eq!(damage(5, 1), 4);
/// assert_eq!(damage(3, 5), 0);
/// ```
pub fn damage(attack: i32, defense: i32) -> i32 {
    (attack - defense).max(0)
}

impl Entity {
    /// Creates the player entity at the given position.
    pub fn player(position: Position) -> Self {
        Self {
            name: "player".to_string(),
            glyph: '@',
            blocks_movement: true,
            position,
            kind: EntityKind::Actor(Actor::player()),
        }
    }

    /// Creates an enemy entity at the given position.
    pub fn enemy(kind: EnemyKind, position: Position) -> Self {
        Self {
            name: kind.name().to_string(),
            glyph: kind.glyph(),
            blocks_movement: true,
            position,
            kind: EntityKind::Actor(Actor::enemy(kind)),
        }
    }

    /// Creates a health potion at the given position.
    pub fn potion(position: Position) -> Self {
        Self {
            name: "health potion".to_string(),
            glyph: '+',
            blocks_movement: false,
            position,
            kind: EntityKind::Item(Item::Potion(Potion::health())),
        }
    }

    /// Creates a level exit at the given position.
    pub fn exit(position: Position) -> Self {
        Self {
            name: "exit".to_string(),
            glyph: '>',
            blocks_movement: false,
            position,
            kind: EntityKind::Item(Item::Exit),
        }
    }

    pub fn as_actor(&self) -> Option<&Actor> {
        match &self.kind {
            EntityKind::Actor(actor) => Some(actor),
            EntityKind::Item(_) => None,
        }
    }

    pub fn as_actor_mut(&mut self) -> Option<&mut Actor> {
        match &mut self.kind {
            EntityKind::Actor(actor) => Some(actor),
            EntityKind::Item(_) => None,
        }
    }

    pub fn as_item(&self) -> Option<&Item> {
        match &self.kind {
            EntityKind::Item(item) => Some(item),
            EntityKind::Actor(_) => None,
        }
    }

    pub fn is_actor(&self) -> bool {
        self.as_actor().is_some()
    }

    pub fn is_item(&self) -> bool {
        self.as_item().is_some()
    }

    pub fn is_player(&self) -> bool {
        self.as_actor().is_some_and(Actor::is_player)
    }

    pub fn is_enemy(&self) -> bool {
        self.as_actor().is_some_and(Actor::is_enemy)
    }

    pub fn is_exit(&self) -> bool {
        matches!(self.kind, EntityKind::Item(Item::Exit))
    }

    pub fn is_potion(&self) -> bool {
        matches!(self.kind, EntityKind::Item(Item::Potion(_)))
    }
}
