//! # Actions
//!
//! Resolution of a single bump into Movement, Attack or Take.
//!
//! Every action mutates the level only through its crate-private mutation
//! API and reports what happened as a list of [`GameEvent`]s.

use crate::{
    Actor, ActorRole, Cell, DungeonError, DungeonResult, Entity, EntityId, Item, Level, Position,
    Tile,
};
use log::debug;
use serde::{Deserialize, Serialize};

/// Something that can be performed against a level.
pub trait Action {
    /// The entity performing the action.
    fn actor(&self) -> EntityId;

    /// Which of the three bump outcomes this is.
    fn kind(&self) -> ActionKind;

    /// Applies the action and returns the resulting events.
    ///
    /// A blocked action is not an error; it returns no events.
    fn perform(&self, level: &mut Level) -> DungeonResult<Vec<GameEvent>>;
}

/// The three ways a bump can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Movement,
    Attack,
    Take,
}

/// What stood in the destination cell before the action resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Occupant {
    Terrain(Tile),
    Entity(Entity),
}

impl Occupant {
    /// Snapshot of the destination cell at `pos`.
    pub fn at(level: &Level, pos: Position) -> Option<Occupant> {
        match level.cell(pos)? {
            Cell::Terrain(tile) => Some(Occupant::Terrain(*tile)),
            Cell::Occupant(id) => level.entity(*id).cloned().map(Occupant::Entity),
        }
    }

    pub fn glyph(&self) -> char {
        match self {
            Occupant::Terrain(tile) => tile.glyph(),
            Occupant::Entity(entity) => entity.glyph,
        }
    }

    pub fn as_entity(&self) -> Option<&Entity> {
        match self {
            Occupant::Entity(entity) => Some(entity),
            Occupant::Terrain(_) => None,
        }
    }

    pub fn is_exit(&self) -> bool {
        self.as_entity().is_some_and(Entity::is_exit)
    }
}

/// Things that happen while actions resolve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    EntityMoved {
        entity_id: EntityId,
        from: Position,
        to: Position,
    },
    EntityAttacked {
        attacker: EntityId,
        defender: EntityId,
        damage: i32,
        by_player: bool,
    },
    EntityDied {
        entity_id: EntityId,
        name: String,
        position: Position,
        is_player: bool,
        killed_by_player: bool,
    },
    GoldEarned {
        entity_id: EntityId,
        amount: u32,
    },
    ItemPickedUp {
        entity_id: EntityId,
        item: Item,
        position: Position,
    },
    EntityHealed {
        entity_id: EntityId,
        amount: i32,
    },
    LevelChanged {
        depth: u32,
    },
}

/// Step an actor into an adjacent cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementAction {
    pub actor: EntityId,
    pub to: Position,
}

impl Action for MovementAction {
    fn actor(&self) -> EntityId {
        self.actor
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Movement
    }

    fn perform(&self, level: &mut Level) -> DungeonResult<Vec<GameEvent>> {
        // Occupied cells are never entered by plain movement: only items can
        // be there without blocking, and those are reserved for the player.
        if level.blocks_movement_at(self.to) || level.occupant_id(self.to).is_some() {
            return Ok(Vec::new());
        }

        let from = entity_position(level, self.actor)?;
        level.move_entity(self.actor, self.to)?;
        Ok(vec![GameEvent::EntityMoved {
            entity_id: self.actor,
            from,
            to: self.to,
        }])
    }
}

/// Strike the actor standing next to the attacker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackAction {
    pub attacker: EntityId,
    pub defender: EntityId,
}

impl Action for AttackAction {
    fn actor(&self) -> EntityId {
        self.attacker
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Attack
    }

    fn perform(&self, level: &mut Level) -> DungeonResult<Vec<GameEvent>> {
        let (attack, by_player) = {
            let attacker = actor_of(level, self.attacker)?;
            (attacker.attack, attacker.is_player())
        };

        let defender = level
            .entity_mut(self.defender)
            .ok_or_else(|| missing(self.defender))?;
        let position = defender.position;
        let name = defender.name.clone();
        let actor = defender
            .as_actor_mut()
            .ok_or_else(|| DungeonError::InvalidAction(format!("{} cannot be attacked", name)))?;
        let damage = actor.take_hit(attack);
        let died = actor.is_dead();
        let is_player = actor.is_player();
        let reward = match actor.role {
            ActorRole::Enemy(kind) => kind.gold_reward(),
            ActorRole::Player { .. } => 0,
        };

        debug!(
            "{} hits {} {} for {} (hp now {})",
            self.attacker, name, self.defender, damage, actor.hp
        );

        let mut events = vec![GameEvent::EntityAttacked {
            attacker: self.attacker,
            defender: self.defender,
            damage,
            by_player,
        }];

        if !died {
            return Ok(events);
        }

        events.push(GameEvent::EntityDied {
            entity_id: self.defender,
            name,
            position,
            is_player,
            killed_by_player: by_player,
        });

        // A dead player stays in place; the engine reports the terminal state.
        if is_player {
            return Ok(events);
        }

        level.remove_entity(self.defender);
        level.set_terrain_everywhere(position, Tile::corpse())?;

        if by_player {
            if let Some(attacker) = level.entity_mut(self.attacker).and_then(Entity::as_actor_mut) {
                attacker.add_gold(reward);
            }
            events.push(GameEvent::GoldEarned {
                entity_id: self.attacker,
                amount: reward,
            });
        }

        Ok(events)
    }
}

/// Pick up the item next to the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TakeAction {
    pub taker: EntityId,
    pub item: EntityId,
}

impl Action for TakeAction {
    fn actor(&self) -> EntityId {
        self.taker
    }

    fn kind(&self) -> ActionKind {
        ActionKind::Take
    }

    fn perform(&self, level: &mut Level) -> DungeonResult<Vec<GameEvent>> {
        let entity = level.entity(self.item).ok_or_else(|| missing(self.item))?;
        let position = entity.position;
        let item = entity
            .as_item()
            .cloned()
            .ok_or_else(|| DungeonError::InvalidAction(format!("{} is not an item", entity.name)))?;

        level.set_terrain_everywhere(position, Tile::floor())?;

        let mut events = vec![GameEvent::ItemPickedUp {
            entity_id: self.taker,
            item: item.clone(),
            position,
        }];

        match item {
            Item::Potion(potion) => {
                level.remove_entity(self.item);
                let taker = level
                    .entity_mut(self.taker)
                    .and_then(Entity::as_actor_mut)
                    .ok_or_else(|| missing(self.taker))?;
                let amount = potion.apply(taker);
                debug!("{} drinks a potion and recovers {} hp", self.taker, amount);
                events.push(GameEvent::EntityHealed {
                    entity_id: self.taker,
                    amount,
                });
            }
            // The transition itself is the engine's job; the exit stays in the
            // arena until the level is replaced.
            Item::Exit => debug!("{} reached the exit at {}", self.taker, position),
        }

        Ok(events)
    }
}

/// Any one of the three concrete actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConcreteAction {
    Movement(MovementAction),
    Attack(AttackAction),
    Take(TakeAction),
}

impl ConcreteAction {
    /// Decides what a bump from `start` by `delta` means.
    ///
    /// Returns `None` for a no-op: a zero delta, no actor at `start`, a
    /// destination outside the grid, or one enemy bumping another. The
    /// returned [`Occupant`] is the destination as it was before resolution.
    ///
    /// # Examples
    ///
    /// ```
    /// use dungeon_sim::{ConcreteAction, Level, Position};
    ///
    /// let level = Level::new(5, 5);
    /// // Nobody stands at (2, 2), so nothing happens.
    /// assert!(ConcreteAction::from_bump(&level, Position::new(2, 2), Position::new(1, 0)).is_none());
    /// ```
    pub fn from_bump(
        level: &Level,
        start: Position,
        delta: Position,
    ) -> Option<(ConcreteAction, Occupant)> {
        if delta == Position::origin() {
            return None;
        }

        let mover_id = level.occupant_id(start)?;
        let mover = level.entity(mover_id)?.as_actor()?;
        let to = start + delta;
        let occupant = Occupant::at(level, to)?;

        let action = match occupant.as_entity().zip(level.occupant_id(to)) {
            Some((target, _)) if mover.is_enemy() && target.is_enemy() => return None,
            Some((target, target_id)) if target.is_actor() => ConcreteAction::Attack(AttackAction {
                attacker: mover_id,
                defender: target_id,
            }),
            Some((target, target_id)) if target.is_item() && mover.is_player() => {
                ConcreteAction::Take(TakeAction {
                    taker: mover_id,
                    item: target_id,
                })
            }
            _ => ConcreteAction::Movement(MovementAction { actor: mover_id, to }),
        };

        Some((action, occupant))
    }
}

impl Action for ConcreteAction {
    fn actor(&self) -> EntityId {
        match self {
            ConcreteAction::Movement(action) => action.actor(),
            ConcreteAction::Attack(action) => action.actor(),
            ConcreteAction::Take(action) => action.actor(),
        }
    }

    fn kind(&self) -> ActionKind {
        match self {
            ConcreteAction::Movement(action) => action.kind(),
            ConcreteAction::Attack(action) => action.kind(),
            ConcreteAction::Take(action) => action.kind(),
        }
    }

    fn perform(&self, level: &mut Level) -> DungeonResult<Vec<GameEvent>> {
        match self {
            ConcreteAction::Movement(action) => action.perform(level),
            ConcreteAction::Attack(action) => action.perform(level),
            ConcreteAction::Take(action) => action.perform(level),
        }
    }
}

fn missing(id: EntityId) -> DungeonError {
    DungeonError::InvalidState(format!("Entity {} not found", id))
}

fn entity_position(level: &Level, id: EntityId) -> DungeonResult<Position> {
    level
        .entity(id)
        .map(|entity| entity.position)
        .ok_or_else(|| missing(id))
}

fn actor_of(level: &Level, id: EntityId) -> DungeonResult<&Actor> {
    let entity = level.entity(id).ok_or_else(|| missing(id))?;
    entity
        .as_actor()
        .ok_or_else(|| DungeonError::InvalidAction(format!("{} cannot act", entity.name)))
}
