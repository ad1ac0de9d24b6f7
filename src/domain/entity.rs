//! Entities placed in the world and the store that owns them.

use std::fmt;

use tracing::trace;

use super::{Aabb, Angle, Occupants, Position};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EntityId(usize);

impl EntityId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum EntityKind {
    #[default]
    Wall,
    Obstacle,
    Goal,
    Agent,
}

impl EntityKind {
    /// Kinds that block movement.
    pub fn is_solid(self) -> bool {
        matches!(self, EntityKind::Wall | EntityKind::Obstacle)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    kind: EntityKind,
    aabb: Aabb,
    moved: bool,
}

impl Entity {
    pub fn new(kind: EntityKind, aabb: Aabb) -> Self {
        Self {
            kind,
            aabb,
            moved: false,
        }
    }

    /// Thin box of the given `thickness` running from `start` to `end`.
    pub fn wall(start: Position, end: Position, thickness: f64) -> Self {
        let mut aabb = Aabb::new(start.distance(end), thickness);
        aabb.move_center_to(Position::new(
            (start.x() + end.x()) / 2.0,
            (start.y() + end.y()) / 2.0,
        ));
        aabb.rotate_by(start.heading_to(end));
        Self::new(EntityKind::Wall, aabb)
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn aabb(&self) -> &Aabb {
        &self.aabb
    }

    pub fn center(&self) -> Position {
        self.aabb.center()
    }

    pub fn moved(&self) -> bool {
        self.moved
    }
}

/// Owns every entity of a world. All mutations of an entity's box go through the store so the
/// moved flag read by the quadtree is always set.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Entities {
    entities: Vec<Entity>,
}

impl Entities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = EntityId(self.entities.len());
        trace!(%id, kind = ?entity.kind, "entity inserted");
        self.entities.push(entity);
        id
    }

    /// Id the next inserted entity will receive.
    pub fn next_id(&self) -> EntityId {
        EntityId(self.entities.len())
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(idx, entity)| (EntityId(idx), entity))
    }

    pub fn translate(&mut self, id: EntityId, dx: f64, dy: f64) {
        self.update(id, |aabb| aabb.translate(dx, dy));
    }

    pub fn rotate_by(&mut self, id: EntityId, delta: Angle) {
        self.update(id, |aabb| aabb.rotate_by(delta));
    }

    pub fn set_size(&mut self, id: EntityId, width: f64, height: f64) {
        self.update(id, |aabb| aabb.set_size(width, height));
    }

    pub fn replace_aabb(&mut self, id: EntityId, aabb: Aabb) {
        self.update(id, |current| *current = aabb);
    }

    fn update(&mut self, id: EntityId, mutate: impl FnOnce(&mut Aabb)) {
        if let Some(entity) = self.entities.get_mut(id.0) {
            mutate(&mut entity.aabb);
            entity.moved = true;
        }
    }

    /// Clears every moved flag. Called once per tick after the quadtree has been updated.
    pub fn settle(&mut self) {
        for entity in &mut self.entities {
            entity.moved = false;
        }
    }
}

impl Occupants for Entities {
    fn aabb(&self, id: EntityId) -> Option<&Aabb> {
        self.get(id).map(Entity::aabb)
    }

    fn moved(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(Entity::moved)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn test_wall_from_segment() {
        let wall = Entity::wall(Position::new(0.0, 0.0), Position::new(0.0, 10.0), 1.0);
        let rect = wall.aabb().bounds();
        assert_eq!(wall.kind(), EntityKind::Wall);
        assert_abs_diff_eq!(wall.center(), Position::new(0.0, 5.0), epsilon = EPSILON);
        assert_abs_diff_eq!(rect.left, -0.5, epsilon = EPSILON);
        assert_abs_diff_eq!(rect.right, 0.5, epsilon = EPSILON);
        assert_abs_diff_eq!(rect.bottom, 0.0, epsilon = EPSILON);
        assert_abs_diff_eq!(rect.top, 10.0, epsilon = EPSILON);
    }

    #[test]
    fn test_entities_moved_flag() {
        let mut entities = Entities::new();
        let id = entities.insert(Entity::new(EntityKind::Goal, Aabb::new(1.0, 1.0)));
        assert!(!entities.moved(id));

        entities.translate(id, 1.0, 0.0);
        assert!(entities.moved(id));
        assert_abs_diff_eq!(entities.get(id).unwrap().center().x(), 1.5);

        entities.settle();
        assert!(!entities.moved(id));

        entities.rotate_by(id, Angle::from_deg(10.0));
        assert!(entities.moved(id));
    }

    #[test]
    fn test_entities_unknown_id() {
        let mut entities = Entities::new();
        let unknown = EntityId::new(3);
        entities.translate(unknown, 1.0, 1.0);
        assert!(entities.get(unknown).is_none());
        assert!(entities.aabb(unknown).is_none());
        assert!(!entities.moved(unknown));
        assert!(entities.is_empty());
    }
}
