//! Shared vocabulary of the sensor groups.

use std::collections::BTreeSet;

use thiserror::Error;

use super::{Aabb, Angle, Entity, EntityId, EntityKind, Position};

/// Activation reported for a sensor index that does not exist.
pub const INVALID_ACTIVATION: f64 = -1.0;

/// Edge length of the square query window placed around an agent before exact sensing.
pub const DEFAULT_VIEW_SIZE: f64 = 400.0;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    #[error("angular width {0} outside [0, 360]")]
    InvalidAngularWidth(f64),
    #[error("invalid radius band [{inner}, {outer}]")]
    InvalidRadius { inner: f64, outer: f64 },
    #[error("invalid sensor length {0}")]
    InvalidLength(f64),
    #[error("invalid view size {0}")]
    InvalidViewSize(f64),
    #[error("invalid sensor index {0}")]
    InvalidSensorIndex(usize),
}

/// Entity kinds a sensor responds to.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DetectSet(BTreeSet<EntityKind>);

impl DetectSet {
    pub fn new(kinds: impl IntoIterator<Item = EntityKind>) -> Self {
        Self(kinds.into_iter().collect())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.0.contains(&kind)
    }

    pub fn insert(&mut self, kind: EntityKind) {
        self.0.insert(kind);
    }

    pub fn remove(&mut self, kind: EntityKind) {
        self.0.remove(&kind);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<EntityKind> for DetectSet {
    fn from_iter<T: IntoIterator<Item = EntityKind>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// Where a sensor group sits and which way it faces this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SensorOrigin {
    /// The sensing entity itself, never reported to its own sensors.
    pub entity: Option<EntityId>,
    pub center: Position,
    pub heading: Angle,
}

impl SensorOrigin {
    pub fn new(center: Position, heading: Angle) -> Self {
        Self {
            entity: None,
            center,
            heading,
        }
    }

    pub fn of(id: EntityId, entity: &Entity) -> Self {
        Self {
            entity: Some(id),
            center: entity.center(),
            heading: entity.aabb().angle(),
        }
    }

    /// Square query window of edge `size` centered on the origin.
    pub fn view_bounds(&self, size: f64) -> Aabb {
        Aabb::centered_on(self.center, size, size)
    }

    pub fn is_self(&self, id: EntityId) -> bool {
        self.entity == Some(id)
    }
}

pub(crate) fn validate_view_size(size: f64) -> Result<(), SensorError> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(SensorError::InvalidViewSize(size))
    }
}
