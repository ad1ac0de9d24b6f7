//! The domain module encapsulates the sensing and spatial indexing core. It defines the geometry
//! primitives, the quadtree over entity bounding boxes, the sensor groups reading it and the
//! `World` tying them together with agents.
//!
//! Nothing in here depends on Bevy, so the core can be driven headless from tests or any other
//! simulation loop.

mod agent;
mod basis;
mod bounds;
mod debug_draw;
mod entity;
mod line;
mod pie_slice;
mod quadtree;
mod range_finder;
mod scenario;
mod sensor;
mod world;

pub use agent::{Agent, AgentConfig, Controller, ReactiveController, Steering};
pub use basis::{normalize_deg, Angle, Position, Velocity};
pub use bounds::{Aabb, Rect};
pub use debug_draw::{DebugRenderer, DrawLayer};
pub use entity::{Entities, Entity, EntityId, EntityKind};
pub use line::LineSegment;
pub use pie_slice::{PieSliceConfig, PieSliceSensor, PieSliceSensorGroup};
pub use quadtree::{
    NodeId, Occupants, Quadrant, QuadTree, QuadTreeConfig, QuadTreeStats, MAX_DEPTH,
    MAX_OCCUPANTS, MIN_OCCUPANTS,
};
pub use range_finder::{RangeFinder, RangeFinderConfig, RangeFinderGroup};
pub use scenario::{default_agent, generate, ScenarioConfig, ScenarioError};
pub use sensor::{DetectSet, SensorError, SensorOrigin, DEFAULT_VIEW_SIZE, INVALID_ACTIVATION};
pub use world::World;
