//! Sensor-equipped agent moving through the world, and the controllers steering it.
//!
//! The agent is an entity whose box turns with its heading. Each tick a controller turns the
//! current sensor activations into a [`Steering`] command. The resulting move is only committed if
//! the agent's rotated box stays clear of every solid entity.

use std::time::Duration;

use tracing::debug;

use super::{
    Aabb, Angle, DebugRenderer, DrawLayer, Entities, Entity, EntityId, PieSliceConfig,
    PieSliceSensorGroup, QuadTree, RangeFinderConfig, RangeFinderGroup, SensorError,
    SensorOrigin, Velocity,
};

#[derive(Clone, Debug, PartialEq)]
pub struct AgentConfig {
    pub width: f64,
    pub height: f64,
    /// Distance covered per second at full throttle.
    pub max_speed: Velocity,
    /// Rotation per second at full turn.
    pub max_turn_rate: Angle,
    pub range_finders: RangeFinderConfig,
    pub pie_slices: Vec<PieSliceConfig>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 12.0,
            max_speed: Velocity::new(60.0),
            max_turn_rate: Angle::from_deg(120.0),
            range_finders: RangeFinderConfig::default(),
            pie_slices: vec![],
        }
    }
}

/// Normalized command, both components within `[-1, 1]`. A positive `turn` rotates
/// counter-clockwise, a positive `throttle` drives forward.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Steering {
    pub turn: f64,
    pub throttle: f64,
}

impl Steering {
    pub fn new(turn: f64, throttle: f64) -> Self {
        Self { turn, throttle }
    }

    fn clamped(self) -> Self {
        let clamp = |v: f64| if v.is_finite() { v.clamp(-1.0, 1.0) } else { 0.0 };
        Self::new(clamp(self.turn), clamp(self.throttle))
    }

    fn is_idle(&self) -> bool {
        self.turn == 0.0 && self.throttle == 0.0
    }
}

/// Consumes the activations of one agent (range finders first, then pie slices) and decides how
/// to steer.
pub trait Controller {
    fn steer(&mut self, activations: &[f64]) -> Steering;
}

/// Turns away from whichever side of the range finder fan responds stronger and slows down when
/// the center ray sees something close.
#[derive(Clone, Debug, PartialEq)]
pub struct ReactiveController {
    rays: usize,
    cruise: f64,
}

impl ReactiveController {
    /// `rays` is the number of range finders at the front of the activation slice. They are
    /// expected to sweep counter-clockwise, i.e. from the right side to the left side.
    pub fn new(rays: usize, cruise: f64) -> Self {
        Self { rays, cruise }
    }
}

impl Default for ReactiveController {
    fn default() -> Self {
        Self::new(RangeFinderConfig::default().count, 1.0)
    }
}

impl Controller for ReactiveController {
    fn steer(&mut self, activations: &[f64]) -> Steering {
        let rays = &activations[..self.rays.min(activations.len())];
        if rays.is_empty() {
            return Steering::new(0.0, self.cruise);
        }
        let valid = |a: &f64| a.max(0.0);
        let half = rays.len() / 2;
        let right: f64 = rays[..half].iter().map(valid).sum();
        let left: f64 = rays[rays.len() - half..].iter().map(valid).sum();
        let front = if rays.len() % 2 == 1 {
            valid(&rays[half])
        } else {
            0.0
        };

        let mut turn = right - left;
        if front > 0.5 && turn.abs() < 0.1 {
            turn = 1.0;
        }
        Steering::new(turn, self.cruise * (1.0 - front)).clamped()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    entity: EntityId,
    config: AgentConfig,
    range_finders: RangeFinderGroup,
    pie_slices: PieSliceSensorGroup,
    collisions: usize,
}

impl Agent {
    pub fn new(entity: EntityId, config: AgentConfig) -> Result<Self, SensorError> {
        let range_finders = RangeFinderGroup::from_config(&config.range_finders)?;
        let mut pie_slices = PieSliceSensorGroup::from_configs(config.pie_slices.iter().cloned())?;
        pie_slices.set_view_size(config.range_finders.view_size)?;
        Ok(Self {
            entity,
            config,
            range_finders,
            pie_slices,
            collisions: 0,
        })
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn range_finders(&self) -> &RangeFinderGroup {
        &self.range_finders
    }

    pub fn range_finders_mut(&mut self) -> &mut RangeFinderGroup {
        &mut self.range_finders
    }

    pub fn pie_slices(&self) -> &PieSliceSensorGroup {
        &self.pie_slices
    }

    pub fn pie_slices_mut(&mut self) -> &mut PieSliceSensorGroup {
        &mut self.pie_slices
    }

    /// Number of moves rejected because they would have overlapped a solid entity.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Range finder activations followed by pie slice activations.
    pub fn activations(&self) -> Vec<f64> {
        self.range_finders
            .activations()
            .chain(self.pie_slices.activations())
            .collect()
    }

    /// Box the agent would occupy after applying `steering` for `dt`.
    pub fn updated_aabb(&self, current: &Aabb, steering: Steering, dt: Duration) -> Aabb {
        let steering = steering.clamped();
        let dt = dt.as_secs_f64();
        let delta = Angle::new(self.config.max_turn_rate.radians() * steering.turn * dt);
        let distance = f64::from(self.config.max_speed) * steering.throttle * dt;

        let mut aabb = current.clone();
        aabb.rotate_by(delta);
        let offset = aabb.angle().unit_vector() * distance;
        aabb.translate(offset.x, offset.y);
        aabb
    }

    /// Applies `steering` unless the moved box would overlap a solid entity. Returns whether the
    /// move was committed.
    pub fn drive(
        &mut self,
        steering: Steering,
        dt: Duration,
        tree: &QuadTree,
        entities: &mut Entities,
    ) -> bool {
        let steering = steering.clamped();
        if steering.is_idle() {
            return true;
        }
        let Some(current) = entities.get(self.entity) else {
            return false;
        };
        let candidate = self.updated_aabb(current.aabb(), steering, dt);

        if let Some(blocker) = self.blocker(&candidate, tree, entities) {
            self.collisions += 1;
            debug!(agent = %self.entity, %blocker, "move rejected");
            return false;
        }

        entities.replace_aabb(self.entity, candidate);
        true
    }

    fn blocker(&self, candidate: &Aabb, tree: &QuadTree, entities: &Entities) -> Option<EntityId> {
        tree.query(candidate.bounds()).into_iter().find(|id| {
            *id != self.entity
                && entities.get(*id).is_some_and(|entity| {
                    entity.kind().is_solid() && entity.aabb().overlaps_accurate(candidate)
                })
        })
    }

    /// Refreshes both sensor groups. The tree must already reflect this tick's moves.
    pub fn sense(&mut self, tree: &QuadTree, entities: &Entities) {
        let Some(entity) = entities.get(self.entity) else {
            return;
        };
        let origin = SensorOrigin::of(self.entity, entity);
        self.range_finders.update(&origin, tree, entities);
        self.pie_slices.update(&origin, tree, entities);
    }

    pub fn debug_draw(&self, entity: &Entity, renderer: &mut dyn DebugRenderer) {
        entity.aabb().debug_draw(renderer, DrawLayer::Agent);
        self.range_finders.debug_draw(renderer);
        self.pie_slices.debug_draw(renderer);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::{
        domain::{DetectSet, EntityKind, Position},
        tests::scene,
    };

    fn config() -> AgentConfig {
        AgentConfig {
            width: 10.0,
            height: 10.0,
            max_speed: Velocity::new(10.0),
            max_turn_rate: Angle::from_deg(90.0),
            range_finders: RangeFinderConfig {
                count: 3,
                length: 100.0,
                angle_offset: -45.0,
                angle_between: 45.0,
                detect: DetectSet::new([EntityKind::Wall]),
                ..RangeFinderConfig::default()
            },
            pie_slices: vec![],
        }
    }

    fn agent_entity(center: Position) -> Entity {
        Entity::new(EntityKind::Agent, Aabb::centered_on(center, 10.0, 10.0))
    }

    #[rstest]
    #[case::forward(Steering::new(0.0, 1.0), Position::new(110.0, 100.0), 0.0)]
    #[case::backward(Steering::new(0.0, -1.0), Position::new(90.0, 100.0), 0.0)]
    #[case::turn_left(Steering::new(1.0, 0.0), Position::new(100.0, 100.0), 90.0)]
    #[case::turn_right(Steering::new(-1.0, 0.0), Position::new(100.0, 100.0), 270.0)]
    #[case::turn_and_drive(Steering::new(1.0, 1.0), Position::new(100.0, 110.0), 90.0)]
    #[case::clamped(Steering::new(0.0, 5.0), Position::new(110.0, 100.0), 0.0)]
    fn test_agent_updated_aabb(
        #[case] steering: Steering,
        #[case] center: Position,
        #[case] heading: f64,
    ) {
        let agent = Agent::new(EntityId::new(0), config()).unwrap();
        let current = Aabb::centered_on(Position::new(100.0, 100.0), 10.0, 10.0);
        let aabb = agent.updated_aabb(&current, steering, Duration::from_secs(1));
        assert_abs_diff_eq!(aabb.center(), center, epsilon = 1e-9);
        assert_abs_diff_eq!(aabb.angle().to_deg(), heading, epsilon = 1e-9);
    }

    #[test]
    fn test_agent_drive_commits_free_move() {
        let (tree, mut entities) = scene(vec![agent_entity(Position::new(100.0, 100.0))]);
        let mut agent = Agent::new(EntityId::new(0), config()).unwrap();
        assert!(agent.drive(
            Steering::new(0.0, 1.0),
            Duration::from_secs(1),
            &tree,
            &mut entities
        ));
        let entity = entities.get(agent.entity()).unwrap();
        assert!(entity.moved());
        assert_abs_diff_eq!(entity.center(), Position::new(110.0, 100.0), epsilon = 1e-9);
        assert_eq!(agent.collisions(), 0);
    }

    #[test]
    fn test_agent_drive_rejects_move_into_wall() {
        let (tree, mut entities) = scene(vec![
            agent_entity(Position::new(100.0, 100.0)),
            Entity::wall(Position::new(112.0, 50.0), Position::new(112.0, 150.0), 2.0),
        ]);
        let mut agent = Agent::new(EntityId::new(0), config()).unwrap();
        assert!(!agent.drive(
            Steering::new(0.0, 1.0),
            Duration::from_secs(1),
            &tree,
            &mut entities
        ));
        let entity = entities.get(agent.entity()).unwrap();
        assert!(!entity.moved());
        assert_abs_diff_eq!(entity.center(), Position::new(100.0, 100.0));
        assert_eq!(agent.collisions(), 1);
    }

    #[test]
    fn test_agent_drive_passes_through_goal() {
        let (tree, mut entities) = scene(vec![
            agent_entity(Position::new(100.0, 100.0)),
            Entity::new(
                EntityKind::Goal,
                Aabb::centered_on(Position::new(112.0, 100.0), 4.0, 4.0),
            ),
        ]);
        let mut agent = Agent::new(EntityId::new(0), config()).unwrap();
        assert!(agent.drive(
            Steering::new(0.0, 1.0),
            Duration::from_secs(1),
            &tree,
            &mut entities
        ));
    }

    #[test]
    fn test_agent_idle_does_not_move() {
        let (tree, mut entities) = scene(vec![agent_entity(Position::new(100.0, 100.0))]);
        let mut agent = Agent::new(EntityId::new(0), config()).unwrap();
        assert!(agent.drive(
            Steering::default(),
            Duration::from_secs(1),
            &tree,
            &mut entities
        ));
        assert!(!entities.get(agent.entity()).unwrap().moved());
    }

    #[test]
    fn test_agent_sense_skips_itself() {
        let (tree, entities) = scene(vec![
            agent_entity(Position::new(100.0, 100.0)),
            Entity::wall(Position::new(141.0, 50.0), Position::new(141.0, 150.0), 2.0),
        ]);
        let mut agent = Agent::new(
            EntityId::new(0),
            AgentConfig {
                range_finders: RangeFinderConfig {
                    detect: DetectSet::new([EntityKind::Wall, EntityKind::Agent]),
                    ..config().range_finders
                },
                ..config()
            },
        )
        .unwrap();
        agent.sense(&tree, &entities);
        let activations = agent.activations();
        assert_eq!(activations.len(), 3);
        assert_abs_diff_eq!(activations[1], 0.6, epsilon = 1e-9);
    }

    #[test]
    fn test_agent_rejects_invalid_sensor_config() {
        let result = Agent::new(
            EntityId::new(0),
            AgentConfig {
                pie_slices: vec![PieSliceConfig {
                    angular_width: 720.0,
                    ..PieSliceConfig::default()
                }],
                ..config()
            },
        );
        assert_eq!(result, Err(SensorError::InvalidAngularWidth(720.0)));
    }

    #[rstest]
    #[case::clear(&[0.0, 0.0, 0.0], Steering::new(0.0, 1.0))]
    #[case::obstacle_right(&[0.8, 0.0, 0.0], Steering::new(0.8, 1.0))]
    #[case::obstacle_left(&[0.0, 0.0, 0.6], Steering::new(-0.6, 1.0))]
    #[case::obstacle_ahead(&[0.0, 0.75, 0.0], Steering::new(1.0, 0.25))]
    #[case::invalid_ignored(&[-1.0, 0.0, 0.0], Steering::new(0.0, 1.0))]
    #[case::no_rays(&[], Steering::new(0.0, 1.0))]
    fn test_reactive_controller(#[case] activations: &[f64], #[case] expected: Steering) {
        let mut controller = ReactiveController::new(3, 1.0);
        let steering = controller.steer(activations);
        assert_abs_diff_eq!(steering.turn, expected.turn, epsilon = 1e-9);
        assert_abs_diff_eq!(steering.throttle, expected.throttle, epsilon = 1e-9);
    }
}
