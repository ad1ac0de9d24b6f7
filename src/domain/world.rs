//! World holding the entities, their quadtree and the agents.

use std::time::Duration;

use tracing::trace;

use super::{
    Aabb, Agent, AgentConfig, Angle, Controller, DebugRenderer, DrawLayer, Entities, Entity,
    EntityId, EntityKind, Position, QuadTree, QuadTreeConfig, QuadTreeStats, SensorError,
};

#[derive(Clone, Debug)]
pub struct World {
    entities: Entities,
    tree: QuadTree,
    agents: Vec<Agent>,
    ticks: u64,
}

impl World {
    pub fn new(width: f64, height: f64) -> Self {
        Self::with_config(width, height, QuadTreeConfig::default())
    }

    pub fn with_config(width: f64, height: f64, config: QuadTreeConfig) -> Self {
        Self {
            entities: Entities::new(),
            tree: QuadTree::with_config(width, height, config),
            agents: vec![],
            ticks: 0,
        }
    }

    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    /// Entities changed through this store are picked up by the tree on the next [`World::step`].
    pub fn entities_mut(&mut self) -> &mut Entities {
        &mut self.entities
    }

    pub fn tree(&self) -> &QuadTree {
        &self.tree
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn agent(&self, index: usize) -> Option<&Agent> {
        self.agents.get(index)
    }

    pub fn agent_mut(&mut self, index: usize) -> Option<&mut Agent> {
        self.agents.get_mut(index)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn stats(&self) -> QuadTreeStats {
        self.tree.stats()
    }

    pub fn add_entity(&mut self, entity: Entity) -> EntityId {
        let id = self.entities.insert(entity);
        self.tree.add_entity(&self.entities, id);
        id
    }

    /// Places an agent box centered on `center` facing `heading` and returns the agent's index.
    /// Its sensors are valid once the agent has been sensed, which [`World::step`] does and
    /// [`World::sense`] does on demand.
    pub fn add_agent(
        &mut self,
        center: Position,
        heading: Angle,
        config: AgentConfig,
    ) -> Result<usize, SensorError> {
        let mut aabb = Aabb::centered_on(center, config.width, config.height);
        aabb.rotate_by(heading);
        let agent = Agent::new(self.entities.next_id(), config)?;
        self.add_entity(Entity::new(EntityKind::Agent, aabb));
        self.agents.push(agent);
        Ok(self.agents.len() - 1)
    }

    /// Advances the world by `dt`. Agents steer on the activations of the previous tick and move,
    /// then the tree picks up every moved entity before the sensors query it.
    pub fn step(&mut self, dt: Duration, controller: &mut dyn Controller) {
        for agent in &mut self.agents {
            let steering = controller.steer(&agent.activations());
            agent.drive(steering, dt, &self.tree, &mut self.entities);
        }
        self.tree.update(&self.entities);
        self.sense();
        self.entities.settle();
        self.ticks += 1;
        trace!(tick = self.ticks, "world stepped");
    }

    /// Refreshes the sensors of every agent against the current tree.
    pub fn sense(&mut self) {
        for agent in &mut self.agents {
            agent.sense(&self.tree, &self.entities);
        }
    }

    pub fn debug_draw(&self, renderer: &mut dyn DebugRenderer) {
        self.tree.debug_draw(renderer);
        for (_, entity) in self
            .entities
            .iter()
            .filter(|(_, entity)| entity.kind() != EntityKind::Agent)
        {
            entity.aabb().debug_draw(renderer, DrawLayer::Entity);
        }
        for agent in &self.agents {
            if let Some(entity) = self.entities.get(agent.entity()) {
                agent.debug_draw(entity, renderer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        domain::{DetectSet, RangeFinderConfig, Steering, Velocity},
        tests::RecordingRenderer,
    };

    const TICK: Duration = Duration::from_secs(1);

    struct Scripted(Steering);

    impl Controller for Scripted {
        fn steer(&mut self, _activations: &[f64]) -> Steering {
            self.0
        }
    }

    fn agent_config() -> AgentConfig {
        AgentConfig {
            width: 10.0,
            height: 10.0,
            max_speed: Velocity::new(10.0),
            max_turn_rate: Angle::from_deg(90.0),
            range_finders: RangeFinderConfig {
                detect: DetectSet::new([EntityKind::Wall]),
                ..RangeFinderConfig::default()
            },
            pie_slices: vec![],
        }
    }

    /// Agent at (100, 500) facing a wall whose near face is at x = 200.
    fn corridor() -> World {
        let mut world = World::new(1000.0, 1000.0);
        world.add_entity(Entity::wall(
            Position::new(201.0, 50.0),
            Position::new(201.0, 950.0),
            2.0,
        ));
        world
            .add_agent(Position::new(100.0, 500.0), Angle::default(), agent_config())
            .unwrap();
        world
    }

    fn agent_center(world: &World) -> Position {
        let agent = world.agent(0).unwrap();
        world.entities().get(agent.entity()).unwrap().center()
    }

    #[test]
    fn test_world_step_moves_agent_and_senses() {
        let mut world = corridor();
        let mut controller = Scripted(Steering::new(0.0, 1.0));

        world.step(TICK, &mut controller);
        assert_abs_diff_eq!(agent_center(&world), Position::new(110.0, 500.0), epsilon = 1e-9);
        assert_abs_diff_eq!(
            world.agent(0).unwrap().range_finders().activation(2),
            0.1,
            epsilon = 1e-9
        );

        world.step(TICK, &mut controller);
        assert_abs_diff_eq!(
            world.agent(0).unwrap().range_finders().activation(2),
            0.2,
            epsilon = 1e-9
        );
        assert_eq!(world.ticks(), 2);
    }

    #[test]
    fn test_world_step_blocks_at_wall() {
        let mut world = corridor();
        let mut controller = Scripted(Steering::new(0.0, 1.0));
        for _ in 0..12 {
            world.step(TICK, &mut controller);
        }
        assert_abs_diff_eq!(agent_center(&world), Position::new(190.0, 500.0), epsilon = 1e-9);
        assert_eq!(world.agent(0).unwrap().collisions(), 3);
        assert_abs_diff_eq!(
            world.agent(0).unwrap().range_finders().activation(2),
            0.9,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_world_step_keeps_tree_current() {
        let mut world = corridor();
        let agent = world.agent(0).unwrap().entity();
        let mut controller = Scripted(Steering::new(0.0, 1.0));
        for _ in 0..5 {
            world.step(TICK, &mut controller);
        }

        let around = Aabb::centered_on(Position::new(150.0, 500.0), 12.0, 12.0);
        assert!(world.tree().query(around.bounds()).contains(&agent));
        assert!(world.entities().iter().all(|(_, entity)| !entity.moved()));

        let mut indexed = world.tree().entities();
        indexed.sort();
        assert_eq!(indexed, vec![EntityId::new(0), EntityId::new(1)]);
    }

    #[test]
    fn test_world_picks_up_external_moves() {
        let mut world = World::new(1000.0, 1000.0);
        let goal = world.add_entity(Entity::new(
            EntityKind::Goal,
            Aabb::centered_on(Position::new(100.0, 100.0), 4.0, 4.0),
        ));
        world.entities_mut().translate(goal, 700.0, 700.0);
        world.step(TICK, &mut Scripted(Steering::default()));

        let around = Aabb::centered_on(Position::new(800.0, 800.0), 10.0, 10.0);
        assert_eq!(world.tree().query(around.bounds()), vec![goal]);
    }

    #[test]
    fn test_world_rejects_invalid_agent() {
        let mut world = World::new(100.0, 100.0);
        let result = world.add_agent(
            Position::new(50.0, 50.0),
            Angle::default(),
            AgentConfig {
                range_finders: RangeFinderConfig {
                    length: -5.0,
                    ..RangeFinderConfig::default()
                },
                ..agent_config()
            },
        );
        assert_eq!(result, Err(SensorError::InvalidLength(-5.0)));
        assert!(world.entities().is_empty());
        assert!(world.agents().is_empty());
    }

    #[test]
    fn test_world_debug_draw() {
        let mut world = corridor();
        world.step(TICK, &mut Scripted(Steering::new(0.0, 1.0)));
        let mut renderer = RecordingRenderer::default();
        world.debug_draw(&mut renderer);

        let count = |layer: DrawLayer| {
            renderer
                .lines
                .iter()
                .filter(|(_, _, l)| *l == layer)
                .count()
        };
        assert_eq!(count(DrawLayer::QuadTree), 4);
        assert_eq!(count(DrawLayer::Entity), 4);
        assert_eq!(count(DrawLayer::Agent), 4);
        assert_eq!(count(DrawLayer::ActiveSensor), 1);
        assert_eq!(count(DrawLayer::Sensor), 4);
    }
}
