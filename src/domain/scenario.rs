//! Seeded generation of an arena: boundary walls, scattered interior walls, obstacles and goals
//! around a single agent spawned in the middle.

use rand::{
    distr::{uniform, Distribution, Uniform},
    SeedableRng,
};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, warn};

use super::{
    Aabb, AgentConfig, Angle, DetectSet, Entity, EntityKind, PieSliceConfig, Position,
    RangeFinderConfig, SensorError, World,
};

/// Placement attempts per requested entity before giving up on it.
const MAX_ATTEMPTS: usize = 50;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("invalid scenario range: {0}")]
    Range(#[from] uniform::Error),
    #[error(transparent)]
    Sensor(#[from] SensorError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioConfig {
    pub seed: u64,
    pub width: f64,
    pub height: f64,
    pub wall_thickness: f64,
    pub interior_walls: usize,
    pub min_wall_length: f64,
    pub max_wall_length: f64,
    pub obstacles: usize,
    pub obstacle_size: f64,
    pub goals: usize,
    pub goal_size: f64,
    /// Edge of the square around the spawn point kept free of entities.
    pub spawn_clearance: f64,
    pub agent: AgentConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 19878367467712,
            width: 1200.0,
            height: 800.0,
            wall_thickness: 4.0,
            interior_walls: 6,
            min_wall_length: 80.0,
            max_wall_length: 240.0,
            obstacles: 8,
            obstacle_size: 24.0,
            goals: 10,
            goal_size: 8.0,
            spawn_clearance: 100.0,
            agent: default_agent(),
        }
    }
}

/// Agent with a fan of range finders for walls and obstacles and four quarter wedges for goals.
pub fn default_agent() -> AgentConfig {
    AgentConfig {
        range_finders: RangeFinderConfig {
            detect: DetectSet::new([EntityKind::Wall, EntityKind::Obstacle]),
            ..RangeFinderConfig::default()
        },
        pie_slices: [-45.0, 45.0, 135.0, 225.0]
            .into_iter()
            .map(|angular_offset| PieSliceConfig {
                inner_radius: 0.0,
                outer_radius: 200.0,
                angular_width: 90.0,
                angular_offset,
                max_detectable: 3,
                wrap_around: true,
                detect: DetectSet::new([EntityKind::Goal]),
            })
            .collect(),
        ..AgentConfig::default()
    }
}

pub fn generate(config: &ScenarioConfig) -> Result<World, ScenarioError> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut world = World::new(config.width, config.height);

    let (width, height, thickness) = (config.width, config.height, config.wall_thickness);
    let corners = [
        Position::new(thickness, thickness),
        Position::new(width - thickness, thickness),
        Position::new(width - thickness, height - thickness),
        Position::new(thickness, height - thickness),
    ];
    for (start, end) in corners.iter().zip(corners.iter().cycle().skip(1)) {
        world.add_entity(Entity::wall(*start, *end, thickness));
    }

    let margin = 2.0 * thickness;
    let x = Uniform::new(margin, width - margin)?;
    let y = Uniform::new(margin, height - margin)?;
    let heading = Uniform::new(0.0, 360.0)?;
    let wall_length = Uniform::new_inclusive(config.min_wall_length, config.max_wall_length)?;

    let spawn = Position::new(width / 2.0, height / 2.0);
    let clearance = Aabb::centered_on(spawn, config.spawn_clearance, config.spawn_clearance);

    scatter(&mut world, &mut rng, config.interior_walls, &clearance, |rng| {
        let start = Position::new(x.sample(rng), y.sample(rng));
        let end = start.project(
            Angle::from_deg(heading.sample(rng)),
            wall_length.sample(rng),
        );
        Entity::wall(start, end, thickness)
    });
    scatter(&mut world, &mut rng, config.obstacles, &clearance, |rng| {
        let center = Position::new(x.sample(rng), y.sample(rng));
        let mut aabb = Aabb::centered_on(center, config.obstacle_size, config.obstacle_size);
        aabb.rotate_by(Angle::from_deg(heading.sample(rng)));
        Entity::new(EntityKind::Obstacle, aabb)
    });
    scatter(&mut world, &mut rng, config.goals, &clearance, |rng| {
        let center = Position::new(x.sample(rng), y.sample(rng));
        Entity::new(
            EntityKind::Goal,
            Aabb::centered_on(center, config.goal_size, config.goal_size),
        )
    });

    world.add_agent(spawn, Angle::default(), config.agent.clone())?;
    world.sense();
    debug!(
        seed = config.seed,
        entities = world.entities().len(),
        "scenario generated"
    );
    Ok(world)
}

/// Adds up to `count` entities from `spawn_entity` that lie inside the world and clear of the
/// spawn area.
fn scatter(
    world: &mut World,
    rng: &mut ChaCha8Rng,
    count: usize,
    clearance: &Aabb,
    mut spawn_entity: impl FnMut(&mut ChaCha8Rng) -> Entity,
) {
    let mut placed = 0;
    for _ in 0..count * MAX_ATTEMPTS {
        if placed == count {
            break;
        }
        let entity = spawn_entity(rng);
        if world.tree().region().contains(entity.aabb().bounds())
            && !entity.aabb().overlaps_accurate(clearance)
        {
            world.add_entity(entity);
            placed += 1;
        }
    }
    if placed < count {
        warn!(placed, requested = count, "could not place every entity");
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::{assert_eq, assert_ne};

    use super::*;
    use crate::tests::RNG_SEED;

    fn count(world: &World, kind: EntityKind) -> usize {
        world
            .entities()
            .iter()
            .filter(|(_, entity)| entity.kind() == kind)
            .count()
    }

    #[test]
    fn test_generate_is_deterministic() {
        let config = ScenarioConfig {
            seed: RNG_SEED,
            ..ScenarioConfig::default()
        };
        let a = generate(&config).unwrap();
        let b = generate(&config).unwrap();
        assert_eq!(a.entities(), b.entities());

        let c = generate(&ScenarioConfig {
            seed: RNG_SEED + 1,
            ..config
        })
        .unwrap();
        assert_ne!(a.entities(), c.entities());
    }

    #[test]
    fn test_generate_places_everything_inside() {
        let world = generate(&ScenarioConfig::default()).unwrap();
        assert_eq!(count(&world, EntityKind::Wall), 4 + 6);
        assert_eq!(count(&world, EntityKind::Obstacle), 8);
        assert_eq!(count(&world, EntityKind::Goal), 10);
        assert_eq!(count(&world, EntityKind::Agent), 1);
        assert!(world.tree().outside().is_empty());
        assert_eq!(world.stats().occupant_count, world.entities().len());
    }

    #[test]
    fn test_generate_keeps_spawn_clear() {
        let world = generate(&ScenarioConfig::default()).unwrap();
        let agent = world.agent(0).unwrap();
        let body = world.entities().get(agent.entity()).unwrap().aabb().clone();
        assert!(world
            .entities()
            .iter()
            .filter(|(id, entity)| *id != agent.entity() && entity.kind().is_solid())
            .all(|(_, entity)| !entity.aabb().overlaps_accurate(&body)));
        assert_eq!(agent.activations().len(), 5 + 4);
    }

    #[test]
    fn test_generate_rejects_empty_wall_range() {
        let result = generate(&ScenarioConfig {
            min_wall_length: 300.0,
            max_wall_length: 100.0,
            ..ScenarioConfig::default()
        });
        assert!(matches!(result, Err(ScenarioError::Range(_))));
    }

    #[test]
    fn test_generate_rejects_invalid_agent() {
        let mut config = ScenarioConfig::default();
        config.agent.pie_slices[0].inner_radius = -1.0;
        let result = generate(&config);
        assert!(matches!(
            result,
            Err(ScenarioError::Sensor(SensorError::InvalidRadius { .. }))
        ));
    }
}
