//! Wedge-shaped area sensors counting detectable entities inside an angle range and radius band.

use tracing::warn;

use super::{
    basis::normalize_deg, sensor::validate_view_size, Angle, DebugRenderer, DetectSet, DrawLayer,
    Entities, Entity, EntityId, Position, QuadTree, SensorError, SensorOrigin, DEFAULT_VIEW_SIZE,
    INVALID_ACTIVATION,
};

/// Tolerance on the angular bounds, in degrees.
const ANGLE_EPSILON: f64 = 1e-9;
/// Segments per arc of the outline.
const ARC_SEGMENTS: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub struct PieSliceConfig {
    pub inner_radius: f64,
    pub outer_radius: f64,
    /// Width of the wedge in degrees, within `[0, 360]`.
    pub angular_width: f64,
    /// Start of the wedge relative to the heading, in degrees.
    pub angular_offset: f64,
    /// Number of contained entities at which the activation saturates.
    pub max_detectable: usize,
    /// Also match angles past the 0/360 seam when `offset + width` crosses it.
    pub wrap_around: bool,
    pub detect: DetectSet,
}

impl Default for PieSliceConfig {
    fn default() -> Self {
        Self {
            inner_radius: 0.0,
            outer_radius: 150.0,
            angular_width: 90.0,
            angular_offset: -45.0,
            max_detectable: 3,
            wrap_around: false,
            detect: DetectSet::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PieSliceSensor {
    config: PieSliceConfig,
    /// Boundary relative to the sensing center at heading zero; only used for drawing.
    outline: Vec<Position>,
    contained: Vec<EntityId>,
    activated: bool,
    activation: f64,
}

impl PieSliceSensor {
    pub fn new(config: PieSliceConfig) -> Result<Self, SensorError> {
        let mut sensor = Self {
            config: PieSliceConfig::default(),
            outline: vec![],
            contained: vec![],
            activated: false,
            activation: 0.0,
        };
        sensor.configure(config)?;
        Ok(sensor)
    }

    /// Replaces the configuration. A rejected configuration leaves the previous one in place.
    pub fn configure(&mut self, config: PieSliceConfig) -> Result<(), SensorError> {
        if !(0.0..=360.0).contains(&config.angular_width) {
            warn!(width = config.angular_width, "rejecting pie slice configuration");
            return Err(SensorError::InvalidAngularWidth(config.angular_width));
        }
        let (inner, outer) = (config.inner_radius, config.outer_radius);
        if !inner.is_finite() || !outer.is_finite() || inner < 0.0 || outer < 0.0 {
            warn!(inner, outer, "rejecting pie slice configuration");
            return Err(SensorError::InvalidRadius { inner, outer });
        }
        self.outline = outline(&config);
        self.config = config;
        Ok(())
    }

    pub fn config(&self) -> &PieSliceConfig {
        &self.config
    }

    pub fn outline(&self) -> &[Position] {
        &self.outline
    }

    pub fn contained(&self) -> &[EntityId] {
        &self.contained
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    pub fn activation(&self) -> f64 {
        self.activation
    }

    pub fn reset(&mut self) {
        self.contained.clear();
        self.activated = false;
        self.activation = 0.0;
    }

    /// Claims `entity` if its kind is detected, its center lies within the radius band and its
    /// direction falls into the wedge. Claimed entities count towards the activation.
    pub fn contains(&mut self, origin: &SensorOrigin, id: EntityId, entity: &Entity) -> bool {
        let config = &self.config;
        if !config.detect.contains(entity.kind()) || config.inner_radius >= config.outer_radius {
            return false;
        }
        let center = entity.center();
        let distance = origin.center.distance(center);
        if distance < config.inner_radius || distance > config.outer_radius {
            return false;
        }

        let angle = origin.center.heading_to(center).to_deg();
        let lower = normalize_deg(origin.heading.deg() + config.angular_offset);
        let upper = lower + config.angular_width;
        let within = |a: f64| a + ANGLE_EPSILON >= lower && a - ANGLE_EPSILON <= upper;
        if !(within(angle) || config.wrap_around && within(angle + 360.0)) {
            return false;
        }

        self.activated = true;
        self.contained.push(id);
        true
    }

    pub fn update(&mut self) {
        self.activation = if self.config.max_detectable == 0 {
            0.0
        } else {
            (self.contained.len() as f64 / self.config.max_detectable as f64).min(1.0)
        };
    }

    pub fn debug_draw(&self, origin: &SensorOrigin, renderer: &mut dyn DebugRenderer) {
        let layer = if self.activated {
            DrawLayer::ActiveSensor
        } else {
            DrawLayer::Sensor
        };
        let points = self
            .outline
            .iter()
            .map(|p| {
                p.rotated_about(Position::default(), origin.heading)
                    .translated(origin.center.x(), origin.center.y())
            })
            .collect::<Vec<_>>();
        renderer.polyline(&points, layer);
    }
}

/// Closed polyline: outer arc, then the inner arc backwards (or the center when there is no
/// inner radius).
fn outline(config: &PieSliceConfig) -> Vec<Position> {
    let arc = |radius: f64| {
        (0..=ARC_SEGMENTS).map(move |i| {
            let angle = Angle::from_deg(
                config.angular_offset + config.angular_width * i as f64 / ARC_SEGMENTS as f64,
            );
            Position::default().project(angle, radius)
        })
    };
    let mut points = arc(config.outer_radius).collect::<Vec<_>>();
    if config.inner_radius > 0.0 {
        let mut inner = arc(config.inner_radius).collect::<Vec<_>>();
        inner.reverse();
        points.extend(inner);
    } else {
        points.push(Position::default());
    }
    if let Some(first) = points.first().copied() {
        points.push(first);
    }
    points
}

#[derive(Clone, Debug, PartialEq)]
pub struct PieSliceSensorGroup {
    sensors: Vec<PieSliceSensor>,
    view_size: f64,
    origin: SensorOrigin,
}

impl PieSliceSensorGroup {
    pub fn new(sensors: Vec<PieSliceSensor>) -> Self {
        Self {
            sensors,
            view_size: DEFAULT_VIEW_SIZE,
            origin: SensorOrigin::default(),
        }
    }

    pub fn from_configs(
        configs: impl IntoIterator<Item = PieSliceConfig>,
    ) -> Result<Self, SensorError> {
        let sensors = configs
            .into_iter()
            .map(PieSliceSensor::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(sensors))
    }

    pub fn set_view_size(&mut self, size: f64) -> Result<(), SensorError> {
        validate_view_size(size).inspect_err(|_| warn!(size, "rejecting view size"))?;
        self.view_size = size;
        Ok(())
    }

    pub fn configure(&mut self, index: usize, config: PieSliceConfig) -> Result<(), SensorError> {
        self.sensors
            .get_mut(index)
            .ok_or(SensorError::InvalidSensorIndex(index))?
            .configure(config)
    }

    pub fn sensors(&self) -> &[PieSliceSensor] {
        &self.sensors
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Activation of sensor `index`, or [`INVALID_ACTIVATION`] if there is no such sensor.
    pub fn activation(&self, index: usize) -> f64 {
        self.sensors
            .get(index)
            .map_or(INVALID_ACTIVATION, PieSliceSensor::activation)
    }

    pub fn activations(&self) -> impl Iterator<Item = f64> + '_ {
        self.sensors.iter().map(PieSliceSensor::activation)
    }

    /// Each candidate is offered to the sensors in order and counted by the first one that
    /// contains it, so overlapping wedges never share an entity.
    pub fn update(&mut self, origin: &SensorOrigin, tree: &QuadTree, entities: &Entities) {
        self.origin = *origin;
        for sensor in &mut self.sensors {
            sensor.reset();
        }

        for id in tree.query(origin.view_bounds(self.view_size).bounds()) {
            if origin.is_self(id) {
                continue;
            }
            let Some(entity) = entities.get(id) else {
                continue;
            };
            for sensor in &mut self.sensors {
                if sensor.contains(origin, id, entity) {
                    break;
                }
            }
        }

        for sensor in &mut self.sensors {
            sensor.update();
        }
    }

    pub fn debug_draw(&self, renderer: &mut dyn DebugRenderer) {
        for sensor in &self.sensors {
            sensor.debug_draw(&self.origin, renderer);
        }
    }
}
