//! Fixed-angle ray sensors reporting how close the nearest detectable obstacle is.

use tracing::warn;

use super::{
    sensor::validate_view_size, Angle, DebugRenderer, DetectSet, DrawLayer, Entities, LineSegment,
    Position, QuadTree, SensorError, SensorOrigin, DEFAULT_VIEW_SIZE, INVALID_ACTIVATION,
};

#[derive(Clone, Debug, PartialEq)]
pub struct RangeFinderConfig {
    pub count: usize,
    pub length: f64,
    /// Direction of the first ray relative to the heading, in degrees.
    pub angle_offset: f64,
    /// Angle between neighbouring rays, in degrees.
    pub angle_between: f64,
    pub view_size: f64,
    pub detect: DetectSet,
}

impl Default for RangeFinderConfig {
    fn default() -> Self {
        Self {
            count: 5,
            length: 100.0,
            angle_offset: -90.0,
            angle_between: 45.0,
            view_size: DEFAULT_VIEW_SIZE,
            detect: DetectSet::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RangeFinder {
    angle_offset: Angle,
    length: f64,
    detect: DetectSet,
    distance: f64,
    activation: f64,
    hit: Option<Position>,
    end: Position,
}

impl RangeFinder {
    fn new(detect: DetectSet) -> Self {
        Self {
            angle_offset: Angle::default(),
            length: 0.0,
            detect,
            distance: 0.0,
            activation: 0.0,
            hit: None,
            end: Position::default(),
        }
    }

    pub fn angle_offset(&self) -> Angle {
        self.angle_offset
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn detect(&self) -> &DetectSet {
        &self.detect
    }

    /// Distance to the nearest hit, or the full length when nothing was hit.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn activation(&self) -> f64 {
        self.activation
    }

    pub fn hit(&self) -> Option<Position> {
        self.hit
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RangeFinderGroup {
    sensors: Vec<RangeFinder>,
    view_size: f64,
    origin: Position,
}

impl RangeFinderGroup {
    pub fn new(count: usize, detect: DetectSet) -> Self {
        Self {
            sensors: vec![RangeFinder::new(detect); count],
            view_size: DEFAULT_VIEW_SIZE,
            origin: Position::default(),
        }
    }

    pub fn from_config(config: &RangeFinderConfig) -> Result<Self, SensorError> {
        let mut group = Self::new(config.count, config.detect.clone());
        group.set_view_size(config.view_size)?;
        group.configure(config.length, config.angle_offset, config.angle_between)?;
        Ok(group)
    }

    /// Ray `i` points at `heading + angle_offset + i * angle_between` (degrees) and reaches
    /// `length`. A rejected call leaves the previous layout in place.
    pub fn configure(
        &mut self,
        length: f64,
        angle_offset: f64,
        angle_between: f64,
    ) -> Result<(), SensorError> {
        if !length.is_finite() || length < 0.0 {
            warn!(length, "rejecting range finder configuration");
            return Err(SensorError::InvalidLength(length));
        }
        for (i, sensor) in self.sensors.iter_mut().enumerate() {
            sensor.length = length;
            sensor.angle_offset = Angle::from_deg(angle_offset + i as f64 * angle_between);
        }
        Ok(())
    }

    pub fn set_view_size(&mut self, size: f64) -> Result<(), SensorError> {
        validate_view_size(size).inspect_err(|_| warn!(size, "rejecting view size"))?;
        self.view_size = size;
        Ok(())
    }

    pub fn set_detect(&mut self, index: usize, detect: DetectSet) -> Result<(), SensorError> {
        let sensor = self
            .sensors
            .get_mut(index)
            .ok_or(SensorError::InvalidSensorIndex(index))?;
        sensor.detect = detect;
        Ok(())
    }

    pub fn sensors(&self) -> &[RangeFinder] {
        &self.sensors
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    /// Activation of ray `index`, or [`INVALID_ACTIVATION`] if there is no such ray.
    pub fn activation(&self, index: usize) -> f64 {
        self.sensors
            .get(index)
            .map_or(INVALID_ACTIVATION, RangeFinder::activation)
    }

    pub fn activations(&self) -> impl Iterator<Item = f64> + '_ {
        self.sensors.iter().map(RangeFinder::activation)
    }

    /// Casts every ray against the candidates the quadtree reports around `origin` and keeps the
    /// nearest intersection per ray. Equal distances keep the first candidate found.
    pub fn update(&mut self, origin: &SensorOrigin, tree: &QuadTree, entities: &Entities) {
        let candidates = tree.query(origin.view_bounds(self.view_size).bounds());
        self.origin = origin.center;

        for sensor in &mut self.sensors {
            let end = origin
                .center
                .project(origin.heading + sensor.angle_offset, sensor.length);
            let ray = LineSegment::new(origin.center, end);
            let mut nearest = sensor.length;
            let mut hit = None;

            for id in &candidates {
                if origin.is_self(*id) {
                    continue;
                }
                let Some(entity) = entities.get(*id) else {
                    continue;
                };
                if !sensor.detect.contains(entity.kind()) {
                    continue;
                }
                for point in entity.aabb().intersects_line_accurate(&ray, origin.center) {
                    let distance = origin.center.distance(point);
                    if distance < nearest {
                        nearest = distance;
                        hit = Some(point);
                    }
                }
            }

            sensor.distance = nearest;
            sensor.hit = hit;
            sensor.end = hit.unwrap_or(end);
            sensor.activation = if sensor.length > 0.0 {
                (sensor.length - nearest) / sensor.length
            } else {
                0.0
            };
        }
    }

    pub fn debug_draw(&self, renderer: &mut dyn DebugRenderer) {
        for sensor in &self.sensors {
            let layer = if sensor.hit.is_some() {
                DrawLayer::ActiveSensor
            } else {
                DrawLayer::Sensor
            };
            renderer.line(self.origin, sensor.end, layer);
        }
    }
}
