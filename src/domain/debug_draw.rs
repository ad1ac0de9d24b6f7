//! Rendering hook for debug outlines.
//!
//! The domain never owns a renderer. Whoever draws (the Bevy visualizer, a test recorder) passes
//! one in for the duration of a single draw call.

use super::Position;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub enum DrawLayer {
    QuadTree,
    Entity,
    Agent,
    Sensor,
    ActiveSensor,
}

pub trait DebugRenderer {
    fn line(&mut self, start: Position, end: Position, layer: DrawLayer);

    fn polyline(&mut self, points: &[Position], layer: DrawLayer) {
        for pair in points.windows(2) {
            self.line(pair[0], pair[1], layer);
        }
    }
}
