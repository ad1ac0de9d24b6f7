//! Rotatable rectangles and their axis-aligned envelopes.

use super::{Angle, DebugRenderer, DrawLayer, LineSegment, Position};

/// Four world-space corners of a possibly rotated rectangle and the axis-aligned envelope that
/// encloses them.
///
/// The envelope fields are only ever derived from the corners, see [`Rect::from_corners`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub ll: Position,
    pub lr: Position,
    pub ul: Position,
    pub ur: Position,
}

impl Rect {
    pub fn from_corners(ll: Position, lr: Position, ul: Position, ur: Position) -> Self {
        let xs = [ll.x(), lr.x(), ul.x(), ur.x()];
        let ys = [ll.y(), lr.y(), ul.y(), ur.y()];
        let left = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let right = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let bottom = ys.iter().copied().fold(f64::INFINITY, f64::min);
        let top = ys.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            left,
            right,
            bottom,
            top,
            width: right - left,
            height: top - bottom,
            ll,
            lr,
            ul,
            ur,
        }
    }

    /// Unrotated rectangle with lower-left corner at (`left`, `bottom`).
    pub fn axis_aligned(left: f64, bottom: f64, width: f64, height: f64) -> Self {
        Self::from_corners(
            Position::new(left, bottom),
            Position::new(left + width, bottom),
            Position::new(left, bottom + height),
            Position::new(left + width, bottom + height),
        )
    }

    pub fn corners(&self) -> [Position; 4] {
        [self.ll, self.lr, self.ur, self.ul]
    }

    /// Edges in counter-clockwise order starting at the bottom edge.
    pub fn edges(&self) -> [LineSegment; 4] {
        [
            LineSegment::new(self.ll, self.lr),
            LineSegment::new(self.lr, self.ur),
            LineSegment::new(self.ur, self.ul),
            LineSegment::new(self.ul, self.ll),
        ]
    }
}

/// A rotatable rectangle together with its axis-aligned envelope.
///
/// Every mutation recomputes the envelope from the four rotated corners.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Aabb {
    rect: Rect,
    angle: Angle,
    center: Position,
    pos: Position,
}

impl Aabb {
    /// Unrotated `width` x `height` box with its lower-left corner at the origin.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            rect: Rect::axis_aligned(0.0, 0.0, width, height),
            angle: Angle::default(),
            center: Position::new(width / 2.0, height / 2.0),
            pos: Position::default(),
        }
    }

    /// Unrotated box with its lower-left corner at (`left`, `bottom`).
    pub fn from_bounds(left: f64, bottom: f64, width: f64, height: f64) -> Self {
        let mut aabb = Self::new(width, height);
        aabb.translate(left, bottom);
        aabb
    }

    pub fn centered_on(center: Position, width: f64, height: f64) -> Self {
        Self::from_bounds(
            center.x() - width / 2.0,
            center.y() - height / 2.0,
            width,
            height,
        )
    }

    pub fn bounds(&self) -> &Rect {
        &self.rect
    }

    pub fn angle(&self) -> Angle {
        self.angle
    }

    pub fn center(&self) -> Position {
        self.center
    }

    /// Accumulated translation since construction.
    pub fn pos(&self) -> Position {
        self.pos
    }

    /// Resizes the box in its own frame, keeping the current rotation: the rotation is undone,
    /// the box is reset to `width` x `height` from its unrotated lower-left corner, and the
    /// rotation is applied again.
    pub fn set_size(&mut self, width: f64, height: f64) {
        let angle = self.angle;
        self.rotate_corners(-angle);
        let ll = self.rect.ll;
        self.rect = Rect::axis_aligned(ll.x(), ll.y(), width, height);
        self.center = ll.translated(width / 2.0, height / 2.0);
        self.rotate_corners(angle);
    }

    /// Rotates the box about its center by `delta`, which is added to the stored angle. Callers
    /// pass the change since their last call, never an absolute heading.
    pub fn rotate_by(&mut self, delta: Angle) {
        self.angle = self.angle + delta;
        self.rotate_corners(delta);
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.pos = self.pos.translated(dx, dy);
        self.center = self.center.translated(dx, dy);
        self.rect = Rect::from_corners(
            self.rect.ll.translated(dx, dy),
            self.rect.lr.translated(dx, dy),
            self.rect.ul.translated(dx, dy),
            self.rect.ur.translated(dx, dy),
        );
    }

    pub fn move_center_to(&mut self, center: Position) {
        self.translate(center.x() - self.center.x(), center.y() - self.center.y());
    }

    fn rotate_corners(&mut self, delta: Angle) {
        let pivot = self.center;
        self.rect = Rect::from_corners(
            self.rect.ll.rotated_about(pivot, delta),
            self.rect.lr.rotated_about(pivot, delta),
            self.rect.ul.rotated_about(pivot, delta),
            self.rect.ur.rotated_about(pivot, delta),
        );
    }

    /// True only if the envelope strictly encloses `rect` on all four sides.
    pub fn contains(&self, rect: &Rect) -> bool {
        let own = &self.rect;
        own.left < rect.left && own.right > rect.right && own.bottom < rect.bottom && own.top > rect.top
    }

    /// Envelope overlap. Touching edges do not count as intersecting.
    pub fn intersects(&self, rect: &Rect) -> bool {
        let own = &self.rect;
        !(own.right <= rect.left
            || own.left >= rect.right
            || own.top <= rect.bottom
            || own.bottom >= rect.top)
    }

    /// Intersects `line` with the four rotated edges of the box. A collinear overlap with an
    /// edge contributes only its end point nearest to `relative`, so at most four points are
    /// returned.
    pub fn intersects_line_accurate(&self, line: &LineSegment, relative: Position) -> Vec<Position> {
        self.rect
            .edges()
            .iter()
            .filter_map(|edge| {
                let points = line.intersect(edge);
                match points.len() {
                    0 => None,
                    1 => Some(points[0]),
                    _ => points
                        .into_iter()
                        .min_by(|a, b| relative.distance(*a).total_cmp(&relative.distance(*b))),
                }
            })
            .collect()
    }

    /// Whether the rotated outlines of the two boxes cross, or one lies within the other.
    pub fn overlaps_accurate(&self, other: &Aabb) -> bool {
        if !self.intersects(other.bounds()) {
            return false;
        }
        let crossing = other
            .rect
            .edges()
            .iter()
            .any(|edge| !self.intersects_line_accurate(edge, edge.start()).is_empty());
        crossing || self.encloses_point(other.center) || other.encloses_point(self.center)
    }

    /// Point-in-rotated-rectangle test in the box's own frame.
    pub fn encloses_point(&self, point: Position) -> bool {
        let local = point.rotated_about(self.center, -self.angle);
        let half_width = self.rect.ll.distance(self.rect.lr) / 2.0;
        let half_height = self.rect.ll.distance(self.rect.ul) / 2.0;
        (local.x() - self.center.x()).abs() <= half_width
            && (local.y() - self.center.y()).abs() <= half_height
    }

    pub fn debug_draw(&self, renderer: &mut dyn DebugRenderer, layer: DrawLayer) {
        for edge in self.rect.edges() {
            renderer.line(edge.start(), edge.end(), layer);
        }
    }
}
