//! Exact segment/segment intersection covering sloped, vertical, parallel and collinear pairs.

use super::Position;

/// Tolerance for verticality, slope equality and domain checks.
const EPSILON: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Form {
    /// `y = slope * x + intercept` on `[x_min, x_max]`.
    Sloped {
        slope: f64,
        intercept: f64,
        x_min: f64,
        x_max: f64,
    },
    /// `x = x` on `[y_min, y_max]`.
    Vertical { x: f64, y_min: f64, y_max: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    start: Position,
    end: Position,
    form: Form,
}

impl LineSegment {
    /// Derives slope and intercept, or verticality, from the two end points. Bounds are stored
    /// with the lower value first regardless of the direction of the segment.
    pub fn new(start: Position, end: Position) -> Self {
        let dx = end.x() - start.x();
        let form = if dx.abs() < EPSILON {
            Form::Vertical {
                x: start.x(),
                y_min: start.y().min(end.y()),
                y_max: start.y().max(end.y()),
            }
        } else {
            let slope = (end.y() - start.y()) / dx;
            Form::Sloped {
                slope,
                intercept: start.y() - slope * start.x(),
                x_min: start.x().min(end.x()),
                x_max: start.x().max(end.x()),
            }
        };
        Self { start, end, form }
    }

    pub fn start(&self) -> Position {
        self.start
    }

    pub fn end(&self) -> Position {
        self.end
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self.form, Form::Vertical { .. })
    }

    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Returns `f64::INFINITY` for vertical segments and for `x` outside the segment's domain.
    pub fn get_y(&self, x: f64) -> f64 {
        match self.form {
            Form::Sloped {
                slope,
                intercept,
                x_min,
                x_max,
            } if within(x, x_min, x_max) => slope * x + intercept,
            _ => f64::INFINITY,
        }
    }

    /// All intersection points with `other`. Collinear overlap yields the end points of the
    /// shared interval, so up to two points are returned.
    pub fn intersect(&self, other: &LineSegment) -> Vec<Position> {
        match (self.form, other.form) {
            (
                Form::Vertical {
                    x,
                    y_min,
                    y_max,
                },
                Form::Vertical {
                    x: other_x,
                    y_min: other_y_min,
                    y_max: other_y_max,
                },
            ) => {
                if (x - other_x).abs() >= EPSILON {
                    return vec![];
                }
                overlap(y_min.max(other_y_min), y_max.min(other_y_max))
                    .into_iter()
                    .map(|y| Position::new(x, y))
                    .collect()
            }
            (Form::Vertical { x, y_min, y_max }, Form::Sloped { .. }) => {
                vertical_crossing(x, y_min, y_max, other)
            }
            (Form::Sloped { .. }, Form::Vertical { x, y_min, y_max }) => {
                vertical_crossing(x, y_min, y_max, self)
            }
            (
                Form::Sloped {
                    slope,
                    intercept,
                    x_min,
                    x_max,
                },
                Form::Sloped {
                    slope: other_slope,
                    intercept: other_intercept,
                    x_min: other_x_min,
                    x_max: other_x_max,
                },
            ) => {
                if (slope - other_slope).abs() < EPSILON {
                    if (intercept - other_intercept).abs() >= EPSILON {
                        return vec![];
                    }
                    return overlap(x_min.max(other_x_min), x_max.min(other_x_max))
                        .into_iter()
                        .map(|x| Position::new(x, slope * x + intercept))
                        .collect();
                }
                let x = (other_intercept - intercept) / (slope - other_slope);
                if within(x, x_min, x_max) && within(x, other_x_min, other_x_max) {
                    vec![Position::new(x, slope * x + intercept)]
                } else {
                    vec![]
                }
            }
        }
    }
}

fn vertical_crossing(x: f64, y_min: f64, y_max: f64, sloped: &LineSegment) -> Vec<Position> {
    let y = sloped.get_y(x);
    if y.is_finite() && within(y, y_min, y_max) {
        vec![Position::new(x, y)]
    } else {
        vec![]
    }
}

fn within(value: f64, min: f64, max: f64) -> bool {
    value + EPSILON >= min && value - EPSILON <= max
}

/// End points of `[low, high]`: none when empty, one when degenerate.
fn overlap(low: f64, high: f64) -> Vec<f64> {
    if high - low < -EPSILON {
        vec![]
    } else if (high - low).abs() <= EPSILON {
        vec![low]
    } else {
        vec![low, high]
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    const EPSILON: f64 = 1e-9;

    fn segment(x1: f64, y1: f64, x2: f64, y2: f64) -> LineSegment {
        LineSegment::new(Position::new(x1, y1), Position::new(x2, y2))
    }

    #[rstest]
    #[case::crossing(segment(0.0, 0.0, 10.0, 0.0), segment(5.0, -5.0, 5.0, 5.0), vec![Position::new(5.0, 0.0)])]
    #[case::crossing_swapped(segment(5.0, 5.0, 5.0, -5.0), segment(10.0, 0.0, 0.0, 0.0), vec![Position::new(5.0, 0.0)])]
    #[case::diagonals(segment(0.0, 0.0, 2.0, 2.0), segment(0.0, 2.0, 2.0, 0.0), vec![Position::new(1.0, 1.0)])]
    #[case::touching_end_points(segment(0.0, 0.0, 1.0, 1.0), segment(1.0, 1.0, 2.0, 0.0), vec![Position::new(1.0, 1.0)])]
    #[case::outside_domain(segment(0.0, 0.0, 1.0, 1.0), segment(3.0, 0.0, 4.0, -1.0), vec![])]
    #[case::parallel(segment(0.0, 0.0, 10.0, 0.0), segment(0.0, 1.0, 10.0, 1.0), vec![])]
    #[case::collinear_overlap(segment(0.0, 0.0, 10.0, 0.0), segment(5.0, 0.0, 15.0, 0.0), vec![Position::new(5.0, 0.0), Position::new(10.0, 0.0)])]
    #[case::collinear_disjoint(segment(0.0, 0.0, 1.0, 1.0), segment(2.0, 2.0, 3.0, 3.0), vec![])]
    #[case::collinear_single_point(segment(0.0, 0.0, 1.0, 1.0), segment(1.0, 1.0, 3.0, 3.0), vec![Position::new(1.0, 1.0)])]
    #[case::vertical_overlap(segment(2.0, 0.0, 2.0, 4.0), segment(2.0, 6.0, 2.0, 3.0), vec![Position::new(2.0, 3.0), Position::new(2.0, 4.0)])]
    #[case::vertical_apart(segment(2.0, 0.0, 2.0, 4.0), segment(3.0, 0.0, 3.0, 4.0), vec![])]
    #[case::vertical_misses_sloped(segment(0.0, 0.0, 10.0, 10.0), segment(5.0, 6.0, 5.0, 9.0), vec![])]
    #[case::vertical_outside_domain(segment(0.0, 0.0, 10.0, 10.0), segment(12.0, 0.0, 12.0, 20.0), vec![])]
    fn test_line_segment_intersect(
        #[case] a: LineSegment,
        #[case] b: LineSegment,
        #[case] expected: Vec<Position>,
    ) {
        let result = a.intersect(&b);
        assert_eq!(result.len(), expected.len(), "{result:?}");
        for (r, e) in result.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*r, *e, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_line_segment_intersect_is_symmetric() {
        let a = segment(-3.0, 1.0, 4.0, 2.5);
        let b = segment(0.5, -2.0, 1.0, 6.0);
        let ab = a.intersect(&b);
        let ba = b.intersect(&a);
        assert_eq!(ab.len(), 1);
        assert_abs_diff_eq!(ab[0], ba[0], epsilon = EPSILON);
    }

    #[rstest]
    #[case::inside(segment(0.0, 1.0, 4.0, 9.0), 2.0, 5.0)]
    #[case::reversed(segment(4.0, 9.0, 0.0, 1.0), 1.0, 3.0)]
    #[case::out_of_domain(segment(0.0, 1.0, 4.0, 9.0), 5.0, f64::INFINITY)]
    #[case::vertical(segment(1.0, 0.0, 1.0, 9.0), 1.0, f64::INFINITY)]
    fn test_line_segment_get_y(#[case] line: LineSegment, #[case] x: f64, #[case] expected: f64) {
        let y = line.get_y(x);
        if expected.is_infinite() {
            assert!(y.is_infinite());
        } else {
            assert_abs_diff_eq!(y, expected, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_line_segment_zero_length() {
        let point = segment(1.0, 1.0, 1.0, 1.0);
        assert!(point.is_vertical());
        assert_eq!(point.intersect(&segment(0.0, 0.0, 2.0, 2.0)), vec![Position::new(1.0, 1.0)]);
        assert!(point.intersect(&segment(0.0, 0.0, 2.0, 0.0)).is_empty());
        assert_abs_diff_eq!(point.length(), 0.0);
    }
}
