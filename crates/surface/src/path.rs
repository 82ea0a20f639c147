use std::fmt::Write as _;

use foundation::math::Vec2;
use foundation::math::precision::format_coord;

/// Decimal places kept when serializing coordinates.
pub const PATH_PRECISION: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    ClosePath,
    /// A full circle, as a standalone subpath.
    Circle { center: Vec2, radius: f64 },
}

/// Screen-space path in CSS pixels, shared by both surfaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Path {
    commands: Vec<PathCommand>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn circle(center: Vec2, radius: f64) -> Self {
        let mut p = Self::new();
        p.push_circle(center, radius);
        p
    }

    pub fn move_to(&mut self, p: Vec2) {
        self.commands.push(PathCommand::MoveTo(p));
    }

    pub fn line_to(&mut self, p: Vec2) {
        self.commands.push(PathCommand::LineTo(p));
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::ClosePath);
    }

    pub fn push_circle(&mut self, center: Vec2, radius: f64) {
        self.commands.push(PathCommand::Circle { center, radius });
    }

    /// Appends a polyline; closes it when `closed`. Fewer than two points is a no-op.
    pub fn push_polyline(&mut self, points: &[Vec2], closed: bool) {
        let [first, rest @ ..] = points else {
            return;
        };
        if rest.is_empty() {
            return;
        }
        self.move_to(*first);
        for p in rest {
            self.line_to(*p);
        }
        if closed {
            self.close();
        }
    }

    pub fn extend(&mut self, other: &Path) {
        self.commands.extend_from_slice(&other.commands);
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of subpaths (each `MoveTo` or `Circle` starts one).
    pub fn subpath_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, PathCommand::MoveTo(_) | PathCommand::Circle { .. }))
            .count()
    }

    /// SVG path data. Circles become two half-circle arcs.
    pub fn to_svg_d(&self) -> String {
        let mut d = String::new();
        for cmd in &self.commands {
            match *cmd {
                PathCommand::MoveTo(p) => push_point(&mut d, 'M', p),
                PathCommand::LineTo(p) => push_point(&mut d, 'L', p),
                PathCommand::ClosePath => d.push('Z'),
                PathCommand::Circle { center, radius } => {
                    let r = format_coord(radius, PATH_PRECISION);
                    push_point(&mut d, 'M', Vec2::new(center.x, center.y - radius));
                    let _ = write!(
                        d,
                        "a{r},{r} 0 1,1 0,{}a{r},{r} 0 1,1 0,{}",
                        format_coord(2.0 * radius, PATH_PRECISION),
                        format_coord(-2.0 * radius, PATH_PRECISION),
                    );
                }
            }
        }
        d
    }
}

fn push_point(d: &mut String, op: char, p: Vec2) {
    let _ = write!(
        d,
        "{op}{},{}",
        format_coord(p.x, PATH_PRECISION),
        format_coord(p.y, PATH_PRECISION)
    );
}

#[cfg(test)]
mod tests {
    use super::Path;
    use foundation::math::Vec2;

    #[test]
    fn polyline_serializes_to_svg() {
        let mut p = Path::new();
        p.push_polyline(&[Vec2::new(0.0, 0.0), Vec2::new(10.5, 0.0), Vec2::new(10.5, 4.25)], true);
        assert_eq!(p.to_svg_d(), "M0,0L10.5,0L10.5,4.25Z");
        assert_eq!(p.subpath_count(), 1);
    }

    #[test]
    fn single_point_polyline_is_dropped() {
        let mut p = Path::new();
        p.push_polyline(&[Vec2::new(1.0, 1.0)], false);
        assert!(p.is_empty());
        assert_eq!(p.to_svg_d(), "");
    }

    #[test]
    fn circle_is_two_arcs() {
        let p = Path::circle(Vec2::new(10.0, 20.0), 4.5);
        assert_eq!(p.to_svg_d(), "M10,15.5a4.5,4.5 0 1,1 0,9a4.5,4.5 0 1,1 0,-9");
    }
}
