use geo::Coord;

/// The outer boundary of a region as an explicitly closed loop.
///
/// Vertices are stored as given; the edge from the last vertex back to the
/// first is always part of the ring, whether or not the source repeats the
/// first vertex at the end. Holes are not represented.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Ring {
    vertices: Vec<Coord<f64>>,
}

impl Ring {
    pub fn new(vertices: Vec<Coord<f64>>) -> Self {
        Self { vertices }
    }

    pub fn from_positions(positions: &[Vec<f64>]) -> Self {
        let vertices = positions
            .iter()
            .filter(|p| p.len() >= 2)
            .map(|p| Coord { x: p[0], y: p[1] })
            .collect();
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Coord<f64>] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Every edge `(v[j], v[i])` with `j = i - 1`, starting with the
    /// closing edge `(v[n-1], v[0])`.
    pub fn edges(&self) -> impl Iterator<Item = (Coord<f64>, Coord<f64>)> + '_ {
        let closing = self.vertices.last().copied();
        closing
            .into_iter()
            .chain(self.vertices.iter().copied())
            .zip(self.vertices.iter().copied())
    }

    /// Crossing-number test: casts a horizontal ray from `point` and counts
    /// edge crossings, odd meaning inside.
    ///
    /// Points exactly on an edge or vertex get a deterministic but
    /// unspecified answer that may differ between equivalent rings.
    pub fn contains(&self, point: Coord<f64>) -> bool {
        let mut inside = false;
        for (a, b) in self.edges() {
            if (b.y > point.y) != (a.y > point.y)
                && point.x < (a.x - b.x) * (point.y - b.y) / (a.y - b.y) + b.x
            {
                inside = !inside;
            }
        }
        inside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn square() -> Vec<Coord<f64>> {
        vec![c(0.0, 0.0), c(4.0, 0.0), c(4.0, 4.0), c(0.0, 4.0)]
    }

    fn concave() -> Vec<Coord<f64>> {
        // U shape opening upward
        vec![
            c(0.0, 0.0),
            c(6.0, 0.0),
            c(6.0, 6.0),
            c(4.0, 6.0),
            c(4.0, 2.0),
            c(2.0, 2.0),
            c(2.0, 6.0),
            c(0.0, 6.0),
        ]
    }

    #[test]
    fn edges_include_the_closing_edge() {
        let ring = Ring::new(square());
        let edges: Vec<_> = ring.edges().collect();
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[0], (c(0.0, 4.0), c(0.0, 0.0)));
        assert_eq!(edges[3], (c(4.0, 4.0), c(0.0, 4.0)));
    }

    #[test]
    fn interior_and_exterior_points() {
        let ring = Ring::new(square());
        assert!(ring.contains(c(2.0, 2.0)));
        assert!(!ring.contains(c(5.0, 2.0)));
        assert!(!ring.contains(c(-1.0, 2.0)));
        assert!(!ring.contains(c(2.0, 5.0)));
    }

    #[test]
    fn concave_notch_is_outside() {
        let ring = Ring::new(concave());
        assert!(ring.contains(c(1.0, 5.0)));
        assert!(ring.contains(c(5.0, 5.0)));
        assert!(ring.contains(c(3.0, 1.0)));
        assert!(!ring.contains(c(3.0, 4.0)));
    }

    #[test]
    fn repeated_closing_vertex_changes_nothing() {
        let mut closed = square();
        closed.push(c(0.0, 0.0));
        let open = Ring::new(square());
        let closed = Ring::new(closed);
        for p in [c(2.0, 2.0), c(5.0, 1.0), c(0.5, 3.5), c(-0.1, 0.1)] {
            assert_eq!(open.contains(p), closed.contains(p));
        }
    }

    #[test]
    fn containment_is_invariant_under_rotation() {
        let vertices = concave();
        let points = [
            c(1.0, 5.0),
            c(3.0, 4.0),
            c(3.0, 1.0),
            c(7.0, 3.0),
            c(5.5, 0.5),
            c(-1.0, -1.0),
        ];
        let original = Ring::new(vertices.clone());
        let expected: Vec<bool> = points.iter().map(|p| original.contains(*p)).collect();
        for shift in 1..vertices.len() {
            let mut rotated = vertices.clone();
            rotated.rotate_left(shift);
            let ring = Ring::new(rotated);
            let got: Vec<bool> = points.iter().map(|p| ring.contains(*p)).collect();
            assert_eq!(got, expected, "rotation by {shift}");
        }
    }

    #[test]
    fn vertex_coincident_point_is_deterministic() {
        let ring = Ring::new(vec![c(127.0, 37.5), c(127.1, 37.5), c(127.1, 37.6), c(127.0, 37.6)]);
        let first = ring.contains(c(127.0, 37.5));
        for _ in 0..10 {
            assert_eq!(ring.contains(c(127.0, 37.5)), first);
        }
    }

    #[test]
    fn degenerate_rings_contain_nothing() {
        assert!(!Ring::default().contains(c(0.0, 0.0)));
        assert!(!Ring::new(vec![c(0.0, 0.0)]).contains(c(0.0, 0.0)));
    }

    #[test]
    fn short_positions_are_skipped() {
        let ring = Ring::from_positions(&[vec![1.0, 2.0], vec![3.0], vec![4.0, 5.0, 9.0]]);
        assert_eq!(ring.vertices(), &[c(1.0, 2.0), c(4.0, 5.0)]);
    }
}
