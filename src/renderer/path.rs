//! Conveyor path
//!
//! Closed Catmull-Rom loop through the belt's corner points, sampled by
//! arc length so that equal progress steps cover equal distance.

use glam::DVec3;

/// Belt loop control points: top run left to right, then back underneath
pub const CONVEYOR_POINTS: [DVec3; 4] = [
    DVec3::new(-16.0, 0.1, 0.0),
    DVec3::new(16.0, 0.1, 0.0),
    DVec3::new(16.0, -1.0, 0.0),
    DVec3::new(-16.0, -1.0, 0.0),
];

pub const CONVEYOR_TENSION: f64 = 0.1;

/// Samples used to build the arc-length table
const ARC_LENGTH_DIVISIONS: usize = 200;

/// Step for finite-difference tangents
const TANGENT_DELTA: f64 = 1e-4;

/// Closed Catmull-Rom spline with an arc-length lookup table
#[derive(Debug, Clone)]
pub struct ConveyorPath {
    points: Vec<DVec3>,
    tension: f64,
    /// Cumulative length at each of `ARC_LENGTH_DIVISIONS + 1` samples
    lengths: Vec<f64>,
}

impl Default for ConveyorPath {
    fn default() -> Self {
        Self::build(CONVEYOR_POINTS.to_vec(), CONVEYOR_TENSION)
    }
}

impl ConveyorPath {
    /// Build a closed loop, or `None` with fewer than two points
    pub fn new(points: Vec<DVec3>, tension: f64) -> Option<Self> {
        (points.len() >= 2).then(|| Self::build(points, tension))
    }

    fn build(points: Vec<DVec3>, tension: f64) -> Self {
        let mut path = Self {
            points,
            tension,
            lengths: Vec::new(),
        };
        path.lengths = path.build_lengths();
        path
    }

    pub fn length(&self) -> f64 {
        self.lengths.last().copied().unwrap_or(0.0)
    }

    /// Position at raw spline parameter `t` (not arc length)
    pub fn point(&self, t: f64) -> DVec3 {
        let n = self.points.len();
        let p = n as f64 * t.rem_euclid(1.0);
        let segment = (p.floor() as usize).min(n - 1);
        let weight = p - segment as f64;

        let p0 = self.points[(segment + n - 1) % n];
        let p1 = self.points[segment];
        let p2 = self.points[(segment + 1) % n];
        let p3 = self.points[(segment + 2) % n];

        hermite(p1, p2, (p2 - p0) * self.tension, (p3 - p1) * self.tension, weight)
    }

    /// Position at arc-length fraction `u`, wrapping around the loop
    pub fn point_at(&self, u: f64) -> DVec3 {
        self.point(self.u_to_t(u))
    }

    /// Unit direction of travel at arc-length fraction `u`
    pub fn tangent_at(&self, u: f64) -> DVec3 {
        let t = self.u_to_t(u);
        let t1 = (t - TANGENT_DELTA).max(0.0);
        let t2 = (t + TANGENT_DELTA).min(1.0);
        (self.point(t2) - self.point(t1)).normalize_or_zero()
    }

    fn build_lengths(&self) -> Vec<f64> {
        let mut lengths = Vec::with_capacity(ARC_LENGTH_DIVISIONS + 1);
        let mut sum = 0.0;
        let mut last = self.point(0.0);
        lengths.push(0.0);
        for i in 1..=ARC_LENGTH_DIVISIONS {
            let current = self.point(i as f64 / ARC_LENGTH_DIVISIONS as f64);
            sum += current.distance(last);
            lengths.push(sum);
            last = current;
        }
        lengths
    }

    /// Map an arc-length fraction to the spline parameter covering it
    fn u_to_t(&self, u: f64) -> f64 {
        // 1.0 is the end of the loop, not the start
        let u = if u == 1.0 { 1.0 } else { u.rem_euclid(1.0) };
        let target = u * self.length();

        // Last sample at or below the target
        let i = self
            .lengths
            .partition_point(|&l| l <= target)
            .saturating_sub(1)
            .min(ARC_LENGTH_DIVISIONS - 1);

        let before = self.lengths[i];
        let segment = self.lengths[i + 1] - before;
        let fraction = if segment > 0.0 {
            (target - before) / segment
        } else {
            0.0
        };
        (i as f64 + fraction) / ARC_LENGTH_DIVISIONS as f64
    }
}

/// Cubic Hermite segment from `x0` to `x1` with end tangents `t0`, `t1`
fn hermite(x0: DVec3, x1: DVec3, t0: DVec3, t1: DVec3, w: f64) -> DVec3 {
    let c2 = -3.0 * x0 + 3.0 * x1 - 2.0 * t0 - t1;
    let c3 = 2.0 * x0 - 2.0 * x1 + t0 + t1;
    x0 + t0 * w + c2 * (w * w) + c3 * (w * w * w)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: DVec3, b: DVec3) -> bool {
        a.distance(b) < 1e-9
    }

    #[test]
    fn test_passes_through_control_points() {
        let path = ConveyorPath::default();
        for (i, p) in CONVEYOR_POINTS.iter().enumerate() {
            assert!(close(path.point(i as f64 / 4.0), *p));
        }
    }

    #[test]
    fn test_loop_is_closed() {
        let path = ConveyorPath::default();
        assert!(close(path.point_at(0.0), CONVEYOR_POINTS[0]));
        assert!(close(path.point_at(1.0), CONVEYOR_POINTS[0]));
        assert!(close(path.point_at(1.25), path.point_at(0.25)));
    }

    #[test]
    fn test_rejects_degenerate_loop() {
        assert!(ConveyorPath::new(vec![DVec3::ZERO], 0.5).is_none());
        assert!(ConveyorPath::new(CONVEYOR_POINTS.to_vec(), 0.5).is_some());
    }

    #[test]
    fn test_length_includes_end_bulges() {
        // Straight runs are 32 each; the turns bulge outward past x = 16
        let length = ConveyorPath::default().length();
        assert!(length > 67.5 && length < 69.0, "length {}", length);
    }

    #[test]
    fn test_arc_length_spacing_is_even() {
        let path = ConveyorPath::default();
        let step = 1.0 / 100.0;
        let expected = path.length() * step;
        // Top run only; chords across the turns are shorter than the arc
        for i in 5..40 {
            let u = i as f64 * step;
            let d = path.point_at(u).distance(path.point_at(u + step));
            assert!((d - expected).abs() < expected * 0.01, "step {} was {}", i, d);
        }
    }

    #[test]
    fn test_stations_evenly_spread_on_top_run() {
        let path = ConveyorPath::default();
        let xs: Vec<f64> = (0..7).map(|i| path.point_at(crate::station_stage(i)).x).collect();
        for pair in xs.windows(2) {
            assert!((pair[1] - pair[0] - 4.27).abs() < 0.05, "{:?}", xs);
        }
    }

    #[test]
    fn test_top_run_moves_along_x() {
        let path = ConveyorPath::default();
        let tangent = path.tangent_at(0.125);
        assert!(tangent.x > 0.99);
        assert!((tangent.length() - 1.0).abs() < 1e-9);

        // Return run heads back the other way
        assert!(path.tangent_at(0.75).x < -0.99);
    }
}
