/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Distance from a surface below which a point is considered on it.
///
/// Every boundary membership test goes through this single value.
pub const ON_SURFACE_THRESH: f64 = 1e-12;

/// Nudge applied along a ray to step off a surface just crossed.
pub const TINY_MOVE: f64 = 1e-10;

/// Unit direction of a ray given its azimuthal and polar angles.
#[must_use]
pub fn direction(azim: f64, polar: f64) -> Vector3 {
    let sin_polar = polar.sin();
    Vector3::new(sin_polar * azim.cos(), sin_polar * azim.sin(), polar.cos())
}
