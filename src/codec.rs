//! Property string codec
//!
//! Game definition properties are stored as strings. Vectors and colors are
//! whitespace separated component lists (`"1 0.5 2"`), booleans accept
//! `1`/`0`/`true`/`false`. Decoders return `None` on malformed input so callers
//! can log and substitute their default.

use glam::{DVec3, EulerRot, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Linear RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    #[serde(default = "default_alpha")]
    pub a: f32,
}

fn default_alpha() -> f32 {
    1.0
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Component-wise comparison with a small tolerance
    pub fn is_equal_to(&self, other: &Color) -> bool {
        const THRESHOLD: f32 = 1e-3;
        (self.r - other.r).abs() < THRESHOLD
            && (self.g - other.g).abs() < THRESHOLD
            && (self.b - other.b).abs() < THRESHOLD
            && (self.a - other.a).abs() < THRESHOLD
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

fn decode_floats(value: &str) -> Option<Vec<f64>> {
    value
        .split_whitespace()
        .map(|part| part.parse::<f64>().ok())
        .collect()
}

/// Decode `"x y z"`
pub fn decode_vector(value: &str) -> Option<Vec3> {
    match decode_floats(value)?.as_slice() {
        [x, y, z] => Some(Vec3::new(*x as f32, *y as f32, *z as f32)),
        _ => None,
    }
}

/// Decode `"x y z"` at double precision
pub fn decode_dvector(value: &str) -> Option<DVec3> {
    match decode_floats(value)?.as_slice() {
        [x, y, z] => Some(DVec3::new(*x, *y, *z)),
        _ => None,
    }
}

/// Decode `"x y"`
pub fn decode_vector2(value: &str) -> Option<Vec2> {
    match decode_floats(value)?.as_slice() {
        [x, y] => Some(Vec2::new(*x as f32, *y as f32)),
        _ => None,
    }
}

/// Decode `"r g b"` (alpha 1)
pub fn decode_color3(value: &str) -> Option<Color> {
    match decode_floats(value)?.as_slice() {
        [r, g, b] => Some(Color::rgb(*r as f32, *g as f32, *b as f32)),
        _ => None,
    }
}

/// Decode `"r g b a"`, also accepting `"r g b"`
pub fn decode_color4(value: &str) -> Option<Color> {
    match decode_floats(value)?.as_slice() {
        [r, g, b] => Some(Color::rgb(*r as f32, *g as f32, *b as f32)),
        [r, g, b, a] => Some(Color::rgba(*r as f32, *g as f32, *b as f32, *a as f32)),
        _ => None,
    }
}

pub fn decode_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" => Some(true),
        "false" | "no" => Some(false),
        _ => value.parse::<i64>().ok().map(|v| v != 0),
    }
}

pub fn decode_float(value: &str) -> Option<f32> {
    value.trim().parse::<f32>().ok()
}

pub fn decode_int(value: &str) -> Option<i32> {
    value.trim().parse::<i32>().ok()
}

/// Orientation from Euler angles in degrees, applied z, x then y
pub fn euler_to_quat(degrees: Vec3) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        degrees.y.to_radians(),
        degrees.x.to_radians(),
        degrees.z.to_radians(),
    )
}

/// Euler angles in degrees of an orientation
pub fn quat_to_euler(orientation: Quat) -> Vec3 {
    let (y, x, z) = orientation.to_euler(EulerRot::YXZ);
    Vec3::new(x.to_degrees(), y.to_degrees(), z.to_degrees())
}

pub fn encode_vector(value: Vec3) -> String {
    format!("{} {} {}", value.x, value.y, value.z)
}

pub fn encode_color(value: Color) -> String {
    if value.a == 1.0 {
        format!("{} {} {}", value.r, value.g, value.b)
    } else {
        format!("{} {} {} {}", value.r, value.g, value.b, value.a)
    }
}

pub fn encode_bool(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_vector() {
        assert_eq!(decode_vector("1 2.5 -3"), Some(Vec3::new(1.0, 2.5, -3.0)));
        assert_eq!(decode_vector("  1\t2 3 "), Some(Vec3::new(1.0, 2.0, 3.0)));
        assert_eq!(decode_vector("1 2"), None);
        assert_eq!(decode_vector("1 x 3"), None);
    }

    #[test]
    fn test_decode_color() {
        assert_eq!(decode_color3("1 0 0"), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(decode_color4("1 0 0 0.5"), Some(Color::rgba(1.0, 0.0, 0.0, 0.5)));
        assert_eq!(decode_color4("1 0 0"), Some(Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(decode_color3("1 0 0 0.5"), None);
    }

    #[test]
    fn test_decode_bool() {
        assert_eq!(decode_bool("1"), Some(true));
        assert_eq!(decode_bool("0"), Some(false));
        assert_eq!(decode_bool("True"), Some(true));
        assert_eq!(decode_bool("maybe"), None);
    }

    #[test]
    fn test_euler_rotation() {
        let q = euler_to_quat(Vec3::new(0.0, 90.0, 0.0));
        let v = q * Vec3::X;
        assert!((v - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-5);

        let angles = quat_to_euler(euler_to_quat(Vec3::new(10.0, 20.0, 30.0)));
        assert!((angles - Vec3::new(10.0, 20.0, 30.0)).length() < 1e-3);
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode_vector(Vec3::new(1.0, 2.0, 3.0)), "1 2 3");
        assert_eq!(encode_color(Color::rgb(1.0, 0.5, 0.0)), "1 0.5 0");
        assert_eq!(decode_vector(&encode_vector(Vec3::new(0.25, -1.0, 8.0))), Some(Vec3::new(0.25, -1.0, 8.0)));
    }
}
