//! # Common Types
//!
//! Common value types shared across the campfire modules: colors as stored
//! in room/player documents, and the minimal spatial types the reconciler
//! needs to place avatars around the fire.

use std::fmt;

use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};

/// RGB color, stored in documents as a `#rrggbb` hex string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` hex string
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&digits[0..2], 16).ok()?;
        let g = u8::from_str_radix(&digits[2..4], 16).ok()?;
        let b = u8::from_str_radix(&digits[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    /// Format as a `#rrggbb` hex string
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Components scaled to [0, 1], the form the fire-color lerp works in
    pub fn to_unit_rgb(&self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Color::from_hex(&hex)
            .ok_or_else(|| de::Error::custom(format!("invalid color string: {hex}")))
    }
}

/// Vector3 in scene space (y up, fire at the origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }
}

/// Position plus facing for a renderable instance. Yaw is the rotation
/// around the y axis; avatars around the fire face the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vector3,
    pub yaw: f32,
}

impl Transform {
    pub fn new(position: Vector3, yaw: f32) -> Self {
        Self { position, yaw }
    }

    pub fn identity() -> Self {
        Self { position: Vector3::zero(), yaw: 0.0 }
    }

    /// Place on a ring of the given radius at `angle`, facing the center.
    pub fn on_ring(angle: f32, radius: f32) -> Self {
        Self {
            position: Vector3::new(angle.sin() * radius, 0.0, angle.cos() * radius),
            yaw: angle + std::f32::consts::PI,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_round_trips_through_hex() {
        let c = Color::from_hex("#ff6600").unwrap();
        assert_eq!(c, Color::new(0xff, 0x66, 0x00));
        assert_eq!(c.to_hex(), "#ff6600");
    }

    #[test]
    fn color_rejects_malformed_strings() {
        assert!(Color::from_hex("ff6600").is_none());
        assert!(Color::from_hex("#ff660").is_none());
        assert!(Color::from_hex("#gg6600").is_none());
    }

    #[test]
    fn ring_transform_faces_center() {
        let t = Transform::on_ring(0.0, 4.5);
        assert!((t.position.z - 4.5).abs() < 1e-6);
        assert!((t.yaw - std::f32::consts::PI).abs() < 1e-6);
    }
}
