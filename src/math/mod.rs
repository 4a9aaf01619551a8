//! Math types re-exported from `cgmath`, plus the RGBA `Color` used for clear
//! and background colors.

pub use cgmath::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};

pub mod color;
pub use self::color::Color;
