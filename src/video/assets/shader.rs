//! Shader descriptors and the uniform values pushed into linked programs.

use std::str::FromStr;

use smallvec::SmallVec;

use crate::errors::{Error, Result};
use crate::math::{Matrix2, Matrix3, Matrix4, Vector2, Vector3, Vector4};

impl_handle!(ShaderHandle);

/// The programmable stages a `ShaderDescriptor` provides sources for.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// The primitive topology used when a geometry is drawn with a shader.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum DrawMode {
    Points,
    Lines,
    LineLoop,
    LineStrip,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

impl Default for DrawMode {
    fn default() -> Self {
        DrawMode::Triangles
    }
}

impl FromStr for DrawMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "POINTS" => Ok(DrawMode::Points),
            "LINES" => Ok(DrawMode::Lines),
            "LINE_LOOP" => Ok(DrawMode::LineLoop),
            "LINE_STRIP" => Ok(DrawMode::LineStrip),
            "TRIANGLES" => Ok(DrawMode::Triangles),
            "TRIANGLE_STRIP" => Ok(DrawMode::TriangleStrip),
            "TRIANGLE_FAN" => Ok(DrawMode::TriangleFan),
            _ => Err(Error::Config(format!("Undefined draw mode '{}'.", s))),
        }
    }
}

/// Describes a shader program: its stage sources, the custom uniforms it wants
/// applied before every draw and the topology it renders with.
///
/// Implementors are registered with `RenderContext::create_shader`, which keeps
/// the descriptor alive and compiles it lazily on first use.
pub trait ShaderDescriptor {
    fn vertex_source(&self) -> &str;

    fn fragment_source(&self) -> &str;

    /// Uniform values bound to the program before each draw, when present.
    fn custom_uniforms(&self) -> Option<Uniforms> {
        None
    }

    fn draw_mode(&self) -> DrawMode {
        DrawMode::Triangles
    }
}

/// Uniform variable for program objects. Matrices are supplied in column major
/// order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformVariable {
    Bool(bool),
    I32(i32),
    F32(f32),
    Vector2f([f32; 2]),
    Vector3f([f32; 3]),
    Vector4f([f32; 4]),
    Matrix2f([[f32; 2]; 2]),
    Matrix3f([[f32; 3]; 3]),
    Matrix4f([[f32; 4]; 4]),
}

impl From<bool> for UniformVariable {
    fn from(v: bool) -> Self {
        UniformVariable::Bool(v)
    }
}

impl From<i32> for UniformVariable {
    fn from(v: i32) -> Self {
        UniformVariable::I32(v)
    }
}

impl From<f32> for UniformVariable {
    fn from(v: f32) -> Self {
        UniformVariable::F32(v)
    }
}

impl From<[f32; 2]> for UniformVariable {
    fn from(v: [f32; 2]) -> Self {
        UniformVariable::Vector2f(v)
    }
}

impl From<Vector2<f32>> for UniformVariable {
    fn from(v: Vector2<f32>) -> Self {
        UniformVariable::Vector2f(*v.as_ref())
    }
}

impl From<[f32; 3]> for UniformVariable {
    fn from(v: [f32; 3]) -> Self {
        UniformVariable::Vector3f(v)
    }
}

impl From<Vector3<f32>> for UniformVariable {
    fn from(v: Vector3<f32>) -> Self {
        UniformVariable::Vector3f(*v.as_ref())
    }
}

impl From<[f32; 4]> for UniformVariable {
    fn from(v: [f32; 4]) -> Self {
        UniformVariable::Vector4f(v)
    }
}

impl From<Vector4<f32>> for UniformVariable {
    fn from(v: Vector4<f32>) -> Self {
        UniformVariable::Vector4f(*v.as_ref())
    }
}

impl From<[[f32; 2]; 2]> for UniformVariable {
    fn from(v: [[f32; 2]; 2]) -> Self {
        UniformVariable::Matrix2f(v)
    }
}

impl From<Matrix2<f32>> for UniformVariable {
    fn from(v: Matrix2<f32>) -> Self {
        UniformVariable::Matrix2f(*v.as_ref())
    }
}

impl From<[[f32; 3]; 3]> for UniformVariable {
    fn from(v: [[f32; 3]; 3]) -> Self {
        UniformVariable::Matrix3f(v)
    }
}

impl From<Matrix3<f32>> for UniformVariable {
    fn from(v: Matrix3<f32>) -> Self {
        UniformVariable::Matrix3f(*v.as_ref())
    }
}

impl From<[[f32; 4]; 4]> for UniformVariable {
    fn from(v: [[f32; 4]; 4]) -> Self {
        UniformVariable::Matrix4f(v)
    }
}

impl From<Matrix4<f32>> for UniformVariable {
    fn from(v: Matrix4<f32>) -> Self {
        UniformVariable::Matrix4f(*v.as_ref())
    }
}

/// An ordered set of named uniform values. Setting a name twice keeps the last
/// value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Uniforms(SmallVec<[(String, UniformVariable); 8]>);

impl Uniforms {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with<T1, T2>(mut self, name: T1, value: T2) -> Self
    where
        T1: Into<String>,
        T2: Into<UniformVariable>,
    {
        self.set(name, value);
        self
    }

    pub fn set<T1, T2>(&mut self, name: T1, value: T2)
    where
        T1: Into<String>,
        T2: Into<UniformVariable>,
    {
        let name = name.into();
        let value = value.into();

        for v in self.0.iter_mut() {
            if v.0 == name {
                v.1 = value;
                return;
            }
        }

        self.0.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<UniformVariable> {
        self.0.iter().find(|v| v.0 == name).map(|v| v.1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, UniformVariable)> {
        self.0.iter().map(|v| (v.0.as_str(), v.1))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn draw_mode() {
        assert_eq!("TRIANGLES".parse::<DrawMode>().unwrap(), DrawMode::Triangles);
        assert_eq!("LINE_LOOP".parse::<DrawMode>().unwrap(), DrawMode::LineLoop);
        assert!("triangles".parse::<DrawMode>().is_err());
        assert_eq!(DrawMode::default(), DrawMode::Triangles);
    }

    #[test]
    fn uniforms() {
        let uniforms = Uniforms::new()
            .with("brightness", 0.5f32)
            .with("chromaKey", [0.0, 1.0, 0.0])
            .with("brightness", 0.25f32);

        assert_eq!(uniforms.len(), 2);
        assert_eq!(uniforms.get("brightness"), Some(UniformVariable::F32(0.25)));
        assert_eq!(
            uniforms.get("chromaKey"),
            Some(UniformVariable::Vector3f([0.0, 1.0, 0.0]))
        );
        assert_eq!(uniforms.get("contrast"), None);

        let names: Vec<_> = uniforms.iter().map(|v| v.0).collect();
        assert_eq!(names, vec!["brightness", "chromaKey"]);
    }

    #[test]
    fn matrix() {
        let m = Matrix2::new(1.0f32, 2.0, 3.0, 4.0);
        assert_eq!(
            UniformVariable::from(m),
            UniformVariable::Matrix2f([[1.0, 2.0], [3.0, 4.0]])
        );
    }
}
