//! CPU-side mesh description. A `Geometry` is immutable once built; the GPU
//! buffers realized from it are cached by its `uid`.

use smallvec::SmallVec;
use uuid::Uuid;

/// Name of the per-instance attribute fed from an instance buffer.
pub const INSTANCE_ATTRIBUTE: &str = "aTransform";

/// Components per instance of the `INSTANCE_ATTRIBUTE`.
pub const INSTANCE_ATTRIBUTE_SIZE: u8 = 4;

/// One entry of the vertex layout: the shader attribute name and the number of
/// f32 components it reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexAttribute {
    pub attribute: String,
    pub size: u8,
}

impl VertexAttribute {
    pub fn new<T: Into<String>>(attribute: T, size: u8) -> Self {
        VertexAttribute {
            attribute: attribute.into(),
            size,
        }
    }
}

pub type VertexLayout = SmallVec<[VertexAttribute; 4]>;

/// Returns the default layout, `aPosition`(3), `aTexCoords`(2), `aNormals`(3).
pub fn default_layout() -> VertexLayout {
    let mut layout = VertexLayout::new();
    layout.push(VertexAttribute::new("aPosition", 3));
    layout.push(VertexAttribute::new("aTexCoords", 2));
    layout.push(VertexAttribute::new("aNormals", 3));
    layout
}

#[derive(Debug, Clone)]
pub struct Geometry {
    pub uid: Uuid,
    pub vertices: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u16>,
    pub attributes: VertexLayout,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            uid: Uuid::new_v4(),
            vertices: Vec::new(),
            uvs: Vec::new(),
            normals: Vec::new(),
            indices: Vec::new(),
            attributes: default_layout(),
        }
    }
}

impl Geometry {
    pub fn new(vertices: Vec<[f32; 3]>, uvs: Vec<[f32; 2]>, normals: Vec<[f32; 3]>) -> Self {
        Geometry {
            vertices,
            uvs,
            normals,
            ..Default::default()
        }
    }

    pub fn with_indices(mut self, indices: Vec<u16>) -> Self {
        self.indices = indices;
        self
    }

    pub fn with_attributes(mut self, attributes: VertexLayout) -> Self {
        self.attributes = attributes;
        self
    }

    /// The number of f32 components of one interleaved vertex.
    pub fn components(&self) -> usize {
        self.attributes.iter().map(|v| v.size as usize).sum()
    }

    /// The byte distance between two consecutive vertices.
    #[inline]
    pub fn stride(&self) -> usize {
        self.components() * 4
    }

    /// Returns every layout entry with its byte offset into a vertex.
    pub fn offsets(&self) -> Vec<(&VertexAttribute, usize)> {
        let mut offset = 0;
        self.attributes
            .iter()
            .map(|v| {
                let current = offset;
                offset += v.size as usize * 4;
                (v, current)
            })
            .collect()
    }

    /// Interleaves the vertex streams. The i-th layout entry reads the i-th
    /// stream of `(vertices, uvs, normals)`, truncated or zero-padded to its
    /// size.
    pub fn interleave(&self) -> Vec<f32> {
        let mut buf = Vec::with_capacity(self.vertices.len() * self.components());

        for (v, position) in self.vertices.iter().enumerate() {
            for (i, attribute) in self.attributes.iter().enumerate() {
                let stream: &[f32] = match i {
                    0 => &position[..],
                    1 => self.uvs.get(v).map(|v| &v[..]).unwrap_or(&[]),
                    2 => self.normals.get(v).map(|v| &v[..]).unwrap_or(&[]),
                    _ => &[],
                };

                for c in 0..attribute.size as usize {
                    buf.push(stream.get(c).cloned().unwrap_or(0.0));
                }
            }
        }

        buf
    }

    /// The number of vertices a non-indexed draw submits.
    pub fn vertex_count(&self) -> usize {
        if self.components() == 0 {
            0
        } else {
            self.vertices.len()
        }
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        !self.indices.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn layout() {
        let geo = Geometry::default();
        assert_eq!(geo.components(), 8);
        assert_eq!(geo.stride(), 32);

        let offsets: Vec<_> = geo
            .offsets()
            .into_iter()
            .map(|(v, o)| (v.attribute.as_str(), o))
            .collect();
        assert_eq!(
            offsets,
            vec![("aPosition", 0), ("aTexCoords", 12), ("aNormals", 20)]
        );
    }

    #[test]
    fn interleave() {
        let geo = Geometry::new(
            vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            vec![[0.5, 0.5]],
            vec![],
        );

        assert_eq!(
            geo.interleave(),
            vec![
                1.0, 2.0, 3.0, 0.5, 0.5, 0.0, 0.0, 0.0, //
                4.0, 5.0, 6.0, 0.0, 0.0, 0.0, 0.0, 0.0,
            ]
        );
        assert_eq!(geo.vertex_count(), 2);
    }

    #[test]
    fn truncate() {
        let mut layout = VertexLayout::new();
        layout.push(VertexAttribute::new("aPosition", 2));

        let geo = Geometry::new(vec![[1.0, 2.0, 3.0]], vec![], vec![]).with_attributes(layout);
        assert_eq!(geo.interleave(), vec![1.0, 2.0]);
        assert_eq!(geo.stride(), 8);
    }
}
