pub mod geometry;
pub mod shader;
pub mod texture;

pub mod prelude {
    pub use super::shader::{
        DrawMode, ShaderDescriptor, ShaderHandle, ShaderStage, UniformVariable, Uniforms,
    };

    pub use super::texture::{
        Bitmap, CompressedFormat, CompressedImage, SamplerParams, Texture, TextureFilter,
        TextureHandle, TextureTarget, TextureWrap,
    };

    pub use super::geometry::{
        Geometry, VertexAttribute, VertexLayout, INSTANCE_ATTRIBUTE, INSTANCE_ATTRIBUTE_SIZE,
    };
}
