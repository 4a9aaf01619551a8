//! The backend of renderer, which should be responsible for only one thing:
//! forwarding low-level video calls to a driver.
//!
//! A `Surface` is the drawing target a context is created on, and produces a
//! `Device` of the requested `ContextKind`. Every object a device hands out is
//! named by a plain `ObjectId`; ownership and caching of those objects is the
//! business of the `RenderContext` above.

pub mod headless;
mod utils;

#[cfg(not(target_arch = "wasm32"))]
pub mod gl;

#[cfg(target_arch = "wasm32")]
pub mod webgl;

use crate::errors::Result;
use crate::math::Vector2;
use crate::video::assets::prelude::*;
use crate::video::options::ContextAttributes;

/// Names an object created by a `Device`. Zero is never a valid id.
pub type ObjectId = u32;

/// Location of an uniform or attribute inside a linked program.
pub type Location = i32;

/// The classes of graphics context a surface may provide.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    /// WebGL2, OpenGL 3.0 or OpenGL ES 3.0 and above.
    Preferred,
    /// WebGL1, OpenGL 2.x or OpenGL ES 2.0.
    Baseline,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    DepthTest,
    CullFace,
    Blend,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferTarget {
    Vertex,
    Index,
}

/// Hint abouts the intended update strategy of the data.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BufferHint {
    /// Initialized with data once and never changed.
    Static,
    /// Updated by the CPU from time to time.
    Dynamic,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    Draw,
    Read,
    Both,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Attachment {
    Color,
    Depth,
}

/// Storage formats of render targets and uncompressed textures.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    Rgba8,
    Depth16,
}

impl PixelFormat {
    pub fn attachment(self) -> Attachment {
        match self {
            PixelFormat::Rgba8 => Attachment::Color,
            PixelFormat::Depth16 => Attachment::Depth,
        }
    }
}

/// The completeness of the framebuffer bound as draw target.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum FramebufferStatus {
    Complete,
    IncompleteAttachment,
    MissingAttachment,
    IncompleteDimensions,
    IncompleteMultisample,
    Unsupported,
    Unknown(u32),
}

/// An active uniform or attribute reported by program introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveVariable {
    pub name: String,
    pub location: Location,
}

/// A thin seam over the video API of one graphics context. Calls map one to
/// one onto the driver, with enums translated into native constants by each
/// implementation.
pub trait Device {
    fn kind(&self) -> ContextKind;

    /// The maximum sample count of multisample renderbuffers. Zero if
    /// multisampling is not supported.
    fn max_samples(&self) -> u32;

    fn supports_vertex_arrays(&self) -> bool;

    fn supports_instancing(&self) -> bool;

    fn has_extension(&self, name: &str) -> bool;

    fn set_capability(&mut self, capability: Capability, enabled: bool);

    fn cull_face_back(&mut self);

    /// Sets blend func to `SRC_ALPHA, ONE_MINUS_SRC_ALPHA`.
    fn blend_alpha(&mut self);

    fn viewport(&mut self, width: u32, height: u32);

    fn clear_color(&mut self, color: [f32; 4]);

    fn clear(&mut self, color: bool, depth: bool);

    fn create_shader(&mut self, stage: ShaderStage) -> Result<ObjectId>;

    fn compile_shader(&mut self, shader: ObjectId, source: &str);

    fn shader_compile_status(&mut self, shader: ObjectId) -> bool;

    fn shader_info_log(&mut self, shader: ObjectId) -> String;

    fn delete_shader(&mut self, shader: ObjectId);

    fn create_program(&mut self) -> Result<ObjectId>;

    fn attach_shader(&mut self, program: ObjectId, shader: ObjectId);

    fn detach_shader(&mut self, program: ObjectId, shader: ObjectId);

    fn link_program(&mut self, program: ObjectId);

    fn program_link_status(&mut self, program: ObjectId) -> bool;

    fn program_info_log(&mut self, program: ObjectId) -> String;

    fn use_program(&mut self, program: Option<ObjectId>);

    fn delete_program(&mut self, program: ObjectId);

    fn active_uniforms(&mut self, program: ObjectId) -> Vec<ActiveVariable>;

    fn active_attributes(&mut self, program: ObjectId) -> Vec<ActiveVariable>;

    /// Writes `variable` into the uniform at `location` of the program in use.
    fn uniform(&mut self, location: Location, variable: UniformVariable);

    fn create_texture(&mut self) -> Result<ObjectId>;

    fn active_texture(&mut self, unit: u32);

    fn bind_texture(&mut self, texture: Option<ObjectId>);

    fn tex_parameters(&mut self, params: SamplerParams);

    fn tex_image_2d(&mut self, format: PixelFormat, width: u32, height: u32, pixels: Option<&[u8]>);

    fn compressed_tex_image_2d(&mut self, format: u32, width: u32, height: u32, data: &[u8]);

    fn generate_mipmap(&mut self);

    fn delete_texture(&mut self, texture: ObjectId);

    fn create_framebuffer(&mut self) -> Result<ObjectId>;

    /// Binds `framebuffer`, or the surface framebuffer when `None`.
    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<ObjectId>);

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: ObjectId);

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: ObjectId);

    fn check_framebuffer_status(&mut self) -> FramebufferStatus;

    /// Copies the `attachment` plane of the read framebuffer into the draw
    /// framebuffer, both covering `width x height`.
    fn blit_framebuffer(
        &mut self,
        width: u32,
        height: u32,
        attachment: Attachment,
        filter: TextureFilter,
    );

    fn delete_framebuffer(&mut self, framebuffer: ObjectId);

    fn create_renderbuffer(&mut self) -> Result<ObjectId>;

    fn bind_renderbuffer(&mut self, renderbuffer: Option<ObjectId>);

    fn renderbuffer_storage_multisample(
        &mut self,
        samples: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
    );

    fn delete_renderbuffer(&mut self, renderbuffer: ObjectId);

    fn create_buffer(&mut self) -> Result<ObjectId>;

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<ObjectId>);

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], hint: BufferHint);

    fn delete_buffer(&mut self, buffer: ObjectId);

    fn create_vertex_array(&mut self) -> Result<ObjectId>;

    fn bind_vertex_array(&mut self, vao: Option<ObjectId>);

    fn delete_vertex_array(&mut self, vao: ObjectId);

    fn enable_vertex_attrib_array(&mut self, location: u32);

    /// Describes a f32 attribute of `size` components read from the bound
    /// vertex buffer.
    fn vertex_attrib_pointer(&mut self, location: u32, size: u8, stride: usize, offset: usize);

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32);

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32);

    /// Draws `count` u16 indices from the bound index buffer.
    fn draw_elements(&mut self, mode: DrawMode, count: u32);

    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: u32, count: u32, instances: u32);

    fn draw_elements_instanced(&mut self, mode: DrawMode, count: u32, instances: u32);

    /// Reads back one RGBA8 pixel from the bound read framebuffer. This blocks
    /// until every pending command is executed.
    fn read_pixel(&mut self, x: u32, y: u32) -> Result<[u8; 4]>;

    /// Returns the first pending driver error.
    fn check(&mut self) -> Result<()>;
}

/// A drawing surface graphics contexts are created from.
pub trait Surface {
    type Device: Device;

    /// Creates a device of `kind`, or `None` if the surface can not provide it.
    fn create_device(
        &mut self,
        kind: ContextKind,
        attributes: &ContextAttributes,
    ) -> Option<Self::Device>;

    fn dimensions(&self) -> Vector2<u32>;

    fn set_dimensions(&mut self, dimensions: Vector2<u32>);
}
