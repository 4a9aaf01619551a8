use gl;
use gl::types::*;

use crate::video::assets::prelude::*;
use crate::video::backends::{
    Attachment, BufferHint, BufferTarget, Capability, FramebufferStatus, FramebufferTarget,
    PixelFormat,
};

impl From<DrawMode> for GLenum {
    fn from(mode: DrawMode) -> Self {
        match mode {
            DrawMode::Points => gl::POINTS,
            DrawMode::Lines => gl::LINES,
            DrawMode::LineLoop => gl::LINE_LOOP,
            DrawMode::LineStrip => gl::LINE_STRIP,
            DrawMode::Triangles => gl::TRIANGLES,
            DrawMode::TriangleStrip => gl::TRIANGLE_STRIP,
            DrawMode::TriangleFan => gl::TRIANGLE_FAN,
        }
    }
}

impl From<ShaderStage> for GLenum {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => gl::VERTEX_SHADER,
            ShaderStage::Fragment => gl::FRAGMENT_SHADER,
        }
    }
}

impl From<TextureWrap> for GLenum {
    fn from(wrap: TextureWrap) -> Self {
        match wrap {
            TextureWrap::Repeat => gl::REPEAT,
            TextureWrap::MirroredRepeat => gl::MIRRORED_REPEAT,
            TextureWrap::ClampToEdge => gl::CLAMP_TO_EDGE,
        }
    }
}

impl From<TextureFilter> for GLenum {
    fn from(filter: TextureFilter) -> Self {
        match filter {
            TextureFilter::Nearest => gl::NEAREST,
            TextureFilter::Linear => gl::LINEAR,
            TextureFilter::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
            TextureFilter::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
            TextureFilter::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
            TextureFilter::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
        }
    }
}

impl From<Capability> for GLenum {
    fn from(capability: Capability) -> Self {
        match capability {
            Capability::DepthTest => gl::DEPTH_TEST,
            Capability::CullFace => gl::CULL_FACE,
            Capability::Blend => gl::BLEND,
        }
    }
}

impl From<BufferTarget> for GLenum {
    fn from(target: BufferTarget) -> Self {
        match target {
            BufferTarget::Vertex => gl::ARRAY_BUFFER,
            BufferTarget::Index => gl::ELEMENT_ARRAY_BUFFER,
        }
    }
}

impl From<BufferHint> for GLenum {
    fn from(hint: BufferHint) -> Self {
        match hint {
            BufferHint::Static => gl::STATIC_DRAW,
            BufferHint::Dynamic => gl::DYNAMIC_DRAW,
        }
    }
}

impl From<FramebufferTarget> for GLenum {
    fn from(target: FramebufferTarget) -> Self {
        match target {
            FramebufferTarget::Draw => gl::DRAW_FRAMEBUFFER,
            FramebufferTarget::Read => gl::READ_FRAMEBUFFER,
            FramebufferTarget::Both => gl::FRAMEBUFFER,
        }
    }
}

impl From<Attachment> for GLenum {
    fn from(attachment: Attachment) -> Self {
        match attachment {
            Attachment::Color => gl::COLOR_ATTACHMENT0,
            Attachment::Depth => gl::DEPTH_ATTACHMENT,
        }
    }
}

/// Returns the buffer bit of `attachment`, used by clears and blits.
pub fn buffer_bit(attachment: Attachment) -> GLbitfield {
    match attachment {
        Attachment::Color => gl::COLOR_BUFFER_BIT,
        Attachment::Depth => gl::DEPTH_BUFFER_BIT,
    }
}

/// Returns the internal format, format and type of `format`.
pub fn pixel_format(format: PixelFormat) -> (GLenum, GLenum, GLenum) {
    match format {
        PixelFormat::Rgba8 => (gl::RGBA8, gl::RGBA, gl::UNSIGNED_BYTE),
        PixelFormat::Depth16 => (gl::DEPTH_COMPONENT16, gl::DEPTH_COMPONENT, gl::UNSIGNED_INT),
    }
}

impl From<GLenum> for FramebufferStatus {
    fn from(status: GLenum) -> Self {
        match status {
            gl::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
            gl::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
            gl::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => FramebufferStatus::MissingAttachment,
            gl::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
            gl::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
            // GL_FRAMEBUFFER_INCOMPLETE_DIMENSIONS only exists in ES 2.0.
            0x8CD9 => FramebufferStatus::IncompleteDimensions,
            v => FramebufferStatus::Unknown(v),
        }
    }
}
