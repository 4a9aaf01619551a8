use web_sys::WebGl2RenderingContext as WebGL;

use crate::video::assets::prelude::*;
use crate::video::backends::{
    Attachment, BufferHint, BufferTarget, Capability, FramebufferStatus, FramebufferTarget,
    PixelFormat,
};

impl From<DrawMode> for u32 {
    fn from(mode: DrawMode) -> Self {
        match mode {
            DrawMode::Points => WebGL::POINTS,
            DrawMode::Lines => WebGL::LINES,
            DrawMode::LineLoop => WebGL::LINE_LOOP,
            DrawMode::LineStrip => WebGL::LINE_STRIP,
            DrawMode::Triangles => WebGL::TRIANGLES,
            DrawMode::TriangleStrip => WebGL::TRIANGLE_STRIP,
            DrawMode::TriangleFan => WebGL::TRIANGLE_FAN,
        }
    }
}

impl From<ShaderStage> for u32 {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => WebGL::VERTEX_SHADER,
            ShaderStage::Fragment => WebGL::FRAGMENT_SHADER,
        }
    }
}

impl From<TextureWrap> for u32 {
    fn from(wrap: TextureWrap) -> Self {
        match wrap {
            TextureWrap::Repeat => WebGL::REPEAT,
            TextureWrap::MirroredRepeat => WebGL::MIRRORED_REPEAT,
            TextureWrap::ClampToEdge => WebGL::CLAMP_TO_EDGE,
        }
    }
}

impl From<TextureFilter> for u32 {
    fn from(filter: TextureFilter) -> Self {
        match filter {
            TextureFilter::Nearest => WebGL::NEAREST,
            TextureFilter::Linear => WebGL::LINEAR,
            TextureFilter::NearestMipmapNearest => WebGL::NEAREST_MIPMAP_NEAREST,
            TextureFilter::LinearMipmapNearest => WebGL::LINEAR_MIPMAP_NEAREST,
            TextureFilter::NearestMipmapLinear => WebGL::NEAREST_MIPMAP_LINEAR,
            TextureFilter::LinearMipmapLinear => WebGL::LINEAR_MIPMAP_LINEAR,
        }
    }
}

impl From<Capability> for u32 {
    fn from(capability: Capability) -> Self {
        match capability {
            Capability::DepthTest => WebGL::DEPTH_TEST,
            Capability::CullFace => WebGL::CULL_FACE,
            Capability::Blend => WebGL::BLEND,
        }
    }
}

impl From<BufferTarget> for u32 {
    fn from(target: BufferTarget) -> Self {
        match target {
            BufferTarget::Vertex => WebGL::ARRAY_BUFFER,
            BufferTarget::Index => WebGL::ELEMENT_ARRAY_BUFFER,
        }
    }
}

impl From<BufferHint> for u32 {
    fn from(hint: BufferHint) -> Self {
        match hint {
            BufferHint::Static => WebGL::STATIC_DRAW,
            BufferHint::Dynamic => WebGL::DYNAMIC_DRAW,
        }
    }
}

impl From<FramebufferTarget> for u32 {
    fn from(target: FramebufferTarget) -> Self {
        match target {
            FramebufferTarget::Draw => WebGL::DRAW_FRAMEBUFFER,
            FramebufferTarget::Read => WebGL::READ_FRAMEBUFFER,
            FramebufferTarget::Both => WebGL::FRAMEBUFFER,
        }
    }
}

impl From<Attachment> for u32 {
    fn from(attachment: Attachment) -> Self {
        match attachment {
            Attachment::Color => WebGL::COLOR_ATTACHMENT0,
            Attachment::Depth => WebGL::DEPTH_ATTACHMENT,
        }
    }
}

pub fn buffer_bit(attachment: Attachment) -> u32 {
    match attachment {
        Attachment::Color => WebGL::COLOR_BUFFER_BIT,
        Attachment::Depth => WebGL::DEPTH_BUFFER_BIT,
    }
}

/// Returns the internal format, format and type of `format`.
pub fn pixel_format(format: PixelFormat) -> (u32, u32, u32) {
    match format {
        PixelFormat::Rgba8 => (WebGL::RGBA8, WebGL::RGBA, WebGL::UNSIGNED_BYTE),
        PixelFormat::Depth16 => (
            WebGL::DEPTH_COMPONENT16,
            WebGL::DEPTH_COMPONENT,
            WebGL::UNSIGNED_INT,
        ),
    }
}

impl From<u32> for FramebufferStatus {
    fn from(status: u32) -> Self {
        match status {
            WebGL::FRAMEBUFFER_COMPLETE => FramebufferStatus::Complete,
            WebGL::FRAMEBUFFER_INCOMPLETE_ATTACHMENT => FramebufferStatus::IncompleteAttachment,
            WebGL::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT => {
                FramebufferStatus::MissingAttachment
            }
            WebGL::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE => FramebufferStatus::IncompleteMultisample,
            WebGL::FRAMEBUFFER_UNSUPPORTED => FramebufferStatus::Unsupported,
            0x8CD9 => FramebufferStatus::IncompleteDimensions,
            v => FramebufferStatus::Unknown(v),
        }
    }
}
