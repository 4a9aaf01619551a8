//! A GPU resource and draw layer for image post-processing.
//!
//! A `RenderContext` is bound to one drawing `Surface` and owns every object it
//! creates on the device: shader programs, textures, vertex buffers with their
//! vertex arrays, and framebuffer sets. Resources are described by plain
//! descriptors (`ShaderDescriptor`, `Texture`, `Geometry`) and realized lazily
//! the first time they are drawn with, then cached by identity.
//!
//! ```rust,ignore
//! let surface = HeadlessSurface::new(64, 64);
//! let mut flat = FlatRenderer::new(surface, ContextOptions::default())?;
//! flat.set_image(Bitmap::solid(64, 64, [255, 0, 0, 255]));
//! flat.draw()?;
//! ```
//!
//! `FlatRenderer` is the common case, a single quad covering the whole surface
//! drawn with a pluggable shader.

pub mod assets;
pub mod backends;
pub mod context;
pub mod flat;
pub mod framebuffer;
pub mod options;

/// The sample count of multisampled framebuffers, before it is clamped to the
/// device maximum.
pub const DEFAULT_SAMPLES: u32 = 4;

/// The texture unit a `FlatRenderer` binds its source image to.
pub const FLAT_TEXTURE_UNIT: u32 = 1;

/// The sampler uniform a `FlatRenderer` binds its source image to.
pub const FLAT_TEXTURE_UNIFORM: &str = "imageTexture";

pub mod prelude {
    pub use super::assets::prelude::*;
    pub use super::backends::headless::{HeadlessSurface, Probe};
    pub use super::backends::{ContextKind, Device, Surface};
    pub use super::context::{Lifecycle, RenderContext};
    pub use super::flat::{FlatRenderer, FlatShader};
    pub use super::framebuffer::FramebufferParams;
    pub use super::options::{ContextAttributes, ContextOptions, ErrorPolicy, RenderState};

    #[cfg(not(target_arch = "wasm32"))]
    pub use super::backends::gl::GLSurface;

    #[cfg(target_arch = "wasm32")]
    pub use super::backends::webgl::CanvasSurface;
}
