//! Offscreen render targets with an explicit multisample resolve.
//!
//! A `FramebufferSet` pairs a draw target, backed by multisampled
//! renderbuffers, with an output target whose attachments are plain textures
//! that can be sampled. Drawing goes into the draw target while antialiasing is
//! on, and `RenderContext::finalize_framebuffer` blits it into the output
//! target. The dimensions of a set are fixed, resizing recreates it.

use crate::video::assets::prelude::TextureHandle;
use crate::video::backends::ObjectId;

/// Suffix of the buffer-texture name the depth attachment is registered under.
pub const DEPTH_SUFFIX: &str = ".depth";

/// Which attachments a framebuffer set provides.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FramebufferParams {
    pub depth: bool,
    pub color: bool,
    /// Draws into the multisampled target, resolved by
    /// `RenderContext::finalize_framebuffer`.
    pub antialiasing: bool,
}

impl Default for FramebufferParams {
    fn default() -> Self {
        FramebufferParams {
            depth: true,
            color: true,
            antialiasing: true,
        }
    }
}

impl FramebufferParams {
    pub fn with_depth(mut self, depth: bool) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_antialiasing(mut self, antialiasing: bool) -> Self {
        self.antialiasing = antialiasing;
        self
    }
}

/// The name a depth attachment is registered under in the buffer-texture table.
pub fn depth_name(name: &str) -> String {
    format!("{}{}", name, DEPTH_SUFFIX)
}

#[derive(Debug)]
pub struct FramebufferSet {
    pub(crate) name: String,
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) samples: u32,
    pub(crate) params: FramebufferParams,

    pub(crate) draw: ObjectId,
    pub(crate) color_renderbuffer: ObjectId,
    pub(crate) depth_renderbuffer: ObjectId,

    pub(crate) output: ObjectId,
    pub(crate) color: Option<TextureHandle>,
    pub(crate) depth: Option<TextureHandle>,
}

impl FramebufferSet {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The sample count of the draw target renderbuffers.
    #[inline]
    pub fn samples(&self) -> u32 {
        self.samples
    }

    #[inline]
    pub fn params(&self) -> FramebufferParams {
        self.params
    }

    /// The color texture of the output target.
    #[inline]
    pub fn color(&self) -> Option<TextureHandle> {
        self.color
    }

    /// The depth texture of the output target.
    #[inline]
    pub fn depth(&self) -> Option<TextureHandle> {
        self.depth
    }

    /// The framebuffer draws are directed to.
    #[inline]
    pub(crate) fn target(&self) -> ObjectId {
        if self.params.antialiasing {
            self.draw
        } else {
            self.output
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn params() {
        let params = FramebufferParams::default();
        assert!(params.depth && params.color && params.antialiasing);

        let params: FramebufferParams = serde_json::from_str(r#"{"depth": false}"#).unwrap();
        assert_eq!(params, FramebufferParams::default().with_depth(false));
    }

    #[test]
    fn names() {
        assert_eq!(depth_name("fboA"), "fboA.depth");
    }
}
