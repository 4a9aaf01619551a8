//! Configuration of a `RenderContext`. Options deserialize from JSON with every
//! field optional.

use crate::errors::Result;
use crate::math::Color;

use super::DEFAULT_SAMPLES;

/// Attributes requested from the drawing surface when a graphics context is
/// created.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContextAttributes {
    pub alpha: bool,
    pub premultiplied_alpha: bool,
    pub antialias: bool,
    /// Keeps the surface contents after presenting, required to read pixels
    /// back from the surface framebuffer.
    pub preserve_drawing_buffer: bool,
}

impl Default for ContextAttributes {
    fn default() -> Self {
        ContextAttributes {
            alpha: true,
            premultiplied_alpha: true,
            antialias: true,
            preserve_drawing_buffer: true,
        }
    }
}

/// The fixed-function switches applied after context creation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderState {
    pub depth_test: bool,
    pub cull_face: bool,
    pub blend: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        RenderState {
            depth_test: true,
            cull_face: false,
            blend: true,
        }
    }
}

/// What happens when a shader fails to compile or link, or a framebuffer is
/// incomplete.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorPolicy {
    /// Returns an error carrying the driver diagnostics.
    FailFast,
    /// Keeps going with whatever object the driver returned.
    Degrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextOptions {
    pub attributes: ContextAttributes,
    pub state: RenderState,
    pub debug: bool,
    /// Verbosity of diagnostics, incomplete framebuffers are only logged above 1.
    pub debug_level: u32,
    /// Defaults to `FailFast` in debug mode, `Degrade` otherwise.
    pub error_policy: Option<ErrorPolicy>,
    /// Sample count of multisampled framebuffers, clamped to what the device
    /// supports.
    pub samples: u32,
    pub clear_color: Color,
}

impl Default for ContextOptions {
    fn default() -> Self {
        ContextOptions {
            attributes: ContextAttributes::default(),
            state: RenderState::default(),
            debug: false,
            debug_level: 1,
            error_policy: None,
            samples: DEFAULT_SAMPLES,
            clear_color: Color::transparent(),
        }
    }
}

impl ContextOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_debug(mut self, debug: bool, level: u32) -> Self {
        self.debug = debug;
        self.debug_level = level;
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = Some(policy);
        self
    }

    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    pub fn with_attributes(mut self, attributes: ContextAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        match self.error_policy {
            Some(policy) => policy,
            None if self.debug => ErrorPolicy::FailFast,
            None => ErrorPolicy::Degrade,
        }
    }
}
