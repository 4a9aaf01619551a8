//! Native OpenGL backend, driving whatever context is current in the thread
//! through the `gl` function pointers.

pub mod capabilities;
pub mod types;

mod device;
pub use self::device::GLDevice;

#[cfg(feature = "glutin-surface")]
pub mod glutin;

use std::os::raw::c_void;

use gl;

use crate::math::Vector2;
use crate::video::options::ContextAttributes;

use super::{ContextKind, Surface};

/// A surface over an OpenGL context owned by the caller.
///
/// Pixel format, alpha and antialiasing of the default framebuffer are fixed
/// by whoever created the native context, the `ContextAttributes` handed to
/// `create_device` are informational only.
pub struct GLSurface {
    dimensions: Vector2<u32>,
}

impl GLSurface {
    /// Loads the GL function pointers with `loader`.
    ///
    /// # Safety
    ///
    /// The context `loader` resolves symbols from must be current in this
    /// thread for as long as the surface and its devices are alive.
    pub unsafe fn new<F>(mut loader: F, dimensions: Vector2<u32>) -> Self
    where
        F: FnMut(&'static str) -> *const c_void,
    {
        gl::load_with(|symbol| loader(symbol));
        GLSurface { dimensions }
    }
}

impl Surface for GLSurface {
    type Device = GLDevice;

    fn create_device(
        &mut self,
        kind: ContextKind,
        attributes: &ContextAttributes,
    ) -> Option<Self::Device> {
        debug!("[GL] Requesting {:?} context with {:?}.", kind, attributes);

        match unsafe { GLDevice::new(kind) } {
            Ok(device) => Some(device),
            Err(err) => {
                info!("[GL] {:?} context is not available: {}", kind, err);
                None
            }
        }
    }

    #[inline]
    fn dimensions(&self) -> Vector2<u32> {
        self.dimensions
    }

    #[inline]
    fn set_dimensions(&mut self, dimensions: Vector2<u32>) {
        self.dimensions = dimensions;
    }
}
