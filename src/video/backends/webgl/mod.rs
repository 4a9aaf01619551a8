//! WebGL backend for wasm32 targets, drawing into a `<canvas>` element.

pub mod types;

mod device;
pub use self::device::WebGLDevice;

use wasm_bindgen::JsCast;
use web_sys::{self, HtmlCanvasElement, WebGl2RenderingContext as WebGL, WebGlContextAttributes};

use crate::errors::{Error, Result};
use crate::math::Vector2;
use crate::video::options::ContextAttributes;

use super::{ContextKind, Surface};

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        CanvasSurface { canvas }
    }

    /// Looks up the canvas element named `id` in the current document.
    pub fn from_element_id(id: &str) -> Result<Self> {
        let canvas = web_sys::window()
            .and_then(|v| v.document())
            .and_then(|v| v.get_element_by_id(id))
            .ok_or_else(|| Error::ContextCreation(format!("canvas '{}' does not exist", id)))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| Error::ContextCreation(format!("element '{}' is not a canvas", id)))?;

        Ok(CanvasSurface { canvas })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

impl Surface for CanvasSurface {
    type Device = WebGLDevice;

    fn create_device(
        &mut self,
        kind: ContextKind,
        attributes: &ContextAttributes,
    ) -> Option<Self::Device> {
        let mut options = WebGlContextAttributes::new();
        options
            .alpha(attributes.alpha)
            .premultiplied_alpha(attributes.premultiplied_alpha)
            .antialias(attributes.antialias)
            .preserve_drawing_buffer(attributes.preserve_drawing_buffer);

        let name = match kind {
            ContextKind::Preferred => "webgl2",
            ContextKind::Baseline => "webgl",
        };

        let ctx = match self.canvas.get_context_with_context_options(name, &options) {
            Ok(Some(ctx)) => ctx,
            Ok(None) => return None,
            Err(err) => {
                warn!("[WebGL] getContext('{}') failed: {:?}.", name, err);
                return None;
            }
        };

        // WebGL1 entry points are a subset of the WebGL2 ones, the device only
        // calls those on a baseline context.
        let ctx = ctx.unchecked_into::<WebGL>();
        Some(WebGLDevice::new(ctx, kind))
    }

    fn dimensions(&self) -> Vector2<u32> {
        Vector2::new(self.canvas.width(), self.canvas.height())
    }

    fn set_dimensions(&mut self, dimensions: Vector2<u32>) {
        self.canvas.set_width(dimensions.x);
        self.canvas.set_height(dimensions.y);
    }
}
