//! A window-backed surface, available with the `glutin-surface` feature.

use glutin;
use glutin::GlContext;

use crate::errors::{Error, Result};
use crate::math::Vector2;
use crate::video::backends::{ContextKind, Surface};
use crate::video::options::ContextAttributes;

use super::{GLDevice, GLSurface};

pub struct GlutinSurface {
    window: glutin::GlWindow,
    events_loop: glutin::EventsLoop,
    surface: GLSurface,
}

impl GlutinSurface {
    pub fn new(title: &str, dimensions: Vector2<u32>, attributes: &ContextAttributes) -> Result<Self> {
        let builder = glutin::WindowBuilder::new()
            .with_title(title)
            .with_dimensions(glutin::dpi::LogicalSize::new(
                f64::from(dimensions.x),
                f64::from(dimensions.y),
            ));

        let samples = if attributes.antialias { 4 } else { 0 };
        let context = glutin::ContextBuilder::new()
            .with_multisampling(samples)
            .with_gl(glutin::GlRequest::Latest)
            .with_gl_profile(glutin::GlProfile::Core);

        let events_loop = glutin::EventsLoop::new();
        let window = glutin::GlWindow::new(builder, context, &events_loop)
            .map_err(|err| Error::ContextCreation(format!("{}", err)))?;

        let surface = unsafe {
            window
                .make_current()
                .map_err(|err| Error::ContextCreation(format!("{}", err)))?;

            GLSurface::new(|symbol| window.get_proc_address(symbol) as *const _, dimensions)
        };

        Ok(GlutinSurface {
            window,
            events_loop,
            surface,
        })
    }

    /// Drains pending window events, returns false once the window was asked
    /// to close.
    pub fn poll_events(&mut self) -> bool {
        let mut alive = true;
        self.events_loop.poll_events(|event| {
            if let glutin::Event::WindowEvent {
                event: glutin::WindowEvent::CloseRequested,
                ..
            } = event
            {
                alive = false;
            }
        });

        alive
    }

    pub fn swap_buffers(&self) -> Result<()> {
        self.window
            .swap_buffers()
            .map_err(|err| backend_err!("[Glutin] {}", err))
    }
}

impl Surface for GlutinSurface {
    type Device = GLDevice;

    fn create_device(
        &mut self,
        kind: ContextKind,
        attributes: &ContextAttributes,
    ) -> Option<Self::Device> {
        self.surface.create_device(kind, attributes)
    }

    fn dimensions(&self) -> Vector2<u32> {
        self.surface.dimensions()
    }

    fn set_dimensions(&mut self, dimensions: Vector2<u32>) {
        let size = glutin::dpi::PhysicalSize::new(f64::from(dimensions.x), f64::from(dimensions.y));
        self.window.resize(size);
        self.surface.set_dimensions(dimensions);
    }
}
