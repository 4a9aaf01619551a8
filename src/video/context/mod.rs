//! The `RenderContext` owns one device and every GPU object created on it.
//!
//! Operations are split by resource kind: `shader`, `texture`, `geometry` and
//! `framebuffer` each extend the context with their own `impl` block. Every
//! cache lives in the context, nothing is shared between two contexts.

mod framebuffer;
mod geometry;
mod shader;
mod texture;

pub use self::geometry::GeometryBuffer;

use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::math::{Color, Vector2};
use crate::utils::prelude::{Arena, FastHashMap};
use crate::video::assets::prelude::*;
use crate::video::backends::{Capability, ContextKind, Device, Surface};
use crate::video::framebuffer::FramebufferSet;
use crate::video::options::{ContextOptions, ErrorPolicy, RenderState};

use self::shader::ShaderProgram;
use self::texture::TextureObject;

/// Hooks run right after a context is created and right before it is torn
/// down.
pub trait Lifecycle<S: Surface> {
    fn on_create(&mut self, _: &mut RenderContext<S>) -> Result<()> {
        Ok(())
    }

    fn on_destroy(&mut self, _: &mut RenderContext<S>) {}
}

pub struct RenderContext<S: Surface> {
    surface: S,
    device: S::Device,
    options: ContextOptions,
    samples: u32,
    lifecycle: Option<Box<dyn Lifecycle<S>>>,

    shaders: Arena<ShaderHandle, ShaderProgram>,
    shader_counters: FastHashMap<&'static str, u32>,
    current_shader: Option<ShaderHandle>,

    textures: Arena<TextureHandle, TextureObject>,
    texture_uids: FastHashMap<Uuid, TextureHandle>,

    geometries: FastHashMap<Uuid, GeometryBuffer>,

    framebuffers: FastHashMap<String, FramebufferSet>,
    buffer_textures: FastHashMap<String, TextureHandle>,
}

impl<S: Surface> RenderContext<S> {
    /// Creates a context on `surface`, preferring a `ContextKind::Preferred`
    /// device and falling back to a `ContextKind::Baseline` one.
    pub fn new<T>(surface: T, options: ContextOptions) -> Result<Self>
    where
        T: Into<Option<S>>,
    {
        let mut surface = surface
            .into()
            .ok_or_else(|| Error::ContextCreation("no drawing surface was supplied".into()))?;

        let attributes = options.attributes;
        let device = surface
            .create_device(ContextKind::Preferred, &attributes)
            .or_else(|| {
                info!("Preferred context is not available, falling back to baseline.");
                surface.create_device(ContextKind::Baseline, &attributes)
            })
            .ok_or_else(|| {
                Error::ContextCreation("the surface provides no graphics context".into())
            })?;

        let samples = options.samples.min(device.max_samples());
        if samples < options.samples {
            warn!(
                "{} samples requested, but the device supports {} at most.",
                options.samples,
                device.max_samples()
            );
        }

        let mut ctx = RenderContext {
            surface,
            device,
            options,
            samples,
            lifecycle: None,
            shaders: Arena::new(),
            shader_counters: FastHashMap::default(),
            current_shader: None,
            textures: Arena::new(),
            texture_uids: FastHashMap::default(),
            geometries: FastHashMap::default(),
            framebuffers: FastHashMap::default(),
            buffer_textures: FastHashMap::default(),
        };

        ctx.device.cull_face_back();
        ctx.device.blend_alpha();

        let state = ctx.options.state;
        ctx.set_options(state);

        let dimensions = ctx.surface.dimensions();
        ctx.device.viewport(dimensions.x, dimensions.y);
        ctx.device.clear_color(ctx.options.clear_color.rgba());

        info!(
            "RenderContext created with a {:?} device, {}x{}.",
            ctx.device.kind(),
            dimensions.x,
            dimensions.y
        );

        Ok(ctx)
    }

    /// Creates a context and runs `lifecycle.on_create` on it. The hooks are
    /// kept until `destroy`.
    pub fn with_lifecycle<T, L>(surface: T, options: ContextOptions, mut lifecycle: L) -> Result<Self>
    where
        T: Into<Option<S>>,
        L: Lifecycle<S> + 'static,
    {
        let mut ctx = Self::new(surface, options)?;
        lifecycle.on_create(&mut ctx)?;
        ctx.lifecycle = Some(Box::new(lifecycle));
        Ok(ctx)
    }

    #[inline]
    pub fn kind(&self) -> ContextKind {
        self.device.kind()
    }

    #[inline]
    pub fn options(&self) -> &ContextOptions {
        &self.options
    }

    #[inline]
    pub fn error_policy(&self) -> ErrorPolicy {
        self.options.error_policy()
    }

    /// The sample count of multisampled framebuffers.
    #[inline]
    pub fn samples(&self) -> u32 {
        self.samples
    }

    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[inline]
    pub fn device(&self) -> &S::Device {
        &self.device
    }

    #[inline]
    pub fn dimensions(&self) -> Vector2<u32> {
        self.surface.dimensions()
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.surface.dimensions().x
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.surface.dimensions().y
    }

    pub fn aspect_ratio(&self) -> f32 {
        let dimensions = self.surface.dimensions();
        if dimensions.y == 0 {
            0.0
        } else {
            dimensions.x as f32 / dimensions.y as f32
        }
    }

    pub fn enable(&mut self, capability: Capability) {
        self.device.set_capability(capability, true);
    }

    pub fn disable(&mut self, capability: Capability) {
        self.device.set_capability(capability, false);
    }

    /// Applies every switch of `state`.
    pub fn set_options(&mut self, state: RenderState) {
        self.options.state = state;
        self.device
            .set_capability(Capability::DepthTest, state.depth_test);
        self.device.set_capability(Capability::CullFace, state.cull_face);
        self.device.set_capability(Capability::Blend, state.blend);
    }

    /// Sets the viewport to cover `width x height` pixels from the origin.
    pub fn viewport(&mut self, width: u32, height: u32) {
        self.device.viewport(width, height);
    }

    /// Resizes the drawing surface and the viewport.
    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.surface.set_dimensions(Vector2::new(width, height));
        self.device.viewport(width, height);
    }

    pub fn set_clear_color<T: Into<Color>>(&mut self, color: T) {
        let color = color.into();
        self.options.clear_color = color;
        self.device.clear_color(color.rgba());
    }

    /// Clears color and depth of the bound framebuffer.
    pub fn clear(&mut self) {
        self.device.clear(true, true);
    }

    /// Binds `texture` to `target` of texture `unit`. If `uniform` is given,
    /// the unit index is written into that sampler uniform of the shader in
    /// use.
    pub fn set_texture<T>(
        &mut self,
        texture: T,
        target: TextureTarget,
        unit: u32,
        uniform: Option<&str>,
    ) -> Result<()>
    where
        T: Into<Option<TextureHandle>>,
    {
        let id = match texture.into() {
            Some(handle) => Some(self.texture_id(handle)?),
            None => None,
        };

        match target {
            TextureTarget::Texture2D => {
                self.device.active_texture(unit);
                self.device.bind_texture(id);
            }
        }

        if let Some(name) = uniform {
            self.push_uniform(name, UniformVariable::I32(unit as i32))?;
        }

        Ok(())
    }

    /// Reads one RGBA8 pixel back from the bound framebuffer, with `y = 0`
    /// the bottom row.
    ///
    /// This stalls until every pending command has executed, it is meant for
    /// tooling rather than per-frame use.
    pub fn read_pixel(&mut self, x: u32, y: u32) -> Result<[u8; 4]> {
        self.device.read_pixel(x, y)
    }

    /// Returns the first pending device error.
    pub fn check(&mut self) -> Result<()> {
        self.device.check()
    }

    /// Runs `on_destroy`, releases every program, texture, buffer, vertex
    /// array, framebuffer and renderbuffer this context created, and hands the
    /// surface back.
    pub fn destroy(mut self) -> S {
        if let Some(mut lifecycle) = self.lifecycle.take() {
            lifecycle.on_destroy(&mut self);
        }

        let names: Vec<_> = self.framebuffers.keys().cloned().collect();
        for name in names {
            self.destroy_framebuffer(&name);
        }

        self.device.bind_vertex_array(None);
        for (_, buffer) in self.geometries.drain() {
            geometry::delete(&mut self.device, buffer);
        }

        self.device.bind_texture(None);
        for (_, texture) in self.textures.drain() {
            self.device.delete_texture(texture.id);
        }

        self.device.use_program(None);
        for (_, shader) in self.shaders.drain() {
            if let Some(program) = shader.program {
                self.device.delete_program(program);
            }
        }

        self.texture_uids.clear();
        self.buffer_textures.clear();
        self.current_shader = None;

        info!("RenderContext destroyed.");
        self.surface
    }

    fn check_debug(&mut self) -> Result<()> {
        if self.options.debug {
            self.device.check()
        } else {
            Ok(())
        }
    }
}
