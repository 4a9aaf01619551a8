//! A `RenderContext` drawing one quad that covers the whole surface, used to
//! run image filters. The filter is a `ShaderDescriptor` sampling the source
//! image through the `imageTexture` uniform.

use crate::errors::Result;
use crate::math::Color;
use crate::video::assets::prelude::*;
use crate::video::backends::Surface;
use crate::video::context::RenderContext;
use crate::video::options::ContextOptions;

use super::{FLAT_TEXTURE_UNIFORM, FLAT_TEXTURE_UNIT};

/// Vertex stage shared by flat shaders, passing the quad UVs through as
/// `texCoords`. `v = 0` is the bottom row of the source, matching `Bitmap`.
pub const FLAT_VERTEX_SOURCE: &str = r#"#version 300 es

layout(location = 0) in vec3 aPosition;
layout(location = 1) in vec2 aTexCoords;
layout(location = 2) in vec3 aNormals;

out vec2 texCoords;

void main() {
    gl_Position = vec4(aPosition, 1.0);
    texCoords = aTexCoords;
}
"#;

pub const FLAT_FRAGMENT_SOURCE: &str = r#"#version 300 es

precision mediump float;

uniform sampler2D imageTexture;

in vec2 texCoords;

out vec4 oFragColor;

void main() {
    oFragColor = texture(imageTexture, texCoords);
}
"#;

/// Draws the source image unchanged.
#[derive(Debug, Default, Copy, Clone)]
pub struct FlatShader;

impl ShaderDescriptor for FlatShader {
    fn vertex_source(&self) -> &str {
        FLAT_VERTEX_SOURCE
    }

    fn fragment_source(&self) -> &str {
        FLAT_FRAGMENT_SOURCE
    }
}

/// Two triangles covering clip space, with UVs spanning the unit square.
pub fn screen_quad() -> Geometry {
    let vertices = vec![
        [-1.0, -1.0, 0.0],
        [1.0, -1.0, 0.0],
        [1.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
        [-1.0, 1.0, 0.0],
        [-1.0, -1.0, 0.0],
    ];

    let uvs = vec![
        [0.0, 0.0],
        [1.0, 0.0],
        [1.0, 1.0],
        [1.0, 1.0],
        [0.0, 1.0],
        [0.0, 0.0],
    ];

    let normals = vertices.clone();
    Geometry::new(vertices, uvs, normals)
}

pub struct FlatRenderer<S: Surface> {
    ctx: RenderContext<S>,
    screen: Geometry,
    shader: ShaderHandle,
    source: Option<Texture>,
    clear_pass: bool,
    background: Color,
    uniforms: Uniforms,
}

impl<S: Surface> FlatRenderer<S> {
    pub fn new<T: Into<Option<S>>>(surface: T, options: ContextOptions) -> Result<Self> {
        let ctx = RenderContext::new(surface, options)?;
        Ok(Self::with_context(ctx))
    }

    /// Wraps an existing context, registering a `FlatShader` as the current
    /// filter.
    pub fn with_context(mut ctx: RenderContext<S>) -> Self {
        let shader = ctx.create_shader(FlatShader);

        FlatRenderer {
            ctx,
            screen: screen_quad(),
            shader,
            source: None,
            clear_pass: true,
            background: Color::transparent(),
            uniforms: Uniforms::new(),
        }
    }

    /// Registers a filter in the inner context. It becomes current with
    /// `set_shader`.
    pub fn register_shader<D: ShaderDescriptor + 'static>(&mut self, descriptor: D) -> ShaderHandle {
        self.ctx.create_shader(descriptor)
    }

    /// Swaps the filter drawn with. Overrides set with `set_uniform` are kept.
    pub fn set_shader(&mut self, shader: ShaderHandle) {
        self.shader = shader;
    }

    #[inline]
    pub fn shader(&self) -> ShaderHandle {
        self.shader
    }

    /// Resizes the surface to `image` and makes it the source. The texture of
    /// the previous source is released.
    pub fn set_image(&mut self, image: Bitmap) {
        let dimensions = image.dimensions();
        self.ctx.set_resolution(dimensions.x, dimensions.y);

        if let Some(uid) = self.source.take().and_then(|v| v.uid) {
            self.ctx.release_texture(uid);
        }

        self.source = Some(Texture::new(image));
    }

    #[inline]
    pub fn source(&self) -> Option<&Texture> {
        self.source.as_ref()
    }

    #[inline]
    pub fn screen(&self) -> &Geometry {
        &self.screen
    }

    /// Whether `draw` clears the surface with the background first.
    pub fn set_clear_pass(&mut self, clear_pass: bool) {
        self.clear_pass = clear_pass;
    }

    pub fn set_background<T: Into<Color>>(&mut self, color: T) {
        self.background = color.into();
    }

    /// Sets a uniform written on every draw, replacing the custom uniform of
    /// the filter with the same name.
    pub fn set_uniform<T: Into<UniformVariable>>(&mut self, name: &str, value: T) {
        self.uniforms.set(name, value);
    }

    pub fn clear_uniforms(&mut self) {
        self.uniforms = Uniforms::new();
    }

    /// Draws the source through the current filter.
    pub fn draw(&mut self) -> Result<()> {
        if self.clear_pass {
            self.ctx.set_clear_color(self.background);
            self.ctx.clear();
        }

        self.ctx.use_shader(self.shader)?;

        if let Some(ref source) = self.source {
            let texture = self.ctx.prepare_texture(source)?;
            self.ctx.set_texture(
                texture,
                TextureTarget::Texture2D,
                FLAT_TEXTURE_UNIT,
                Some(FLAT_TEXTURE_UNIFORM),
            )?;
        }

        let mut uniforms = self
            .ctx
            .shader_descriptor(self.shader)
            .and_then(|v| v.custom_uniforms())
            .unwrap_or_default();

        for (name, value) in self.uniforms.iter() {
            uniforms.set(name, value);
        }

        self.ctx.set_uniforms(&uniforms)?;

        let mode = self.ctx.current_draw_mode()?;
        self.ctx.draw_geo(&self.screen, mode)
    }

    /// Releases the GPU texture of the source and the buffers of the quad.
    /// Both are realized again by the next `draw`.
    pub fn clear_buffers(&mut self) {
        if let Some(uid) = self.source.as_ref().and_then(|v| v.uid) {
            self.ctx.release_texture(uid);
        }

        self.ctx.release_geometry(self.screen.uid);
    }

    pub fn read_pixel(&mut self, x: u32, y: u32) -> Result<[u8; 4]> {
        self.ctx.read_pixel(x, y)
    }

    #[inline]
    pub fn context(&self) -> &RenderContext<S> {
        &self.ctx
    }

    #[inline]
    pub fn context_mut(&mut self) -> &mut RenderContext<S> {
        &mut self.ctx
    }

    /// Tears down the inner context and hands the surface back.
    pub fn destroy(self) -> S {
        self.ctx.destroy()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::video::assets::geometry::default_layout;

    #[test]
    fn quad() {
        let quad = screen_quad();
        assert_eq!(quad.vertex_count(), 6);
        assert!(!quad.is_indexed());
        assert_eq!(quad.components(), 8);
        assert_eq!(quad.normals, quad.vertices);
        assert_eq!(quad.uvs[2], [1.0, 1.0]);

        // Every attribute of the default layout is fed to the flat shaders.
        assert_eq!(quad.attributes, default_layout());
        for v in &quad.attributes {
            assert!(FLAT_VERTEX_SOURCE.contains(&format!(" {};", v.attribute)));
        }
    }

    #[test]
    fn shader() {
        assert_eq!(FlatShader.draw_mode(), DrawMode::Triangles);
        assert!(FlatShader.custom_uniforms().is_none());
        assert!(FlatShader.fragment_source().contains("uniform sampler2D imageTexture"));
        assert!(FlatShader
            .fragment_source()
            .contains("texture(imageTexture, texCoords)"));
    }
}
