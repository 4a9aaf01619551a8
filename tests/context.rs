extern crate env_logger;
extern crate tincture;

use std::cell::Cell;
use std::rc::Rc;

use tincture::prelude::*;
use tincture::video::backends::headless::DrawCall;
use tincture::video::backends::Capability;

const VS: &str = r#"#version 300 es
layout(location = 0) in vec3 aPosition;
layout(location = 1) in vec2 aTexCoords;
out vec2 texCoords;
void main() { texCoords = aTexCoords; gl_Position = vec4(aPosition, 1.0); }
"#;

const FS: &str = r#"#version 300 es
precision mediump float;
uniform sampler2D imageTexture;
uniform float brightness;
in vec2 texCoords;
out vec4 oFragColor;
void main() { oFragColor = texture(imageTexture, texCoords) + brightness; }
"#;

const INSTANCED_VS: &str = r#"#version 300 es
layout(location = 0) in vec3 aPosition;
layout(location = 3) in vec4 aTransform;
void main() { gl_Position = vec4(aPosition * aTransform.w + aTransform.xyz, 1.0); }
"#;

struct Simple;

impl ShaderDescriptor for Simple {
    fn vertex_source(&self) -> &str {
        VS
    }

    fn fragment_source(&self) -> &str {
        FS
    }
}

struct Broken;

impl ShaderDescriptor for Broken {
    fn vertex_source(&self) -> &str {
        VS
    }

    fn fragment_source(&self) -> &str {
        "#version 300 es\n#error broken\n"
    }
}

struct Instanced;

impl ShaderDescriptor for Instanced {
    fn vertex_source(&self) -> &str {
        INSTANCED_VS
    }

    fn fragment_source(&self) -> &str {
        FS
    }

    fn draw_mode(&self) -> DrawMode {
        DrawMode::TriangleStrip
    }
}

fn quad() -> Geometry {
    Geometry::new(
        vec![
            [-1.0, -1.0, 0.0],
            [1.0, -1.0, 0.0],
            [1.0, 1.0, 0.0],
            [-1.0, 1.0, 0.0],
        ],
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
        vec![],
    )
    .with_indices(vec![0, 1, 2, 2, 3, 0])
}

fn context(surface: HeadlessSurface) -> RenderContext<HeadlessSurface> {
    let _ = env_logger::try_init();
    match RenderContext::new(surface, ContextOptions::default()) {
        Ok(ctx) => ctx,
        Err(err) => panic!("{}", err),
    }
}

#[test]
fn create() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let ctx = context(surface);

    assert_eq!(ctx.kind(), ContextKind::Preferred);
    assert_eq!(ctx.samples(), 4);
    assert_eq!(ctx.dimensions(), Vector2::new(4, 4));
    assert_eq!(ctx.aspect_ratio(), 1.0);

    let stats = probe.stats();
    assert!(stats.enabled.contains(&Capability::DepthTest));
    assert!(stats.enabled.contains(&Capability::Blend));
    assert!(!stats.enabled.contains(&Capability::CullFace));
    assert_eq!(stats.live_objects(), 0);
}

#[test]
fn create_without_surface() {
    match RenderContext::<HeadlessSurface>::new(None, ContextOptions::default()) {
        Err(Error::ContextCreation(_)) => {}
        Err(err) => panic!("unexpected error {}", err),
        Ok(_) => panic!("created a context without surface"),
    }

    let surface = HeadlessSurface::new(4, 4).with_kinds(&[]);
    match RenderContext::new(surface, ContextOptions::default()) {
        Err(Error::ContextCreation(_)) => {}
        _ => panic!("created a context without device"),
    }
}

#[test]
fn baseline_fallback() {
    let surface = HeadlessSurface::new(4, 4).with_kinds(&[ContextKind::Baseline]);
    let probe = surface.probe();
    let mut ctx = context(surface);

    assert_eq!(ctx.kind(), ContextKind::Baseline);
    assert_eq!(ctx.samples(), 0);

    let shader = ctx.create_shader(Simple);
    ctx.use_shader(shader).unwrap();

    let geo = quad();
    ctx.draw_geo(&geo, DrawMode::Triangles).unwrap();
    ctx.draw_geo(&geo, DrawMode::Triangles).unwrap();
    ctx.check().unwrap();

    let stats = probe.stats();
    assert_eq!(stats.vertex_arrays, 0);
    assert_eq!(stats.buffers, 2);
    assert_eq!(stats.draws.len(), 2);
    assert!(!ctx.get_geometry_buffer(&geo).unwrap().has_vertex_array());

    let transforms = [[0.0, 0.0, 0.0, 1.0]];
    assert!(ctx.initialize_instance_buffer(&geo, &transforms).is_err());
    assert!(ctx.draw_geo_instanced(&geo, DrawMode::Triangles, 2).is_err());
}

#[test]
fn samples_are_clamped() {
    let surface = HeadlessSurface::new(4, 4).with_max_samples(2);
    let options = ContextOptions::default().with_samples(8);
    let ctx = RenderContext::new(surface, options).unwrap();
    assert_eq!(ctx.samples(), 2);
}

#[test]
fn idempotent_compile() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let shader = ctx.create_shader(Simple);
    assert!(!ctx.is_shader_initialized(shader));
    assert_eq!(probe.stats().compiles, 0);

    for _ in 0..5 {
        ctx.use_shader(shader).unwrap();
    }

    let stats = probe.stats();
    assert!(ctx.is_shader_initialized(shader));
    assert_eq!(ctx.current_shader(), Some(shader));
    assert_eq!(stats.compiles, 2);
    assert_eq!(stats.links, 1);
    assert_eq!(stats.program_binds, 1);
    assert_eq!(stats.programs, 1);
    assert_eq!(stats.shaders, 0);

    assert_eq!(ctx.uniform_location(shader, "brightness"), Some(1));
    assert_eq!(ctx.attribute_location(shader, "aTexCoords"), Some(1));
    assert_eq!(ctx.uniform_location(shader, "contrast"), None);
}

#[test]
fn shader_names() {
    let mut ctx = context(HeadlessSurface::new(4, 4));

    let a = ctx.create_shader(Simple);
    let b = ctx.create_shader(Simple);
    let c = ctx.create_shader(FlatShader);

    assert_ne!(a, b);
    assert_eq!(ctx.shader_name(a), Some("Simple#1"));
    assert_eq!(ctx.shader_name(b), Some("Simple#2"));
    assert_eq!(ctx.shader_name(c), Some("FlatShader#1"));
}

#[test]
fn fail_fast() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();

    let options = ContextOptions::default().with_error_policy(ErrorPolicy::FailFast);
    let mut ctx = RenderContext::new(surface, options).unwrap();

    let shader = ctx.create_shader(Broken);
    match ctx.use_shader(shader) {
        Err(Error::ShaderCompile(ShaderStage::Fragment, log)) => assert!(log.contains("broken")),
        Err(err) => panic!("unexpected error {}", err),
        Ok(_) => panic!("a broken shader compiled"),
    }

    let stats = probe.stats();
    assert!(!ctx.is_shader_initialized(shader));
    assert_eq!(stats.shaders, 0);
    assert_eq!(stats.programs, 0);
    assert_eq!(stats.links, 0);
    assert_eq!(ctx.current_shader(), None);
}

#[test]
fn degrade() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();

    let options = ContextOptions::default().with_error_policy(ErrorPolicy::Degrade);
    let mut ctx = RenderContext::new(surface, options).unwrap();

    let shader = ctx.create_shader(Broken);
    ctx.use_shader(shader).unwrap();
    ctx.use_shader(shader).unwrap();

    let stats = probe.stats();
    assert!(ctx.is_shader_initialized(shader));
    assert_eq!(stats.links, 1);
    assert_eq!(stats.programs, 1);
    assert_eq!(stats.shaders, 0);
}

#[test]
fn debug_defaults_to_fail_fast() {
    let options = ContextOptions::default().with_debug(true, 1);
    let mut ctx = RenderContext::new(HeadlessSurface::new(4, 4), options).unwrap();
    assert_eq!(ctx.error_policy(), ErrorPolicy::FailFast);

    let shader = ctx.create_shader(Broken);
    assert!(ctx.use_shader(shader).is_err());
}

#[test]
fn uniform_caching() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    assert!(match ctx.set_uniform("brightness", 0.5f32) {
        Err(Error::NoShaderBound) => true,
        _ => false,
    });

    let shader = ctx.create_shader(Simple);
    ctx.use_shader(shader).unwrap();

    ctx.set_uniform("brightness", 0.5f32).unwrap();
    ctx.set_uniform("brightness", 0.5f32).unwrap();
    assert_eq!(probe.stats().uniform_writes, 1);

    ctx.set_uniform("brightness", 0.25f32).unwrap();
    assert_eq!(probe.stats().uniform_writes, 2);

    // Unknown names are skipped.
    ctx.set_uniform("contrast", 1.0f32).unwrap();
    assert_eq!(probe.stats().uniform_writes, 2);

    let uniforms = Uniforms::new()
        .with("brightness", 0.25f32)
        .with("imageTexture", 3i32);
    ctx.set_uniforms(&uniforms).unwrap();
    assert_eq!(probe.stats().uniform_writes, 3);

    // Every program caches its own values.
    let other = ctx.create_shader(Simple);
    ctx.use_shader(other).unwrap();
    ctx.set_uniform("brightness", 0.25f32).unwrap();
    assert_eq!(probe.stats().uniform_writes, 4);
}

struct Bright;

impl ShaderDescriptor for Bright {
    fn vertex_source(&self) -> &str {
        VS
    }

    fn fragment_source(&self) -> &str {
        FS
    }

    fn custom_uniforms(&self) -> Option<Uniforms> {
        Some(Uniforms::new().with("brightness", 0.75f32))
    }
}

#[test]
fn custom_uniforms() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    assert!(ctx.set_custom_uniforms().is_err());

    let bright = ctx.create_shader(Bright);
    ctx.use_shader(bright).unwrap();
    ctx.set_custom_uniforms().unwrap();
    ctx.set_custom_uniforms().unwrap();
    assert_eq!(probe.stats().uniform_writes, 1);

    let simple = ctx.create_shader(Simple);
    ctx.use_shader(simple).unwrap();
    ctx.set_custom_uniforms().unwrap();
    assert_eq!(probe.stats().uniform_writes, 1);
}

#[test]
fn geometry_cache() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let geo = quad();
    let same = geo.clone();

    assert_eq!(ctx.get_geometry_buffer(&geo).unwrap().index_count(), 6);
    assert_eq!(ctx.get_geometry_buffer(&same).unwrap().vertex_count(), 4);
    assert_eq!(ctx.get_geometry_buffer(&geo).unwrap().stride(), 32);

    let stats = probe.stats();
    assert_eq!(stats.buffers, 2);
    assert_eq!(stats.buffer_uploads, 2);

    let shader = ctx.create_shader(Simple);
    ctx.use_shader(shader).unwrap();
    for _ in 0..3 {
        ctx.draw_geo(&same, DrawMode::Triangles).unwrap();
    }

    let stats = probe.stats();
    assert_eq!(stats.vertex_arrays, 1);
    assert_eq!(stats.buffer_uploads, 2);

    assert!(ctx.release_geometry(geo.uid));
    assert!(!ctx.release_geometry(geo.uid));

    let stats = probe.stats();
    assert_eq!(stats.vertex_arrays, 0);
    assert_eq!(stats.buffers, 0);
}

#[test]
fn draw_selection() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let geo = quad();
    match ctx.draw_geo(&geo, DrawMode::Triangles) {
        Err(Error::NoShaderBound) => {}
        _ => panic!("drew without a shader"),
    }

    let shader = ctx.create_shader(Simple);
    ctx.use_shader(shader).unwrap();

    ctx.draw_geo(&geo, DrawMode::Triangles).unwrap();

    let mut strip = quad();
    strip.indices.clear();
    strip.uid = Geometry::default().uid;
    ctx.draw_geo(&strip, DrawMode::TriangleFan).unwrap();

    let stats = probe.stats();
    assert_eq!(
        stats.draws,
        vec![
            DrawCall::Elements {
                mode: DrawMode::Triangles,
                count: 6,
                instances: 1,
            },
            DrawCall::Arrays {
                mode: DrawMode::TriangleFan,
                first: 0,
                count: 4,
                instances: 1,
            },
        ]
    );
}

#[test]
fn screen_quad_draw() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let shader = ctx.create_shader(FlatShader);
    ctx.use_shader(shader).unwrap();

    let mode = ctx.current_draw_mode().unwrap();
    assert_eq!(mode, DrawMode::Triangles);

    let screen = tincture::video::flat::screen_quad();
    ctx.draw_geo(&screen, mode).unwrap();

    assert_eq!(
        probe.stats().draws,
        vec![DrawCall::Arrays {
            mode: DrawMode::Triangles,
            first: 0,
            count: 6,
            instances: 1,
        }]
    );
}

#[test]
fn instancing() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let geo = quad();
    let transforms = [[0.0, 0.0, 0.0, 1.0]; 3];

    match ctx.update_instance_buffer(&geo, &transforms) {
        Err(Error::GeometryNotPrepared(uid)) => assert_eq!(uid, geo.uid),
        _ => panic!("updated instances of an unknown geometry"),
    }

    let shader = ctx.create_shader(Instanced);
    ctx.use_shader(shader).unwrap();
    assert_eq!(ctx.attribute_location(shader, INSTANCE_ATTRIBUTE), Some(3));

    ctx.initialize_instance_buffer(&geo, &transforms).unwrap();
    assert_eq!(ctx.get_geometry_buffer(&geo).unwrap().instances(), 3);
    assert_eq!(probe.stats().buffers, 3);

    let mode = ctx.current_draw_mode().unwrap();
    ctx.draw_geo_instanced(&geo, mode, 3).unwrap();

    ctx.update_instance_buffer(&geo, &[[1.0, 0.0, 0.0, 0.5]; 5])
        .unwrap();
    assert_eq!(ctx.get_geometry_buffer(&geo).unwrap().instances(), 5);
    ctx.draw_geo_instanced(&geo, mode, 5).unwrap();
    ctx.check().unwrap();

    let stats = probe.stats();
    assert_eq!(stats.buffers, 3);
    assert_eq!(
        stats.draws,
        vec![
            DrawCall::Elements {
                mode: DrawMode::TriangleStrip,
                count: 6,
                instances: 3,
            },
            DrawCall::Elements {
                mode: DrawMode::TriangleStrip,
                count: 6,
                instances: 5,
            },
        ]
    );
}

#[test]
fn clear_and_read() {
    let mut ctx = context(HeadlessSurface::new(4, 4));

    ctx.set_clear_color([1.0f32, 0.0, 0.0, 1.0]);
    ctx.clear();
    assert_eq!(ctx.read_pixel(0, 0).unwrap(), [255, 0, 0, 255]);
    assert_eq!(ctx.read_pixel(3, 3).unwrap(), [255, 0, 0, 255]);
    assert_eq!(ctx.options().clear_color, Color::new(1.0, 0.0, 0.0, 1.0));

    ctx.set_clear_color(Color::transparent());
    ctx.clear();
    assert_eq!(ctx.read_pixel(1, 2).unwrap(), [0, 0, 0, 0]);
}

#[test]
fn resolution() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    ctx.set_resolution(6, 3);
    assert_eq!(probe.dimensions(), Vector2::new(6, 3));
    assert_eq!(ctx.width(), 6);
    assert_eq!(ctx.height(), 3);
    assert_eq!(ctx.aspect_ratio(), 2.0);
}

#[test]
fn state() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    ctx.disable(Capability::DepthTest);
    ctx.enable(Capability::CullFace);

    let enabled = probe.stats().enabled;
    assert!(!enabled.contains(&Capability::DepthTest));
    assert!(enabled.contains(&Capability::CullFace));

    ctx.set_options(RenderState::default());
    let enabled = probe.stats().enabled;
    assert!(enabled.contains(&Capability::DepthTest));
    assert!(!enabled.contains(&Capability::CullFace));
}

#[test]
fn teardown() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let baseline = probe.stats().live_objects();

    let mut ctx = context(surface);

    let shader = ctx.create_shader(Simple);
    ctx.use_shader(shader).unwrap();
    ctx.create_shader(Simple);

    let texture = Texture::new(Bitmap::solid(2, 2, [0, 255, 0, 255]));
    let handle = ctx.prepare_texture(&texture).unwrap();
    ctx.set_texture(handle, TextureTarget::Texture2D, 0, Some("imageTexture")).unwrap();

    ctx.draw_geo(&quad(), DrawMode::Triangles).unwrap();
    ctx.create_framebuffer("offscreen", 8, 8, None).unwrap();

    let stats = probe.stats();
    assert_eq!(stats.programs, 1);
    assert_eq!(stats.textures, 3);
    assert_eq!(stats.framebuffers, 2);
    assert_eq!(stats.renderbuffers, 2);
    assert_eq!(stats.vertex_arrays, 1);

    let surface = ctx.destroy();
    assert_eq!(surface.dimensions(), Vector2::new(4, 4));

    let stats = probe.stats();
    assert_eq!(stats.live_objects(), baseline);
    assert_eq!(stats.programs, 0);
    assert_eq!(stats.framebuffers, 0);
    assert_eq!(stats.renderbuffers, 0);
    assert_eq!(stats.textures, 0);
}

#[derive(Default, Clone)]
struct Hooks {
    created: Rc<Cell<usize>>,
    destroyed: Rc<Cell<usize>>,
    shader: Rc<Cell<Option<ShaderHandle>>>,
}

impl Lifecycle<HeadlessSurface> for Hooks {
    fn on_create(&mut self, ctx: &mut RenderContext<HeadlessSurface>) -> Result<()> {
        self.created.set(self.created.get() + 1);

        let shader = ctx.create_shader(Simple);
        ctx.use_shader(shader)?;
        self.shader.set(Some(shader));
        Ok(())
    }

    fn on_destroy(&mut self, ctx: &mut RenderContext<HeadlessSurface>) {
        assert_eq!(ctx.current_shader(), self.shader.get());
        self.destroyed.set(self.destroyed.get() + 1);
    }
}

struct Refuse;

impl Lifecycle<HeadlessSurface> for Refuse {
    fn on_create(&mut self, _: &mut RenderContext<HeadlessSurface>) -> Result<()> {
        Err(Error::Config("refused".into()))
    }
}

#[test]
fn lifecycle() {
    let hooks = Hooks::default();

    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let ctx =
        RenderContext::with_lifecycle(surface, ContextOptions::default(), hooks.clone()).unwrap();

    assert_eq!(hooks.created.get(), 1);
    assert_eq!(hooks.destroyed.get(), 0);
    assert_eq!(ctx.current_shader(), hooks.shader.get());
    assert_eq!(probe.stats().programs, 1);

    ctx.destroy();
    assert_eq!(hooks.destroyed.get(), 1);
    assert_eq!(probe.stats().programs, 0);

    let surface = HeadlessSurface::new(4, 4);
    assert!(RenderContext::with_lifecycle(surface, ContextOptions::default(), Refuse).is_err());
}
