extern crate env_logger;
extern crate tincture;

use tincture::prelude::*;
use tincture::video::backends::headless::DrawCall;
use tincture::video::flat::FLAT_VERTEX_SOURCE;

const TINT_FS: &str = r#"#version 300 es
precision mediump float;
uniform sampler2D imageTexture;
uniform float brightness;
uniform vec3 chromaKey;
in vec2 texCoords;
out vec4 oFragColor;
void main() { oFragColor = texture(imageTexture, texCoords) + vec4(chromaKey * brightness, 0.0); }
"#;

struct Tint;

impl ShaderDescriptor for Tint {
    fn vertex_source(&self) -> &str {
        FLAT_VERTEX_SOURCE
    }

    fn fragment_source(&self) -> &str {
        TINT_FS
    }

    fn custom_uniforms(&self) -> Option<Uniforms> {
        Some(
            Uniforms::new()
                .with("brightness", 0.5f32)
                .with("chromaKey", [0.0f32, 1.0, 0.0]),
        )
    }

    fn draw_mode(&self) -> DrawMode {
        DrawMode::TriangleStrip
    }
}

fn renderer(surface: HeadlessSurface) -> FlatRenderer<HeadlessSurface> {
    let _ = env_logger::try_init();
    FlatRenderer::new(surface, ContextOptions::default()).unwrap()
}

#[test]
fn solid_white() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut flat = renderer(surface);

    flat.set_image(Bitmap::solid(1, 1, [255, 255, 255, 255]));
    assert_eq!(probe.dimensions(), Vector2::new(1, 1));

    flat.draw().unwrap();
    assert_eq!(flat.read_pixel(0, 0).unwrap(), [255, 255, 255, 255]);

    let stats = probe.stats();
    assert_eq!(stats.textures, 1);
    assert_eq!(stats.texture_uploads, 1);
    assert_eq!(
        stats.draws,
        vec![DrawCall::Arrays {
            mode: DrawMode::Triangles,
            first: 0,
            count: 6,
            instances: 1,
        }]
    );
}

#[test]
fn stretch() {
    let mut flat = renderer(HeadlessSurface::new(4, 4));

    let pixels = vec![
        10, 20, 30, 255, //
        40, 50, 60, 255,
    ];
    flat.set_image(Bitmap::new(2, 1, pixels).unwrap());
    flat.context_mut().set_resolution(4, 2);
    flat.draw().unwrap();

    assert_eq!(flat.read_pixel(0, 0).unwrap(), [10, 20, 30, 255]);
    assert_eq!(flat.read_pixel(1, 1).unwrap(), [10, 20, 30, 255]);
    assert_eq!(flat.read_pixel(2, 0).unwrap(), [40, 50, 60, 255]);
    assert_eq!(flat.read_pixel(3, 1).unwrap(), [40, 50, 60, 255]);
}

#[test]
fn clear_pass() {
    let mut flat = renderer(HeadlessSurface::new(2, 2));

    flat.set_background([0.0f32, 1.0, 0.0, 1.0]);
    flat.draw().unwrap();
    assert_eq!(flat.read_pixel(1, 1).unwrap(), [0, 255, 0, 255]);

    flat.set_clear_pass(false);
    flat.set_background(Color::transparent());
    flat.draw().unwrap();
    assert_eq!(flat.read_pixel(1, 1).unwrap(), [0, 255, 0, 255]);

    flat.set_clear_pass(true);
    flat.draw().unwrap();
    assert_eq!(flat.read_pixel(1, 1).unwrap(), [0, 0, 0, 0]);
}

#[test]
fn custom_shader() {
    let surface = HeadlessSurface::new(2, 2);
    let probe = surface.probe();
    let mut flat = renderer(surface);

    flat.set_image(Bitmap::solid(2, 2, [1, 2, 3, 4]));

    let tint = flat.register_shader(Tint);
    assert_ne!(tint, flat.shader());
    flat.set_shader(tint);
    assert_eq!(flat.shader(), tint);

    // The sampler unit, then every custom uniform once.
    flat.draw().unwrap();
    flat.draw().unwrap();
    assert_eq!(probe.stats().uniform_writes, 3);

    flat.set_uniform("brightness", 0.75f32);
    flat.draw().unwrap();
    flat.draw().unwrap();
    assert_eq!(probe.stats().uniform_writes, 4);

    flat.clear_uniforms();
    flat.draw().unwrap();
    assert_eq!(probe.stats().uniform_writes, 5);

    let stats = probe.stats();
    assert_eq!(stats.compiles, 2);
    assert_eq!(stats.links, 1);
    assert!(stats.draws.iter().all(|v| match *v {
        DrawCall::Arrays { mode, count, .. } => mode == DrawMode::TriangleStrip && count == 6,
        _ => false,
    }));

    assert_eq!(flat.read_pixel(0, 0).unwrap(), [1, 2, 3, 4]);
}

#[test]
fn replace_image() {
    let surface = HeadlessSurface::new(2, 2);
    let probe = surface.probe();
    let mut flat = renderer(surface);

    flat.set_image(Bitmap::solid(2, 2, [255, 0, 0, 255]));
    flat.draw().unwrap();

    flat.set_image(Bitmap::solid(3, 3, [0, 0, 255, 255]));
    assert_eq!(probe.stats().textures, 0);
    assert_eq!(flat.context().dimensions(), Vector2::new(3, 3));

    flat.draw().unwrap();
    assert_eq!(flat.read_pixel(2, 2).unwrap(), [0, 0, 255, 255]);

    let stats = probe.stats();
    assert_eq!(stats.textures, 1);
    assert_eq!(stats.texture_uploads, 2);
}

#[test]
fn clear_buffers() {
    let surface = HeadlessSurface::new(2, 2);
    let probe = surface.probe();
    let mut flat = renderer(surface);

    flat.set_image(Bitmap::solid(1, 1, [7, 7, 7, 255]));
    flat.draw().unwrap();

    let stats = probe.stats();
    assert_eq!(stats.textures, 1);
    assert_eq!(stats.buffers, 2);
    assert_eq!(stats.vertex_arrays, 1);

    flat.clear_buffers();

    let stats = probe.stats();
    assert_eq!(stats.textures, 0);
    assert_eq!(stats.buffers, 0);
    assert_eq!(stats.vertex_arrays, 0);
    assert_eq!(stats.programs, 1);

    flat.draw().unwrap();
    assert_eq!(flat.read_pixel(0, 0).unwrap(), [7, 7, 7, 255]);
    assert_eq!(probe.stats().texture_uploads, 2);
}

#[test]
fn offscreen() {
    let mut flat = renderer(HeadlessSurface::new(4, 4));
    flat.set_image(Bitmap::solid(4, 4, [0, 128, 255, 255]));

    flat.context_mut()
        .create_framebuffer("graded", 4, 4, None)
        .unwrap();
    flat.context_mut().use_framebuffer("graded").unwrap();
    flat.draw().unwrap();

    let ctx = flat.context_mut();
    ctx.finalize_framebuffer("graded").unwrap();
    ctx.clear_framebuffer();
    assert_eq!(
        ctx.read_pixel_from_buffer("graded", 3, 0).unwrap(),
        [0, 128, 255, 255]
    );

    // Nothing was drawn onto the surface itself.
    assert_eq!(flat.read_pixel(3, 0).unwrap(), [0, 0, 0, 0]);
}

#[test]
fn destroy() {
    let surface = HeadlessSurface::new(2, 2);
    let probe = surface.probe();
    let mut flat = renderer(surface);

    flat.set_image(Bitmap::solid(1, 1, [1, 1, 1, 1]));
    flat.draw().unwrap();
    flat.context_mut()
        .create_framebuffer("fbo", 2, 2, None)
        .unwrap();
    assert!(probe.stats().live_objects() > 0);

    let surface = flat.destroy();
    assert_eq!(surface.dimensions(), Vector2::new(1, 1));
    assert_eq!(probe.stats().live_objects(), 0);
}

#[test]
fn with_context() {
    let options = ContextOptions::default().with_debug(true, 2);
    let ctx = RenderContext::new(HeadlessSurface::new(2, 2), options).unwrap();
    let mut flat = FlatRenderer::with_context(ctx);

    flat.set_image(Bitmap::solid(1, 1, [9, 9, 9, 9]));
    flat.draw().unwrap();
    assert_eq!(flat.read_pixel(0, 0).unwrap(), [9, 9, 9, 9]);
    assert_eq!(flat.context().error_policy(), ErrorPolicy::FailFast);
}

#[test]
fn orientation() {
    let mut flat = renderer(HeadlessSurface::new(4, 4));

    // Bottom row red, top row blue.
    let pixels = vec![
        255, 0, 0, 255, //
        0, 0, 255, 255,
    ];
    flat.set_image(Bitmap::new(1, 2, pixels).unwrap());
    flat.draw().unwrap();

    assert_eq!(flat.read_pixel(0, 0).unwrap(), [255, 0, 0, 255]);
    assert_eq!(flat.read_pixel(0, 1).unwrap(), [0, 0, 255, 255]);

    let screen = flat.screen();
    let bottom = screen.uvs[0];
    let top = screen.uvs[4];
    assert!(screen.vertices[0][1] < screen.vertices[4][1]);
    assert!(bottom[1] < top[1]);
}
