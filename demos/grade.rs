//! Runs a color-grading filter over a small generated image on the headless
//! backend, once straight onto the surface and once through a multisampled
//! framebuffer.
//!
//! `RUST_LOG=debug cargo run --example grade` shows every resource the context
//! creates.

#[macro_use]
extern crate log;

use tincture::prelude::*;
use tincture::video::flat::FLAT_VERTEX_SOURCE;

#[derive(Debug, Clone, Copy)]
struct Grade {
    chroma_key: [f32; 3],
    chroma_threshold: f32,
    brightness: f32,
    whitebalance: f32,
    contrast: f32,
    saturation: f32,
    blacks: f32,
    whites: f32,
}

impl Default for Grade {
    fn default() -> Self {
        Grade {
            chroma_key: [0.0, 0.0, 0.0],
            chroma_threshold: 0.5,
            brightness: 0.0,
            whitebalance: 0.0,
            contrast: 1.0,
            saturation: 0.0,
            blacks: 0.5,
            whites: 0.5,
        }
    }
}

struct GradeShader {
    grade: Grade,
}

impl ShaderDescriptor for GradeShader {
    fn vertex_source(&self) -> &str {
        FLAT_VERTEX_SOURCE
    }

    fn fragment_source(&self) -> &str {
        include_str!("shaders/grade.fs")
    }

    fn custom_uniforms(&self) -> Option<Uniforms> {
        let g = &self.grade;
        Some(
            Uniforms::new()
                .with("chromaKey", g.chroma_key)
                .with("chromaThreshold", g.chroma_threshold)
                .with("brightness", g.brightness)
                .with("whitebalance", g.whitebalance)
                .with("contrast", g.contrast)
                .with("saturation", g.saturation)
                .with("blacks", g.blacks)
                .with("whites", g.whites),
        )
    }
}

fn checker(size: u32) -> Bitmap {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            if (x + y) % 2 == 0 {
                pixels.extend_from_slice(&[255, 128, 0, 255]);
            } else {
                pixels.extend_from_slice(&[0, 64, 255, 255]);
            }
        }
    }

    Bitmap::new(size, size, pixels).unwrap()
}

fn run() -> Result<()> {
    let surface = HeadlessSurface::new(64, 64);
    let probe = surface.probe();

    let options = ContextOptions::default().with_debug(true, 2);
    let mut flat = FlatRenderer::new(surface, options)?;

    flat.set_image(checker(8));
    flat.set_background([0.1f32, 0.1, 0.1, 1.0]);

    let grade = flat.register_shader(GradeShader {
        grade: Grade::default(),
    });
    flat.set_shader(grade);

    // Sliders of an editor would end up here, written after the defaults.
    flat.set_uniform("brightness", 0.1f32);
    flat.set_uniform("contrast", 1.2f32);

    for frame in 0..3 {
        flat.draw()?;
        info!("Frame {} pixel (0, 0) = {:?}.", frame, flat.read_pixel(0, 0)?);
    }

    {
        let ctx = flat.context_mut();
        ctx.create_framebuffer("graded", 8, 8, None)?;
        ctx.use_framebuffer("graded")?;
    }

    flat.set_clear_pass(false);
    flat.draw()?;

    let ctx = flat.context_mut();
    ctx.finalize_framebuffer("graded")?;
    ctx.clear_framebuffer();

    for (x, y) in &[(0, 0), (1, 0), (7, 7)] {
        info!(
            "Resolved pixel ({}, {}) = {:?}.",
            x,
            y,
            ctx.read_pixel_from_buffer("graded", *x, *y)?
        );
    }

    let stats = probe.stats();
    info!(
        "{} compiles, {} links, {} draws, {} blits, {} uniform writes.",
        stats.compiles,
        stats.links,
        stats.draws.len(),
        stats.blits.len(),
        stats.uniform_writes
    );

    flat.destroy();
    info!("{} objects left after teardown.", probe.stats().live_objects());
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        error!("{}", err);
        ::std::process::exit(1);
    }
}
