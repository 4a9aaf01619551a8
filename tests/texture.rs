extern crate env_logger;
extern crate tincture;

use tincture::prelude::*;

fn context(surface: HeadlessSurface) -> RenderContext<HeadlessSurface> {
    let _ = env_logger::try_init();
    RenderContext::new(surface, ContextOptions::default()).unwrap()
}

fn compressed(format: CompressedFormat) -> Texture {
    Texture::compressed(CompressedImage {
        format,
        width: 8,
        height: 4,
        data: vec![0; 32],
    })
}

#[test]
fn cache_identity() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let texture = Texture::new(Bitmap::solid(2, 2, [0, 0, 255, 255]));
    let handle = ctx.prepare_texture(&texture).unwrap();

    for _ in 0..4 {
        let copy = texture.clone();
        assert_eq!(ctx.prepare_texture(&copy).unwrap(), handle);
    }

    let stats = probe.stats();
    assert_eq!(stats.textures, 1);
    assert_eq!(stats.texture_uploads, 1);
    assert_eq!(stats.mipmaps, 0);

    assert_eq!(ctx.cached_texture(texture.uid.unwrap()), Some(handle));
    assert_eq!(ctx.texture_dimensions(handle), Some(Vector2::new(2, 2)));

    let other = Texture::new(Bitmap::solid(2, 2, [0, 0, 255, 255]));
    assert_ne!(ctx.prepare_texture(&other).unwrap(), handle);
    assert_eq!(probe.stats().textures, 2);
}

#[test]
fn missing_uid() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let mut texture = Texture::new(Bitmap::solid(1, 1, [0; 4]));
    texture.uid = None;

    match ctx.prepare_texture(&texture) {
        Err(Error::InvalidTexture) => {}
        _ => panic!("prepared a texture without uid"),
    }

    assert_eq!(probe.stats().textures, 0);
}

#[test]
fn placeholder() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let texture = Texture {
        uid: Some(uuid::Uuid::new_v4()),
        ..Default::default()
    };

    let handle = ctx.prepare_texture(&texture).unwrap();
    assert_eq!(ctx.texture_dimensions(handle), Some(Vector2::new(1, 1)));
    assert_eq!(probe.stats().texture_uploads, 1);
}

#[test]
fn mipmaps() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let bitmap = Bitmap::solid(4, 4, [255; 4]);

    ctx.prepare_texture(&Texture::new(bitmap.clone())).unwrap();
    assert_eq!(probe.stats().mipmaps, 0);

    ctx.prepare_texture(&Texture::new(bitmap.clone()).with_mipmaps(true))
        .unwrap();
    assert_eq!(probe.stats().mipmaps, 1);

    let texture = Texture::new(bitmap)
        .with_wrap(TextureWrap::ClampToEdge, TextureWrap::MirroredRepeat)
        .with_filter(TextureFilter::Linear, TextureFilter::LinearMipmapLinear);
    ctx.prepare_texture(&texture).unwrap();
    assert_eq!(probe.stats().mipmaps, 2);
}

#[test]
fn compressed_without_extension() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let texture = compressed(CompressedFormat::Dxt5);
    let handle = ctx.prepare_texture(&texture).unwrap();
    assert_eq!(ctx.texture_dimensions(handle), Some(Vector2::new(8, 4)));

    let stats = probe.stats();
    assert_eq!(stats.textures, 1);
    assert_eq!(stats.compressed_uploads, 0);

    ctx.set_texture(handle, TextureTarget::Texture2D, 0, None).unwrap();
    ctx.check().unwrap();
}

#[test]
fn compressed_dxt1_only() {
    let surface = HeadlessSurface::new(4, 4).with_extensions(&["GL_EXT_texture_compression_dxt1"]);
    let probe = surface.probe();
    let mut ctx = context(surface);

    ctx.prepare_texture(&compressed(CompressedFormat::Dxt1))
        .unwrap();
    ctx.prepare_texture(&compressed(CompressedFormat::Dxt1OneBitAlpha))
        .unwrap();
    assert_eq!(probe.stats().compressed_uploads, 2);

    ctx.prepare_texture(&compressed(CompressedFormat::Dxt3))
        .unwrap();
    ctx.prepare_texture(&compressed(CompressedFormat::Dxt5))
        .unwrap();

    let stats = probe.stats();
    assert_eq!(stats.compressed_uploads, 2);
    assert_eq!(stats.textures, 4);
}

#[test]
fn compressed_s3tc() {
    for extension in &[
        "WEBGL_compressed_texture_s3tc",
        "MOZ_WEBGL_compressed_texture_s3tc",
        "WEBKIT_WEBGL_compressed_texture_s3tc",
        "GL_EXT_texture_compression_s3tc",
    ] {
        let surface = HeadlessSurface::new(4, 4).with_extensions(&[*extension]);
        let probe = surface.probe();
        let mut ctx = context(surface);

        let texture = compressed(CompressedFormat::Dxt5);
        ctx.prepare_texture(&texture).unwrap();
        ctx.prepare_texture(&texture).unwrap();

        let stats = probe.stats();
        assert_eq!(stats.compressed_uploads, 1);
        assert_eq!(stats.texture_uploads, 0);
    }
}

#[test]
fn update() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let texture = Texture::new(Bitmap::solid(2, 2, [255, 0, 0, 255]));
    let handle = ctx.prepare_texture(&texture).unwrap();

    let mut next = texture.clone();
    next.image = Some(Bitmap::solid(3, 1, [0, 255, 0, 255]));
    assert_eq!(ctx.update_texture(&next).unwrap(), handle);

    assert_eq!(probe.stats().texture_uploads, 2);
    assert_eq!(probe.stats().textures, 1);
    assert_eq!(ctx.texture_dimensions(handle), Some(Vector2::new(3, 1)));

    // Updating a texture which was never prepared prepares it.
    let fresh = Texture::new(Bitmap::solid(1, 1, [0; 4]));
    let created = ctx.update_texture(&fresh).unwrap();
    assert_eq!(ctx.cached_texture(fresh.uid.unwrap()), Some(created));
    assert_eq!(probe.stats().textures, 2);
}

#[test]
fn release() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let texture = Texture::new(Bitmap::solid(2, 2, [255, 0, 0, 255]));
    let uid = texture.uid.unwrap();
    let handle = ctx.prepare_texture(&texture).unwrap();

    assert!(ctx.release_texture(uid));
    assert!(!ctx.release_texture(uid));
    assert_eq!(ctx.cached_texture(uid), None);
    assert_eq!(ctx.texture_dimensions(handle), None);
    assert_eq!(probe.stats().textures, 0);

    match ctx.set_texture(handle, TextureTarget::Texture2D, 0, None) {
        Err(Error::TextureHandleInvalid(v)) => assert_eq!(v, handle),
        _ => panic!("bound a released texture"),
    }

    let again = ctx.prepare_texture(&texture).unwrap();
    assert_ne!(again, handle);
    assert_eq!(probe.stats().texture_uploads, 2);
}

#[test]
fn sampler_uniform() {
    const FS: &str = r#"#version 300 es
    precision mediump float;
    uniform sampler2D imageTexture;
    out vec4 oFragColor;
    void main() { oFragColor = texture(imageTexture, vec2(0.5)); }
    "#;

    struct Sample;

    impl ShaderDescriptor for Sample {
        fn vertex_source(&self) -> &str {
            tincture::video::flat::FLAT_VERTEX_SOURCE
        }

        fn fragment_source(&self) -> &str {
            FS
        }
    }

    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let mut ctx = context(surface);

    let texture = Texture::new(Bitmap::solid(1, 1, [9, 8, 7, 6]));
    let handle = ctx.prepare_texture(&texture).unwrap();

    assert!(ctx.set_texture(handle, TextureTarget::Texture2D, 2, Some("imageTexture")).is_err());

    let shader = ctx.create_shader(Sample);
    ctx.use_shader(shader).unwrap();
    ctx.set_texture(handle, TextureTarget::Texture2D, 2, Some("imageTexture")).unwrap();
    assert_eq!(probe.stats().uniform_writes, 1);

    let screen = tincture::video::flat::screen_quad();
    ctx.draw_geo(&screen, DrawMode::Triangles).unwrap();
    assert_eq!(ctx.read_pixel(3, 3).unwrap(), [9, 8, 7, 6]);
}

#[test]
fn failed_upload_is_not_leaked() {
    let surface = HeadlessSurface::new(4, 4);
    let probe = surface.probe();
    let options = ContextOptions::default().with_debug(true, 1);
    let mut ctx = RenderContext::new(surface, options).unwrap();

    // Leaves an error pending on the device.
    ctx.set_texture(None, TextureTarget::Texture2D, 99, None).unwrap();

    let texture = Texture::new(Bitmap::solid(1, 1, [255; 4]));
    assert!(ctx.prepare_texture(&texture).is_err());
    assert_eq!(ctx.cached_texture(texture.uid.unwrap()), None);
    assert_eq!(probe.stats().textures, 0);

    let handle = ctx.prepare_texture(&texture).unwrap();
    assert_eq!(ctx.cached_texture(texture.uid.unwrap()), Some(handle));
    assert_eq!(probe.stats().textures, 1);

    ctx.destroy();
    assert_eq!(probe.stats().live_objects(), 0);
}
