use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::math::Vector2;
use crate::video::assets::prelude::*;
use crate::video::backends::{Device, ObjectId, PixelFormat, Surface};

use super::RenderContext;

const COMPRESSED_RGB_S3TC_DXT1: u32 = 0x83F0;
const COMPRESSED_RGBA_S3TC_DXT1: u32 = 0x83F1;
const COMPRESSED_RGBA_S3TC_DXT3: u32 = 0x83F2;
const COMPRESSED_RGBA_S3TC_DXT5: u32 = 0x83F3;

/// Extensions exposing every S3TC format, in lookup order.
const S3TC_EXTENSIONS: &[&str] = &[
    "WEBGL_compressed_texture_s3tc",
    "MOZ_WEBGL_compressed_texture_s3tc",
    "WEBKIT_WEBGL_compressed_texture_s3tc",
    "GL_EXT_texture_compression_s3tc",
];

/// Only provides the two DXT1 variants.
const DXT1_EXTENSION: &str = "GL_EXT_texture_compression_dxt1";

pub struct TextureObject {
    pub(super) id: ObjectId,
    pub(super) uid: Option<Uuid>,
    pub(super) dimensions: Vector2<u32>,
}

impl<S: Surface> RenderContext<S> {
    /// Returns the texture realized from `texture`, creating and uploading it
    /// the first time its `uid` is seen.
    pub fn prepare_texture(&mut self, texture: &Texture) -> Result<TextureHandle> {
        let uid = texture.uid.ok_or(Error::InvalidTexture)?;

        if let Some(&handle) = self.texture_uids.get(&uid) {
            if self.textures.is_alive(handle) {
                return Ok(handle);
            }
        }

        let (id, dimensions) = match texture.format {
            Some(ref image) => self.create_compressed_texture(image)?,
            None => self.create_texture(texture)?,
        };

        let handle = self.textures.create(TextureObject {
            id,
            uid: Some(uid),
            dimensions,
        });

        self.texture_uids.insert(uid, handle);
        debug!("Created {} for texture {}.", handle, uid);
        Ok(handle)
    }

    /// Re-uploads the bitmap of an uncompressed texture into the GPU texture
    /// realized for its `uid`, or prepares it if there is none yet.
    pub fn update_texture(&mut self, texture: &Texture) -> Result<TextureHandle> {
        let uid = texture.uid.ok_or(Error::InvalidTexture)?;
        let handle = match self.texture_uids.get(&uid) {
            Some(&handle) if self.textures.is_alive(handle) => handle,
            _ => return self.prepare_texture(texture),
        };

        let image = match (texture.image.as_ref(), texture.format.as_ref()) {
            (Some(image), None) => image,
            (_, Some(_)) => {
                warn!("Compressed texture {} can not be updated.", uid);
                return Ok(handle);
            }
            (None, None) => {
                warn!("Tried to update texture {} without an image.", uid);
                return Ok(handle);
            }
        };

        let object = self
            .textures
            .get_mut(handle)
            .ok_or_else(|| Error::TextureHandleInvalid(handle))?;

        let dimensions = image.dimensions();
        self.device.bind_texture(Some(object.id));
        self.device.tex_image_2d(
            PixelFormat::Rgba8,
            dimensions.x,
            dimensions.y,
            Some(image.pixels()),
        );

        if texture.needs_mipmaps() {
            self.device.generate_mipmap();
        }

        object.dimensions = dimensions;
        Ok(handle)
    }

    /// Deletes the GPU texture realized for `uid`. Returns false if there was
    /// none.
    pub fn release_texture(&mut self, uid: Uuid) -> bool {
        let handle = match self.texture_uids.remove(&uid) {
            Some(handle) => handle,
            None => return false,
        };

        match self.textures.free(handle) {
            Some(object) => {
                self.device.delete_texture(object.id);
                true
            }
            None => false,
        }
    }

    /// The texture cached for `uid`, if it was prepared.
    pub fn cached_texture(&self, uid: Uuid) -> Option<TextureHandle> {
        self.texture_uids
            .get(&uid)
            .cloned()
            .filter(|v| self.textures.is_alive(*v))
    }

    pub fn texture_dimensions(&self, handle: TextureHandle) -> Option<Vector2<u32>> {
        self.textures.get(handle).map(|v| v.dimensions)
    }

    pub(super) fn texture_id(&self, handle: TextureHandle) -> Result<ObjectId> {
        self.textures
            .get(handle)
            .map(|v| v.id)
            .ok_or_else(|| Error::TextureHandleInvalid(handle))
    }

    /// Creates a texture without uid, used as framebuffer attachment.
    pub(super) fn create_attachment_texture(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) -> Result<TextureHandle> {
        let params = match format {
            PixelFormat::Rgba8 => SamplerParams {
                wrap_s: TextureWrap::ClampToEdge,
                wrap_t: TextureWrap::ClampToEdge,
                mag_filter: TextureFilter::Linear,
                min_filter: TextureFilter::Linear,
            },
            PixelFormat::Depth16 => SamplerParams {
                wrap_s: TextureWrap::Repeat,
                wrap_t: TextureWrap::Repeat,
                mag_filter: TextureFilter::Nearest,
                min_filter: TextureFilter::Nearest,
            },
        };

        let id = self.device.create_texture()?;
        self.device.bind_texture(Some(id));
        self.device.tex_parameters(params);
        self.device.tex_image_2d(format, width, height, None);
        self.device.bind_texture(None);

        Ok(self.textures.create(TextureObject {
            id,
            uid: None,
            dimensions: Vector2::new(width, height),
        }))
    }

    pub(super) fn free_texture(&mut self, handle: TextureHandle) {
        if let Some(object) = self.textures.free(handle) {
            if let Some(uid) = object.uid {
                self.texture_uids.remove(&uid);
            }

            self.device.delete_texture(object.id);
        }
    }

    fn create_texture(&mut self, texture: &Texture) -> Result<(ObjectId, Vector2<u32>)> {
        let id = self.device.create_texture()?;
        self.device.bind_texture(Some(id));
        self.device.tex_parameters(texture.sampler());

        let dimensions = match texture.image {
            Some(ref image) => {
                let dimensions = image.dimensions();
                self.device.tex_image_2d(
                    PixelFormat::Rgba8,
                    dimensions.x,
                    dimensions.y,
                    Some(image.pixels()),
                );

                dimensions
            }
            None => {
                // A transparent placeholder until the content is available.
                self.device
                    .tex_image_2d(PixelFormat::Rgba8, 1, 1, Some(&[0, 0, 0, 0]));
                Vector2::new(1, 1)
            }
        };

        if texture.needs_mipmaps() {
            self.device.generate_mipmap();
        }

        if let Err(err) = self.check_debug() {
            self.device.bind_texture(None);
            self.device.delete_texture(id);
            return Err(err);
        }

        Ok((id, dimensions))
    }

    fn create_compressed_texture(
        &mut self,
        image: &CompressedImage,
    ) -> Result<(ObjectId, Vector2<u32>)> {
        let id = self.device.create_texture()?;
        self.device.bind_texture(Some(id));

        match s3tc_format(&self.device, image.format) {
            Some(format) => {
                self.device
                    .compressed_tex_image_2d(format, image.width, image.height, &image.data);
            }
            None => {
                warn!(
                    "{:?} is not supported by the device, the texture stays empty.",
                    image.format
                );
            }
        }

        self.device.tex_parameters(SamplerParams {
            wrap_s: TextureWrap::Repeat,
            wrap_t: TextureWrap::Repeat,
            mag_filter: TextureFilter::Linear,
            min_filter: TextureFilter::Linear,
        });

        Ok((id, Vector2::new(image.width, image.height)))
    }
}

/// Resolves the native enum of `format`, or `None` if no extension of the
/// device provides it.
fn s3tc_format<D: Device>(device: &D, format: CompressedFormat) -> Option<u32> {
    let native = match format {
        CompressedFormat::Dxt1 => COMPRESSED_RGB_S3TC_DXT1,
        CompressedFormat::Dxt1OneBitAlpha => COMPRESSED_RGBA_S3TC_DXT1,
        CompressedFormat::Dxt3 => COMPRESSED_RGBA_S3TC_DXT3,
        CompressedFormat::Dxt5 => COMPRESSED_RGBA_S3TC_DXT5,
    };

    if S3TC_EXTENSIONS.iter().any(|v| device.has_extension(v)) {
        return Some(native);
    }

    match format {
        CompressedFormat::Dxt1 | CompressedFormat::Dxt1OneBitAlpha
            if device.has_extension(DXT1_EXTENSION) =>
        {
            Some(native)
        }
        _ => None,
    }
}
