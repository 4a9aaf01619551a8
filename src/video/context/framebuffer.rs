use crate::errors::{Error, Result};
use crate::video::assets::prelude::*;
use crate::video::backends::{
    Attachment, Device, FramebufferStatus, FramebufferTarget, ObjectId, PixelFormat, Surface,
};
use crate::video::framebuffer::{depth_name, FramebufferParams, FramebufferSet};
use crate::video::options::{ContextOptions, ErrorPolicy};

use super::RenderContext;

impl<S: Surface> RenderContext<S> {
    /// Creates the framebuffer set `name`, replacing an existing one. Its
    /// color texture is registered as buffer texture `name`, the depth
    /// texture as `name.depth`.
    pub fn create_framebuffer<T: Into<Option<FramebufferParams>>>(
        &mut self,
        name: &str,
        width: u32,
        height: u32,
        params: T,
    ) -> Result<()> {
        if self.destroy_framebuffer(name) {
            debug!("Replacing framebuffer '{}'.", name);
        }

        let mut params = params.into().unwrap_or_default();
        if params.antialiasing && self.samples == 0 {
            warn!(
                "Framebuffer '{}' requested antialiasing, but the device can not multisample.",
                name
            );
            params.antialiasing = false;
        }

        let samples = self.samples;
        let (draw, color_renderbuffer, depth_renderbuffer) =
            draw_target(&mut self.device, samples, width, height)?;

        let (output, color, depth) = match self.output_target(width, height, params) {
            Ok(target) => target,
            Err(err) => {
                self.device.delete_framebuffer(draw);
                self.device.delete_renderbuffer(color_renderbuffer);
                self.device.delete_renderbuffer(depth_renderbuffer);
                return Err(err);
            }
        };

        if let Some(handle) = color {
            self.buffer_textures.insert(name.to_owned(), handle);
        }

        if let Some(handle) = depth {
            self.buffer_textures.insert(depth_name(name), handle);
        }

        debug!(
            "Created framebuffer '{}' of {}x{} with {} samples, {:?}.",
            name, width, height, samples, params
        );

        self.framebuffers.insert(
            name.to_owned(),
            FramebufferSet {
                name: name.to_owned(),
                width,
                height,
                samples,
                params,
                draw,
                color_renderbuffer,
                depth_renderbuffer,
                output,
                color,
                depth,
            },
        );

        self.check_debug()
    }

    /// Directs draws into `name`: its multisampled target when antialiasing,
    /// its output target otherwise.
    pub fn use_framebuffer(&mut self, name: &str) -> Result<()> {
        let target = self
            .framebuffers
            .get(name)
            .map(|v| v.target())
            .ok_or_else(|| Error::FramebufferNotExists(name.to_owned()))?;

        self.device
            .bind_framebuffer(FramebufferTarget::Both, Some(target));

        let (verbose, fail_fast) = status_checks(&self.options);
        if verbose || fail_fast {
            let status = self.device.check_framebuffer_status();
            if status != FramebufferStatus::Complete {
                if verbose {
                    error!("Framebuffer '{}' is incomplete: {:?}.", name, status);
                }

                if fail_fast {
                    return Err(Error::FramebufferIncomplete(name.to_owned(), status));
                }
            }
        }

        Ok(())
    }

    /// Resolves the multisampled target of `name` into its output textures.
    /// Color is filtered linearly, depth with nearest sampling. Does nothing
    /// if the set is not antialiased.
    pub fn finalize_framebuffer(&mut self, name: &str) -> Result<()> {
        let (draw, output, width, height, params) = {
            let fbo = self
                .framebuffers
                .get(name)
                .ok_or_else(|| Error::FramebufferNotExists(name.to_owned()))?;
            (fbo.draw, fbo.output, fbo.width, fbo.height, fbo.params)
        };

        if !params.antialiasing {
            return Ok(());
        }

        self.device.bind_framebuffer(FramebufferTarget::Read, Some(draw));
        self.device
            .bind_framebuffer(FramebufferTarget::Draw, Some(output));

        if params.color {
            self.device
                .blit_framebuffer(width, height, Attachment::Color, TextureFilter::Linear);
        }

        if params.depth {
            self.device
                .blit_framebuffer(width, height, Attachment::Depth, TextureFilter::Nearest);
        }

        self.check_debug()
    }

    /// Rebinds the surface framebuffer.
    pub fn clear_framebuffer(&mut self) {
        self.device.bind_framebuffer(FramebufferTarget::Both, None);
    }

    /// The texture registered as `name`. Color attachments are registered
    /// under the framebuffer name, depth attachments under `name.depth`.
    pub fn get_buffer_texture(&self, name: &str) -> Option<TextureHandle> {
        self.buffer_textures.get(name).cloned()
    }

    pub fn framebuffer(&self, name: &str) -> Option<&FramebufferSet> {
        self.framebuffers.get(name)
    }

    /// Reads one pixel of the output target of `name`, then rebinds the
    /// surface framebuffer.
    pub fn read_pixel_from_buffer(&mut self, name: &str, x: u32, y: u32) -> Result<[u8; 4]> {
        let output = self
            .framebuffers
            .get(name)
            .map(|v| v.output)
            .ok_or_else(|| Error::FramebufferNotExists(name.to_owned()))?;

        self.device
            .bind_framebuffer(FramebufferTarget::Both, Some(output));
        let pixel = self.device.read_pixel(x, y);
        self.clear_framebuffer();
        pixel
    }

    /// Recreates `name` with new dimensions and the same attachments. The
    /// previous textures are deleted, handles to them become invalid.
    pub fn resize_framebuffer(&mut self, name: &str, width: u32, height: u32) -> Result<()> {
        let params = self
            .framebuffers
            .get(name)
            .map(|v| v.params)
            .ok_or_else(|| Error::FramebufferNotExists(name.to_owned()))?;

        self.create_framebuffer(name, width, height, params)
    }

    /// Deletes the framebuffer set `name` with its renderbuffers and textures.
    /// Returns false if there was none.
    pub fn destroy_framebuffer(&mut self, name: &str) -> bool {
        let fbo = match self.framebuffers.remove(name) {
            Some(fbo) => fbo,
            None => return false,
        };

        self.device.bind_framebuffer(FramebufferTarget::Both, None);
        self.device.delete_framebuffer(fbo.draw);
        self.device.delete_framebuffer(fbo.output);

        self.device.bind_renderbuffer(None);
        self.device.delete_renderbuffer(fbo.color_renderbuffer);
        self.device.delete_renderbuffer(fbo.depth_renderbuffer);

        if let Some(handle) = fbo.color {
            self.buffer_textures.remove(name);
            self.free_texture(handle);
        }

        if let Some(handle) = fbo.depth {
            self.buffer_textures.remove(&depth_name(name));
            self.free_texture(handle);
        }

        debug!("Destroyed framebuffer '{}'.", name);
        true
    }

    /// Creates the attachment textures requested by `params` and the
    /// framebuffer they are attached to.
    fn output_target(
        &mut self,
        width: u32,
        height: u32,
        params: FramebufferParams,
    ) -> Result<(ObjectId, Option<TextureHandle>, Option<TextureHandle>)> {
        let color = if params.color {
            Some(self.create_attachment_texture(PixelFormat::Rgba8, width, height)?)
        } else {
            None
        };

        let depth = if params.depth {
            match self.create_attachment_texture(PixelFormat::Depth16, width, height) {
                Ok(handle) => Some(handle),
                Err(err) => {
                    if let Some(handle) = color {
                        self.free_texture(handle);
                    }

                    return Err(err);
                }
            }
        } else {
            None
        };

        let output = match self.device.create_framebuffer() {
            Ok(id) => id,
            Err(err) => {
                for handle in color.into_iter().chain(depth) {
                    self.free_texture(handle);
                }

                return Err(err);
            }
        };

        self.device
            .bind_framebuffer(FramebufferTarget::Both, Some(output));

        if let Some(id) = color.and_then(|v| self.textures.get(v)).map(|v| v.id) {
            self.device.framebuffer_texture_2d(Attachment::Color, id);
        }

        if let Some(id) = depth.and_then(|v| self.textures.get(v)).map(|v| v.id) {
            self.device.framebuffer_texture_2d(Attachment::Depth, id);
        }

        self.device.bind_framebuffer(FramebufferTarget::Both, None);
        Ok((output, color, depth))
    }
}

/// Creates the multisampled framebuffer with its color and depth
/// renderbuffers. Nothing is left behind on failure.
fn draw_target<D: Device>(
    device: &mut D,
    samples: u32,
    width: u32,
    height: u32,
) -> Result<(ObjectId, ObjectId, ObjectId)> {
    let draw = device.create_framebuffer()?;
    device.bind_framebuffer(FramebufferTarget::Both, Some(draw));

    let color = match renderbuffer(device, samples, PixelFormat::Rgba8, width, height) {
        Ok(id) => id,
        Err(err) => {
            device.bind_framebuffer(FramebufferTarget::Both, None);
            device.delete_framebuffer(draw);
            return Err(err);
        }
    };

    let depth = match renderbuffer(device, samples, PixelFormat::Depth16, width, height) {
        Ok(id) => id,
        Err(err) => {
            device.bind_framebuffer(FramebufferTarget::Both, None);
            device.delete_framebuffer(draw);
            device.delete_renderbuffer(color);
            return Err(err);
        }
    };

    device.framebuffer_renderbuffer(Attachment::Color, color);
    device.framebuffer_renderbuffer(Attachment::Depth, depth);
    device.bind_framebuffer(FramebufferTarget::Both, None);
    Ok((draw, color, depth))
}

/// Whether an incomplete framebuffer is logged, and whether it is an error.
fn status_checks(options: &ContextOptions) -> (bool, bool) {
    let verbose = options.debug && options.debug_level > 1;
    (verbose, options.error_policy() == ErrorPolicy::FailFast)
}

fn renderbuffer<D: Device>(
    device: &mut D,
    samples: u32,
    format: PixelFormat,
    width: u32,
    height: u32,
) -> Result<ObjectId> {
    let id = device.create_renderbuffer()?;
    device.bind_renderbuffer(Some(id));
    device.renderbuffer_storage_multisample(samples, format, width, height);
    Ok(id)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn status_logging() {
        let options = ContextOptions::default().with_debug(true, 1);
        assert_eq!(status_checks(&options), (false, true));

        let options = ContextOptions::default().with_debug(true, 2);
        assert_eq!(status_checks(&options), (true, true));

        let options = options.with_error_policy(ErrorPolicy::Degrade);
        assert_eq!(status_checks(&options), (true, false));

        let options = ContextOptions::default().with_debug(false, 3);
        assert_eq!(status_checks(&options), (false, false));
    }
}
