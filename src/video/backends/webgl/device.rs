use web_sys::WebGl2RenderingContext as WebGL;
use web_sys::{
    WebGlBuffer, WebGlFramebuffer, WebGlProgram, WebGlRenderbuffer, WebGlShader, WebGlTexture,
    WebGlUniformLocation, WebGlVertexArrayObject,
};

use crate::errors::Result;
use crate::video::assets::prelude::*;
use crate::video::backends::utils::ObjectTable;
use crate::video::backends::{
    ActiveVariable, Attachment, BufferHint, BufferTarget, Capability, ContextKind, Device,
    FramebufferStatus, FramebufferTarget, Location, ObjectId, PixelFormat,
};

use super::types;

struct ProgramData {
    program: WebGlProgram,
    // Uniform locations are opaque objects in WebGL, a `Location` indexes
    // into this list.
    locations: Vec<WebGlUniformLocation>,
}

/// A `Device` over a WebGL2 rendering context, or a WebGL1 one restricted to
/// the entry points both versions share.
pub struct WebGLDevice {
    ctx: WebGL,
    kind: ContextKind,
    max_samples: u32,

    program: Option<ObjectId>,
    shaders: ObjectTable<WebGlShader>,
    programs: ObjectTable<ProgramData>,
    textures: ObjectTable<WebGlTexture>,
    framebuffers: ObjectTable<WebGlFramebuffer>,
    renderbuffers: ObjectTable<WebGlRenderbuffer>,
    buffers: ObjectTable<WebGlBuffer>,
    vertex_arrays: ObjectTable<WebGlVertexArrayObject>,
}

impl WebGLDevice {
    pub(crate) fn new(ctx: WebGL, kind: ContextKind) -> Self {
        let max_samples = match kind {
            ContextKind::Preferred => ctx
                .get_parameter(WebGL::MAX_SAMPLES)
                .ok()
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0) as u32,
            ContextKind::Baseline => 0,
        };

        info!("WebGLDevice {:?}, {} samples at most.", kind, max_samples);

        WebGLDevice {
            ctx,
            kind,
            max_samples,
            program: None,
            shaders: ObjectTable::new(),
            programs: ObjectTable::new(),
            textures: ObjectTable::new(),
            framebuffers: ObjectTable::new(),
            renderbuffers: ObjectTable::new(),
            buffers: ObjectTable::new(),
            vertex_arrays: ObjectTable::new(),
        }
    }

    fn active_variables(&self, program: ObjectId, uniforms: bool) -> Vec<ActiveVariable> {
        let program = match self.programs.get(program) {
            Some(v) => &v.program,
            None => return Vec::new(),
        };

        let pname = if uniforms {
            WebGL::ACTIVE_UNIFORMS
        } else {
            WebGL::ACTIVE_ATTRIBUTES
        };

        let num = self
            .ctx
            .get_program_parameter(program, pname)
            .as_f64()
            .unwrap_or(0.0) as u32;

        let mut variables = Vec::with_capacity(num as usize);
        for i in 0..num {
            let info = if uniforms {
                self.ctx.get_active_uniform(program, i)
            } else {
                self.ctx.get_active_attrib(program, i)
            };

            if let Some(info) = info {
                let name = info.name();
                let name = match name.find('[') {
                    Some(i) => name[..i].to_owned(),
                    None => name,
                };

                let location = if uniforms {
                    -1
                } else {
                    self.ctx.get_attrib_location(program, &name)
                };

                variables.push(ActiveVariable { name, location });
            }
        }

        variables
    }
}

impl Device for WebGLDevice {
    fn kind(&self) -> ContextKind {
        self.kind
    }

    fn max_samples(&self) -> u32 {
        self.max_samples
    }

    fn supports_vertex_arrays(&self) -> bool {
        self.kind == ContextKind::Preferred
    }

    fn supports_instancing(&self) -> bool {
        self.kind == ContextKind::Preferred
    }

    fn has_extension(&self, name: &str) -> bool {
        // Querying an extension also enables it.
        self.ctx
            .get_extension(name)
            .ok()
            .and_then(|v| v)
            .is_some()
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        if enabled {
            self.ctx.enable(capability.into());
        } else {
            self.ctx.disable(capability.into());
        }
    }

    fn cull_face_back(&mut self) {
        self.ctx.cull_face(WebGL::BACK);
    }

    fn blend_alpha(&mut self) {
        self.ctx
            .blend_func(WebGL::SRC_ALPHA, WebGL::ONE_MINUS_SRC_ALPHA);
    }

    fn viewport(&mut self, width: u32, height: u32) {
        self.ctx.viewport(0, 0, width as i32, height as i32);
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        self.ctx.clear_color(color[0], color[1], color[2], color[3]);
    }

    fn clear(&mut self, color: bool, depth: bool) {
        let mut bits = 0;
        if color {
            bits |= WebGL::COLOR_BUFFER_BIT;
        }

        if depth {
            bits |= WebGL::DEPTH_BUFFER_BIT;
        }

        if bits != 0 {
            self.ctx.clear(bits);
        }
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<ObjectId> {
        let shader = self
            .ctx
            .create_shader(stage.into())
            .ok_or_else(|| backend_err!("[WebGL] Unable to create {:?} shader.", stage))?;

        Ok(self.shaders.create(shader))
    }

    fn compile_shader(&mut self, shader: ObjectId, source: &str) {
        if let Some(shader) = self.shaders.get(shader) {
            self.ctx.shader_source(shader, source);
            self.ctx.compile_shader(shader);
        }
    }

    fn shader_compile_status(&mut self, shader: ObjectId) -> bool {
        self.shaders
            .get(shader)
            .and_then(|v| {
                self.ctx
                    .get_shader_parameter(v, WebGL::COMPILE_STATUS)
                    .as_bool()
            })
            .unwrap_or(false)
    }

    fn shader_info_log(&mut self, shader: ObjectId) -> String {
        self.shaders
            .get(shader)
            .and_then(|v| self.ctx.get_shader_info_log(v))
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: ObjectId) {
        if let Some(shader) = self.shaders.free(shader) {
            self.ctx.delete_shader(Some(&shader));
        }
    }

    fn create_program(&mut self) -> Result<ObjectId> {
        let program = self
            .ctx
            .create_program()
            .ok_or_else(|| backend_err!("[WebGL] Unable to create program."))?;

        Ok(self.programs.create(ProgramData {
            program,
            locations: Vec::new(),
        }))
    }

    fn attach_shader(&mut self, program: ObjectId, shader: ObjectId) {
        if let (Some(p), Some(s)) = (self.programs.get(program), self.shaders.get(shader)) {
            self.ctx.attach_shader(&p.program, s);
        }
    }

    fn detach_shader(&mut self, program: ObjectId, shader: ObjectId) {
        if let (Some(p), Some(s)) = (self.programs.get(program), self.shaders.get(shader)) {
            self.ctx.detach_shader(&p.program, s);
        }
    }

    fn link_program(&mut self, program: ObjectId) {
        if let Some(p) = self.programs.get(program) {
            self.ctx.link_program(&p.program);
        }
    }

    fn program_link_status(&mut self, program: ObjectId) -> bool {
        self.programs
            .get(program)
            .and_then(|v| {
                self.ctx
                    .get_program_parameter(&v.program, WebGL::LINK_STATUS)
                    .as_bool()
            })
            .unwrap_or(false)
    }

    fn program_info_log(&mut self, program: ObjectId) -> String {
        self.programs
            .get(program)
            .and_then(|v| self.ctx.get_program_info_log(&v.program))
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: Option<ObjectId>) {
        self.program = program;
        let program = program.and_then(|v| self.programs.get(v));
        self.ctx.use_program(program.map(|v| &v.program));
    }

    fn delete_program(&mut self, program: ObjectId) {
        if self.program == Some(program) {
            self.program = None;
        }

        if let Some(data) = self.programs.free(program) {
            self.ctx.delete_program(Some(&data.program));
        }
    }

    fn active_uniforms(&mut self, program: ObjectId) -> Vec<ActiveVariable> {
        let mut variables = self.active_variables(program, true);

        let ctx = &self.ctx;
        if let Some(data) = self.programs.get_mut(program) {
            let ProgramData {
                ref program,
                ref mut locations,
            } = *data;

            locations.clear();
            variables.retain(|v| match ctx.get_uniform_location(program, &v.name) {
                Some(location) => {
                    locations.push(location);
                    true
                }
                None => false,
            });

            for (i, v) in variables.iter_mut().enumerate() {
                v.location = i as Location;
            }
        }

        variables
    }

    fn active_attributes(&mut self, program: ObjectId) -> Vec<ActiveVariable> {
        self.active_variables(program, false)
    }

    fn uniform(&mut self, location: Location, variable: UniformVariable) {
        let location = match self
            .program
            .and_then(|v| self.programs.get(v))
            .and_then(|v| v.locations.get(location as usize))
        {
            Some(v) => v,
            None => return,
        };

        let ctx = &self.ctx;
        let location = Some(location);
        match variable {
            UniformVariable::Bool(v) => ctx.uniform1i(location, v as i32),
            UniformVariable::I32(v) => ctx.uniform1i(location, v),
            UniformVariable::F32(v) => ctx.uniform1f(location, v),
            UniformVariable::Vector2f(v) => ctx.uniform2f(location, v[0], v[1]),
            UniformVariable::Vector3f(v) => ctx.uniform3f(location, v[0], v[1], v[2]),
            UniformVariable::Vector4f(v) => ctx.uniform4f(location, v[0], v[1], v[2], v[3]),
            UniformVariable::Matrix2f(v) => {
                let mut mv = [v[0][0], v[0][1], v[1][0], v[1][1]];
                ctx.uniform_matrix2fv_with_f32_array(location, false, &mut mv[..])
            }
            UniformVariable::Matrix3f(v) => {
                let mut mv = [0.0; 9];
                for (i, column) in v.iter().enumerate() {
                    mv[i * 3..i * 3 + 3].copy_from_slice(column);
                }

                ctx.uniform_matrix3fv_with_f32_array(location, false, &mut mv[..])
            }
            UniformVariable::Matrix4f(v) => {
                let mut mv = [0.0; 16];
                for (i, column) in v.iter().enumerate() {
                    mv[i * 4..i * 4 + 4].copy_from_slice(column);
                }

                ctx.uniform_matrix4fv_with_f32_array(location, false, &mut mv[..])
            }
        }
    }

    fn create_texture(&mut self) -> Result<ObjectId> {
        let texture = self
            .ctx
            .create_texture()
            .ok_or_else(|| backend_err!("[WebGL] Unable to create texture."))?;

        Ok(self.textures.create(texture))
    }

    fn active_texture(&mut self, unit: u32) {
        self.ctx.active_texture(WebGL::TEXTURE0 + unit);
    }

    fn bind_texture(&mut self, texture: Option<ObjectId>) {
        let texture = texture.and_then(|v| self.textures.get(v));
        self.ctx.bind_texture(WebGL::TEXTURE_2D, texture);
    }

    fn tex_parameters(&mut self, params: SamplerParams) {
        let wrap_s: u32 = params.wrap_s.into();
        let wrap_t: u32 = params.wrap_t.into();
        let mag: u32 = params.mag_filter.into();
        let min: u32 = params.min_filter.into();

        let t = WebGL::TEXTURE_2D;
        self.ctx.tex_parameteri(t, WebGL::TEXTURE_WRAP_S, wrap_s as i32);
        self.ctx.tex_parameteri(t, WebGL::TEXTURE_WRAP_T, wrap_t as i32);
        self.ctx.tex_parameteri(t, WebGL::TEXTURE_MAG_FILTER, mag as i32);
        self.ctx.tex_parameteri(t, WebGL::TEXTURE_MIN_FILTER, min as i32);
    }

    fn tex_image_2d(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
    ) {
        let (mut internal_format, format, mut tp) = types::pixel_format(format);
        if self.kind == ContextKind::Baseline {
            // WebGL1 only accepts unsized internal formats.
            internal_format = format;
            if format == WebGL::DEPTH_COMPONENT {
                tp = WebGL::UNSIGNED_SHORT;
            }
        }

        let result = self
            .ctx
            .tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
                WebGL::TEXTURE_2D,
                0,
                internal_format as i32,
                width as i32,
                height as i32,
                0,
                format,
                tp,
                pixels,
            );

        if let Err(err) = result {
            warn!("[WebGL] texImage2D failed: {:?}.", err);
        }
    }

    fn compressed_tex_image_2d(&mut self, format: u32, width: u32, height: u32, data: &[u8]) {
        self.ctx.compressed_tex_image_2d_with_u8_array(
            WebGL::TEXTURE_2D,
            0,
            format,
            width as i32,
            height as i32,
            0,
            data,
        );
    }

    fn generate_mipmap(&mut self) {
        self.ctx.generate_mipmap(WebGL::TEXTURE_2D);
    }

    fn delete_texture(&mut self, texture: ObjectId) {
        if let Some(texture) = self.textures.free(texture) {
            self.ctx.delete_texture(Some(&texture));
        }
    }

    fn create_framebuffer(&mut self) -> Result<ObjectId> {
        let fbo = self
            .ctx
            .create_framebuffer()
            .ok_or_else(|| backend_err!("[WebGL] Unable to create framebuffer."))?;

        Ok(self.framebuffers.create(fbo))
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<ObjectId>) {
        let target = if self.kind == ContextKind::Baseline {
            WebGL::FRAMEBUFFER
        } else {
            target.into()
        };

        let fbo = framebuffer.and_then(|v| self.framebuffers.get(v));
        self.ctx.bind_framebuffer(target, fbo);
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: ObjectId) {
        let rb = self.renderbuffers.get(renderbuffer);
        self.ctx.framebuffer_renderbuffer(
            WebGL::FRAMEBUFFER,
            attachment.into(),
            WebGL::RENDERBUFFER,
            rb,
        );
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: ObjectId) {
        let texture = self.textures.get(texture);
        self.ctx.framebuffer_texture_2d(
            WebGL::FRAMEBUFFER,
            attachment.into(),
            WebGL::TEXTURE_2D,
            texture,
            0,
        );
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        self.ctx
            .check_framebuffer_status(WebGL::FRAMEBUFFER)
            .into()
    }

    fn blit_framebuffer(
        &mut self,
        width: u32,
        height: u32,
        attachment: Attachment,
        filter: TextureFilter,
    ) {
        let (w, h) = (width as i32, height as i32);
        self.ctx.blit_framebuffer(
            0,
            0,
            w,
            h,
            0,
            0,
            w,
            h,
            types::buffer_bit(attachment),
            filter.into(),
        );
    }

    fn delete_framebuffer(&mut self, framebuffer: ObjectId) {
        if let Some(fbo) = self.framebuffers.free(framebuffer) {
            self.ctx.delete_framebuffer(Some(&fbo));
        }
    }

    fn create_renderbuffer(&mut self) -> Result<ObjectId> {
        let rb = self
            .ctx
            .create_renderbuffer()
            .ok_or_else(|| backend_err!("[WebGL] Unable to create renderbuffer."))?;

        Ok(self.renderbuffers.create(rb))
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<ObjectId>) {
        let rb = renderbuffer.and_then(|v| self.renderbuffers.get(v));
        self.ctx.bind_renderbuffer(WebGL::RENDERBUFFER, rb);
    }

    fn renderbuffer_storage_multisample(
        &mut self,
        samples: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) {
        let (internal_format, _, _) = types::pixel_format(format);
        if self.kind == ContextKind::Baseline {
            let internal_format = match format {
                PixelFormat::Rgba8 => WebGL::RGBA4,
                PixelFormat::Depth16 => WebGL::DEPTH_COMPONENT16,
            };

            self.ctx.renderbuffer_storage(
                WebGL::RENDERBUFFER,
                internal_format,
                width as i32,
                height as i32,
            );
        } else {
            self.ctx.renderbuffer_storage_multisample(
                WebGL::RENDERBUFFER,
                samples as i32,
                internal_format,
                width as i32,
                height as i32,
            );
        }
    }

    fn delete_renderbuffer(&mut self, renderbuffer: ObjectId) {
        if let Some(rb) = self.renderbuffers.free(renderbuffer) {
            self.ctx.delete_renderbuffer(Some(&rb));
        }
    }

    fn create_buffer(&mut self) -> Result<ObjectId> {
        let buffer = self
            .ctx
            .create_buffer()
            .ok_or_else(|| backend_err!("[WebGL] Unable to create buffer."))?;

        Ok(self.buffers.create(buffer))
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<ObjectId>) {
        let buffer = buffer.and_then(|v| self.buffers.get(v));
        self.ctx.bind_buffer(target.into(), buffer);
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], hint: BufferHint) {
        if data.is_empty() {
            self.ctx.buffer_data_with_i32(target.into(), 0, hint.into());
        } else {
            self.ctx
                .buffer_data_with_u8_array(target.into(), data, hint.into());
        }
    }

    fn delete_buffer(&mut self, buffer: ObjectId) {
        if let Some(buffer) = self.buffers.free(buffer) {
            self.ctx.delete_buffer(Some(&buffer));
        }
    }

    fn create_vertex_array(&mut self) -> Result<ObjectId> {
        if self.kind == ContextKind::Baseline {
            return Err(backend_err!("[WebGL] Vertex arrays need a WebGL2 context."));
        }

        let vao = self
            .ctx
            .create_vertex_array()
            .ok_or_else(|| backend_err!("[WebGL] Unable to create vertex array."))?;

        Ok(self.vertex_arrays.create(vao))
    }

    fn bind_vertex_array(&mut self, vao: Option<ObjectId>) {
        if self.kind == ContextKind::Baseline {
            return;
        }

        let vao = vao.and_then(|v| self.vertex_arrays.get(v));
        self.ctx.bind_vertex_array(vao);
    }

    fn delete_vertex_array(&mut self, vao: ObjectId) {
        if let Some(vao) = self.vertex_arrays.free(vao) {
            self.ctx.delete_vertex_array(Some(&vao));
        }
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        self.ctx.enable_vertex_attrib_array(location);
    }

    fn vertex_attrib_pointer(&mut self, location: u32, size: u8, stride: usize, offset: usize) {
        self.ctx.vertex_attrib_pointer_with_i32(
            location,
            i32::from(size),
            WebGL::FLOAT,
            false,
            stride as i32,
            offset as i32,
        );
    }

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32) {
        if self.kind == ContextKind::Preferred {
            self.ctx.vertex_attrib_divisor(location, divisor);
        }
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.ctx.draw_arrays(mode.into(), first as i32, count as i32);
    }

    fn draw_elements(&mut self, mode: DrawMode, count: u32) {
        self.ctx
            .draw_elements_with_i32(mode.into(), count as i32, WebGL::UNSIGNED_SHORT, 0);
    }

    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: u32, count: u32, instances: u32) {
        self.ctx.draw_arrays_instanced(
            mode.into(),
            first as i32,
            count as i32,
            instances as i32,
        );
    }

    fn draw_elements_instanced(&mut self, mode: DrawMode, count: u32, instances: u32) {
        self.ctx.draw_elements_instanced_with_i32(
            mode.into(),
            count as i32,
            WebGL::UNSIGNED_SHORT,
            0,
            instances as i32,
        );
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Result<[u8; 4]> {
        let mut pixel = [0u8; 4];
        self.ctx
            .read_pixels_with_opt_u8_array(
                x as i32,
                y as i32,
                1,
                1,
                WebGL::RGBA,
                WebGL::UNSIGNED_BYTE,
                Some(&mut pixel[..]),
            )
            .map_err(|err| backend_err!("[WebGL] readPixels failed: {:?}.", err))?;

        self.check()?;
        Ok(pixel)
    }

    fn check(&mut self) -> Result<()> {
        match self.ctx.get_error() {
            WebGL::NO_ERROR => Ok(()),

            WebGL::INVALID_ENUM => Err(backend_err!(
                "[WebGL] An unacceptable value is specified for an enumerated argument."
            )),

            WebGL::INVALID_VALUE => Err(backend_err!(
                "[WebGL] A numeric argument is out of range."
            )),

            WebGL::INVALID_OPERATION => Err(backend_err!(
                "[WebGL] The specified operation is not allowed in the current state."
            )),

            WebGL::INVALID_FRAMEBUFFER_OPERATION => Err(backend_err!(
                "[WebGL] The command is trying to render to or read from the framebuffer while \
                 the currently bound framebuffer is not framebuffer complete."
            )),

            WebGL::OUT_OF_MEMORY => Err(backend_err!(
                "[WebGL] There is not enough memory left to execute the command."
            )),

            _ => Err(backend_err!("[WebGL] Oops, Unknown WebGL error.")),
        }
    }
}
