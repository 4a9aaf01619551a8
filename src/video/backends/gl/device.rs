use std::ffi::CString;
use std::os::raw::c_void;
use std::ptr;

use gl;
use gl::types::*;

use crate::errors::Result;
use crate::video::assets::prelude::*;
use crate::video::backends::{
    ActiveVariable, Attachment, BufferHint, BufferTarget, Capability, ContextKind, Device,
    FramebufferStatus, FramebufferTarget, Location, ObjectId, PixelFormat,
};

use super::capabilities::{Capabilities, Version};
use super::types;

/// A `Device` issuing calls into the OpenGL context that was current when the
/// function pointers were loaded.
pub struct GLDevice {
    kind: ContextKind,
    capabilities: Capabilities,
}

impl GLDevice {
    /// # Safety
    ///
    /// The OpenGL context the functions were loaded from must be current in this
    /// thread for the whole lifetime of the device.
    pub unsafe fn new(kind: ContextKind) -> Result<Self> {
        let capabilities = Capabilities::parse()?;
        info!(
            "GLDevice {:?} on {} ({}), {:?}.",
            kind, capabilities.renderer, capabilities.vendor, capabilities.version
        );

        let supported = match kind {
            ContextKind::Preferred => capabilities.version.is_preferred(),
            ContextKind::Baseline => capabilities.version.is_baseline(),
        };

        if !supported {
            return Err(backend_err!(
                "[GL] {:?} is not sufficient for a {:?} context.",
                capabilities.version,
                kind
            ));
        }

        check()?;
        Ok(GLDevice { kind, capabilities })
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Desktop OpenGL does not accept `#version 300 es` sources without
    /// `GL_ARB_ES3_compatibility`, those are rewritten to GLSL 3.30.
    fn translate<'a>(&self, source: &'a str) -> ::std::borrow::Cow<'a, str> {
        let es3 = source.trim_start().starts_with("#version 300 es");
        let desktop = match self.capabilities.version {
            Version::GL(_, _) => !self.capabilities.extensions.gl_arb_es3_compatibility,
            Version::ES(_, _) => false,
        };

        if es3 && desktop && self.capabilities.version >= Version::GL(3, 3) {
            source.replacen("#version 300 es", "#version 330 core", 1).into()
        } else {
            source.into()
        }
    }

    unsafe fn active_variables(
        program: GLuint,
        count: GLenum,
        max_length: GLenum,
        uniforms: bool,
    ) -> Vec<ActiveVariable> {
        let mut num = 0;
        let mut len = 0;
        gl::GetProgramiv(program, count, &mut num);
        gl::GetProgramiv(program, max_length, &mut len);

        let mut variables = Vec::with_capacity(num.max(0) as usize);
        let mut buf = vec![0u8; len.max(1) as usize];

        for i in 0..num.max(0) as GLuint {
            let mut written = 0;
            let mut size = 0;
            let mut tp = 0;

            if uniforms {
                gl::GetActiveUniform(
                    program,
                    i,
                    buf.len() as GLsizei,
                    &mut written,
                    &mut size,
                    &mut tp,
                    buf.as_mut_ptr() as *mut GLchar,
                );
            } else {
                gl::GetActiveAttrib(
                    program,
                    i,
                    buf.len() as GLsizei,
                    &mut written,
                    &mut size,
                    &mut tp,
                    buf.as_mut_ptr() as *mut GLchar,
                );
            }

            let name = String::from_utf8_lossy(&buf[..written.max(0) as usize]).into_owned();
            let c_name = match CString::new(name.as_bytes()) {
                Ok(v) => v,
                Err(_) => continue,
            };

            let location = if uniforms {
                gl::GetUniformLocation(program, c_name.as_ptr())
            } else {
                gl::GetAttribLocation(program, c_name.as_ptr())
            };

            // Arrays are reported as `name[0]`, they are addressed by the bare name.
            let name = match name.find('[') {
                Some(i) => name[..i].to_owned(),
                None => name,
            };

            variables.push(ActiveVariable { name, location });
        }

        variables
    }

    unsafe fn info_log(
        id: GLuint,
        get: unsafe fn(GLuint, GLenum, *mut GLint),
        log: unsafe fn(GLuint, GLsizei, *mut GLsizei, *mut GLchar),
    ) -> String {
        let mut len = 0;
        get(id, gl::INFO_LOG_LENGTH, &mut len);
        if len <= 0 {
            return String::new();
        }

        let mut buf = vec![0u8; len as usize];
        let mut written = 0;
        log(id, len, &mut written, buf.as_mut_ptr() as *mut GLchar);
        buf.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&buf).into_owned()
    }

    unsafe fn gen(f: unsafe fn(GLsizei, *mut GLuint), what: &str) -> Result<ObjectId> {
        let mut id = 0;
        f(1, &mut id);
        if id == 0 {
            check()?;
            return Err(backend_err!("[GL] Failed to create {}.", what));
        }

        Ok(id)
    }
}

impl Device for GLDevice {
    fn kind(&self) -> ContextKind {
        self.kind
    }

    fn max_samples(&self) -> u32 {
        self.capabilities.max_samples
    }

    fn supports_vertex_arrays(&self) -> bool {
        self.capabilities.has_vertex_arrays()
    }

    fn supports_instancing(&self) -> bool {
        self.capabilities.has_instancing()
    }

    fn has_extension(&self, name: &str) -> bool {
        self.capabilities.extensions.has(name)
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        unsafe {
            if enabled {
                gl::Enable(capability.into());
            } else {
                gl::Disable(capability.into());
            }
        }
    }

    fn cull_face_back(&mut self) {
        unsafe { gl::CullFace(gl::BACK) }
    }

    fn blend_alpha(&mut self) {
        unsafe { gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA) }
    }

    fn viewport(&mut self, width: u32, height: u32) {
        unsafe { gl::Viewport(0, 0, width as GLsizei, height as GLsizei) }
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        unsafe { gl::ClearColor(color[0], color[1], color[2], color[3]) }
    }

    fn clear(&mut self, color: bool, depth: bool) {
        let mut bits = 0;
        if color {
            bits |= gl::COLOR_BUFFER_BIT;
        }

        if depth {
            bits |= gl::DEPTH_BUFFER_BIT;
        }

        if bits != 0 {
            unsafe { gl::Clear(bits) }
        }
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<ObjectId> {
        let id = unsafe { gl::CreateShader(stage.into()) };
        if id == 0 {
            unsafe { check()? };
            return Err(backend_err!("[GL] Failed to create {:?} shader.", stage));
        }

        Ok(id)
    }

    fn compile_shader(&mut self, shader: ObjectId, source: &str) {
        let source = self.translate(source);
        let c_str = match CString::new(source.as_bytes()) {
            Ok(v) => v,
            Err(_) => {
                warn!("[GL] Shader source contains a nul byte.");
                return;
            }
        };

        unsafe {
            gl::ShaderSource(shader, 1, &c_str.as_ptr(), ptr::null());
            gl::CompileShader(shader);
        }
    }

    fn shader_compile_status(&mut self, shader: ObjectId) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe { gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status) };
        status == GLint::from(gl::TRUE)
    }

    fn shader_info_log(&mut self, shader: ObjectId) -> String {
        unsafe {
            GLDevice::info_log(
                shader,
                gl::GetShaderiv,
                gl::GetShaderInfoLog,
            )
        }
    }

    fn delete_shader(&mut self, shader: ObjectId) {
        unsafe { gl::DeleteShader(shader) }
    }

    fn create_program(&mut self) -> Result<ObjectId> {
        let id = unsafe { gl::CreateProgram() };
        if id == 0 {
            unsafe { check()? };
            return Err(backend_err!("[GL] Failed to create program."));
        }

        Ok(id)
    }

    fn attach_shader(&mut self, program: ObjectId, shader: ObjectId) {
        unsafe { gl::AttachShader(program, shader) }
    }

    fn detach_shader(&mut self, program: ObjectId, shader: ObjectId) {
        unsafe { gl::DetachShader(program, shader) }
    }

    fn link_program(&mut self, program: ObjectId) {
        unsafe { gl::LinkProgram(program) }
    }

    fn program_link_status(&mut self, program: ObjectId) -> bool {
        let mut status = GLint::from(gl::FALSE);
        unsafe { gl::GetProgramiv(program, gl::LINK_STATUS, &mut status) };
        status == GLint::from(gl::TRUE)
    }

    fn program_info_log(&mut self, program: ObjectId) -> String {
        unsafe {
            GLDevice::info_log(
                program,
                gl::GetProgramiv,
                gl::GetProgramInfoLog,
            )
        }
    }

    fn use_program(&mut self, program: Option<ObjectId>) {
        unsafe { gl::UseProgram(program.unwrap_or(0)) }
    }

    fn delete_program(&mut self, program: ObjectId) {
        unsafe { gl::DeleteProgram(program) }
    }

    fn active_uniforms(&mut self, program: ObjectId) -> Vec<ActiveVariable> {
        unsafe {
            GLDevice::active_variables(
                program,
                gl::ACTIVE_UNIFORMS,
                gl::ACTIVE_UNIFORM_MAX_LENGTH,
                true,
            )
        }
    }

    fn active_attributes(&mut self, program: ObjectId) -> Vec<ActiveVariable> {
        unsafe {
            GLDevice::active_variables(
                program,
                gl::ACTIVE_ATTRIBUTES,
                gl::ACTIVE_ATTRIBUTE_MAX_LENGTH,
                false,
            )
        }
    }

    fn uniform(&mut self, location: Location, variable: UniformVariable) {
        unsafe {
            match variable {
                UniformVariable::Bool(v) => gl::Uniform1i(location, v as GLint),
                UniformVariable::I32(v) => gl::Uniform1i(location, v),
                UniformVariable::F32(v) => gl::Uniform1f(location, v),
                UniformVariable::Vector2f(v) => gl::Uniform2f(location, v[0], v[1]),
                UniformVariable::Vector3f(v) => gl::Uniform3f(location, v[0], v[1], v[2]),
                UniformVariable::Vector4f(v) => gl::Uniform4f(location, v[0], v[1], v[2], v[3]),
                UniformVariable::Matrix2f(v) => {
                    gl::UniformMatrix2fv(location, 1, gl::FALSE, v[0].as_ptr())
                }
                UniformVariable::Matrix3f(v) => {
                    gl::UniformMatrix3fv(location, 1, gl::FALSE, v[0].as_ptr())
                }
                UniformVariable::Matrix4f(v) => {
                    gl::UniformMatrix4fv(location, 1, gl::FALSE, v[0].as_ptr())
                }
            }
        }
    }

    fn create_texture(&mut self) -> Result<ObjectId> {
        unsafe { GLDevice::gen(gl::GenTextures, "texture") }
    }

    fn active_texture(&mut self, unit: u32) {
        unsafe { gl::ActiveTexture(gl::TEXTURE0 + unit) }
    }

    fn bind_texture(&mut self, texture: Option<ObjectId>) {
        unsafe { gl::BindTexture(gl::TEXTURE_2D, texture.unwrap_or(0)) }
    }

    fn tex_parameters(&mut self, params: SamplerParams) {
        let wrap_s: GLenum = params.wrap_s.into();
        let wrap_t: GLenum = params.wrap_t.into();
        let mag: GLenum = params.mag_filter.into();
        let min: GLenum = params.min_filter.into();

        unsafe {
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, wrap_s as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, wrap_t as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, mag as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MIN_FILTER, min as GLint);
        }
    }

    fn tex_image_2d(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
    ) {
        let (internal_format, format, tp) = types::pixel_format(format);
        let data = match pixels {
            Some(v) if !v.is_empty() => v.as_ptr() as *const c_void,
            _ => ptr::null(),
        };

        unsafe {
            gl::PixelStorei(gl::UNPACK_ALIGNMENT, 1);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                internal_format as GLint,
                width as GLsizei,
                height as GLsizei,
                0,
                format,
                tp,
                data,
            );
        }
    }

    fn compressed_tex_image_2d(&mut self, format: u32, width: u32, height: u32, data: &[u8]) {
        unsafe {
            gl::CompressedTexImage2D(
                gl::TEXTURE_2D,
                0,
                format,
                width as GLsizei,
                height as GLsizei,
                0,
                data.len() as GLsizei,
                data.as_ptr() as *const c_void,
            );
        }
    }

    fn generate_mipmap(&mut self) {
        unsafe { gl::GenerateMipmap(gl::TEXTURE_2D) }
    }

    fn delete_texture(&mut self, texture: ObjectId) {
        unsafe { gl::DeleteTextures(1, &texture) }
    }

    fn create_framebuffer(&mut self) -> Result<ObjectId> {
        unsafe { GLDevice::gen(gl::GenFramebuffers, "framebuffer") }
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<ObjectId>) {
        unsafe { gl::BindFramebuffer(target.into(), framebuffer.unwrap_or(0)) }
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: ObjectId) {
        unsafe {
            gl::FramebufferRenderbuffer(
                gl::FRAMEBUFFER,
                attachment.into(),
                gl::RENDERBUFFER,
                renderbuffer,
            )
        }
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: ObjectId) {
        unsafe {
            gl::FramebufferTexture2D(
                gl::FRAMEBUFFER,
                attachment.into(),
                gl::TEXTURE_2D,
                texture,
                0,
            )
        }
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        unsafe { gl::CheckFramebufferStatus(gl::FRAMEBUFFER).into() }
    }

    fn blit_framebuffer(
        &mut self,
        width: u32,
        height: u32,
        attachment: Attachment,
        filter: TextureFilter,
    ) {
        let (w, h) = (width as GLint, height as GLint);
        unsafe {
            gl::BlitFramebuffer(
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
            )
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: ObjectId) {
        unsafe { gl::DeleteFramebuffers(1, &framebuffer) }
    }

    fn create_renderbuffer(&mut self) -> Result<ObjectId> {
        unsafe { GLDevice::gen(gl::GenRenderbuffers, "renderbuffer") }
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<ObjectId>) {
        unsafe { gl::BindRenderbuffer(gl::RENDERBUFFER, renderbuffer.unwrap_or(0)) }
    }

    fn renderbuffer_storage_multisample(
        &mut self,
        samples: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) {
        let (internal_format, _, _) = types::pixel_format(format);
        unsafe {
            if multisampled(self.capabilities.max_samples, samples) {
                gl::RenderbufferStorageMultisample(
                    gl::RENDERBUFFER,
                    samples as GLsizei,
                    internal_format,
                    width as GLsizei,
                    height as GLsizei,
                )
            } else {
                gl::RenderbufferStorage(
                    gl::RENDERBUFFER,
                    internal_format,
                    width as GLsizei,
                    height as GLsizei,
                )
            }
        }
    }

    fn delete_renderbuffer(&mut self, renderbuffer: ObjectId) {
        unsafe { gl::DeleteRenderbuffers(1, &renderbuffer) }
    }

    fn create_buffer(&mut self) -> Result<ObjectId> {
        unsafe { GLDevice::gen(gl::GenBuffers, "buffer") }
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<ObjectId>) {
        unsafe { gl::BindBuffer(target.into(), buffer.unwrap_or(0)) }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], hint: BufferHint) {
        let value = if data.is_empty() {
            ptr::null()
        } else {
            data.as_ptr() as *const c_void
        };

        unsafe { gl::BufferData(target.into(), data.len() as GLsizeiptr, value, hint.into()) }
    }

    fn delete_buffer(&mut self, buffer: ObjectId) {
        unsafe { gl::DeleteBuffers(1, &buffer) }
    }

    fn create_vertex_array(&mut self) -> Result<ObjectId> {
        unsafe { GLDevice::gen(gl::GenVertexArrays, "vertex array") }
    }

    fn bind_vertex_array(&mut self, vao: Option<ObjectId>) {
        unsafe { gl::BindVertexArray(vao.unwrap_or(0)) }
    }

    fn delete_vertex_array(&mut self, vao: ObjectId) {
        unsafe { gl::DeleteVertexArrays(1, &vao) }
    }

    fn enable_vertex_attrib_array(&mut self, location: u32) {
        unsafe { gl::EnableVertexAttribArray(location) }
    }

    fn vertex_attrib_pointer(&mut self, location: u32, size: u8, stride: usize, offset: usize) {
        unsafe {
            gl::VertexAttribPointer(
                location,
                GLint::from(size),
                gl::FLOAT,
                gl::FALSE,
                stride as GLsizei,
                offset as *const c_void,
            )
        }
    }

    fn vertex_attrib_divisor(&mut self, location: u32, divisor: u32) {
        unsafe { gl::VertexAttribDivisor(location, divisor) }
    }

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        unsafe { gl::DrawArrays(mode.into(), first as GLint, count as GLsizei) }
    }

    fn draw_elements(&mut self, mode: DrawMode, count: u32) {
        unsafe {
            gl::DrawElements(
                mode.into(),
                count as GLsizei,
                gl::UNSIGNED_SHORT,
                ptr::null(),
            )
        }
    }

    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: u32, count: u32, instances: u32) {
        unsafe {
            gl::DrawArraysInstanced(
                mode.into(),
                first as GLint,
                count as GLsizei,
                instances as GLsizei,
            )
        }
    }

    fn draw_elements_instanced(&mut self, mode: DrawMode, count: u32, instances: u32) {
        unsafe {
            gl::DrawElementsInstanced(
                mode.into(),
                count as GLsizei,
                gl::UNSIGNED_SHORT,
                ptr::null(),
                instances as GLsizei,
            )
        }
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Result<[u8; 4]> {
        let mut pixel = [0u8; 4];
        unsafe {
            gl::PixelStorei(gl::PACK_ALIGNMENT, 1);
            gl::ReadPixels(
                x as GLint,
                y as GLint,
                1,
                1,
                gl::RGBA,
                gl::UNSIGNED_BYTE,
                pixel.as_mut_ptr() as *mut c_void,
            );

            check()?;
        }

        Ok(pixel)
    }

    fn check(&mut self) -> Result<()> {
        unsafe { check() }
    }
}

unsafe fn check() -> Result<()> {
    match gl::GetError() {
        gl::NO_ERROR => Ok(()),

        gl::INVALID_ENUM => Err(backend_err!(
            "[GL] An unacceptable value is specified for an enumerated argument."
        )),

        gl::INVALID_VALUE => Err(backend_err!("[GL] A numeric argument is out of range.")),

        gl::INVALID_OPERATION => Err(backend_err!(
            "[GL] The specified operation is not allowed in the current state."
        )),

        gl::INVALID_FRAMEBUFFER_OPERATION => Err(backend_err!(
            "[GL] The command is trying to render to or read from the framebuffer while the \
             currently bound framebuffer is not framebuffer complete."
        )),

        gl::OUT_OF_MEMORY => Err(backend_err!(
            "[GL] There is not enough memory left to execute the command."
        )),

        _ => Err(backend_err!("[GL] Oops, Unknown OpenGL error.")),
    }
}

/// `glRenderbufferStorageMultisample` is only loaded when the device reports
/// multisample support.
fn multisampled(max_samples: u32, samples: u32) -> bool {
    max_samples > 0 && samples > 0
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn renderbuffer_storage() {
        assert!(multisampled(8, 4));
        assert!(!multisampled(8, 0));
        assert!(!multisampled(0, 4));
        assert!(!multisampled(0, 0));
    }
}
