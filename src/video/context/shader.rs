use crate::errors::{Error, Result};
use crate::utils::hash::FastHashMap;
use crate::video::assets::prelude::*;
use crate::video::backends::{Device, Location, ObjectId, Surface};
use crate::video::options::ErrorPolicy;

use super::RenderContext;

/// A shader descriptor registered in a context, with the program it was
/// realized into.
pub struct ShaderProgram {
    pub(super) name: String,
    pub(super) descriptor: Box<dyn ShaderDescriptor>,
    pub(super) program: Option<ObjectId>,
    pub(super) uniforms: FastHashMap<String, Location>,
    pub(super) attributes: FastHashMap<String, Location>,
    // The last value written to each uniform location.
    pub(super) values: FastHashMap<Location, UniformVariable>,
}

impl ShaderProgram {
    #[inline]
    pub(super) fn is_initialized(&self) -> bool {
        self.program.is_some()
    }
}

impl<S: Surface> RenderContext<S> {
    /// Registers `descriptor` under a debug name like `FlatShader#1`. No GPU
    /// work happens until the shader is first used.
    pub fn create_shader<D>(&mut self, descriptor: D) -> ShaderHandle
    where
        D: ShaderDescriptor + 'static,
    {
        let type_name = ::std::any::type_name::<D>();
        let short = type_name.rsplit("::").next().unwrap_or(type_name);

        let counter = self.shader_counters.entry(type_name).or_insert(0);
        *counter += 1;

        let name = format!("{}#{}", short, counter);
        debug!("Registered shader {}.", name);

        self.shaders.create(ShaderProgram {
            name,
            descriptor: Box::new(descriptor),
            program: None,
            uniforms: FastHashMap::default(),
            attributes: FastHashMap::default(),
            values: FastHashMap::default(),
        })
    }

    /// Compiles and links the shader if it was not yet, then records the
    /// locations of its active uniforms and attributes.
    pub fn prepare_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        let policy = self.options.error_policy();
        let debug = self.options.debug;

        let shader = self
            .shaders
            .get_mut(handle)
            .ok_or_else(|| Error::ShaderHandleInvalid(handle))?;

        if shader.is_initialized() {
            return Ok(());
        }

        let device = &mut self.device;
        let vs = compile(device, ShaderStage::Vertex, shader.descriptor.vertex_source(), policy, debug)?;
        let fs = match compile(device, ShaderStage::Fragment, shader.descriptor.fragment_source(), policy, debug) {
            Ok(fs) => fs,
            Err(err) => {
                device.delete_shader(vs);
                return Err(err);
            }
        };

        let program = link(device, vs, fs, policy, debug);

        device.delete_shader(vs);
        device.delete_shader(fs);

        let program = program?;
        shader.uniforms = device
            .active_uniforms(program)
            .into_iter()
            .map(|v| (v.name, v.location))
            .collect();

        shader.attributes = device
            .active_attributes(program)
            .into_iter()
            .map(|v| (v.name, v.location))
            .collect();

        shader.program = Some(program);

        debug!(
            "Prepared shader {} with uniforms {:?} and attributes {:?}.",
            shader.name,
            shader.uniforms.keys().collect::<Vec<_>>(),
            shader.attributes.keys().collect::<Vec<_>>()
        );

        Ok(())
    }

    /// Prepares the shader on first use, and binds its program unless it is
    /// already the current one.
    pub fn use_shader(&mut self, handle: ShaderHandle) -> Result<()> {
        self.prepare_shader(handle)?;

        if self.current_shader != Some(handle) {
            let program = self.shaders.get(handle).and_then(|v| v.program);
            self.device.use_program(program);
            self.current_shader = Some(handle);
        }

        Ok(())
    }

    #[inline]
    pub fn current_shader(&self) -> Option<ShaderHandle> {
        self.current_shader
    }

    pub fn is_shader_initialized(&self, handle: ShaderHandle) -> bool {
        self.shaders
            .get(handle)
            .map(|v| v.is_initialized())
            .unwrap_or(false)
    }

    pub fn shader_name(&self, handle: ShaderHandle) -> Option<&str> {
        self.shaders.get(handle).map(|v| v.name.as_str())
    }

    pub fn shader_descriptor(&self, handle: ShaderHandle) -> Option<&dyn ShaderDescriptor> {
        self.shaders.get(handle).map(|v| v.descriptor.as_ref())
    }

    /// The location of an active uniform, once the shader is prepared.
    pub fn uniform_location(&self, handle: ShaderHandle, name: &str) -> Option<Location> {
        self.shaders
            .get(handle)
            .and_then(|v| v.uniforms.get(name).cloned())
    }

    /// The location of an active attribute, once the shader is prepared.
    pub fn attribute_location(&self, handle: ShaderHandle, name: &str) -> Option<Location> {
        self.shaders
            .get(handle)
            .and_then(|v| v.attributes.get(name).cloned())
    }

    /// Writes `uniforms` into the shader in use. Names the program does not
    /// declare are skipped, so are values equal to the last ones written.
    pub fn set_uniforms(&mut self, uniforms: &Uniforms) -> Result<()> {
        for (name, variable) in uniforms.iter() {
            self.push_uniform(name, variable)?;
        }

        Ok(())
    }

    pub fn set_uniform<T: Into<UniformVariable>>(&mut self, name: &str, variable: T) -> Result<()> {
        self.push_uniform(name, variable.into())
    }

    /// Writes the `custom_uniforms` of the shader in use.
    pub fn set_custom_uniforms(&mut self) -> Result<()> {
        let handle = self.current_shader.ok_or(Error::NoShaderBound)?;
        let custom = self
            .shaders
            .get(handle)
            .and_then(|v| v.descriptor.custom_uniforms());

        if let Some(uniforms) = custom {
            self.set_uniforms(&uniforms)?;
        }

        Ok(())
    }

    /// The draw mode declared by the shader in use.
    pub fn current_draw_mode(&self) -> Result<DrawMode> {
        let handle = self.current_shader.ok_or(Error::NoShaderBound)?;
        self.shaders
            .get(handle)
            .map(|v| v.descriptor.draw_mode())
            .ok_or_else(|| Error::ShaderHandleInvalid(handle))
    }

    pub(super) fn push_uniform(&mut self, name: &str, variable: UniformVariable) -> Result<()> {
        let handle = self.current_shader.ok_or(Error::NoShaderBound)?;
        let shader = self
            .shaders
            .get_mut(handle)
            .ok_or_else(|| Error::ShaderHandleInvalid(handle))?;

        let location = match shader.uniforms.get(name) {
            Some(&location) => location,
            None => {
                trace!("Uniform {} is not active in {}.", name, shader.name);
                return Ok(());
            }
        };

        if shader.values.get(&location) == Some(&variable) {
            return Ok(());
        }

        self.device.uniform(location, variable);
        shader.values.insert(location, variable);
        Ok(())
    }
}

fn compile<D: Device>(
    device: &mut D,
    stage: ShaderStage,
    source: &str,
    policy: ErrorPolicy,
    debug: bool,
) -> Result<ObjectId> {
    let shader = device.create_shader(stage)?;
    device.compile_shader(shader, source);

    if !device.shader_compile_status(shader) {
        let log = device.shader_info_log(shader);
        match policy {
            ErrorPolicy::FailFast => {
                device.delete_shader(shader);
                return Err(Error::ShaderCompile(stage, log));
            }
            ErrorPolicy::Degrade if debug => {
                warn!("Failed to compile {:?} shader: {}", stage, log);
            }
            ErrorPolicy::Degrade => {}
        }
    }

    Ok(shader)
}

fn link<D: Device>(
    device: &mut D,
    vs: ObjectId,
    fs: ObjectId,
    policy: ErrorPolicy,
    debug: bool,
) -> Result<ObjectId> {
    let program = device.create_program()?;
    device.attach_shader(program, vs);
    device.attach_shader(program, fs);
    device.link_program(program);

    let linked = device.program_link_status(program);
    device.detach_shader(program, vs);
    device.detach_shader(program, fs);

    if !linked {
        let log = device.program_info_log(program);
        match policy {
            ErrorPolicy::FailFast => {
                device.delete_program(program);
                return Err(Error::ShaderLink(log));
            }
            ErrorPolicy::Degrade if debug => {
                warn!("Failed to link shader program: {}", log);
            }
            ErrorPolicy::Degrade => {}
        }
    }

    Ok(program)
}
