//! A device without a driver. It keeps the object model of a real graphics
//! context, counts every call that matters for resource bookkeeping and
//! carries a reference rasterizer, so contexts can be exercised without a GPU.
//!
//! The rasterizer is intentionally small: clears fill the color target, draws
//! stretch the texture bound to the program's first sampler over the viewport
//! with nearest sampling, blits copy the color plane and reads return the
//! stored pixel. Rows are stored bottom to top. Shader sources are parsed only
//! for `uniform` and vertex `in`/`attribute` declarations; a source that is
//! empty or contains `#error` fails to compile.

use std::cell::RefCell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::errors::Result;
use crate::math::Vector2;
use crate::utils::hash::{FastHashMap, FastHashSet};
use crate::video::assets::prelude::*;
use crate::video::options::ContextAttributes;

use super::utils::ObjectTable;
use super::{
    ActiveVariable, Attachment, BufferHint, BufferTarget, Capability, ContextKind, Device,
    FramebufferStatus, FramebufferTarget, Location, ObjectId, PixelFormat, Surface,
};

const MAX_TEXTURE_UNITS: usize = 16;
const PRECISIONS: &[&str] = &["highp", "mediump", "lowp", "flat", "smooth"];

/// A draw call recorded by a `HeadlessDevice`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawCall {
    Arrays {
        mode: DrawMode,
        first: u32,
        count: u32,
        instances: u32,
    },
    Elements {
        mode: DrawMode,
        count: u32,
        instances: u32,
    },
}

/// Counters of a headless device. Object counts are the number of live
/// objects, the others accumulate over the device lifetime.
#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub shaders: usize,
    pub programs: usize,
    pub textures: usize,
    pub framebuffers: usize,
    pub renderbuffers: usize,
    pub buffers: usize,
    pub vertex_arrays: usize,

    pub compiles: usize,
    pub links: usize,
    pub program_binds: usize,
    pub texture_uploads: usize,
    pub compressed_uploads: usize,
    pub mipmaps: usize,
    pub buffer_uploads: usize,
    pub uniform_writes: usize,
    pub draws: Vec<DrawCall>,
    pub blits: Vec<(Attachment, TextureFilter)>,
    pub enabled: FastHashSet<Capability>,
}

impl Stats {
    /// The sum of every live object count.
    pub fn live_objects(&self) -> usize {
        self.shaders
            + self.programs
            + self.textures
            + self.framebuffers
            + self.renderbuffers
            + self.buffers
            + self.vertex_arrays
    }
}

struct Shared {
    stats: Stats,
    dimensions: Vector2<u32>,
}

/// Observes the devices of a `HeadlessSurface`, after the surface itself has
/// been moved into a context.
#[derive(Clone)]
pub struct Probe(Rc<RefCell<Shared>>);

impl Probe {
    pub fn stats(&self) -> Stats {
        self.0.borrow().stats.clone()
    }

    pub fn dimensions(&self) -> Vector2<u32> {
        self.0.borrow().dimensions
    }
}

pub struct HeadlessSurface {
    shared: Rc<RefCell<Shared>>,
    kinds: SmallVec<[ContextKind; 2]>,
    extensions: Vec<String>,
    max_samples: u32,
}

impl HeadlessSurface {
    /// Creates a surface providing both context kinds, multisampling up to 4
    /// samples and no extensions.
    pub fn new(width: u32, height: u32) -> Self {
        let shared = Shared {
            stats: Stats::default(),
            dimensions: Vector2::new(width, height),
        };

        HeadlessSurface {
            shared: Rc::new(RefCell::new(shared)),
            kinds: SmallVec::from_slice(&[ContextKind::Preferred, ContextKind::Baseline]),
            extensions: Vec::new(),
            max_samples: 4,
        }
    }

    /// Restricts the context kinds this surface can provide.
    pub fn with_kinds(mut self, kinds: &[ContextKind]) -> Self {
        self.kinds = SmallVec::from_slice(kinds);
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|v| (*v).to_owned()).collect();
        self
    }

    pub fn with_max_samples(mut self, samples: u32) -> Self {
        self.max_samples = samples;
        self
    }

    pub fn probe(&self) -> Probe {
        Probe(self.shared.clone())
    }
}

impl Surface for HeadlessSurface {
    type Device = HeadlessDevice;

    fn create_device(
        &mut self,
        kind: ContextKind,
        _: &ContextAttributes,
    ) -> Option<HeadlessDevice> {
        if !self.kinds.contains(&kind) {
            return None;
        }

        let max_samples = match kind {
            ContextKind::Preferred => self.max_samples,
            ContextKind::Baseline => 0,
        };

        Some(HeadlessDevice::new(
            kind,
            self.shared.clone(),
            self.extensions.clone(),
            max_samples,
        ))
    }

    fn dimensions(&self) -> Vector2<u32> {
        self.shared.borrow().dimensions
    }

    fn set_dimensions(&mut self, dimensions: Vector2<u32>) {
        self.shared.borrow_mut().dimensions = dimensions;
    }
}

struct ShaderObject {
    stage: ShaderStage,
    source: String,
    compiled: bool,
    log: String,
}

#[derive(Default)]
struct ProgramObject {
    attached: SmallVec<[ObjectId; 2]>,
    linked: bool,
    log: String,
    uniforms: Vec<ActiveVariable>,
    attributes: Vec<ActiveVariable>,
    samplers: Vec<Location>,
    values: FastHashMap<Location, UniformVariable>,
}

#[derive(Clone)]
struct Image {
    format: PixelFormat,
    width: u32,
    height: u32,
    samples: u32,
    pixels: Vec<[u8; 4]>,
}

impl Image {
    fn new(format: PixelFormat, width: u32, height: u32, samples: u32) -> Self {
        Image {
            format,
            width,
            height,
            samples,
            pixels: vec![[0; 4]; width as usize * height as usize],
        }
    }

    fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }
}

#[derive(Debug, Copy, Clone)]
enum Target {
    Texture(ObjectId),
    Renderbuffer(ObjectId),
}

#[derive(Default)]
struct FramebufferObject {
    color: Option<Target>,
    depth: Option<Target>,
}

pub struct HeadlessDevice {
    kind: ContextKind,
    shared: Rc<RefCell<Shared>>,
    extensions: Vec<String>,
    max_samples: u32,

    shaders: ObjectTable<ShaderObject>,
    programs: ObjectTable<ProgramObject>,
    textures: ObjectTable<Option<Image>>,
    renderbuffers: ObjectTable<Option<Image>>,
    framebuffers: ObjectTable<FramebufferObject>,
    buffers: ObjectTable<Vec<u8>>,
    vertex_arrays: ObjectTable<()>,
    surface: Image,

    program: Option<ObjectId>,
    draw_framebuffer: Option<ObjectId>,
    read_framebuffer: Option<ObjectId>,
    renderbuffer: Option<ObjectId>,
    vertex_buffer: Option<ObjectId>,
    index_buffer: Option<ObjectId>,
    active_unit: usize,
    units: [Option<ObjectId>; MAX_TEXTURE_UNITS],
    viewport: (u32, u32),
    clear_color: [u8; 4],
    error: Option<&'static str>,
}

impl HeadlessDevice {
    fn new(
        kind: ContextKind,
        shared: Rc<RefCell<Shared>>,
        extensions: Vec<String>,
        max_samples: u32,
    ) -> Self {
        let dimensions = shared.borrow().dimensions;

        HeadlessDevice {
            kind,
            shared,
            extensions,
            max_samples,
            shaders: ObjectTable::new(),
            programs: ObjectTable::new(),
            textures: ObjectTable::new(),
            renderbuffers: ObjectTable::new(),
            framebuffers: ObjectTable::new(),
            buffers: ObjectTable::new(),
            vertex_arrays: ObjectTable::new(),
            surface: Image::new(PixelFormat::Rgba8, dimensions.x, dimensions.y, 0),
            program: None,
            draw_framebuffer: None,
            read_framebuffer: None,
            renderbuffer: None,
            vertex_buffer: None,
            index_buffer: None,
            active_unit: 0,
            units: [None; MAX_TEXTURE_UNITS],
            viewport: (dimensions.x, dimensions.y),
            clear_color: [0; 4],
            error: None,
        }
    }

    #[inline]
    fn stats<F: FnOnce(&mut Stats)>(&self, f: F) {
        f(&mut self.shared.borrow_mut().stats)
    }

    #[inline]
    fn invalid(&mut self, error: &'static str) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    fn sync_surface(&mut self) {
        let dimensions = self.shared.borrow().dimensions;
        if self.surface.width != dimensions.x || self.surface.height != dimensions.y {
            self.surface = Image::new(PixelFormat::Rgba8, dimensions.x, dimensions.y, 0);
        }
    }

    fn attachment(&self, framebuffer: ObjectId, attachment: Attachment) -> Option<Target> {
        self.framebuffers
            .get(framebuffer)
            .and_then(|fbo| match attachment {
                Attachment::Color => fbo.color,
                Attachment::Depth => fbo.depth,
            })
    }

    fn target_image(&self, target: Target) -> Option<&Image> {
        match target {
            Target::Texture(id) => self.textures.get(id).and_then(|v| v.as_ref()),
            Target::Renderbuffer(id) => self.renderbuffers.get(id).and_then(|v| v.as_ref()),
        }
    }

    fn image(&mut self, framebuffer: Option<ObjectId>, attachment: Attachment) -> Option<&Image> {
        match framebuffer {
            None if attachment == Attachment::Color => {
                self.sync_surface();
                Some(&self.surface)
            }
            None => None,
            Some(id) => {
                let target = self.attachment(id, attachment)?;
                self.target_image(target)
            }
        }
    }

    fn image_mut(
        &mut self,
        framebuffer: Option<ObjectId>,
        attachment: Attachment,
    ) -> Option<&mut Image> {
        match framebuffer {
            None if attachment == Attachment::Color => {
                self.sync_surface();
                Some(&mut self.surface)
            }
            None => None,
            Some(id) => match self.attachment(id, attachment)? {
                Target::Texture(id) => self.textures.get_mut(id).and_then(|v| v.as_mut()),
                Target::Renderbuffer(id) => {
                    self.renderbuffers.get_mut(id).and_then(|v| v.as_mut())
                }
            },
        }
    }

    /// The texture sampled by the first sampler uniform of the program in use.
    fn sampled_image(&self) -> Option<Image> {
        let program = self.programs.get(self.program?)?;
        let location = *program.samplers.first()?;

        let unit = match program.values.get(&location) {
            Some(UniformVariable::I32(unit)) => *unit as usize,
            Some(_) => return None,
            None => 0,
        };

        let texture = self.units.get(unit).and_then(|v| *v)?;
        self.textures
            .get(texture)
            .and_then(|v| v.as_ref())
            .filter(|v| v.format == PixelFormat::Rgba8)
            .cloned()
    }

    fn draw(&mut self, call: DrawCall) {
        if self.program.is_none() {
            self.invalid("draw without a program in use");
            return;
        }

        self.stats(|s| s.draws.push(call));

        let source = match self.sampled_image() {
            Some(image) => image,
            None => return,
        };

        let (vw, vh) = self.viewport;
        let framebuffer = self.draw_framebuffer;
        if let Some(target) = self.image_mut(framebuffer, Attachment::Color) {
            if source.width == 0 || source.height == 0 {
                return;
            }

            for y in 0..vh.min(target.height) {
                for x in 0..vw.min(target.width) {
                    let sx = x * source.width / vw;
                    let sy = y * source.height / vh;
                    let v = source.pixels[(sy * source.width + sx) as usize];
                    target.pixels[(y * target.width + x) as usize] = v;
                }
            }
        }
    }

    fn bound_buffer(&self, target: BufferTarget) -> Option<ObjectId> {
        match target {
            BufferTarget::Vertex => self.vertex_buffer,
            BufferTarget::Index => self.index_buffer,
        }
    }
}

impl Device for HeadlessDevice {
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
        self.extensions.iter().any(|v| v == name)
    }

    fn set_capability(&mut self, capability: Capability, enabled: bool) {
        self.stats(|s| {
            if enabled {
                s.enabled.insert(capability);
            } else {
                s.enabled.remove(&capability);
            }
        });
    }

    fn cull_face_back(&mut self) {}

    fn blend_alpha(&mut self) {}

    fn viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    fn clear_color(&mut self, color: [f32; 4]) {
        let f = |v: f32| (v.max(0.0).min(1.0) * 255.0).round() as u8;
        self.clear_color = [f(color[0]), f(color[1]), f(color[2]), f(color[3])];
    }

    fn clear(&mut self, color: bool, _: bool) {
        if color {
            let value = self.clear_color;
            let framebuffer = self.draw_framebuffer;
            if let Some(image) = self.image_mut(framebuffer, Attachment::Color) {
                for v in image.pixels.iter_mut() {
                    *v = value;
                }
            }
        }
    }

    fn create_shader(&mut self, stage: ShaderStage) -> Result<ObjectId> {
        let id = self.shaders.create(ShaderObject {
            stage,
            source: String::new(),
            compiled: false,
            log: String::new(),
        });

        self.stats(|s| s.shaders += 1);
        Ok(id)
    }

    fn compile_shader(&mut self, shader: ObjectId, source: &str) {
        let shader = match self.shaders.get_mut(shader) {
            Some(shader) => shader,
            None => return self.invalid("compile of an unknown shader"),
        };

        shader.source = source.to_owned();
        if source.trim().is_empty() {
            shader.compiled = false;
            shader.log = "ERROR: 0:0: empty shader source".to_owned();
        } else if let Some(line) = source.lines().find(|v| v.trim_start().starts_with("#error")) {
            shader.compiled = false;
            shader.log = format!("ERROR: 0:0: '{}'", line.trim());
        } else {
            shader.compiled = true;
            shader.log.clear();
        }

        self.stats(|s| s.compiles += 1);
    }

    fn shader_compile_status(&mut self, shader: ObjectId) -> bool {
        self.shaders.get(shader).map(|v| v.compiled).unwrap_or(false)
    }

    fn shader_info_log(&mut self, shader: ObjectId) -> String {
        self.shaders
            .get(shader)
            .map(|v| v.log.clone())
            .unwrap_or_default()
    }

    fn delete_shader(&mut self, shader: ObjectId) {
        if self.shaders.free(shader).is_some() {
            self.stats(|s| s.shaders -= 1);
        }
    }

    fn create_program(&mut self) -> Result<ObjectId> {
        let id = self.programs.create(ProgramObject::default());
        self.stats(|s| s.programs += 1);
        Ok(id)
    }

    fn attach_shader(&mut self, program: ObjectId, shader: ObjectId) {
        match self.programs.get_mut(program) {
            Some(v) => v.attached.push(shader),
            None => self.invalid("attach to an unknown program"),
        }
    }

    fn detach_shader(&mut self, program: ObjectId, shader: ObjectId) {
        if let Some(v) = self.programs.get_mut(program) {
            v.attached.retain(|v| *v != shader);
        }
    }

    fn link_program(&mut self, program: ObjectId) {
        let mut vs = None;
        let mut fs = None;
        let mut log = String::new();

        if let Some(v) = self.programs.get(program) {
            for id in &v.attached {
                match self.shaders.get(*id) {
                    Some(shader) if !shader.compiled => {
                        log = "ERROR: one or more attached shaders not successfully compiled"
                            .to_owned();
                    }
                    Some(shader) if shader.stage == ShaderStage::Vertex => {
                        vs = Some(shader.source.clone())
                    }
                    Some(shader) => fs = Some(shader.source.clone()),
                    None => {}
                }
            }
        } else {
            return self.invalid("link of an unknown program");
        }

        self.stats(|s| s.links += 1);

        let linked = match (vs, fs) {
            (Some(vs), Some(fs)) if log.is_empty() => Some((vs, fs)),
            (_, _) if log.is_empty() => {
                log = "ERROR: missing vertex or fragment shader".to_owned();
                None
            }
            _ => None,
        };

        let v = match self.programs.get_mut(program) {
            Some(v) => v,
            None => return,
        };

        v.values.clear();
        match linked {
            Some((vs, fs)) => {
                let (uniforms, samplers) = uniform_locations(&vs, &fs);
                v.uniforms = uniforms;
                v.samplers = samplers;
                v.attributes = attribute_locations(&vs);
                v.linked = true;
                v.log.clear();
            }
            None => {
                v.uniforms.clear();
                v.samplers.clear();
                v.attributes.clear();
                v.linked = false;
                v.log = log;
            }
        }
    }

    fn program_link_status(&mut self, program: ObjectId) -> bool {
        self.programs.get(program).map(|v| v.linked).unwrap_or(false)
    }

    fn program_info_log(&mut self, program: ObjectId) -> String {
        self.programs
            .get(program)
            .map(|v| v.log.clone())
            .unwrap_or_default()
    }

    fn use_program(&mut self, program: Option<ObjectId>) {
        if let Some(id) = program {
            if self.programs.get(id).is_none() {
                return self.invalid("use of an unknown program");
            }

            self.stats(|s| s.program_binds += 1);
        }

        self.program = program;
    }

    fn delete_program(&mut self, program: ObjectId) {
        if self.programs.free(program).is_some() {
            if self.program == Some(program) {
                self.program = None;
            }

            self.stats(|s| s.programs -= 1);
        }
    }

    fn active_uniforms(&mut self, program: ObjectId) -> Vec<ActiveVariable> {
        self.programs
            .get(program)
            .map(|v| v.uniforms.clone())
            .unwrap_or_default()
    }

    fn active_attributes(&mut self, program: ObjectId) -> Vec<ActiveVariable> {
        self.programs
            .get(program)
            .map(|v| v.attributes.clone())
            .unwrap_or_default()
    }

    fn uniform(&mut self, location: Location, variable: UniformVariable) {
        let program = match self.program.and_then(|id| self.programs.get_mut(id)) {
            Some(program) => program,
            None => return self.invalid("uniform write without a program in use"),
        };

        if location >= 0 {
            program.values.insert(location, variable);
            self.stats(|s| s.uniform_writes += 1);
        }
    }

    fn create_texture(&mut self) -> Result<ObjectId> {
        let id = self.textures.create(None);
        self.stats(|s| s.textures += 1);
        Ok(id)
    }

    fn active_texture(&mut self, unit: u32) {
        if (unit as usize) < MAX_TEXTURE_UNITS {
            self.active_unit = unit as usize;
        } else {
            self.invalid("texture unit out of range");
        }
    }

    fn bind_texture(&mut self, texture: Option<ObjectId>) {
        if let Some(id) = texture {
            if self.textures.get(id).is_none() {
                return self.invalid("bind of an unknown texture");
            }
        }

        self.units[self.active_unit] = texture;
    }

    fn tex_parameters(&mut self, _: SamplerParams) {}

    fn tex_image_2d(
        &mut self,
        format: PixelFormat,
        width: u32,
        height: u32,
        pixels: Option<&[u8]>,
    ) {
        let texture = match self.units[self.active_unit] {
            Some(id) => id,
            None => return self.invalid("upload without a bound texture"),
        };

        let mut image = Image::new(format, width, height, 0);
        if let Some(bytes) = pixels {
            for (dst, src) in image.pixels.iter_mut().zip(bytes.chunks(4)) {
                if src.len() == 4 {
                    *dst = [src[0], src[1], src[2], src[3]];
                }
            }
        }

        if let Some(slot) = self.textures.get_mut(texture) {
            *slot = Some(image);
        }

        self.stats(|s| s.texture_uploads += 1);
    }

    fn compressed_tex_image_2d(&mut self, _: u32, width: u32, height: u32, _: &[u8]) {
        let texture = match self.units[self.active_unit] {
            Some(id) => id,
            None => return self.invalid("upload without a bound texture"),
        };

        if let Some(slot) = self.textures.get_mut(texture) {
            *slot = Some(Image::new(PixelFormat::Rgba8, width, height, 0));
        }

        self.stats(|s| s.compressed_uploads += 1);
    }

    fn generate_mipmap(&mut self) {
        self.stats(|s| s.mipmaps += 1);
    }

    fn delete_texture(&mut self, texture: ObjectId) {
        if self.textures.free(texture).is_some() {
            for unit in self.units.iter_mut() {
                if *unit == Some(texture) {
                    *unit = None;
                }
            }

            self.stats(|s| s.textures -= 1);
        }
    }

    fn create_framebuffer(&mut self) -> Result<ObjectId> {
        let id = self.framebuffers.create(FramebufferObject::default());
        self.stats(|s| s.framebuffers += 1);
        Ok(id)
    }

    fn bind_framebuffer(&mut self, target: FramebufferTarget, framebuffer: Option<ObjectId>) {
        if let Some(id) = framebuffer {
            if self.framebuffers.get(id).is_none() {
                return self.invalid("bind of an unknown framebuffer");
            }
        }

        match target {
            FramebufferTarget::Draw => self.draw_framebuffer = framebuffer,
            FramebufferTarget::Read => self.read_framebuffer = framebuffer,
            FramebufferTarget::Both => {
                self.draw_framebuffer = framebuffer;
                self.read_framebuffer = framebuffer;
            }
        }
    }

    fn framebuffer_renderbuffer(&mut self, attachment: Attachment, renderbuffer: ObjectId) {
        self.attach(attachment, Target::Renderbuffer(renderbuffer));
    }

    fn framebuffer_texture_2d(&mut self, attachment: Attachment, texture: ObjectId) {
        self.attach(attachment, Target::Texture(texture));
    }

    fn check_framebuffer_status(&mut self) -> FramebufferStatus {
        let fbo = match self.draw_framebuffer.and_then(|id| self.framebuffers.get(id)) {
            Some(fbo) => fbo,
            None => return FramebufferStatus::Complete,
        };

        let targets: SmallVec<[(Attachment, Target); 2]> = fbo
            .color
            .map(|v| (Attachment::Color, v))
            .into_iter()
            .chain(fbo.depth.map(|v| (Attachment::Depth, v)))
            .collect();

        if targets.is_empty() {
            return FramebufferStatus::MissingAttachment;
        }

        let mut images = SmallVec::<[&Image; 2]>::new();
        for (attachment, target) in targets {
            match self.target_image(target) {
                Some(image) if image.format.attachment() == attachment => images.push(image),
                _ => return FramebufferStatus::IncompleteAttachment,
            }
        }

        let first = images[0];
        if images
            .iter()
            .any(|v| v.width != first.width || v.height != first.height)
        {
            return FramebufferStatus::IncompleteDimensions;
        }

        if images.iter().any(|v| v.samples != first.samples) {
            return FramebufferStatus::IncompleteMultisample;
        }

        FramebufferStatus::Complete
    }

    fn blit_framebuffer(
        &mut self,
        width: u32,
        height: u32,
        attachment: Attachment,
        filter: TextureFilter,
    ) {
        if self.read_framebuffer == self.draw_framebuffer {
            return self.invalid("blit with identical read and draw framebuffers");
        }

        self.stats(|s| s.blits.push((attachment, filter)));

        if attachment == Attachment::Color {
            let read = self.read_framebuffer;
            let draw = self.draw_framebuffer;

            let source = match self.image(read, Attachment::Color) {
                Some(image) => image.clone(),
                None => return,
            };

            if let Some(target) = self.image_mut(draw, Attachment::Color) {
                for y in 0..height.min(source.height).min(target.height) {
                    for x in 0..width.min(source.width).min(target.width) {
                        target.pixels[(y * target.width + x) as usize] =
                            source.pixels[(y * source.width + x) as usize];
                    }
                }
            }
        }
    }

    fn delete_framebuffer(&mut self, framebuffer: ObjectId) {
        if self.framebuffers.free(framebuffer).is_some() {
            if self.draw_framebuffer == Some(framebuffer) {
                self.draw_framebuffer = None;
            }

            if self.read_framebuffer == Some(framebuffer) {
                self.read_framebuffer = None;
            }

            self.stats(|s| s.framebuffers -= 1);
        }
    }

    fn create_renderbuffer(&mut self) -> Result<ObjectId> {
        let id = self.renderbuffers.create(None);
        self.stats(|s| s.renderbuffers += 1);
        Ok(id)
    }

    fn bind_renderbuffer(&mut self, renderbuffer: Option<ObjectId>) {
        self.renderbuffer = renderbuffer;
    }

    fn renderbuffer_storage_multisample(
        &mut self,
        samples: u32,
        format: PixelFormat,
        width: u32,
        height: u32,
    ) {
        if samples > self.max_samples {
            return self.invalid("sample count exceeds the maximum");
        }

        let image = Image::new(format, width, height, samples);
        match self.renderbuffer.and_then(|id| self.renderbuffers.get_mut(id)) {
            Some(slot) => *slot = Some(image),
            None => self.invalid("storage without a bound renderbuffer"),
        }
    }

    fn delete_renderbuffer(&mut self, renderbuffer: ObjectId) {
        if self.renderbuffers.free(renderbuffer).is_some() {
            if self.renderbuffer == Some(renderbuffer) {
                self.renderbuffer = None;
            }

            self.stats(|s| s.renderbuffers -= 1);
        }
    }

    fn create_buffer(&mut self) -> Result<ObjectId> {
        let id = self.buffers.create(Vec::new());
        self.stats(|s| s.buffers += 1);
        Ok(id)
    }

    fn bind_buffer(&mut self, target: BufferTarget, buffer: Option<ObjectId>) {
        match target {
            BufferTarget::Vertex => self.vertex_buffer = buffer,
            BufferTarget::Index => self.index_buffer = buffer,
        }
    }

    fn buffer_data(&mut self, target: BufferTarget, data: &[u8], _: BufferHint) {
        match self.bound_buffer(target).and_then(|id| self.buffers.get_mut(id)) {
            Some(buf) => {
                buf.clear();
                buf.extend_from_slice(data);
            }
            None => return self.invalid("upload without a bound buffer"),
        }

        self.stats(|s| s.buffer_uploads += 1);
    }

    fn delete_buffer(&mut self, buffer: ObjectId) {
        if self.buffers.free(buffer).is_some() {
            if self.vertex_buffer == Some(buffer) {
                self.vertex_buffer = None;
            }

            if self.index_buffer == Some(buffer) {
                self.index_buffer = None;
            }

            self.stats(|s| s.buffers -= 1);
        }
    }

    fn create_vertex_array(&mut self) -> Result<ObjectId> {
        if !self.supports_vertex_arrays() {
            return Err(backend_err!("[Headless] Vertex array objects are not supported."));
        }

        let id = self.vertex_arrays.create(());
        self.stats(|s| s.vertex_arrays += 1);
        Ok(id)
    }

    fn bind_vertex_array(&mut self, _: Option<ObjectId>) {}

    fn delete_vertex_array(&mut self, vao: ObjectId) {
        if self.vertex_arrays.free(vao).is_some() {
            self.stats(|s| s.vertex_arrays -= 1);
        }
    }

    fn enable_vertex_attrib_array(&mut self, _: u32) {}

    fn vertex_attrib_pointer(&mut self, _: u32, _: u8, _: usize, _: usize) {
        if self.vertex_buffer.is_none() {
            self.invalid("attribute pointer without a bound vertex buffer");
        }
    }

    fn vertex_attrib_divisor(&mut self, _: u32, _: u32) {}

    fn draw_arrays(&mut self, mode: DrawMode, first: u32, count: u32) {
        self.draw(DrawCall::Arrays {
            mode,
            first,
            count,
            instances: 1,
        });
    }

    fn draw_elements(&mut self, mode: DrawMode, count: u32) {
        self.draw(DrawCall::Elements {
            mode,
            count,
            instances: 1,
        });
    }

    fn draw_arrays_instanced(&mut self, mode: DrawMode, first: u32, count: u32, instances: u32) {
        self.draw(DrawCall::Arrays {
            mode,
            first,
            count,
            instances,
        });
    }

    fn draw_elements_instanced(&mut self, mode: DrawMode, count: u32, instances: u32) {
        self.draw(DrawCall::Elements {
            mode,
            count,
            instances,
        });
    }

    fn read_pixel(&mut self, x: u32, y: u32) -> Result<[u8; 4]> {
        let framebuffer = self.read_framebuffer;
        Ok(self
            .image(framebuffer, Attachment::Color)
            .and_then(|v| v.pixel(x, y))
            .unwrap_or([0; 4]))
    }

    fn check(&mut self) -> Result<()> {
        match self.error.take() {
            Some(err) => Err(backend_err!("[Headless] {}.", err)),
            None => Ok(()),
        }
    }
}

impl HeadlessDevice {
    fn attach(&mut self, attachment: Attachment, target: Target) {
        let fbo = match self
            .draw_framebuffer
            .and_then(|id| self.framebuffers.get_mut(id))
        {
            Some(fbo) => fbo,
            None => return self.invalid("attachment to the surface framebuffer"),
        };

        match attachment {
            Attachment::Color => fbo.color = Some(target),
            Attachment::Depth => fbo.depth = Some(target),
        }
    }
}

/// `(location, type, name)` of every declaration introduced by one of
/// `qualifiers`, in source order.
fn declarations(source: &str, qualifiers: &[&str]) -> Vec<(Option<Location>, String, String)> {
    let text = source
        .lines()
        .map(|v| v.split("//").next().unwrap_or(""))
        .filter(|v| !v.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let mut declarations = Vec::new();
    for statement in text.split(';') {
        let statement = statement
            .rsplit(|c: char| c == '{' || c == '}')
            .next()
            .unwrap_or("");

        let (location, statement) = match statement.find(')') {
            Some(i) if statement.trim_start().starts_with("layout") => {
                let location = statement[..i]
                    .split("location")
                    .nth(1)
                    .map(|v| v.trim_start_matches(|c: char| c.is_whitespace() || c == '='))
                    .and_then(|v| v.split(|c: char| c == ',' || c.is_whitespace()).next())
                    .and_then(|v| v.parse().ok());
                (location, &statement[i + 1..])
            }
            _ => (None, statement),
        };

        let tokens: Vec<&str> = statement
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|v| !v.is_empty() && !PRECISIONS.contains(v))
            .collect();

        if tokens.len() < 3 || !qualifiers.contains(&tokens[0]) {
            continue;
        }

        for &name in tokens[2..].iter().take_while(|v| **v != "=") {
            let name = name.split('[').next().unwrap_or(name);
            declarations.push((location, tokens[1].to_owned(), name.to_owned()));
        }
    }

    declarations
}

/// Assigns uniform locations in declaration order, returning the sampler
/// locations separately.
fn uniform_locations(vs: &str, fs: &str) -> (Vec<ActiveVariable>, Vec<Location>) {
    let mut uniforms: Vec<ActiveVariable> = Vec::new();
    let mut samplers = Vec::new();

    for (_, kind, name) in declarations(vs, &["uniform"])
        .into_iter()
        .chain(declarations(fs, &["uniform"]))
    {
        if uniforms.iter().any(|u| u.name == name) {
            continue;
        }

        let location = uniforms.len() as Location;
        if kind.starts_with("sampler") {
            samplers.push(location);
        }

        uniforms.push(ActiveVariable { name, location });
    }

    (uniforms, samplers)
}

/// Attributes with an explicit `layout(location = N)` keep it, the others take
/// the lowest free location.
fn attribute_locations(vs: &str) -> Vec<ActiveVariable> {
    let declarations = declarations(vs, &["in", "attribute"]);
    let reserved: Vec<Location> = declarations.iter().filter_map(|v| v.0).collect();

    let mut next = 0;
    declarations
        .into_iter()
        .map(|(location, _, name)| {
            let location = location.unwrap_or_else(|| {
                while reserved.contains(&next) {
                    next += 1;
                }

                next += 1;
                next - 1
            });

            ActiveVariable { name, location }
        })
        .collect()
}
