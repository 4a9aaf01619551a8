use uuid::Uuid;

use crate::errors::{Error, Result};
use crate::utils::hash::FastHashMap;
use crate::video::assets::prelude::*;
use crate::video::backends::{BufferHint, BufferTarget, Device, Location, ObjectId, Surface};

use super::RenderContext;

/// The GPU side of a `Geometry`: a static vertex buffer with the interleaved
/// streams, a static index buffer, and the vertex array wiring them to a
/// program's attributes.
#[derive(Debug)]
pub struct GeometryBuffer {
    vertex_buffer: ObjectId,
    index_buffer: ObjectId,
    vao: Option<ObjectId>,
    instance_buffer: Option<ObjectId>,
    layout: Vec<(VertexAttribute, usize)>,
    stride: usize,
    vertex_count: u32,
    index_count: u32,
    instances: u32,
}

impl GeometryBuffer {
    #[inline]
    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn has_vertex_array(&self) -> bool {
        self.vao.is_some()
    }

    /// The number of instances uploaded into the instance buffer.
    #[inline]
    pub fn instances(&self) -> u32 {
        self.instances
    }
}

impl<S: Surface> RenderContext<S> {
    /// Returns the buffers realized from `geometry`, uploading them the first
    /// time its `uid` is seen.
    pub fn get_geometry_buffer(&mut self, geometry: &Geometry) -> Result<&GeometryBuffer> {
        if !self.geometries.contains_key(&geometry.uid) {
            let buffer = create(&mut self.device, geometry)?;
            debug!(
                "Created buffers of geometry {} with {} vertices.",
                geometry.uid, buffer.vertex_count
            );

            self.geometries.insert(geometry.uid, buffer);
        }

        self.geometries
            .get(&geometry.uid)
            .ok_or_else(|| Error::GeometryNotPrepared(geometry.uid))
    }

    /// Creates the per-instance buffer of `geometry`, feeding one vec4 per
    /// instance into the `aTransform` attribute of the shader in use.
    pub fn initialize_instance_buffer(
        &mut self,
        geometry: &Geometry,
        transforms: &[[f32; 4]],
    ) -> Result<()> {
        if !self.device.supports_instancing() {
            return Err(backend_err!(
                "{:?} devices do not support instanced draws.",
                self.device.kind()
            ));
        }

        self.get_geometry_buffer(geometry)?;
        self.bind_geometry(geometry.uid)?;

        let location = self.current_attribute(INSTANCE_ATTRIBUTE)?;
        let buffer = self
            .geometries
            .get_mut(&geometry.uid)
            .ok_or_else(|| Error::GeometryNotPrepared(geometry.uid))?;

        let id = match buffer.instance_buffer {
            Some(id) => id,
            None => self.device.create_buffer()?,
        };

        self.device.bind_buffer(BufferTarget::Vertex, Some(id));
        self.device.buffer_data(
            BufferTarget::Vertex,
            bytemuck::cast_slice(transforms),
            BufferHint::Dynamic,
        );

        if let Some(location) = location {
            instance_attribute(&mut self.device, location);
        } else {
            warn!("The shader in use has no {} attribute.", INSTANCE_ATTRIBUTE);
        }

        buffer.instance_buffer = Some(id);
        buffer.instances = transforms.len() as u32;
        self.check_debug()
    }

    /// Replaces the per-instance data of `geometry`.
    pub fn update_instance_buffer(
        &mut self,
        geometry: &Geometry,
        transforms: &[[f32; 4]],
    ) -> Result<()> {
        let buffer = self
            .geometries
            .get_mut(&geometry.uid)
            .ok_or_else(|| Error::GeometryNotPrepared(geometry.uid))?;

        let id = buffer
            .instance_buffer
            .ok_or_else(|| Error::GeometryNotPrepared(geometry.uid))?;

        self.device.bind_buffer(BufferTarget::Vertex, Some(id));
        self.device.buffer_data(
            BufferTarget::Vertex,
            bytemuck::cast_slice(transforms),
            BufferHint::Dynamic,
        );

        buffer.instances = transforms.len() as u32;
        Ok(())
    }

    /// Draws `geometry` with the shader in use. Indexed geometries submit
    /// every index, the others every vertex.
    pub fn draw_geo(&mut self, geometry: &Geometry, mode: DrawMode) -> Result<()> {
        let (indexed, count) = self.prepare_draw(geometry)?;

        if indexed {
            self.device.draw_elements(mode, count);
        } else {
            self.device.draw_arrays(mode, 0, count);
        }

        self.check_debug()
    }

    pub fn draw_geo_instanced(
        &mut self,
        geometry: &Geometry,
        mode: DrawMode,
        instances: u32,
    ) -> Result<()> {
        if !self.device.supports_instancing() {
            return Err(backend_err!(
                "{:?} devices do not support instanced draws.",
                self.device.kind()
            ));
        }

        let (indexed, count) = self.prepare_draw(geometry)?;

        if indexed {
            self.device.draw_elements_instanced(mode, count, instances);
        } else {
            self.device.draw_arrays_instanced(mode, 0, count, instances);
        }

        self.check_debug()
    }

    /// Deletes the buffers realized for `uid`. Returns false if there were
    /// none.
    pub fn release_geometry(&mut self, uid: Uuid) -> bool {
        match self.geometries.remove(&uid) {
            Some(buffer) => {
                self.device.bind_vertex_array(None);
                delete(&mut self.device, buffer);
                true
            }
            None => false,
        }
    }

    fn prepare_draw(&mut self, geometry: &Geometry) -> Result<(bool, u32)> {
        let (indexed, count) = {
            let buffer = self.get_geometry_buffer(geometry)?;
            if buffer.index_count > 0 {
                (true, buffer.index_count)
            } else {
                (false, buffer.vertex_count)
            }
        };

        self.bind_geometry(geometry.uid)?;
        Ok((indexed, count))
    }

    /// Binds the vertex array of a realized geometry, creating it with the
    /// attribute locations of the shader in use. Devices without vertex
    /// arrays get the attribute setup replayed on every bind.
    fn bind_geometry(&mut self, uid: Uuid) -> Result<()> {
        let handle = self.current_shader.ok_or(Error::NoShaderBound)?;
        let shader = self
            .shaders
            .get(handle)
            .ok_or_else(|| Error::ShaderHandleInvalid(handle))?;

        let buffer = self
            .geometries
            .get_mut(&uid)
            .ok_or_else(|| Error::GeometryNotPrepared(uid))?;

        let device = &mut self.device;
        if !device.supports_vertex_arrays() {
            setup_attributes(device, buffer, &shader.attributes);
            return Ok(());
        }

        match buffer.vao {
            Some(vao) => device.bind_vertex_array(Some(vao)),
            None => {
                let vao = device.create_vertex_array()?;
                device.bind_vertex_array(Some(vao));
                setup_attributes(device, buffer, &shader.attributes);
                buffer.vao = Some(vao);
            }
        }

        Ok(())
    }

    fn current_attribute(&self, name: &str) -> Result<Option<u32>> {
        let handle = self.current_shader.ok_or(Error::NoShaderBound)?;
        Ok(self
            .attribute_location(handle, name)
            .filter(|v| *v >= 0)
            .map(|v| v as u32))
    }
}

fn create<D: Device>(device: &mut D, geometry: &Geometry) -> Result<GeometryBuffer> {
    let vertices = geometry.interleave();

    let vertex_buffer = device.create_buffer()?;
    device.bind_buffer(BufferTarget::Vertex, Some(vertex_buffer));
    device.buffer_data(
        BufferTarget::Vertex,
        bytemuck::cast_slice(&vertices),
        BufferHint::Static,
    );

    let index_buffer = match device.create_buffer() {
        Ok(id) => id,
        Err(err) => {
            device.delete_buffer(vertex_buffer);
            return Err(err);
        }
    };
    device.bind_buffer(BufferTarget::Index, Some(index_buffer));
    device.buffer_data(
        BufferTarget::Index,
        bytemuck::cast_slice(&geometry.indices),
        BufferHint::Static,
    );

    let layout = geometry
        .offsets()
        .into_iter()
        .map(|(attribute, offset)| (attribute.clone(), offset))
        .collect();

    Ok(GeometryBuffer {
        vertex_buffer,
        index_buffer,
        vao: None,
        instance_buffer: None,
        layout,
        stride: geometry.stride(),
        vertex_count: geometry.vertex_count() as u32,
        index_count: geometry.indices.len() as u32,
        instances: 0,
    })
}

fn setup_attributes<D: Device>(
    device: &mut D,
    buffer: &GeometryBuffer,
    attributes: &FastHashMap<String, Location>,
) {
    device.bind_buffer(BufferTarget::Vertex, Some(buffer.vertex_buffer));
    device.bind_buffer(BufferTarget::Index, Some(buffer.index_buffer));

    for (attribute, offset) in &buffer.layout {
        match attributes.get(&attribute.attribute) {
            Some(&location) if location >= 0 => {
                device.enable_vertex_attrib_array(location as u32);
                device.vertex_attrib_pointer(
                    location as u32,
                    attribute.size,
                    buffer.stride,
                    *offset,
                );
            }
            _ => trace!("Attribute {} is not active.", attribute.attribute),
        }
    }

    if let Some(id) = buffer.instance_buffer {
        if let Some(&location) = attributes.get(INSTANCE_ATTRIBUTE) {
            if location >= 0 {
                device.bind_buffer(BufferTarget::Vertex, Some(id));
                instance_attribute(device, location as u32);
            }
        }
    }
}

fn instance_attribute<D: Device>(device: &mut D, location: u32) {
    device.vertex_attrib_pointer(
        location,
        INSTANCE_ATTRIBUTE_SIZE,
        INSTANCE_ATTRIBUTE_SIZE as usize * 4,
        0,
    );
    device.vertex_attrib_divisor(location, 1);
    device.enable_vertex_attrib_array(location);
}

pub(super) fn delete<D: Device>(device: &mut D, buffer: GeometryBuffer) {
    if let Some(vao) = buffer.vao {
        device.delete_vertex_array(vao);
    }

    if let Some(id) = buffer.instance_buffer {
        device.delete_buffer(id);
    }

    device.delete_buffer(buffer.vertex_buffer);
    device.delete_buffer(buffer.index_buffer);
}
