//! Vertex data containers
//!
//! [`VertexData`] owns one mesh's vertex bytes together with the attribute
//! layout describing them. Data starts on the CPU side and can be promoted
//! to a GPU buffer once; either way the renderer draws it through the same
//! backend submission call. GPU storage is released through the renderer so
//! the delete goes through the owning backend.

use bytemuck::Pod;

use crate::render::backend::{
    BufferKey, BufferTarget, BufferUsage, PrimitiveTopology, RenderBackend, VertexAttribute,
    VertexSource,
};
use crate::render::error::RenderResult;

/// Where a mesh's vertex bytes currently live
#[derive(Debug, Clone, PartialEq, Eq)]
enum VertexStorage {
    /// CPU-side bytes, re-submitted on every draw
    Client(Vec<u8>),
    /// Resident GPU buffer
    Gpu(BufferKey),
}

/// One mesh's vertices plus the layout describing them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexData {
    storage: VertexStorage,
    layout: Vec<VertexAttribute>,
    topology: PrimitiveTopology,
    vertex_count: i32,
}

impl VertexData {
    /// Build vertex data from a typed vertex slice
    ///
    /// The vertex type must be plain-old-data; its bytes are copied as-is.
    pub fn from_vertices<T: Pod>(
        vertices: &[T],
        layout: Vec<VertexAttribute>,
        topology: PrimitiveTopology,
    ) -> Self {
        Self {
            storage: VertexStorage::Client(bytemuck::cast_slice(vertices).to_vec()),
            layout,
            topology,
            vertex_count: vertices.len() as i32,
        }
    }

    /// Build vertex data from raw bytes with an explicit vertex count
    pub fn from_bytes(
        bytes: Vec<u8>,
        layout: Vec<VertexAttribute>,
        topology: PrimitiveTopology,
        vertex_count: i32,
    ) -> Self {
        Self {
            storage: VertexStorage::Client(bytes),
            layout,
            topology,
            vertex_count,
        }
    }

    /// Attribute layout of each vertex
    pub fn layout(&self) -> &[VertexAttribute] {
        &self.layout
    }

    /// Primitive assembly mode
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> i32 {
        self.vertex_count
    }

    /// True once the data lives in a GPU buffer
    pub fn is_resident(&self) -> bool {
        matches!(self.storage, VertexStorage::Gpu(_))
    }

    /// Submission source for a draw
    pub fn source(&self) -> VertexSource<'_> {
        match &self.storage {
            VertexStorage::Client(bytes) => VertexSource::ClientBytes(bytes),
            VertexStorage::Gpu(buffer) => VertexSource::GpuBuffer(*buffer),
        }
    }

    /// Move the vertex bytes into a static GPU buffer
    ///
    /// Idempotent: already resident data is left untouched.
    pub fn upload(&mut self, backend: &mut dyn RenderBackend) -> RenderResult<()> {
        let VertexStorage::Client(bytes) = &self.storage else {
            return Ok(());
        };
        let buffer = backend.create_buffer()?;
        backend.bind_buffer(BufferTarget::Array, Some(buffer))?;
        backend.buffer_data(BufferTarget::Array, bytes, BufferUsage::Static)?;
        backend.bind_buffer(BufferTarget::Array, None)?;
        self.storage = VertexStorage::Gpu(buffer);
        Ok(())
    }

    /// Release the GPU buffer, if one was created
    ///
    /// The data reverts to empty client storage; re-uploading requires
    /// rebuilding the container.
    pub fn release(&mut self, backend: &mut dyn RenderBackend) {
        if let VertexStorage::Gpu(buffer) = self.storage {
            backend.delete_buffer(buffer);
            self.storage = VertexStorage::Client(Vec::new());
            self.vertex_count = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::ScalarType;
    use crate::render::backends::NullBackend;

    fn position_layout() -> Vec<VertexAttribute> {
        vec![VertexAttribute {
            name: "a_position".to_string(),
            components: 3,
            scalar: ScalarType::F32,
            normalized: false,
            stride: 12,
            offset: 0,
        }]
    }

    #[test]
    fn test_typed_vertices_count_and_bytes() {
        let vertices: [[f32; 3]; 3] = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        let data =
            VertexData::from_vertices(&vertices, position_layout(), PrimitiveTopology::Triangles);

        assert_eq!(data.vertex_count(), 3);
        assert!(!data.is_resident());
        match data.source() {
            VertexSource::ClientBytes(bytes) => assert_eq!(bytes.len(), 36),
            VertexSource::GpuBuffer(_) => panic!("expected client storage"),
        }
    }

    #[test]
    fn test_upload_promotes_to_gpu_storage_once() {
        let mut backend = NullBackend::new();
        let vertices: [[f32; 3]; 3] = [[0.0; 3]; 3];
        let mut data =
            VertexData::from_vertices(&vertices, position_layout(), PrimitiveTopology::Triangles);

        data.upload(&mut backend).unwrap();
        assert!(data.is_resident());
        data.upload(&mut backend).unwrap();
        assert_eq!(backend.buffers_created(), 1);
    }

    #[test]
    fn test_release_deletes_the_gpu_buffer() {
        let mut backend = NullBackend::new();
        let vertices: [[f32; 3]; 3] = [[0.0; 3]; 3];
        let mut data =
            VertexData::from_vertices(&vertices, position_layout(), PrimitiveTopology::Triangles);

        data.upload(&mut backend).unwrap();
        data.release(&mut backend);
        assert!(!data.is_resident());
        assert_eq!(data.vertex_count(), 0);
    }
}
