//! Byte-addressable geometry buffers.
//!
//! Attribute buffers are raw bytes read as fixed-size records at
//! `offset + vertex_index * stride`. Several attribute views may share one
//! allocation, which is how interleaved vertex data is exposed.

use std::mem::{offset_of, size_of};
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use raylod_core::{Error, Result};

/// Interleaved vertex record.
///
/// `tangent.w` holds the bitangent sign.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tangent: [f32; 4],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Size in bytes of one interleaved vertex.
    pub const STRIDE: usize = size_of::<Self>();
}

/// Read-only view of one vertex attribute inside a byte buffer.
#[derive(Clone, Debug)]
pub struct AttributeBuffer {
    bytes: Arc<[u8]>,
    offset: usize,
    stride: usize,
}

impl AttributeBuffer {
    /// View `bytes` as records of `stride` bytes starting at `offset`.
    pub fn new(bytes: Arc<[u8]>, offset: usize, stride: usize) -> Result<Self> {
        if stride == 0 {
            return Err(Error::InvalidData("attribute stride must be non-zero".into()));
        }
        if offset > stride {
            return Err(Error::InvalidData(format!(
                "attribute offset {offset} exceeds stride {stride}"
            )));
        }
        Ok(Self {
            bytes,
            offset,
            stride,
        })
    }

    /// Tightly packed buffer holding `records`.
    pub fn from_records<T: Pod>(records: &[T]) -> Self {
        Self {
            bytes: Arc::from(bytemuck::cast_slice::<T, u8>(records)),
            offset: 0,
            stride: size_of::<T>(),
        }
    }

    /// Bytes between consecutive records.
    #[inline]
    pub const fn stride(&self) -> usize {
        self.stride
    }

    /// Number of complete `T` records in the buffer.
    ///
    /// A trailing record whose bytes are cut off is not counted. Fails with
    /// [`Error::InvalidData`] if a `T` at this offset does not fit the stride.
    pub fn record_count<T: Pod>(&self) -> Result<usize> {
        let size = self.checked_record_size::<T>()?;
        Ok(match self.bytes.len().checked_sub(self.offset + size) {
            Some(rest) => rest / self.stride + 1,
            None => 0,
        })
    }

    fn checked_record_size<T: Pod>(&self) -> Result<usize> {
        let size = size_of::<T>();
        if self.offset + size > self.stride {
            return Err(Error::InvalidData(format!(
                "record of {size} bytes at offset {} does not fit stride {}",
                self.offset, self.stride
            )));
        }
        Ok(size)
    }

    /// Read the record of type `T` for `vertex_index`.
    pub fn read<T: Pod>(&self, vertex_index: u32) -> Result<T> {
        let size = self.checked_record_size::<T>()?;
        let start = self.offset + vertex_index as usize * self.stride;
        let record = self.bytes.get(start..start + size).ok_or_else(|| {
            Error::OutOfBounds(format!(
                "vertex {vertex_index} reads bytes {start}..{} of a {}-byte buffer",
                start + size,
                self.bytes.len()
            ))
        })?;
        Ok(bytemuck::pod_read_unaligned(record))
    }
}

/// Width of the entries in an index buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    U16,
    #[default]
    U32,
}

impl IndexFormat {
    /// Size of one index in bytes.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::U16 => 2,
            Self::U32 => 4,
        }
    }
}

/// Triangle list index buffer.
#[derive(Clone, Debug)]
pub struct IndexBuffer {
    bytes: Arc<[u8]>,
    format: IndexFormat,
}

impl IndexBuffer {
    /// Wrap raw index bytes. The length must be a whole number of triangles.
    pub fn new(bytes: Arc<[u8]>, format: IndexFormat) -> Result<Self> {
        let triangle_bytes = 3 * format.size();
        if bytes.len() % triangle_bytes != 0 {
            return Err(Error::InvalidData(format!(
                "index buffer of {} bytes is not a whole number of {format:?} triangles",
                bytes.len()
            )));
        }
        Ok(Self { bytes, format })
    }

    /// 32-bit triangle list.
    pub fn from_u32(indices: &[u32]) -> Result<Self> {
        Self::new(Arc::from(bytemuck::cast_slice::<u32, u8>(indices)), IndexFormat::U32)
    }

    /// 32-bit triangle list from whole triangles.
    pub fn from_triangles(triangles: &[[u32; 3]]) -> Self {
        Self {
            bytes: Arc::from(bytemuck::cast_slice::<[u32; 3], u8>(triangles)),
            format: IndexFormat::U32,
        }
    }

    /// 16-bit triangle list.
    pub fn from_u16(indices: &[u16]) -> Result<Self> {
        Self::new(Arc::from(bytemuck::cast_slice::<u16, u8>(indices)), IndexFormat::U16)
    }

    /// Index width.
    #[inline]
    pub const fn format(&self) -> IndexFormat {
        self.format
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> u32 {
        (self.bytes.len() / (3 * self.format.size())) as u32
    }

    /// The three vertex indices of `triangle_index`.
    pub fn triangle(&self, triangle_index: u32) -> Result<[u32; 3]> {
        let size = self.format.size();
        let start = triangle_index as usize * 3 * size;
        let bytes = self.bytes.get(start..start + 3 * size).ok_or_else(|| {
            Error::OutOfBounds(format!(
                "triangle {triangle_index} of {}",
                self.triangle_count()
            ))
        })?;
        let index = |i: usize| -> u32 {
            let entry = &bytes[i * size..(i + 1) * size];
            match self.format {
                IndexFormat::U16 => u32::from(bytemuck::pod_read_unaligned::<u16>(entry)),
                IndexFormat::U32 => bytemuck::pod_read_unaligned::<u32>(entry),
            }
        };
        Ok([index(0), index(1), index(2)])
    }
}

/// Byte offsets of each attribute inside [`Vertex`].
pub(crate) mod vertex_layout {
    use super::{offset_of, Vertex};

    pub const POSITION: usize = offset_of!(Vertex, position);
    pub const NORMAL: usize = offset_of!(Vertex, normal);
    pub const TANGENT: usize = offset_of!(Vertex, tangent);
    pub const TEX_COORD: usize = offset_of!(Vertex, tex_coord);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout() {
        assert_eq!(Vertex::STRIDE, 48);
        assert_eq!(vertex_layout::POSITION, 0);
        assert_eq!(vertex_layout::NORMAL, 12);
        assert_eq!(vertex_layout::TANGENT, 24);
        assert_eq!(vertex_layout::TEX_COORD, 40);
    }

    #[test]
    fn packed_records() {
        let buffer = AttributeBuffer::from_records(&[[1.0_f32, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        assert_eq!(buffer.record_count::<[f32; 2]>().unwrap(), 3);
        assert_eq!(buffer.stride(), 8);
        assert_eq!(buffer.read::<[f32; 2]>(2).unwrap(), [5.0, 6.0]);
        assert!(matches!(buffer.read::<[f32; 2]>(3), Err(Error::OutOfBounds(_))));
    }

    #[test]
    fn interleaved_view_reads_at_offset() {
        let vertices = [
            Vertex {
                tex_coord: [0.25, 0.75],
                ..Default::default()
            },
            Vertex {
                normal: [0.0, 0.0, 1.0],
                tex_coord: [0.5, 0.5],
                ..Default::default()
            },
        ];
        let bytes: Arc<[u8]> = Arc::from(bytemuck::cast_slice::<Vertex, u8>(&vertices));
        let uvs = AttributeBuffer::new(bytes.clone(), vertex_layout::TEX_COORD, Vertex::STRIDE)
            .unwrap();
        let normals = AttributeBuffer::new(bytes, vertex_layout::NORMAL, Vertex::STRIDE).unwrap();
        assert_eq!(uvs.record_count::<[f32; 2]>().unwrap(), 2);
        assert_eq!(uvs.read::<[f32; 2]>(0).unwrap(), [0.25, 0.75]);
        assert_eq!(uvs.read::<[f32; 2]>(1).unwrap(), [0.5, 0.5]);
        assert_eq!(normals.read::<[f32; 3]>(1).unwrap(), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn truncated_record_is_not_counted() {
        // Two whole vertices and the first 20 bytes of a third.
        let vertices = [Vertex::default(); 3];
        let bytes = &bytemuck::cast_slice::<Vertex, u8>(&vertices)[..2 * Vertex::STRIDE + 20];
        let bytes: Arc<[u8]> = Arc::from(bytes);
        let positions = AttributeBuffer::new(bytes.clone(), vertex_layout::POSITION, Vertex::STRIDE)
            .unwrap();
        let tangents =
            AttributeBuffer::new(bytes, vertex_layout::TANGENT, Vertex::STRIDE).unwrap();
        assert_eq!(positions.record_count::<[f32; 3]>().unwrap(), 3);
        assert_eq!(tangents.record_count::<[f32; 4]>().unwrap(), 2);
        assert!(matches!(tangents.read::<[f32; 4]>(2), Err(Error::OutOfBounds(_))));
    }

    #[test]
    fn record_larger_than_stride_is_rejected() {
        let buffer = AttributeBuffer::from_records(&[[0.0_f32; 2]; 4]);
        assert!(matches!(buffer.read::<[f32; 3]>(0), Err(Error::InvalidData(_))));
        assert!(matches!(buffer.record_count::<[f32; 3]>(), Err(Error::InvalidData(_))));
        assert!(AttributeBuffer::new(Arc::from([0_u8; 8].as_slice()), 0, 0).is_err());
    }

    #[test]
    fn index_formats() {
        let wide = IndexBuffer::from_u32(&[0, 1, 2, 2, 1, 70_000]).unwrap();
        assert_eq!(wide.triangle_count(), 2);
        assert_eq!(wide.triangle(1).unwrap(), [2, 1, 70_000]);

        let narrow = IndexBuffer::from_u16(&[3, 4, 5]).unwrap();
        assert_eq!(narrow.format(), IndexFormat::U16);
        assert_eq!(narrow.triangle(0).unwrap(), [3, 4, 5]);
        assert!(matches!(narrow.triangle(1), Err(Error::OutOfBounds(_))));
    }

    #[test]
    fn partial_triangle_is_rejected() {
        assert!(IndexBuffer::from_u32(&[0, 1]).is_err());
        assert!(IndexBuffer::new(Arc::from([0_u8; 8].as_slice()), IndexFormat::U16).is_err());
    }

    #[test]
    fn whole_triangles() {
        let indices = IndexBuffer::from_triangles(&[[0, 1, 2], [2, 3, 0]]);
        assert_eq!(indices.triangle_count(), 2);
        assert_eq!(indices.triangle(1).unwrap(), [2, 3, 0]);
    }
}
