//! CPVS Container
//!
//! Little-endian layout:
//!
//! ```text
//! u32   magic         "PVS0"
//! u32   header count  offset table length + 1
//! i32[] room offsets  one per room plus the end of the payload
//! u8[]  payload       compressed bitsets in room order
//! ```

use crate::bitset::unpack_visibility;
use crate::error::{CpvsError, Result};
use crate::rle::{decode_into, CpvsLayout};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// File magic, "PVS0" read as a little-endian `u32`.
pub const CPVS_MAGIC: u32 = 0x3053_5650;

/// An in-memory CPVS file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cpvs {
    /// Payload offsets; `offsets[i]..offsets[i + 1]` is room `i`'s compressed span.
    offsets: Vec<i32>,

    /// Concatenated compressed spans.
    payload: Vec<u8>,
}

/// Map an unexpected end of stream to `TruncatedData`.
///
/// * `err`  - The I/O error.
/// * `what` - Which part of the header was being read.
fn truncated(err: io::Error, what: &str) -> CpvsError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        CpvsError::TruncatedData(format!("stream ends inside the {what}"))
    } else {
        CpvsError::Io(err)
    }
}

impl Cpvs {
    /// Create a container from an offset table and payload.
    ///
    /// * `offsets` - Offset table.
    /// * `payload` - Compressed spans.
    pub fn new(offsets: Vec<i32>, payload: Vec<u8>) -> Self {
        Self { offsets, payload }
    }

    /// Create a container by concatenating per-room compressed spans.
    ///
    /// * `spans` - Compressed span of each room, in room order.
    pub fn from_spans<I, S>(spans: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut offsets = vec![0_i32];
        let mut payload = vec![];
        for span in spans {
            payload.extend_from_slice(span.as_ref());
            let end = i32::try_from(payload.len())
                .map_err(|_| CpvsError::InvalidFormat(format!("payload of {} bytes too large", payload.len())))?;
            offsets.push(end);
        }
        Ok(Self { offsets, payload })
    }

    /// Returns the number of rooms with a compressed span.
    pub fn room_count(&self) -> usize {
        self.offsets.len().saturating_sub(1)
    }

    /// Returns the offset table.
    pub fn offsets(&self) -> &[i32] {
        &self.offsets
    }

    /// Returns the payload.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Read a container. Everything after the offset table is payload.
    ///
    /// * `reader` - Source stream.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let magic = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| truncated(e, "magic"))?;
        if magic != CPVS_MAGIC {
            return Err(CpvsError::InvalidFormat(format!("bad magic {magic:#010x}")));
        }

        let header_count = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| truncated(e, "header count"))?;
        if header_count == 0 {
            return Err(CpvsError::InvalidFormat(String::from("header count is 0")));
        }

        let n = (header_count - 1) as usize;
        let mut offsets = Vec::with_capacity(n.min(1 << 20));
        for i in 0..n {
            let offset = reader
                .read_i32::<LittleEndian>()
                .map_err(|e| truncated(e, &format!("offset table (entry {i} of {n})")))?;
            offsets.push(offset);
        }

        let mut payload = vec![];
        reader.read_to_end(&mut payload)?;

        debug!("Read CPVS with {} offsets and {} payload bytes", offsets.len(), payload.len());
        Ok(Self { offsets, payload })
    }

    /// Write the container.
    ///
    /// * `writer` - Destination stream.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let header_count = u32::try_from(self.offsets.len() + 1)
            .map_err(|_| CpvsError::InvalidFormat(String::from("offset table too large")))?;

        writer.write_u32::<LittleEndian>(CPVS_MAGIC)?;
        writer.write_u32::<LittleEndian>(header_count)?;
        for &offset in self.offsets.iter() {
            writer.write_i32::<LittleEndian>(offset)?;
        }
        writer.write_all(&self.payload)?;
        Ok(())
    }

    /// Read a container from a file.
    ///
    /// * `path` - File path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        Self::read(&mut reader)
    }

    /// Write the container to a file.
    ///
    /// * `path` - File path.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }

    /// Decompress one room's visibility. Returns one flag per offset table entry; slot `j + 1` is room index `j`
    /// and slot 0 is the reserved room 0.
    ///
    /// * `room` - 0-based room index.
    pub fn decompress(&self, room: usize) -> Result<Vec<bool>> {
        let count = self.room_count();
        if room >= count {
            return Err(CpvsError::RoomOutOfRange { room, count });
        }

        let (start, end) = (self.offsets[room], self.offsets[room + 1]);
        if start < 0 || end < start {
            return Err(CpvsError::InvalidFormat(format!(
                "room {room} has invalid span {start}..{end}"
            )));
        }

        let (start, mut end) = (start as usize, end as usize);
        if end > self.payload.len() {
            warn!(
                "Room {} span {}..{} extends past the payload ({} bytes)",
                room,
                start,
                end,
                self.payload.len()
            );
            end = self.payload.len();
        }
        let span = self.payload.get(start..end).unwrap_or(&[]);

        let slot_count = self.offsets.len();
        let mut buffer = vec![0_u8; (slot_count + 3) / 4];
        decode_into::<CpvsLayout>(span, &mut buffer, false)?;

        Ok(unpack_visibility(&buffer, slot_count))
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
