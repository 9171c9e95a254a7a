//! File header: magic line, versions, block type table, string table.

use log::{debug, trace};

use crate::{
    error::Result,
    format::{
        cursor::{BinaryReader, Endian},
        version::{V5_0_0_1, Versions},
    },
};

const MAGIC_PREFIXES: [&str; 2] = ["Gamebryo File Format", "NetImmerse File Format"];

/// Mask applied to the per block type index (the top bit flags PhysX blocks).
const TYPE_INDEX_MASK: u16 = 0x7FFF;

/// Bethesda export information that follows the block count.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExportInfo {
    pub author: String,
    pub process_script: Option<String>,
    pub export_script: String,
    pub max_file_path: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct Header {
    pub header_line: String,
    pub versions: Versions,
    pub endian: Endian,
    pub num_blocks: usize,
    pub export_info: Option<ExportInfo>,
    pub block_types: Vec<String>,
    pub block_type_index: Vec<u16>,
    pub block_sizes: Option<Vec<u32>>,
    pub strings: Vec<String>,
    pub max_string_length: u32,
    pub groups: Vec<u32>,
}

impl Header {
    /// Decodes the header at the reader's position. Any failure, including a
    /// truncated stream, is reported as a malformed header.
    pub fn read(reader: &mut BinaryReader) -> Result<Header> {
        Self::read_fields(reader).map_err(|e| e.into_malformed_header())
    }

    fn read_fields(reader: &mut BinaryReader) -> Result<Header> {
        let header_line = reader.read_header_line()?;
        if !MAGIC_PREFIXES.iter().any(|m| header_line.starts_with(m)) {
            return Err(reader.malformed_header(format!("unrecognised magic `{header_line}`")));
        }

        let version = reader.read_u32()?;
        let mut versions = Versions::new(version, 0, 0);
        if version < V5_0_0_1 {
            return Err(reader.malformed_header(format!(
                "version {} predates the block type table",
                versions.dotted()
            )));
        }

        let mut endian = Endian::Little;
        if versions.has_endian_byte() {
            endian = match reader.read_u8()? {
                0 => Endian::Big,
                1 => Endian::Little,
                other => {
                    return Err(reader.malformed_header(format!("invalid endian byte {other}")));
                }
            };
            reader.set_endian(endian);
        }
        if versions.has_user_version() {
            versions.user_version = reader.read_u32()?;
        }
        let num_blocks = reader.read_u32()? as usize;

        let mut export_info = None;
        if versions.has_bs_header() {
            versions.bs_version = reader.read_u32()?;
            let author = reader.read_short_string()?;
            if versions.has_unknown_export_int() {
                reader.read_u32()?;
            }
            let process_script = if versions.has_process_script() {
                Some(reader.read_short_string()?)
            } else {
                None
            };
            let export_script = reader.read_short_string()?;
            let max_file_path = if versions.has_max_file_path() {
                Some(reader.read_short_string()?)
            } else {
                None
            };
            export_info = Some(ExportInfo {
                author,
                process_script,
                export_script,
                max_file_path,
            });
        }
        debug!(
            "{}: version {} user {} bethesda {} with {} blocks",
            reader.file_name(),
            versions.dotted(),
            versions.user_version,
            versions.bs_version,
            num_blocks
        );

        let num_types = reader.read_u16()? as u64;
        reader.check_count(num_types, 4)?;
        let block_types = (0..num_types)
            .map(|_| reader.read_sized_string())
            .collect::<Result<Vec<_>>>()?;

        reader.check_count(num_blocks as u64, 2)?;
        let mut block_type_index = Vec::with_capacity(num_blocks);
        for block in 0..num_blocks {
            let index = reader.read_u16()? & TYPE_INDEX_MASK;
            if index as usize >= block_types.len() {
                return Err(reader.malformed_header(format!(
                    "block {block} names type {index} but only {} types are declared",
                    block_types.len()
                )));
            }
            block_type_index.push(index);
        }

        let block_sizes = if versions.has_block_sizes() {
            Some(reader.read_u32s(num_blocks)?)
        } else {
            None
        };

        let mut strings = Vec::new();
        let mut max_string_length = 0;
        if versions.has_string_table() {
            let count = reader.read_count(4)?;
            max_string_length = reader.read_u32()?;
            strings.reserve(count);
            for _ in 0..count {
                strings.push(reader.read_sized_string()?);
            }
        }

        let groups = if versions.has_groups() {
            let count = reader.read_count(4)?;
            reader.read_u32s(count)?
        } else {
            Vec::new()
        };
        trace!(
            "{}: {} block types, {} strings, header ends at {}",
            reader.file_name(),
            block_types.len(),
            strings.len(),
            reader.position()
        );

        Ok(Header {
            header_line,
            versions,
            endian,
            num_blocks,
            export_info,
            block_types,
            block_type_index,
            block_sizes,
            strings,
            max_string_length,
            groups,
        })
    }

    /// Type name of block `index`.
    pub fn block_type(&self, index: usize) -> Option<&str> {
        let type_index = *self.block_type_index.get(index)? as usize;
        self.block_types.get(type_index).map(String::as_str)
    }

    /// Declared byte size of block `index`, when the stream has a size table.
    pub fn block_size(&self, index: usize) -> Option<u32> {
        self.block_sizes.as_ref()?.get(index).copied()
    }

    pub fn string(&self, index: u32) -> Option<&str> {
        self.strings.get(index as usize).map(String::as_str)
    }
}
