use log::{debug, trace, warn};

use crate::{
    error::{NifError, Result},
    flow::{Job, checkpoint},
    format::{
        blocks::{Block, BlockRegistry},
        cursor::BinaryReader,
        header::Header,
        refs::BlockRef,
    },
};

/// One decoded block and where it came from.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockEntry {
    pub type_name: String,
    pub offset: u64,
    pub block: Block,
}

/// A fully decoded file: header, the flat block list and the footer roots.
/// A block's identity is its position in `blocks`.
#[derive(Clone, Debug)]
pub struct NifFile {
    pub name: String,
    pub header: Header,
    pub blocks: Vec<BlockEntry>,
    pub roots: Vec<BlockRef>,
}

impl NifFile {
    /// Decodes a file one block per step.
    pub fn decode(reader: BinaryReader, registry: &BlockRegistry) -> Job<'_, Result<NifFile>> {
        Job::new(decode_blocks(reader, registry))
    }

    /// Decodes a file in one go.
    pub fn read(reader: BinaryReader, registry: &BlockRegistry) -> Result<NifFile> {
        futures::executor::block_on(decode_blocks(reader, registry))
    }

    pub fn from_bytes(bytes: Vec<u8>, name: &str, registry: &BlockRegistry) -> Result<NifFile> {
        Self::read(BinaryReader::from_bytes(bytes, name), registry)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&BlockEntry> {
        self.blocks.get(index)
    }

    /// Number of blocks that were skipped as unsupported.
    pub fn unsupported_count(&self) -> usize {
        self.blocks
            .iter()
            .filter(|entry| entry.block.is_unsupported())
            .count()
    }
}

async fn decode_blocks(mut reader: BinaryReader, registry: &BlockRegistry) -> Result<NifFile> {
    let header = Header::read(&mut reader)?;
    checkpoint().await;

    let mut blocks = Vec::with_capacity(header.num_blocks);
    for index in 0..header.num_blocks {
        let type_name = header.block_type(index).unwrap_or_default().to_string();
        let offset = reader.position();
        let declared = header.block_size(index);

        let block = match (registry.get(&type_name), declared) {
            (Some(decode), Some(size)) => {
                let mut block_reader = reader
                    .take(size as u64)
                    .map_err(|e| e.in_block(index, &type_name))?;
                match decode(&mut block_reader, &header) {
                    Ok(block) => {
                        if block_reader.remaining() > 0 {
                            warn!(
                                "{}: block {} (`{}`) consumed {} of its {} bytes, skipping the rest",
                                reader.file_name(),
                                index,
                                type_name,
                                block_reader.position() - offset,
                                size
                            );
                        }
                        block
                    }
                    Err(e) => {
                        warn!(
                            "{}: block {} (`{}`) does not decode within its {} bytes, skipping it: {}",
                            reader.file_name(),
                            index,
                            type_name,
                            size,
                            e.in_block(index, &type_name)
                        );
                        Block::Unsupported {
                            type_name: type_name.clone(),
                        }
                    }
                }
            }
            // without sizes there is no way past a block that fails to decode
            (Some(decode), None) => decode(&mut reader, &header).map_err(|e| e.in_block(index, &type_name))?,
            (None, Some(size)) => {
                debug!(
                    "{}: skipping unsupported block {} (`{}`, {} bytes)",
                    reader.file_name(),
                    index,
                    type_name,
                    size
                );
                reader
                    .skip(size as u64)
                    .map_err(|e| e.in_block(index, &type_name))?;
                Block::Unsupported {
                    type_name: type_name.clone(),
                }
            }
            (None, None) => {
                return Err(NifError::UnsupportedBlockType {
                    file: reader.file_name().to_string(),
                    offset,
                    index,
                    type_name,
                });
            }
        };
        trace!("{}: block {} `{}` at {}", reader.file_name(), index, type_name, offset);
        blocks.push(BlockEntry {
            type_name,
            offset,
            block,
        });
        checkpoint().await;
    }

    let roots = reader
        .read_refs()
        .map_err(|e| e.in_block(header.num_blocks, "footer"))?;
    for root in roots.iter().filter(|r| r.index().is_some_and(|i| i >= blocks.len())) {
        warn!("{}: footer root {} is out of range", reader.file_name(), root);
    }

    Ok(NifFile {
        name: reader.file_name().to_string(),
        header,
        blocks,
        roots,
    })
}
