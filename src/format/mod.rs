//! Binary decoding of `.nif` scene files.
//!
//! - [`cursor`]: endian aware primitive reader over a seekable stream
//! - [`version`]: named version predicates that gate every optional field
//! - [`header`]: header line, versions, block type and string tables
//! - [`blocks`]: typed block records and the type name registry
//! - [`refs`]: block references and typed, bounds checked resolution
//! - [`file`]: the block decoding loop and the decoded [`NifFile`]

pub mod blocks;
pub mod cursor;
pub mod file;
pub mod header;
pub mod refs;
pub mod version;

pub use blocks::{Block, BlockRegistry};
pub use cursor::BinaryReader;
pub use file::{BlockEntry, NifFile};
pub use header::Header;
pub use refs::{BlockRef, FromBlock};
pub use version::Versions;
