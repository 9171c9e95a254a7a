use crate::{
    error::Result,
    format::{cursor::BinaryReader, header::Header},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtraValue {
    String(Option<String>),
    Integer(u32),
    BsxFlags(u32),
}

/// NiStringExtraData, NiIntegerExtraData and BSXFlags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtraData {
    pub name: Option<String>,
    pub value: ExtraValue,
}

impl ExtraData {
    fn read_name(reader: &mut BinaryReader, header: &Header) -> Result<Option<String>> {
        if header.versions.has_extra_data_name() {
            reader.read_string(header)
        } else {
            Ok(None)
        }
    }

    pub fn read_string(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let name = Self::read_name(reader, header)?;
        let value = ExtraValue::String(reader.read_string(header)?);
        Ok(Self { name, value })
    }

    pub fn read_integer(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let name = Self::read_name(reader, header)?;
        let value = ExtraValue::Integer(reader.read_u32()?);
        Ok(Self { name, value })
    }

    pub fn read_bsx_flags(reader: &mut BinaryReader, header: &Header) -> Result<Self> {
        let name = Self::read_name(reader, header)?;
        let value = ExtraValue::BsxFlags(reader.read_u32()?);
        Ok(Self { name, value })
    }
}
