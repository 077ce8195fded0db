//! Fixed-layout records at the tail of a ZIP archive.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use anyhow::{Result, bail};

/// Check the signature and length of a record and return a cursor over the
/// fields that follow the signature.
fn record_fields<'a>(
    data: &'a [u8],
    signature: &[u8],
    min_size: usize,
    what: &str,
) -> Result<Cursor<&'a [u8]>> {
    if data.len() < min_size {
        bail!("Truncated {} ({} of {} bytes)", what, data.len(), min_size);
    }
    if !data.starts_with(signature) {
        bail!("Invalid {} signature", what);
    }
    Ok(Cursor::new(&data[signature.len()..]))
}

/// End of Central Directory record (EOCD), 22 bytes plus the comment.
pub struct EndOfCentralDirectory {
    pub disk_number: u16,
    pub disk_with_cd: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EndOfCentralDirectory {
    pub const SIGNATURE: &'static [u8] = b"PK\x05\x06";
    pub const SIZE: usize = 22;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut fields =
            record_fields(data, Self::SIGNATURE, Self::SIZE, "End of Central Directory")?;
        Ok(Self {
            disk_number: fields.read_u16::<LittleEndian>()?,
            disk_with_cd: fields.read_u16::<LittleEndian>()?,
            disk_entries: fields.read_u16::<LittleEndian>()?,
            total_entries: fields.read_u16::<LittleEndian>()?,
            cd_size: fields.read_u32::<LittleEndian>()?,
            cd_offset: fields.read_u32::<LittleEndian>()?,
            comment_len: fields.read_u16::<LittleEndian>()?,
        })
    }

    /// Any saturated field means the real value lives in the ZIP64 record.
    pub fn is_zip64(&self) -> bool {
        self.disk_entries == u16::MAX
            || self.total_entries == u16::MAX
            || self.cd_size == u32::MAX
            || self.cd_offset == u32::MAX
    }

    /// Split archives keep part of the central directory on other disks.
    pub fn is_multi_disk(&self) -> bool {
        let spans = |disk: u16| disk != 0 && disk != u16::MAX;
        spans(self.disk_number) || spans(self.disk_with_cd)
    }
}

/// ZIP64 locator, the 20 bytes right before the EOCD.
pub struct Zip64EOCDLocator {
    pub disk_with_eocd64: u32,
    pub eocd64_offset: u64,
    pub total_disks: u32,
}

impl Zip64EOCDLocator {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x07";
    pub const SIZE: usize = 20;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut fields = record_fields(data, Self::SIGNATURE, Self::SIZE, "ZIP64 locator")?;
        Ok(Self {
            disk_with_eocd64: fields.read_u32::<LittleEndian>()?,
            eocd64_offset: fields.read_u64::<LittleEndian>()?,
            total_disks: fields.read_u32::<LittleEndian>()?,
        })
    }
}

/// ZIP64 End of Central Directory record. Only the fixed 56-byte part is
/// read; the extensible data sector is ignored.
pub struct Zip64EOCD {
    pub disk_number: u32,
    pub disk_with_cd: u32,
    pub total_entries: u64,
    pub cd_size: u64,
    pub cd_offset: u64,
}

impl Zip64EOCD {
    pub const SIGNATURE: &'static [u8] = b"PK\x06\x06";
    pub const MIN_SIZE: usize = 56;

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut fields = record_fields(
            data,
            Self::SIGNATURE,
            Self::MIN_SIZE,
            "ZIP64 End of Central Directory",
        )?;
        let _record_size = fields.read_u64::<LittleEndian>()?;
        let _version_made_by = fields.read_u16::<LittleEndian>()?;
        let _version_needed = fields.read_u16::<LittleEndian>()?;
        let disk_number = fields.read_u32::<LittleEndian>()?;
        let disk_with_cd = fields.read_u32::<LittleEndian>()?;
        let _disk_entries = fields.read_u64::<LittleEndian>()?;
        Ok(Self {
            disk_number,
            disk_with_cd,
            total_entries: fields.read_u64::<LittleEndian>()?,
            cd_size: fields.read_u64::<LittleEndian>()?,
            cd_offset: fields.read_u64::<LittleEndian>()?,
        })
    }

    pub fn is_multi_disk(&self) -> bool {
        self.disk_number != 0 || self.disk_with_cd != 0
    }
}

/// Central Directory File Header (CDFH) - 46 bytes minimum
pub const CDFH_SIGNATURE: &[u8] = b"PK\x01\x02";
pub const CDFH_MIN_SIZE: usize = 46;

/// One entry of the central directory, in archive storage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipFileEntry {
    /// Raw entry name, `/` separated. Directory entries end with `/`.
    pub file_name: String,
    pub uncompressed_size: u64,
    pub is_directory: bool,
}
