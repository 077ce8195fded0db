//! Low-level ZIP central directory parser.
//!
//! This module handles the binary parsing of ZIP file structures,
//! reading from any source that implements the [`ReadAt`] trait.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the file's end
//! 2. If ZIP64, read the ZIP64 EOCD for large file support
//! 3. Read the Central Directory to get metadata for all entries
//!
//! Only the tail of the archive is touched, which keeps listing a remote
//! archive down to two or three Range requests.

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use std::io::{Cursor, Read};
use std::sync::Arc;

use crate::io::ReadAt;
use anyhow::{Context, Result, bail};

use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: u64 = 65535;

/// Low-level ZIP file parser.
///
/// Generic over the reader type to support both local files and HTTP sources.
/// Typically used through [`ZipListing`](super::ZipListing) rather than directly.
pub struct ZipParser<R: ReadAt> {
    /// The underlying data source
    reader: Arc<R>,
    /// Total size of the archive in bytes
    size: u64,
}

impl<R: ReadAt> ZipParser<R> {
    pub fn new(reader: Arc<R>) -> Self {
        let size = reader.size();
        Self { reader, size }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record and its offset in the file. Fails if no valid
    /// EOCD exists, meaning the file is not a ZIP archive.
    pub async fn find_eocd(&self) -> Result<(EndOfCentralDirectory, u64)> {
        if self.size < EndOfCentralDirectory::SIZE as u64 {
            bail!("Not a valid ZIP file (only {} bytes)", self.size);
        }

        // Common case: no archive comment, EOCD is the last 22 bytes.
        let offset = self.size - EndOfCentralDirectory::SIZE as u64;
        let mut buf = vec![0u8; EndOfCentralDirectory::SIZE];
        self.reader.read_exact_at(offset, &mut buf).await?;

        if &buf[0..4] == EndOfCentralDirectory::SIGNATURE && &buf[20..22] == b"\x00\x00" {
            let eocd = EndOfCentralDirectory::from_bytes(&buf)?;
            return Ok((eocd, offset));
        }

        // Archive has a comment: search backwards for a signature whose
        // comment length reaches exactly to the end of the file.
        let search_size = (MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE as u64).min(self.size);
        let search_start = self.size - search_size;

        let mut buf = vec![0u8; search_size as usize];
        self.reader.read_exact_at(search_start, &mut buf).await?;

        for i in (0..=buf.len() - EndOfCentralDirectory::SIZE).rev() {
            if &buf[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                let comment_len = u16::from_le_bytes([buf[i + 20], buf[i + 21]]) as usize;

                if comment_len == buf.len() - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(
                        &buf[i..i + EndOfCentralDirectory::SIZE],
                    )?;
                    return Ok((eocd, search_start + i as u64));
                }
            }
        }

        bail!("Not a valid ZIP file")
    }

    /// Read the ZIP64 End of Central Directory record.
    ///
    /// The ZIP64 locator sits immediately before the regular EOCD and
    /// points at the ZIP64 record.
    pub async fn read_zip64_eocd(&self, eocd_offset: u64) -> Result<Zip64EOCD> {
        let locator_offset = eocd_offset
            .checked_sub(Zip64EOCDLocator::SIZE as u64)
            .context("Missing ZIP64 End of Central Directory Locator")?;
        let mut locator_buf = vec![0u8; Zip64EOCDLocator::SIZE];
        self.reader
            .read_exact_at(locator_offset, &mut locator_buf)
            .await?;

        let locator = Zip64EOCDLocator::from_bytes(&locator_buf)?;

        let mut eocd64_buf = vec![0u8; Zip64EOCD::MIN_SIZE];
        self.reader
            .read_exact_at(locator.eocd64_offset, &mut eocd64_buf)
            .await?;

        Zip64EOCD::from_bytes(&eocd64_buf)
    }

    /// List all entries of the ZIP archive in storage order.
    ///
    /// Reads the EOCD first, then fetches and parses the entire Central
    /// Directory in a single read.
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        let (eocd, eocd_offset) = self.find_eocd().await?;

        if eocd.is_multi_disk() {
            bail!("Multi-disk archives are not supported");
        }

        let (cd_offset, cd_size, total_entries) = if eocd.is_zip64() {
            let eocd64 = self.read_zip64_eocd(eocd_offset).await?;
            if eocd64.is_multi_disk() {
                bail!("Multi-disk archives are not supported");
            }
            (eocd64.cd_offset, eocd64.cd_size, eocd64.total_entries)
        } else {
            (
                eocd.cd_offset as u64,
                eocd.cd_size as u64,
                eocd.total_entries as u64,
            )
        };

        debug!(
            "Central Directory: {} entries, {} bytes at offset {}",
            total_entries, cd_size, cd_offset
        );

        // A corrupt EOCD must not trigger a huge allocation.
        if cd_offset.checked_add(cd_size).is_none_or(|end| end > eocd_offset) {
            bail!("Central Directory lies outside the archive");
        }
        if total_entries > cd_size / CDFH_MIN_SIZE as u64 {
            bail!(
                "Central Directory of {} bytes cannot hold {} entries",
                cd_size,
                total_entries
            );
        }

        let mut cd_data = vec![0u8; cd_size as usize];
        self.reader.read_exact_at(cd_offset, &mut cd_data).await?;

        let mut entries = Vec::with_capacity(total_entries as usize);
        let mut cursor = Cursor::new(&cd_data);

        for index in 0..total_entries {
            let entry = self
                .parse_cdfh(&mut cursor)
                .with_context(|| format!("Corrupt Central Directory entry #{}", index))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Parse a Central Directory File Header from a cursor.
    ///
    /// Only the fields needed for listing are kept: the entry name and its
    /// uncompressed size (widened from the ZIP64 extra field when needed).
    fn parse_cdfh(&self, cursor: &mut Cursor<&Vec<u8>>) -> Result<ZipFileEntry> {
        let mut sig = [0u8; 4];
        cursor.read_exact(&mut sig)?;
        if sig != CDFH_SIGNATURE {
            bail!("Invalid Central Directory File Header");
        }

        let _version_made_by = cursor.read_u16::<LittleEndian>()?;
        let _version_needed = cursor.read_u16::<LittleEndian>()?;
        let _flags = cursor.read_u16::<LittleEndian>()?;
        let _compression_method = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_time = cursor.read_u16::<LittleEndian>()?;
        let _last_mod_date = cursor.read_u16::<LittleEndian>()?;
        let _crc32 = cursor.read_u32::<LittleEndian>()?;
        let _compressed_size = cursor.read_u32::<LittleEndian>()?;
        let mut uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
        let file_name_length = cursor.read_u16::<LittleEndian>()?;
        let extra_field_length = cursor.read_u16::<LittleEndian>()?;
        let file_comment_length = cursor.read_u16::<LittleEndian>()?;
        let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
        let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
        let _external_attrs = cursor.read_u32::<LittleEndian>()?;
        let _lfh_offset = cursor.read_u32::<LittleEndian>()?;

        let mut file_name_bytes = vec![0u8; file_name_length as usize];
        cursor.read_exact(&mut file_name_bytes)?;
        // Names are usually UTF-8 or CP437; lossy decoding keeps listing total.
        let file_name = String::from_utf8_lossy(&file_name_bytes).into_owned();

        let is_directory = file_name.ends_with('/');

        // ZIP64 extended information lives in extra field 0x0001. The
        // uncompressed size comes first when present.
        let extra_field_end = cursor.position() + extra_field_length as u64;
        if extra_field_end > cursor.get_ref().len() as u64 {
            bail!("Extra field runs past the Central Directory");
        }

        while cursor.position() + 4 <= extra_field_end {
            let header_id = cursor.read_u16::<LittleEndian>()?;
            let field_size = cursor.read_u16::<LittleEndian>()?;
            let field_end = cursor.position() + field_size as u64;

            if header_id == 0x0001
                && uncompressed_size == 0xFFFFFFFF
                && cursor.position() + 8 <= field_end.min(extra_field_end)
            {
                uncompressed_size = cursor.read_u64::<LittleEndian>()?;
            }

            cursor.set_position(field_end.min(extra_field_end));
        }

        cursor.set_position(extra_field_end + file_comment_length as u64);

        Ok(ZipFileEntry {
            file_name,
            uncompressed_size,
            is_directory,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct MemoryReader(Vec<u8>);

    #[async_trait]
    impl ReadAt for MemoryReader {
        async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
            let start = (offset as usize).min(self.0.len());
            let n = buf.len().min(self.0.len() - start);
            buf[..n].copy_from_slice(&self.0[start..start + n]);
            Ok(n)
        }

        fn size(&self) -> u64 {
            self.0.len() as u64
        }
    }

    fn cdfh(name: &str, uncompressed_size: u32, extra: &[u8]) -> Vec<u8> {
        let mut data = CDFH_SIGNATURE.to_vec();
        data.extend_from_slice(&20u16.to_le_bytes()); // version made by
        data.extend_from_slice(&20u16.to_le_bytes()); // version needed
        data.extend_from_slice(&0u16.to_le_bytes()); // flags
        data.extend_from_slice(&0u16.to_le_bytes()); // method
        data.extend_from_slice(&0u16.to_le_bytes()); // time
        data.extend_from_slice(&0u16.to_le_bytes()); // date
        data.extend_from_slice(&0u32.to_le_bytes()); // crc
        data.extend_from_slice(&0u32.to_le_bytes()); // compressed
        data.extend_from_slice(&uncompressed_size.to_le_bytes());
        data.extend_from_slice(&(name.len() as u16).to_le_bytes());
        data.extend_from_slice(&(extra.len() as u16).to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes()); // comment
        data.extend_from_slice(&0u16.to_le_bytes()); // disk
        data.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        data.extend_from_slice(&0u32.to_le_bytes()); // external attrs
        data.extend_from_slice(&0u32.to_le_bytes()); // local header offset
        data.extend_from_slice(name.as_bytes());
        data.extend_from_slice(extra);
        data
    }

    /// Central directory at offset 0 followed by the EOCD.
    fn archive(headers: &[Vec<u8>], total_entries: u16, comment: &[u8]) -> Vec<u8> {
        let cd: Vec<u8> = headers.concat();
        let mut data = cd.clone();
        data.extend_from_slice(EndOfCentralDirectory::SIGNATURE);
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&total_entries.to_le_bytes());
        data.extend_from_slice(&total_entries.to_le_bytes());
        data.extend_from_slice(&(cd.len() as u32).to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        data.extend_from_slice(&(comment.len() as u16).to_le_bytes());
        data.extend_from_slice(comment);
        data
    }

    async fn list(data: Vec<u8>) -> Result<Vec<ZipFileEntry>> {
        ZipParser::new(Arc::new(MemoryReader(data))).list_files().await
    }

    #[tokio::test]
    async fn lists_central_directory() {
        let data = archive(
            &[cdfh("docs/", 0, &[]), cdfh("docs/a.md", 12, &[])],
            2,
            b"",
        );
        let entries = list(data).await.unwrap();
        assert_eq!(
            entries,
            vec![
                ZipFileEntry {
                    file_name: "docs/".into(),
                    uncompressed_size: 0,
                    is_directory: true,
                },
                ZipFileEntry {
                    file_name: "docs/a.md".into(),
                    uncompressed_size: 12,
                    is_directory: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn finds_eocd_behind_comment() {
        let data = archive(&[cdfh("x", 1, &[])], 1, b"PK\x05\x06 looks like a signature");
        let entries = list(data).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "x");
    }

    #[tokio::test]
    async fn reads_zip64_size_from_extra_field() {
        let mut extra = 0x0001u16.to_le_bytes().to_vec();
        extra.extend_from_slice(&8u16.to_le_bytes());
        extra.extend_from_slice(&(5u64 << 32).to_le_bytes());
        let data = archive(&[cdfh("big.bin", 0xFFFF_FFFF, &extra)], 1, b"");
        let entries = list(data).await.unwrap();
        assert_eq!(entries[0].uncompressed_size, 5u64 << 32);
    }

    #[tokio::test]
    async fn huge_declared_sizes_do_not_overflow() {
        let mut extra = 0x0001u16.to_le_bytes().to_vec();
        extra.extend_from_slice(&8u16.to_le_bytes());
        extra.extend_from_slice(&u64::MAX.to_le_bytes());
        let data = archive(
            &[
                cdfh("a.bin", 0xFFFF_FFFF, &extra),
                cdfh("b.bin", 0xFFFF_FFFF, &extra),
            ],
            2,
            b"",
        );

        let listing = crate::zip::ZipListing::new(Arc::new(MemoryReader(data)));
        let entries = listing.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.uncompressed_size == u64::MAX));
    }

    #[tokio::test]
    async fn rejects_impossible_entry_count() {
        let data = archive(&[cdfh("x", 1, &[])], 100, b"");
        assert!(list(data).await.is_err());
    }

    #[tokio::test]
    async fn rejects_truncated_header() {
        let mut header = cdfh("name.txt", 1, &[]);
        header.truncate(50);
        let data = archive(&[header], 1, b"");
        assert!(list(data).await.is_err());
    }

    #[tokio::test]
    async fn rejects_non_zip() {
        assert!(list(b"short".to_vec()).await.is_err());
        assert!(list(vec![0u8; 512]).await.is_err());
    }
}
