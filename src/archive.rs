// Archive reader: a Paprika export (`.paprikarecipes`) is a zip container
// holding one gzip-compressed JSON document per recipe. This module only
// hands out the raw entry bytes; decoding lives in `record`.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("failed to open archive {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("archive is not a valid zip container: {0}")]
    Corrupt(#[source] ZipError),

    #[error("failed to read archive entry #{index}: {source}")]
    Entry {
        index: usize,
        #[source]
        source: ZipError,
    },

    #[error("failed to read contents of archive entry {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// One entry of the container, still compressed.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// An opened export archive. The underlying handle is released on drop.
pub struct PaprikaArchive<R> {
    zip: ZipArchive<R>,
}

impl PaprikaArchive<BufReader<File>> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ArchiveError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ArchiveError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> PaprikaArchive<R> {
    pub fn from_reader(reader: R) -> Result<Self, ArchiveError> {
        let zip = ZipArchive::new(reader).map_err(ArchiveError::Corrupt)?;
        Ok(Self { zip })
    }

    /// Number of entries, read from the central directory only.
    pub fn count(&self) -> usize {
        self.zip.len()
    }

    /// Lazily yields every entry in listing order. Counting and iterating go
    /// through the same handle, so both see the same listing.
    pub fn entries(&mut self) -> Entries<'_, R> {
        Entries {
            zip: &mut self.zip,
            next: 0,
        }
    }
}

pub struct Entries<'a, R> {
    zip: &'a mut ZipArchive<R>,
    next: usize,
}

impl<R: Read + Seek> Iterator for Entries<'_, R> {
    type Item = Result<RawEntry, ArchiveError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.zip.len() {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(read_entry(self.zip, index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.zip.len().saturating_sub(self.next);
        (left, Some(left))
    }
}

impl<R: Read + Seek> ExactSizeIterator for Entries<'_, R> {}

fn read_entry<R: Read + Seek>(
    zip: &mut ZipArchive<R>,
    index: usize,
) -> Result<RawEntry, ArchiveError> {
    let mut file = zip
        .by_index(index)
        .map_err(|source| ArchiveError::Entry { index, source })?;
    let name = file.name().to_string();
    // The declared size comes from the archive itself and may be bogus.
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)
        .map_err(|source| ArchiveError::Read {
            name: name.clone(),
            source,
        })?;
    Ok(RawEntry { name, bytes })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    /// Builds an in-memory zip with the given (name, contents) entries.
    pub(crate) fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn counts_entries_without_reading_them() {
        let data = zip_of(&[("a.paprikarecipe", b"one"), ("b.paprikarecipe", b"two")]);
        let archive = PaprikaArchive::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(archive.count(), 2);
    }

    #[test]
    fn yields_entries_in_listing_order() {
        let data = zip_of(&[
            ("Soup.paprikarecipe", b"soup"),
            ("Bread.paprikarecipe", b"bread"),
            ("Cake.paprikarecipe", b"cake"),
        ]);
        let mut archive = PaprikaArchive::from_reader(Cursor::new(data)).unwrap();
        let entries: Vec<RawEntry> = archive.entries().collect::<Result<_, _>>().unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            ["Soup.paprikarecipe", "Bread.paprikarecipe", "Cake.paprikarecipe"]
        );
        assert_eq!(entries[1].bytes, b"bread");
    }

    #[test]
    fn entries_reports_exact_length() {
        let data = zip_of(&[("a", b"1"), ("b", b"2"), ("c", b"3")]);
        let mut archive = PaprikaArchive::from_reader(Cursor::new(data)).unwrap();
        let mut entries = archive.entries();
        assert_eq!(entries.len(), 3);
        entries.next();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn empty_archive_has_no_entries() {
        let data = zip_of(&[]);
        let mut archive = PaprikaArchive::from_reader(Cursor::new(data)).unwrap();
        assert_eq!(archive.count(), 0);
        assert!(archive.entries().next().is_none());
    }

    #[test]
    fn rejects_corrupt_container() {
        let err = PaprikaArchive::from_reader(Cursor::new(b"not a zip file".to_vec()))
            .err()
            .unwrap();
        assert!(matches!(err, ArchiveError::Corrupt(_)));
    }

    /// A one-entry stored zip whose central directory declares `declared_size`
    /// as the uncompressed size through a zip64 extra field.
    fn zip_with_declared_size(declared_size: u64) -> Vec<u8> {
        let name = b"huge.paprikarecipe";
        let data = b"hello";
        let mut crc = flate2::Crc::new();
        crc.update(data);
        let crc = crc.sum();

        let mut out = Vec::new();
        // Local file header
        out.extend_from_slice(&0x0403_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0x21u16.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(data);

        // Central directory
        let cd_offset = out.len() as u32;
        out.extend_from_slice(&0x0201_4b50u32.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&45u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0x21u16.to_le_bytes());
        out.extend_from_slice(&crc.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&u32::MAX.to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&20u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(name);
        out.extend_from_slice(&0x0001u16.to_le_bytes());
        out.extend_from_slice(&16u16.to_le_bytes());
        out.extend_from_slice(&declared_size.to_le_bytes());
        out.extend_from_slice(&(data.len() as u64).to_le_bytes());
        let cd_size = out.len() as u32 - cd_offset;

        // End of central directory
        out.extend_from_slice(&0x0605_4b50u32.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out
    }

    #[test]
    fn bogus_declared_size_does_not_abort() {
        let data = zip_with_declared_size(0x7FFF_FFFF_FFFF_0000);
        match PaprikaArchive::from_reader(Cursor::new(data)) {
            Ok(mut archive) => {
                assert_eq!(archive.count(), 1);
                // Either outcome is fine as long as reading returns.
                let entry = archive.entries().next();
                assert!(entry.is_some());
            }
            Err(err) => assert!(matches!(err, ArchiveError::Corrupt(_))),
        }
    }

    #[test]
    fn open_reports_missing_file() {
        let err = PaprikaArchive::open("/nonexistent/export.paprikarecipes")
            .err()
            .unwrap();
        assert!(matches!(err, ArchiveError::Open { .. }));
    }
}
