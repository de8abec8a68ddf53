//! Single-file packing of a pyramid directory tree.
//!
//! Layout: an 8-byte `"BIGSHOT "` tag, the index length as 16 hex digits,
//! the index as repeated `path:offset:length:` records, then every file's
//! bytes concatenated in index order. Offsets are relative to the first
//! content byte.

use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

/// Archive magic tag.
pub const MAGIC: &[u8; 8] = b"BIGSHOT ";

/// Bytes in the fixed-width header: tag plus 16 hex digits.
pub const HEADER_LEN: usize = 24;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("not a packed archive: bad magic tag")]
    BadMagic,
    #[error("invalid index length field: {0:?}")]
    BadIndexLength(String),
    #[error("malformed archive index: {0}")]
    BadIndex(String),
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),
    #[error("path contains the index separator ':': {0}")]
    SeparatorInPath(String),
    #[error("no entry named {0}")]
    NotFound(String),
}

/// One file in an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path relative to the packed directory, `/`-separated.
    pub path: String,
    /// File the content is read from when packing; empty when read back.
    pub source: PathBuf,
    /// Byte offset from the start of the content section.
    pub offset: u64,
    pub length: u64,
}

/// Lists every file under `dir` depth-first with cumulative offsets.
///
/// Directory entries are visited in name order and a subdirectory's files
/// come before its later siblings, so the result is the same on every run.
pub fn scan(dir: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut entries = Vec::new();
    scan_into(dir, "", &mut entries, 0)?;
    Ok(entries)
}

fn scan_into(
    dir: &Path,
    prefix: &str,
    entries: &mut Vec<ArchiveEntry>,
    mut offset: u64,
) -> Result<u64, ArchiveError> {
    let mut children = std::fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    children.sort();

    for child in children {
        let name = child
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ArchiveError::NonUtf8Path(child.clone()))?;
        let path = format!("{}{}", prefix, name);
        if path.contains(':') {
            return Err(ArchiveError::SeparatorInPath(path));
        }
        if child.is_dir() {
            offset = scan_into(&child, &format!("{}/", path), entries, offset)?;
        } else {
            let length = child.metadata()?.len();
            entries.push(ArchiveEntry {
                path,
                source: child,
                offset,
                length,
            });
            offset += length;
        }
    }
    Ok(offset)
}

fn build_index(entries: &[ArchiveEntry]) -> String {
    let mut index = String::new();
    for e in entries {
        index.push_str(&format!("{}:{}:{}:", e.path, e.offset, e.length));
    }
    index
}

/// Packs every file under `source` into the single file `output`.
///
/// Returns the packed entries in index order.
pub fn pack(source: &Path, output: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let entries = scan(source)?;
    info!(files = entries.len(), output = %output.display(), "packing archive");

    let index = build_index(&entries);
    let mut out = BufWriter::new(File::create(output)?);
    out.write_all(MAGIC)?;
    write!(out, "{:016x}", index.len())?;
    out.write_all(index.as_bytes())?;

    for e in &entries {
        let mut file = File::open(&e.source)?;
        let copied = io::copy(&mut file, &mut out)?;
        if copied != e.length {
            return Err(ArchiveError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("{} changed size while packing", e.path),
            )));
        }
    }
    out.flush()?;
    Ok(entries)
}

/// Random access to the entries of a packed archive.
#[derive(Debug)]
pub struct ArchiveReader {
    file: File,
    entries: Vec<ArchiveEntry>,
    content_start: u64,
}

impl ArchiveReader {
    pub fn open(path: &Path) -> Result<Self, ArchiveError> {
        let mut file = File::open(path)?;

        let mut header = [0u8; HEADER_LEN];
        file.read_exact(&mut header)?;
        if &header[..MAGIC.len()] != MAGIC {
            return Err(ArchiveError::BadMagic);
        }
        let len_field = String::from_utf8_lossy(&header[MAGIC.len()..]).into_owned();
        let index_len = u64::from_str_radix(len_field.trim(), 16)
            .map_err(|_| ArchiveError::BadIndexLength(len_field.clone()))?;

        let mut index = Vec::new();
        (&mut file).take(index_len).read_to_end(&mut index)?;
        if index.len() as u64 != index_len {
            return Err(ArchiveError::BadIndex("index truncated".into()));
        }
        let index = String::from_utf8(index)
            .map_err(|_| ArchiveError::BadIndex("index is not UTF-8".into()))?;

        Ok(Self {
            file,
            entries: parse_index(&index)?,
            content_start: HEADER_LEN as u64 + index_len,
        })
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&ArchiveEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    /// Reads the content of entry `path`.
    pub fn read(&mut self, path: &str) -> Result<Vec<u8>, ArchiveError> {
        let (offset, length) = self
            .get(path)
            .map(|e| (e.offset, e.length))
            .ok_or_else(|| ArchiveError::NotFound(path.to_string()))?;
        self.file.seek(SeekFrom::Start(self.content_start + offset))?;
        let mut buf = vec![0u8; length as usize];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }
}

fn parse_index(index: &str) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let fields: Vec<&str> = index.split(':').collect();
    // A well-formed index ends with ':' and so leaves one empty trailing field.
    if fields.len() % 3 != 1 || fields.last().is_some_and(|f| !f.is_empty()) {
        return Err(ArchiveError::BadIndex("unterminated record".into()));
    }

    let number = |s: &str| {
        s.parse::<u64>()
            .map_err(|_| ArchiveError::BadIndex(format!("bad number {:?}", s)))
    };
    fields[..fields.len() - 1]
        .chunks_exact(3)
        .map(|rec| {
            Ok(ArchiveEntry {
                path: rec[0].to_string(),
                source: PathBuf::new(),
                offset: number(rec[1])?,
                length: number(rec[2])?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample_tree(root: &Path) {
        fs::create_dir_all(root.join("0")).unwrap();
        fs::create_dir_all(root.join("1/deep")).unwrap();
        fs::write(root.join("descriptor"), b"suffix:.jpg:width:10").unwrap();
        fs::write(root.join("0/0_0.jpg"), vec![7u8; 300]).unwrap();
        fs::write(root.join("0/1_0.jpg"), b"second tile").unwrap();
        fs::write(root.join("1/deep/x.png"), b"").unwrap();
        fs::write(root.join("1/0_0.jpg"), b"level one").unwrap();
        fs::write(root.join("poster.jpg"), b"poster bytes").unwrap();
    }

    #[test]
    fn test_scan_is_depth_first_and_sorted() {
        let dir = tempdir().unwrap();
        sample_tree(dir.path());
        let entries = scan(dir.path()).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            ["0/0_0.jpg", "0/1_0.jpg", "1/0_0.jpg", "1/deep/x.png", "descriptor", "poster.jpg"]
        );

        let mut expected = 0;
        for e in &entries {
            assert_eq!(e.offset, expected, "{}", e.path);
            expected += e.length;
        }
    }

    #[test]
    fn test_pack_roundtrip() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("tree");
        sample_tree(&src);
        let out = dir.path().join("tree.bigshot");
        let packed = pack(&src, &out).unwrap();

        let mut reader = ArchiveReader::open(&out).unwrap();
        assert_eq!(reader.entries().len(), packed.len());
        for e in &packed {
            let original = fs::read(&e.source).unwrap();
            assert_eq!(reader.read(&e.path).unwrap(), original, "{}", e.path);
        }
    }

    #[test]
    fn test_header_and_offsets_in_raw_bytes() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("tree");
        sample_tree(&src);
        let out = dir.path().join("tree.bigshot");
        let packed = pack(&src, &out).unwrap();

        let bytes = fs::read(&out).unwrap();
        assert_eq!(&bytes[..8], b"BIGSHOT ");
        let index_len = usize::from_str_radix(std::str::from_utf8(&bytes[8..24]).unwrap(), 16).unwrap();
        let index = std::str::from_utf8(&bytes[24..24 + index_len]).unwrap();
        assert!(index.starts_with("0/0_0.jpg:0:300:0/1_0.jpg:300:11:"));

        for e in &packed {
            let start = HEADER_LEN + index_len + e.offset as usize;
            let content = &bytes[start..start + e.length as usize];
            assert_eq!(content, fs::read(&e.source).unwrap().as_slice());
        }
        let total: u64 = packed.iter().map(|e| e.length).sum();
        assert_eq!(bytes.len(), HEADER_LEN + index_len + total as usize);
    }

    #[test]
    fn test_reader_accepts_space_padded_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.bigshot");
        let index = "a.txt:0:3:";
        let mut bytes = format!("BIGSHOT {:>16x}{}", index.len(), index).into_bytes();
        bytes.extend_from_slice(b"abc");
        fs::write(&path, bytes).unwrap();

        let mut reader = ArchiveReader::open(&path).unwrap();
        assert_eq!(reader.read("a.txt").unwrap(), b"abc");
        assert!(matches!(reader.read("missing"), Err(ArchiveError::NotFound(_))));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad");
        fs::write(&path, b"NOTSHOT 0000000000000000").unwrap();
        assert!(matches!(ArchiveReader::open(&path), Err(ArchiveError::BadMagic)));
    }

    #[test]
    fn test_empty_directory_packs_to_header() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("empty");
        fs::create_dir(&src).unwrap();
        let out = dir.path().join("empty.bigshot");
        assert!(pack(&src, &out).unwrap().is_empty());
        assert_eq!(fs::read(&out).unwrap(), b"BIGSHOT 0000000000000000");
        assert!(ArchiveReader::open(&out).unwrap().entries().is_empty());
    }
}
