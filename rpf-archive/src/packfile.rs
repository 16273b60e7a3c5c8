//! RPF2 ("Packfile v2") container reader.
//!
//! An RPF2 container is a 20-byte header, a TOC at fixed offset 2048
//! holding a flat entry table plus a name table, and raw file content
//! addressed by byte offset. Directory entries address their children as a
//! `(first_child, count)` range into the same flat table, so the whole
//! tree is an index-addressed arena with entry 0 as the root.

use std::borrow::Cow;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::ops::Range;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, trace, warn};

use crate::{Error, Result};

/// RPF2 magic: the ASCII bytes `RPF2` read as a little-endian u32.
pub const RPF2_MAGIC: u32 = 0x3246_5052;

/// Fixed file offset of the TOC region.
pub const TOC_OFFSET: u64 = 2048;

/// Size of the fixed header in bytes.
const HEADER_LEN: usize = 20;

/// Size of one entry record in bytes.
const ENTRY_LEN: usize = 16;

/// Index of the root directory in the entry table.
const ROOT_ENTRY: EntryId = 0;

/// Index of an entry in the flat entry table.
pub type EntryId = usize;

/// RPF2 header structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackfileHeader {
    /// Magic bytes `RPF2` as a little-endian u32.
    pub magic: u32,
    /// Size of the TOC region in bytes.
    pub toc_size: u32,
    /// Number of entries in the entry table.
    pub num_entries: u32,
    /// Unknown flag, carried but unused.
    pub unk_flag: u32,
    /// Container-level encryption flag; must be 0 for this reader.
    pub crypto_flag: u32,
}

impl PackfileHeader {
    /// Parse the fixed 20-byte header.
    ///
    /// Fails with [`Error::BadMagic`] when the magic does not match; the
    /// remaining fields are not validated here.
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_LEN];
        let mut read = 0;
        while read < HEADER_LEN {
            match reader.read(&mut buf[read..])? {
                0 => return Err(Error::TruncatedHeader(read)),
                n => read += n,
            }
        }

        let mut cursor = Cursor::new(&buf[..]);
        let header = Self {
            magic: cursor.read_u32::<LittleEndian>()?,
            toc_size: cursor.read_u32::<LittleEndian>()?,
            num_entries: cursor.read_u32::<LittleEndian>()?,
            unk_flag: cursor.read_u32::<LittleEndian>()?,
            crypto_flag: cursor.read_u32::<LittleEndian>()?,
        };

        if header.magic != RPF2_MAGIC {
            return Err(Error::BadMagic(header.magic));
        }

        Ok(header)
    }
}

/// One record of the flat entry table.
///
/// For directories, `length` is the child count and `data_offset` the index
/// of the first child in the entry table. For files, `length` is the byte
/// length and `data_offset` the byte offset of the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Offset of the NUL-terminated name in the name table.
    pub name_offset: u32,
    /// Byte length (file) or child count (directory).
    pub length: u32,
    /// Content byte offset (file) or first-child index (directory);
    /// 31 bits on the wire.
    pub data_offset: u32,
    /// High bit of the packed word.
    pub is_directory: bool,
    /// Trailing flag word, carried but unused.
    pub flags: u32,
}

impl Entry {
    fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let name_offset = reader.read_u32::<LittleEndian>()?;
        let length = reader.read_u32::<LittleEndian>()?;
        let packed = reader.read_u32::<LittleEndian>()?;
        let flags = reader.read_u32::<LittleEndian>()?;

        Ok(Self {
            name_offset,
            length,
            data_offset: packed & 0x7FFF_FFFF,
            is_directory: packed >> 31 == 1,
            flags,
        })
    }
}

/// A directory listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_directory: bool,
    pub length: u32,
    pub data_offset: u32,
}

/// An open RPF2 container.
///
/// Constructed by [`Packfile::open`]; a value of this type is always in the
/// open state, so operating on a closed reader is a compile-time
/// impossibility. [`Packfile::close`] consumes the reader and releases the
/// underlying source.
///
/// Reads take `&mut self`; one instance serves one sequential consumer.
#[derive(Debug)]
pub struct Packfile<R> {
    source: R,
    header: PackfileHeader,
    entries: Vec<Entry>,
    name_table: Vec<u8>,
    path_prefix: String,
    base_pointer: u64,
}

impl<R: Read + Seek> Packfile<R> {
    /// Open and parse an RPF2 container from a byte source.
    ///
    /// On any failure the source is dropped and no reader is produced.
    pub fn open(mut source: R) -> Result<Self> {
        source.seek(SeekFrom::Start(0))?;
        let header = PackfileHeader::parse(&mut source)?;

        if header.crypto_flag != 0 {
            return Err(Error::EncryptedArchive(header.crypto_flag));
        }

        let toc_size = header.toc_size as usize;
        source.seek(SeekFrom::Start(TOC_OFFSET))?;
        let mut toc = Vec::with_capacity(toc_size);
        source.by_ref().take(header.toc_size.into()).read_to_end(&mut toc)?;
        if toc.len() < toc_size {
            return Err(Error::TruncatedToc {
                expected: toc_size,
                actual: toc.len(),
            });
        }

        let num_entries = header.num_entries as usize;
        if num_entries == 0 {
            return Err(Error::EmptyEntryTable);
        }

        let entry_table_len = num_entries * ENTRY_LEN;
        if toc.len() < entry_table_len {
            return Err(Error::TruncatedToc {
                expected: entry_table_len,
                actual: toc.len(),
            });
        }

        let mut cursor = Cursor::new(&toc[..entry_table_len]);
        let mut entries = Vec::with_capacity(num_entries);
        for _ in 0..num_entries {
            entries.push(Entry::parse(&mut cursor)?);
        }

        let name_table = toc[entry_table_len..].to_vec();

        debug!(
            num_entries,
            name_table_len = name_table.len(),
            "opened RPF2 archive"
        );

        Ok(Self {
            source,
            header,
            entries,
            name_table,
            path_prefix: String::new(),
            base_pointer: 0,
        })
    }

    /// The parsed header.
    pub fn header(&self) -> &PackfileHeader {
        &self.header
    }

    /// Number of entries in the flat entry table.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Entry record by index.
    pub fn entry(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(id)
    }

    /// Set a prefix that is stripped from lookup paths. Trailing slashes
    /// are trimmed.
    pub fn set_path_prefix(&mut self, prefix: &str) {
        self.path_prefix = prefix.trim_end_matches('/').to_string();
    }

    /// Set the byte offset added to every file read, for containers nested
    /// inside a parent byte source. Defaults to 0.
    pub fn set_base_pointer(&mut self, base_pointer: u64) {
        self.base_pointer = base_pointer;
    }

    /// Display name of an entry: the NUL-terminated UTF-8 run at its name
    /// table offset.
    pub fn entry_name(&self, entry: &Entry) -> Cow<'_, str> {
        let start = entry.name_offset as usize;
        if start >= self.name_table.len() {
            return Cow::Borrowed("");
        }
        let end = self.name_table[start..]
            .iter()
            .position(|b| *b == 0)
            .map_or(self.name_table.len(), |p| start + p);
        String::from_utf8_lossy(&self.name_table[start..end])
    }

    /// Resolve a path to an entry index.
    ///
    /// The configured prefix is stripped first. An empty path, or one made
    /// only of separators, resolves to the root. Each segment is looked up
    /// in the current directory's child range by binary search (children
    /// are assumed lexicographically sorted); on a miss, a case-insensitive
    /// linear scan of the root's children absorbs archives that violate the
    /// sort assumption. Reaching a file before the path is exhausted
    /// returns that file (trailing segments are ignored). Misses return
    /// `None`, never an error.
    pub fn find_entry(&self, path: &str) -> Option<EntryId> {
        let relative = if self.path_prefix.is_empty() {
            path
        } else {
            path.strip_prefix(self.path_prefix.as_str()).unwrap_or(path)
        };

        let mut current = ROOT_ENTRY;

        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            let entry = self.entries.get(current)?;
            if !entry.is_directory {
                // Lenient resolution: a file ends the walk even with
                // segments left over.
                return Some(current);
            }

            current = self
                .binary_search_child(current, segment)
                .or_else(|| self.linear_search_child(ROOT_ENTRY, segment))?;
        }

        Some(current)
    }

    /// Whether a path resolves to any entry.
    pub fn exists(&self, path: &str) -> bool {
        self.find_entry(path).is_some()
    }

    /// Length field of the entry at `path`: byte length for files, child
    /// count for directories. `None` on a miss.
    pub fn length_of(&self, path: &str) -> Option<u32> {
        self.find_entry(path).map(|id| self.entries[id].length)
    }

    /// Read the content of the file at `path`.
    ///
    /// Returns `Ok(None)` when the path is missing or names a directory;
    /// only the positioned read itself can fail.
    pub fn read_file(&mut self, path: &str) -> Result<Option<Vec<u8>>> {
        let Some(id) = self.find_entry(path) else {
            return Ok(None);
        };
        let entry = self.entries[id];
        if entry.is_directory {
            return Ok(None);
        }

        self.source
            .seek(SeekFrom::Start(self.base_pointer + u64::from(entry.data_offset)))?;
        let mut buf = vec![0u8; entry.length as usize];
        self.source.read_exact(&mut buf)?;

        trace!(path, len = entry.length, "read file");
        Ok(Some(buf))
    }

    /// List the immediate children of the directory at `path`.
    ///
    /// Returns an empty listing when the path is missing, names a file, or
    /// the directory's child range falls outside the entry table (the
    /// anomaly is logged, never fatal).
    pub fn list_directory(&self, path: &str) -> Vec<DirEntry> {
        let Some(id) = self.find_entry(path) else {
            return Vec::new();
        };
        let entry = &self.entries[id];
        if !entry.is_directory {
            return Vec::new();
        }

        let start = entry.data_offset as usize;
        let end = start + entry.length as usize;
        if start >= self.entries.len() || end > self.entries.len() {
            warn!(
                start,
                end,
                total = self.entries.len(),
                "directory child range out of bounds"
            );
            return Vec::new();
        }

        self.entries[start..end]
            .iter()
            .map(|child| DirEntry {
                name: self.entry_name(child).into_owned(),
                is_directory: child.is_directory,
                length: child.length,
                data_offset: child.data_offset,
            })
            .collect()
    }

    /// Collect the absolute paths of all files under `path`, depth-first.
    ///
    /// Recomputed on every call; two consecutive calls on an unmodified
    /// archive return identical sequences. Finite by construction: children
    /// are index-addressed into the flat immutable entry table.
    pub fn get_all_files(&self, path: &str) -> Vec<String> {
        let mut files = Vec::new();
        let Some(id) = self.find_entry(path) else {
            return files;
        };

        if self.entries[id].is_directory {
            for child in self.list_directory(path) {
                let child_path = if path == "/" || path.is_empty() {
                    format!("/{}", child.name)
                } else {
                    format!("{}/{}", path.trim_end_matches('/'), child.name)
                };

                if child.is_directory {
                    files.extend(self.get_all_files(&child_path));
                } else {
                    files.push(child_path);
                }
            }
        } else {
            files.push(path.to_string());
        }

        files
    }

    /// Release the underlying byte source.
    ///
    /// Consumes the reader, so no operation can observe a closed state.
    pub fn close(self) -> R {
        self.source
    }

    /// The validated child range of a directory entry, or `None` when the
    /// entry is not a directory or its range exceeds the entry table.
    fn child_range(&self, dir: EntryId) -> Option<Range<usize>> {
        let entry = self.entries.get(dir)?;
        if !entry.is_directory {
            return None;
        }
        let start = entry.data_offset as usize;
        let end = start.checked_add(entry.length as usize)?;
        if start >= self.entries.len() || end > self.entries.len() {
            return None;
        }
        Some(start..end)
    }

    /// Exact-match binary search over a directory's (assumed sorted)
    /// children.
    fn binary_search_child(&self, dir: EntryId, key: &str) -> Option<EntryId> {
        let range = self.child_range(dir)?;
        let children = &self.entries[range.clone()];
        children
            .binary_search_by(|child| self.entry_name(child).as_ref().cmp(key))
            .ok()
            .map(|i| range.start + i)
    }

    /// Case-insensitive linear scan of a directory's children. Fallback for
    /// archives whose child ranges are not actually sorted.
    fn linear_search_child(&self, dir: EntryId, key: &str) -> Option<EntryId> {
        let range = self.child_range(dir)?;
        let key = key.to_lowercase();
        range.into_iter().find(|&i| {
            self.entry_name(&self.entries[i]).to_lowercase() == key
        })
    }
}
