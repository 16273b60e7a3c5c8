//! Shared fixtures: synthesize RPF2 containers in memory.

// Not every test file uses every helper.
#![allow(dead_code)]

use rpf_archive::RPF2_MAGIC;

const TOC_OFFSET: usize = 2048;
const ENTRY_LEN: usize = 16;

/// One node of a fixture archive, in entry-table order.
pub enum Node {
    /// Directory addressing its children as a range into the entry table.
    Dir {
        name: &'static str,
        first_child: u32,
        count: u32,
    },
    /// File with inline content; its data offset is assigned by the
    /// builder.
    File {
        name: &'static str,
        content: &'static [u8],
    },
}

impl Node {
    fn name(&self) -> &'static str {
        match self {
            Node::Dir { name, .. } | Node::File { name, .. } => name,
        }
    }
}

/// Build a well-formed RPF2 container from the given entry table.
pub fn build_archive(nodes: &[Node]) -> Vec<u8> {
    build_archive_with(RPF2_MAGIC, 0, nodes)
}

/// Build a container with explicit magic and crypto flag, for failure
/// cases.
pub fn build_archive_with(magic: u32, crypto_flag: u32, nodes: &[Node]) -> Vec<u8> {
    let mut name_table = Vec::new();
    let mut name_offsets = Vec::with_capacity(nodes.len());
    for node in nodes {
        name_offsets.push(name_table.len() as u32);
        name_table.extend_from_slice(node.name().as_bytes());
        name_table.push(0);
    }

    let toc_size = nodes.len() * ENTRY_LEN + name_table.len();
    let content_base = TOC_OFFSET + toc_size;

    let mut content = Vec::new();
    let mut records = Vec::with_capacity(nodes.len());
    for (i, node) in nodes.iter().enumerate() {
        match node {
            Node::Dir { first_child, count, .. } => {
                records.push((name_offsets[i], *count, 0x8000_0000 | first_child, 0u32));
            }
            Node::File { content: bytes, .. } => {
                let data_offset = (content_base + content.len()) as u32;
                records.push((name_offsets[i], bytes.len() as u32, data_offset, 0u32));
                content.extend_from_slice(bytes);
            }
        }
    }

    let mut buf = Vec::new();
    buf.extend_from_slice(&magic.to_le_bytes());
    buf.extend_from_slice(&(toc_size as u32).to_le_bytes());
    buf.extend_from_slice(&(nodes.len() as u32).to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());
    buf.extend_from_slice(&crypto_flag.to_le_bytes());
    buf.resize(TOC_OFFSET, 0);

    for (name_offset, length, packed, flags) in records {
        buf.extend_from_slice(&name_offset.to_le_bytes());
        buf.extend_from_slice(&length.to_le_bytes());
        buf.extend_from_slice(&packed.to_le_bytes());
        buf.extend_from_slice(&flags.to_le_bytes());
    }
    buf.extend_from_slice(&name_table);
    buf.extend_from_slice(&content);

    buf
}

/// Standard fixture: a root with a nested directory and two loose files,
/// every child range lexicographically sorted.
///
/// ```text
/// /
/// ├── assets/
/// │   ├── a.dat
/// │   └── b.dat
/// ├── config.json
/// └── readme.txt
/// ```
pub fn standard_archive() -> Vec<u8> {
    build_archive(&[
        Node::Dir { name: "", first_child: 1, count: 3 },
        Node::Dir { name: "assets", first_child: 4, count: 2 },
        Node::File { name: "config.json", content: b"{\"name\":\"demo\"}" },
        Node::File { name: "readme.txt", content: b"hello packfile" },
        Node::File { name: "a.dat", content: &[0xAA; 16] },
        Node::File { name: "b.dat", content: b"bb" },
    ])
}
