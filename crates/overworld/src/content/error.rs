use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Tileset,
    Blockset,
    Layout,
    Map,
}

impl ResourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Tileset => "tileset",
            ResourceKind::Blockset => "blockset",
            ResourceKind::Layout => "layout",
            ResourceKind::Map => "map",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load-time failures. Every variant points at broken asset data and is fatal
/// for the caller; nothing here is meant to be retried.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("resource at {path} has invalid format: {message}")]
    InvalidFormat { path: PathBuf, message: String },
    #[error("unknown {kind} id {id} (id list has {count} entries)")]
    UnknownId {
        kind: ResourceKind,
        id: i64,
        count: usize,
    },
    #[error("id list {path} names \"{name}\" twice (lines {first_line} and {line})")]
    DuplicateId {
        path: PathBuf,
        name: String,
        first_line: usize,
        line: usize,
    },
    #[error("layout at {path} has non-positive dimensions {width}x{height}")]
    InvalidDimensions {
        path: PathBuf,
        width: i32,
        height: i32,
    },
    #[error("failed to decode tileset image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{path} references tile {index} of tileset {tileset_id}, which has {count} tiles")]
    InvalidTileIndex {
        path: PathBuf,
        tileset_id: u32,
        index: i32,
        count: usize,
    },
    #[error("{path} references block {index} of blockset {blockset_id}, which has {count} blocks")]
    InvalidBlockIndex {
        path: PathBuf,
        blockset_id: u32,
        index: i32,
        count: usize,
    },
}

pub(crate) fn invalid_format(path: &std::path::Path, message: impl Into<String>) -> LoadError {
    LoadError::InvalidFormat {
        path: path.to_path_buf(),
        message: message.into(),
    }
}
