mod blake3_hasher;
mod xxhash;

pub use blake3_hasher::Blake3Hasher;
pub use xxhash::XxHasher;

use crate::error::Error;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Opaque content digest, only ever compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(Vec<u8>);

impl Fingerprint {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Fingerprint(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Maps byte content to a fixed-length digest.
pub trait ContentHasher: Send + Sync {
    fn name(&self) -> &'static str;

    /// Feeds `reader` to the digest until EOF.
    fn fingerprint_reader(&self, reader: &mut dyn Read) -> io::Result<Fingerprint>;

    /// Reads the whole file. Any open or read failure is reported, never swallowed.
    fn fingerprint_file(&self, path: &Path) -> Result<Fingerprint, Error> {
        let mut file = File::open(path).map_err(|source| Error::Fingerprint {
            path: path.to_path_buf(),
            source,
        })?;
        self.fingerprint_reader(&mut file)
            .map_err(|source| Error::Fingerprint {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Drives `update` over `reader` in fixed-size chunks.
pub(crate) fn read_chunks(
    reader: &mut dyn Read,
    mut update: impl FnMut(&[u8]),
) -> io::Result<()> {
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        update(&buffer[..n]);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    XxHash64,
}

impl HashAlgorithm {
    pub fn hasher(self) -> Box<dyn ContentHasher> {
        match self {
            HashAlgorithm::Blake3 => Box::new(Blake3Hasher),
            HashAlgorithm::XxHash64 => Box::new(XxHasher::default()),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blake3" => Ok(HashAlgorithm::Blake3),
            "xxhash64" | "xxhash" | "xxh64" => Ok(HashAlgorithm::XxHash64),
            other => Err(format!(
                "unknown hash algorithm '{}' (expected blake3 or xxhash64)",
                other
            )),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Blake3 => f.write_str("blake3"),
            HashAlgorithm::XxHash64 => f.write_str("xxhash64"),
        }
    }
}
