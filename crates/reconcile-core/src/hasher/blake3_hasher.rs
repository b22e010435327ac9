use super::{read_chunks, ContentHasher, Fingerprint};
use std::io::{self, Read};

/// 32-byte BLAKE3 digest. The default.
#[derive(Debug, Default, Clone, Copy)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn name(&self) -> &'static str {
        "blake3"
    }

    fn fingerprint_reader(&self, reader: &mut dyn Read) -> io::Result<Fingerprint> {
        let mut hasher = blake3::Hasher::new();
        read_chunks(reader, |chunk| {
            hasher.update(chunk);
        })?;
        Ok(Fingerprint::from_bytes(hasher.finalize().as_bytes()))
    }
}
