use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// 256-bit digest of a file's full contents. The only identity key used for
/// deduplication.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> String {
        self.to_string()[..12].to_string()
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self.short())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Blake3,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Blake3 => "BLAKE3",
        }
    }

    /// Stream `reader` to exhaustion through the selected hash.
    pub fn digest_reader<R: Read>(&self, reader: &mut R) -> io::Result<ContentDigest> {
        match self {
            DigestAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                io::copy(reader, &mut hasher)?;
                Ok(ContentDigest(hasher.finalize().into()))
            }
            DigestAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                io::copy(reader, &mut hasher)?;
                Ok(ContentDigest(*hasher.finalize().as_bytes()))
            }
        }
    }

    pub fn digest_file(&self, path: &Path) -> io::Result<ContentDigest> {
        let file = File::open(path)?;
        let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
        self.digest_reader(&mut reader)
    }

    pub fn digest_bytes(&self, data: &[u8]) -> ContentDigest {
        match self {
            DigestAlgorithm::Sha256 => ContentDigest(Sha256::digest(data).into()),
            DigestAlgorithm::Blake3 => ContentDigest(*blake3::hash(data).as_bytes()),
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(DigestAlgorithm::Sha256),
            "blake3" => Ok(DigestAlgorithm::Blake3),
            other => Err(format!("unknown digest algorithm '{}'", other)),
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
