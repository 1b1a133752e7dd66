//! Hashing utilities for archive checksums.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use md5::Md5;
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// Digest algorithms used by upstream release checksums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An expected digest for a downloaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Checksum {
    pub algorithm: HashAlgorithm,
    pub digest: &'static str,
}

impl Checksum {
    pub const fn md5(digest: &'static str) -> Self {
        Checksum {
            algorithm: HashAlgorithm::Md5,
            digest,
        }
    }

    pub const fn sha1(digest: &'static str) -> Self {
        Checksum {
            algorithm: HashAlgorithm::Sha1,
            digest,
        }
    }

    /// Compare against a computed hex digest, ignoring case.
    pub fn matches(&self, actual: &str) -> bool {
        self.digest.eq_ignore_ascii_case(actual)
    }
}

fn digest_reader<D: Digest>(mut reader: impl Read) -> Result<String> {
    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compute the hex digest of a byte slice.
pub fn digest_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    match algorithm {
        HashAlgorithm::Md5 => hex::encode(Md5::digest(data)),
        HashAlgorithm::Sha1 => hex::encode(Sha1::digest(data)),
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
    }
}

/// Compute the hex digest of a file.
pub fn digest_file(algorithm: HashAlgorithm, path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;
    let reader = BufReader::new(file);

    match algorithm {
        HashAlgorithm::Md5 => digest_reader::<Md5>(reader),
        HashAlgorithm::Sha1 => digest_reader::<Sha1>(reader),
        HashAlgorithm::Sha256 => digest_reader::<Sha256>(reader),
    }
}
