pub mod content;

pub use content::{ContentDigest, DigestAlgorithm};
