pub mod candidate;
pub mod filter;
pub mod walk;

pub use candidate::{Candidate, RootRole, SourceRoot};
pub use filter::{ExtensionFilter, IgnoreFilter};
pub use walk::{CandidateSource, FixedOrderSource, ScanItem, WalkSource};
