pub mod classifier;
pub mod peeler;
pub mod tables;

pub use classifier::{ClassificationResult, Rule, classify};
pub use peeler::{PeeledCommand, peel};
pub use tables::{IndirectionKind, is_tracked_binary, safe_subcommands};
