pub mod decision;
pub mod protocol;

pub use decision::{AllowReason, Decision, DecisionEngine};
pub use protocol::{ToolInvocation, allow_envelope};
