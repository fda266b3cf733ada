pub mod host;
pub mod machine;
pub mod model;
pub mod resolver;

pub use host::{DocumentProbe, Notice, PageHost, PageLocation};
pub use machine::{AgentOptions, PageAgent};
pub use model::PageAgentState;
pub use resolver::{EffectiveDecision, INVERT_FILTER, NO_FILTER};
