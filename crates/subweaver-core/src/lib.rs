// subweaver-core: pure aggregation pipeline between subscription feeds and
// the final sing-box profile. No I/O lives here -- callers hand in the fetched
// template and per-source node lists, and get back a finished document.

pub mod assemble;
pub mod filter;
pub mod model;
pub mod pipeline;
pub mod policy;
pub mod region;
pub mod synth;

// ── Primary re-exports ──────────────────────────────────────────────
pub use filter::FilterConfig;
pub use model::{Node, OutboundEntry, Profile, RegionalGroup, Template, TemplateOutbound};
pub use pipeline::Pipeline;
pub use policy::{PolicyTable, Recipe};
pub use region::RegionTable;
pub use synth::HealthCheck;
