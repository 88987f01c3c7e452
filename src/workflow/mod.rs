pub mod group_ctx;
pub mod group_flow;

pub use group_ctx::GroupCtx;
pub use group_flow::GroupFlow;
