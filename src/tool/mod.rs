// ABOUTME: Tool module - the callable capability interface shared by host and sub-agents.
// ABOUTME: Defines the Tool trait, ToolResult, and the ordered ToolSet container.

mod result;
mod toolset;
mod traits;

pub use result::*;
pub use toolset::*;
pub use traits::*;
