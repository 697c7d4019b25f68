pub mod chart;
pub mod endpoint;
pub mod models;
pub mod poll;
pub mod reader;
pub mod recipe;

pub use chart::ChartBuffer;
pub use endpoint::{Endpoints, TemplateError};
pub use poll::{Ping, PollConfig, PollHealth, PollState, PollTimer};
pub use reader::{ReadError, read_datapoints};
pub use recipe::find_recipe_start;

/// Capacity of a chart buffer and default row limit of the range query.
pub const MAX_DATAPOINTS: usize = 5000;

/// Delay before a failed backlog fetch is retried (milliseconds).
pub const RETRY_TIMEOUT_MS: u64 = 4000;
