mod datapoint;
mod session;

pub use datapoint::*;
pub use session::*;
