pub mod collaborators;
pub mod environment;
pub mod request;
pub mod session_store;

pub use collaborators::*;
pub use environment::*;
pub use request::*;
pub use session_store::*;
