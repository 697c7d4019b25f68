mod settings;

pub use settings::{AlertPolicy, Controller, EnvironmentEntry, Logger, Session, Settings};
