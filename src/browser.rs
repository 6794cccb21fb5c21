//! The interactive resource browser.
//!
//! State lives in a single [`Model`]. [`update`] is the only function that
//! mutates it: it consumes one [`Msg`] at a time and answers with a
//! [`Command`] value describing the side effects to run next. The
//! [`runtime`] turns those values into HTTP calls, timers and subprocesses,
//! each of which reports back with at most one message.

pub mod command;
pub mod message;
pub mod model;
pub mod resource;
pub mod runtime;
pub mod saga;
pub mod update;
pub mod wizard;

pub use command::{Command, ExitAction, SshTarget};
pub use message::Msg;
pub use model::{Mode, Model, Settings, Stamp};
pub use resource::Product;
pub use update::update;
