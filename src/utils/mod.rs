pub mod command;
pub mod deadline;

pub use command::{CommandRunner, SystemCommandRunner};
pub use deadline::with_deadline;
