mod command;

pub use command::CommandProcess;
