pub mod context;
pub mod wrapper;
pub mod log_delegate;
pub mod init_repository;
pub mod remove_repository;
