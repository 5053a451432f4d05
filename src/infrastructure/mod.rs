pub mod backing_store;
pub mod borg;
pub mod cache;
pub mod process;
pub mod store;
