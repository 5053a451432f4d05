pub mod process;
pub mod delegate;
pub mod adapter;
pub mod passphrase;
pub mod config_store;
pub mod backing_store;
