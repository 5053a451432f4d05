mod adapter;

pub use adapter::BorgAdapter;
