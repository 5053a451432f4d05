mod local;

pub use local::{LocalBackingStore, StaticBackingStores};
