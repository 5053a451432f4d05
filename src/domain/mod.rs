pub mod value_objects;
pub mod entities;
pub mod repository_set;
pub mod config;
