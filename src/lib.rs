pub mod aggregate;
pub mod config;
pub mod data;
pub mod fetch;
pub mod geometry;
pub mod matcher;
pub mod normalize;
pub mod pipeline;
pub mod region;
pub mod render;
pub mod tabular;
pub mod types;
