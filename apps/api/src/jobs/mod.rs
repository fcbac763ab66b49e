pub mod builder;
pub mod handlers;
pub mod models;
pub mod pipeline;
