pub mod archive;
pub mod assistant;
pub mod engine;
pub mod extract;
pub mod fields;
pub mod handlers;
pub mod profile;
pub mod prompts;
pub mod rules;
pub mod store;
