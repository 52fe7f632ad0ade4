pub mod agent;
pub mod context;
pub mod errors;
pub mod models;
pub mod notifier;
pub mod prompt_template;
pub mod providers;
pub mod tools;
