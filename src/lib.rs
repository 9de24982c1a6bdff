pub mod checker;
pub mod commands;
pub mod error;
pub mod http;
pub mod provider;
pub mod resolver;
pub mod runtime;
pub mod token;
