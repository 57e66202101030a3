pub mod client;
pub mod errors;
pub mod form;
pub mod models;
pub mod utils;
