// Domain models and helpers shared by the engine and any rendering front end.
pub mod models;
pub mod utils;
