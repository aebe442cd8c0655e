mod error;
pub mod headers;
pub mod models;
pub mod routes;
mod server;
pub mod services;
pub mod state;
pub(crate) mod utils;

pub use error::ApiError;
pub use server::{router, run};
pub use state::{AppState, StateError};
