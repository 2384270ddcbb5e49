pub mod pipelines;
pub mod server;
pub mod state;
pub mod types;

pub use server::{create_router, serve};
pub use state::AppState;
