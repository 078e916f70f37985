pub mod config;
pub mod error;
pub mod server;
pub mod worker;

pub use config::{ServerConfig, WorkerConfig};
pub use error::PipelineError;
pub use server::{router, run_read_server, ServerState};
pub use worker::{run_harvest_loop, run_harvest_worker, run_once};
