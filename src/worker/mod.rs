pub mod client;
pub mod protocol;
pub mod server;

pub use client::WorkerClient;
pub use protocol::{
    InitPayload,
    WorkerCall,
    WorkerFn,
    WorkerRequest,
    WorkerResponse,
};
pub use server::Worker;
