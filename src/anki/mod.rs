pub mod api;
pub mod search;

pub use api::{
    AnkiConnect,
    ApiResponse,
};
pub use search::AnkiConnectSearch;
