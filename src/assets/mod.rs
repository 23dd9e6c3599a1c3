pub mod cache;
pub mod codec;
pub mod loader;
pub mod memory;
pub mod source;

pub use cache::AssetCache;
pub use codec::{
    decode_json,
    encode_json_gz,
    is_gzip,
};
pub use loader::AssetLoader;
pub use memory::MemoryAssets;
pub use source::{
    source_for,
    AssetSource,
    DirAssets,
    HttpAssets,
};
