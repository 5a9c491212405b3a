//! Core types - pure abstractions shared across the codebase.

mod category;
mod mode;
mod state;

pub use category::AssetCategory;
pub use mode::BuildMode;
pub use state::{
    is_serving, is_shutdown, register_server, request_shutdown, set_serving,
    setup_shutdown_handler,
};
