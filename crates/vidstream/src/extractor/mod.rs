pub mod embed;
pub mod error;
pub mod registry;
pub mod servers;
pub mod sink;
pub mod utils;
pub mod vidstream;
mod default;

pub use default::{default_client, default_registry};
