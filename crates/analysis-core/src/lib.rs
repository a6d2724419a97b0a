pub mod config;
pub mod dates;
pub mod error;
pub mod format;
pub mod line_items;
pub mod stats;
pub mod traits;
pub mod types;

pub use config::*;
pub use dates::*;
pub use error::*;
pub use traits::*;
pub use types::*;
