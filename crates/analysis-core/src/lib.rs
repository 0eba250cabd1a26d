pub mod error;
pub mod schema;
pub mod stats;
pub mod traits;
pub mod ttm;
pub mod types;

pub use error::*;
pub use traits::*;
pub use types::*;
