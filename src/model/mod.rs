mod error;
mod record;
mod registry;
mod request;
mod translation;

pub use error::*;
pub use record::*;
pub use registry::*;
pub use request::*;
pub use translation::*;
