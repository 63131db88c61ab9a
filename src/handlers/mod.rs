pub mod ask;
pub mod schema;
pub mod upload;

pub use ask::*;
pub use schema::*;
pub use upload::*;
