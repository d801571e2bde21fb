pub mod batch;
pub mod definition;
pub mod object;
pub mod tag;

pub use batch::*;
pub use definition::*;
pub use object::*;
pub use tag::*;
