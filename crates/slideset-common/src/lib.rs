pub mod element;
pub mod error;
pub mod kind;
pub mod path;
pub mod subtype;

pub use element::*;
pub use error::*;
pub use kind::*;
pub use path::*;
pub use subtype::*;
