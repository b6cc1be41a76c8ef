pub mod address;
pub mod date;
pub mod error;
pub mod reference;
pub mod value;

pub use address::*;
pub use error::*;
pub use reference::{A1, ReferenceError};
pub use value::*;
