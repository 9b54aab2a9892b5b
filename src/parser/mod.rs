pub mod explodes;

pub use explodes::{explode, DecodeError};
