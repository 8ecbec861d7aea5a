// Path Planning algorithms module

pub mod motion;
pub mod gnat;

pub use motion::*;
pub use gnat::*;
