//! Utils Module
pub mod text;

pub use text::{preview, strip_code_fences};
