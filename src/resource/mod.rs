pub mod validator;

pub use validator::{ResourceValidator, ValidationMode};
