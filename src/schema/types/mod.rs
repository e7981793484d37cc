pub mod attribute;
pub mod path;
pub mod schema;

pub use attribute::{Attribute, AttributeType, Mutability};
pub use path::{qualify, split_path, AttrPath};
pub use schema::Schema;
