pub mod filename;
pub mod note;
