pub mod identifier;
pub mod list;
pub mod mainline;
pub mod summary;
pub mod walk;
