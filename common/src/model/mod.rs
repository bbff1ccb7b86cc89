pub mod csv;
pub mod mapping;
pub mod template;
pub mod upload;
