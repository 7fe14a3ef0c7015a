pub mod compression;
pub mod file;
pub mod fixed;
pub mod name;
