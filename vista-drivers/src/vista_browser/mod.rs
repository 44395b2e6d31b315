pub mod cookies;
pub mod document;
pub mod driver;
