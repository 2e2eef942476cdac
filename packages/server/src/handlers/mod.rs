pub mod auth;
pub mod blob;
pub mod display;
pub mod image;
pub mod portfolio;
