pub mod auth;
pub mod display;
pub mod image;
pub mod portfolio;
pub mod shared;
