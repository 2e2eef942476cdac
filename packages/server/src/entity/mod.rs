pub mod portfolio;
pub mod portfolio_image;
pub mod user;
