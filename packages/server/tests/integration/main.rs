mod auth;
mod display;
mod portfolio;
