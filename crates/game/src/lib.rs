pub mod app;
pub mod sim;
