pub mod api;
pub mod capture;
pub mod runner;
pub mod sitemap;
pub mod tasks;
pub mod utils;
