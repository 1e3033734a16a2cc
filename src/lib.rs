pub mod config;
pub mod domain;
pub mod feed;
pub mod kinds;
pub mod serve;
pub mod source;
