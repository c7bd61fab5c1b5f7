//! Client of the SMS status API

mod client;


pub use client::HttpSmsStatusClient;
