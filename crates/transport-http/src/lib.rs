// HTTP transport for playlist and stream fetches

pub mod client;
pub mod connection;

pub use client::{FetchError, HttpClient, HttpResponse, StreamFetcher};
pub use connection::Connection;
