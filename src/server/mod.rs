pub mod app;
pub mod deserializers;
pub mod error;
pub mod notice;
pub mod routes;
