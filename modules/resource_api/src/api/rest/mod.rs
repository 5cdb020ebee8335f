pub mod dto;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
