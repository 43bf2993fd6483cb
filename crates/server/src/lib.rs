pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod matchmaking;
pub mod routes;
