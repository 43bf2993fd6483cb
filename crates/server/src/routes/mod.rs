pub mod auth;
pub mod games;
pub mod health;
pub mod history;
pub mod matchmaking;
pub mod rating;
