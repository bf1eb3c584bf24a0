pub mod crud;
pub mod seed;
pub mod server;
