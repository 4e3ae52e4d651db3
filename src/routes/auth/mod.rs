mod handler;
mod model;

pub use handler::{login, logout, register};
