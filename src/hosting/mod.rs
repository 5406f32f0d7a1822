#![cfg(feature = "server")]

mod flash;
mod forms;
mod handlers;
mod hub;
mod pages;
mod server;
mod settings;
mod training;

pub use flash::*;
pub use forms::*;
pub use handlers::*;
pub use hub::*;
pub use pages::*;
pub use server::*;
pub use settings::*;
pub use training::*;
