#[macro_use]
extern crate rocket;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate backend_test;

use rocket::{Build, Rocket};

use crate::config::StorageFairing;
use crate::logging::LoggerFairing;

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;

pub use store::Storage;

/// The server, with its store chosen by configuration.
pub fn build() -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .attach(StorageFairing)
}

/// The server over an already constructed store.
pub fn rocket_for_storage(storage: Storage) -> Rocket<Build> {
    rocket::build()
        .mount("/", api::routes())
        .attach(LoggerFairing)
        .manage(storage)
}
