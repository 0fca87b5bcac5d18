use mongodb::{Client as MongoClient, Database};
use rocket::{
    fairing::{Fairing, Info, Kind},
    Build, Rocket,
};
use serde::Deserialize;

use crate::error::Result;
use crate::model::mongodb::{ensure_counter_exists, ensure_indexes_exist, Coll, RULE_SEQ_COUNTER_ID};
use crate::store::{MongoStore, Storage};

/// Which store backs the server.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Mongodb,
    /// Everything is lost on restart. For demos and local development.
    Memory,
}

/// Storage configuration, derived from `Rocket.toml` and `ROCKET_*`
/// environment variables.
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    storage: Backend,
    // secrets
    #[serde(default)]
    db_uri: Option<String>,
    #[serde(default = "default_db_name")]
    db_name: String,
}

fn default_db_name() -> String {
    "labvote".to_string()
}

/// A fairing that loads the storage config, connects to the configured
/// store, performs any setup necessary, and places a [`Storage`] into
/// managed state.
pub struct StorageFairing;

#[rocket::async_trait]
impl Fairing for StorageFairing {
    fn info(&self) -> Info {
        Info {
            name: "Storage",
            kind: Kind::Ignite,
        }
    }

    async fn on_ignite(&self, rocket: Rocket<Build>) -> rocket::fairing::Result {
        // Load the config.
        let config = match rocket.figment().extract::<StorageConfig>() {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load storage config");
                rocket::config::pretty_print_error(e);
                return Err(rocket);
            }
        };

        let storage = match config.storage {
            Backend::Memory => {
                warn!("Using in-memory storage, nothing will survive a restart");
                Storage::in_memory()
            }
            Backend::Mongodb => {
                let Some(db_uri) = config.db_uri.as_deref() else {
                    error!("`db_uri` must be set when storage is \"mongodb\"");
                    return Err(rocket);
                };
                info!("Loaded database config, connecting...");
                match connect_mongodb(db_uri, &config.db_name).await {
                    Ok((storage, _)) => storage,
                    Err(e) => {
                        error!("Failed to connect to database: {e}");
                        return Err(rocket);
                    }
                }
            }
        };

        Ok(rocket.manage(storage))
    }
}

/// Connect, then make sure the indexes and the rule sequence counter exist.
pub async fn connect_mongodb(db_uri: &str, db_name: &str) -> Result<(Storage, Database)> {
    let client = MongoClient::with_uri_str(db_uri).await?;
    let db = client.database(db_name);
    ensure_indexes_exist(&db).await?;
    ensure_counter_exists(&Coll::from_db(&db), RULE_SEQ_COUNTER_ID).await?;
    info!("...database {db_name} online!");
    Ok((Storage::new(MongoStore::new(&db)), db))
}
