use mongodb::{
    bson::doc,
    options::{FindOneAndUpdateOptions, ReturnDocument, UpdateOptions},
};
use rocket::http::Status;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::mongodb::Coll;

/// The counter that orders rules by insertion.
pub const RULE_SEQ_COUNTER_ID: &str = "rule_seq";

/// A counter object used to implement auto-increment fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    #[serde(rename = "_id")]
    pub id: String,
    pub next: u64,
}

impl Counter {
    /// Atomically retrieve the next value of the counter with the given ID.
    pub async fn next(counters: &Coll<Counter>, id: &str) -> Result<u64> {
        let update = doc! {
            "$inc": { "next": 1 }
        };
        let options: FindOneAndUpdateOptions = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::Before)
            .build();
        let counter = counters
            .find_one_and_update(doc! { "_id": id }, update, options)
            .await?
            .ok_or_else(|| {
                Error::Status(
                    Status::InternalServerError,
                    format!("Failed to find counter with ID {id}"),
                )
            })?;
        Ok(counter.next)
    }
}

/// Create the counter with the given ID, starting at 1, unless it already exists.
///
/// This operation is idempotent.
pub async fn ensure_counter_exists(counters: &Coll<Counter>, id: &str) -> Result<()> {
    let update = doc! {
        "$setOnInsert": { "next": 1_i64 }
    };
    let options = UpdateOptions::builder().upsert(true).build();
    counters
        .update_one(doc! { "_id": id }, update, options)
        .await?;
    Ok(())
}
