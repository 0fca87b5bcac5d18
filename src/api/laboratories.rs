use rocket::{http::Status, serde::json::Json, Route};

use crate::{
    error::Result,
    model::{
        api::laboratory::{LaboratoryDescription, LaboratorySpec},
        mongodb::Id,
    },
    service::laboratories,
    store::Storage,
};

pub fn routes() -> Vec<Route> {
    routes![
        create_laboratory,
        list_laboratories,
        get_laboratory,
        update_laboratory,
        delete_laboratory,
    ]
}

#[post("/laboratories", data = "<spec>", format = "json")]
async fn create_laboratory(
    spec: Json<LaboratorySpec>,
    storage: Storage,
) -> Result<Json<LaboratoryDescription>> {
    let laboratory = laboratories::create_laboratory(&*storage, &spec).await?;
    // A new laboratory has no rules yet.
    Ok(Json(LaboratoryDescription::new(laboratory, 0)))
}

#[get("/laboratories")]
async fn list_laboratories(storage: Storage) -> Result<Json<Vec<LaboratoryDescription>>> {
    Ok(Json(laboratories::list_laboratories(&*storage).await?))
}

#[get("/laboratories/<laboratory_id>")]
async fn get_laboratory(
    laboratory_id: Id,
    storage: Storage,
) -> Result<Json<LaboratoryDescription>> {
    Ok(Json(
        laboratories::get_laboratory(&*storage, laboratory_id).await?,
    ))
}

#[put("/laboratories/<laboratory_id>", data = "<spec>", format = "json")]
async fn update_laboratory(
    laboratory_id: Id,
    spec: Json<LaboratorySpec>,
    storage: Storage,
) -> Result<Json<LaboratoryDescription>> {
    Ok(Json(
        laboratories::update_laboratory(&*storage, laboratory_id, &spec).await?,
    ))
}

#[delete("/laboratories/<laboratory_id>")]
async fn delete_laboratory(laboratory_id: Id, storage: Storage) -> Result<Status> {
    laboratories::delete_laboratory(&*storage, laboratory_id).await?;
    Ok(Status::NoContent)
}
