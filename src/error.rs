use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder, Request};
use thiserror::Error;

use crate::logging::RequestId;
use crate::model::{
    common::validation::ValidationError,
    mongodb::Id,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Laboratory name already in use: {0}")]
    DuplicateName(String),
    #[error("Laboratory {0} is still assigned to students in a live election")]
    InUse(Id),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: String) -> Self {
        Self::Status(Status::NotFound, format!("{what} not found"))
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::Db(_) => Status::InternalServerError,
            Self::Validation(_) => Status::UnprocessableEntity,
            Self::DuplicateName(_) | Self::InUse(_) => Status::Conflict,
            Self::Status(status, _) => *status,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let id = RequestId::of(req);
        if status.code >= 500 {
            // Server-side detail stays in the log.
            error!("rsp{id}: {self}");
            return Err(status);
        }
        debug!("rsp{id}: {self}");
        (status, self.to_string()).respond_to(req)
    }
}
