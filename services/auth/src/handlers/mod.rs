pub mod auth;
pub mod health;
pub mod login;
pub mod user;

use serde::Serialize;

/// Success envelope: every JSON response body is `{ "data": ... }`.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
