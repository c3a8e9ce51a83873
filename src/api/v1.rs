//! Version 1 endpoints

use axum::routing::get;
use axum::{Json, Router};
use rand::Rng;
use serde::Serialize;
use std::ops::RangeInclusive;

/// Range the mock random number endpoint draws from.
pub const RANDOM_RANGE: RangeInclusive<u32> = 1..=100;

pub fn router() -> Router {
    Router::new()
        .route("/v1", get(welcome))
        .route("/v1/", get(welcome))
        .route("/v1/random-number", get(random_number))
}

#[derive(Serialize, Debug)]
pub struct Welcome {
    pub message: &'static str,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RandomNumber {
    pub random_number: u32,
}

async fn welcome() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to API v1",
    })
}

async fn random_number() -> Json<RandomNumber> {
    Json(RandomNumber {
        random_number: rand::thread_rng().gen_range(RANDOM_RANGE),
    })
}
