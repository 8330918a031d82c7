use std::time::Duration;

use actix_web::{
    get,
    http::header::{ACCEPT, CONTENT_TYPE},
    route, web, App, HttpRequest, HttpResponse, HttpServer,
};
use async_graphql::http::GraphiQLSource;
use async_graphql_actix_web::GraphQLRequest;
use log::{error, info};

use crate::{
    auth::TokenService,
    authn::RequestContext,
    config::Config,
    graphql::{build_schema, GraphQLSchema},
    reviews::{links, ReviewPolicy},
};

const GRAPHQL_ENDPOINT: &str = "/graphql";

mod actors;
mod auth;
mod authn;
mod config;
mod fallible;
mod graphql;
mod guards;
mod loader;
mod models;
mod reviews;
mod store;
#[cfg(test)]
mod tests;

const CBOR: &str = "application/cbor";

#[route("/graphql", method = "GET", method = "POST")]
async fn execute_graphql(
    schema: web::Data<GraphQLSchema>,
    tokens: web::Data<TokenService>,
    req: GraphQLRequest,
    http_request: HttpRequest,
) -> HttpResponse {
    let context = RequestContext::from_request(&http_request, &tokens);
    let response = schema.execute(req.into_inner().data(context)).await;

    let wants_cbor = http_request
        .headers()
        .get(ACCEPT)
        .and_then(|accept| accept.to_str().ok())
        .map_or(false, |accept| accept.contains(CBOR));

    let body = if wants_cbor {
        serde_cbor::to_vec(&response).map_err(|e| e.to_string())
    } else {
        serde_json::to_vec(&response).map_err(|e| e.to_string())
    };
    match body {
        Ok(body) => HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, if wants_cbor { CBOR } else { "application/json" }))
            .body(body),
        Err(e) => {
            error!("Could not serialize a response: {}", e);
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/graphql/sdl")]
async fn getsdl(schema: web::Data<GraphQLSchema>) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(schema.sdl())
}

#[get("/playground")]
async fn playground() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint(GRAPHQL_ENDPOINT).finish())
}

/// Registers every route of the server
fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(execute_graphql).service(getsdl).service(playground);
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let config = Config::load()?;
    let store = store::connect(&config.db_uri).await?;

    info!("Running the consistency sweep...");
    if let Err(e) = links::sweep(store.as_ref()).await {
        error!("Consistency sweep failed: {}", e);
    }
    if config.consistency_sweep_secs > 0 {
        links::spawn_sweeper(
            store.clone(),
            Duration::from_secs(config.consistency_sweep_secs),
        );
    }

    let tokens = TokenService::new(config.jwt_secret.clone());
    let schema = build_schema(store, tokens.clone(), ReviewPolicy::from(&config));

    info!("Starting http server on {}", config.listen);

    let schema = web::Data::new(schema);
    let tokens = web::Data::new(tokens);
    HttpServer::new(move || {
        App::new()
            .app_data(schema.clone())
            .app_data(tokens.clone())
            .configure(routes)
    })
    .bind(config.listen)?
    .run()
    .await?;
    Ok(())
}
