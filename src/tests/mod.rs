//! Tests that go through the whole schema, backed by the memory store
use std::sync::Arc;

use async_graphql::{Request, Response, Value, Variables};
use serde_json::json;

use crate::{
    auth::TokenService,
    authn::{Identity, RequestContext},
    config::{JwtKeys, VotePolicy},
    graphql::{build_schema, GraphQLSchema},
    reviews::ReviewPolicy,
    store::{MemoryStore, Store},
};

mod end_to_end;

const SECRET: &[u8] = b"not so secret";

pub(crate) fn tokens() -> TokenService {
    TokenService::new(JwtKeys::from_secret(SECRET))
}

pub(crate) struct Harness {
    pub schema: GraphQLSchema,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(Arc::new(MemoryStore::default()), VotePolicy::Unlimited)
    }

    pub fn with(store: Arc<dyn Store>, vote_policy: VotePolicy) -> Self {
        let policy = ReviewPolicy {
            vote_policy,
            link_attempts: 3,
        };
        Self {
            schema: build_schema(store, tokens(), policy),
        }
    }

    pub async fn execute(
        &self,
        caller: Option<&Identity>,
        query: &str,
        variables: serde_json::Value,
    ) -> Response {
        let context = match caller {
            Some(identity) => RequestContext::authenticated(identity.clone()),
            None => RequestContext::anonymous(),
        };
        let request = Request::new(query)
            .variables(Variables::from_json(variables))
            .data(context);
        self.schema.execute(request).await
    }

    /// Executes and expects success, returns ``data`` as json
    pub async fn ok(
        &self,
        caller: Option<&Identity>,
        query: &str,
        variables: serde_json::Value,
    ) -> serde_json::Value {
        let response = self.execute(caller, query, variables).await;
        assert!(response.errors.is_empty(), "{:?}", response.errors);
        response.data.into_json().unwrap()
    }

    /// Signs up a user through ``addUser`` and returns who the token says it is
    pub async fn sign_up(&self, username: &str) -> Identity {
        let data = self
            .ok(
                None,
                "mutation ($u: String!, $e: String!) {
                    addUser(username: $u, email: $e, password: \"hunter22\") { token }
                }",
                json!({ "u": username, "e": format!("{}@example.com", username) }),
            )
            .await;
        let token = data["addUser"]["token"].as_str().unwrap();
        tokens().verify(token).unwrap()
    }

    /// Adds a review through the schema and returns its ``_id``
    pub async fn add_review(&self, caller: &Identity, coordinates: [f64; 2]) -> String {
        let data = self
            .ok(
                Some(caller),
                ADD_REVIEW,
                json!({ "data": review_data("Dark underpass", coordinates) }),
            )
            .await;
        data["addReview"]["_id"].as_str().unwrap().to_string()
    }
}

pub(crate) const ADD_REVIEW: &str = "mutation ($data: ReviewInput!) {
    addReview(reviewData: $data) { _id title reviewedBy { username } }
}";

pub(crate) fn review_data(title: &str, coordinates: [f64; 2]) -> serde_json::Value {
    json!({
        "title": title,
        "description": "No lights at night",
        "reviewType": "unsafe_environment",
        "location": { "type": "Point", "coordinates": coordinates },
        "severity": 3,
    })
}

/// The ``code`` extension of the first error
pub(crate) fn error_code(response: &Response) -> Option<String> {
    let error = response.errors.first()?;
    match error.extensions.as_ref()?.get("code")? {
        Value::String(code) => Some(code.clone()),
        _ => None,
    }
}
