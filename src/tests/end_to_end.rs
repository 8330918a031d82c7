use std::sync::Arc;

use serde_json::json;

use super::{error_code, tokens, Harness};
use crate::{config::VotePolicy, store::MemoryStore};

const LOGIN: &str = "mutation ($e: String!, $p: String!) {
    login(email: $e, password: $p) { token user { _id username } }
}";

#[actix_web::test]
async fn test_sign_up_report_and_find_nearby() {
    let harness = Harness::new();

    let data = harness
        .ok(
            None,
            "mutation { addUser(username: \"alice\", email: \"alice@example.com\", password: \"hunter22\") { token user { _id username email } } }",
            json!({}),
        )
        .await;
    assert_eq!(data["addUser"]["user"]["username"], "alice");

    let data = harness
        .ok(None, LOGIN, json!({ "e": "alice@example.com", "p": "hunter22" }))
        .await;
    let token = data["login"]["token"].as_str().unwrap();
    let alice = tokens().verify(token).unwrap();
    assert_eq!(alice.username, "alice");
    assert_eq!(data["login"]["user"]["_id"], alice.id.to_string());

    let data = harness
        .ok(
            Some(&alice),
            "mutation ($data: ReviewInput!) { addReview(reviewData: $data) { _id severity reviewType voteRatio location { type coordinates } reviewedBy { username } } }",
            json!({ "data": {
                "title": "Poorly lit parking lot",
                "description": "Nobody around after dark",
                "reviewType": "unsafe_environment",
                "location": { "type": "Point", "coordinates": [-98.5795, 39.8283], "address": "Lebanon, KS" },
                "severity": 3,
            }}),
        )
        .await;
    let review = &data["addReview"];
    assert_eq!(review["severity"], 3);
    assert_eq!(review["reviewType"], "unsafe_environment");
    assert_eq!(review["voteRatio"], 0.0);
    assert_eq!(review["location"]["type"], "Point");
    assert_eq!(review["reviewedBy"]["username"], "alice");
    let id = review["_id"].as_str().unwrap();

    let data = harness
        .ok(
            None,
            "{ reviewsByLocation(longitude: -98.58, latitude: 39.83, distance: 10000) { _id } }",
            json!({}),
        )
        .await;
    assert_eq!(data["reviewsByLocation"], json!([{ "_id": id }]));

    // roughly 1.1km away, outside of 1000m
    let data = harness
        .ok(
            None,
            "{ reviewsByLocation(longitude: -98.5795, latitude: 39.8383, distance: 1000) { _id } }",
            json!({}),
        )
        .await;
    assert_eq!(data["reviewsByLocation"], json!([]));

    // default distance of 5000m
    let data = harness
        .ok(None, "{ reviewsByLocation(longitude: -98.55, latitude: 39.82) { _id } }", json!({}))
        .await;
    assert_eq!(data["reviewsByLocation"], json!([{ "_id": id }]));

    let data = harness
        .ok(Some(&alice), "{ me { username reviews { _id } } }", json!({}))
        .await;
    assert_eq!(data["me"], json!({ "username": "alice", "reviews": [{ "_id": id }] }));

    let data = harness
        .ok(None, "{ reviewsByUser(username: \"alice\") { _id } }", json!({}))
        .await;
    assert_eq!(data["reviewsByUser"], json!([{ "_id": id }]));
}

#[actix_web::test]
async fn test_login_failures() {
    let harness = Harness::new();
    harness.sign_up("alice").await;

    let response = harness
        .execute(None, LOGIN, json!({ "e": "nobody@example.com", "p": "hunter22" }))
        .await;
    assert_eq!(error_code(&response).as_deref(), Some("USER_NOT_FOUND"));

    let response = harness
        .execute(None, LOGIN, json!({ "e": "alice@example.com", "p": "hunter2" }))
        .await;
    assert_eq!(error_code(&response).as_deref(), Some("INCORRECT_CREDENTIALS"));
}

#[actix_web::test]
async fn test_sign_up_failures() {
    let harness = Harness::new();
    harness.sign_up("alice").await;

    let add_user = "mutation ($u: String!, $e: String!, $p: String!) {
        addUser(username: $u, email: $e, password: $p) { token }
    }";
    let cases = [
        (json!({ "u": "alice", "e": "other@example.com", "p": "hunter22" }), "USER_ALREADY_EXISTS"),
        (json!({ "u": "alice2", "e": "alice@example.com", "p": "hunter22" }), "USER_ALREADY_EXISTS"),
        (json!({ "u": "carol", "e": "not an email", "p": "hunter22" }), "BAD_USER_INPUT"),
        (json!({ "u": "carol", "e": "carol@example.com", "p": "123" }), "BAD_USER_INPUT"),
        (json!({ "u": "  ", "e": "carol@example.com", "p": "hunter22" }), "BAD_USER_INPUT"),
    ];
    for (variables, code) in cases {
        let response = harness.execute(None, add_user, variables.clone()).await;
        assert_eq!(error_code(&response).as_deref(), Some(code), "{}", variables);
    }

    let data = harness.ok(None, "{ users { username } }", json!({})).await;
    assert_eq!(data["users"], json!([{ "username": "alice" }]));
}

#[actix_web::test]
async fn test_not_found() {
    let harness = Harness::new();

    let response = harness
        .execute(None, "{ user(username: \"nobody\") { _id } }", json!({}))
        .await;
    assert_eq!(error_code(&response).as_deref(), Some("USER_NOT_FOUND"));

    let response = harness
        .execute(None, "{ reviewsByUser(username: \"nobody\") { _id } }", json!({}))
        .await;
    assert_eq!(error_code(&response).as_deref(), Some("USER_NOT_FOUND"));

    for id in ["not-a-uuid", "2f1b4d6e-3c1a-4f0e-9d2b-7a5c8e9f0a1b"] {
        let response = harness
            .execute(None, "query ($id: ID!) { review(reviewId: $id) { _id } }", json!({ "id": id }))
            .await;
        assert_eq!(error_code(&response).as_deref(), Some("REVIEW_NOT_FOUND"));
    }
}

#[actix_web::test]
async fn test_comments_belong_to_their_author() {
    let harness = Harness::new();
    let alice = harness.sign_up("alice").await;
    let bob = harness.sign_up("bob").await;
    let id = harness.add_review(&alice, [-98.5795, 39.8283]).await;

    let data = harness
        .ok(
            Some(&alice),
            "mutation ($id: ID!) { addComment(reviewId: $id, commentText: \"Avoid at night\") { comments { _id commentText commentAuthor { username } } } }",
            json!({ "id": id }),
        )
        .await;
    let comment = &data["addComment"]["comments"][0];
    assert_eq!(comment["commentText"], "Avoid at night");
    assert_eq!(comment["commentAuthor"]["username"], "alice");
    let comment_id = comment["_id"].as_str().unwrap();

    let remove = "mutation ($id: ID!, $c: ID!) { removeComment(reviewId: $id, commentId: $c) { comments { _id } } }";
    let response = harness
        .execute(Some(&bob), remove, json!({ "id": id, "c": comment_id }))
        .await;
    assert_eq!(error_code(&response).as_deref(), Some("UNAUTHORIZED"));

    let data = harness
        .ok(None, "query ($id: ID!) { review(reviewId: $id) { comments { _id } } }", json!({ "id": id }))
        .await;
    assert_eq!(data["review"]["comments"], json!([{ "_id": comment_id }]));

    let response = harness
        .execute(
            Some(&alice),
            remove,
            json!({ "id": id, "c": "2f1b4d6e-3c1a-4f0e-9d2b-7a5c8e9f0a1b" }),
        )
        .await;
    assert_eq!(error_code(&response).as_deref(), Some("COMMENT_NOT_FOUND"));

    let data = harness
        .ok(Some(&alice), remove, json!({ "id": id, "c": comment_id }))
        .await;
    assert_eq!(data["removeComment"]["comments"], json!([]));
}

#[actix_web::test]
async fn test_unlimited_votes() {
    let harness = Harness::new();
    let alice = harness.sign_up("alice").await;
    let id = harness.add_review(&alice, [-98.5795, 39.8283]).await;

    for _ in 0..3 {
        harness
            .ok(Some(&alice), "mutation ($id: ID!) { upvoteReview(reviewId: $id) { _id } }", json!({ "id": id }))
            .await;
    }
    let data = harness
        .ok(
            Some(&alice),
            "mutation ($id: ID!) { downvoteReview(reviewId: $id) { upvotes downvotes voteRatio } }",
            json!({ "id": id }),
        )
        .await;
    assert_eq!(
        data["downvoteReview"],
        json!({ "upvotes": 3, "downvotes": 1, "voteRatio": 0.75 })
    );
}

#[actix_web::test]
async fn test_one_vote_per_user() {
    let harness = Harness::with(Arc::new(MemoryStore::default()), VotePolicy::OncePerUser);
    let alice = harness.sign_up("alice").await;
    let bob = harness.sign_up("bob").await;
    let id = harness.add_review(&alice, [-98.5795, 39.8283]).await;

    let upvote = "mutation ($id: ID!) { upvoteReview(reviewId: $id) { upvotes downvotes } }";
    let downvote = "mutation ($id: ID!) { downvoteReview(reviewId: $id) { upvotes downvotes } }";

    harness.ok(Some(&bob), upvote, json!({ "id": id })).await;
    let response = harness.execute(Some(&bob), downvote, json!({ "id": id })).await;
    assert_eq!(error_code(&response).as_deref(), Some("ALREADY_VOTED"));

    let data = harness.ok(Some(&alice), downvote, json!({ "id": id })).await;
    assert_eq!(data["downvoteReview"], json!({ "upvotes": 1, "downvotes": 1 }));
}

#[actix_web::test]
async fn test_invalid_review_writes_nothing() {
    let harness = Harness::new();
    let alice = harness.sign_up("alice").await;

    let mut data = super::review_data("Too severe", [-98.5795, 39.8283]);
    data["severity"] = json!(6);
    let response = harness
        .execute(Some(&alice), super::ADD_REVIEW, json!({ "data": data }))
        .await;
    assert_eq!(error_code(&response).as_deref(), Some("BAD_USER_INPUT"));

    let data = harness.ok(None, "{ reviews { _id } }", json!({})).await;
    assert_eq!(data["reviews"], json!([]));
}
