use std::sync::Arc;

use async_graphql::{
    dataloader::DataLoader, extensions::ApolloTracing, EmptySubscription, MergedObject, Schema,
};

use crate::{
    actors::ActorQueries,
    auth::{AuthMutations, TokenService},
    loader::UserLoader,
    reviews::{ReviewMutations, ReviewPolicy, ReviewQueries},
    store::Store,
};

pub type GraphQLSchema = Schema<Queries, Mutations, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct Queries(ActorQueries, ReviewQueries);

#[derive(MergedObject, Default)]
pub struct Mutations(AuthMutations, ReviewMutations);

/// Builds the schema with everything the resolvers take from the context.
///
/// The per request [`RequestContext`](crate::authn::RequestContext) is not
/// part of it, it is added to every single request.
pub fn build_schema(
    store: Arc<dyn Store>,
    tokens: TokenService,
    policy: ReviewPolicy,
) -> GraphQLSchema {
    GraphQLSchema::build(Queries::default(), Mutations::default(), EmptySubscription)
        .extension(ApolloTracing)
        .data(DataLoader::new(
            UserLoader::new(store.clone()),
            actix_web::rt::spawn,
        ))
        .data(store)
        .data(tokens)
        .data(policy)
        .finish()
}
