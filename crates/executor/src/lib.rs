//! Execution of GraphQL operations against a [`schema::Schema`]: concurrent field
//! resolution, null propagation, `@defer`/`@stream` incremental delivery and subscriptions.

mod args;
mod coercion;
mod collect;
mod context;
mod default_resolvers;
mod error;
mod execute;
mod incremental;
mod operation;
mod response;
mod subscribe;

pub use args::ExecutionArgs;
pub use error::{GraphqlError, Location};
pub use operation::execute;
pub use response::{
    ExecutionOutcome, IncrementalResult, InitialPayload, Response, ResponseStream, StreamingPayload, SubscriptionOutcome,
    SubsequentPayload,
};
pub use subscribe::{create_source_event_stream, subscribe};
