//! Client-side data synchronisation: a keyed, polling query cache and a
//! mutation runner that invalidates it.

mod client;
mod key;
mod mutation;

pub use client::{QueryClient, QueryOptions, QuerySnapshot, Subscription};
pub use key::QueryKey;
pub use mutation::{Mutation, MutationOutcome, MutationState};
