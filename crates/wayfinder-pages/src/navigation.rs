//! Client-side navigation.
//!
//! The [`Navigator`] runs every navigation as a token-guarded pipeline:
//!
//! 1. a token is issued and the route table is consulted
//! 2. the preload resolves through the prefetch cache
//! 3. the result commits only if its token is still current
//!
//! Anything that is not a page of this application is handed to the
//! browser as a full load.

mod controller;
mod request;
mod state;
mod token;

pub use controller::Navigator;
pub use request::{NavigationRequest, Trigger};
pub use state::{FailureKind, NavigationOutcome, NavigationState};
pub use token::{NavigationToken, TokenSource};
