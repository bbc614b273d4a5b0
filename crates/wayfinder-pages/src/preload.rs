//! Route preloading.
//!
//! A preload is the data-loading step that runs before a page renders. It
//! receives a [`PreloadRequest`] and a [`PreloadContext`] and resolves to
//! props or a redirect. [`PreloadExecutor`] normalizes every result, error or
//! panic into exactly one [`PreloadOutcome`].

mod context;
mod executor;
mod outcome;
mod request;

use std::rc::Rc;

use futures::future::LocalBoxFuture;

pub use context::PreloadContext;
pub use executor::PreloadExecutor;
pub use outcome::{PageError, PreloadError, PreloadOutcome, PreloadResult, Props, Redirect};
pub use request::PreloadRequest;

/// Type-erased preload function stored on a route.
pub type PreloadFn = Rc<dyn Fn(PreloadRequest, PreloadContext) -> PreloadFuture>;

/// Future returned by a [`PreloadFn`].
pub type PreloadFuture = LocalBoxFuture<'static, Result<PreloadResult, PreloadError>>;
