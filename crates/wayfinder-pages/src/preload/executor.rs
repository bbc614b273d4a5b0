//! Runs route preloads and normalizes their outcome.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{self, LocalBoxFuture};
use tracing::{debug, warn};
use url::Url;

use super::{PageError, PreloadContext, PreloadOutcome, PreloadRequest, Props};
use crate::fetch::Fetch;
use crate::router::RouteMatch;

/// Invokes preload functions with a normalized request and context.
#[derive(Clone)]
pub struct PreloadExecutor {
	base: Url,
	fetch: Rc<dyn Fetch>,
}

impl fmt::Debug for PreloadExecutor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PreloadExecutor")
			.field("base", &self.base.as_str())
			.finish_non_exhaustive()
	}
}

impl PreloadExecutor {
	/// Creates an executor whose contexts resolve data URLs against `base`.
	pub fn new(base: Url, fetch: Rc<dyn Fetch>) -> Self {
		Self { base, fetch }
	}

	/// Returns the base URL handed to preload contexts.
	pub fn base(&self) -> &Url {
		&self.base
	}

	/// Runs the preload of the matched route.
	///
	/// The returned future never fails: errors, invalid redirects and panics
	/// inside the preload all become [`PreloadOutcome::Error`]. Routes
	/// without a preload resolve to empty props.
	pub fn run(
		&self,
		route_match: &RouteMatch,
		request: PreloadRequest,
	) -> LocalBoxFuture<'static, PreloadOutcome> {
		let Some(preload) = route_match.route.preload().cloned() else {
			return future::ready(PreloadOutcome::Props(Props::new())).boxed_local();
		};

		let context = PreloadContext::new(self.base.clone(), Rc::clone(&self.fetch));
		let pattern = route_match.route.pattern().to_string();

		async move {
			debug!(pattern = %pattern, url = %request.url, "running preload");
			let url = request.url.clone();
			// Calling inside the guarded future also catches panics raised
			// before the preload's first await.
			let guarded = AssertUnwindSafe(async move { preload(request, context).await });

			match guarded.catch_unwind().await {
				Ok(Ok(result)) => PreloadOutcome::from_result(result),
				Ok(Err(error)) => {
					debug!(url = %url, error = %error, "preload returned an error");
					PreloadOutcome::from_error(error)
				}
				Err(panic) => {
					let message = panic_message(panic.as_ref());
					warn!(url = %url, message = %message, "preload panicked");
					PreloadOutcome::Error(PageError::internal(message))
				}
			}
		}
		.boxed_local()
	}
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
	if let Some(message) = panic.downcast_ref::<&str>() {
		(*message).to_string()
	} else if let Some(message) = panic.downcast_ref::<String>() {
		message.clone()
	} else {
		"preload panicked".to_string()
	}
}
