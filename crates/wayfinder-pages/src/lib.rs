//! Wayfinder Pages - client-side navigation for server-rendered applications
//!
//! The server renders each page from a route table; in the browser this
//! crate takes over: in-app links are intercepted, the target route's
//! preload runs (at most once per URL, shared between hover prefetching and
//! navigation), and the new page is mounted once its data is ready. Stale
//! navigations are discarded, history and scroll position are managed, and
//! anything that is not a page falls back to a normal server load.
//!
//! ## Architecture
//!
//! - [`router`]: route patterns, matching by specificity, reverse lookups
//! - [`preload`]: preload requests, contexts, outcomes and the executor
//! - [`prefetch`]: the single-resolution prefetch cache
//! - [`navigation`]: the token-guarded navigation controller
//! - [`hydration`]: hydration of server markup and page mounting
//! - [`scroll`]: scroll recording, restoration and anchors
//! - [`link`]: link classification
//! - [`component`]: the view model pages render to
//! - [`dom`], [`platform`], [`fetch`]: seams to the host environment
//! - [`ssr`]: initial document rendering
//! - [`launcher`]: client start-up
//! - [`settings`]: configuration
//!
//! ## Example
//!
//! ```ignore
//! use wayfinder_pages::prelude::*;
//!
//! fn blog_post(props: &Props) -> View {
//!     let title = props["title"].as_str().unwrap_or_default().to_string();
//!     ElementView::new("h1").child(title).into()
//! }
//!
//! let table = RouteTable::new().add(Route::new("/blog/{slug}", blog_post).with_preload(
//!     |request: PreloadRequest, context: PreloadContext| async move {
//!         let slug = request.param("slug").unwrap_or_default().to_string();
//!         let post = context.fetch(&format!("blog/{slug}.json")).await?;
//!         PreloadResult::from_serialize(&post)
//!     },
//! ));
//!
//! // In the browser:
//! let client = wayfinder_pages::platform::browser::start(table, NavigatorSettings::default()).await?;
//! client.prefetch_routes().await;
//! ```

#![warn(missing_docs)]

// Routing and data
pub mod preload;
pub mod router;

// Navigation
pub mod link;
pub mod navigation;
pub mod prefetch;
pub mod scroll;

// Rendering
pub mod component;
pub mod hydration;
pub mod ssr;

// Host seams
pub mod dom;
pub mod fetch;
pub mod platform;

pub mod error;
pub mod launcher;
pub mod settings;

// Unified prelude for simplified imports
pub mod prelude;

pub use component::{ElementView, ErrorComponent, IntoView, PageComponent, View};
pub use error::{NavigationError, NavigationResult, SettingsError, SettingsResult};
pub use launcher::{Client, ClientLauncher};
pub use navigation::{NavigationOutcome, NavigationState, Navigator};
pub use preload::{PageError, PreloadContext, PreloadError, PreloadRequest, PreloadResult, Props};
pub use router::{Route, RouteTable};
pub use settings::NavigatorSettings;
