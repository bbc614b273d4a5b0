//! Client-side route matching.
//!
//! Routes are compiled from patterns such as `/blog/{slug}` and matched
//! against percent-decoded paths. [`RouteTable::match_path`] returns every
//! matching route ordered from most to least specific.
//!
//! ## Example
//!
//! ```ignore
//! use wayfinder_pages::router::{Route, RouteTable};
//!
//! let table = RouteTable::new()
//!     .route("/", home)
//!     .add(Route::named("post", "/blog/{slug}", post).with_preload(load_post));
//!
//! let best = table.first_match("/blog/hello-world");
//! ```

mod error;
mod pattern;
mod table;

use std::collections::BTreeMap;

pub use error::{PatternError, RouterError};
pub use pattern::{PathPattern, Segment};
pub use table::{Route, RouteMatch, RouteTable};

/// Decoded path parameters keyed by name.
pub type Params = BTreeMap<String, String>;
