//! Client-side navigation engine
//!
//! This module provides access to wayfinder-pages: route matching, preload
//! execution, the prefetch cache, the navigation controller, hydration and
//! server rendering of the initial document.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wayfinder::pages::prelude::*;
//!
//! let dom = Rc::new(MemoryDom::with_root("app"));
//! let platform = Rc::new(MemoryPlatform::new(Url::parse("http://localhost:3000/")?));
//! let client = ClientLauncher::new(table, dom, platform, Rc::new(MemoryFetch::new()))
//!     .launch()
//!     .await?;
//! client.navigator().goto("/about").await?;
//! ```

// Re-export all wayfinder-pages functionality
pub use wayfinder_pages::*;
