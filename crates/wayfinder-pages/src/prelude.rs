//! Commonly used types.
//!
//! ```ignore
//! use wayfinder_pages::prelude::*;
//! ```

pub use crate::component::{
	DefaultErrorPage, ElementView, ErrorComponent, IntoView, PageComponent, View,
};
pub use crate::dom::{Dom, MemoryDom};
pub use crate::error::{NavigationError, NavigationResult};
pub use crate::fetch::{Fetch, FetchError, HttpFetch, MemoryFetch};
pub use crate::launcher::{Client, ClientLauncher};
pub use crate::link::{Anchor, LinkDecision};
pub use crate::navigation::{
	FailureKind, NavigationOutcome, NavigationRequest, NavigationState, Navigator, Trigger,
};
pub use crate::platform::{MemoryPlatform, Platform, ScrollPosition};
pub use crate::preload::{
	PageError, PreloadContext, PreloadError, PreloadOutcome, PreloadRequest, PreloadResult, Props,
	Redirect,
};
pub use crate::router::{Params, Route, RouteTable};
pub use crate::settings::NavigatorSettings;
pub use crate::ssr::{DocumentRequest, InitialState, SsrResponse, render_document};
