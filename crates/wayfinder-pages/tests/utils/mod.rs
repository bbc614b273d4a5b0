//! Demo application shared by the integration tests.
//!
//! The app mirrors a small blog: a home page, static pages, blog posts
//! loaded from JSON endpoints, redirects, a deliberately slow page and
//! pages exercising URL encoding. [`DemoApp::load`] renders the initial
//! document on the "server" and materializes it in a [`MemoryDom`] the way a
//! browser would, so launching the client hydrates real server markup.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::channel::oneshot;
use serde_json::{Value, json};
use url::Url;
use wayfinder_pages::prelude::*;

pub const ORIGIN: &str = "http://localhost:3000";

/// Releases the preload of `/slow-preload` on demand.
#[derive(Debug, Clone, Default)]
pub struct Gate {
	waiting: Rc<RefCell<Vec<oneshot::Sender<()>>>>,
}

impl Gate {
	fn wait(&self) -> oneshot::Receiver<()> {
		let (sender, receiver) = oneshot::channel();
		self.waiting.borrow_mut().push(sender);
		receiver
	}

	/// Completes every pending slow preload.
	pub fn fulfil(&self) {
		for sender in self.waiting.borrow_mut().drain(..) {
			let _ = sender.send(());
		}
	}
}

/// Counts clicks on the home page button.
pub type Clicks = Rc<Cell<u32>>;

pub fn url(path: &str) -> Url {
	Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

fn heading(text: impl Into<String>) -> View {
	ElementView::new("h1").child(text.into()).into()
}

fn string_prop(props: &Props, key: &str) -> String {
	props
		.get(key)
		.and_then(Value::as_str)
		.unwrap_or_default()
		.to_string()
}

pub fn routes(gate: Gate, clicks: Clicks) -> RouteTable {
	RouteTable::new()
		.add(
			Route::named("index", "/", move |_props: &Props| -> View {
				let clicks = Rc::clone(&clicks);
				View::fragment([
					heading("Great success!"),
					ElementView::new("button")
						.on("click", move || clicks.set(clicks.get() + 1))
						.child("clicks")
						.into(),
					ElementView::new("a")
						.attr("href", "/about")
						.child("about")
						.into(),
				])
			})
			.with_chunks(["/client/_.0.js"]),
		)
		.route("/about", |_props: &Props| heading("About this site"))
		.add(
			Route::new("/slow-preload", |_props: &Props| {
				heading("This page loaded slowly")
			})
			.with_preload(
				move |_request: PreloadRequest, _context: PreloadContext| {
					let released = gate.wait();
					async move {
						let _ = released.await;
						Ok::<_, PreloadError>(PreloadResult::Props(Props::new()))
					}
				},
			),
		)
		.add(
			Route::named("blog", "/blog", |props: &Props| -> View {
				let posts = props
					.get("posts")
					.and_then(Value::as_array)
					.cloned()
					.unwrap_or_default();
				View::fragment([
					heading("Recent posts"),
					ElementView::new("ul")
						.children(posts.iter().map(|post| {
							let slug = post["slug"].as_str().unwrap_or_default();
							let title = post["title"].as_str().unwrap_or_default();
							ElementView::new("li").child(
								ElementView::new("a")
									.attr("href", format!("/blog/{slug}"))
									.child(title.to_string()),
							)
						}))
						.into(),
				])
			})
			.with_preload(
				|_request: PreloadRequest, context: PreloadContext| async move {
					let posts = context.fetch("blog.json").await?;
					PreloadResult::from_serialize(&json!({ "posts": posts }))
				},
			),
		)
		.add(
			Route::named("blog_post", "/blog/{slug}", |props: &Props| -> View {
				let sections = props
					.get("sections")
					.and_then(Value::as_array)
					.cloned()
					.unwrap_or_default();
				View::fragment([
					heading(string_prop(props, "title")),
					ElementView::new("div")
						.attr("class", "content")
						.children(sections.iter().map(|section| {
							let id = section.as_str().unwrap_or_default().to_string();
							View::fragment([
								ElementView::new("h2").attr("id", id.as_str()).child(id.clone()),
								ElementView::new("p").child(format!("Section {id}")),
							])
						}))
						.into(),
				])
			})
			.with_preload(
				|request: PreloadRequest, context: PreloadContext| async move {
					let slug = request.param("slug").unwrap_or_default().to_string();
					if slug == "throw-an-error" {
						return Err(PreloadError::other("nope"));
					}
					let post = context.fetch(&format!("blog/{slug}.json")).await?;
					PreloadResult::from_serialize(&post)
				},
			),
		)
		.add(
			Route::new("/redirect-from", |_props: &Props| View::empty()).with_preload(
				|_request: PreloadRequest, context: PreloadContext| async move {
					Err::<PreloadResult, _>(context.redirect(301, "/redirect-to"))
				},
			),
		)
		.route("/redirect-to", |_props: &Props| heading("redirected"))
		.add(
			Route::new("/show-url", |props: &Props| -> View {
				heading(format!("URL is {}", string_prop(props, "url")))
			})
			.with_preload(
				|request: PreloadRequest, _context: PreloadContext| async move {
					PreloadResult::from_serialize(&json!({ "url": request.url }))
				},
			),
		)
		.route("/fünke", |_props: &Props| {
			heading("I'm afraid I just blue myself")
		})
}

pub fn data() -> MemoryFetch {
	MemoryFetch::new()
		.with_json(
			"/blog.json",
			json!([
				{"slug": "what-is-wayfinder", "title": "What is Wayfinder?"},
				{"slug": "a-very-long-post", "title": "A very long post with deep links"},
			]),
		)
		.with_json(
			"/blog/what-is-wayfinder.json",
			json!({"title": "What is Wayfinder?", "sections": []}),
		)
		.with_json(
			"/blog/a-very-long-post.json",
			json!({
				"title": "A very long post with deep links",
				"sections": ["one", "two", "three", "four"],
			}),
		)
		.with_status("/blog/nope.json", 404)
}

/// A browser tab showing the demo app.
pub struct DemoApp {
	pub dom: Rc<MemoryDom>,
	pub platform: Rc<MemoryPlatform>,
	pub fetch: Rc<MemoryFetch>,
	pub gate: Gate,
	pub clicks: Clicks,
	pub response: SsrResponse,
}

impl DemoApp {
	/// Requests `path` from the server and loads the response.
	pub async fn load(path: &str) -> Self {
		let gate = Gate::default();
		let clicks = Clicks::default();
		let fetch = Rc::new(data());
		let table = routes(gate.clone(), Rc::clone(&clicks));

		let response = render_document(
			&table,
			&NavigatorSettings::default(),
			&DocumentRequest::new(url(path)),
			fetch.clone(),
		)
		.await;

		let dom = Rc::new(MemoryDom::new());
		response.materialize(dom.as_ref(), &dom.body()).unwrap();

		Self {
			dom,
			platform: Rc::new(MemoryPlatform::new(url(path))),
			fetch,
			gate,
			clicks,
			response,
		}
	}

	/// Starts the client over the loaded document.
	pub async fn launch(&self) -> Client<MemoryDom, MemoryPlatform> {
		let table = routes(self.gate.clone(), Rc::clone(&self.clicks));
		ClientLauncher::new(
			table,
			Rc::clone(&self.dom),
			Rc::clone(&self.platform),
			self.fetch.clone(),
		)
		.launch()
		.await
		.unwrap()
	}

	/// Loads `path` and starts the client.
	pub async fn start(path: &str) -> (Self, Client<MemoryDom, MemoryPlatform>) {
		let app = Self::load(path).await;
		let client = app.launch().await;
		app.fetch.clear_requests();
		(app, client)
	}

	/// Text of the first `<h1>`, the demo app's page title.
	pub fn title(&self) -> Option<String> {
		self.dom.text_of("h1")
	}

	/// Path of the address bar.
	pub fn path(&self) -> String {
		self.platform.location().unwrap().path().to_string()
	}
}
