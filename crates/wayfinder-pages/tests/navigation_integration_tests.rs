//! Integration tests for client-side navigation
//!
//! These tests drive the demo app through the navigator the way a user
//! would: clicking links, hovering them, calling `goto` and traversing
//! history. They verify:
//! 1. Pages change without full reloads and with one history entry each
//! 2. Superseded navigations never commit
//! 3. Prefetching shares a single data request with the navigation
//! 4. Scroll reset, deep links and restoration on history traversal
//! 5. Error pages, redirects and links that stay with the browser

mod utils;

use rstest::rstest;
use wayfinder_pages::platform::HistoryOp;
use wayfinder_pages::prelude::*;

use utils::{DemoApp, url};

#[rstest]
#[tokio::test]
async fn test_navigates_to_a_new_page_without_reloading() {
	let (app, client) = DemoApp::start("/").await;

	let outcome = client
		.navigator()
		.click(&Anchor::new("/about"))
		.await
		.unwrap();

	assert!(matches!(outcome, NavigationOutcome::Committed { .. }));
	assert_eq!(app.title().as_deref(), Some("About this site"));
	assert_eq!(app.path(), "/about");
	assert!(app.platform.full_loads().is_empty());
	assert_eq!(app.platform.push_count(), 1);
}

#[rstest]
#[tokio::test]
async fn test_navigates_programmatically() {
	let (app, client) = DemoApp::start("/about").await;

	client.navigator().goto("/blog/what-is-wayfinder").await.unwrap();

	assert_eq!(app.title().as_deref(), Some("What is Wayfinder?"));
	assert_eq!(app.path(), "/blog/what-is-wayfinder");
	assert_eq!(app.fetch.request_count("/blog/what-is-wayfinder.json"), 1);
}

#[rstest]
#[tokio::test]
async fn test_commits_once_with_single_history_update() {
	let (app, client) = DemoApp::start("/").await;

	client.navigator().goto("/blog").await.unwrap();

	let pushes: Vec<HistoryOp> = app
		.platform
		.operations()
		.into_iter()
		.filter(|op| matches!(op, HistoryOp::Push { .. }))
		.collect();
	assert_eq!(pushes.len(), 1);
	assert!(matches!(&pushes[0], HistoryOp::Push { url, .. } if url.path() == "/blog"));
	assert_eq!(app.dom.all_by_tag("li").len(), 2);
	assert_eq!(client.navigator().state(), NavigationState::Idle);
}

#[rstest]
#[tokio::test]
async fn test_prefetches_programmatically() {
	let (app, client) = DemoApp::start("/about").await;
	let navigator = client.navigator();

	let preload = navigator.prefetch("/blog/what-is-wayfinder").unwrap().unwrap();
	let outcome = preload.await;
	assert_eq!(outcome.props().unwrap()["title"], "What is Wayfinder?");
	assert_eq!(app.title().as_deref(), Some("About this site"));

	navigator.goto("/blog/what-is-wayfinder").await.unwrap();

	assert_eq!(app.fetch.request_count("/blog/what-is-wayfinder.json"), 1);
	assert_eq!(app.title().as_deref(), Some("What is Wayfinder?"));
}

#[rstest]
#[tokio::test]
async fn test_hover_then_click_makes_one_data_request() {
	let (app, client) = DemoApp::start("/blog").await;
	let navigator = client.navigator();
	let link = Anchor::new("/blog/what-is-wayfinder");

	let preload = navigator.hover(&link).unwrap();
	assert_eq!(navigator.state(), NavigationState::Idle);
	preload.await;
	navigator.click(&link).await.unwrap();

	assert_eq!(app.fetch.request_count("/blog/what-is-wayfinder.json"), 1);
	assert_eq!(app.title().as_deref(), Some("What is Wayfinder?"));
}

#[rstest]
#[tokio::test]
async fn test_hover_and_prefetch_issue_requests_immediately() {
	let (app, client) = DemoApp::start("/blog").await;
	let navigator = client.navigator();

	assert!(navigator.hover(&Anchor::new("/blog/what-is-wayfinder")).is_some());
	assert!(navigator.prefetch("/blog/a-very-long-post").unwrap().is_some());

	assert_eq!(app.fetch.request_count("/blog/what-is-wayfinder.json"), 1);
	assert_eq!(app.fetch.request_count("/blog/a-very-long-post.json"), 1);
	assert_eq!(navigator.state(), NavigationState::Idle);

	navigator.goto("/blog/what-is-wayfinder").await.unwrap();

	assert_eq!(app.fetch.request_count("/blog/what-is-wayfinder.json"), 1);
	assert_eq!(app.title().as_deref(), Some("What is Wayfinder?"));
}

#[rstest]
#[tokio::test]
async fn test_cancels_navigation_if_subsequent_navigation_occurs() {
	let (app, client) = DemoApp::start("/").await;
	let navigator = client.navigator();
	let gate = app.gate.clone();

	let (slow, about, ()) = futures::join!(
		navigator.goto("/slow-preload"),
		navigator.goto("/about"),
		async move { gate.fulfil() }
	);

	assert!(matches!(slow.unwrap(), NavigationOutcome::Superseded { .. }));
	assert!(matches!(about.unwrap(), NavigationOutcome::Committed { .. }));
	assert_eq!(app.title().as_deref(), Some("About this site"));
	assert_eq!(app.path(), "/about");
	assert_eq!(app.platform.push_count(), 1);
	assert_eq!(navigator.state(), NavigationState::Idle);
}

#[rstest]
#[tokio::test]
async fn test_later_click_wins_over_slow_click() {
	let (app, client) = DemoApp::start("/").await;
	let navigator = client.navigator();
	let gate = app.gate.clone();

	let slow_anchor = Anchor::new("/slow-preload");
	let blog_anchor = Anchor::new("/blog");
	let (slow, blog, ()) = futures::join!(
		navigator.click(&slow_anchor),
		navigator.click(&blog_anchor),
		async move { gate.fulfil() }
	);

	assert!(matches!(slow.unwrap(), NavigationOutcome::Superseded { .. }));
	assert!(matches!(blog.unwrap(), NavigationOutcome::Committed { .. }));
	assert_eq!(app.title().as_deref(), Some("Recent posts"));
}

#[rstest]
#[tokio::test]
async fn test_scrolls_to_deep_link_on_navigation() {
	let (app, client) = DemoApp::start("/blog").await;

	client
		.navigator()
		.goto("/blog/a-very-long-post#four")
		.await
		.unwrap();

	assert!(app.platform.scroll_position().y > 0.0);
}

#[rstest]
#[tokio::test]
async fn test_scrolls_to_deep_link_on_load() {
	let (app, _client) = DemoApp::start("/blog/a-very-long-post#four").await;

	assert!(app.platform.scroll_position().y > 0.0);
}

#[rstest]
#[tokio::test]
async fn test_missing_anchor_scrolls_to_top() {
	let (app, client) = DemoApp::start("/blog").await;
	app.platform.scroll_to(ScrollPosition::new(0.0, 300.0));

	client
		.navigator()
		.goto("/blog/a-very-long-post#nowhere")
		.await
		.unwrap();

	assert_eq!(app.platform.scroll_position(), ScrollPosition::TOP);
}

#[rstest]
#[tokio::test]
async fn test_same_page_fragment_scrolls_without_preloading() {
	let (app, client) = DemoApp::start("/blog/a-very-long-post").await;

	let outcome = client
		.navigator()
		.click(&Anchor::new("#three"))
		.await
		.unwrap();

	assert!(matches!(outcome, NavigationOutcome::Scrolled { .. }));
	assert!(app.platform.scroll_position().y > 0.0);
	assert!(app.fetch.requests().is_empty());
	assert_eq!(
		client.navigator().current_url().fragment(),
		Some("three")
	);
}

#[rstest]
#[tokio::test]
async fn test_resets_scroll_on_new_page() {
	let (app, client) = DemoApp::start("/").await;
	app.platform.scroll_to(ScrollPosition::new(0.0, 300.0));

	client.navigator().goto("/about").await.unwrap();

	assert_eq!(app.platform.scroll_position(), ScrollPosition::TOP);
}

#[rstest]
#[tokio::test]
async fn test_restores_scroll_on_back() {
	let (app, client) = DemoApp::start("/").await;
	let navigator = client.navigator();
	app.platform.scroll_to(ScrollPosition::new(0.0, 300.0));
	navigator.goto("/about").await.unwrap();

	let (state_id, previous) = app.platform.back().unwrap();
	let outcome = navigator.handle_popstate(state_id, previous).await.unwrap();

	assert!(matches!(outcome, NavigationOutcome::Committed { .. }));
	assert_eq!(app.title().as_deref(), Some("Great success!"));
	assert_eq!(app.platform.scroll_position(), ScrollPosition::new(0.0, 300.0));
	// History traversal adds no entry
	assert_eq!(app.platform.push_count(), 1);
	assert_eq!(app.platform.history_len(), 2);
}

#[rstest]
#[tokio::test]
async fn test_records_scroll_made_during_slow_preload() {
	let (app, client) = DemoApp::start("/").await;
	let navigator = client.navigator();
	let gate = app.gate.clone();
	let platform = app.platform.clone();

	let (slow, ()) = futures::join!(navigator.goto("/slow-preload"), async move {
		platform.scroll_to(ScrollPosition::new(0.0, 500.0));
		gate.fulfil();
	});
	assert!(matches!(slow.unwrap(), NavigationOutcome::Committed { .. }));
	assert_eq!(app.platform.scroll_position(), ScrollPosition::TOP);

	let (state_id, previous) = app.platform.back().unwrap();
	navigator.handle_popstate(state_id, previous).await.unwrap();

	assert_eq!(app.platform.scroll_position(), ScrollPosition::new(0.0, 500.0));
}

#[rstest]
#[tokio::test]
async fn test_forward_after_back_returns_to_page() {
	let (app, client) = DemoApp::start("/").await;
	let navigator = client.navigator();
	navigator.goto("/about").await.unwrap();
	let (state_id, previous) = app.platform.back().unwrap();
	navigator.handle_popstate(state_id, previous).await.unwrap();

	let (state_id, next) = app.platform.forward().unwrap();
	navigator.handle_popstate(state_id, next).await.unwrap();

	assert_eq!(app.title().as_deref(), Some("About this site"));
	assert_eq!(navigator.current_url().path(), "/about");
}

#[rstest]
#[tokio::test]
async fn test_handles_4xx_error_in_client() {
	let (app, client) = DemoApp::start("/").await;

	let outcome = client
		.navigator()
		.click(&Anchor::new("/blog/nope"))
		.await
		.unwrap();

	let NavigationOutcome::Failed { error, kind, .. } = &outcome else {
		panic!("expected failure, got {outcome:?}");
	};
	assert_eq!(error.status, 404);
	assert_eq!(*kind, FailureKind::ClientError);
	assert_eq!(app.path(), "/blog/nope");
	assert_eq!(app.title().as_deref(), Some("Not found"));
	assert!(app.dom.text_of("p").unwrap().contains("/blog/nope"));
}

#[rstest]
#[tokio::test]
async fn test_handles_non_4xx_error_in_client() {
	let (app, client) = DemoApp::start("/").await;

	let outcome = client
		.navigator()
		.click(&Anchor::new("/blog/throw-an-error"))
		.await
		.unwrap();

	assert!(matches!(
		outcome,
		NavigationOutcome::Failed {
			kind: FailureKind::ServerError,
			..
		}
	));
	assert_eq!(app.path(), "/blog/throw-an-error");
	assert_eq!(app.title().as_deref(), Some("Internal server error"));
}

#[rstest]
#[tokio::test]
async fn test_error_page_does_not_reuse_previous_props() {
	let (app, client) = DemoApp::start("/blog/what-is-wayfinder").await;

	client.navigator().goto("/blog/nope").await.unwrap();

	assert!(!app.dom.inner_html(app.dom.body()).contains("What is Wayfinder?"));
}

#[rstest]
#[tokio::test]
async fn test_redirects_in_client() {
	let (app, client) = DemoApp::start("/").await;

	let outcome = client
		.navigator()
		.click(&Anchor::new("/redirect-from"))
		.await
		.unwrap();

	assert!(matches!(outcome, NavigationOutcome::Committed { url, .. } if url.path() == "/redirect-to"));
	assert_eq!(app.path(), "/redirect-to");
	assert_eq!(app.title().as_deref(), Some("redirected"));
	assert!(app.platform.full_loads().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_does_not_intercept_data_endpoints() {
	let (app, client) = DemoApp::start("/blog/what-is-wayfinder").await;
	let navigator = client.navigator();

	let clicked = navigator
		.click(&Anchor::new("/blog/what-is-wayfinder.json"))
		.await
		.unwrap();
	assert_eq!(clicked, NavigationOutcome::Native);

	let programmatic = navigator.goto("/blog/what-is-wayfinder.json").await.unwrap();
	assert!(matches!(programmatic, NavigationOutcome::External { .. }));
	assert_eq!(
		app.platform.full_loads(),
		vec![url("/blog/what-is-wayfinder.json")]
	);
	assert_eq!(app.title().as_deref(), Some("What is Wayfinder?"));
}

#[rstest]
#[tokio::test]
async fn test_non_page_routes_load_from_server() {
	let (app, client) = DemoApp::start("/").await;

	let outcome = client.navigator().goto("/throw-an-error").await.unwrap();

	assert!(matches!(outcome, NavigationOutcome::External { .. }));
	assert_eq!(app.platform.full_loads(), vec![url("/throw-an-error")]);
	// No error page is rendered for non-page URLs
	assert_eq!(app.title().as_deref(), Some("Great success!"));
}

#[rstest]
#[case(Anchor::new("https://example.com/about"))]
#[case(Anchor::new("/about").with_target("_blank"))]
#[case(Anchor::new("/about").with_download())]
#[case(Anchor::new("/about").with_rel("external"))]
#[tokio::test]
async fn test_links_left_to_the_browser(#[case] anchor: Anchor) {
	let (app, client) = DemoApp::start("/").await;

	let outcome = client.navigator().click(&anchor).await.unwrap();

	assert_eq!(outcome, NavigationOutcome::Native);
	assert_eq!(app.platform.push_count(), 0);
	assert_eq!(app.title().as_deref(), Some("Great success!"));
}

#[rstest]
#[tokio::test]
async fn test_serves_index_with_empty_query() {
	let (app, client) = DemoApp::start("/about").await;

	client.navigator().goto("/?").await.unwrap();

	assert_eq!(app.title().as_deref(), Some("Great success!"));
}

#[rstest]
#[case("/show-url", "URL is /show-url")]
#[case("/show-url?x=1", "URL is /show-url?x=1")]
#[tokio::test]
async fn test_preload_receives_full_request(#[case] href: &str, #[case] expected: &str) {
	let (app, client) = DemoApp::start("/").await;

	client.navigator().goto(href).await.unwrap();

	assert_eq!(app.title().as_deref(), Some(expected));
}

#[rstest]
#[tokio::test]
async fn test_encoded_routes_in_client() {
	let (app, client) = DemoApp::start("/").await;

	client.navigator().goto("/f%C3%BCnke").await.unwrap();

	assert_eq!(app.title().as_deref(), Some("I'm afraid I just blue myself"));
}

#[rstest]
#[tokio::test]
async fn test_listeners_do_not_leak_across_navigations() {
	let (app, client) = DemoApp::start("/").await;
	let navigator = client.navigator();
	assert_eq!(app.dom.listener_count(), 1);

	for _ in 0..3 {
		navigator.goto("/about").await.unwrap();
		assert_eq!(app.dom.listener_count(), 0);
		navigator.goto("/").await.unwrap();
		assert_eq!(app.dom.listener_count(), 1);
	}

	let button = app.dom.first_by_tag("button").unwrap();
	assert_eq!(app.dom.dispatch(button, "click"), 1);
	assert_eq!(app.clicks.get(), 1);
}

#[rstest]
#[tokio::test]
async fn test_history_pop_to_redirecting_entry_lands_on_target() {
	let (app, client) = DemoApp::start("/").await;
	let navigator = client.navigator();
	navigator.goto("/redirect-from").await.unwrap();
	navigator.goto("/about").await.unwrap();

	let (state_id, previous) = app.platform.back().unwrap();
	navigator.handle_popstate(state_id, previous).await.unwrap();

	assert_eq!(app.title().as_deref(), Some("redirected"));
	assert!(
		app.platform
			.operations()
			.iter()
			.all(|op| !matches!(op, HistoryOp::Push { url, .. } if url.path() == "/redirect-from"))
	);
}

#[rstest]
#[tokio::test]
async fn test_history_pop_that_redirects_updates_address() {
	let (app, client) = DemoApp::start("/").await;
	let navigator = client.navigator();
	// An entry recorded before the page started redirecting
	app.platform.push_state(99, &url("/redirect-from"));
	navigator.goto("/about").await.unwrap();

	let (state_id, previous) = app.platform.back().unwrap();
	assert_eq!(previous.path(), "/redirect-from");
	let outcome = navigator.handle_popstate(state_id, previous).await.unwrap();

	assert!(matches!(outcome, NavigationOutcome::Committed { url, .. } if url.path() == "/redirect-to"));
	assert_eq!(app.path(), "/redirect-to");
	assert_eq!(app.title().as_deref(), Some("redirected"));
	assert_eq!(navigator.current_entry(), Some(99));
	assert_eq!(
		app.platform.operations().last(),
		Some(&HistoryOp::Replace {
			state_id: 99,
			url: url("/redirect-to"),
		})
	);
	assert!(app.platform.full_loads().is_empty());
}
