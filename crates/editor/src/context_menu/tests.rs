use std::sync::atomic::AtomicUsize;

use pretty_assertions::assert_eq;
use quill_primitives::{ElementId, GridViewport};
use quill_registry::{CommandDef, ExtensionSet, FnProvider, SimpleExtension};
use serde_json::json;

use super::*;

fn resolver() -> (ContextMenuResolver, Arc<GridViewport>) {
	let viewport = Arc::new(GridViewport::default());
	let resolver = ContextMenuResolver::new(viewport.clone(), ContextMenuConfig::default());
	(resolver, viewport)
}

fn provider(id: &str, priority: i32, label: &'static str) -> Arc<dyn ContextMenuProvider> {
	FnProvider::new(id, priority, |_| true, move |_| vec![MenuItem::command(label, label, "noop")]).into_arc()
}

fn right_click(x: f32, y: f32) -> PointerEvent {
	PointerEvent::at(Point::new(x, y))
}

fn labels(resolver: &ContextMenuResolver) -> Vec<String> {
	resolver
		.open_menu()
		.map(|menu| menu.items.iter().map(|item| item.label.to_string()).collect())
		.unwrap_or_default()
}

#[test]
fn highest_priority_claimant_wins() {
	let (resolver, _) = resolver();
	let _low = resolver.register_provider(provider("low", 1, "from-low"));
	let _high = resolver.register_provider(provider("high", 10, "from-high"));

	assert!(resolver.handle_pointer_event(&right_click(10.0, 10.0), &EditorState::new()));
	assert_eq!(labels(&resolver), vec!["from-high"]);
	assert_eq!(resolver.open_menu().unwrap().provider.as_deref(), Some("high"));
}

#[test]
fn priority_ties_keep_registration_order() {
	let (resolver, _) = resolver();
	let _a = resolver.register_provider(provider("a", 5, "a"));
	let _b = resolver.register_provider(provider("b", 5, "b"));
	let _c = resolver.register_provider(provider("c", 7, "c"));
	let ids: Vec<_> = resolver.providers().iter().map(|p| p.id().to_owned()).collect();
	assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn unclaimed_or_empty_events_open_nothing() {
	let (resolver, _) = resolver();
	let _never = resolver.register_provider(FnProvider::new("never", 10, |_| false, |_| Vec::new()).into_arc());
	assert!(!resolver.handle_pointer_event(&right_click(1.0, 1.0), &EditorState::new()));

	let _empty = resolver.register_provider(FnProvider::new("empty", 5, |_| true, |_| Vec::new()).into_arc());
	let _fallback = resolver.register_provider(provider("fallback", 1, "fallback"));
	assert!(!resolver.handle_pointer_event(&right_click(1.0, 1.0), &EditorState::new()));
	assert!(!resolver.is_open());
}

#[test]
fn providers_see_target_and_selection() {
	let (resolver, _) = resolver();
	let _cells = resolver.register_provider(
		FnProvider::new(
			"cells",
			0,
			|req| req.target() == Some(ElementId(7)) && req.selection().is_some(),
			|_| vec![MenuItem::command("row", "Insert row", "table.row")],
		)
		.into_arc(),
	);

	let mut state = EditorState::new();
	let key = state.push_text("cell");
	assert!(!resolver.handle_pointer_event(&right_click(0.0, 0.0).on_element(ElementId(7)), &state));
	state.set_caret(key, 1).unwrap();
	assert!(!resolver.handle_pointer_event(&right_click(0.0, 0.0), &state));
	assert!(resolver.handle_pointer_event(&right_click(0.0, 0.0).on_element(ElementId(7)), &state));
}

#[test]
fn re_registering_an_id_replaces_and_stale_teardown_is_ignored() {
	let (resolver, _) = resolver();
	let first = resolver.register_provider(provider("table", 1, "old"));
	let _second = resolver.register_provider(provider("table", 1, "new"));
	assert_eq!(resolver.provider_count(), 1);

	first.cancel();
	assert_eq!(resolver.provider_count(), 1);
	resolver.handle_pointer_event(&right_click(0.0, 0.0), &EditorState::new());
	assert_eq!(labels(&resolver), vec!["new"]);

	assert!(resolver.unregister_provider("table"));
	assert!(!resolver.unregister_provider("table"));
}

#[test]
fn menu_is_clamped_into_viewport() {
	let (resolver, _) = resolver();
	let items = vec![MenuItem::command("a", "A", "a"), MenuItem::command("b", "B", "b")];
	assert!(resolver.show(MenuConfig::at(Point::new(1000.0, 760.0), items)));

	let menu = resolver.open_menu().unwrap();
	assert_eq!(menu.rect, Rect::new(804.0, 712.0, 220.0, 56.0));
	assert_eq!(menu.position, Point::new(804.0, 712.0));
}

#[test]
fn click_outside_and_escape_dismiss() {
	let (resolver, _) = resolver();
	let item = || vec![MenuItem::command("a", "A", "a")];
	resolver.show(MenuConfig::at(Point::new(100.0, 100.0), item()));

	assert!(!resolver.handle_click(Point::new(150.0, 110.0)));
	assert!(resolver.is_open());
	assert!(resolver.handle_click(Point::new(50.0, 50.0)));
	assert!(!resolver.is_open());

	resolver.show(MenuConfig::at(Point::new(100.0, 100.0), item()));
	assert!(!resolver.handle_key("Enter"));
	assert!(resolver.handle_key("Escape"));
	assert!(!resolver.handle_key("Escape"));
}

#[test]
fn hide_twice_notifies_once() {
	let (resolver, _) = resolver();
	let events = Arc::new(Mutex::new(Vec::new()));
	let log = Arc::clone(&events);
	let _sub = resolver.subscribe(move |event| {
		log.lock().push(match event {
			MenuEvent::Opened(_) => "opened".to_owned(),
			MenuEvent::Moved(_) => "moved".to_owned(),
			MenuEvent::Closed(reason) => format!("closed:{reason:?}"),
		});
	});

	resolver.show(MenuConfig::at(Point::new(0.0, 0.0), vec![MenuItem::command("a", "A", "a")]));
	assert!(resolver.hide());
	assert!(!resolver.hide());
	assert_eq!(*events.lock(), vec!["opened", "closed:Hidden"]);
}

#[test]
fn anchored_menu_follows_element_and_closes_when_detached() {
	let (resolver, viewport) = resolver();
	let cell = ElementId(3);
	viewport.set_element(cell, Rect::new(100.0, 200.0, 80.0, 24.0));
	let _table = resolver.register_provider(
		FnProvider::new(
			"table",
			10,
			|req| req.target() == Some(ElementId(3)),
			|_| vec![MenuItem::command("row", "Insert row", "table.row")],
		)
		.with_anchor(|req| req.target().map(|el| MenuAnchor::new(el, 0.0, 24.0)))
		.into_arc(),
	);

	let event = right_click(500.0, 500.0).on_element(cell);
	assert!(resolver.handle_pointer_event(&event, &EditorState::new()));
	assert_eq!(resolver.open_menu().unwrap().position, Point::new(100.0, 224.0));

	viewport.scroll_by(50.0);
	resolver.reposition();
	assert_eq!(resolver.open_menu().unwrap().position, Point::new(100.0, 174.0));

	viewport.remove_element(cell);
	resolver.reposition();
	assert!(!resolver.is_open());

	assert!(!resolver.handle_pointer_event(&event, &EditorState::new()));
}

#[tokio::test]
async fn activation_dispatches_commands_and_callbacks() {
	let (resolver, _) = resolver();
	let set = ExtensionSet::compose(vec![
		SimpleExtension::new("table")
			.command(CommandDef::new("table.row", |args| Ok(json!({ "inserted": args }))))
			.build(),
	])
	.unwrap();
	resolver.set_commands(set.commands().clone());

	resolver.show(MenuConfig::at(
		Point::new(0.0, 0.0),
		vec![MenuItem::command("row", "Insert row", "table.row").with_args(json!(2))],
	));
	match resolver.activate("row").unwrap() {
		Activation::Command(pending) => assert_eq!(pending.await.unwrap(), json!({ "inserted": 2 })),
		Activation::Callback => panic!("expected a command"),
	}
	assert!(!resolver.is_open());

	let hits = Arc::new(AtomicUsize::new(0));
	let counter = Arc::clone(&hits);
	resolver.show(MenuConfig::at(
		Point::new(0.0, 0.0),
		vec![
			MenuItem::callback("copy", "Copy", move || {
				counter.fetch_add(1, Ordering::SeqCst);
			}),
			MenuItem::command("cut", "Cut", "cut").disabled(true),
		],
	));
	assert!(matches!(resolver.activate("cut"), Err(SessionError::DisabledMenuItem(_))));
	assert!(matches!(resolver.activate("paste"), Err(SessionError::UnknownMenuItem(_))));
	assert!(matches!(resolver.activate("copy"), Ok(Activation::Callback)));
	assert_eq!(hits.load(Ordering::SeqCst), 1);
	assert!(matches!(resolver.activate("copy"), Err(SessionError::UnknownMenuItem(_))));
}
