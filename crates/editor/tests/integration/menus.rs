use std::sync::Arc;

use pretty_assertions::assert_eq;
use quill_editor::{Activation, CloseReason, ContextMenuExtension, MenuEvent};
use quill_primitives::{ElementId, Point, Rect};
use quill_registry::{
	CommandDef, ContextMenuProvider, Extension, FnProvider, MenuAnchor, MenuItem, PointerEvent, SimpleExtension,
};
use serde_json::{Value, json};

use crate::common::{entries, fixture, log};

const ROW: ElementId = ElementId(1);

fn table_extension() -> Arc<dyn Extension> {
	SimpleExtension::new("table")
		.command(CommandDef::new("table.delete_row", |args| Ok(json!({ "deleted": args["row"] }))))
		.build()
}

fn row_provider() -> Arc<dyn ContextMenuProvider> {
	FnProvider::new(
		"table-row",
		10,
		|req| req.target() == Some(ROW),
		|_| {
			vec![
				MenuItem::command("delete", "Delete row", "table.delete_row").with_args(json!({ "row": 2 })),
				MenuItem::command("close", "Close", "context_menu.hide"),
			]
		},
	)
	.with_anchor(|_| Some(MenuAnchor::new(ROW, 0.0, 24.0)))
	.into_arc()
}

fn right_click(target: Option<ElementId>) -> PointerEvent {
	let event = PointerEvent::at(Point::new(300.0, 300.0));
	match target {
		Some(target) => event.on_element(target),
		None => event,
	}
}

#[tokio::test]
async fn providers_register_on_mount_and_leave_on_unmount() {
	let fx = fixture("");
	let menus = fx.session.menus().clone();
	let ext: Arc<dyn Extension> = Arc::new(ContextMenuExtension::new(&menus).with_provider(row_provider()));
	fx.session.mount(vec![table_extension(), ext]).unwrap();
	assert_eq!(menus.provider_count(), 1);

	fx.session.unmount();
	assert_eq!(menus.provider_count(), 0);
	assert!(!fx.session.handle_pointer_event(&right_click(Some(ROW))));
}

#[tokio::test]
async fn claimed_event_opens_anchored_menu_and_activation_dispatches() {
	let fx = fixture("");
	fx.viewport.set_element(ROW, Rect::new(100.0, 200.0, 400.0, 24.0));
	let menus = fx.session.menus().clone();
	let ext: Arc<dyn Extension> = Arc::new(ContextMenuExtension::new(&menus).with_provider(row_provider()));
	fx.session.mount(vec![table_extension(), ext]).unwrap();

	assert!(!fx.session.handle_pointer_event(&right_click(None)));
	assert!(fx.session.handle_pointer_event(&right_click(Some(ROW))));
	let open = menus.open_menu().unwrap();
	assert_eq!(open.position, Point::new(100.0, 224.0));
	assert_eq!(open.provider.as_deref(), Some("table-row"));

	fx.session.scheduler().trigger().await.unwrap();
	assert_eq!(fx.session.snapshot().get("context_menu.open"), Some(&true));

	match menus.activate("delete").unwrap() {
		Activation::Command(pending) => assert_eq!(pending.await.unwrap(), json!({ "deleted": 2 })),
		Activation::Callback => panic!("expected a command item"),
	}
	assert!(!menus.is_open());
}

#[tokio::test]
async fn hide_command_and_listener_events() {
	let fx = fixture("");
	fx.viewport.set_element(ROW, Rect::new(0.0, 0.0, 100.0, 20.0));
	let menus = fx.session.menus().clone();
	let events = log();
	let sink = events.clone();
	let _listener = menus.subscribe(move |event| {
		let name = match event {
			MenuEvent::Opened(_) => "opened".to_owned(),
			MenuEvent::Moved(_) => "moved".to_owned(),
			MenuEvent::Closed(reason) => format!("closed:{reason:?}"),
		};
		sink.lock().push(name);
	});
	let ext: Arc<dyn Extension> = Arc::new(ContextMenuExtension::new(&menus).with_provider(row_provider()));
	fx.session.mount(vec![ext]).unwrap();

	assert!(fx.session.handle_pointer_event(&right_click(Some(ROW))));
	assert_eq!(fx.session.execute("context_menu.hide", Value::Null).await.unwrap(), json!(true));
	assert_eq!(fx.session.execute("context_menu.hide", Value::Null).await.unwrap(), json!(false));

	assert!(fx.session.handle_pointer_event(&right_click(Some(ROW))));
	fx.viewport.remove_element(ROW);
	menus.reposition();

	assert_eq!(
		entries(&events),
		[
			"opened".to_owned(),
			format!("closed:{:?}", CloseReason::Hidden),
			"opened".to_owned(),
			format!("closed:{:?}", CloseReason::AnchorDisconnected),
		]
	);
}
