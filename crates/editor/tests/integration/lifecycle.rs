use pretty_assertions::assert_eq;
use quill_editor::{SessionConfig, SessionError};
use quill_primitives::Subscription;
use quill_registry::{
	CommandDef, DuplicatePolicy, ExtensionConfig, ExtensionError, Fragment, FragmentSlot, KeyKind, RegistryError,
	SimpleExtension,
};
use serde_json::{Value, json};

use crate::common::{entries, failing, fixture, fixture_with, log, recorder, recorder_builder};

#[tokio::test]
async fn hooks_run_by_priority_and_tear_down_in_reverse() {
	let fx = fixture("");
	let log = log();
	fx.session
		.mount(vec![recorder("a", 0, &log), recorder("b", 5, &log), recorder("c", 0, &log)])
		.unwrap();
	assert_eq!(fx.session.extension_ids(), ["a", "b", "c"]);
	assert_eq!(fx.session.registration_order(), ["b", "a", "c"]);

	fx.session.unmount();
	assert_eq!(
		entries(&log),
		["register:b", "register:a", "register:c", "teardown:c", "teardown:a", "teardown:b"]
	);
	assert!(!fx.session.is_mounted());

	fx.session.unmount();
	assert_eq!(entries(&log).len(), 6);
}

#[tokio::test]
async fn every_change_tears_down_before_registering_again() {
	let fx = fixture("");
	let log = log();
	fx.session.mount(vec![recorder("a", 0, &log), recorder("b", 0, &log)]).unwrap();
	fx.session.register_extension(recorder("c", 0, &log)).unwrap();
	fx.session.unregister_extension("a").unwrap();
	drop(fx.session);

	assert_eq!(
		entries(&log),
		[
			"register:a",
			"register:b",
			"teardown:b",
			"teardown:a",
			"register:a",
			"register:b",
			"register:c",
			"teardown:c",
			"teardown:b",
			"teardown:a",
			"register:b",
			"register:c",
			"teardown:c",
			"teardown:b",
		]
	);
}

#[tokio::test]
async fn failing_hook_aborts_mount_and_releases_earlier_registrations() {
	let fx = fixture("");
	let log = log();
	let err = fx
		.session
		.mount(vec![recorder("a", 10, &log), failing("broken", 5), recorder("c", 0, &log)])
		.unwrap_err();

	assert!(
		matches!(err, SessionError::Extension(ExtensionError::Registration { ref id, .. }) if id == "broken"),
		"{err}"
	);
	assert_eq!(entries(&log), ["register:a", "teardown:a"]);
	assert!(!fx.session.is_mounted());
	assert!(fx.session.ui_context().is_none());
}

#[tokio::test]
async fn reorder_requires_a_permutation_of_mounted_ids() {
	let fx = fixture("");
	let log = log();
	fx.session
		.mount(vec![recorder("a", 0, &log), recorder("b", 0, &log), recorder("c", 0, &log)])
		.unwrap();

	fx.session.reorder(&["c", "a", "b"]).unwrap();
	assert_eq!(fx.session.extension_ids(), ["c", "a", "b"]);
	assert_eq!(fx.session.registration_order(), ["c", "a", "b"]);

	for bad in [&["c", "a"][..], &["c", "a", "a"][..], &["c", "a", "z"][..]] {
		let err = fx.session.reorder(bad).unwrap_err();
		assert!(matches!(err, SessionError::InvalidOrder { .. }), "{err}");
	}
	assert_eq!(fx.session.extension_ids(), ["c", "a", "b"]);
}

#[tokio::test]
async fn unknown_ids_are_reported() {
	let fx = fixture("");
	fx.session.mount(vec![recorder("a", 0, &log())]).unwrap();

	assert!(matches!(
		fx.session.unregister_extension("zzz"),
		Err(SessionError::Registry(RegistryError::UnknownExtension(id))) if id == "zzz"
	));
	assert!(matches!(
		fx.session.configure_extension("zzz", ExtensionConfig::new()),
		Err(SessionError::Registry(RegistryError::UnknownExtension(_)))
	));
}

#[tokio::test]
async fn configure_replaces_config_and_remounts() {
	let fx = fixture("");
	let seen = log();
	let recorder = {
		let seen = seen.clone();
		SimpleExtension::new("tables")
			.with_config(ExtensionConfig::new().with("rows", 3).with("header", true))
			.on_register(move |cx| {
				seen.lock().push(format!("{:?}", cx.config().get_u64("rows")));
				Ok(Subscription::noop())
			})
			.build()
	};
	fx.session.mount(vec![recorder]).unwrap();
	fx.session
		.configure_extension("tables", ExtensionConfig::new().with("rows", 8))
		.unwrap();

	assert_eq!(entries(&seen), ["Some(3)", "Some(8)"]);
	let ext = fx.session.extensions().remove(0);
	assert_eq!(ext.config().get_bool("header"), None);
}

#[tokio::test]
async fn file_config_is_applied_before_mount() {
	let config = SessionConfig::from_toml_str(
		r#"
		[extensions.tables]
		rows = 4
		"#,
	)
	.unwrap();
	let fx = fixture_with("", config);
	let ext = SimpleExtension::new("tables").build();
	fx.session.mount(vec![ext.clone()]).unwrap();
	assert_eq!(ext.config().get_u64("rows"), Some(4));
}

fn echo(id: &'static str) -> SimpleExtension {
	SimpleExtension::new(id).command(CommandDef::new("shared.echo", move |_| Ok(json!(id))))
}

#[tokio::test]
async fn later_contribution_wins_and_collision_is_visible() {
	let fx = fixture("");
	fx.session.mount(vec![echo("first").build(), echo("second").build()]).unwrap();

	assert_eq!(fx.session.execute("shared.echo", Value::Null).await.unwrap(), json!("second"));
	let collisions = fx.session.collisions();
	assert_eq!(collisions.len(), 1);
	assert_eq!(collisions[0].kind, KeyKind::Command);
	assert_eq!(collisions[0].winner(), "second");
}

#[tokio::test]
async fn reject_policy_from_config_keeps_current_composition() {
	let config = SessionConfig::from_toml_str("[composition]\nduplicate_policy = \"reject\"\n").unwrap();
	assert_eq!(config.composition.duplicate_policy, DuplicatePolicy::Reject);
	let fx = fixture_with("", config);
	let log = log();
	fx.session.mount(vec![echo("first").build(), recorder("other", 0, &log)]).unwrap();

	let err = fx.session.register_extension(echo("second").build()).unwrap_err();
	assert!(matches!(err, SessionError::Registry(RegistryError::KeyCollision { .. })), "{err}");
	assert_eq!(fx.session.extension_ids(), ["first", "other"]);
	assert_eq!(entries(&log), ["register:other"]);
}

#[tokio::test]
async fn ui_context_lives_exactly_as_long_as_the_mount() {
	let fx = fixture("");
	assert!(fx.session.ui_context().is_none());

	let log = log();
	let toolbar = recorder_builder("toolbar", 0, &log)
		.fragment(Fragment::new("toolbar", FragmentSlot::Toolbar))
		.command(CommandDef::new("toolbar.ping", |_| Ok(json!("pong"))))
		.build();
	fx.session.mount(vec![toolbar]).unwrap();

	let ui = fx.session.ui_context().unwrap();
	assert_eq!(ui.fragments().len(), 1);
	assert_eq!(&*ui.fragments()[0].owner, "toolbar");
	assert_eq!(ui.execute("toolbar.ping", Value::Null).await.unwrap(), json!("pong"));

	fx.session.unmount();
	assert!(fx.session.ui_context().is_none());
	assert!(fx.session.commands().is_empty());
}
