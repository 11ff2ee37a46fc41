use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::join_all;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use quill_editor::{RoundOutcome, StateScheduler};
use quill_primitives::{ChangeNotifier, Document, DocumentExt};
use quill_registry::{SimpleExtension, StateQueryDef, StateQueryMap};
use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::common::fixture;

#[tokio::test]
async fn notifier_reruns_queries_and_publishes() {
	let fx = fixture("");
	let flag = Arc::new(AtomicBool::new(false));
	let notifier = ChangeNotifier::new();
	let read = Arc::clone(&flag);
	let bold = SimpleExtension::new("bold")
		.state_query(StateQueryDef::new("bold.active", move || read.load(Ordering::SeqCst)))
		.notifier(notifier.clone())
		.build();

	let mut rx = fx.session.subscribe_state();
	fx.session.mount(vec![bold]).unwrap();
	rx.changed().await.unwrap();
	assert_eq!(rx.borrow_and_update().get("bold.active"), Some(&false));

	flag.store(true, Ordering::SeqCst);
	notifier.notify();
	rx.changed().await.unwrap();
	assert_eq!(rx.borrow_and_update().get("bold.active"), Some(&true));
	assert!(fx.session.ui_context().unwrap().is_active("bold.active"));
}

#[tokio::test]
async fn document_transactions_rerun_queries() {
	let fx = fixture("");
	let document = Arc::clone(&fx.document);
	let empty = SimpleExtension::new("doc")
		.state_query(StateQueryDef::new("doc.empty", move || document.read().text_content().is_empty()))
		.build();

	let mut rx = fx.session.subscribe_state();
	fx.session.mount(vec![empty]).unwrap();
	rx.changed().await.unwrap();
	assert_eq!(rx.borrow_and_update().get("doc.empty"), Some(&true));

	fx.document.edit(|state| state.type_text("x")).unwrap();
	rx.changed().await.unwrap();
	assert_eq!(rx.borrow_and_update().get("doc.empty"), Some(&false));
}

#[tokio::test]
async fn failing_queries_degrade_to_false() {
	let fx = fixture("");
	let flaky = SimpleExtension::new("flaky")
		.state_query(StateQueryDef::fallible("flaky.remote", || Err(anyhow::anyhow!("timeout"))))
		.state_query(StateQueryDef::new("flaky.local", || true))
		.build();
	fx.session.mount(vec![flaky]).unwrap();

	assert_eq!(fx.session.scheduler().trigger().await.unwrap(), RoundOutcome::Published);
	let snapshot = fx.session.snapshot();
	assert_eq!(snapshot.get("flaky.remote"), Some(&false));
	assert_eq!(snapshot.get("flaky.local"), Some(&true));
}

#[tokio::test]
async fn unmount_clears_the_snapshot_and_detaches_watchers() {
	let fx = fixture("");
	let notifier = ChangeNotifier::new();
	let ext = SimpleExtension::new("x")
		.state_query(StateQueryDef::new("x.on", || true))
		.notifier(notifier.clone())
		.build();
	fx.session.mount(vec![ext]).unwrap();
	fx.session.scheduler().trigger().await.unwrap();
	assert_eq!(fx.session.snapshot().len(), 1);
	assert_eq!(notifier.listener_count(), 1);

	let listeners = fx.document.listener_count();
	fx.session.unmount();
	assert!(fx.session.snapshot().is_empty());
	assert_eq!(notifier.listener_count(), 0);
	assert!(fx.document.listener_count() < listeners);
}

type Gates = Arc<Mutex<VecDeque<oneshot::Receiver<bool>>>>;

fn race_case() -> impl Strategy<Value = (Vec<bool>, Vec<usize>)> {
	(1usize..6).prop_flat_map(|n| {
		(
			prop::collection::vec(any::<bool>(), n),
			Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
		)
	})
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(64))]

	#[test]
	fn only_the_latest_round_publishes((values, order) in race_case()) {
		let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
		runtime.block_on(async {
			let scheduler = StateScheduler::new(Handle::current());
			let gates: Gates = Arc::default();
			let queue = Arc::clone(&gates);
			let query = StateQueryDef::new_async("q", move || {
				let gate = queue.lock().pop_front();
				async move {
					match gate {
						Some(gate) => anyhow::Ok(gate.await?),
						None => Ok(false),
					}
				}
			});
			let initial = scheduler.set_queries(StateQueryMap::from_defs("race", [query])).await.unwrap();
			assert_eq!(initial, RoundOutcome::Published);

			let mut senders = Vec::new();
			let mut rounds = Vec::new();
			for _ in &values {
				let (tx, rx) = oneshot::channel();
				gates.lock().push_back(rx);
				senders.push(Some(tx));
				rounds.push(scheduler.trigger());
			}
			for &i in &order {
				senders[i].take().unwrap().send(values[i]).unwrap();
				tokio::task::yield_now().await;
			}

			let outcomes: Vec<RoundOutcome> = join_all(rounds).await.into_iter().map(Result::unwrap).collect();
			let (last, older) = outcomes.split_last().unwrap();
			assert!(older.iter().all(|outcome| *outcome == RoundOutcome::Stale), "{outcomes:?}");
			let latest = *values.last().unwrap();
			let expected = if latest { RoundOutcome::Published } else { RoundOutcome::Unchanged };
			assert_eq!(*last, expected);
			assert_eq!(scheduler.snapshot().get("q"), Some(&latest));
		});
	}
}
