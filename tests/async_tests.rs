mod common;

use common::{apply, counter_module, init_logging, logs_for};
use easystore::{
    Action, Actions, HandlerResult, Message, Middleware, Module, Outcome, Produce, State, Store,
    StoreError,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

fn stepper_module() -> Module {
    Module::new("stepper", json!({"count": 0})).action(
        "run",
        Action::asynchronous(|produce, _args, _actions| async move {
            produce.produce(|state| state["count"] = json!(1));
            sleep(Duration::from_millis(10)).await;
            produce.produce(|state| state["count"] = json!(2));
            Ok(json!("finished"))
        }),
    )
}

fn journal_module() -> Module {
    Module::new("journal", json!({"entries": []}))
        .action(
            "note",
            Action::sync(|state, args| {
                let entry = args.first().cloned().unwrap_or(Value::Null);
                state["entries"]
                    .as_array_mut()
                    .ok_or("entries is not a list")?
                    .push(entry);
                Ok(())
            }),
        )
        .action(
            "long",
            Action::asynchronous(|produce, args, _actions| async move {
                let label = args.first().and_then(Value::as_str).unwrap_or("long").to_string();
                let start = format!("{label}-start");
                produce.produce(move |state| push_entry(state, start));
                sleep(Duration::from_millis(30)).await;
                let end = format!("{label}-end");
                produce.produce(move |state| push_entry(state, end));
                Ok(Value::Null)
            }),
        )
}

fn push_entry(state: &mut Value, entry: String) {
    if let Some(entries) = state["entries"].as_array_mut() {
        entries.push(json!(entry));
    }
}

async fn login(produce: Produce, args: Vec<Value>, actions: Actions) -> HandlerResult<Value> {
    let name = args.first().and_then(Value::as_str).ok_or("missing name")?.to_string();
    produce.produce(|state| state["loading"] = json!(true));
    sleep(Duration::from_millis(5)).await;
    actions.call("set_name", vec![json!(name.clone())])?.await?;
    produce.produce(|state| state["loading"] = json!(false));
    Ok(json!({"welcome": name}))
}

fn session_module() -> Module {
    Module::new("session", json!({"name": null, "loading": false}))
        .action(
            "set_name",
            Action::sync(|state, args| {
                state["name"] = args.first().cloned().unwrap_or(Value::Null);
                Ok(())
            }),
        )
        .action("login", Action::asynchronous(login))
        .action(
            "broken",
            Action::asynchronous(|produce, _args, _actions| async move {
                produce.produce(|state| state["loading"] = json!(true));
                Err("backend unavailable".into())
            }),
        )
}

fn store_with(name: &str, modules: Vec<Module>) -> Store {
    Store::builder().name(name).modules(modules).build().unwrap()
}

#[tokio::test]
async fn test_async_mutations_observed_in_order() {
    let store = store_with("async-order", vec![stepper_module()]);
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let _subscription = store.subscribe(move |state: &State| {
        let count = state.get_path("stepper.count").and_then(Value::as_i64);
        sink.lock().unwrap().push(count);
    });

    let value = store.call("stepper/run", vec![]).unwrap().await.unwrap();

    assert_eq!(value, Some(json!("finished")));
    assert_eq!(*seen.lock().unwrap(), vec![Some(1), Some(2)]);
    assert_eq!(store.get_data("stepper.count"), json!(2));
}

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Middleware for Recorder {
    fn before(&self, message: &Message, _state: &State) {
        self.0.lock().unwrap().push(message.type_name("recorded"));
    }
}

fn recorded_store(name: &str, recorder: &Recorder, modules: Vec<Module>) -> Store {
    Store::builder()
        .name(name)
        .middleware(recorder.clone())
        .modules(modules)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_async_start_is_dispatched_when_handler_runs() {
    let recorder = Recorder::default();
    let store = recorded_store("async-start", &recorder, vec![stepper_module()]);

    let outcome = store.call("stepper/run", vec![]).unwrap();
    assert!(matches!(outcome, Outcome::Started(_)));
    assert!(recorder.0.lock().unwrap().is_empty());
    assert_eq!(store.get_data("stepper.count"), json!(0));

    outcome.await.unwrap();
    assert_eq!(
        *recorder.0.lock().unwrap(),
        vec![
            "stepper/run async START",
            "stepper/run async PRODUCE",
            "stepper/run async PRODUCE",
        ]
    );
}

#[tokio::test]
async fn test_dropped_outcome_runs_nothing() {
    let recorder = Recorder::default();
    let store = recorded_store("async-dropped-outcome", &recorder, vec![stepper_module()]);

    drop(store.call("stepper/run", vec![]).unwrap());

    assert!(recorder.0.lock().unwrap().is_empty());
    assert_eq!(store.get_data("stepper.count"), json!(0));
}

fn job_module() -> Module {
    Module::new("job", json!({"step": 0, "result": null}))
        .action(
            "work",
            Action::asynchronous(|produce, _args, _actions| async move {
                sleep(Duration::from_millis(5)).await;
                produce.produce(|state| state["step"] = json!(1));
                Ok(json!("worked"))
            }),
        )
        .action(
            "chain",
            Action::asynchronous(|produce, _args, actions| async move {
                let worked = actions.call("work", vec![])?.await?.unwrap_or(Value::Null);
                produce.produce(move |state| state["result"] = worked);
                Ok(Value::Null)
            }),
        )
}

#[tokio::test]
async fn test_awaited_async_sibling_runs() {
    let recorder = Recorder::default();
    let store = recorded_store("async-chain", &recorder, vec![job_module()]);

    store.call("job/chain", vec![]).unwrap().await.unwrap();

    assert_eq!(store.get_data("job.step"), json!(1));
    assert_eq!(store.get_data("job.result"), json!("worked"));
    assert_eq!(
        *recorder.0.lock().unwrap(),
        vec![
            "job/chain async START",
            "job/work async START",
            "job/work async PRODUCE",
            "job/chain async PRODUCE",
        ]
    );
}

#[tokio::test]
async fn test_outcome_after_store_dropped_errors() {
    let store = store_with("async-outcome-dropped", vec![stepper_module()]);
    let outcome = store.call("stepper/run", vec![]).unwrap();
    drop(store);

    assert!(matches!(outcome.await, Err(StoreError::StoreDropped)));
}

#[tokio::test]
async fn test_async_mutations_interleave_with_other_dispatches() {
    let store = store_with("async-interleave", vec![journal_module()]);

    let long = store.call("journal/long", vec![json!("a")]).unwrap();
    let other = async {
        sleep(Duration::from_millis(10)).await;
        apply(&store, "journal/note", vec![json!("b")]);
    };
    let (result, ()) = tokio::join!(long.into_future(), other);
    result.unwrap();

    assert_eq!(
        store.get_data("journal.entries"),
        json!(["a-start", "b", "a-end"])
    );
}

#[tokio::test]
async fn test_two_async_actions_run_concurrently() {
    let store = store_with("async-concurrent", vec![journal_module()]);

    let first = store.call("journal/long", vec![json!("x")]).unwrap();
    let second = store.call("journal/long", vec![json!("y")]).unwrap();
    let (a, b) = tokio::join!(first.into_future(), second.into_future());
    a.unwrap();
    b.unwrap();

    let entries = store.get_data("journal.entries");
    let entries = entries.as_array().unwrap();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0], json!("x-start"));
    assert_eq!(entries[1], json!("y-start"));
}

#[tokio::test]
async fn test_async_action_calls_sibling_by_name() {
    let store = store_with("async-sibling", vec![session_module()]);

    let value = store
        .call("session/login", vec![json!("ann")])
        .unwrap()
        .await
        .unwrap();

    assert_eq!(value, Some(json!({"welcome": "ann"})));
    assert_eq!(store.get_data("session.name"), json!("ann"));
    assert_eq!(store.get_data("session.loading"), json!(false));
}

#[tokio::test]
async fn test_async_handler_error_propagates() {
    let store = store_with("async-error", vec![session_module()]);

    let err = store.call("session/broken", vec![]).unwrap().await.unwrap_err();
    match err {
        StoreError::Handler { path, source } => {
            assert_eq!(path, "session/broken");
            assert_eq!(source.to_string(), "backend unavailable");
        }
        other => panic!("expected handler error, got {other:?}"),
    }
    // mutations produced before the failure stay applied
    assert_eq!(store.get_data("session.loading"), json!(true));

    let err = store.call("session/login", vec![]).unwrap().await.unwrap_err();
    assert!(err.to_string().contains("missing name"), "{err}");
}

#[tokio::test]
async fn test_async_actions_on_late_registered_module() {
    let store = Store::new();
    store.register(stepper_module()).unwrap();
    store.call("stepper/run", vec![]).unwrap().await.unwrap();
    assert_eq!(store.get_data("stepper.count"), json!(2));
}

#[tokio::test]
async fn test_produce_after_store_dropped_is_ignored() {
    let kept: Arc<Mutex<Option<Produce>>> = Arc::new(Mutex::new(None));
    let slot = kept.clone();
    let module = Module::new("leaky", json!({"n": 0})).action(
        "keep",
        Action::asynchronous(move |produce, _args, _actions| {
            let slot = slot.clone();
            async move {
                *slot.lock().unwrap() = Some(produce);
                Ok(Value::Null)
            }
        }),
    );

    {
        let store = store_with("async-dropped", vec![module]);
        store.call("leaky/keep", vec![]).unwrap().await.unwrap();
    }

    let produce = kept.lock().unwrap().take().unwrap();
    assert_eq!(produce.path(), "leaky/keep");
    // no store to apply to; must not panic
    produce.produce(|state| state["n"] = json!(1));
}

#[tokio::test]
async fn test_sibling_call_after_store_dropped_errors() {
    let kept: Arc<Mutex<Option<Actions>>> = Arc::new(Mutex::new(None));
    let slot = kept.clone();
    let module = counter_module().action(
        "grab",
        Action::asynchronous(move |_produce, _args, actions| {
            let slot = slot.clone();
            async move {
                *slot.lock().unwrap() = Some(actions);
                Ok(Value::Null)
            }
        }),
    );

    {
        let store = store_with("async-actions-dropped", vec![module]);
        store.call("counter/grab", vec![]).unwrap().await.unwrap();

        let actions = kept.lock().unwrap().clone().unwrap();
        assert_eq!(actions.module_id(), "counter");
        let outcome = actions.call("increment", vec![json!(4)]).unwrap();
        assert!(matches!(outcome, Outcome::Applied));
        assert_eq!(store.get_data("counter.count"), json!(4));
    }

    let actions = kept.lock().unwrap().take().unwrap();
    assert!(matches!(
        actions.call("increment", vec![]),
        Err(StoreError::StoreDropped)
    ));
}

#[tokio::test]
async fn test_start_marker_logged_in_debug_mode() {
    init_logging();
    let store = Store::builder()
        .name("async-debug")
        .debug(true)
        .module(stepper_module())
        .build()
        .unwrap();

    store.call("stepper/run", vec![]).unwrap().await.unwrap();

    let logs = logs_for("async-debug");
    assert!(
        logs.iter()
            .any(|(_, line)| line.contains("stepper/run async START")),
        "{logs:?}"
    );
    assert!(
        logs.iter()
            .any(|(_, line)| line.contains("action stepper/run async PRODUCE next state")),
        "{logs:?}"
    );
}
