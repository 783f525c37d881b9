#![allow(dead_code)]

use easystore::{Action, HandlerResult, Module, Outcome, Store};
use log::{Level, LevelFilter, Log, Metadata, Record};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::{Mutex, Once};

/// Call a sync action and check that it ran.
pub fn apply(store: &Store, path: &str, args: Vec<Value>) {
    let outcome = store.call(path, args).unwrap();
    assert!(matches!(outcome, Outcome::Applied), "{path}: {outcome:?}");
}

pub fn counter_module() -> Module {
    Module::new("counter", json!({"count": 0}))
        .action("increment", Action::sync(increment))
        .action(
            "reset",
            Action::sync(|state, _args| {
                state["count"] = json!(0);
                Ok(())
            }),
        )
        .action(
            "fail",
            Action::sync(|state, _args| {
                state["count"] = json!(-1);
                Err("counter refused".into())
            }),
        )
}

fn increment(state: &mut Value, args: &[Value]) -> HandlerResult {
    let by = args.first().and_then(Value::as_i64).unwrap_or(1);
    let count = state["count"].as_i64().unwrap_or(0);
    state["count"] = json!(count + by);
    Ok(())
}

#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TodoState {
    pub items: Vec<TodoItem>,
    pub next_id: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: u64,
    pub text: String,
    pub done: bool,
}

pub fn todo_module() -> Module {
    Module::from_state("todos", &TodoState::default())
        .unwrap()
        .action(
            "add",
            Action::sync(|state, args| {
                let text = args.first().and_then(Value::as_str).ok_or("missing text")?;
                let id = state["next_id"].as_u64().unwrap_or(0);
                let items = state["items"].as_array_mut().ok_or("items is not a list")?;
                items.push(json!({"id": id, "text": text, "done": false}));
                state["next_id"] = json!(id + 1);
                Ok(())
            }),
        )
        .action(
            "complete",
            Action::sync(|state, args| {
                let id = args.first().and_then(Value::as_u64).ok_or("missing id")?;
                if let Some(items) = state["items"].as_array_mut() {
                    for item in items.iter_mut().filter(|item| item["id"] == id) {
                        item["done"] = json!(true);
                    }
                }
                Ok(())
            }),
        )
}

pub fn counter_store(name: &str) -> Store {
    Store::builder()
        .name(name)
        .module(counter_module())
        .module(todo_module())
        .build()
        .unwrap()
}

struct CaptureLogger;

static LOGGER: CaptureLogger = CaptureLogger;
static RECORDS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

/// Route `log` output into memory. Safe to call from every test.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&LOGGER).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Captured log lines of the store called `name`.
pub fn logs_for(name: &str) -> Vec<(Level, String)> {
    let prefix = format!("[{name}]");
    RECORDS
        .lock()
        .unwrap()
        .iter()
        .filter(|(_, line)| line.starts_with(&prefix))
        .cloned()
        .collect()
}
