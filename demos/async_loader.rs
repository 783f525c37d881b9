//! An async action reporting progress through incremental mutations.

use easystore::{Action, Module, State, Store};
use serde_json::{Value, json};
use std::time::Duration;

fn loader() -> Module {
    Module::new("loader", json!({"status": "idle", "progress": 0, "items": []})).action(
        "fetch",
        Action::asynchronous(|produce, args, _actions| async move {
            let pages = args.first().and_then(Value::as_u64).unwrap_or(3);
            produce.produce(|state| state["status"] = json!("loading"));
            for page in 1..=pages {
                tokio::time::sleep(Duration::from_millis(20)).await;
                produce.produce(move |state| {
                    if let Some(items) = state["items"].as_array_mut() {
                        items.push(json!(format!("page {page}")));
                    }
                    state["progress"] = json!(page * 100 / pages);
                });
            }
            produce.produce(|state| state["status"] = json!("done"));
            Ok(json!(pages))
        }),
    )
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::builder().name("loader-demo").module(loader()).build()?;

    let _progress = store.subscribe(|state: &State| {
        let status = state.get_path("loader.status").cloned().unwrap_or(Value::Null);
        let progress = state.get_path("loader.progress").cloned().unwrap_or(Value::Null);
        println!("{status} {progress}%");
    });

    let pages = store.call("loader/fetch", vec![json!(4)])?.await?;
    println!("fetched {:?} pages: {}", pages, store.get_data("loader.items"));
    Ok(())
}
