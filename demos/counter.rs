//! Minimal counter: the "hello world" of easystore.

use easystore::{Action, Module, Store};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let counter = Module::new("counter", json!({"count": 0}))
        .action(
            "increment",
            Action::sync(|state, args| {
                let by = args.first().and_then(|v| v.as_i64()).unwrap_or(1);
                state["count"] = json!(state["count"].as_i64().unwrap_or(0) + by);
                Ok(())
            }),
        )
        .action(
            "reset",
            Action::sync(|state, _args| {
                state["count"] = json!(0);
                Ok(())
            }),
        );

    let store = Store::builder().name("demo").module(counter).build()?;

    let count = store.use_data("counter.count");
    let outcome = store.call("counter/increment", vec![])?;
    println!("first increment: {outcome:?}");
    let _ = store.call("counter/increment", vec![json!(5)])?;
    println!("count = {} ({} changes)", count.get(), count.changes());

    let _ = store.call("counter/reset", vec![])?;
    println!("after reset: {}", store.get_data("counter.count"));

    // typos are logged, not fatal
    let outcome = store.call("counter/incremnet", vec![])?;
    println!("typo found an action: {}", outcome.is_found());

    // modules can join a live store
    store.register(Module::new("user", json!({"name": "ann"})))?;
    println!("user = {}", store.get_data("user.name"));

    Ok(())
}
