//! # Example: Mailbox actor on two backends
//!
//! A producer drops messages into a shared mailbox; the consumer never blocks,
//! it polls the mailbox with `await_result` on the context's own tick.
//!
//! Run with: `cargo run --example mailbox --features logging`

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use platctx::{
    ContextConfig, LogWriter, Platform, Subscribe, TaskError, TokioHost, flag_request,
};

type Mailbox = Arc<Mutex<VecDeque<String>>>;

/// Waits for the next message and re-arms itself until `stop` is seen.
fn consume(platform: Platform, mailbox: Mailbox, done: Arc<AtomicBool>) -> anyhow::Result<()> {
    let inbox = Arc::clone(&mailbox);
    let next = platform.clone();
    platform.await_result(
        move |msg: String| {
            println!("[consumer] got {msg:?}");
            if msg == "stop" {
                done.store(true, Ordering::SeqCst);
                return;
            }
            if let Err(e) = consume(next, mailbox, done) {
                eprintln!("[consumer] cannot re-arm: {e}");
            }
        },
        move || inbox.lock().pop_front(),
    )?;
    Ok(())
}

async fn run(platform: Platform, label: &str) -> anyhow::Result<()> {
    println!("=== {label} ({:?}) ===", platform.platform());
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter)];
    let listener = platform.attach(subs);

    let mailbox: Mailbox = Arc::new(Mutex::new(VecDeque::new()));
    let done = Arc::new(AtomicBool::new(false));
    consume(platform.clone(), Arc::clone(&mailbox), Arc::clone(&done))?;

    for (i, msg) in ["hello", "world", "stop"].into_iter().enumerate() {
        let mailbox = Arc::clone(&mailbox);
        platform.delayed(
            move || {
                mailbox.lock().push_back(msg.to_string());
                Ok(())
            },
            Duration::from_millis(30 * (i as u64 + 1)),
        )?;
    }

    // Reported through the failure hook, not to the caller.
    platform.delayed(|| Err(TaskError::fail("sensor offline")), Duration::from_millis(10))?;

    let answer = platform.future(|| Ok::<_, TaskError>(6 * 7)).await?;
    println!("[future] answer = {answer}");

    platform
        .wait_for_exit(false, Duration::from_millis(20), flag_request(done))
        .await?;
    listener.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = ContextConfig::default();

    run(Platform::cooperative(TokioHost::current()?, cfg.clone()), "cooperative").await?;
    run(Platform::threaded(cfg)?, "threaded").await?;
    Ok(())
}
