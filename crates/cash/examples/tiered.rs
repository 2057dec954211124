//! A bounded LRU tier in front of a concurrent map tier.
//!
//! Run with `CASH_LOG_LEVEL=debug` to watch the tier walk.

use std::sync::Arc;

use cash::backends::{LruBackend, MapBackend};
use cash::{Backend, Cash, CashError};
use cash_common_config::Environment;
use cash_common_log::LogConfig;

fn show(v: &str, result: Result<(), CashError>) {
    match result {
        Ok(()) => println!("v = {:?}, err = <nil>", v),
        Err(e) => println!("v = {:?}, err = {}", v, e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    Environment::init()?;
    cash_common_log::init(LogConfig::from_env())?;

    let lru = Arc::new(LruBackend::new(3)?);
    let cash = Cash::builder()
        .shared_backend(lru.clone())
        .backend(MapBackend::new())
        .build();

    match cash.delete("testing").await {
        Ok(()) => println!("err = <nil>"),
        Err(e) => println!("err = {}", e),
    }

    let mut v = String::new();
    let result = cash.load("testing", &mut v).await;
    show(&v, result);

    let mut v = String::new();
    let result = cash
        .load_or_store("testing", &mut v, || async { Ok::<_, CashError>("hi".to_string()) })
        .await;
    show(&v, result);

    // Remove it from the first tier only; the map tier still answers.
    lru.delete("testing").await?;
    let mut v = String::new();
    let result = cash.load("testing", &mut v).await;
    show(&v, result);

    Ok(())
}
