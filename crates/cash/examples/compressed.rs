//! Values deflated before they reach the tier.

use cash::backends::LruBackend;
use cash::{Cash, CashError, DeflateCodec};
use cash_common_config::Environment;
use cash_common_log::LogConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    Environment::init()?;
    cash_common_log::init(LogConfig::from_env())?;

    let cash = Cash::builder()
        .codec(DeflateCodec::new())
        .backend(LruBackend::new(3)?)
        .build();

    cash.delete("testing").await?;
    println!("err = <nil>");

    let mut v = String::new();
    match cash.load("testing", &mut v).await {
        Ok(()) => println!("v = {:?}, err = <nil>", v),
        Err(e) => println!("v = {:?}, err = {}", v, e),
    }

    cash.load_or_store("testing", &mut v, || async { Ok::<_, CashError>("hi".to_string()) })
        .await?;
    println!("v = {:?}, err = <nil>", v);

    let stored: String = cash.get("testing").await?;
    println!("v = {:?}, err = <nil>", stored);

    Ok(())
}
