use foldcfg::{Config, Value};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct DatabaseSection {
    host: String,
    port: u16,
    name: String,
}

fn main() -> Result<(), foldcfg::Error> {
    let mut layers = Config::builder()
        .with_file("demos/default.yaml", true)
        .with_file("demos/dev.toml", false)
        .build()?;

    println!("App: {}", layers.get("app.name")?);
    println!("Debug: {}", layers.get("app.debug")?);

    let database: DatabaseSection = layers.extract("database")?;
    println!("Database: {database:?}");

    // Overrides land in the in-memory overlay only
    layers.set("app.debug", Value::Bool(false))?;
    println!("Debug after override: {}", layers.get("app.debug")?);

    Ok(())
}
