use anyhow::Result;

use crate::credentials::{keys_path, KeyStore};

pub async fn run(environment: String) -> Result<()> {
    let path = keys_path();
    let mut store = KeyStore::load(&path)?;
    if store.remove(&environment).is_some() {
        store.save(&path)?;
        println!("Logged out from {} environment", environment);
    } else {
        println!("not logged into {}", environment);
    }
    Ok(())
}
