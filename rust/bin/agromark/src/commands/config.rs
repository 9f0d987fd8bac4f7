//! `agromark config show|set`.

use std::path::Path;

use anyhow::Result;

use agromark_bff::RefreshPolicy;

use crate::config::ClientConfig;

pub fn show(config_path: &Path, json: bool) -> Result<()> {
    let config = ClientConfig::load(config_path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    println!("Config:    {}", config_path.display());
    println!("Server:    {}", config.server);
    println!(
        "Timeout:   {}",
        config
            .timeout_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Refresh:   {:?}", config.refresh_policy);
    Ok(())
}

pub fn set(
    config_path: &Path,
    server: Option<&str>,
    timeout_secs: Option<u64>,
    refresh_policy: Option<RefreshPolicy>,
) -> Result<()> {
    if server.is_none() && timeout_secs.is_none() && refresh_policy.is_none() {
        anyhow::bail!("Nothing to set. Use --server, --timeout or --refresh-policy.");
    }

    let mut config = ClientConfig::load(config_path)?;
    if let Some(server) = server {
        config.server = server.trim_end_matches('/').to_string();
    }
    if let Some(secs) = timeout_secs {
        // 0 clears the timeout.
        config.timeout_secs = (secs > 0).then_some(secs);
    }
    if let Some(policy) = refresh_policy {
        config.refresh_policy = policy;
    }
    config.save(config_path)?;
    println!("Config saved to {}.", config_path.display());
    Ok(())
}
