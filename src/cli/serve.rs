//! Web server command.

use std::sync::Arc;

use console::style;

use crate::config::Settings;

/// Start the web server.
pub async fn cmd_serve(settings: Arc<Settings>, bind: Option<&str>) -> anyhow::Result<()> {
    let bind = bind.unwrap_or(&settings.bind).to_string();
    let (host, port) = parse_bind_address(&bind)?;

    println!(
        "{} Starting reconciliation server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    crate::server::serve(settings, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "3030" -> 127.0.0.1:3030
/// - Just a host: "0.0.0.0" -> 0.0.0.0:3030
/// - Host and port: "0.0.0.0:3030" -> 0.0.0.0:3030
fn parse_bind_address(bind: &str) -> anyhow::Result<(String, u16)> {
    if let Ok(port) = bind.parse::<u16>() {
        return Ok(("127.0.0.1".to_string(), port));
    }

    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return Ok((host.to_string(), port));
        }
    }

    Ok((bind.to_string(), 3030))
}
