//! `wsx ports` — show or relabel a workspace's exposed ports.

use std::collections::HashMap;

use anyhow::{bail, Result};

use wsx_client::WorkspaceApi;
use wsx_core::workspace::UpdatePortsRequest;

pub async fn run(api: &WorkspaceApi, id: &str, labels: &[String]) -> Result<()> {
    if labels.is_empty() {
        let ws = api.get(id).await.map_err(|e| anyhow::anyhow!("{e}"))?;
        print_ports(ws.ports.as_ref());
        return Ok(());
    }

    let req = UpdatePortsRequest {
        ports: parse_labels(labels)?,
    };
    let ws = api
        .update_ports(id, &req)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    println!("Updated ports for {}:", ws.id);
    print_ports(ws.ports.as_ref());

    Ok(())
}

fn print_ports(ports: Option<&HashMap<String, String>>) {
    match ports {
        Some(ports) if !ports.is_empty() => {
            let mut entries: Vec<_> = ports.iter().collect();
            entries.sort();
            println!("{:<8} {}", "PORT", "LABEL");
            println!("{:<8} {}", "────", "─────");
            for (port, label) in entries {
                println!("{port:<8} {label}");
            }
        }
        _ => println!("(no exposed ports)"),
    }
}

/// Parse `port=label` pairs; the set replaces the workspace's current ports.
fn parse_labels(labels: &[String]) -> Result<HashMap<String, String>> {
    let mut ports = HashMap::new();
    for entry in labels {
        let Some((port, label)) = entry.split_once('=') else {
            bail!("invalid port label '{entry}' (expected PORT=LABEL)");
        };
        if port.is_empty() || port.parse::<u16>().is_err() {
            bail!("invalid port number in '{entry}'");
        }
        ports.insert(port.to_string(), label.to_string());
    }
    Ok(ports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_port_label_pairs() {
        let ports =
            parse_labels(&["3000=web".to_string(), "5432=postgres".to_string()]).unwrap();
        assert_eq!(ports["3000"], "web");
        assert_eq!(ports["5432"], "postgres");
    }

    #[test]
    fn label_may_be_empty() {
        let ports = parse_labels(&["8080=".to_string()]).unwrap();
        assert_eq!(ports["8080"], "");
    }

    #[test]
    fn rejects_missing_separator() {
        assert!(parse_labels(&["3000".to_string()]).is_err());
    }

    #[test]
    fn rejects_non_numeric_port() {
        assert!(parse_labels(&["web=3000".to_string()]).is_err());
    }
}
