//! CLI subcommands.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use bytes::Bytes;
use linker_core::{domain_of, Error};
use linker_intercept::{HttpTransport, Interceptor, TargetSignature};
use linker_relay::{write_export, ExportBundle};
use linker_store::{ChatEntry, ChatHistory, DomainStates, Settings};
use linker_stream::{ChatClient, ChatOutcome, FeedbackClient, OutgoingMessage};
use tower::{Layer, ServiceExt};
use tracing::{debug, info};

use crate::sink::TerminalSink;
use crate::state::AppState;

pub const USAGE: &str = "\
Linker - n8n workflow assistant

Usage: linker [command]

Commands:
  serve                              Run the credential relay daemon (default)
  chat [--legacy] <page-url> <msg>   Send a message to the assistant
  history show                       Print the stored chat history
  history clear <domain>             Clear chat history and the domain's session
  fetch <url>                        GET a URL through the capturing transport
  credentials show                   Summarize the last captured credential set
  credentials export [dir]           Write the captured set to a JSON file
  credentials clear                  Forget the captured set
  domain list                        Show per-domain assistant state
  domain toggle <domain>             Enable or disable the assistant on a domain
  config show                        Show configuration and stored settings
  config set-token <token>           Store the service auth token
  config set-key <key>               Store the n8n API key
  config accept-privacy              Record acceptance of the privacy notice
  feedback <text>                    Send feedback to the service
  help                               Show this help message";

pub async fn chat(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    let legacy = args.first().map(String::as_str) == Some("--legacy");
    let rest = if legacy { &args[1..] } else { args };
    if rest.len() < 2 {
        bail!("Usage: linker chat [--legacy] <page-url> <message>");
    }
    let page_url = &rest[0];
    let text = rest[1..].join(" ");
    if text.trim().is_empty() {
        bail!("Message is empty");
    }

    let domain = domain_of(page_url);
    if !DomainStates::new(state.store.clone()).is_enabled(&domain)? {
        bail!(
            "The assistant is disabled on {}. Enable it with `linker domain toggle {}`",
            domain,
            domain
        );
    }

    let mut message = OutgoingMessage::new(text.clone(), page_url.clone());
    if let Some(set) = state.relay.get_credentials().await? {
        debug!("Attaching {} captured credentials", set.credential_count);
        message = message.with_platform_credentials(ExportBundle::from(&set).to_value()?);
    }

    let history = ChatHistory::new(state.store.clone());
    history.append(ChatEntry::user(text))?;

    let client = ChatClient::new(&state.config, state.store.clone());
    let mut sink = TerminalSink::default();
    let outcome = if legacy {
        client.send_legacy(message, &mut sink).await
    } else {
        client.send(message, &mut sink).await
    };

    if let Some(reply) = sink.take_last_message() {
        history.append(ChatEntry::assistant(reply))?;
    }

    match outcome {
        ChatOutcome::Completed { .. } => Ok(()),
        ChatOutcome::Failed(e) => Err(e.into()),
        ChatOutcome::Incomplete => bail!("The assistant closed the stream without an answer"),
    }
}

pub fn history(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    let history = ChatHistory::new(state.store.clone());
    match args.first().map(String::as_str) {
        Some("show") | None => {
            for entry in history.load()? {
                println!("[{}] {}", entry.sender, entry.text);
            }
            Ok(())
        }
        Some("clear") => {
            let domain = args.get(1).context("Usage: linker history clear <domain>")?;
            history.clear(domain)?;
            println!("Chat history cleared for {}", domain);
            Ok(())
        }
        Some(other) => bail!("Unknown history command: {}", other),
    }
}

/// GET `url` through the capturing transport, print the untouched body, and
/// report what the relay captured.
pub async fn fetch(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    let url = args.first().context("Usage: linker fetch <url>")?;

    let interceptor = Interceptor::new(TargetSignature::n8n_credentials(), Arc::new(state.relay.clone()));
    let matched = interceptor.should_capture(url);
    let transport = interceptor.layer().layer(HttpTransport::default());

    let request = http::Request::get(url.as_str())
        .header("accept", "application/json")
        .body(Bytes::new())?;
    let response = transport.oneshot(request).await?;

    if !response.status().is_success() {
        eprintln!("HTTP {}", response.status());
    }
    println!("{}", String::from_utf8_lossy(response.body()));

    if matched {
        // Round-trips behind the queued capture.
        if let Some(set) = state.relay.get_credentials().await? {
            info!("Relay now holds {} credentials from {}", set.credential_count, set.domain);
        }
    }
    Ok(())
}

pub async fn credentials(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    match args.first().map(String::as_str) {
        Some("show") | None => {
            let Some(set) = state.relay.get_credentials().await? else {
                println!("No credentials captured yet.");
                return Ok(());
            };
            let captured = chrono::DateTime::from_timestamp_millis(set.timestamp)
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| set.timestamp.to_string());
            println!(
                "{} credentials from {} (captured {})",
                set.credential_count, set.domain, captured
            );
            for summary in set.summaries() {
                println!("  {}  {}  ({})", summary.id, summary.name, summary.kind);
            }
            Ok(())
        }
        Some("export") => {
            let set = state
                .relay
                .get_credentials()
                .await?
                .ok_or_else(|| anyhow!("No credentials captured yet"))?;
            let dir = args
                .get(1)
                .map(std::path::PathBuf::from)
                .unwrap_or_else(|| state.config.data_paths.exports.clone());
            let path = write_export(&set, &dir, chrono::Utc::now().date_naive())?;
            println!("Exported to {}", path.display());
            Ok(())
        }
        Some("clear") => {
            state.relay.clear_credentials().await?;
            println!("Captured credentials cleared.");
            Ok(())
        }
        Some(other) => bail!("Unknown credentials command: {}", other),
    }
}

pub fn domain(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    let domains = DomainStates::new(state.store.clone());
    match args.first().map(String::as_str) {
        Some("list") | None => {
            let mut all: Vec<_> = domains.all()?.into_iter().collect();
            all.sort();
            for (domain, enabled) in all {
                println!("{}  {}", if enabled { "on " } else { "off" }, domain);
            }
            Ok(())
        }
        Some("toggle") => {
            let domain = args.get(1).context("Usage: linker domain toggle <domain>")?;
            let enabled = domains.toggle(domain)?;
            println!(
                "Assistant {} on {}",
                if enabled { "enabled" } else { "disabled" },
                domain
            );
            Ok(())
        }
        Some(other) => bail!("Unknown domain command: {}", other),
    }
}

pub fn config(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    let settings = Settings::new(state.store.clone());
    match args.first().map(String::as_str) {
        Some("show") | None => {
            let config = &state.config;
            println!("environment:    {:?}", config.env);
            println!("service:        {}", config.service_url);
            println!("protocol:       {}", config.protocol);
            println!("relay port:     {}", config.relay_port);
            println!("data dir:       {}", config.data_paths.root.display());
            println!("auth token:     {}", mask(settings.auth_token()?));
            println!("n8n API key:    {}", mask(settings.api_key()?));
            let agreed = match settings.privacy_agreed_date()? {
                Some(date) if settings.privacy_agreed()? => format!("yes ({})", date),
                _ if settings.privacy_agreed()? => "yes".to_string(),
                _ => "no".to_string(),
            };
            println!("privacy agreed: {}", agreed);
            Ok(())
        }
        Some("set-token") => {
            let token = args.get(1).map(|t| t.trim()).unwrap_or_default();
            if token.is_empty() {
                bail!("Please enter your service auth token");
            }
            settings.set_auth_token(token)?;
            println!("Auth token saved.");
            Ok(())
        }
        Some("set-key") => {
            let key = args.get(1).map(|k| k.trim()).unwrap_or_default();
            if key.is_empty() {
                bail!("Please enter your n8n API key");
            }
            settings.set_api_key(key)?;
            println!("API key saved.");
            Ok(())
        }
        Some("accept-privacy") => {
            settings.accept_privacy()?;
            println!("Privacy notice accepted.");
            Ok(())
        }
        Some(other) => bail!("Unknown config command: {}", other),
    }
}

pub async fn feedback(state: &AppState, args: &[String]) -> anyhow::Result<()> {
    let client = FeedbackClient::new(&state.config);
    match client.submit(&args.join(" ")).await {
        Ok(receipt) => {
            println!("{}", receipt.message);
            Ok(())
        }
        Err(Error::InvalidInput(message)) => bail!(message),
        Err(e) => Err(anyhow::Error::new(e).context("Failed to send feedback. Please try again.")),
    }
}

fn mask(value: Option<String>) -> String {
    match value {
        Some(v) if v.chars().count() > 4 => format!("{}…", v.chars().take(4).collect::<String>()),
        Some(_) => "set".to_string(),
        None => "not set".to_string(),
    }
}
