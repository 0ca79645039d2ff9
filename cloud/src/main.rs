//! Interactive ghost-text demo.
//!
//! A line-based single-document editor: typed lines are appended at the
//! cursor, the debounce elapses, and the completion endpoint streams ghost
//! text into the document. Slash commands stand in for gestures.

use clap::Parser;
use ghosttext_cloud::CompletionClient;
use ghosttext_core::{
    CompletionController, Config, DeviceClass, Document, GestureHandler, Inline, Key,
    Transaction,
};
use std::io::{self, BufRead};
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "ghosttext-demo")]
#[command(about = "Interactive inline-completion demo")]
#[command(version)]
struct Cli {
    /// Base URL of an OpenAI-compatible endpoint
    #[arg(long, default_value = "https://api.openai.com")]
    endpoint: String,

    /// Model name to request completions from
    #[arg(long, default_value = "gpt-4o")]
    model: String,

    /// Bearer token for the endpoint (falls back to GHOSTTEXT_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Optional TOML config file
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Simulate a touch device (double space confirms)
    #[arg(long)]
    touch: bool,
}

/// Render the document with ghost text in brackets and a cursor marker.
fn render(doc: &Document) {
    let mut out = String::new();
    let mut offset = 0usize;
    let cursor = doc.selection();
    for (i, block) in doc.blocks().iter().enumerate() {
        if i > 0 {
            if offset == cursor {
                out.push('|');
            }
            out.push('\n');
            offset += 1;
        }
        for inline in &block.inlines {
            match inline {
                Inline::Text { text } => {
                    for ch in text.chars() {
                        if offset == cursor {
                            out.push('|');
                        }
                        out.push(ch);
                        offset += 1;
                    }
                }
                Inline::Suggestion(node) => {
                    if offset == cursor {
                        out.push('|');
                    }
                    out.push('[');
                    out.push_str(&node.value);
                    out.push(']');
                    offset += 1;
                }
            }
        }
    }
    if cursor >= offset {
        out.push('|');
    }
    println!("  {}", out);
}

fn type_text(doc: &mut Document, ctl: &mut CompletionController, text: &str) {
    let mut tx = Transaction::new();
    tx.insert_text(doc.selection(), text);
    if doc.commit(tx).is_ok() {
        ctl.note_edit(Instant::now());
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_toml(path).unwrap_or_else(|e| {
            eprintln!("⚠ Failed to load config {:?}: {}, using defaults", path, e);
            Config::default()
        }),
        None => Config::default(),
    };

    let mut client = CompletionClient::new(cli.endpoint, cli.model);
    let key = cli
        .api_key
        .or_else(|| std::env::var("GHOSTTEXT_API_KEY").ok());
    if let Some(key) = key {
        client = client.with_api_key(key);
    }

    let device = if cli.touch {
        DeviceClass::Touch
    } else {
        DeviceClass::Pointer
    };
    let mut doc = Document::new();
    let mut ctl = CompletionController::new(&config);
    let mut gestures = GestureHandler::new(device, &config);
    gestures.on_focus(&mut ctl, &mut doc);

    println!("ghost-text demo: type text and press Enter; ghost text appears in [brackets]");
    println!("commands: /tab (confirm), /space (touch space), /cancel, /quit");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let raw = match line {
            Ok(raw) => raw,
            Err(e) => {
                eprintln!("error reading stdin: {}", e);
                break;
            }
        };
        let now = Instant::now();
        match raw.trim_end() {
            "/quit" => break,
            "/tab" => {
                gestures.on_key_down(&mut ctl, &mut doc, Key::Tab, now);
            }
            "/space" => {
                gestures.on_key_down(&mut ctl, &mut doc, Key::Space, now);
            }
            "/cancel" => {
                ctl.cancel_completion(&mut doc);
            }
            "" => {}
            text => {
                type_text(&mut doc, &mut ctl, text);
                // Let the quiet period elapse, then ask for a completion.
                std::thread::sleep(Duration::from_millis(config.debounce_ms));
                if let Some(request) = ctl.poll(&doc, Instant::now()) {
                    client.stream_completion(&request, &config, &mut |msg| {
                        ctl.apply_message(&mut doc, &msg);
                    });
                }
            }
        }
        // Expire the double-tap window if it lapsed while we waited.
        gestures.poll(&mut ctl, &mut doc, Instant::now());
        render(&doc);
    }
}
