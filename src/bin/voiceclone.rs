//! voiceclone — VoiceClone 服务的命令行客户端
//!
//! Usage:
//!   voiceclone [--config <yaml>] health                      Service health
//!   voiceclone [--config <yaml>] voices                      List voices
//!   voiceclone [--config <yaml>] synthesize <text> [...]     Synthesize and download
//!   voiceclone [--config <yaml>] clone <name> <file>... [...] Clone a voice and wait

use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use voiceclone_client::{
    AudioFile, AudioFormat, ClientConfig, CloneQuality, CloneRequest, SynthesisRequest,
    UploadProgress, VoiceClient, VoicePreview,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = take_option(&mut args, "--config");
    if args.is_empty() {
        print_usage();
        std::process::exit(1);
    }

    let command = args.remove(0);
    match command.as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            return;
        }
        "version" | "--version" | "-V" => {
            println!("voiceclone {}", env!("CARGO_PKG_VERSION"));
            return;
        }
        _ => {}
    }

    let client = match build_client(config_path) {
        Ok(client) => client,
        Err(e) => fail(&format!("{e}")),
    };

    let result = match command.as_str() {
        "health" => cmd_health(&client).await,
        "voices" => cmd_voices(&client).await,
        "analytics" => cmd_analytics(&client).await,
        "synthesize" => cmd_synthesize(&client, args).await,
        "clone" => cmd_clone(&client, args).await,
        "status" => cmd_status(&client, &args, false).await,
        "clone-status" => cmd_status(&client, &args, true).await,
        "delete" => cmd_delete(&client, &args).await,
        "preview" => cmd_preview(&client, args).await,
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        fail(&e);
    }
}

fn print_usage() {
    println!(
        r#"voiceclone — VoiceClone 命令行客户端

USAGE:
    voiceclone [--config <yaml>] <COMMAND> [OPTIONS]

COMMANDS:
    health                          Show service health
    voices                          List built-in and custom voices
    analytics                       Show service analytics
    synthesize <text> [--voice id] [--speed f] [--pitch f] [--volume f]
               [--format mp3|wav|ogg|flac|m4a|aac] [--out path]
                                    Synthesize speech and save the audio
    clone <name> <file>... [--quality draft|standard|high|premium] [--language tag]
                                    Clone a voice from samples and wait for training
    status <job-id>                 Show a synthesis job
    clone-status <voice-id>         Show a voice clone job
    delete <voice-id>               Delete a custom voice
    preview <voice-id> [--out path] Fetch a voice preview
    version                         Show version information
    help                            Show this help message

ENVIRONMENT:
    VOICECLONE_BASE_URL             Service base URL (default http://localhost:5000)
    VOICECLONE_TIMEOUT_SECS         Per-request timeout
    VOICECLONE_POLL_INTERVAL_MS     Job poll interval
    VOICECLONE_POLL_TIMEOUT_MS      Job poll deadline
    RUST_LOG                        Log filter, e.g. voiceclone_client=debug"#
    );
}

fn fail(message: &str) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

fn build_client(config_path: Option<String>) -> Result<VoiceClient, String> {
    let config = match config_path {
        Some(path) => ClientConfig::from_yaml_file(&path).map_err(|e| e.to_string())?,
        None => ClientConfig::default(),
    };
    VoiceClient::builder()
        .config(config)
        .from_env()
        .build()
        .map_err(|e| e.to_string())
}

/// Remove `--name value` from `args`, returning the value.
fn take_option(args: &mut Vec<String>, name: &str) -> Option<String> {
    let i = args.iter().position(|a| a == name)?;
    if i + 1 >= args.len() {
        fail(&format!("{name} requires a value"));
    }
    let value = args.remove(i + 1);
    args.remove(i);
    Some(value)
}

fn take_f64(args: &mut Vec<String>, name: &str) -> Result<Option<f64>, String> {
    take_option(args, name)
        .map(|v| v.parse::<f64>().map_err(|_| format!("{name}: not a number: {v}")))
        .transpose()
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}

async fn cmd_health(client: &VoiceClient) -> Result<(), String> {
    let health = client.health_check().await.map_err(|e| e.to_string())?;
    print_json(&health)?;
    if !health.is_healthy() {
        std::process::exit(2);
    }
    Ok(())
}

async fn cmd_voices(client: &VoiceClient) -> Result<(), String> {
    let catalog = client.get_voices().await.map_err(|e| e.to_string())?;
    println!("{:<16} {:<20} {:<8} KIND", "ID", "NAME", "LANG");
    for voice in catalog.all() {
        let kind = if voice.is_custom() { "custom" } else { "builtin" };
        println!("{:<16} {:<20} {:<8} {kind}", voice.id, voice.name, voice.language);
    }
    println!("\n{} voice(s)", catalog.len());
    Ok(())
}

async fn cmd_analytics(client: &VoiceClient) -> Result<(), String> {
    let analytics = client.get_analytics().await.map_err(|e| e.to_string())?;
    print_json(&analytics)
}

async fn cmd_synthesize(client: &VoiceClient, mut args: Vec<String>) -> Result<(), String> {
    let voice = take_option(&mut args, "--voice");
    let speed = take_f64(&mut args, "--speed")?;
    let pitch = take_f64(&mut args, "--pitch")?;
    let volume = take_f64(&mut args, "--volume")?;
    let format = take_option(&mut args, "--format")
        .map(|f| f.parse::<AudioFormat>().map_err(|e| e.to_string()))
        .transpose()?;
    let out = take_option(&mut args, "--out").map(PathBuf::from);
    if args.is_empty() {
        return Err("synthesize requires <text>".into());
    }

    let mut request = SynthesisRequest::new(args.join(" "));
    if let Some(voice) = voice {
        request = request.voice(voice);
    }
    if let Some(speed) = speed {
        request = request.speed(speed);
    }
    if let Some(pitch) = pitch {
        request = request.pitch(pitch);
    }
    if let Some(volume) = volume {
        request = request.volume(volume);
    }
    if let Some(format) = format {
        request = request.format(format);
    }

    let clip = client
        .synthesize_and_download(&request)
        .await
        .map_err(|e| e.to_string())?;
    let path = out.unwrap_or_else(|| PathBuf::from(clip.suggested_file_name("speech")));
    std::fs::write(&path, &clip.data).map_err(|e| format!("{}: {e}", path.display()))?;
    println!("Saved {} bytes to {}", clip.len(), path.display());
    Ok(())
}

async fn cmd_clone(client: &VoiceClient, mut args: Vec<String>) -> Result<(), String> {
    let quality = take_option(&mut args, "--quality")
        .map(|q| q.parse::<CloneQuality>().map_err(|e| e.to_string()))
        .transpose()?;
    let language = take_option(&mut args, "--language");
    if args.len() < 2 {
        return Err("clone requires <name> and at least one <file>".into());
    }

    let name = args.remove(0);
    let mut request = CloneRequest::new(name);
    for path in &args {
        request = request.file(AudioFile::from_path(path).await.map_err(|e| e.to_string())?);
    }
    if let Some(quality) = quality {
        request = request.quality(quality);
    }
    if let Some(language) = language {
        request = request.language(language);
    }

    let progress = Arc::new(|p: UploadProgress| {
        eprint!("\rUploading... {:>5.1}%", p.percent);
        if p.sent >= p.total {
            eprintln!();
        }
    });
    let created = client
        .clone_voice_with_progress(&request, progress)
        .await
        .map_err(|e| e.to_string())?;
    println!("Voice {} submitted ({})", created.voice_id, created.status);

    let job = client
        .wait_for_clone(&created.voice_id)
        .await
        .map_err(|e| e.to_string())?;
    println!("Voice {} is {}", job.id, job.status);
    Ok(())
}

async fn cmd_status(client: &VoiceClient, args: &[String], clone: bool) -> Result<(), String> {
    let id = args.first().ok_or("an id is required")?;
    let job = if clone {
        client.get_clone_status(id).await
    } else {
        client.get_synthesis_status(id).await
    }
    .map_err(|e| e.to_string())?;
    print_json(&job)
}

async fn cmd_delete(client: &VoiceClient, args: &[String]) -> Result<(), String> {
    let id = args.first().ok_or("delete requires <voice-id>")?;
    let ack = client.delete_voice(id).await.map_err(|e| e.to_string())?;
    println!("{} ({})", ack.message, ack.voice_id);
    Ok(())
}

async fn cmd_preview(client: &VoiceClient, mut args: Vec<String>) -> Result<(), String> {
    let out = take_option(&mut args, "--out").map(PathBuf::from);
    let id = args.first().ok_or("preview requires <voice-id>")?;
    match client.preview_voice(id).await.map_err(|e| e.to_string())? {
        VoicePreview::Audio(clip) => {
            let path = out.unwrap_or_else(|| PathBuf::from(clip.suggested_file_name(id)));
            std::fs::write(&path, &clip.data).map_err(|e| format!("{}: {e}", path.display()))?;
            println!("Saved preview ({} bytes) to {}", clip.len(), path.display());
            Ok(())
        }
        VoicePreview::Details(details) => print_json(&details),
    }
}
