//! Device enumeration sub-commands.
//!
//! Lists print to stderr as JSON arrays: stdout belongs to the `R`
//! sentinel protocol, and host processes read these from stderr.

use serde::Serialize;

use reel_common::error::ReelResult;
use reel_engine::backend::CaptureBackend;

fn print_list<T: Serialize>(items: &[T]) -> ReelResult<()> {
    eprintln!("{}", serde_json::to_string(items)?);
    Ok(())
}

pub async fn screens(backend: Box<dyn CaptureBackend>) -> ReelResult<()> {
    print_list(&backend.list_screens().await?)
}

pub async fn windows(backend: Box<dyn CaptureBackend>) -> ReelResult<()> {
    print_list(&backend.list_windows().await?)
}

pub async fn audio_devices(backend: Box<dyn CaptureBackend>) -> ReelResult<()> {
    print_list(&backend.list_audio_devices().await?)
}
