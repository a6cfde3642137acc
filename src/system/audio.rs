//! Sound devices and per-application volume through `pactl`.
//!
//! Works against both PulseAudio and PipeWire's pulse server. Device and
//! stream lists use the JSON output format.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::Result;
use crate::exec::{probe, run_checked, spawn_detached, which, CommandSpec};
use crate::system::packages;

pub const MAX_VOLUME: u32 = 150;
pub const PIPEWIRE_PACKAGE: &str = "pipewire-pulse";
pub const PULSEAUDIO_PACKAGE: &str = "pulseaudio-server";
pub const MIXER_BINARY: &str = "pavucontrol";
pub const MIXER_PACKAGE: &str = "pavucontrol";

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)%").expect("valid regex"));

#[derive(Debug, Clone, Default, Deserialize)]
struct ChannelVolume {
    #[serde(default)]
    value_percent: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Port {
    name: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSink {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    ports: Vec<Port>,
    #[serde(default)]
    active_port: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSinkInput {
    index: u32,
    #[serde(default)]
    mute: bool,
    #[serde(default)]
    volume: BTreeMap<String, ChannelVolume>,
    #[serde(default)]
    properties: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sink {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppStream {
    pub index: u32,
    pub name: String,
    pub volume: u32,
    pub muted: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeState {
    pub percent: u32,
    pub muted: bool,
}

impl VolumeState {
    pub fn icon_name(&self) -> &'static str {
        volume_icon(self.percent, self.muted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioState {
    pub sinks: Vec<Sink>,
    pub default_sink: String,
    pub output: VolumeState,
    pub input: VolumeState,
    pub streams: Vec<AppStream>,
}

impl AudioState {
    pub fn default_sink_index(&self) -> Option<usize> {
        self.sinks.iter().position(|s| s.name == self.default_sink)
    }
}

pub fn volume_icon(percent: u32, muted: bool) -> &'static str {
    if muted {
        "audio-volume-muted-symbolic"
    } else if percent < 33 {
        "audio-volume-low-symbolic"
    } else if percent < 66 {
        "audio-volume-medium-symbolic"
    } else {
        "audio-volume-high-symbolic"
    }
}

pub fn clamp_volume(percent: f64) -> u32 {
    percent.round().clamp(0.0, MAX_VOLUME as f64) as u32
}

/// Description, plus the active port's description when there is one.
pub fn parse_sinks(json: &str) -> Result<Vec<Sink>> {
    let raw: Vec<RawSink> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|sink| {
            let port = sink
                .active_port
                .as_deref()
                .and_then(|active| sink.ports.iter().find(|p| p.name == active))
                .map(|p| p.description.trim())
                .filter(|d| !d.is_empty());
            let base = if sink.description.is_empty() { sink.name.as_str() } else { sink.description.as_str() };
            let label = match port {
                Some(port) => format!("{} - {}", base, port),
                None => base.to_string(),
            };
            Sink { name: sink.name, label }
        })
        .collect())
}

fn property<'a>(properties: &'a BTreeMap<String, serde_json::Value>, key: &str) -> Option<&'a str> {
    properties.get(key)?.as_str().filter(|v| !v.is_empty())
}

pub fn parse_sink_inputs(json: &str) -> Result<Vec<AppStream>> {
    let raw: Vec<RawSinkInput> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .map(|input| {
            let name = property(&input.properties, "media.name")
                .or_else(|| property(&input.properties, "application.name"))
                .unwrap_or("Unknown")
                .to_string();
            let volume = input
                .volume
                .values()
                .next()
                .and_then(|channel| first_percent(&channel.value_percent))
                .unwrap_or(100);
            AppStream {
                index: input.index,
                name,
                volume,
                muted: input.mute,
            }
        })
        .collect())
}

pub fn first_percent(text: &str) -> Option<u32> {
    PERCENT_RE.captures(text)?[1].parse().ok()
}

pub fn parse_mute(text: &str) -> bool {
    text.lines()
        .filter_map(|line| line.trim().strip_prefix("Mute:"))
        .any(|value| value.trim() == "yes")
}

async fn pactl(args: &[&str]) -> Result<String> {
    run_checked(&CommandSpec::new("pactl").args(args.iter().copied())).await
}

async fn volume_of(kind: &str, target: &str) -> VolumeState {
    let (get_volume, get_mute) = (format!("get-{}-volume", kind), format!("get-{}-mute", kind));
    let percent = probe("pactl", &[get_volume.as_str(), target])
        .await
        .and_then(|out| first_percent(&out))
        .unwrap_or(0);
    let muted = probe("pactl", &[get_mute.as_str(), target])
        .await
        .is_some_and(|out| parse_mute(&out));
    VolumeState { percent, muted }
}

pub async fn snapshot() -> Result<AudioState> {
    let sinks = parse_sinks(&pactl(&["--format=json", "list", "sinks"]).await?)?;
    let streams = parse_sink_inputs(&pactl(&["--format=json", "list", "sink-inputs"]).await?)?;
    let default_sink = probe("pactl", &["get-default-sink"]).await.unwrap_or_default();
    let state = AudioState {
        sinks,
        default_sink,
        output: volume_of("sink", "@DEFAULT_SINK@").await,
        input: volume_of("source", "@DEFAULT_SOURCE@").await,
        streams,
    };
    debug!(sinks = state.sinks.len(), streams = state.streams.len(), "audio state refreshed");
    Ok(state)
}

/// Makes `sink` the default and moves every playing stream onto it.
pub async fn set_default_sink(sink: &str) -> Result<()> {
    info!(sink, "changing default output");
    pactl(&["set-default-sink", sink]).await?;
    let streams = parse_sink_inputs(&pactl(&["--format=json", "list", "sink-inputs"]).await?)?;
    for stream in streams {
        let index = stream.index.to_string();
        pactl(&["move-sink-input", index.as_str(), sink]).await?;
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeTarget {
    Output,
    Input,
    Stream(u32),
}

impl VolumeTarget {
    fn volume_args(&self, percent: u32) -> Vec<String> {
        let value = format!("{}%", percent.min(MAX_VOLUME));
        match self {
            Self::Output => vec!["set-sink-volume".into(), "@DEFAULT_SINK@".into(), value],
            Self::Input => vec!["set-source-volume".into(), "@DEFAULT_SOURCE@".into(), value],
            Self::Stream(index) => vec!["set-sink-input-volume".into(), index.to_string(), value],
        }
    }

    fn mute_args(&self, muted: bool) -> Vec<String> {
        let value = if muted { "1" } else { "0" }.to_string();
        match self {
            Self::Output => vec!["set-sink-mute".into(), "@DEFAULT_SINK@".into(), value],
            Self::Input => vec!["set-source-mute".into(), "@DEFAULT_SOURCE@".into(), value],
            Self::Stream(index) => vec!["set-sink-input-mute".into(), index.to_string(), value],
        }
    }
}

pub async fn set_volume(target: VolumeTarget, percent: u32) -> Result<()> {
    run_checked(&CommandSpec::new("pactl").args(target.volume_args(percent))).await?;
    Ok(())
}

pub async fn set_mute(target: VolumeTarget, muted: bool) -> Result<()> {
    run_checked(&CommandSpec::new("pactl").args(target.mute_args(muted))).await?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundServer {
    PipeWire,
    PulseAudio,
}

impl SoundServer {
    pub fn package(&self) -> &'static str {
        match self {
            Self::PipeWire => PIPEWIRE_PACKAGE,
            Self::PulseAudio => PULSEAUDIO_PACKAGE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PipeWire => "PipeWire (Modern audio server)",
            Self::PulseAudio => "PulseAudio (Traditional audio server)",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::PipeWire => Self::PulseAudio,
            Self::PulseAudio => Self::PipeWire,
        }
    }
}

/// The installed server. PipeWire when neither package is found.
pub async fn current_server() -> SoundServer {
    if packages::is_installed(PIPEWIRE_PACKAGE).await {
        SoundServer::PipeWire
    } else if packages::is_installed(PULSEAUDIO_PACKAGE).await {
        SoundServer::PulseAudio
    } else {
        SoundServer::PipeWire
    }
}

pub fn switch_server_spec(to: SoundServer) -> CommandSpec {
    packages::swap_spec(to.other().package(), to.package())
}

pub fn mixer_available() -> bool {
    which(MIXER_BINARY).is_some()
}

pub fn launch_mixer() -> Result<()> {
    spawn_detached(MIXER_BINARY, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SINKS: &str = r#"[
      {"index":56,"state":"RUNNING","name":"alsa_output.pci-0000_00_1f.3.analog-stereo",
       "description":"Built-in Audio Analog Stereo","mute":false,
       "ports":[{"name":"analog-output-speaker","description":"Speakers","type":"Speaker"},
                {"name":"analog-output-headphones","description":"Headphones","type":"Headphones"}],
       "active_port":"analog-output-headphones"},
      {"index":57,"name":"bluez_output.AA_BB","description":"WH-1000XM4","ports":[],"active_port":null}
    ]"#;

    const INPUTS: &str = r#"[
      {"index":42,"sink":56,"mute":false,
       "volume":{"front-left":{"value":52429,"value_percent":"80%","db":"-5.81 dB"},
                 "front-right":{"value":52429,"value_percent":"80%","db":"-5.81 dB"}},
       "properties":{"media.name":"Big Buck Bunny","application.name":"mpv"}},
      {"index":43,"mute":true,"volume":{},"properties":{"application.name":"Firefox"}},
      {"index":44,"properties":{}}
    ]"#;

    #[test]
    fn sink_labels_include_active_port() {
        let sinks = parse_sinks(SINKS).unwrap();
        assert_eq!(sinks[0].label, "Built-in Audio Analog Stereo - Headphones");
        assert_eq!(sinks[1].label, "WH-1000XM4");
        let state = AudioState {
            sinks,
            default_sink: "bluez_output.AA_BB".into(),
            ..Default::default()
        };
        assert_eq!(state.default_sink_index(), Some(1));
    }

    #[test]
    fn stream_names_and_volumes() {
        let streams = parse_sink_inputs(INPUTS).unwrap();
        assert_eq!(
            streams,
            vec![
                AppStream { index: 42, name: "Big Buck Bunny".into(), volume: 80, muted: false },
                AppStream { index: 43, name: "Firefox".into(), volume: 100, muted: true },
                AppStream { index: 44, name: "Unknown".into(), volume: 100, muted: false },
            ]
        );
    }

    #[test]
    fn text_volume_and_mute() {
        let volume = "Volume: front-left: 45875 /  70% / -9.29 dB,   front-right: 45875 /  70% / -9.29 dB\n        balance 0.00";
        assert_eq!(first_percent(volume), Some(70));
        assert!(parse_mute("Mute: yes\n"));
        assert!(!parse_mute("Mute: no\n"));
    }

    #[test]
    fn icons_and_clamping() {
        assert_eq!(volume_icon(10, false), "audio-volume-low-symbolic");
        assert_eq!(volume_icon(50, false), "audio-volume-medium-symbolic");
        assert_eq!(volume_icon(66, false), "audio-volume-high-symbolic");
        assert_eq!(volume_icon(100, true), "audio-volume-muted-symbolic");
        assert_eq!(clamp_volume(180.4), 150);
        assert_eq!(clamp_volume(-3.0), 0);
        assert_eq!(
            VolumeTarget::Stream(7).volume_args(200),
            vec!["set-sink-input-volume", "7", "150%"]
        );
    }

    #[test]
    fn switching_server_swaps_packages() {
        let spec = switch_server_spec(SoundServer::PulseAudio);
        assert_eq!(spec.display(), "dnf swap -y --allowerasing pipewire-pulse pulseaudio-server");
    }
}
