//! Persistent host settings (JSON file in the app data directory).

use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use parley_core::{
    transport::udp::TypingTarget, ChatboxConfig, CommandDefaults, EngineConfig,
};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the settings file location.
pub const SETTINGS_PATH_ENV: &str = "PARLEY_SETTINGS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct AppSettings {
    pub osc_host: String,
    pub osc_port: u16,
    pub command_wait_ms: u64,
    pub chatbox_max_length: usize,
    pub dynamic_timeout: bool,
    pub timeout_multiplier_ms: u64,
    pub minimum_timeout_ms: u64,
    pub default_timeout_ms: u64,
    pub clear_guard_ms: u64,
    pub sound_on_message: bool,
    pub sound_on_notification: bool,
    pub automatic_clear_message: bool,
    pub automatic_clear_notification: bool,
    pub override_same_category: bool,
    pub continuation_marker: String,
    pub notification_left: String,
    pub notification_right: String,
    pub use_textbox: bool,
    pub indicator_without_box: bool,
    pub typing_min_interval_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            osc_host: "127.0.0.1".into(),
            osc_port: 9000,
            command_wait_ms: 0,
            chatbox_max_length: 144,
            dynamic_timeout: true,
            timeout_multiplier_ms: 1_250,
            minimum_timeout_ms: 2_000,
            default_timeout_ms: 5_000,
            clear_guard_ms: 1_250,
            sound_on_message: true,
            sound_on_notification: false,
            automatic_clear_message: true,
            automatic_clear_notification: true,
            override_same_category: true,
            continuation_marker: "...".into(),
            notification_left: "\u{3014}".into(),
            notification_right: "\u{3015}".into(),
            use_textbox: true,
            indicator_without_box: false,
            typing_min_interval_ms: 2_000,
            poll_interval_ms: 10,
        }
    }
}

impl AppSettings {
    pub fn normalize(&mut self) {
        self.osc_host = normalize_host(&self.osc_host);
        if self.osc_port == 0 {
            self.osc_port = 9000;
        }
        self.command_wait_ms = self.command_wait_ms.min(60_000);
        self.chatbox_max_length = self.chatbox_max_length.clamp(16, 144);
        self.timeout_multiplier_ms = self.timeout_multiplier_ms.clamp(100, 10_000);
        self.minimum_timeout_ms = self.minimum_timeout_ms.clamp(500, 60_000);
        self.default_timeout_ms = self.default_timeout_ms.clamp(500, 60_000);
        // The chatbox drops updates sent faster than roughly once a second.
        self.clear_guard_ms = self.clear_guard_ms.clamp(1_000, 10_000);
        self.typing_min_interval_ms = self.typing_min_interval_ms.clamp(250, 30_000);
        self.poll_interval_ms = self.poll_interval_ms.clamp(1, 100);
        self.continuation_marker = truncate_marker(&self.continuation_marker, 4);
        self.notification_left = truncate_marker(&self.notification_left, 4);
        self.notification_right = truncate_marker(&self.notification_right, 4);
    }

    pub fn chatbox_config(&self) -> ChatboxConfig {
        ChatboxConfig {
            host: self.osc_host.clone(),
            port: self.osc_port,
            max_length: self.chatbox_max_length,
            dynamic_timeout: self.dynamic_timeout,
            timeout_multiplier: Duration::from_millis(self.timeout_multiplier_ms),
            minimum_timeout: Duration::from_millis(self.minimum_timeout_ms),
            default_timeout: Duration::from_millis(self.default_timeout_ms),
            clear_guard: Duration::from_millis(self.clear_guard_ms),
            sound_on_message: self.sound_on_message,
            sound_on_notification: self.sound_on_notification,
            automatic_clear_message: self.automatic_clear_message,
            automatic_clear_notification: self.automatic_clear_notification,
            override_same_category: self.override_same_category,
            continuation_marker: self.continuation_marker.clone(),
            notification_left: self.notification_left.clone(),
            notification_right: self.notification_right.clone(),
            use_textbox: self.use_textbox,
            indicator_without_box: self.indicator_without_box,
            typing_min_interval: Duration::from_millis(self.typing_min_interval_ms),
            ..ChatboxConfig::default()
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            chatbox: self.chatbox_config(),
            commands: CommandDefaults {
                host: self.osc_host.clone(),
                port: self.osc_port,
                wait_ms: self.command_wait_ms,
            },
            ..EngineConfig::default()
        }
    }

    pub fn typing_target(&self) -> TypingTarget {
        TypingTarget {
            host: self.osc_host.clone(),
            port: self.osc_port,
            ..TypingTarget::default()
        }
    }
}

fn normalize_host(raw: &str) -> String {
    let host = raw.trim();
    match host {
        "localhost" => "127.0.0.1".into(),
        _ if host.parse::<Ipv4Addr>().is_ok() => host.into(),
        _ => "127.0.0.1".into(),
    }
}

fn truncate_marker(raw: &str, max_chars: usize) -> String {
    raw.chars().take(max_chars).collect()
}

pub fn default_settings_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Parley")
            .join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                std::env::var_os("HOME")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("/tmp"))
                    .join(".local")
                    .join("share")
            })
            .join("parley")
            .join("settings.json")
    }
}

/// `$PARLEY_SETTINGS` if set and non-empty, else the platform default.
pub fn settings_path() -> PathBuf {
    std::env::var_os(SETTINGS_PATH_ENV)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(default_settings_path)
}

pub fn load_settings(path: &Path) -> AppSettings {
    let mut settings = fs::read_to_string(path)
        .ok()
        .and_then(|raw| serde_json::from_str::<AppSettings>(&raw).ok())
        .unwrap_or_default();
    settings.normalize();
    settings
}

pub fn save_settings(path: &Path, settings: &AppSettings) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(std::io::Error::other)?;
    fs::write(path, json)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("parley-settings-{}-{name}", std::process::id()))
            .join("settings.json")
    }

    #[test]
    fn normalize_clamps_out_of_range_values() {
        let mut s = AppSettings {
            osc_host: "  not-an-ip ".into(),
            osc_port: 0,
            chatbox_max_length: 1_000,
            clear_guard_ms: 10,
            poll_interval_ms: 0,
            continuation_marker: "~~~~~~~~".into(),
            ..AppSettings::default()
        };
        s.normalize();

        assert_eq!(s.osc_host, "127.0.0.1");
        assert_eq!(s.osc_port, 9000);
        assert_eq!(s.chatbox_max_length, 144);
        assert_eq!(s.clear_guard_ms, 1_000);
        assert_eq!(s.poll_interval_ms, 1);
        assert_eq!(s.continuation_marker, "~~~~");
    }

    #[test]
    fn normalize_keeps_valid_host() {
        let mut s = AppSettings {
            osc_host: " 192.168.1.20 ".into(),
            ..AppSettings::default()
        };
        s.normalize();
        assert_eq!(s.osc_host, "192.168.1.20");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: AppSettings =
            serde_json::from_str(r#"{ "oscPort": 9010, "soundOnMessage": false }"#)
                .expect("parse partial settings");
        assert_eq!(s.osc_port, 9010);
        assert!(!s.sound_on_message);
        assert_eq!(s.chatbox_max_length, 144);
    }

    #[test]
    fn save_then_load_preserves_settings() {
        let path = temp_path("roundtrip");
        let settings = AppSettings {
            osc_port: 9123,
            override_same_category: false,
            ..AppSettings::default()
        };
        save_settings(&path, &settings).expect("save settings");

        let loaded = load_settings(&path);
        let _ = fs::remove_dir_all(path.parent().expect("parent dir"));

        assert_eq!(loaded, settings);
    }

    #[test]
    fn unreadable_file_falls_back_to_defaults() {
        let path = temp_path("garbage");
        fs::create_dir_all(path.parent().expect("parent dir")).expect("mkdir");
        fs::write(&path, "{ not json").expect("write garbage");

        let loaded = load_settings(&path);
        let _ = fs::remove_dir_all(path.parent().expect("parent dir"));

        assert_eq!(loaded, AppSettings::default());
    }

    #[test]
    fn engine_config_carries_destination_everywhere() {
        let s = AppSettings {
            osc_host: "10.0.0.5".into(),
            osc_port: 9100,
            minimum_timeout_ms: 3_000,
            ..AppSettings::default()
        };
        let cfg = s.engine_config();

        assert_eq!(cfg.commands.host, "10.0.0.5");
        assert_eq!(cfg.commands.port, 9100);
        assert_eq!(cfg.chatbox.host, "10.0.0.5");
        assert_eq!(cfg.chatbox.port, 9100);
        assert_eq!(cfg.chatbox.minimum_timeout, Duration::from_millis(3_000));
        assert_eq!(s.typing_target().address, "/chatbox/typing");
    }
}
