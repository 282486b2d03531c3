use clap::{Parser, ValueEnum};
use qrlink_redirector::VisitRecording;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "QRLINK_GATEWAY_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "QRLINK_STORAGE_BACKEND";
pub const REDIS_URL_ENV: &str = "QRLINK_REDIS_URL";
pub const REDIS_KEY_PREFIX_ENV: &str = "QRLINK_REDIS_KEY_PREFIX";
pub const CODE_LENGTH_ENV: &str = "QRLINK_CODE_LENGTH";
pub const VISIT_RECORDING_ENV: &str = "QRLINK_VISIT_RECORDING";
pub const IP_HASH_SALT_ENV: &str = "QRLINK_IP_HASH_SALT";
pub const LOG_FORMAT_ENV: &str = "QRLINK_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_REDIS_KEY_PREFIX: &str = "qrlink:";
pub const DEFAULT_CODE_LENGTH: &str = "10";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "redis")]
    Redis,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VisitRecordingArg {
    Inline,
    Background,
}

impl From<VisitRecordingArg> for VisitRecording {
    fn from(arg: VisitRecordingArg) -> Self {
        match arg {
            VisitRecordingArg::Inline => VisitRecording::Inline,
            VisitRecordingArg::Background => VisitRecording::Background,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "qrlink-gateway")]
pub struct Cli {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("storage", "redis"))]
    pub redis_url: Option<String>,

    #[arg(long, env = REDIS_KEY_PREFIX_ENV, default_value = DEFAULT_REDIS_KEY_PREFIX)]
    pub redis_key_prefix: String,

    #[arg(
        long,
        env = CODE_LENGTH_ENV,
        default_value = DEFAULT_CODE_LENGTH,
        value_parser = clap::value_parser!(u16).range(4..=64)
    )]
    pub code_length: u16,

    #[arg(
        long,
        env = VISIT_RECORDING_ENV,
        value_enum,
        default_value_t = VisitRecordingArg::Inline
    )]
    pub visit_recording: VisitRecordingArg,

    #[arg(long, env = IP_HASH_SALT_ENV, hide_env_values = true)]
    pub ip_hash_salt: Option<String>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}
