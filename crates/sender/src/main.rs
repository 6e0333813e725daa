//! # Panel Sender
//!
//! Lê os sensores do Open/LibreHardwareMonitor e envia um frame texto de
//! largura fixa para o display serial a cada intervalo.
//!
//! ## Uso
//! ```bash
//! panel_sender                          # config.toml ao lado do executável
//! panel_sender --config painel.toml     # config explícito
//! ```

mod lhm_sensors;
mod ohm_json;
mod serial_link;
mod supervisor;

use panel_core::config::{AppConfig, BackendKind};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use supervisor::{Connector, Supervisor, ThreadPause, Timing};
use tracing::{error, info};

fn main() {
    // ── Logging ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // ── Carregar config ──
    let config_path = config_path_from_args(std::env::args().skip(1))
        .unwrap_or_else(AppConfig::default_path);
    let config = match AppConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => fatal(e),
    };

    // ── Porta serial ──
    let port_name = match serial_link::discover() {
        Ok(port) => port,
        Err(e) => fatal(e),
    };
    let port = match serial_link::open(&port_name, config.link.baud_rate) {
        Ok(port) => port,
        Err(e) => fatal(e),
    };

    let timing = Timing {
        interval: Duration::from_secs_f64(config.link.interval_secs),
        backoff: Duration::from_secs_f64(config.link.backoff_secs),
    };

    // ── Banner ──
    println!();
    println!("══════════════════════════════════════════════");
    println!("   ⚡ PANEL SENDER – ATIVO (Rust)");
    println!("══════════════════════════════════════════════");
    println!("  Porta:     {port_name} @ {} baud", config.link.baud_rate);
    println!("  Backend:   {:?}", config.backend.kind);
    println!("  CPU:       {}", config.hardware.cpu_name);
    println!("  GPU:       {}", config.hardware.gpu_name);
    println!("  Intervalo: {:.1}s", config.link.interval_secs);
    println!("══════════════════════════════════════════════");
    println!();

    // ── Loop principal ──
    let backend = &config.backend;
    match backend.kind {
        BackendKind::Http => {
            let timeout = Duration::from_secs_f64(backend.timeout_secs);
            run(ohm_json::OhmHttp::new(backend.url(), timeout), port, config, timing)
        }
        BackendKind::File => run(ohm_json::OhmFile::new(backend.file.clone()), port, config, timing),
        #[cfg(windows)]
        BackendKind::Wmi => run(
            lhm_sensors::LhmWmi::new(backend.wmi_namespace.clone()),
            port,
            config,
            timing,
        ),
        #[cfg(not(windows))]
        BackendKind::Wmi => fatal("backend \"wmi\" só existe no Windows"),
    }
}

fn run<C: Connector>(connector: C, port: impl Write, config: AppConfig, timing: Timing) -> ! {
    let latch = config.hardware.gpu_mode.latch();
    if let Some(mode) = latch.mode() {
        info!("Modo da GPU fixado pela configuração: {mode:?}");
    }
    Supervisor::new(connector, port, ThreadPause, config.hardware, latch, timing).run()
}

/// `--config <caminho>` ou `--config=<caminho>`.
fn config_path_from_args(args: impl IntoIterator<Item = String>) -> Option<PathBuf> {
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    None
}

fn fatal(e: impl std::fmt::Display) -> ! {
    error!("{e}");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn config_flag_with_separate_value() {
        assert_eq!(
            config_path_from_args(args(&["--config", "painel.toml"])),
            Some(PathBuf::from("painel.toml"))
        );
    }

    #[test]
    fn config_flag_with_equals() {
        assert_eq!(
            config_path_from_args(args(&["-v", "--config=/etc/painel.toml"])),
            Some(PathBuf::from("/etc/painel.toml"))
        );
    }

    #[test]
    fn no_flag_uses_default() {
        assert_eq!(config_path_from_args(args(&[])), None);
        assert_eq!(config_path_from_args(args(&["--config"])), None);
    }
}
