//! Configuração via TOML.
//!
//! Lida uma vez na inicialização e estática durante toda a execução.
//! Diferente de um painel com valores padrão razoáveis, aqui os nomes da
//! CPU/GPU e o tamanho da VRAM não têm padrão possível: arquivo ausente ou
//! inválido é erro fatal.

use crate::capability::{CapabilityLatch, GpuMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Erros de configuração. Todos são fatais.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuração não encontrada em {} (um modelo foi gerado; edite e rode de novo)", .0.display())]
    Missing(PathBuf),

    #[error("Erro ao ler {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Erro ao parsear {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Configuração inválida: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Erro ao serializar configuração: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Erro ao salvar {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ──────────────────────────────────────────────
// Backend
// ──────────────────────────────────────────────

/// Formato/origem dos dados de sensores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// `data.json` do servidor web do Open/LibreHardwareMonitor
    Http,
    /// `data.json` lido do disco a cada tick
    File,
    /// Sensores do LibreHardwareMonitor via WMI (Windows)
    Wmi,
}

/// Conexão com o monitor de hardware.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: BackendKind,
    /// Host do servidor web do monitor
    pub host: String,
    /// Porta do servidor web
    pub port: u16,
    /// Caminho do documento no servidor
    pub path: String,
    /// Arquivo local (kind = "file")
    pub file: PathBuf,
    /// Namespace WMI (kind = "wmi")
    pub wmi_namespace: String,
    /// Timeout da requisição HTTP em segundos
    pub timeout_secs: f64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Http,
            host: "localhost".into(),
            port: 8085,
            path: "/data.json".into(),
            file: PathBuf::new(),
            wmi_namespace: "root\\LibreHardwareMonitor".into(),
            timeout_secs: 2.0,
        }
    }
}

impl BackendConfig {
    /// URL completa do `data.json`.
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }
}

// ──────────────────────────────────────────────
// Hardware
// ──────────────────────────────────────────────

/// Preferência do slot da GPU.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuModeSetting {
    /// Detecta no primeiro tick bem-sucedido e trava
    #[default]
    Auto,
    Memory,
    Voltage,
}

impl GpuModeSetting {
    /// Trava inicial correspondente.
    pub fn latch(self) -> CapabilityLatch {
        match self {
            GpuModeSetting::Auto => CapabilityLatch::new(),
            GpuModeSetting::Memory => CapabilityLatch::fixed(GpuMode::Memory),
            GpuModeSetting::Voltage => CapabilityLatch::fixed(GpuMode::Voltage),
        }
    }
}

/// Hardware monitorado. Os três primeiros campos são obrigatórios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// Rótulo do nó da CPU no documento (ex: "Intel Core i7-4790K")
    pub cpu_name: String,
    /// Rótulo do nó da GPU no documento (ex: "NVIDIA GeForce GTX 1070")
    pub gpu_name: String,
    /// VRAM total em MB, para converter o percentual de uso
    pub gpu_mem_size_mb: u32,
    /// Fragmento que identifica temperaturas por core ("Core" exclui "CPU Package")
    #[serde(default = "default_core_label_filter")]
    pub core_label_filter: String,
    /// Prefixo dos sensores de core no backend plano
    #[serde(default = "default_core_sensor_prefix")]
    pub core_sensor_prefix: String,
    /// Quantidade de cores no backend plano
    #[serde(default = "default_core_sensor_count")]
    pub core_sensor_count: usize,
    #[serde(default)]
    pub gpu_mode: GpuModeSetting,
}

fn default_core_label_filter() -> String {
    "Core".into()
}

fn default_core_sensor_prefix() -> String {
    "CPU Core #".into()
}

fn default_core_sensor_count() -> usize {
    4
}

impl HardwareConfig {
    /// Valores de exemplo para o arquivo modelo.
    pub fn template() -> Self {
        Self {
            cpu_name: "Intel Core i7-4790K".into(),
            gpu_name: "NVIDIA GeForce GTX 1070".into(),
            gpu_mem_size_mb: 8192,
            core_label_filter: default_core_label_filter(),
            core_sensor_prefix: default_core_sensor_prefix(),
            core_sensor_count: default_core_sensor_count(),
            gpu_mode: GpuModeSetting::Auto,
        }
    }
}

// ──────────────────────────────────────────────
// Link serial
// ──────────────────────────────────────────────

/// Cadência do loop e parâmetros da porta serial.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Intervalo entre frames em segundos
    pub interval_secs: f64,
    /// Espera antes de reconectar ao backend em segundos
    pub backoff_secs: f64,
    /// Baud rate da porta serial
    pub baud_rate: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            interval_secs: 2.5,
            backoff_secs: 5.0,
            baud_rate: 9600,
        }
    }
}

// ──────────────────────────────────────────────
// Raiz
// ──────────────────────────────────────────────

const MAX_TIMEOUT_SECS: f64 = 60.0;
const MAX_BACKOFF_SECS: f64 = 3600.0;

/// Segundos aceitáveis para `Duration::from_secs_f64`: finitos e dentro de
/// `min..=max`. O TOML aceita `nan` e `inf`, que passariam por comparações
/// simples.
fn in_secs_range(secs: f64, min: f64, max: f64) -> bool {
    secs.is_finite() && (min..=max).contains(&secs)
}

/// Configuração raiz. A seção `[hardware]` é obrigatória.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    pub hardware: HardwareConfig,
    #[serde(default)]
    pub link: LinkConfig,
}

impl AppConfig {
    /// Configuração modelo gravada quando o arquivo não existe.
    pub fn template() -> Self {
        Self {
            backend: BackendConfig::default(),
            hardware: HardwareConfig::template(),
            link: LinkConfig::default(),
        }
    }

    /// Carrega e valida. Arquivo ausente gera um modelo no lugar e falha.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::template().save(path)?;
            return Err(ConfigError::Missing(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Invalid(errors));
        }

        info!("Configuração carregada de {}", path.display());
        Ok(config)
    }

    /// Parse puro, sem validação semântica.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Salva configuração em arquivo TOML.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Configuração salva em {}", path.display());
        Ok(())
    }

    /// Retorna o caminho padrão do config.toml (ao lado do executável).
    pub fn default_path() -> PathBuf {
        let exe_dir = std::env::current_exe()
            .map(|p| p.parent().unwrap_or(Path::new(".")).to_path_buf())
            .unwrap_or_else(|_| PathBuf::from("."));
        exe_dir.join("config.toml")
    }

    /// Valida a configuração e retorna lista de erros.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let hw = &self.hardware;

        if hw.cpu_name.trim().is_empty() {
            errors.push("hardware.cpu_name não pode ser vazio".into());
        }
        if hw.gpu_name.trim().is_empty() {
            errors.push("hardware.gpu_name não pode ser vazio".into());
        }
        if hw.gpu_mem_size_mb == 0 {
            errors.push("hardware.gpu_mem_size_mb não pode ser 0".into());
        }
        if hw.core_label_filter.is_empty() {
            errors.push("hardware.core_label_filter não pode ser vazio".into());
        }
        if !(1..=crate::protocol::MAX_CORE_TEMPS).contains(&hw.core_sensor_count) {
            errors.push(format!(
                "hardware.core_sensor_count inválido: {} (1–{})",
                hw.core_sensor_count,
                crate::protocol::MAX_CORE_TEMPS
            ));
        }

        match self.backend.kind {
            BackendKind::Http => {
                if self.backend.port == 0 {
                    errors.push("backend.port não pode ser 0".into());
                }
                if self.backend.host.trim().is_empty() {
                    errors.push("backend.host não pode ser vazio".into());
                }
                if !in_secs_range(self.backend.timeout_secs, f64::MIN_POSITIVE, MAX_TIMEOUT_SECS) {
                    errors.push(format!(
                        "backend.timeout_secs inválido: {}",
                        self.backend.timeout_secs
                    ));
                }
            }
            BackendKind::File => {
                if self.backend.file.as_os_str().is_empty() {
                    errors.push("backend.file é obrigatório com kind = \"file\"".into());
                }
            }
            BackendKind::Wmi => {
                if self.backend.wmi_namespace.trim().is_empty() {
                    errors.push("backend.wmi_namespace não pode ser vazio".into());
                }
            }
        }

        if !in_secs_range(self.link.interval_secs, 0.1, 60.0) {
            errors.push(format!(
                "Intervalo inválido: {} (0.1–60.0)",
                self.link.interval_secs
            ));
        }
        if !in_secs_range(self.link.backoff_secs, f64::MIN_POSITIVE, MAX_BACKOFF_SECS) {
            errors.push(format!(
                "link.backoff_secs inválido: {} (até {MAX_BACKOFF_SECS})",
                self.link.backoff_secs
            ));
        }
        if self.link.baud_rate == 0 {
            errors.push("link.baud_rate não pode ser 0".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[hardware]
cpu_name = "Intel Core i7-4790K"
gpu_name = "NVIDIA GeForce GTX 1070"
gpu_mem_size_mb = 8192
"#;

    #[test]
    fn template_is_valid() {
        let config = AppConfig::template();
        let errors = config.validate();
        assert!(errors.is_empty(), "Erros: {:?}", errors);
    }

    #[test]
    fn roundtrip_toml() {
        let config = AppConfig::template();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = AppConfig::parse(&toml_str).unwrap();
        assert_eq!(config.hardware.cpu_name, parsed.hardware.cpu_name);
        assert_eq!(config.backend.kind, parsed.backend.kind);
        assert_eq!(config.link.baud_rate, parsed.link.baud_rate);
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config = AppConfig::parse(MINIMAL).unwrap();
        assert_eq!(config.hardware.gpu_mem_size_mb, 8192);
        // Outros campos devem ter valor padrão
        assert_eq!(config.link.interval_secs, 2.5);
        assert_eq!(config.link.backoff_secs, 5.0);
        assert_eq!(config.backend.url(), "http://localhost:8085/data.json");
        assert_eq!(config.hardware.core_label_filter, "Core");
        assert_eq!(config.hardware.core_sensor_count, 4);
        assert_eq!(config.hardware.gpu_mode, GpuModeSetting::Auto);
    }

    #[test]
    fn missing_hardware_section_is_parse_error() {
        assert!(AppConfig::parse("[link]\ninterval_secs = 1.0\n").is_err());
    }

    #[test]
    fn missing_required_field_is_parse_error() {
        let partial = r#"
[hardware]
cpu_name = "Intel Core i7-4790K"
gpu_name = "NVIDIA GeForce GTX 1070"
"#;
        assert!(AppConfig::parse(partial).is_err());
    }

    #[test]
    fn backend_kind_and_gpu_mode_parse_lowercase() {
        let content = format!(
            "{MINIMAL}gpu_mode = \"voltage\"\n\n[backend]\nkind = \"wmi\"\n"
        );
        let config = AppConfig::parse(&content).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Wmi);
        assert_eq!(config.hardware.gpu_mode, GpuModeSetting::Voltage);
        assert_eq!(
            config.hardware.gpu_mode.latch().mode(),
            Some(GpuMode::Voltage)
        );
    }

    #[test]
    fn validate_collects_every_problem() {
        let mut config = AppConfig::template();
        config.hardware.cpu_name = " ".into();
        config.hardware.gpu_mem_size_mb = 0;
        config.hardware.core_sensor_count = 6;
        config.link.interval_secs = 0.0;
        config.backend.port = 0;
        let errors = config.validate();
        assert_eq!(errors.len(), 5, "Erros: {:?}", errors);
    }

    #[test]
    fn non_finite_durations_are_invalid() {
        let mut config = AppConfig::template();
        config.link.interval_secs = f64::NAN;
        config.link.backoff_secs = f64::INFINITY;
        config.backend.timeout_secs = f64::NAN;
        let errors = config.validate();
        assert_eq!(errors.len(), 3, "Erros: {:?}", errors);

        config.link.interval_secs = 2.5;
        config.link.backoff_secs = 1e300;
        config.backend.timeout_secs = f64::NEG_INFINITY;
        assert_eq!(config.validate().len(), 2);
    }

    #[test]
    fn load_rejects_nan_and_inf_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let content = format!("{MINIMAL}\n[link]\ninterval_secs = nan\nbackoff_secs = inf\n");
        std::fs::write(&path, content).unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Invalid(ref e)) if e.len() == 2
        ));
    }

    #[test]
    fn file_backend_requires_path() {
        let mut config = AppConfig::template();
        config.backend.kind = BackendKind::File;
        assert_eq!(config.validate().len(), 1);
        config.backend.file = PathBuf::from("data.json");
        assert!(config.validate().is_empty());
    }

    #[test]
    fn load_missing_file_writes_template_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let err = AppConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
        assert!(path.exists());

        // O modelo gerado é válido e carrega na segunda tentativa.
        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.hardware.cpu_name, "Intel Core i7-4790K");
    }

    #[test]
    fn load_malformed_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[hardware\ncpu_name = ").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn load_invalid_values_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, MINIMAL.replace("8192", "0")).unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(ConfigError::Invalid(ref e)) if e.len() == 1
        ));
    }
}
