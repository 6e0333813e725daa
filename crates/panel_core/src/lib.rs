//! # Panel Core
//!
//! Núcleo do painel serial: localiza sensores no snapshot do monitor de
//! hardware, normaliza os valores e monta o frame texto de largura fixa que
//! o microcontrolador exibe.
//!
//! ## Módulos
//! - [`types`] – Documento de sensores, leituras planas e [`ReadingSet`]
//! - [`locator`] – Busca por rótulo (árvore) e por `(nome, tipo)` (lista)
//! - [`normalize`] – Remoção de unidade, parse e conversões derivadas
//! - [`capability`] – Trava do modo da GPU (memória × tensão)
//! - [`extract`] – Snapshot → [`ReadingSet`] para os dois backends
//! - [`protocol`] – Encoder do frame `C…|G…|F…|g…|`
//! - [`config`] – Configuração TOML
//! - [`error`] – Falhas de tick

pub mod capability;
pub mod config;
pub mod error;
pub mod extract;
pub mod locator;
pub mod normalize;
pub mod protocol;
pub mod types;

// Re-exports convenientes
pub use capability::{CapabilityLatch, GpuMode};
pub use config::{AppConfig, BackendKind, ConfigError, HardwareConfig};
pub use error::TickError;
pub use extract::Snapshot;
pub use protocol::encode_frame;
pub use types::{FlatSensor, ReadingSet, SensorKind, SensorNode};
