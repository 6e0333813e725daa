//! Backend hierárquico: `data.json` do Open/LibreHardwareMonitor.
//!
//! Duas origens para o mesmo documento:
//! - servidor web embutido do monitor (Options → Remote Web Server)
//! - arquivo local, útil para testar o display com um `data.json` capturado
//!
//! O documento é lido do zero a cada tick; nada é reaproveitado.

use crate::supervisor::{Connector, SensorSource};
use panel_core::error::TickError;
use panel_core::extract::Snapshot;
use panel_core::types::SensorNode;
use reqwest::blocking::Client;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Desserializa o documento. JSON inválido é falha transitória do backend.
pub fn parse_document(text: &str) -> Result<SensorNode, TickError> {
    serde_json::from_str(text).map_err(|e| TickError::Backend(format!("JSON inválido: {e}")))
}

// ──────────────────────────────────────────────
// HTTP
// ──────────────────────────────────────────────

/// Conector para o servidor web do monitor.
pub struct OhmHttp {
    url: String,
    timeout: Duration,
}

impl OhmHttp {
    pub fn new(url: String, timeout: Duration) -> Self {
        Self { url, timeout }
    }
}

/// Sessão HTTP ativa.
pub struct OhmHttpSession {
    client: Client,
    url: String,
}

impl OhmHttpSession {
    fn fetch(&self) -> Result<SensorNode, TickError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| TickError::Backend(format!("GET {}: {e}", self.url)))?;
        let body = response
            .text()
            .map_err(|e| TickError::Backend(format!("Leitura da resposta: {e}")))?;
        debug!("data.json: {} bytes", body.len());
        parse_document(&body)
    }
}

impl Connector for OhmHttp {
    type Source = OhmHttpSession;

    /// Cria o cliente e confirma que o servidor responde com um documento válido.
    fn acquire(&mut self) -> Result<OhmHttpSession, TickError> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| TickError::Backend(format!("Cliente HTTP: {e}")))?;
        let session = OhmHttpSession {
            client,
            url: self.url.clone(),
        };
        session.fetch()?;
        Ok(session)
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

impl SensorSource for OhmHttpSession {
    fn snapshot(&mut self) -> Result<Snapshot, TickError> {
        self.fetch().map(Snapshot::Tree)
    }
}

// ──────────────────────────────────────────────
// Arquivo local
// ──────────────────────────────────────────────

/// Conector para um `data.json` em disco.
pub struct OhmFile {
    path: PathBuf,
}

impl OhmFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Sessão sobre o arquivo; relê a cada tick.
pub struct OhmFileSession {
    path: PathBuf,
}

impl OhmFileSession {
    fn read(&self) -> Result<SensorNode, TickError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            TickError::Backend(format!("Erro ao ler {}: {e}", self.path.display()))
        })?;
        parse_document(&text)
    }
}

impl Connector for OhmFile {
    type Source = OhmFileSession;

    fn acquire(&mut self) -> Result<OhmFileSession, TickError> {
        let session = OhmFileSession {
            path: self.path.clone(),
        };
        session.read()?;
        Ok(session)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

impl SensorSource for OhmFileSession {
    fn snapshot(&mut self) -> Result<Snapshot, TickError> {
        self.read().map(Snapshot::Tree)
    }
}
