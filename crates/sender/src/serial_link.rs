//! Descoberta e abertura da porta serial do display.
//!
//! Regra única: precisa existir **exatamente uma** porta. Zero ou várias é
//! erro fatal; a ambiguidade nunca é resolvida automaticamente.

use serialport::SerialPort;
use std::time::Duration;
use tracing::info;

/// Timeout de escrita da porta.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Erros de descoberta/abertura. Todos são fatais.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Falha ao enumerar portas seriais: {0}")]
    Enumerate(#[source] serialport::Error),

    #[error("Nenhuma porta serial encontrada")]
    NoPorts,

    #[error("Número de portas não é 1 ({}): não dá para escolher", .0.join(", "))]
    Ambiguous(Vec<String>),

    #[error("Falha ao abrir {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },
}

/// Escolhe a única porta da lista.
pub fn select_single(ports: Vec<String>) -> Result<String, LinkError> {
    let mut ports = ports;
    match ports.len() {
        0 => Err(LinkError::NoPorts),
        1 => Ok(ports.remove(0)),
        _ => Err(LinkError::Ambiguous(ports)),
    }
}

/// Enumera as portas do sistema e retorna a única existente.
pub fn discover() -> Result<String, LinkError> {
    let ports = serialport::available_ports()
        .map_err(LinkError::Enumerate)?
        .into_iter()
        .map(|p| p.port_name)
        .collect();
    select_single(ports)
}

/// Abre a porta com o baud rate configurado.
pub fn open(port: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, LinkError> {
    let handle = serialport::new(port, baud_rate)
        .timeout(WRITE_TIMEOUT)
        .open()
        .map_err(|source| LinkError::Open {
            port: port.to_string(),
            source,
        })?;
    info!("✓ Porta serial {port} aberta ({baud_rate} baud)");
    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_port_is_selected() {
        let port = select_single(vec!["/dev/ttyACM0".into()]).unwrap();
        assert_eq!(port, "/dev/ttyACM0");
    }

    #[test]
    fn no_port_is_fatal() {
        assert!(matches!(select_single(Vec::new()), Err(LinkError::NoPorts)));
    }

    #[test]
    fn multiple_ports_are_never_auto_resolved() {
        let err = select_single(vec!["COM3".into(), "COM4".into()]).unwrap_err();
        assert!(matches!(err, LinkError::Ambiguous(ref p) if p.len() == 2));
        assert!(err.to_string().contains("COM3, COM4"));
    }
}
