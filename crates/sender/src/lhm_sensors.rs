//! Backend plano: sensores do LibreHardwareMonitor via WMI.
//!
//! Quando o LHM roda como admin ou serviço Windows, ele publica cada sensor
//! em `root\LibreHardwareMonitor` como uma linha `(Name, SensorType, Value)`.
//! Os valores já vêm numéricos, sem unidade.
//!
//! ## Instalação do LHM como serviço
//! 1. Baixe LibreHardwareMonitor: <https://github.com/LibreHardwareMonitor/LibreHardwareMonitor>
//! 2. Execute como admin → Options → "Run On Windows Startup"
//!    **OU** instale como serviço via `sc create` / tarefa agendada.

#![cfg_attr(not(windows), allow(dead_code))]

use panel_core::types::{FlatSensor, SensorKind};
use serde::Deserialize;

// ──────────────────────────────────────────────
// WMI structs de deserialização
// ──────────────────────────────────────────────

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct LhmSensor {
    name: String,
    sensor_type: String,
    value: f32,
}

/// Converte as linhas do WMI. Tipos que o display não usa (Power, Data...)
/// são descartados.
fn to_flat(rows: Vec<LhmSensor>) -> Vec<FlatSensor> {
    rows.into_iter()
        .filter_map(|row| {
            SensorKind::parse(&row.sensor_type).map(|kind| FlatSensor::new(row.name, kind, row.value))
        })
        .collect()
}

#[cfg(windows)]
pub use backend::LhmWmi;

#[cfg(windows)]
mod backend {
    use super::{LhmSensor, to_flat};
    use crate::supervisor::{Connector, SensorSource};
    use panel_core::error::TickError;
    use panel_core::extract::Snapshot;
    use serde::Deserialize;
    use tracing::{debug, info, warn};
    use wmi::{COMLibrary, WMIConnection};

    const SENSOR_QUERY: &str = "SELECT Name, SensorType, Value FROM Sensor";

    #[derive(Deserialize)]
    #[serde(rename_all = "PascalCase")]
    struct LhmHardware {
        #[allow(dead_code)]
        identifier: String,
    }

    /// Verifica se o LHM WMI está acessível e possui dados.
    fn check_available(wmi: &WMIConnection) -> bool {
        match wmi.raw_query::<LhmHardware>("SELECT Identifier FROM Hardware") {
            Ok(hw) => !hw.is_empty(),
            Err(_) => false,
        }
    }

    /// Conector WMI. O COM é inicializado uma vez por thread e reaproveitado
    /// nas reconexões.
    pub struct LhmWmi {
        namespace: String,
        com: Option<COMLibrary>,
    }

    impl LhmWmi {
        pub fn new(namespace: String) -> Self {
            Self {
                namespace,
                com: None,
            }
        }

        fn com(&mut self) -> Result<COMLibrary, TickError> {
            if let Some(com) = self.com {
                return Ok(com);
            }
            let com = COMLibrary::new().map_err(|e| TickError::Backend(format!("COM: {e}")))?;
            self.com = Some(com);
            Ok(com)
        }
    }

    /// Conexão WMI ativa.
    pub struct LhmSession {
        wmi: WMIConnection,
    }

    impl Connector for LhmWmi {
        type Source = LhmSession;

        fn acquire(&mut self) -> Result<LhmSession, TickError> {
            let com = self.com()?;
            let wmi = WMIConnection::with_namespace_path(&self.namespace, com)
                .map_err(|e| TickError::Backend(format!("WMI {}: {e}", self.namespace)))?;

            if !check_available(&wmi) {
                warn!("✗ LHM WMI: nenhum hardware em {}", self.namespace);
                warn!("  → Rode o LibreHardwareMonitor como admin ou serviço Windows");
                return Err(TickError::Backend(format!(
                    "LHM WMI indisponível em {}",
                    self.namespace
                )));
            }

            let mut session = LhmSession { wmi };
            let count = match session.snapshot()? {
                Snapshot::Flat(sensors) => sensors.len(),
                Snapshot::Tree(_) => 0,
            };
            info!("✓ LHM WMI: {count} sensores disponíveis");
            Ok(session)
        }

        fn describe(&self) -> String {
            format!("WMI {}", self.namespace)
        }
    }

    impl SensorSource for LhmSession {
        fn snapshot(&mut self) -> Result<Snapshot, TickError> {
            let rows: Vec<LhmSensor> = self
                .wmi
                .raw_query(SENSOR_QUERY)
                .map_err(|e| TickError::Backend(format!("LHM Sensor query: {e}")))?;
            debug!("LHM: {} sensores", rows.len());
            Ok(Snapshot::Flat(to_flat(rows)))
        }
    }
}
