//! Detecção do modo do slot da GPU (memória usada × tensão).
//!
//! O display tem um único slot para "MB usados" ou "volts". Qual dos dois
//! o backend oferece depende do fabricante e não muda durante a execução,
//! então a decisão é tomada uma vez e travada no [`CapabilityLatch`].
//!
//! Se a detecção rodar contra um documento ainda incompleto (monitor
//! aquecendo), o modo pode travar errado até o processo reiniciar. Isso é
//! aceito; a trava nunca é corrigida depois.

use crate::extract::{Probe, SensorView};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Modo do slot da GPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuMode {
    /// Mostra VRAM usada (MB), calculada do sensor "GPU Memory" de carga
    Memory,
    /// Mostra a tensão do core (V)
    Voltage,
}

/// Decide o modo a partir de uma leitura: existe sensor de carga da memória?
pub fn detect(view: &impl SensorView) -> GpuMode {
    if view.locate(Probe::GpuMemLoad).is_some() {
        GpuMode::Memory
    } else {
        GpuMode::Voltage
    }
}

/// Trava de escrita única para o [`GpuMode`].
///
/// Pertence ao loop de polling e é passada por referência a cada tick.
#[derive(Debug, Default)]
pub struct CapabilityLatch {
    mode: Option<GpuMode>,
}

impl CapabilityLatch {
    /// Trava vazia: o primeiro tick bem-sucedido decide.
    pub fn new() -> Self {
        Self::default()
    }

    /// Trava já decidida (override da configuração).
    pub fn fixed(mode: GpuMode) -> Self {
        Self { mode: Some(mode) }
    }

    /// Modo travado, se já houver.
    pub fn mode(&self) -> Option<GpuMode> {
        self.mode
    }

    /// Lê o slot no modo travado ou, com a trava vazia, no modo que `detect`
    /// sugerir. A trava só é gravada se `read` der certo: um tick que falha
    /// não decide nada.
    pub fn resolve<T, E>(
        &mut self,
        detect: impl FnOnce() -> GpuMode,
        read: impl FnOnce(GpuMode) -> Result<T, E>,
    ) -> Result<T, E> {
        if let Some(mode) = self.mode {
            return read(mode);
        }
        let mode = detect();
        let value = read(mode)?;
        info!("Modo da GPU travado: {mode:?}");
        self.mode = Some(mode);
        Ok(value)
    }
}
