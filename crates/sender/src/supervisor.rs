//! Loop de polling e supervisão do link.
//!
//! ```text
//!   (porta serial aberta)
//!          │
//!          ▼
//!     Connected ──acquire ok──▶ Polling ──tick ok──▶ Polling
//!          ▲          │                    │
//!          │     acquire falhou        tick falhou
//!          │          ▼                    │
//!          └──backoff── Faulted ◀──────────┘
//! ```
//!
//! A descoberta da porta (estado `Disconnected`) acontece antes, em
//! [`crate::serial_link`]; o supervisor já nasce `Connected`. Não existe
//! estado terminal: o loop roda até o processo ser morto. Um tick ou escreve
//! um frame inteiro ou não escreve nada.

use panel_core::capability::CapabilityLatch;
use panel_core::config::HardwareConfig;
use panel_core::error::TickError;
use panel_core::extract::Snapshot;
use panel_core::protocol::encode_frame;
use panel_core::types::{GpuSlot, ReadingSet};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Origem de snapshots já conectada ao monitor de hardware.
pub trait SensorSource {
    /// Lê um snapshot novo (sem cache entre ticks).
    fn snapshot(&mut self) -> Result<Snapshot, TickError>;
}

/// Obtém uma [`SensorSource`] a partir da configuração do backend.
pub trait Connector {
    type Source: SensorSource;

    /// Tenta adquirir o backend. Falha leva ao estado `Faulted`.
    fn acquire(&mut self) -> Result<Self::Source, TickError>;

    /// Descrição para logs (URL, arquivo, namespace WMI).
    fn describe(&self) -> String;
}

/// Pausa bloqueante entre ticks e no backoff.
pub trait Pause {
    fn pause(&mut self, duration: Duration);
}

/// Pausa real via `thread::sleep`.
pub struct ThreadPause;

impl Pause for ThreadPause {
    fn pause(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Estado do link com o backend.
pub enum LinkState<S> {
    /// Porta serial aberta, backend ainda não adquirido
    Connected,
    /// Backend adquirido, enviando frames
    Polling(S),
    /// Última tentativa falhou; aguarda backoff
    Faulted,
}

impl<S> LinkState<S> {
    pub fn name(&self) -> &'static str {
        match self {
            LinkState::Connected => "Connected",
            LinkState::Polling(_) => "Polling",
            LinkState::Faulted => "Faulted",
        }
    }
}

/// Cadência do loop.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Pausa entre frames
    pub interval: Duration,
    /// Pausa antes de readquirir o backend
    pub backoff: Duration,
}

/// Máquina de estados do link: backend → pipeline → porta serial.
pub struct Supervisor<C: Connector, W: Write, P: Pause> {
    connector: C,
    transport: W,
    pause: P,
    hardware: HardwareConfig,
    latch: CapabilityLatch,
    timing: Timing,
    state: LinkState<C::Source>,
    frames_sent: u64,
    transport_faults: u64,
}

impl<C: Connector, W: Write, P: Pause> Supervisor<C, W, P> {
    pub fn new(
        connector: C,
        transport: W,
        pause: P,
        hardware: HardwareConfig,
        latch: CapabilityLatch,
        timing: Timing,
    ) -> Self {
        Self {
            connector,
            transport,
            pause,
            hardware,
            latch,
            timing,
            state: LinkState::Connected,
            frames_sent: 0,
            transport_faults: 0,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &LinkState<C::Source> {
        &self.state
    }

    #[cfg(test)]
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    #[cfg(test)]
    pub fn transport_faults(&self) -> u64 {
        self.transport_faults
    }

    #[cfg(test)]
    pub fn latch(&self) -> &CapabilityLatch {
        &self.latch
    }

    #[cfg(test)]
    pub fn transport(&self) -> &W {
        &self.transport
    }

    /// Roda para sempre.
    pub fn run(mut self) -> ! {
        info!("Supervisor iniciado – backend: {}", self.connector.describe());
        loop {
            self.step();
        }
    }

    /// Executa uma transição da máquina de estados.
    pub fn step(&mut self) {
        let state = std::mem::replace(&mut self.state, LinkState::Faulted);
        let from = state.name();
        self.state = match state {
            LinkState::Connected => match self.connector.acquire() {
                Ok(source) => {
                    info!("✓ Backend adquirido: {}", self.connector.describe());
                    LinkState::Polling(source)
                }
                Err(e) => {
                    warn!("✗ Backend indisponível ({}): {e}", self.connector.describe());
                    LinkState::Faulted
                }
            },
            LinkState::Polling(mut source) => match self.tick(&mut source) {
                Ok(()) => {
                    self.pause.pause(self.timing.interval);
                    LinkState::Polling(source)
                }
                Err(e @ TickError::Transport(_)) => {
                    // A porta aberta na partida nunca é reaberta.
                    self.transport_faults += 1;
                    error!("Tick falhou: {e}");
                    error!(
                        "  → Porta serial inutilizável ({} falha(s)); reconecte o display e reinicie o processo",
                        self.transport_faults
                    );
                    LinkState::Faulted
                }
                Err(e) => {
                    error!("Tick falhou: {e}");
                    LinkState::Faulted
                }
            },
            LinkState::Faulted => {
                debug!("Aguardando {:?} antes de reconectar", self.timing.backoff);
                self.pause.pause(self.timing.backoff);
                LinkState::Connected
            }
        };
        if from != self.state.name() {
            debug!("Estado: {from} → {}", self.state.name());
        }
    }

    fn tick(&mut self, source: &mut C::Source) -> Result<(), TickError> {
        let snapshot = source.snapshot()?;
        let readings = snapshot.readings(&self.hardware, &mut self.latch)?;
        let frame = encode_frame(&readings);

        // Frame completo montado antes de qualquer byte ir para a porta.
        self.transport.write_all(frame.as_bytes())?;
        self.transport.flush()?;
        self.frames_sent += 1;

        info!("→ #{} {} bytes | {}", self.frames_sent, frame.len(), summary(&readings));
        debug!("Frame: {frame:?}");
        Ok(())
    }
}

fn summary(r: &ReadingSet) -> String {
    let slot = match r.gpu.slot {
        GpuSlot::UsedMb(mb) => format!("{mb}MB"),
        GpuSlot::Voltage(v) => format!("{v:.3}V"),
    };
    format!(
        "CPU {}% {:?}°C | GPU {}% {}°C {} | Fan {}% {}RPM | {}/{}MHz",
        r.cpu_load,
        r.cpu_core_temps,
        r.gpu.load,
        r.gpu.temp,
        slot,
        r.gpu.fan_percent,
        r.gpu.fan_rpm,
        r.gpu.core_clock,
        r.gpu.mem_clock
    )
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
