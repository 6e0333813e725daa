//! Extração: snapshot do backend → [`ReadingSet`].
//!
//! Os dois formatos de backend implementam [`SensorView`], então a
//! normalização, a detecção do modo da GPU e as conversões rodam num único
//! caminho ([`assemble`]).

use crate::capability::{self, CapabilityLatch, GpuMode};
use crate::config::HardwareConfig;
use crate::error::TickError;
use crate::locator::{children_containing, find_flat, find_indexed, find_node};
use crate::normalize::{Rule, half_clock, normalize, normalize_whole, used_memory_mb};
use crate::types::{FlatSensor, GpuReading, GpuSlot, RawValue, ReadingSet, SensorKind, SensorNode};

// ──────────────────────────────────────────────
// Sensores lógicos
// ──────────────────────────────────────────────

/// Sensor lógico que o display consome, independente do backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    CpuLoad,
    GpuLoad,
    GpuTemp,
    GpuCoreClock,
    GpuMemClock,
    GpuFanPercent,
    GpuFanRpm,
    GpuMemLoad,
    GpuVoltage,
}

impl Probe {
    /// Nome usado em logs e erros.
    pub fn label(self) -> &'static str {
        match self {
            Probe::CpuLoad => "CPU Total",
            Probe::GpuLoad => "GPU Load",
            Probe::GpuTemp => "GPU Temperature",
            Probe::GpuCoreClock => "GPU Core Clock",
            Probe::GpuMemClock => "GPU Memory Clock",
            Probe::GpuFanPercent => "GPU Fan Control",
            Probe::GpuFanRpm => "GPU Fan",
            Probe::GpuMemLoad => "GPU Memory Load",
            Probe::GpuVoltage => "GPU Core Voltage",
        }
    }

    pub fn rule(self) -> Rule {
        match self {
            Probe::CpuLoad | Probe::GpuLoad | Probe::GpuFanPercent => Rule::PERCENT,
            Probe::GpuTemp => Rule::TEMPERATURE,
            Probe::GpuCoreClock | Probe::GpuMemClock => Rule::CLOCK,
            Probe::GpuFanRpm => Rule::RPM,
            Probe::GpuMemLoad => Rule::PERCENT_FINE,
            Probe::GpuVoltage => Rule::VOLTAGE,
        }
    }
}

/// Capacidade comum aos backends: achar o valor bruto de um sensor lógico.
pub trait SensorView {
    /// Valor bruto de `probe`, ou `None` se o backend não o expõe.
    fn locate(&self, probe: Probe) -> Option<RawValue<'_>>;

    /// Temperaturas por core, na ordem do backend.
    fn core_temps(&self) -> Result<Vec<RawValue<'_>>, TickError>;
}

// ──────────────────────────────────────────────
// Backend hierárquico
// ──────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Scope {
    Cpu,
    Gpu,
}

/// Caminho de cada sensor no documento: escopo, seção e rótulos candidatos.
fn tree_path(probe: Probe) -> (Scope, Option<&'static str>, &'static [&'static str]) {
    match probe {
        Probe::CpuLoad => (Scope::Cpu, None, &["CPU Total"]),
        Probe::GpuLoad => (Scope::Gpu, Some("Load"), &["GPU Core"]),
        Probe::GpuTemp => (Scope::Gpu, Some("Temperatures"), &["GPU Core"]),
        Probe::GpuCoreClock => (Scope::Gpu, Some("Clocks"), &["GPU Core"]),
        Probe::GpuMemClock => (Scope::Gpu, Some("Clocks"), &["GPU Memory"]),
        Probe::GpuFanPercent => (Scope::Gpu, Some("Controls"), &["GPU Fan"]),
        // Algumas placas expõem "GPU", outras "GPU Fan"
        Probe::GpuFanRpm => (Scope::Gpu, Some("Fans"), &["GPU", "GPU Fan"]),
        Probe::GpuMemLoad => (Scope::Gpu, Some("Load"), &["GPU Memory"]),
        Probe::GpuVoltage => (Scope::Gpu, Some("Voltages"), &["GPU Core"]),
    }
}

/// Visão sobre o documento `data.json`, escopada no hardware configurado.
pub struct TreeView<'a> {
    cpu: &'a SensorNode,
    gpu: &'a SensorNode,
    core_filter: &'a str,
}

impl<'a> TreeView<'a> {
    /// Localiza os nós de CPU e GPU pelos nomes da configuração.
    ///
    /// Nome ausente indica configuração errada, não falha transitória, mas
    /// segue a mesma política: o tick falha.
    pub fn new(root: &'a SensorNode, hw: &'a HardwareConfig) -> Result<Self, TickError> {
        let cpu = find_node(root, &hw.cpu_name).ok_or_else(|| TickError::NotFound(hw.cpu_name.clone()))?;
        let gpu = find_node(root, &hw.gpu_name).ok_or_else(|| TickError::NotFound(hw.gpu_name.clone()))?;
        Ok(Self {
            cpu,
            gpu,
            core_filter: &hw.core_label_filter,
        })
    }
}

impl SensorView for TreeView<'_> {
    fn locate(&self, probe: Probe) -> Option<RawValue<'_>> {
        let (scope, section, labels) = tree_path(probe);
        let scope = match scope {
            Scope::Cpu => self.cpu,
            Scope::Gpu => self.gpu,
        };
        let parent = match section {
            Some(section) => find_node(scope, section)?,
            None => scope,
        };
        labels
            .iter()
            .find_map(|label| find_node(parent, label))
            .map(|node| RawValue::Text(node.value.as_str()))
    }

    fn core_temps(&self) -> Result<Vec<RawValue<'_>>, TickError> {
        let temps = find_node(self.cpu, "Temperatures")
            .ok_or_else(|| TickError::NotFound(format!("{} > Temperatures", self.cpu.text)))?;
        let cores: Vec<_> = children_containing(temps, self.core_filter)
            .map(|node| RawValue::Text(node.value.as_str()))
            .collect();
        if cores.is_empty() {
            return Err(TickError::NotFound(format!(
                "Temperatures > *{}*",
                self.core_filter
            )));
        }
        Ok(cores)
    }
}

// ──────────────────────────────────────────────
// Backend plano
// ──────────────────────────────────────────────

/// Chaves `(nome, tipo)` candidatas de cada sensor no backend plano.
fn flat_keys(probe: Probe) -> &'static [(&'static str, SensorKind)] {
    match probe {
        Probe::CpuLoad => &[("CPU Total", SensorKind::Load)],
        Probe::GpuLoad => &[("GPU Core", SensorKind::Load)],
        Probe::GpuTemp => &[("GPU Core", SensorKind::Temperature)],
        Probe::GpuCoreClock => &[("GPU Core", SensorKind::Clock)],
        Probe::GpuMemClock => &[("GPU Memory", SensorKind::Clock)],
        Probe::GpuFanPercent => &[("GPU Fan", SensorKind::Control)],
        Probe::GpuFanRpm => &[("GPU", SensorKind::Fan), ("GPU Fan", SensorKind::Fan)],
        Probe::GpuMemLoad => &[("GPU Memory", SensorKind::Load)],
        Probe::GpuVoltage => &[("GPU Core", SensorKind::Voltage)],
    }
}

/// Visão sobre a lista plana de sensores (LHM via WMI).
pub struct FlatView<'a> {
    sensors: &'a [FlatSensor],
    core_prefix: &'a str,
    core_count: usize,
}

impl<'a> FlatView<'a> {
    pub fn new(sensors: &'a [FlatSensor], hw: &'a HardwareConfig) -> Self {
        Self {
            sensors,
            core_prefix: &hw.core_sensor_prefix,
            core_count: hw.core_sensor_count,
        }
    }
}

impl SensorView for FlatView<'_> {
    fn locate(&self, probe: Probe) -> Option<RawValue<'_>> {
        flat_keys(probe)
            .iter()
            .find_map(|(name, kind)| find_flat(self.sensors, name, *kind))
            .map(|sensor| RawValue::Number(sensor.value))
    }

    fn core_temps(&self) -> Result<Vec<RawValue<'_>>, TickError> {
        let cores = find_indexed(
            self.sensors,
            self.core_prefix,
            SensorKind::Temperature,
            self.core_count,
        )?;
        Ok(cores.into_iter().map(|s| RawValue::Number(s.value)).collect())
    }
}

// ──────────────────────────────────────────────
// Snapshot e montagem
// ──────────────────────────────────────────────

/// Leitura completa de um tick, no formato nativo do backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    Tree(SensorNode),
    Flat(Vec<FlatSensor>),
}

impl Snapshot {
    /// Extrai e normaliza o [`ReadingSet`] deste snapshot.
    pub fn readings(
        &self,
        hw: &HardwareConfig,
        latch: &mut CapabilityLatch,
    ) -> Result<ReadingSet, TickError> {
        match self {
            Snapshot::Tree(root) => assemble(&TreeView::new(root, hw)?, hw, latch),
            Snapshot::Flat(sensors) => assemble(&FlatView::new(sensors, hw), hw, latch),
        }
    }
}

fn required<V: SensorView>(view: &V, probe: Probe) -> Result<RawValue<'_>, TickError> {
    view.locate(probe)
        .ok_or_else(|| TickError::NotFound(probe.label().to_string()))
}

fn whole<V: SensorView>(view: &V, probe: Probe) -> Result<i32, TickError> {
    normalize_whole(required(view, probe)?, probe.rule(), probe.label())
}

fn fine<V: SensorView>(view: &V, probe: Probe) -> Result<f64, TickError> {
    normalize(required(view, probe)?, probe.rule(), probe.label())
}

fn gpu_slot<V: SensorView>(view: &V, hw: &HardwareConfig, mode: GpuMode) -> Result<GpuSlot, TickError> {
    Ok(match mode {
        GpuMode::Memory => {
            let used_percent = fine(view, Probe::GpuMemLoad)?;
            GpuSlot::UsedMb(used_memory_mb(hw.gpu_mem_size_mb, used_percent))
        }
        GpuMode::Voltage => GpuSlot::Voltage(fine(view, Probe::GpuVoltage)? as f32),
    })
}

/// Monta o [`ReadingSet`] a partir de qualquer [`SensorView`].
///
/// A trava do modo da GPU só é gravada depois que todos os campos base e o
/// próprio valor do slot foram lidos, ou seja, num tick bem-sucedido. Depois
/// de travado, o modo manda: se o sensor do modo sumir, o tick falha em vez
/// de trocar de campo.
pub fn assemble<V: SensorView>(
    view: &V,
    hw: &HardwareConfig,
    latch: &mut CapabilityLatch,
) -> Result<ReadingSet, TickError> {
    let cpu_load = whole(view, Probe::CpuLoad)?;
    let cpu_core_temps = view
        .core_temps()?
        .into_iter()
        .map(|raw| normalize_whole(raw, Rule::TEMPERATURE, "CPU Core"))
        .collect::<Result<Vec<_>, _>>()?;

    let load = whole(view, Probe::GpuLoad)?;
    let temp = whole(view, Probe::GpuTemp)?;
    let core_clock = whole(view, Probe::GpuCoreClock)?;
    let mem_clock = half_clock(whole(view, Probe::GpuMemClock)?);
    let fan_percent = whole(view, Probe::GpuFanPercent)?;
    let fan_rpm = whole(view, Probe::GpuFanRpm)?;

    let slot = latch.resolve(|| capability::detect(view), |mode| gpu_slot(view, hw, mode))?;

    Ok(ReadingSet {
        cpu_load,
        cpu_core_temps,
        gpu: GpuReading {
            load,
            temp,
            core_clock,
            mem_clock,
            fan_percent,
            fan_rpm,
            slot,
        },
    })
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────
