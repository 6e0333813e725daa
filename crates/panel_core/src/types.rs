//! Tipos do pipeline: documento de sensores, leituras planas e o conjunto
//! normalizado que alimenta o encoder do display.
//!
//! Tudo aqui é recriado a cada tick; nada sobrevive entre leituras.

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Documento hierárquico (data.json)
// ──────────────────────────────────────────────

/// Nó do documento `data.json` servido pelo Open/LibreHardwareMonitor.
///
/// Só os campos usados pelo pipeline são desserializados; `id`, `Min`,
/// `Max` e `ImageURL` são ignorados.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct SensorNode {
    /// Rótulo do nó (ex: "GPU Core", "Temperatures")
    pub text: String,
    /// Valor formatado com unidade (ex: "67.0 °C"); vazio em nós de grupo
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub children: Vec<SensorNode>,
}

impl SensorNode {
    /// Nó de agrupamento (hardware ou seção).
    pub fn group(text: impl Into<String>, children: Vec<SensorNode>) -> Self {
        Self {
            text: text.into(),
            value: String::new(),
            children,
        }
    }

    /// Sensor folha com valor formatado.
    pub fn leaf(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
            children: Vec::new(),
        }
    }
}

// ──────────────────────────────────────────────
// Leituras planas (WMI)
// ──────────────────────────────────────────────

/// Tipo de sensor exposto pelo backend plano.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    Temperature,
    Load,
    Clock,
    Fan,
    Control,
    Voltage,
}

impl SensorKind {
    /// Converte o `SensorType` do LHM. Tipos sem uso no display retornam `None`.
    pub fn parse(sensor_type: &str) -> Option<Self> {
        match sensor_type {
            "Temperature" => Some(Self::Temperature),
            "Load" => Some(Self::Load),
            "Clock" => Some(Self::Clock),
            "Fan" => Some(Self::Fan),
            "Control" => Some(Self::Control),
            "Voltage" => Some(Self::Voltage),
            _ => None,
        }
    }
}

/// Sensor individual do backend plano; o valor já chega numérico.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatSensor {
    pub name: String,
    pub kind: SensorKind,
    pub value: f32,
}

impl FlatSensor {
    pub fn new(name: impl Into<String>, kind: SensorKind, value: f32) -> Self {
        Self {
            name: name.into(),
            kind,
            value,
        }
    }
}

/// Valor bruto como o backend o entrega, antes da normalização.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawValue<'a> {
    /// Texto com unidade no fim (backend hierárquico)
    Text(&'a str),
    /// Número já tipado (backend plano)
    Number(f32),
}

// ──────────────────────────────────────────────
// Conjunto normalizado
// ──────────────────────────────────────────────

/// Slot único do display que mostra memória usada **ou** tensão da GPU.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GpuSlot {
    /// VRAM usada (MB)
    UsedMb(u32),
    /// Tensão do core (V)
    Voltage(f32),
}

/// Leituras da GPU já normalizadas.
#[derive(Debug, Clone, PartialEq)]
pub struct GpuReading {
    /// Carga do core (0–100%)
    pub load: i32,
    /// Temperatura do core (°C)
    pub temp: i32,
    /// Clock do core (MHz)
    pub core_clock: i32,
    /// Clock da memória (MHz), já dividido por 2
    pub mem_clock: i32,
    /// Fan (0–100%)
    pub fan_percent: i32,
    /// Fan (RPM)
    pub fan_rpm: i32,
    pub slot: GpuSlot,
}

/// Tudo o que um frame precisa, montado a cada tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingSet {
    /// Uso total da CPU (0–100%)
    pub cpu_load: i32,
    /// Temperaturas por core, na ordem do backend (°C)
    pub cpu_core_temps: Vec<i32>,
    pub gpu: GpuReading,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ohm_document_fields() {
        let json = r#"{
            "id": 0, "Text": "Sensor", "Min": "Min", "Value": "Value", "Max": "Max",
            "ImageURL": "",
            "Children": [
                { "id": 1, "Text": "GPU Core", "Value": "67.0 °C", "Children": [] }
            ]
        }"#;
        let node: SensorNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.text, "Sensor");
        assert_eq!(node.children.len(), 1);
        assert_eq!(node.children[0].value, "67.0 °C");
    }

    #[test]
    fn missing_children_defaults_to_empty() {
        let node: SensorNode = serde_json::from_str(r#"{ "Text": "Load" }"#).unwrap();
        assert!(node.children.is_empty());
        assert!(node.value.is_empty());
    }

    #[test]
    fn sensor_kind_ignores_unused_types() {
        assert_eq!(SensorKind::parse("Control"), Some(SensorKind::Control));
        assert_eq!(SensorKind::parse("Power"), None);
        assert_eq!(SensorKind::parse("SmallData"), None);
    }
}
