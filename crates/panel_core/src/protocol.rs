//! Protocolo texto do display serial.
//!
//! Um frame por tick, ASCII, sem checksum nem tamanho: o microcontrolador
//! separa as seções pelo `|`.
//!
//! ```text
//! C<cpu>|G<gpu1>|F<gpu2>|g<gpu3>|
//!
//! cpu   = <load:3>% (<temp:2>C ){1,4}
//! gpu1  = <load:3>% <temp:2>C <usedMb:4>MB    (modo memória)
//!       | <load:3>% <temp:2>C <volts>V         (modo tensão, 3 casas)
//! gpu2  = <fan%:3>% F <rpm:4> RPM
//! gpu3  = <coreClock:4>/<memClock:4>
//! ```
//!
//! Campos são alinhados à direita com espaços. Valores maiores que a
//! largura alargam o frame (sem truncamento).

use crate::types::{GpuReading, GpuSlot, ReadingSet};
use std::fmt::Display;

/// Máximo de temperaturas por core que cabem na tela.
pub const MAX_CORE_TEMPS: usize = 4;

/// Separador de seções.
pub const SECTION_END: char = '|';

/// Alinha `value` à direita com espaços até `width` caracteres.
pub fn space_pad(value: impl Display, width: usize) -> String {
    format!("{value:>width$}")
}

/// Monta o frame completo. Função pura, sem dependência de locale.
pub fn encode_frame(readings: &ReadingSet) -> String {
    let mut frame = String::with_capacity(64);
    for (prefix, block) in [
        ('C', cpu_block(readings)),
        ('G', gpu_load_block(&readings.gpu)),
        ('F', gpu_fan_block(&readings.gpu)),
        ('g', gpu_clock_block(&readings.gpu)),
    ] {
        frame.push(prefix);
        frame.push_str(&block);
        frame.push(SECTION_END);
    }
    frame
}

fn cpu_block(readings: &ReadingSet) -> String {
    let mut block = format!("{}% ", space_pad(readings.cpu_load, 3));
    for temp in readings.cpu_core_temps.iter().take(MAX_CORE_TEMPS) {
        block.push_str(&space_pad(temp, 2));
        block.push_str("C ");
    }
    block
}

fn gpu_load_block(gpu: &GpuReading) -> String {
    let slot = match gpu.slot {
        GpuSlot::UsedMb(mb) => format!("{}MB", space_pad(mb, 4)),
        GpuSlot::Voltage(volts) => format!("{volts:.3}V"),
    };
    format!("{}% {}C {slot}", space_pad(gpu.load, 3), space_pad(gpu.temp, 2))
}

fn gpu_fan_block(gpu: &GpuReading) -> String {
    format!(
        "{}% F {} RPM",
        space_pad(gpu.fan_percent, 3),
        space_pad(gpu.fan_rpm, 4)
    )
}

fn gpu_clock_block(gpu: &GpuReading) -> String {
    format!("{}/{}", space_pad(gpu.core_clock, 4), space_pad(gpu.mem_clock, 4))
}

// ──────────────────────────────────────────────
// Testes
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_readings() -> ReadingSet {
        ReadingSet {
            cpu_load: 55,
            cpu_core_temps: vec![40, 41, 39, 42],
            gpu: GpuReading {
                load: 80,
                temp: 65,
                core_clock: 1850,
                mem_clock: 2600,
                fan_percent: 60,
                fan_rpm: 1800,
                slot: GpuSlot::UsedMb(4096),
            },
        }
    }

    #[test]
    fn memory_mode_frame_is_exact() {
        assert_eq!(
            encode_frame(&sample_readings()),
            "C 55% 40C 41C 39C 42C |G 80% 65C 4096MB|F 60% F 1800 RPM|g1850/2600|"
        );
    }

    #[test]
    fn voltage_mode_keeps_three_decimals() {
        let mut readings = sample_readings();
        readings.gpu.slot = GpuSlot::Voltage(1.0);
        let frame = encode_frame(&readings);
        assert!(frame.contains("|G 80% 65C 1.000V|"), "frame: {frame}");
    }

    #[test]
    fn small_values_are_space_padded() {
        let readings = ReadingSet {
            cpu_load: 5,
            cpu_core_temps: vec![9],
            gpu: GpuReading {
                load: 0,
                temp: 7,
                core_clock: 300,
                mem_clock: 50,
                fan_percent: 0,
                fan_rpm: 0,
                slot: GpuSlot::UsedMb(12),
            },
        };
        assert_eq!(
            encode_frame(&readings),
            "C  5%  9C |G  0%  7C   12MB|F  0% F    0 RPM|g 300/  50|"
        );
    }

    #[test]
    fn only_four_core_temps_fit() {
        let mut readings = sample_readings();
        readings.cpu_core_temps = vec![40, 41, 39, 42, 43, 44];
        let frame = encode_frame(&readings);
        assert!(frame.starts_with("C 55% 40C 41C 39C 42C |G"), "frame: {frame}");
    }

    #[test]
    fn oversized_values_widen_instead_of_truncating() {
        let mut readings = sample_readings();
        readings.cpu_load = 1000;
        readings.gpu.slot = GpuSlot::UsedMb(24576);
        let frame = encode_frame(&readings);
        assert!(frame.starts_with("C1000% "));
        assert!(frame.contains("24576MB|"));
    }

    #[test]
    fn frame_has_four_sections() {
        let frame = encode_frame(&sample_readings());
        let sections: Vec<&str> = frame.split(SECTION_END).collect();
        // Último split é vazio (frame termina em '|')
        assert_eq!(sections.len(), 5);
        assert_eq!(sections[4], "");
        assert!(frame.is_ascii());
    }

    #[test]
    fn space_pad_right_aligns() {
        assert_eq!(space_pad(7, 3), "  7");
        assert_eq!(space_pad(1234, 2), "1234");
    }
}
