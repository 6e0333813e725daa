//! Normalização de valores brutos para números prontos para o display.
//!
//! O backend hierárquico entrega texto formatado com unidade (`"67.0 °C"`).
//! Cada campo remove um número **fixo** de caracteres do fim e faz o parse
//! do resto. Frágil por construção, então o trecho removido precisa ser
//! exatamente a casa decimal (quando houver) seguida da unidade esperada, e o
//! resto precisa ser numérico; qualquer desvio é
//! [`TickError::Malformed`], nunca um valor truncado em silêncio.
//!
//! | Regra          | Remove | Unidade  | Exemplo                 |
//! |----------------|--------|----------|-------------------------|
//! | `TEMPERATURE`  | 5      | `" °C"`  | `"67.0 °C"` → `67`      |
//! | `PERCENT`      | 4      | `" %"`   | `"42.0 %"` → `42`       |
//! | `CLOCK`        | 4      | `" MHz"` | `"5200 MHz"` → `5200`   |
//! | `RPM`          | 4      | `" RPM"` | `"1800 RPM"` → `1800`   |
//! | `PERCENT_FINE` | 2      | `" %"`   | `"50.5 %"` → `50.5`     |
//! | `VOLTAGE`      | 2      | `" V"`   | `"1.062 V"` → `1.062`   |

use crate::error::TickError;
use crate::types::RawValue;

/// Precisão final do campo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    /// Inteiro (texto precisa ser inteiro; número é truncado)
    Whole,
    /// Decimal com até 3 casas
    Fine,
}

/// Regra de normalização de um campo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    /// Caracteres removidos do fim (inclui `.0` quando o monitor imprime uma casa decimal)
    pub strip: usize,
    /// Unidade que deve encerrar o trecho removido
    pub unit: &'static str,
    pub precision: Precision,
}

impl Rule {
    pub const TEMPERATURE: Rule = Rule {
        strip: 5,
        unit: " °C",
        precision: Precision::Whole,
    };
    pub const PERCENT: Rule = Rule {
        strip: 4,
        unit: " %",
        precision: Precision::Whole,
    };
    pub const CLOCK: Rule = Rule {
        strip: 4,
        unit: " MHz",
        precision: Precision::Whole,
    };
    pub const RPM: Rule = Rule {
        strip: 4,
        unit: " RPM",
        precision: Precision::Whole,
    };
    pub const PERCENT_FINE: Rule = Rule {
        strip: 2,
        unit: " %",
        precision: Precision::Fine,
    };
    pub const VOLTAGE: Rule = Rule {
        strip: 2,
        unit: " V",
        precision: Precision::Fine,
    };
}

/// Normaliza um valor bruto segundo `rule`. `field` só aparece no erro.
pub fn normalize(raw: RawValue<'_>, rule: Rule, field: &'static str) -> Result<f64, TickError> {
    match raw {
        RawValue::Text(text) => parse_text(text, rule, field),
        RawValue::Number(value) => {
            if !value.is_finite() {
                return Err(TickError::malformed(field, value.to_string()));
            }
            let value = f64::from(value);
            Ok(match rule.precision {
                Precision::Whole => value.trunc(),
                Precision::Fine => (value * 1000.0).round() / 1000.0,
            })
        }
    }
}

/// [`normalize`] para campos inteiros.
pub fn normalize_whole(raw: RawValue<'_>, rule: Rule, field: &'static str) -> Result<i32, TickError> {
    normalize(raw, rule, field).map(|v| v as i32)
}

fn parse_text(text: &str, rule: Rule, field: &'static str) -> Result<f64, TickError> {
    // Conta caracteres, não bytes: "°" ocupa 2 bytes em UTF-8.
    let len = text.chars().count();
    if len <= rule.strip {
        return Err(TickError::malformed(field, text));
    }
    let cut = text
        .char_indices()
        .nth(len - rule.strip)
        .map(|(i, _)| i)
        .ok_or_else(|| TickError::malformed(field, text))?;
    let (number, tail) = text.split_at(cut);

    // O que sobra antes da unidade só pode ser a casa decimal (".0").
    // "100 %" com 4 removidos deixaria "1"; isso é malformado, não 1.
    match tail.strip_suffix(rule.unit) {
        Some(fraction) if is_decimal_fraction(fraction) => {}
        _ => return Err(TickError::malformed(field, text)),
    }

    let parsed = match rule.precision {
        Precision::Whole => number.parse::<i32>().map(f64::from).ok(),
        Precision::Fine => number.parse::<f64>().ok().filter(|v| v.is_finite()),
    };
    parsed.ok_or_else(|| TickError::malformed(field, text))
}

fn is_decimal_fraction(s: &str) -> bool {
    s.is_empty()
        || s.strip_prefix('.')
            .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

// ──────────────────────────────────────────────
// Conversões derivadas
// ──────────────────────────────────────────────

/// O monitor reporta o clock efetivo da memória (DDR), o dobro do nominal.
pub fn half_clock(mhz: i32) -> i32 {
    mhz.div_euclid(2)
}

/// VRAM usada em MB a partir do percentual de carga e do total configurado.
pub fn used_memory_mb(total_mb: u32, used_percent: f64) -> u32 {
    (f64::from(total_mb) * used_percent / 100.0).floor().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_strips_decimal_and_unit() {
        let v = normalize_whole(RawValue::Text("67.0 °C"), Rule::TEMPERATURE, "temp").unwrap();
        assert_eq!(v, 67);
    }

    #[test]
    fn percent_strips_decimal_and_unit() {
        let v = normalize_whole(RawValue::Text("42.0 %"), Rule::PERCENT, "load").unwrap();
        assert_eq!(v, 42);
    }

    #[test]
    fn fractional_temperature_is_cut_not_rounded() {
        let v = normalize_whole(RawValue::Text("67.9 °C"), Rule::TEMPERATURE, "temp").unwrap();
        assert_eq!(v, 67);
    }

    #[test]
    fn clock_and_rpm_have_no_decimals() {
        assert_eq!(
            normalize_whole(RawValue::Text("5200 MHz"), Rule::CLOCK, "clock").unwrap(),
            5200
        );
        assert_eq!(
            normalize_whole(RawValue::Text("1800 RPM"), Rule::RPM, "rpm").unwrap(),
            1800
        );
    }

    #[test]
    fn fine_rules_keep_decimals() {
        let pct = normalize(RawValue::Text("50.5 %"), Rule::PERCENT_FINE, "mem").unwrap();
        assert_eq!(pct, 50.5);
        let volts = normalize(RawValue::Text("1.062 V"), Rule::VOLTAGE, "voltage").unwrap();
        assert_eq!(volts, 1.062);
    }

    #[test]
    fn wrong_unit_is_malformed() {
        let err = normalize_whole(RawValue::Text("42.0 %"), Rule::CLOCK, "clock").unwrap_err();
        assert!(matches!(err, TickError::Malformed { field: "clock", .. }));
    }

    #[test]
    fn wrong_shape_is_malformed_not_truncated() {
        // Clock com casa decimal: remover 4 chars deixa "1850.0", que não é inteiro.
        assert!(normalize_whole(RawValue::Text("1850.0 MHz"), Rule::CLOCK, "clock").is_err());
        // Texto curto demais
        assert!(normalize_whole(RawValue::Text(" %"), Rule::PERCENT, "load").is_err());
        assert!(normalize_whole(RawValue::Text(""), Rule::TEMPERATURE, "temp").is_err());
        // Lixo antes da unidade
        assert!(normalize_whole(RawValue::Text("ab.0 °C"), Rule::TEMPERATURE, "temp").is_err());
    }

    #[test]
    fn value_without_decimal_is_malformed_not_cut() {
        // Sem ".0" o corte fixo comeria dígitos: "100 %" viraria 1, "671 °C" viraria 6.
        let err = normalize_whole(RawValue::Text("100 %"), Rule::PERCENT, "load").unwrap_err();
        assert!(matches!(err, TickError::Malformed { field: "load", .. }));
        let err = normalize_whole(RawValue::Text("671 °C"), Rule::TEMPERATURE, "temp").unwrap_err();
        assert!(matches!(err, TickError::Malformed { field: "temp", .. }));
        assert!(normalize_whole(RawValue::Text("4x.0 %"), Rule::PERCENT, "load").is_err());
        assert!(normalize_whole(RawValue::Text("42.x %"), Rule::PERCENT, "load").is_err());
        assert_eq!(
            normalize_whole(RawValue::Text("100.0 %"), Rule::PERCENT, "load").unwrap(),
            100
        );
    }

    #[test]
    fn numbers_pass_through_with_field_precision() {
        assert_eq!(
            normalize_whole(RawValue::Number(65.8), Rule::TEMPERATURE, "temp").unwrap(),
            65
        );
        let v = normalize(RawValue::Number(1.062_37), Rule::VOLTAGE, "voltage").unwrap();
        assert!((v - 1.062).abs() < 1e-9);
    }

    #[test]
    fn non_finite_number_is_malformed() {
        assert!(normalize(RawValue::Number(f32::NAN), Rule::PERCENT, "load").is_err());
    }

    #[test]
    fn memory_clock_is_halved_and_floored() {
        let raw = normalize_whole(RawValue::Text("5200 MHz"), Rule::CLOCK, "clock").unwrap();
        assert_eq!(half_clock(raw), 2600);
        assert_eq!(half_clock(5201), 2600);
    }

    #[test]
    fn used_memory_from_percentage() {
        assert_eq!(used_memory_mb(8192, 50.0), 4096);
        assert_eq!(used_memory_mb(8192, 33.3), 2727);
        assert_eq!(used_memory_mb(8192, 0.0), 0);
    }
}
