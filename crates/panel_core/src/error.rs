//! Falhas de um ciclo de leitura (tick).
//!
//! Qualquer variante aborta o tick inteiro: nenhum frame parcial chega ao
//! display. O supervisor trata todas da mesma forma (estado `Faulted`).

/// Erro de um tick: backend, localização, parsing ou escrita.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    #[error("Sensor não encontrado: '{0}'")]
    NotFound(String),

    #[error("Valor malformado em {field}: {raw:?}")]
    Malformed { field: &'static str, raw: String },

    #[error("Backend indisponível: {0}")]
    Backend(String),

    #[error("Falha ao escrever na porta serial: {0}")]
    Transport(#[from] std::io::Error),
}

impl TickError {
    pub(crate) fn malformed(field: &'static str, raw: impl Into<String>) -> Self {
        TickError::Malformed {
            field,
            raw: raw.into(),
        }
    }
}
