//! Localização de sensores por nome.
//!
//! Dois formatos de backend:
//! - documento hierárquico (`data.json`): busca recursiva por rótulo
//! - lista plana (WMI): busca linear por `(nome, tipo)`
//!
//! Ausência é `None`, nunca um valor sentinela.

use crate::error::TickError;
use crate::types::{FlatSensor, SensorKind, SensorNode};

/// Procura o primeiro nó com rótulo `name` na subárvore de `root`.
///
/// Ordem: o próprio nó, depois **todos** os filhos diretos, e só então
/// desce recursivamente em cada filho. Um filho direto sempre vence um
/// descendente mais profundo com o mesmo rótulo.
pub fn find_node<'a>(root: &'a SensorNode, name: &str) -> Option<&'a SensorNode> {
    if root.text == name {
        return Some(root);
    }
    find_below(root, name)
}

fn find_below<'a>(node: &'a SensorNode, name: &str) -> Option<&'a SensorNode> {
    if let Some(child) = node.children.iter().find(|c| c.text == name) {
        return Some(child);
    }
    node.children.iter().find_map(|c| find_below(c, name))
}

/// Filhos diretos de `parent` cujo rótulo contém `fragment`, na ordem do documento.
///
/// Usado para enumerar temperaturas por core (`"Core"` exclui "CPU Package").
pub fn children_containing<'a>(
    parent: &'a SensorNode,
    fragment: &'a str,
) -> impl Iterator<Item = &'a SensorNode> + 'a {
    parent
        .children
        .iter()
        .filter(move |c| c.text.contains(fragment))
}

/// Procura um sensor plano pelo par `(nome, tipo)`.
pub fn find_flat<'a>(sensors: &'a [FlatSensor], name: &str, kind: SensorKind) -> Option<&'a FlatSensor> {
    sensors.iter().find(|s| s.kind == kind && s.name == name)
}

/// Sensores `"{prefix}1"` … `"{prefix}{count}"` do tipo `kind`, todos obrigatórios.
///
/// O primeiro índice ausente vira [`TickError::NotFound`].
pub fn find_indexed<'a>(
    sensors: &'a [FlatSensor],
    prefix: &str,
    kind: SensorKind,
    count: usize,
) -> Result<Vec<&'a FlatSensor>, TickError> {
    (1..=count)
        .map(|i| {
            let name = format!("{prefix}{i}");
            find_flat(sensors, &name, kind).ok_or(TickError::NotFound(name))
        })
        .collect()
}
