//! Generic cross-entity query engine - first rung of the fallback chain.
//!
//! When no specific handler answered, whatever entities were extracted
//! drive a best-effort lookup. A store fault here is never fatal: the
//! chain simply moves on to the next rung.

use tracing::warn;

use crate::entities::{EntityKind, EntityMap};
use crate::humanize::bullet_list;
use crate::normalize::normalize;
use crate::store::DataStore;

/// Try to answer from the extracted entities alone. `None` means this rung
/// has nothing to offer.
pub fn generic_answer(entities: &EntityMap, store: &dyn DataStore) -> Option<String> {
    if entities.is_empty() {
        return None;
    }
    match try_answer(entities, store) {
        Ok(answer) => answer,
        Err(e) => {
            warn!("generic query engine store fault: {}", e);
            None
        }
    }
}

fn try_answer(
    entities: &EntityMap,
    store: &dyn DataStore,
) -> Result<Option<String>, crate::error::StoreError> {
    // A concrete code is the strongest signal: material first, then order.
    if let Some(code) = entities.value(EntityKind::Code) {
        if let Some(m) = store.material_by_code(code)? {
            return Ok(Some(format!(
                "{} — {} ({}, {}, affecté à {})",
                m.code,
                m.name,
                m.status,
                m.location,
                m.assigned_to.as_deref().unwrap_or("personne")
            )));
        }
        if let Some(o) = store.order_by_code(code)? {
            return Ok(Some(format!(
                "Commande {} — {} — {} — {:.2} DH",
                o.code, o.supplier, o.status, o.total
            )));
        }
    }

    // Serial numbers: scan materials.
    if let Some(serial) = entities.value(EntityKind::Serial) {
        let hit = store
            .materials()?
            .into_iter()
            .find(|m| m.serial.to_uppercase() == serial.to_uppercase());
        if let Some(m) = hit {
            return Ok(Some(format!("Le numéro de série {} correspond à {} ({}).", serial, m.code, m.name)));
        }
    }

    // Explicitly quoted or inferred supplier name.
    let name = entities
        .value(EntityKind::QuotedName)
        .or_else(|| entities.value(EntityKind::Supplier));
    if let Some(name) = name {
        let suppliers = store.supplier_search(name)?;
        if !suppliers.is_empty() {
            let items: Vec<String> = suppliers
                .iter()
                .map(|s| format!("{} — {} — ICE {}", s.name, s.city, s.ice))
                .collect();
            return Ok(Some(bullet_list("Fournisseurs correspondants :", &items)));
        }
        // Otherwise look for a material whose name mentions it.
        let materials: Vec<_> = store
            .materials()?
            .into_iter()
            .filter(|m| normalize(&m.name).contains(name))
            .collect();
        if !materials.is_empty() {
            let items: Vec<String> = materials
                .iter()
                .map(|m| format!("{} — {}", m.code, m.name))
                .collect();
            return Ok(Some(bullet_list("Matériel correspondant :", &items)));
        }
    }

    if let Some(location) = entities.value(EntityKind::Location) {
        let materials = store.materials_by_location(location)?;
        if !materials.is_empty() {
            let items: Vec<String> = materials
                .iter()
                .map(|m| format!("{} — {} ({})", m.code, m.name, m.status))
                .collect();
            return Ok(Some(bullet_list(&format!("Matériel en {} :", location), &items)));
        }
    }

    if let Some(user) = entities.value(EntityKind::User) {
        let materials = store.materials_by_user(user)?;
        if !materials.is_empty() {
            let items: Vec<String> = materials
                .iter()
                .map(|m| format!("{} — {}", m.code, m.name))
                .collect();
            return Ok(Some(bullet_list(&format!("Matériel affecté à {} :", user), &items)));
        }
    }

    if let Some(status) = entities.value(EntityKind::Status) {
        let materials = store.materials_by_status(status)?;
        if !materials.is_empty() {
            let items: Vec<String> = materials
                .iter()
                .map(|m| format!("{} — {}", m.code, m.name))
                .collect();
            return Ok(Some(bullet_list(&format!("Matériel « {} » :", status), &items)));
        }
        let orders = store.count_orders(Some(status))?;
        if orders > 0 {
            return Ok(Some(format!("Il y a {} commandes « {} ».", orders, status)));
        }
    }

    Ok(None)
}
