//! Domain handlers - thin read operations over the data store.
//!
//! Each handler resolves one intent. They never raise past the dispatcher
//! boundary: a store fault becomes a `HandlerError`, an empty result a
//! specific "not found" message. Slowly-changing reference lists (supplier
//! and user listings) go through the TTL cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Months, Utc};
use serde_json::json;

use crate::cache::TtlCache;
use crate::entities::{EntityKind, EntityMap};
use crate::error::{HandlerError, ParcError};
use crate::humanize::{bullet_list, not_found, static_help};
use crate::intent::Intent;
use crate::registry::{Handler, HandlerRegistry, HandlerReply};
use crate::store::DataStore;

/// Shared context for every handler.
#[derive(Clone)]
struct Ctx {
    store: Arc<dyn DataStore>,
    cache: Arc<TtlCache<String>>,
    cache_ttl: Duration,
}

/// Build the full registry: every catalogued intent gets exactly one
/// handler. Registration happens once; a duplicate is a startup error.
pub fn default_registry(
    store: Arc<dyn DataStore>,
    cache: Arc<TtlCache<String>>,
    cache_ttl: Duration,
) -> Result<HandlerRegistry, ParcError> {
    let ctx = Ctx {
        store,
        cache,
        cache_ttl,
    };

    let mut reg = HandlerRegistry::new();
    reg.register(Intent::ListeFournisseurs, Box::new(ListSuppliers(ctx.clone())))?;
    reg.register(Intent::FournisseurIce, Box::new(SupplierIce(ctx.clone())))?;
    reg.register(Intent::RechercheFournisseur, Box::new(SearchSupplier(ctx.clone())))?;
    reg.register(Intent::CountFournisseurs, Box::new(CountSuppliers(ctx.clone())))?;
    reg.register(Intent::ListeMateriel, Box::new(ListMaterials(ctx.clone())))?;
    reg.register(Intent::DetailsMateriel, Box::new(MaterialDetails(ctx.clone())))?;
    reg.register(
        Intent::MaterielEnPanne,
        Box::new(MaterialsByStatus {
            ctx: ctx.clone(),
            status: "en panne",
        }),
    )?;
    reg.register(Intent::MaterielParLocalisation, Box::new(MaterialsByLocation(ctx.clone())))?;
    reg.register(Intent::MaterielParUtilisateur, Box::new(MaterialsByUser(ctx.clone())))?;
    reg.register(Intent::CountMateriel, Box::new(CountMaterials(ctx.clone())))?;
    reg.register(Intent::ListeCommandes, Box::new(ListOrders(ctx.clone())))?;
    reg.register(Intent::DetailsCommande, Box::new(OrderDetails(ctx.clone())))?;
    reg.register(
        Intent::CountTotalCommands,
        Box::new(CountOrders {
            ctx: ctx.clone(),
            status: None,
            label: "au total",
        }),
    )?;
    reg.register(
        Intent::CountPendingCommands,
        Box::new(CountOrders {
            ctx: ctx.clone(),
            status: Some("en attente"),
            label: "en attente",
        }),
    )?;
    reg.register(
        Intent::CountApprovedCommands,
        Box::new(CountOrders {
            ctx: ctx.clone(),
            status: Some("approuvee"),
            label: "approuvées",
        }),
    )?;
    reg.register(
        Intent::CountDeliveredCommands,
        Box::new(CountOrders {
            ctx: ctx.clone(),
            status: Some("livree"),
            label: "livrées",
        }),
    )?;
    reg.register(Intent::MontantCommandes, Box::new(OrdersAmount(ctx.clone())))?;
    reg.register(Intent::ListeLivraisons, Box::new(ListDeliveries(ctx.clone())))?;
    reg.register(Intent::LivraisonsEnRetard, Box::new(LateDeliveries(ctx.clone())))?;
    reg.register(Intent::ListeDemandes, Box::new(ListRequests(ctx.clone())))?;
    reg.register(
        Intent::DemandesEnAttente,
        Box::new(RequestsByStatus {
            ctx: ctx.clone(),
            status: "en attente",
        }),
    )?;
    reg.register(Intent::CountDemandes, Box::new(CountRequests(ctx.clone())))?;
    reg.register(Intent::WarrantyDetails, Box::new(WarrantyDetails(ctx.clone())))?;
    reg.register(Intent::WarrantyThreshold, Box::new(WarrantyThreshold(ctx.clone())))?;
    reg.register(Intent::ListeUtilisateurs, Box::new(ListUsers(ctx.clone())))?;
    reg.register(Intent::StatsGlobales, Box::new(GlobalStats(ctx.clone())))?;
    reg.register(Intent::Help, Box::new(HelpHandler))?;
    Ok(reg)
}

// =============================================================================
// Suppliers
// =============================================================================

struct ListSuppliers(Ctx);

impl Handler for ListSuppliers {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        if let Some(cached) = self.0.cache.get("liste_fournisseurs") {
            return Ok(HandlerReply::text(cached));
        }
        let suppliers = self.0.store.suppliers()?;
        if suppliers.is_empty() {
            return Ok(HandlerReply::text(not_found("fournisseur", "la liste")));
        }
        let items: Vec<String> = suppliers
            .iter()
            .map(|s| format!("{} ({}) — {}", s.name, s.city, s.phone))
            .collect();
        let text = bullet_list("Fournisseurs enregistrés :", &items);
        self.0.cache.insert("liste_fournisseurs", text.clone(), self.0.cache_ttl);
        Ok(HandlerReply::text(text))
    }
}

struct SupplierIce(Ctx);

impl Handler for SupplierIce {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let name = entities
            .value(EntityKind::Supplier)
            .or_else(|| entities.value(EntityKind::QuotedName))
            .ok_or(HandlerError::MissingEntity("supplier"))?;
        let hits = self.0.store.supplier_search(name)?;
        match hits.first() {
            Some(s) => Ok(HandlerReply::text(format!("ICE de {} : {}", s.name, s.ice))
                .with_data(json!({"name": s.name, "ice": s.ice}))),
            None => Ok(HandlerReply::text(not_found("fournisseur", name))),
        }
    }
}

struct SearchSupplier(Ctx);

impl Handler for SearchSupplier {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let name = entities
            .value(EntityKind::Supplier)
            .or_else(|| entities.value(EntityKind::QuotedName))
            .ok_or(HandlerError::MissingEntity("supplier"))?;
        let hits = self.0.store.supplier_search(name)?;
        if hits.is_empty() {
            return Ok(HandlerReply::text(not_found("fournisseur", name)));
        }
        let items: Vec<String> = hits
            .iter()
            .map(|s| format!("{} — {} — ICE {}", s.name, s.city, s.ice))
            .collect();
        Ok(HandlerReply::text(bullet_list("Fournisseurs trouvés :", &items)))
    }
}

struct CountSuppliers(Ctx);

impl Handler for CountSuppliers {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let n = self.0.store.suppliers()?.len();
        Ok(HandlerReply::text(format!("Il y a {} fournisseurs enregistrés.", n)))
    }
}

// =============================================================================
// Material
// =============================================================================

struct ListMaterials(Ctx);

impl Handler for ListMaterials {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let materials = self.0.store.materials()?;
        if materials.is_empty() {
            return Ok(HandlerReply::text(not_found("matériel", "l'inventaire")));
        }
        let items: Vec<String> = materials
            .iter()
            .map(|m| format!("{} — {} ({}, {})", m.code, m.name, m.status, m.location))
            .collect();
        Ok(HandlerReply::text(bullet_list("Matériel du parc :", &items)))
    }
}

struct MaterialDetails(Ctx);

impl Handler for MaterialDetails {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let code = entities
            .value(EntityKind::Code)
            .ok_or(HandlerError::MissingEntity("code"))?;
        match self.0.store.material_by_code(code)? {
            Some(m) => {
                let assigned = m.assigned_to.as_deref().unwrap_or("personne");
                let warranty = m
                    .warranty_end
                    .map(|d| d.format("%d/%m/%Y").to_string())
                    .unwrap_or_else(|| "aucune garantie".to_string());
                Ok(HandlerReply::text(format!(
                    "{} — {}\nCatégorie : {}\nStatut : {}\nLocalisation : {}\nAffecté à : {}\nN° de série : {}\nGarantie jusqu'au : {}\nFournisseur : {}",
                    m.code, m.name, m.category, m.status, m.location, assigned, m.serial, warranty, m.supplier
                ))
                .with_data(json!({"code": m.code, "status": m.status})))
            }
            None => Ok(HandlerReply::text(not_found("matériel", code))),
        }
    }
}

struct MaterialsByStatus {
    ctx: Ctx,
    status: &'static str,
}

impl Handler for MaterialsByStatus {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let status = entities.value(EntityKind::Status).unwrap_or(self.status);
        let materials = self.ctx.store.materials_by_status(status)?;
        if materials.is_empty() {
            return Ok(HandlerReply::text(not_found("matériel", status)));
        }
        let items: Vec<String> = materials
            .iter()
            .map(|m| format!("{} — {} ({})", m.code, m.name, m.location))
            .collect();
        Ok(HandlerReply::text(bullet_list(
            &format!("Matériel « {} » :", status),
            &items,
        )))
    }
}

struct MaterialsByLocation(Ctx);

impl Handler for MaterialsByLocation {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let location = entities
            .value(EntityKind::Location)
            .ok_or(HandlerError::MissingEntity("location"))?;
        let materials = self.0.store.materials_by_location(location)?;
        if materials.is_empty() {
            return Ok(HandlerReply::text(not_found("matériel", location)));
        }
        let items: Vec<String> = materials
            .iter()
            .map(|m| format!("{} — {} ({})", m.code, m.name, m.status))
            .collect();
        Ok(HandlerReply::text(bullet_list(
            &format!("Matériel en {} :", location),
            &items,
        )))
    }
}

struct MaterialsByUser(Ctx);

impl Handler for MaterialsByUser {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let user = entities
            .value(EntityKind::User)
            .ok_or(HandlerError::MissingEntity("user"))?;
        let materials = self.0.store.materials_by_user(user)?;
        if materials.is_empty() {
            return Ok(HandlerReply::text(not_found("matériel affecté à", user)));
        }
        let items: Vec<String> = materials
            .iter()
            .map(|m| format!("{} — {}", m.code, m.name))
            .collect();
        Ok(HandlerReply::text(bullet_list(
            &format!("Matériel affecté à {} :", user),
            &items,
        )))
    }
}

struct CountMaterials(Ctx);

impl Handler for CountMaterials {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        match entities.value(EntityKind::Status) {
            Some(status) => {
                let n = self.0.store.materials_by_status(status)?.len();
                Ok(HandlerReply::text(format!(
                    "Il y a {} équipements avec le statut « {} ».",
                    n, status
                )))
            }
            None => {
                let n = self.0.store.materials()?.len();
                Ok(HandlerReply::text(format!("Le parc compte {} équipements.", n)))
            }
        }
    }
}

// =============================================================================
// Orders
// =============================================================================

struct ListOrders(Ctx);

impl Handler for ListOrders {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let orders = self.0.store.orders()?;
        let filtered: Vec<_> = match entities.value(EntityKind::Status) {
            Some(status) => orders
                .into_iter()
                .filter(|o| crate::normalize::normalize(&o.status) == status)
                .collect(),
            None => orders,
        };
        if filtered.is_empty() {
            return Ok(HandlerReply::text(not_found("commande", "les critères donnés")));
        }
        let items: Vec<String> = filtered
            .iter()
            .map(|o| format!("{} — {} — {} — {:.2} DH", o.code, o.supplier, o.status, o.total))
            .collect();
        Ok(HandlerReply::text(bullet_list("Commandes :", &items)))
    }
}

struct OrderDetails(Ctx);

impl Handler for OrderDetails {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let code = entities
            .value(EntityKind::Code)
            .ok_or(HandlerError::MissingEntity("code"))?;
        match self.0.store.order_by_code(code)? {
            Some(o) => {
                let items = if o.items.is_empty() {
                    "aucun article".to_string()
                } else {
                    o.items.join(", ")
                };
                Ok(HandlerReply::text(format!(
                    "Commande {} du {}\nFournisseur : {}\nStatut : {}\nMontant : {:.2} DH\nArticles : {}",
                    o.code,
                    o.date.format("%d/%m/%Y"),
                    o.supplier,
                    o.status,
                    o.total,
                    items
                ))
                .with_data(json!({"code": o.code, "status": o.status, "total": o.total})))
            }
            None => Ok(HandlerReply::text(not_found("commande", code))),
        }
    }
}

struct CountOrders {
    ctx: Ctx,
    status: Option<&'static str>,
    label: &'static str,
}

impl Handler for CountOrders {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let n = self.ctx.store.count_orders(self.status)?;
        Ok(HandlerReply::text(format!("Il y a {} commandes {}.", n, self.label))
            .with_data(json!({"count": n})))
    }
}

struct OrdersAmount(Ctx);

impl Handler for OrdersAmount {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let total = self.0.store.orders_total_amount()?;
        Ok(HandlerReply::text(format!(
            "Le montant total des commandes est de {:.2} DH.",
            total
        ))
        .with_data(json!({"total": total})))
    }
}

// =============================================================================
// Deliveries
// =============================================================================

struct ListDeliveries(Ctx);

impl Handler for ListDeliveries {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let deliveries = self.0.store.deliveries()?;
        if deliveries.is_empty() {
            return Ok(HandlerReply::text(not_found("livraison", "la liste")));
        }
        let items: Vec<String> = deliveries
            .iter()
            .map(|d| {
                let state = match d.received {
                    Some(r) => format!("reçue le {}", r.format("%d/%m/%Y")),
                    None => format!("attendue le {}", d.expected.format("%d/%m/%Y")),
                };
                format!("commande {} — {} — {}", d.order_code, d.carrier, state)
            })
            .collect();
        Ok(HandlerReply::text(bullet_list("Livraisons :", &items)))
    }
}

struct LateDeliveries(Ctx);

impl Handler for LateDeliveries {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let today = Utc::now().date_naive();
        let late: Vec<_> = self
            .0
            .store
            .deliveries()?
            .into_iter()
            .filter(|d| d.is_late(today))
            .collect();
        if late.is_empty() {
            return Ok(HandlerReply::text(
                "Aucune livraison en retard. Toutes les réceptions sont dans les délais.".to_string(),
            ));
        }
        let items: Vec<String> = late
            .iter()
            .map(|d| {
                format!(
                    "commande {} — prévue le {} — {}",
                    d.order_code,
                    d.expected.format("%d/%m/%Y"),
                    d.carrier
                )
            })
            .collect();
        Ok(HandlerReply::text(bullet_list("Livraisons en retard :", &items)))
    }
}

// =============================================================================
// Equipment requests
// =============================================================================

struct ListRequests(Ctx);

impl Handler for ListRequests {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let requests = self.0.store.equipment_requests()?;
        if requests.is_empty() {
            return Ok(HandlerReply::text(not_found("demande", "la liste")));
        }
        let items: Vec<String> = requests
            .iter()
            .map(|r| format!("{} — {} demande {} ({})", r.id, r.requester, r.item, r.status))
            .collect();
        Ok(HandlerReply::text(bullet_list("Demandes de matériel :", &items)))
    }
}

struct RequestsByStatus {
    ctx: Ctx,
    status: &'static str,
}

impl Handler for RequestsByStatus {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let requests = self.ctx.store.requests_by_status(self.status)?;
        if requests.is_empty() {
            return Ok(HandlerReply::text(format!(
                "Aucune demande « {} » pour le moment.",
                self.status
            )));
        }
        let items: Vec<String> = requests
            .iter()
            .map(|r| format!("{} — {} demande {}", r.id, r.requester, r.item))
            .collect();
        Ok(HandlerReply::text(bullet_list(
            &format!("Demandes « {} » :", self.status),
            &items,
        )))
    }
}

struct CountRequests(Ctx);

impl Handler for CountRequests {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        match entities.value(EntityKind::Status) {
            Some(status) => {
                let n = self.0.store.requests_by_status(status)?.len();
                Ok(HandlerReply::text(format!(
                    "Il y a {} demandes « {} ».",
                    n, status
                )))
            }
            None => {
                let n = self.0.store.equipment_requests()?.len();
                Ok(HandlerReply::text(format!("Il y a {} demandes de matériel.", n)))
            }
        }
    }
}

// =============================================================================
// Warranty
// =============================================================================

struct WarrantyDetails(Ctx);

impl Handler for WarrantyDetails {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let code = entities
            .value(EntityKind::Code)
            .ok_or(HandlerError::MissingEntity("code"))?;

        // The code can name a material directly or an order covering
        // several materials.
        if let Some(m) = self.0.store.material_by_code(code)? {
            let text = match m.warranty_end {
                Some(d) => format!("{} ({}) est sous garantie jusqu'au {}.", m.code, m.name, d.format("%d/%m/%Y")),
                None => format!("{} ({}) n'a pas de garantie enregistrée.", m.code, m.name),
            };
            return Ok(HandlerReply::text(text));
        }

        if let Some(order) = self.0.store.order_by_code(code)? {
            let mut items = Vec::new();
            for item_code in &order.items {
                if let Some(m) = self.0.store.material_by_code(item_code)? {
                    let w = m
                        .warranty_end
                        .map(|d| format!("garantie jusqu'au {}", d.format("%d/%m/%Y")))
                        .unwrap_or_else(|| "pas de garantie".to_string());
                    items.push(format!("{} — {}", m.code, w));
                }
            }
            if items.is_empty() {
                return Ok(HandlerReply::text(format!(
                    "La commande {} n'a aucun article avec garantie enregistrée.",
                    order.code
                )));
            }
            return Ok(HandlerReply::text(bullet_list(
                &format!("Garanties des articles de la commande {} :", order.code),
                &items,
            )));
        }

        Ok(HandlerReply::text(not_found("matériel ou commande", code)))
    }
}

struct WarrantyThreshold(Ctx);

impl Handler for WarrantyThreshold {
    fn handle(&self, entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let slot = entities
            .get(EntityKind::Threshold)
            .ok_or(HandlerError::MissingEntity("threshold"))?;
        let months: u32 = slot
            .value
            .parse()
            .map_err(|_| HandlerError::Failed(format!("bad threshold {:?}", slot.value)))?;
        let below = slot.raw.contains("moins") || slot.raw.contains("inferieur");

        let today = Utc::now().date_naive();
        let cutoff = today
            .checked_add_months(Months::new(months))
            .ok_or_else(|| HandlerError::Failed("threshold out of range".to_string()))?;

        let matching: Vec<_> = self
            .0
            .store
            .materials()?
            .into_iter()
            .filter(|m| match m.warranty_end {
                Some(end) => {
                    if below {
                        end >= today && end < cutoff
                    } else {
                        end >= cutoff
                    }
                }
                None => false,
            })
            .collect();

        let direction = if below { "moins" } else { "plus" };
        if matching.is_empty() {
            return Ok(HandlerReply::text(format!(
                "Aucun matériel avec {} de {} mois de garantie restante.",
                direction, months
            )));
        }
        let items: Vec<String> = matching
            .iter()
            .map(|m| {
                let end = m.warranty_end.expect("filtered on Some");
                format!("{} — {} — garantie jusqu'au {}", m.code, m.name, end.format("%d/%m/%Y"))
            })
            .collect();
        Ok(HandlerReply::text(bullet_list(
            &format!("Matériel avec {} de {} mois de garantie :", direction, months),
            &items,
        )))
    }
}

// =============================================================================
// Users, stats, help
// =============================================================================

struct ListUsers(Ctx);

impl Handler for ListUsers {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        if let Some(cached) = self.0.cache.get("liste_utilisateurs") {
            return Ok(HandlerReply::text(cached));
        }
        let users = self.0.store.users()?;
        if users.is_empty() {
            return Ok(HandlerReply::text(not_found("utilisateur", "la liste")));
        }
        let items: Vec<String> = users
            .iter()
            .map(|u| format!("{} ({})", u.name, u.department))
            .collect();
        let text = bullet_list("Utilisateurs :", &items);
        self.0.cache.insert("liste_utilisateurs", text.clone(), self.0.cache_ttl);
        Ok(HandlerReply::text(text))
    }
}

struct GlobalStats(Ctx);

impl Handler for GlobalStats {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        let materials = self.0.store.materials()?;
        let broken = materials
            .iter()
            .filter(|m| crate::normalize::normalize(&m.status) == "en panne")
            .count();
        let orders = self.0.store.count_orders(None)?;
        let pending = self.0.store.count_orders(Some("en attente"))?;
        let total = self.0.store.orders_total_amount()?;
        let suppliers = self.0.store.suppliers()?.len();
        let requests = self.0.store.equipment_requests()?.len();

        Ok(HandlerReply::text(format!(
            "Synthèse du parc :\n\
             • {} équipements dont {} en panne\n\
             • {} commandes ({} en attente) pour un total de {:.2} DH\n\
             • {} fournisseurs, {} demandes de matériel",
            materials.len(),
            broken,
            orders,
            pending,
            total,
            suppliers,
            requests
        ))
        .with_data(json!({
            "materials": materials.len(),
            "broken": broken,
            "orders": orders,
            "pending": pending,
            "amount": total,
        })))
    }
}

struct HelpHandler;

impl Handler for HelpHandler {
    fn handle(&self, _entities: &EntityMap, _raw: &str) -> Result<HandlerReply, HandlerError> {
        Ok(HandlerReply::text(static_help()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::EntityExtractor;
    use crate::normalize::normalize;
    use crate::store::InMemoryStore;

    fn setup() -> HandlerRegistry {
        default_registry(
            Arc::new(InMemoryStore::with_demo_data()),
            Arc::new(TtlCache::new(32)),
            Duration::from_secs(60),
        )
        .expect("registry builds")
    }

    fn run(reg: &HandlerRegistry, intent: Intent, query: &str) -> HandlerReply {
        let text = normalize(query);
        let entities = EntityExtractor::new().extract(&text);
        reg.get(intent)
            .expect("handler registered")
            .handle(&entities, query)
            .expect("handler succeeds")
    }

    #[test]
    fn test_every_intent_has_exactly_one_handler() {
        let reg = setup();
        for intent in Intent::all() {
            assert!(reg.get(*intent).is_some(), "no handler for {}", intent);
        }
        assert_eq!(reg.len(), Intent::all().len());
    }

    #[test]
    fn test_list_suppliers() {
        let reply = run(&setup(), Intent::ListeFournisseurs, "liste des fournisseurs");
        assert!(reply.text.contains("TechnoPlus"));
        assert!(reply.text.contains("Atlas Info"));
    }

    #[test]
    fn test_supplier_ice_lookup() {
        let reply = run(
            &setup(),
            Intent::FournisseurIce,
            "ICE du fournisseur TechnoPlus",
        );
        assert!(reply.text.contains("001523678000045"));
    }

    #[test]
    fn test_count_pending_orders() {
        let reply = run(
            &setup(),
            Intent::CountPendingCommands,
            "combien de commandes en attente",
        );
        assert!(reply.text.contains("1 commandes en attente"));
    }

    #[test]
    fn test_order_details_by_code() {
        let reply = run(&setup(), Intent::DetailsCommande, "statut de la commande BC23");
        assert!(reply.text.contains("BC23"));
        assert!(reply.text.contains("TechnoPlus"));
    }

    #[test]
    fn test_orders_amount() {
        let reply = run(&setup(), Intent::MontantCommandes, "montant total des commandes");
        assert!(reply.text.contains("29600.00 DH"));
    }

    #[test]
    fn test_warranty_details_material_and_order() {
        let reply = run(&setup(), Intent::WarrantyDetails, "garantie de PC-123");
        assert!(reply.text.contains("30/06/2027"));

        // BC23 is an order: warranty of each covered material.
        let reply = run(&setup(), Intent::WarrantyDetails, "garantie de BC23");
        assert!(reply.text.contains("PC-123"));
        assert!(reply.text.contains("PC-124"));
    }

    #[test]
    fn test_material_by_location() {
        let reply = run(
            &setup(),
            Intent::MaterielParLocalisation,
            "matériel de la salle b12",
        );
        assert!(reply.text.contains("PC-123"));
        assert!(!reply.text.contains("PC-124"));
    }

    #[test]
    fn test_material_not_found_is_graceful() {
        let reg = setup();
        let text = normalize("détails du matériel PC-999");
        let entities = EntityExtractor::new().extract(&text);
        let reply = reg
            .get(Intent::DetailsMateriel)
            .unwrap()
            .handle(&entities, "détails du matériel PC-999")
            .unwrap();
        assert!(reply.text.contains("PC-999"));
        assert!(reply.text.contains("reformulez"));
    }

    #[test]
    fn test_missing_entity_is_handler_error() {
        let reg = setup();
        let entities = EntityMap::default();
        let result = reg
            .get(Intent::DetailsMateriel)
            .unwrap()
            .handle(&entities, "détails");
        assert!(result.is_err());
    }

    #[test]
    fn test_supplier_list_uses_cache() {
        let cache = Arc::new(TtlCache::new(32));
        let reg = default_registry(
            Arc::new(InMemoryStore::with_demo_data()),
            Arc::clone(&cache),
            Duration::from_secs(60),
        )
        .unwrap();
        let _ = run_with(&reg, Intent::ListeFournisseurs);
        assert!(cache.get("liste_fournisseurs").is_some());

        fn run_with(reg: &HandlerRegistry, intent: Intent) -> HandlerReply {
            reg.get(intent)
                .unwrap()
                .handle(&EntityMap::default(), "")
                .unwrap()
        }
    }

    #[test]
    fn test_pending_requests() {
        let reply = run(&setup(), Intent::DemandesEnAttente, "demandes en attente");
        assert!(reply.text.contains("DEM-31"));
        assert!(!reply.text.contains("DEM-32"));
    }

    #[test]
    fn test_global_stats() {
        let reply = run(&setup(), Intent::StatsGlobales, "bilan du parc");
        assert!(reply.text.contains("3 équipements"));
        assert!(reply.text.contains("3 commandes"));
    }
}
