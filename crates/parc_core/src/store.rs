//! Data store boundary - typed read operations over the inventory.
//!
//! The pipeline never owns schema or migrations; it consumes this trait.
//! `InMemoryStore` backs the CLI demo and the test suites, the same way a
//! production deployment would plug a relational store in.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Material {
    pub code: String,
    pub name: String,
    pub category: String,
    pub status: String,
    pub location: String,
    pub assigned_to: Option<String>,
    pub serial: String,
    pub warranty_end: Option<NaiveDate>,
    pub supplier: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub code: String,
    pub supplier: String,
    pub status: String,
    pub total: f64,
    pub date: NaiveDate,
    /// Material codes covered by this order
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub name: String,
    /// Identifiant Commun de l'Entreprise (tax id)
    pub ice: String,
    pub city: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delivery {
    pub order_code: String,
    pub expected: NaiveDate,
    pub received: Option<NaiveDate>,
    pub carrier: String,
}

impl Delivery {
    /// Late = not received and past due, or received after the expected date.
    pub fn is_late(&self, today: NaiveDate) -> bool {
        match self.received {
            Some(received) => received > self.expected,
            None => today > self.expected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquipmentRequest {
    pub id: String,
    pub requester: String,
    pub item: String,
    pub status: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub department: String,
}

/// Read operations the handlers and the generic query engine rely on.
/// Implementations must be idempotent reads with no side effects.
pub trait DataStore: Send + Sync {
    fn materials(&self) -> Result<Vec<Material>, StoreError>;
    fn material_by_code(&self, code: &str) -> Result<Option<Material>, StoreError>;
    fn materials_by_status(&self, status: &str) -> Result<Vec<Material>, StoreError>;
    fn materials_by_location(&self, location: &str) -> Result<Vec<Material>, StoreError>;
    fn materials_by_user(&self, user: &str) -> Result<Vec<Material>, StoreError>;

    fn orders(&self) -> Result<Vec<Order>, StoreError>;
    fn order_by_code(&self, code: &str) -> Result<Option<Order>, StoreError>;
    fn count_orders(&self, status: Option<&str>) -> Result<usize, StoreError>;
    fn orders_total_amount(&self) -> Result<f64, StoreError>;

    fn suppliers(&self) -> Result<Vec<Supplier>, StoreError>;
    fn supplier_search(&self, name: &str) -> Result<Vec<Supplier>, StoreError>;

    fn deliveries(&self) -> Result<Vec<Delivery>, StoreError>;

    fn equipment_requests(&self) -> Result<Vec<EquipmentRequest>, StoreError>;
    fn requests_by_status(&self, status: &str) -> Result<Vec<EquipmentRequest>, StoreError>;

    fn users(&self) -> Result<Vec<User>, StoreError>;

    /// One-line summaries of every record, for the retrieval fallback.
    fn summaries(&self) -> Result<Vec<String>, StoreError>;
}

/// In-memory store used by tests and the demo CLI.
#[derive(Default)]
pub struct InMemoryStore {
    pub materials: Vec<Material>,
    pub orders: Vec<Order>,
    pub suppliers: Vec<Supplier>,
    pub deliveries: Vec<Delivery>,
    pub requests: Vec<EquipmentRequest>,
    pub users: Vec<User>,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid literal date")
}

impl InMemoryStore {
    /// Small but representative dataset covering every entity type.
    pub fn with_demo_data() -> Self {
        Self {
            materials: vec![
                Material {
                    code: "PC-123".into(),
                    name: "Poste de travail Dell".into(),
                    category: "ordinateur".into(),
                    status: "en service".into(),
                    location: "salle b12".into(),
                    assigned_to: Some("karim".into()),
                    serial: "48AX21".into(),
                    warranty_end: Some(date(2027, 6, 30)),
                    supplier: "TechnoPlus".into(),
                    price: 8500.0,
                },
                Material {
                    code: "PC-124".into(),
                    name: "Poste de travail HP".into(),
                    category: "ordinateur".into(),
                    status: "en panne".into(),
                    location: "bureau 3".into(),
                    assigned_to: Some("alami".into()),
                    serial: "77QD03".into(),
                    warranty_end: Some(date(2025, 1, 15)),
                    supplier: "Atlas Info".into(),
                    price: 7900.0,
                },
                Material {
                    code: "IMP-7".into(),
                    name: "Imprimante laser".into(),
                    category: "imprimante".into(),
                    status: "disponible".into(),
                    location: "depot 1".into(),
                    assigned_to: None,
                    serial: "LZ5520".into(),
                    warranty_end: None,
                    supplier: "Maroc Bureau".into(),
                    price: 3200.0,
                },
            ],
            orders: vec![
                Order {
                    code: "BC23".into(),
                    supplier: "TechnoPlus".into(),
                    status: "livree".into(),
                    total: 17000.0,
                    date: date(2024, 3, 15),
                    items: vec!["PC-123".into(), "PC-124".into()],
                },
                Order {
                    code: "BC24".into(),
                    supplier: "Maroc Bureau".into(),
                    status: "en attente".into(),
                    total: 3200.0,
                    date: date(2024, 5, 2),
                    items: vec!["IMP-7".into()],
                },
                Order {
                    code: "BC25".into(),
                    supplier: "Atlas Info".into(),
                    status: "approuvee".into(),
                    total: 9400.0,
                    date: date(2024, 6, 11),
                    items: vec![],
                },
            ],
            suppliers: vec![
                Supplier {
                    name: "TechnoPlus".into(),
                    ice: "001523678000045".into(),
                    city: "Casablanca".into(),
                    phone: "0522-44-55-66".into(),
                },
                Supplier {
                    name: "Atlas Info".into(),
                    ice: "002211459000031".into(),
                    city: "Rabat".into(),
                    phone: "0537-70-80-90".into(),
                },
                Supplier {
                    name: "Maroc Bureau".into(),
                    ice: "000987345000017".into(),
                    city: "Casablanca".into(),
                    phone: "0522-20-30-40".into(),
                },
            ],
            deliveries: vec![
                Delivery {
                    order_code: "BC23".into(),
                    expected: date(2024, 4, 1),
                    received: Some(date(2024, 3, 28)),
                    carrier: "CTM Messagerie".into(),
                },
                Delivery {
                    order_code: "BC24".into(),
                    expected: date(2024, 5, 20),
                    received: None,
                    carrier: "Amana".into(),
                },
            ],
            requests: vec![
                EquipmentRequest {
                    id: "DEM-31".into(),
                    requester: "karim".into(),
                    item: "ecran 27 pouces".into(),
                    status: "en attente".into(),
                    date: date(2024, 6, 1),
                },
                EquipmentRequest {
                    id: "DEM-32".into(),
                    requester: "salma".into(),
                    item: "clavier sans fil".into(),
                    status: "approuvee".into(),
                    date: date(2024, 6, 8),
                },
            ],
            users: vec![
                User {
                    name: "karim".into(),
                    department: "informatique".into(),
                },
                User {
                    name: "alami".into(),
                    department: "comptabilite".into(),
                },
                User {
                    name: "salma".into(),
                    department: "achats".into(),
                },
            ],
        }
    }
}

fn norm(s: &str) -> String {
    crate::normalize::normalize(s)
}

impl DataStore for InMemoryStore {
    fn materials(&self) -> Result<Vec<Material>, StoreError> {
        Ok(self.materials.clone())
    }

    fn material_by_code(&self, code: &str) -> Result<Option<Material>, StoreError> {
        let wanted = code.to_uppercase().replace('/', "-");
        Ok(self
            .materials
            .iter()
            .find(|m| m.code.to_uppercase() == wanted)
            .cloned())
    }

    fn materials_by_status(&self, status: &str) -> Result<Vec<Material>, StoreError> {
        let wanted = norm(status);
        Ok(self
            .materials
            .iter()
            .filter(|m| norm(&m.status) == wanted)
            .cloned()
            .collect())
    }

    fn materials_by_location(&self, location: &str) -> Result<Vec<Material>, StoreError> {
        let wanted = norm(location);
        Ok(self
            .materials
            .iter()
            .filter(|m| norm(&m.location).contains(&wanted))
            .cloned()
            .collect())
    }

    fn materials_by_user(&self, user: &str) -> Result<Vec<Material>, StoreError> {
        let wanted = norm(user);
        Ok(self
            .materials
            .iter()
            .filter(|m| m.assigned_to.as_deref().map(norm) == Some(wanted.clone()))
            .cloned()
            .collect())
    }

    fn orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders.clone())
    }

    fn order_by_code(&self, code: &str) -> Result<Option<Order>, StoreError> {
        let wanted = code.to_uppercase().replace('-', "");
        Ok(self
            .orders
            .iter()
            .find(|o| o.code.to_uppercase().replace('-', "") == wanted)
            .cloned())
    }

    fn count_orders(&self, status: Option<&str>) -> Result<usize, StoreError> {
        match status {
            None => Ok(self.orders.len()),
            Some(s) => {
                let wanted = norm(s);
                Ok(self.orders.iter().filter(|o| norm(&o.status) == wanted).count())
            }
        }
    }

    fn orders_total_amount(&self) -> Result<f64, StoreError> {
        Ok(self.orders.iter().map(|o| o.total).sum())
    }

    fn suppliers(&self) -> Result<Vec<Supplier>, StoreError> {
        Ok(self.suppliers.clone())
    }

    fn supplier_search(&self, name: &str) -> Result<Vec<Supplier>, StoreError> {
        let wanted = norm(name);
        Ok(self
            .suppliers
            .iter()
            .filter(|s| norm(&s.name).contains(&wanted))
            .cloned()
            .collect())
    }

    fn deliveries(&self) -> Result<Vec<Delivery>, StoreError> {
        Ok(self.deliveries.clone())
    }

    fn equipment_requests(&self) -> Result<Vec<EquipmentRequest>, StoreError> {
        Ok(self.requests.clone())
    }

    fn requests_by_status(&self, status: &str) -> Result<Vec<EquipmentRequest>, StoreError> {
        let wanted = norm(status);
        Ok(self
            .requests
            .iter()
            .filter(|r| norm(&r.status) == wanted)
            .cloned()
            .collect())
    }

    fn users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users.clone())
    }

    fn summaries(&self) -> Result<Vec<String>, StoreError> {
        let mut out = Vec::new();
        for m in &self.materials {
            out.push(format!(
                "materiel {} {} ({}) statut {} localisation {} fournisseur {}",
                m.code, m.name, m.category, m.status, m.location, m.supplier
            ));
        }
        for o in &self.orders {
            out.push(format!(
                "commande {} fournisseur {} statut {} montant {} dh du {}",
                o.code, o.supplier, o.status, o.total, o.date
            ));
        }
        for s in &self.suppliers {
            out.push(format!("fournisseur {} ice {} ville {}", s.name, s.ice, s.city));
        }
        for d in &self.deliveries {
            out.push(format!(
                "livraison commande {} prevue {} transporteur {}",
                d.order_code, d.expected, d.carrier
            ));
        }
        for r in &self.requests {
            out.push(format!(
                "demande {} de {} pour {} statut {}",
                r.id, r.requester, r.item, r.status
            ));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_lookup_case_insensitive() {
        let store = InMemoryStore::with_demo_data();
        assert!(store.material_by_code("pc-123").unwrap().is_some());
        assert!(store.material_by_code("PC-123").unwrap().is_some());
        assert!(store.material_by_code("PC-999").unwrap().is_none());
    }

    #[test]
    fn test_order_lookup_tolerates_dash() {
        let store = InMemoryStore::with_demo_data();
        assert!(store.order_by_code("BC23").unwrap().is_some());
        assert!(store.order_by_code("bc-23").unwrap().is_some());
    }

    #[test]
    fn test_count_orders_by_status() {
        let store = InMemoryStore::with_demo_data();
        assert_eq!(store.count_orders(None).unwrap(), 3);
        assert_eq!(store.count_orders(Some("en attente")).unwrap(), 1);
        assert_eq!(store.count_orders(Some("livrée")).unwrap(), 1);
    }

    #[test]
    fn test_delivery_lateness() {
        let d = Delivery {
            order_code: "BC24".into(),
            expected: date(2024, 5, 20),
            received: None,
            carrier: "Amana".into(),
        };
        assert!(d.is_late(date(2024, 6, 1)));
        assert!(!d.is_late(date(2024, 5, 10)));
    }

    #[test]
    fn test_summaries_cover_all_entities() {
        let store = InMemoryStore::with_demo_data();
        let summaries = store.summaries().unwrap();
        assert!(summaries.iter().any(|s| s.starts_with("materiel")));
        assert!(summaries.iter().any(|s| s.starts_with("commande")));
        assert!(summaries.iter().any(|s| s.starts_with("fournisseur")));
        assert!(summaries.iter().any(|s| s.starts_with("livraison")));
        assert!(summaries.iter().any(|s| s.starts_with("demande")));
    }
}
