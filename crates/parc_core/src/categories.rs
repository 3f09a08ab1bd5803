//! Category detectors and their sub-classifiers.
//!
//! A boolean gate decides whether the query belongs to a broad family
//! (counting, orders, material, suppliers, deliveries, analysis, help);
//! if so, a family-specific classifier picks the most specific intent
//! inside it. Gates run in a fixed order; the first that claims the query
//! wins.

use crate::entities::{EntityKind, EntityMap};
use crate::intent::Intent;

/// Result of a category hit: intent plus the gate that fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryHit {
    pub intent: Intent,
    pub category: &'static str,
}

/// Confidence carried by every category classification.
pub const CATEGORY_CONFIDENCE: u8 = 85;

/// Token-exact check for short keywords ("ice" must not match "service").
fn has_token(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric()).any(|t| t == word)
}

pub fn run_categories(text: &str, entities: &EntityMap) -> Option<CategoryHit> {
    if is_counting_question(text) {
        return Some(CategoryHit {
            intent: classify_counting(text),
            category: "counting",
        });
    }
    if is_help_question(text) {
        return Some(CategoryHit {
            intent: Intent::Help,
            category: "help",
        });
    }
    if is_analysis_question(text) {
        return Some(CategoryHit {
            intent: Intent::StatsGlobales,
            category: "analysis",
        });
    }
    if is_order_question(text) {
        return Some(CategoryHit {
            intent: classify_order(text, entities),
            category: "orders",
        });
    }
    if is_supplier_question(text) {
        return Some(CategoryHit {
            intent: classify_supplier(text, entities),
            category: "suppliers",
        });
    }
    if is_delivery_question(text) {
        return Some(CategoryHit {
            intent: classify_delivery(text),
            category: "deliveries",
        });
    }
    if is_material_question(text) {
        return Some(CategoryHit {
            intent: classify_material(text, entities),
            category: "material",
        });
    }
    if text.contains("utilisateurs") || text.contains("employes") || text.contains("agents") {
        return Some(CategoryHit {
            intent: Intent::ListeUtilisateurs,
            category: "users",
        });
    }
    None
}

// =============================================================================
// Gates
// =============================================================================

fn is_counting_question(text: &str) -> bool {
    text.contains("combien") || text.contains("nombre de") || text.contains("nombre d'")
}

fn is_help_question(text: &str) -> bool {
    text.contains("aide")
        || text.contains("help")
        || text.contains("que peux tu")
        || text.contains("que sais tu")
        || text.contains("comment ca marche")
}

fn is_analysis_question(text: &str) -> bool {
    text.contains("statistique")
        || text.contains("rapport")
        || text.contains("bilan")
        || text.contains("synthese")
        || text.contains("analyse")
        || text.contains("vue d'ensemble")
}

fn is_order_question(text: &str) -> bool {
    text.contains("commande") || text.contains("bon de commande") || text.contains("achat")
}

fn is_supplier_question(text: &str) -> bool {
    text.contains("fournisseur") || text.contains("societe")
}

fn is_delivery_question(text: &str) -> bool {
    text.contains("livraison") || text.contains("reception")
}

fn is_material_question(text: &str) -> bool {
    text.contains("materiel")
        || text.contains("equipement")
        || text.contains("ordinateur")
        || text.contains("imprimante")
        || text.contains("ecran")
        || text.contains("serveur")
        || text.contains("inventaire")
        || has_token(text, "parc")
        || has_token(text, "pc")
}

// =============================================================================
// Sub-classifiers: most specific first
// =============================================================================

fn classify_counting(text: &str) -> Intent {
    if text.contains("commande") {
        if text.contains("attente") {
            Intent::CountPendingCommands
        } else if text.contains("approuvee") || text.contains("validee") {
            Intent::CountApprovedCommands
        } else if text.contains("livree") {
            Intent::CountDeliveredCommands
        } else {
            Intent::CountTotalCommands
        }
    } else if text.contains("demande") {
        Intent::CountDemandes
    } else if text.contains("fournisseur") {
        Intent::CountFournisseurs
    } else if is_material_question(text) {
        Intent::CountMateriel
    } else {
        Intent::CountTotalCommands
    }
}

fn classify_order(text: &str, entities: &EntityMap) -> Intent {
    if text.contains("montant")
        || text.contains("cout")
        || text.contains("somme")
        || text.contains("valeur")
        || entities.has(EntityKind::Amount)
    {
        Intent::MontantCommandes
    } else if entities.has(EntityKind::Code) {
        Intent::DetailsCommande
    } else {
        Intent::ListeCommandes
    }
}

fn classify_supplier(text: &str, entities: &EntityMap) -> Intent {
    if has_token(text, "ice") || text.contains("fiscal") {
        Intent::FournisseurIce
    } else if text.contains("combien") || text.contains("nombre") {
        Intent::CountFournisseurs
    } else if entities.has(EntityKind::Supplier) || entities.has(EntityKind::QuotedName) {
        Intent::RechercheFournisseur
    } else {
        Intent::ListeFournisseurs
    }
}

fn classify_delivery(text: &str) -> Intent {
    if text.contains("retard") {
        Intent::LivraisonsEnRetard
    } else {
        Intent::ListeLivraisons
    }
}

fn classify_material(text: &str, entities: &EntityMap) -> Intent {
    if text.contains("panne") || text.contains("hors service") || text.contains("defectueux") {
        Intent::MaterielEnPanne
    } else if entities.has(EntityKind::Location) {
        Intent::MaterielParLocalisation
    } else if entities.has(EntityKind::User)
        || text.contains("affecte")
        || text.contains("attribue")
    {
        Intent::MaterielParUtilisateur
    } else if entities.has(EntityKind::Code) {
        Intent::DetailsMateriel
    } else {
        Intent::ListeMateriel
    }
}
