//! Early-override guards - curated detectors evaluated before general
//! classification.
//!
//! These exist because shared vocabulary makes keyword scoring too coarse:
//! "commande" appears in a dozen intents, "demande" in three, "garantie"
//! in two. Each guard is a very specific conjunction; the list is ordered
//! and the first match wins.

use crate::entities::{EntityKind, EntityMap};
use crate::intent::Intent;

/// A guard hit: intent plus the fixed confidence the guard carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardHit {
    pub intent: Intent,
    pub confidence: u8,
    pub reason: &'static str,
}

const LIST_VERBS: &[&str] = &["liste", "affiche", "montre", "voir", "donne", "afficher", "lister"];

fn has_list_verb(text: &str) -> bool {
    LIST_VERBS.iter().any(|v| text.contains(v))
}

fn has_comparison(text: &str) -> bool {
    text.contains("plus de")
        || text.contains("moins de")
        || text.contains("au moins")
        || text.contains("superieur")
        || text.contains("inferieur")
}

/// Run the guard list against normalized text + extracted entities.
///
/// Order matters: more specific conjunctions come first ("garantie" with a
/// comparison beats "garantie" with a code when both are present).
pub fn run_guards(text: &str, entities: &EntityMap) -> Option<GuardHit> {
    // Warranty threshold: "garantie" + comparison operator.
    if text.contains("garantie") && (has_comparison(text) || entities.has(EntityKind::Threshold)) {
        return Some(GuardHit {
            intent: Intent::WarrantyThreshold,
            confidence: 92,
            reason: "garantie + comparaison",
        });
    }

    // Warranty details: "garantie" + a concrete code.
    if text.contains("garantie") && entities.has(EntityKind::Code) {
        return Some(GuardHit {
            intent: Intent::WarrantyDetails,
            confidence: 92,
            reason: "garantie + code",
        });
    }

    // Pending equipment requests before the generic request listing.
    if text.contains("demande") && text.contains("attente") {
        return Some(GuardHit {
            intent: Intent::DemandesEnAttente,
            confidence: 90,
            reason: "demande + attente",
        });
    }

    // Equipment request listing: "demande" + a list verb.
    if text.contains("demande") && has_list_verb(text) {
        return Some(GuardHit {
            intent: Intent::ListeDemandes,
            confidence: 90,
            reason: "demande + verbe de liste",
        });
    }

    // Late deliveries.
    if (text.contains("livraison") || text.contains("reception")) && text.contains("retard") {
        return Some(GuardHit {
            intent: Intent::LivraisonsEnRetard,
            confidence: 90,
            reason: "livraison + retard",
        });
    }

    // Order code lookup: a BC-prefixed code, or any code next to "commande".
    if let Some(code) = entities.get(EntityKind::Code) {
        let is_order_code = code.value.starts_with("BC");
        if is_order_code || text.contains("commande") {
            return Some(GuardHit {
                intent: Intent::DetailsCommande,
                confidence: 90,
                reason: "code de commande",
            });
        }
        // Material code lookup when the query names the asset domain.
        if text.contains("materiel")
            || text.contains("equipement")
            || text.contains("statut")
            || text.contains("details")
            || text.contains("fiche")
        {
            return Some(GuardHit {
                intent: Intent::DetailsMateriel,
                confidence: 90,
                reason: "code de materiel",
            });
        }
    }

    None
}
