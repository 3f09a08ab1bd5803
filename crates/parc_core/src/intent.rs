//! Intent catalogue and classification result types.
//!
//! Intent identifiers are stable strings consumed by the handler registry,
//! the corpus tests and the response envelope. Declaration order of the
//! catalogue is significant: within a classification tier, ties are broken
//! by the order returned from [`Intent::all`].

use serde::{Deserialize, Serialize};

use crate::entities::EntityMap;

/// Every query class the pipeline can resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Supplier listing: "liste des fournisseurs"
    ListeFournisseurs,
    /// Supplier tax-id (ICE) lookup - precision critical
    FournisseurIce,
    /// Supplier search by name
    RechercheFournisseur,
    /// Count suppliers
    CountFournisseurs,
    /// Material listing
    ListeMateriel,
    /// Material details by inventory code
    DetailsMateriel,
    /// Broken / out-of-service material
    MaterielEnPanne,
    /// Material filtered by location
    MaterielParLocalisation,
    /// Material assigned to a user
    MaterielParUtilisateur,
    /// Count materials
    CountMateriel,
    /// Order listing
    ListeCommandes,
    /// Order details by order code
    DetailsCommande,
    /// Total order count
    CountTotalCommands,
    /// Pending order count: "commandes en attente"
    CountPendingCommands,
    /// Approved order count
    CountApprovedCommands,
    /// Delivered order count
    CountDeliveredCommands,
    /// Financial total of orders - precision critical
    MontantCommandes,
    /// Delivery listing
    ListeLivraisons,
    /// Late deliveries
    LivraisonsEnRetard,
    /// Equipment request listing
    ListeDemandes,
    /// Pending equipment requests
    DemandesEnAttente,
    /// Count equipment requests
    CountDemandes,
    /// Warranty details for a specific code - precision critical
    WarrantyDetails,
    /// Warranty threshold query ("garantie de plus de 12 mois")
    WarrantyThreshold,
    /// User listing
    ListeUtilisateurs,
    /// Cross-entity statistics
    StatsGlobales,
    /// Help / capabilities
    Help,
    /// Blank input, answered before classification
    EmptyQuery,
}

impl Intent {
    /// Full catalogue in declaration order (tie-break order within a tier).
    pub fn all() -> &'static [Intent] {
        &[
            Intent::ListeFournisseurs,
            Intent::FournisseurIce,
            Intent::RechercheFournisseur,
            Intent::CountFournisseurs,
            Intent::ListeMateriel,
            Intent::DetailsMateriel,
            Intent::MaterielEnPanne,
            Intent::MaterielParLocalisation,
            Intent::MaterielParUtilisateur,
            Intent::CountMateriel,
            Intent::ListeCommandes,
            Intent::DetailsCommande,
            Intent::CountTotalCommands,
            Intent::CountPendingCommands,
            Intent::CountApprovedCommands,
            Intent::CountDeliveredCommands,
            Intent::MontantCommandes,
            Intent::ListeLivraisons,
            Intent::LivraisonsEnRetard,
            Intent::ListeDemandes,
            Intent::DemandesEnAttente,
            Intent::CountDemandes,
            Intent::WarrantyDetails,
            Intent::WarrantyThreshold,
            Intent::ListeUtilisateurs,
            Intent::StatsGlobales,
            Intent::Help,
        ]
    }

    /// Intents where a wrong-but-confident answer is worse than a fallback:
    /// inventory codes, warranty dates, tax ids, financial totals.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Intent::FournisseurIce
                | Intent::DetailsCommande
                | Intent::MontantCommandes
                | Intent::WarrantyDetails
        )
    }

    /// Parse from the stable string id (for corpus tests).
    pub fn from_id(s: &str) -> Option<Self> {
        let extra = [Intent::EmptyQuery];
        Intent::all()
            .iter()
            .chain(extra.iter())
            .copied()
            .find(|i| i.to_string() == s.to_lowercase())
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Intent::ListeFournisseurs => "liste_fournisseurs",
            Intent::FournisseurIce => "fournisseur_ice",
            Intent::RechercheFournisseur => "recherche_fournisseur",
            Intent::CountFournisseurs => "count_fournisseurs",
            Intent::ListeMateriel => "liste_materiel",
            Intent::DetailsMateriel => "details_materiel",
            Intent::MaterielEnPanne => "materiel_en_panne",
            Intent::MaterielParLocalisation => "materiel_par_localisation",
            Intent::MaterielParUtilisateur => "materiel_par_utilisateur",
            Intent::CountMateriel => "count_materiel",
            Intent::ListeCommandes => "liste_commandes",
            Intent::DetailsCommande => "details_commande",
            Intent::CountTotalCommands => "count_total_commands",
            Intent::CountPendingCommands => "count_pending_commands",
            Intent::CountApprovedCommands => "count_approved_commands",
            Intent::CountDeliveredCommands => "count_delivered_commands",
            Intent::MontantCommandes => "montant_commandes",
            Intent::ListeLivraisons => "liste_livraisons",
            Intent::LivraisonsEnRetard => "livraisons_en_retard",
            Intent::ListeDemandes => "liste_demandes",
            Intent::DemandesEnAttente => "demandes_en_attente",
            Intent::CountDemandes => "count_demandes",
            Intent::WarrantyDetails => "warranty_details",
            Intent::WarrantyThreshold => "warranty_threshold",
            Intent::ListeUtilisateurs => "liste_utilisateurs",
            Intent::StatsGlobales => "stats_globales",
            Intent::Help => "help",
            Intent::EmptyQuery => "empty_query",
        };
        write!(f, "{}", s)
    }
}

/// Which tier produced a classification.
///
/// Declaration order is priority order: when two tiers could claim the same
/// intent, the earlier tier wins and later tiers are never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// High-precision phrase pattern for a precision-critical intent
    PhraseBoost,
    /// Curated domain guard evaluated before general scoring
    EarlyOverride,
    /// Category gate + sub-classifier, or weighted rule scoring
    RuleScore,
    /// Embedding similarity against example utterances
    Semantic,
    /// Rule scoring where fuzzy keyword matches were decisive
    FuzzyRule,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Tier::PhraseBoost => "phrase_boost",
            Tier::EarlyOverride => "early_override",
            Tier::RuleScore => "rule_score",
            Tier::Semantic => "semantic",
            Tier::FuzzyRule => "fuzzy_rule",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of classification. Immutable; consumed once by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Resolved intent
    pub intent: Intent,
    /// Confidence, 0-100
    pub confidence: u8,
    /// Tier that produced the result
    pub tier: Tier,
    /// Finer-grained label for debugging ("category:counting", ...)
    pub method: String,
    /// Slots extracted from the query
    pub entities: EntityMap,
    /// Original (raw) query text
    pub query: String,
}

impl ClassificationResult {
    pub fn new(
        intent: Intent,
        confidence: u8,
        tier: Tier,
        method: impl Into<String>,
        entities: EntityMap,
        query: &str,
    ) -> Self {
        Self {
            intent,
            confidence: confidence.min(100),
            tier,
            method: method.into(),
            entities,
            query: query.to_string(),
        }
    }
}
