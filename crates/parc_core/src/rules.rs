//! Declarative rule table: (intent, patterns, keywords) plus phrase boosts.
//!
//! Compiled and validated once at pipeline construction, read-only for the
//! lifetime of the process. Declaration order is the tie-break order for
//! rule scoring, so the table is a Vec, never a hash map.
//!
//! All patterns and keywords are written against normalized text
//! (lower-case, diacritics folded).

use regex::Regex;

use crate::error::ParcError;
use crate::intent::Intent;

/// One intent's scoring material.
pub struct IntentRule {
    pub intent: Intent,
    pub patterns: Vec<Regex>,
    pub keywords: Vec<&'static str>,
}

/// High-precision pattern that overrides every other tier for one intent.
/// Registered only where a false negative is costly (supplier tax ids,
/// financial totals, canonical listings).
pub struct PhraseBoost {
    pub intent: Intent,
    pub pattern: Regex,
    pub weight: u8,
}

/// The compiled table. Immutable once built.
pub struct RulePatternTable {
    rules: Vec<IntentRule>,
    boosts: Vec<PhraseBoost>,
}

impl RulePatternTable {
    /// Compile and validate the full table. Fails fast on a duplicate
    /// intent or an invalid pattern rather than silently re-registering.
    pub fn compile() -> Result<Self, ParcError> {
        let mut rules = Vec::new();
        for (intent, patterns, keywords) in rule_definitions() {
            let mut compiled = Vec::with_capacity(patterns.len());
            for p in patterns {
                compiled.push(Regex::new(p).map_err(|e| {
                    ParcError::PatternTable(format!("intent {}: bad pattern {:?}: {}", intent, p, e))
                })?);
            }
            if rules.iter().any(|r: &IntentRule| r.intent == intent) {
                return Err(ParcError::PatternTable(format!(
                    "intent {} registered twice",
                    intent
                )));
            }
            rules.push(IntentRule {
                intent,
                patterns: compiled,
                keywords,
            });
        }

        let mut boosts = Vec::new();
        for (intent, pattern, weight) in boost_definitions() {
            boosts.push(PhraseBoost {
                intent,
                pattern: Regex::new(pattern).map_err(|e| {
                    ParcError::PatternTable(format!("boost {}: bad pattern {:?}: {}", intent, pattern, e))
                })?,
                weight,
            });
        }

        Ok(Self { rules, boosts })
    }

    pub fn rules(&self) -> &[IntentRule] {
        &self.rules
    }

    pub fn boosts(&self) -> &[PhraseBoost] {
        &self.boosts
    }

    /// First phrase boost matching the normalized text, in declaration order.
    pub fn matching_boost(&self, text: &str) -> Option<&PhraseBoost> {
        self.boosts.iter().find(|b| b.pattern.is_match(text))
    }

    /// Whether any boost for this specific intent matches (rule scoring).
    pub fn boost_matches_intent(&self, intent: Intent, text: &str) -> bool {
        self.boosts
            .iter()
            .any(|b| b.intent == intent && b.pattern.is_match(text))
    }
}

type RuleDef = (Intent, &'static [&'static str], Vec<&'static str>);

fn rule_definitions() -> Vec<RuleDef> {
    vec![
        (
            Intent::ListeFournisseurs,
            &[
                r"liste .*fournisseurs?\b",
                r"(affiche|montre|voir|donne).*fournisseurs?\b",
                r"tous (les|nos) fournisseurs\b",
            ],
            vec!["fournisseur", "fournisseurs", "liste", "societes"],
        ),
        (
            Intent::FournisseurIce,
            &[r"\bice\b.*fournisseur", r"fournisseur.*\bice\b", r"numero ice\b"],
            vec!["ice", "fiscal", "identifiant"],
        ),
        (
            Intent::RechercheFournisseur,
            &[r"(cherche|trouve|recherche).*fournisseur"],
            vec!["cherche", "trouve", "recherche", "fournisseur"],
        ),
        (
            Intent::CountFournisseurs,
            &[r"(combien|nombre) de fournisseurs?\b"],
            vec!["combien", "nombre", "fournisseurs"],
        ),
        (
            Intent::ListeMateriel,
            &[
                r"liste d(u|es) (materiels?|equipements?)\b",
                r"tout le materiel\b",
                r"inventaire\b",
            ],
            vec!["materiel", "equipement", "liste", "inventaire", "parc"],
        ),
        (
            Intent::DetailsMateriel,
            &[r"(details?|informations?|fiche|statut) .*\b[a-z]{2,5}-?[0-9]+\b"],
            vec!["details", "fiche", "statut", "materiel"],
        ),
        (
            Intent::MaterielEnPanne,
            &[
                r"(materiels?|equipements?).*(en panne|hors service|defectueux)",
                r"(en panne|hors service|defectueux).*(materiels?|equipements?)",
            ],
            vec!["panne", "defectueux", "hors", "casse", "reparation"],
        ),
        (
            Intent::MaterielParLocalisation,
            &[r"(materiels?|equipements?|pc|imprimantes?|ecrans?).*(salle|bureau|etage|local|depot)"],
            vec!["salle", "bureau", "etage", "localisation", "emplacement"],
        ),
        (
            Intent::MaterielParUtilisateur,
            &[r"(materiels?|equipements?|pc).*(affecte|attribue|utilisateur)"],
            vec!["affecte", "attribue", "utilisateur"],
        ),
        (
            Intent::CountMateriel,
            &[r"(combien|nombre) d.*(materiels?|equipements?)\b"],
            vec!["combien", "nombre", "materiel", "equipement"],
        ),
        (
            Intent::ListeCommandes,
            &[
                r"liste des commandes\b",
                r"(affiche|montre|voir).*commandes\b",
                r"toutes les commandes\b",
            ],
            vec!["commande", "commandes", "liste", "bons"],
        ),
        (
            Intent::DetailsCommande,
            &[
                r"(details?|statut|suivi|etat) .*commande",
                r"commande \b(bc)?-?[0-9]+\b",
            ],
            vec!["details", "statut", "suivi", "commande"],
        ),
        (
            Intent::CountTotalCommands,
            &[r"(combien|nombre( total)?) de commandes\b"],
            vec!["combien", "nombre", "total", "commandes"],
        ),
        (
            Intent::CountPendingCommands,
            &[r"commandes? en attente\b"],
            vec!["attente", "commandes", "combien"],
        ),
        (
            Intent::CountApprovedCommands,
            &[r"commandes? (approuvees?|validees?)\b"],
            vec!["approuvee", "validee", "commandes"],
        ),
        (
            Intent::CountDeliveredCommands,
            &[r"commandes? livrees?\b"],
            vec!["livree", "commandes"],
        ),
        (
            Intent::MontantCommandes,
            &[
                r"montant (total )?(des? )?commandes\b",
                r"(cout|somme|valeur) des commandes\b",
                r"combien (a coute|ont coute|coutent)",
            ],
            vec!["montant", "total", "cout", "somme", "dh"],
        ),
        (
            Intent::ListeLivraisons,
            &[r"liste des livraisons\b", r"(affiche|montre|voir).*livraisons\b"],
            vec!["livraison", "livraisons", "reception"],
        ),
        (
            Intent::LivraisonsEnRetard,
            &[r"livraisons? en retard\b", r"retard de livraison\b"],
            vec!["retard", "livraison"],
        ),
        (
            Intent::ListeDemandes,
            &[
                r"(liste|affiche|montre|voir|donne).*demandes?\b",
                r"demandes? d.{0,3}(materiels?|equipements?)\b",
            ],
            vec!["demande", "demandes", "requete"],
        ),
        (
            Intent::DemandesEnAttente,
            &[r"demandes? en attente\b", r"demandes? non traitees?\b"],
            vec!["demande", "attente", "traitee"],
        ),
        (
            Intent::CountDemandes,
            &[r"(combien|nombre) de demandes\b"],
            vec!["combien", "nombre", "demandes"],
        ),
        (
            Intent::WarrantyDetails,
            &[r"garantie (de|du|pour) .*\b[a-z]{2,5}-?[0-9]+\b"],
            vec!["garantie"],
        ),
        (
            Intent::WarrantyThreshold,
            &[r"garantie.*(plus de|moins de|au moins|superieure? a|inferieure? a)"],
            vec!["garantie", "plus", "moins", "mois"],
        ),
        (
            Intent::ListeUtilisateurs,
            &[r"liste des (utilisateurs|agents|employes)\b", r"tous les utilisateurs\b"],
            vec!["utilisateurs", "agents", "employes"],
        ),
        (
            Intent::StatsGlobales,
            &[r"(statistiques?|rapport|bilan|synthese|analyse|resume)( (du parc|global|generale?))?\b"],
            vec!["statistique", "rapport", "bilan", "analyse", "synthese"],
        ),
        (
            Intent::Help,
            &[
                r"\baide\b",
                r"que (peux|sais)[- ]tu faire",
                r"comment (ca marche|t.utiliser)",
            ],
            vec!["aide", "help", "comment", "utiliser"],
        ),
    ]
}

fn boost_definitions() -> Vec<(Intent, &'static str, u8)> {
    vec![
        (Intent::ListeFournisseurs, r"^liste (de |des |du )?fournisseurs?\b", 95),
        (Intent::FournisseurIce, r"\bice\b.*fournisseurs?\b|fournisseurs?\b.*\bice\b", 95),
        (Intent::MontantCommandes, r"^montant (total )?des commandes\b", 92),
        (Intent::ListeCommandes, r"^liste des commandes\b", 92),
        (Intent::ListeMateriel, r"^liste d(u|es) (materiels?|equipements?)\b", 92),
    ]
}
