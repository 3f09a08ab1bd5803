//! Entity extraction - typed slots from normalized query text.
//!
//! Pure function of the normalized text: same input, same slots, no hidden
//! state. Each slot type has an ordered rule list; earlier rules are more
//! specific and win. A slot that matches nothing simply stays absent -
//! extraction never fails.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Slot types the extractor knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Inventory or order code: PC-123, BC23
    Code,
    /// Serial number
    Serial,
    /// Calendar date
    Date,
    /// Lifecycle status (en attente, livree, en panne, ...)
    Status,
    /// Physical location (salle a12, bureau 3, ...)
    Location,
    /// Person a device is assigned to
    User,
    /// Supplier name
    Supplier,
    /// Numeric comparison ("plus de 12")
    Threshold,
    /// Monetary amount in dirhams
    Amount,
    /// Explicitly quoted name, overrides inferred name slots
    QuotedName,
}

/// One extracted slot: the raw substring and its normalized value.
/// Produced fresh per query, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySlot {
    pub kind: EntityKind,
    pub raw: String,
    pub value: String,
}

/// Slot map for one query. At most one slot per kind (first rule wins).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityMap {
    slots: BTreeMap<EntityKind, EntitySlot>,
}

impl EntityMap {
    pub fn get(&self, kind: EntityKind) -> Option<&EntitySlot> {
        self.slots.get(&kind)
    }

    /// Normalized value for a kind, if set.
    pub fn value(&self, kind: EntityKind) -> Option<&str> {
        self.slots.get(&kind).map(|s| s.value.as_str())
    }

    pub fn has(&self, kind: EntityKind) -> bool {
        self.slots.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntitySlot> {
        self.slots.values()
    }

    /// Insert only if the kind is still unset (earlier rules win).
    fn insert_first(&mut self, slot: EntitySlot) {
        self.slots.entry(slot.kind).or_insert(slot);
    }

    /// Insert unconditionally (quoted-name overrides).
    fn insert_override(&mut self, slot: EntitySlot) {
        self.slots.insert(slot.kind, slot);
    }
}

/// Captures common to French inventory phrasing that must never be taken
/// as a name capture ("fournisseur de rabat" must not yield supplier "de").
const NAME_STOPWORDS: &[&str] = &[
    "de", "du", "des", "le", "la", "les", "un", "une", "en", "a", "au", "aux", "qui", "que",
    "pour", "avec", "dans", "sur", "par", "et", "ou",
];

fn is_stopword(token: &str) -> bool {
    NAME_STOPWORDS.contains(&token)
}

struct SlotRule {
    regex: Regex,
    /// Index of the capture group holding the value.
    group: usize,
}

impl SlotRule {
    fn new(pattern: &str, group: usize) -> Self {
        Self {
            // Patterns are static and covered by tests; a bad one is a
            // programming error caught at startup.
            regex: Regex::new(pattern).expect("invalid slot pattern"),
            group,
        }
    }
}

/// Regex / lexicon based extractor. Compiled once at pipeline construction,
/// read-only afterwards.
pub struct EntityExtractor {
    quoted: Vec<SlotRule>,
    code: SlotRule,
    serial: Vec<SlotRule>,
    date: Vec<SlotRule>,
    amount: SlotRule,
    threshold: SlotRule,
    location: SlotRule,
    user: Vec<SlotRule>,
    supplier: Vec<SlotRule>,
    status_lexicon: Vec<(&'static str, &'static str)>,
}

impl EntityExtractor {
    pub fn new() -> Self {
        Self {
            quoted: vec![
                SlotRule::new(r#""([^"]+)""#, 1),
                SlotRule::new(r"“([^”]+)”", 1),
                SlotRule::new(r"«\s*([^»]+?)\s*»", 1),
                SlotRule::new(r"(?:^|\s)'([^']+)'(?:[\s,.?!;]|$)", 1),
            ],
            code: SlotRule::new(r"\b([a-z]{2,5})([-/]?)([0-9]{1,6})\b", 0),
            serial: vec![
                SlotRule::new(r"\bnumero de serie[\s:]*([a-z0-9]{4,})\b", 1),
                SlotRule::new(r"\bsn[:\-]?\s*([a-z0-9]{4,})\b", 1),
                SlotRule::new(r"\bserie[\s:]+([a-z0-9]{4,})\b", 1),
            ],
            date: vec![
                SlotRule::new(r"\b([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})\b", 0),
                SlotRule::new(r"\b([0-9]{1,2})[/\-]([0-9]{1,2})[/\-]([0-9]{2,4})\b", 0),
            ],
            amount: SlotRule::new(r"\b([0-9]+(?:[.,][0-9]+)?)\s*(dhs?|dirhams?|mad)\b", 1),
            threshold: SlotRule::new(
                r"\b(plus de|moins de|au moins|au plus|superieure? a|inferieure? a)\s+([0-9]+)\b",
                2,
            ),
            location: SlotRule::new(
                r"\b(salle|bureau|etage|local|depot|magasin|atelier|batiment)\s+([a-z0-9]+)\b",
                0,
            ),
            user: vec![
                SlotRule::new(r"\b(?:m\.|mr|mme|monsieur|madame)\s?([a-z]+)\b", 1),
                SlotRule::new(r"\butilisateur\s+([a-z0-9]+)\b", 1),
                SlotRule::new(r"\b(?:affecte|attribue) a ([a-z]+)\b", 1),
            ],
            supplier: vec![
                SlotRule::new(r"\bfournisseur\s+([a-z0-9]+)\b", 1),
                SlotRule::new(r"\bsociete\s+([a-z0-9]+)\b", 1),
                SlotRule::new(r"\bchez\s+([a-z0-9]+)\b", 1),
            ],
            status_lexicon: vec![
                ("en attente", "en attente"),
                ("en panne", "en panne"),
                ("hors service", "hors service"),
                ("en reparation", "en reparation"),
                ("en service", "en service"),
                ("en cours", "en cours"),
                ("approuvee", "approuvee"),
                ("approuve", "approuvee"),
                ("validee", "approuvee"),
                ("livree", "livree"),
                ("livre", "livree"),
                ("annulee", "annulee"),
                ("refusee", "refusee"),
                ("disponible", "disponible"),
                ("affecte", "affecte"),
                ("panne", "en panne"),
            ],
        }
    }

    /// Extract all slots from normalized text.
    pub fn extract(&self, text: &str) -> EntityMap {
        let mut map = EntityMap::default();
        if text.is_empty() {
            return map;
        }

        // Quoted substrings first: they may override inferred name slots.
        for rule in &self.quoted {
            if let Some(cap) = rule.regex.captures(text) {
                if let Some(m) = cap.get(rule.group) {
                    let value = m.as_str().trim().to_string();
                    if !value.is_empty() {
                        map.insert_first(EntitySlot {
                            kind: EntityKind::QuotedName,
                            raw: cap.get(0).map(|w| w.as_str().trim()).unwrap_or("").to_string(),
                            value,
                        });
                        break;
                    }
                }
            }
        }

        self.extract_code(text, &mut map);
        self.extract_serial(text, &mut map);
        self.extract_date(text, &mut map);
        self.extract_amount(text, &mut map);
        self.extract_threshold(text, &mut map);
        self.extract_status(text, &mut map);
        self.extract_location(text, &mut map);
        self.extract_named(text, &mut map);

        map
    }

    fn extract_code(&self, text: &str, map: &mut EntityMap) {
        for cap in self.code.regex.captures_iter(text) {
            let letters = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let sep = cap.get(2).map(|m| m.as_str()).unwrap_or("");
            let digits = cap.get(3).map(|m| m.as_str()).unwrap_or("");

            // Serial prefixes and bare French words are not codes.
            if letters == "sn" || is_stopword(letters) {
                continue;
            }

            let value = if sep.is_empty() {
                format!("{}{}", letters.to_uppercase(), digits)
            } else {
                format!("{}-{}", letters.to_uppercase(), digits)
            };
            map.insert_first(EntitySlot {
                kind: EntityKind::Code,
                raw: cap.get(0).map(|m| m.as_str()).unwrap_or("").to_string(),
                value,
            });
            return;
        }
    }

    fn extract_serial(&self, text: &str, map: &mut EntityMap) {
        for rule in &self.serial {
            if let Some(cap) = rule.regex.captures(text) {
                if let Some(m) = cap.get(rule.group) {
                    map.insert_first(EntitySlot {
                        kind: EntityKind::Serial,
                        raw: cap.get(0).map(|w| w.as_str()).unwrap_or("").to_string(),
                        value: m.as_str().to_uppercase(),
                    });
                    return;
                }
            }
        }
    }

    fn extract_date(&self, text: &str, map: &mut EntityMap) {
        for (idx, rule) in self.date.iter().enumerate() {
            if let Some(cap) = rule.regex.captures(text) {
                let raw = cap.get(0).map(|m| m.as_str()).unwrap_or("").to_string();
                let parsed = if idx == 0 {
                    // yyyy-mm-dd
                    parse_ymd(
                        cap.get(1).map(|m| m.as_str()),
                        cap.get(2).map(|m| m.as_str()),
                        cap.get(3).map(|m| m.as_str()),
                    )
                } else {
                    // dd/mm/yyyy (French convention)
                    parse_ymd(
                        cap.get(3).map(|m| m.as_str()),
                        cap.get(2).map(|m| m.as_str()),
                        cap.get(1).map(|m| m.as_str()),
                    )
                };
                if let Some(date) = parsed {
                    map.insert_first(EntitySlot {
                        kind: EntityKind::Date,
                        raw,
                        value: date.format("%Y-%m-%d").to_string(),
                    });
                    return;
                }
            }
        }
    }

    fn extract_amount(&self, text: &str, map: &mut EntityMap) {
        if let Some(cap) = self.amount.regex.captures(text) {
            if let Some(m) = cap.get(self.amount.group) {
                map.insert_first(EntitySlot {
                    kind: EntityKind::Amount,
                    raw: cap.get(0).map(|w| w.as_str()).unwrap_or("").to_string(),
                    value: m.as_str().replace(',', "."),
                });
            }
        }
    }

    fn extract_threshold(&self, text: &str, map: &mut EntityMap) {
        if let Some(cap) = self.threshold.regex.captures(text) {
            let raw = cap.get(0).map(|m| m.as_str()).unwrap_or("").to_string();
            // When a currency token follows the number the amount rule has
            // already claimed it; the threshold slot is still recorded so
            // handlers keep the comparison direction (raw holds "plus de").
            if let Some(m) = cap.get(self.threshold.group) {
                map.insert_first(EntitySlot {
                    kind: EntityKind::Threshold,
                    raw,
                    value: m.as_str().to_string(),
                });
            }
        }
    }

    fn extract_status(&self, text: &str, map: &mut EntityMap) {
        for (needle, canonical) in &self.status_lexicon {
            if text.contains(needle) {
                map.insert_first(EntitySlot {
                    kind: EntityKind::Status,
                    raw: (*needle).to_string(),
                    value: (*canonical).to_string(),
                });
                return;
            }
        }
    }

    fn extract_location(&self, text: &str, map: &mut EntityMap) {
        for cap in self.location.regex.captures_iter(text) {
            let place = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let id = cap.get(2).map(|m| m.as_str()).unwrap_or("");
            if is_stopword(id) {
                continue;
            }
            map.insert_first(EntitySlot {
                kind: EntityKind::Location,
                raw: cap.get(0).map(|m| m.as_str()).unwrap_or("").to_string(),
                value: format!("{} {}", place, id),
            });
            return;
        }
    }

    /// User and supplier slots. A quoted name next to the relevant keyword
    /// is an explicit override and beats the lexicon rules.
    fn extract_named(&self, text: &str, map: &mut EntityMap) {
        let quoted = map.get(EntityKind::QuotedName).cloned();

        if let Some(q) = &quoted {
            if text.contains("fournisseur") || text.contains("societe") {
                map.insert_override(EntitySlot {
                    kind: EntityKind::Supplier,
                    raw: q.raw.clone(),
                    value: q.value.clone(),
                });
            }
            if text.contains("utilisateur") || text.contains("agent") || text.contains("employe") {
                map.insert_override(EntitySlot {
                    kind: EntityKind::User,
                    raw: q.raw.clone(),
                    value: q.value.clone(),
                });
            }
        }

        if !map.has(EntityKind::User) {
            for rule in &self.user {
                if let Some(cap) = rule.regex.captures(text) {
                    if let Some(m) = cap.get(rule.group) {
                        if is_stopword(m.as_str()) {
                            continue;
                        }
                        map.insert_first(EntitySlot {
                            kind: EntityKind::User,
                            raw: cap.get(0).map(|w| w.as_str()).unwrap_or("").to_string(),
                            value: m.as_str().to_string(),
                        });
                        break;
                    }
                }
            }
        }

        if !map.has(EntityKind::Supplier) {
            for rule in &self.supplier {
                if let Some(cap) = rule.regex.captures(text) {
                    if let Some(m) = cap.get(rule.group) {
                        if is_stopword(m.as_str()) {
                            continue;
                        }
                        map.insert_first(EntitySlot {
                            kind: EntityKind::Supplier,
                            raw: cap.get(0).map(|w| w.as_str()).unwrap_or("").to_string(),
                            value: m.as_str().to_string(),
                        });
                        break;
                    }
                }
            }
        }
    }
}

impl Default for EntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_ymd(y: Option<&str>, m: Option<&str>, d: Option<&str>) -> Option<NaiveDate> {
    let mut year: i32 = y?.parse().ok()?;
    let month: u32 = m?.parse().ok()?;
    let day: u32 = d?.parse().ok()?;
    if year < 100 {
        year += 2000;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn extract(input: &str) -> EntityMap {
        EntityExtractor::new().extract(&normalize(input))
    }

    #[test]
    fn test_code_extraction_case_insensitive() {
        for input in ["où est le PC-123", "ou est le pc-123", "Ou Est Le Pc-123"] {
            let map = extract(input);
            assert_eq!(map.value(EntityKind::Code), Some("PC-123"), "input {input}");
        }
    }

    #[test]
    fn test_code_without_separator() {
        let map = extract("garantie de BC23");
        assert_eq!(map.value(EntityKind::Code), Some("BC23"));
    }

    #[test]
    fn test_code_skips_stopwords_and_serial_prefix() {
        let map = extract("sn 48a2x de 2023");
        assert!(map.value(EntityKind::Code).is_none());
    }

    #[test]
    fn test_serial_extraction() {
        let map = extract("matériel numéro de série 48ax21");
        assert_eq!(map.value(EntityKind::Serial), Some("48AX21"));
        let map = extract("SN-48AX21 est où ?");
        assert_eq!(map.value(EntityKind::Serial), Some("48AX21"));
    }

    #[test]
    fn test_date_french_convention() {
        let map = extract("commandes du 15/03/2024");
        assert_eq!(map.value(EntityKind::Date), Some("2024-03-15"));
        let map = extract("livraisons depuis 2024-03-15");
        assert_eq!(map.value(EntityKind::Date), Some("2024-03-15"));
    }

    #[test]
    fn test_invalid_date_stays_unset() {
        let map = extract("rapport du 45/99/2024");
        assert!(map.value(EntityKind::Date).is_none());
    }

    #[test]
    fn test_threshold_vs_amount() {
        let map = extract("matériel avec garantie de plus de 12 mois");
        assert_eq!(map.value(EntityKind::Threshold), Some("12"));
        assert!(map.value(EntityKind::Amount).is_none());

        let map = extract("commandes de plus de 5000 DH");
        assert_eq!(map.value(EntityKind::Amount), Some("5000"));
        assert_eq!(map.value(EntityKind::Threshold), Some("5000"));
    }

    #[test]
    fn test_amount_decimal_comma() {
        let map = extract("facture de 1250,50 dh");
        assert_eq!(map.value(EntityKind::Amount), Some("1250.50"));
    }

    #[test]
    fn test_status_lexicon() {
        assert_eq!(
            extract("commandes en attente").value(EntityKind::Status),
            Some("en attente")
        );
        assert_eq!(
            extract("commandes approuvées").value(EntityKind::Status),
            Some("approuvee")
        );
        assert_eq!(
            extract("matériel en panne").value(EntityKind::Status),
            Some("en panne")
        );
    }

    #[test]
    fn test_location_extraction() {
        let map = extract("matériel de la salle b12");
        assert_eq!(map.value(EntityKind::Location), Some("salle b12"));
        let map = extract("imprimantes au bureau 3");
        assert_eq!(map.value(EntityKind::Location), Some("bureau 3"));
    }

    #[test]
    fn test_user_extraction() {
        let map = extract("matériel affecté à Karim");
        assert_eq!(map.value(EntityKind::User), Some("karim"));
        let map = extract("pc de M. Alami");
        assert_eq!(map.value(EntityKind::User), Some("alami"));
    }

    #[test]
    fn test_supplier_extraction_rejects_stopwords() {
        let map = extract("fournisseur TechnoPlus");
        assert_eq!(map.value(EntityKind::Supplier), Some("technoplus"));
        let map = extract("liste des fournisseurs de rabat");
        assert!(map.value(EntityKind::Supplier).is_none());
    }

    #[test]
    fn test_quoted_name_overrides_supplier() {
        let map = extract("ICE du fournisseur \"Atlas Info\"");
        assert_eq!(map.value(EntityKind::QuotedName), Some("atlas info"));
        assert_eq!(map.value(EntityKind::Supplier), Some("atlas info"));
    }

    #[test]
    fn test_guillemets() {
        let map = extract("cherche le fournisseur « Maroc Bureau »");
        assert_eq!(map.value(EntityKind::QuotedName), Some("maroc bureau"));
    }

    #[test]
    fn test_apostrophe_not_taken_as_quote() {
        let map = extract("l'écran de l'agent Karim");
        assert!(map.value(EntityKind::QuotedName).is_none());
    }

    #[test]
    fn test_empty_input() {
        let map = extract("");
        assert!(map.is_empty());
    }

    #[test]
    fn test_extraction_is_pure() {
        let extractor = EntityExtractor::new();
        let text = normalize("garantie de BC23 chez TechnoPlus");
        let a = extractor.extract(&text);
        let b = extractor.extract(&text);
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x, y);
        }
    }
}
