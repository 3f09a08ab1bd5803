//! Text normalization - deterministic cleanup of raw input.
//!
//! Every downstream stage (entity extraction, pattern tables, keyword sets)
//! operates on normalized text, so keyword lists are written in folded form
//! ("approuvee", not "approuvée").

use unicode_normalization::UnicodeNormalization;

/// Normalize raw input: lower-case, fold diacritics, collapse whitespace.
///
/// Total function: never fails, returns an empty string for empty input,
/// and is idempotent (`normalize(normalize(x)) == normalize(x)`).
pub fn normalize(raw: &str) -> String {
    let folded: String = raw
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();

    let mut out = String::with_capacity(folded.len());
    let mut last_was_space = true;
    for c in folded.to_lowercase().chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }

    while out.ends_with(' ') {
        out.pop();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowercase_and_fold() {
        assert_eq!(normalize("Liste des Fournisseurs"), "liste des fournisseurs");
        assert_eq!(normalize("commandes approuvées"), "commandes approuvees");
        assert_eq!(normalize("Matériel à l'étage"), "materiel a l'etage");
    }

    #[test]
    fn test_whitespace_collapse() {
        assert_eq!(normalize("  liste   du \t matériel \n"), "liste du materiel");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \t\n"), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "Liste des Fournisseurs",
            "Où est le PC-123 ?",
            "GARANTIE de BC23",
            "combien de commandes  en   attente",
        ];
        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_codes_survive_normalization() {
        assert_eq!(normalize("PC-123"), "pc-123");
        assert_eq!(normalize("pc-123"), "pc-123");
    }
}
