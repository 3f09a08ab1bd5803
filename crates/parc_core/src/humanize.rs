//! Response humanizer - user-facing phrasing for results and misses.
//!
//! Tone and templating stay at the boundary; handlers produce the facts,
//! this module wraps them. Failures are always specific (what was
//! searched, why nothing matched) plus an invitation to refine.

/// Title + bullet list.
pub fn bullet_list(title: &str, items: &[String]) -> String {
    let mut out = String::from(title);
    out.push('\n');
    for item in items {
        out.push_str("• ");
        out.push_str(item);
        out.push('\n');
    }
    out.trim_end().to_string()
}

/// Graceful "nothing found" message: names what was searched and invites
/// a refinement instead of showing an error code.
pub fn not_found(what: &str, searched: &str) -> String {
    format!(
        "Je n'ai trouvé aucun {} correspondant à « {} ». \
         Vérifiez l'orthographe ou reformulez votre question.",
        what, searched
    )
}

/// Validation prompt for blank input.
pub fn empty_prompt() -> String {
    "Votre question est vide. Posez-moi une question sur le parc : \
     matériel, commandes, fournisseurs, livraisons ou demandes."
        .to_string()
}

/// Static help, the last rung of the fallback chain.
pub fn static_help() -> String {
    "Je peux répondre aux questions sur l'inventaire :\n\
     • le matériel (liste, détails d'un code, pannes, affectations)\n\
     • les commandes (liste, statut, montants)\n\
     • les fournisseurs (liste, recherche, ICE)\n\
     • les livraisons et les demandes de matériel\n\n\
     Exemple : « combien de commandes en attente ? » ou « garantie de BC23 »."
        .to_string()
}
