//! Cabinet role permissions.
//!
//! Pure capability checks for cabinet member roles. UI code and the HTTP
//! surface consult these before allowing an action; a refusal is a boolean
//! plus a human-readable denial message, never an error.
//!
//! The capability hierarchy nests strictly: everything granted to
//! Collaborateur is granted to Associé and Fondateur, and everything
//! granted to Associé is granted to Fondateur. Stagiaire, Assistant, the
//! default "membre" tier and unrecognized labels are granted nothing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role tiers of a cabinet member, in descending privilege order.
///
/// Parsing from the wire never fails: unrecognized labels land in
/// [`CabinetRole::Other`] with their text kept verbatim, and grant nothing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CabinetRole {
    Fondateur,
    Associe,
    Collaborateur,
    Stagiaire,
    Assistant,
    /// Default tier for members without an explicit role.
    Membre,
    /// Unrecognized role label, kept verbatim.
    Other(String),
}

impl CabinetRole {
    /// Parse a role label. Total: unknown labels become [`CabinetRole::Other`].
    pub fn parse(label: &str) -> Self {
        match label {
            "Fondateur" => CabinetRole::Fondateur,
            "Associé" => CabinetRole::Associe,
            "Collaborateur" => CabinetRole::Collaborateur,
            "Stagiaire" => CabinetRole::Stagiaire,
            "Assistant" => CabinetRole::Assistant,
            "membre" => CabinetRole::Membre,
            other => CabinetRole::Other(other.to_string()),
        }
    }

    /// The wire label for this role.
    pub fn label(&self) -> &str {
        match self {
            CabinetRole::Fondateur => "Fondateur",
            CabinetRole::Associe => "Associé",
            CabinetRole::Collaborateur => "Collaborateur",
            CabinetRole::Stagiaire => "Stagiaire",
            CabinetRole::Assistant => "Assistant",
            CabinetRole::Membre => "membre",
            CabinetRole::Other(label) => label,
        }
    }

    /// The recognized tiers, for exhaustive checks.
    pub fn all() -> [CabinetRole; 6] {
        [
            CabinetRole::Fondateur,
            CabinetRole::Associe,
            CabinetRole::Collaborateur,
            CabinetRole::Stagiaire,
            CabinetRole::Assistant,
            CabinetRole::Membre,
        ]
    }

    /// Only the Fondateur may manage the cabinet's subscription.
    pub fn can_manage_subscription(&self) -> bool {
        matches!(self, CabinetRole::Fondateur)
    }

    /// Only the Fondateur may delete the cabinet.
    pub fn can_delete_cabinet(&self) -> bool {
        matches!(self, CabinetRole::Fondateur)
    }

    /// Fondateur and Associé may invite members.
    pub fn can_invite_members(&self) -> bool {
        matches!(self, CabinetRole::Fondateur | CabinetRole::Associe)
    }

    /// Fondateur and Associé may remove members.
    pub fn can_remove_members(&self) -> bool {
        matches!(self, CabinetRole::Fondateur | CabinetRole::Associe)
    }

    /// Fondateur and Associé may change member roles, with restrictions on
    /// which roles an Associé may touch (see [`CabinetRole::can_assign_role`]).
    pub fn can_change_roles(&self) -> bool {
        matches!(self, CabinetRole::Fondateur | CabinetRole::Associe)
    }

    /// Whether this role may grant `target` to a member.
    ///
    /// The Fondateur may assign any role. An Associé may assign anything
    /// except Fondateur, Associé and the legacy "owner" label. Nobody else
    /// assigns roles.
    pub fn can_assign_role(&self, target: &CabinetRole) -> bool {
        match self {
            CabinetRole::Fondateur => true,
            CabinetRole::Associe => {
                !matches!(target, CabinetRole::Fondateur | CabinetRole::Associe)
                    && target.label() != "owner"
            }
            _ => false,
        }
    }

    /// Whether this role may modify a member currently holding
    /// `target_member_role`. Same rule shape as role assignment, applied to
    /// the member's existing role.
    pub fn can_modify_member_role(&self, target_member_role: &CabinetRole) -> bool {
        match self {
            CabinetRole::Fondateur => true,
            CabinetRole::Associe => {
                !matches!(
                    target_member_role,
                    CabinetRole::Fondateur | CabinetRole::Associe
                ) && target_member_role.label() != "owner"
            }
            _ => false,
        }
    }

    /// Fondateur, Associé and Collaborateur may create resources
    /// (clients, dossiers, contrats).
    pub fn can_create_resources(&self) -> bool {
        matches!(
            self,
            CabinetRole::Fondateur | CabinetRole::Associe | CabinetRole::Collaborateur
        )
    }

    /// Fondateur, Associé and Collaborateur may edit resources.
    pub fn can_edit_resources(&self) -> bool {
        matches!(
            self,
            CabinetRole::Fondateur | CabinetRole::Associe | CabinetRole::Collaborateur
        )
    }

    /// Fondateur and Associé may delete important resources.
    pub fn can_delete_resources(&self) -> bool {
        matches!(self, CabinetRole::Fondateur | CabinetRole::Associe)
    }

    /// Fondateur and Associé count as administrators.
    pub fn is_admin(&self) -> bool {
        matches!(self, CabinetRole::Fondateur | CabinetRole::Associe)
    }

    /// Denial message appropriate for this role.
    pub fn permission_denied_message(&self) -> &'static str {
        match self {
            CabinetRole::Stagiaire => "Les stagiaires n'ont pas accès à cette fonctionnalité",
            CabinetRole::Assistant => "Les assistants n'ont pas accès à cette fonctionnalité",
            CabinetRole::Collaborateur => {
                "Seuls les Fondateurs et Associés peuvent effectuer cette action"
            }
            _ => "Vous n'avez pas les permissions nécessaires pour cette action",
        }
    }
}

/// Denial message for a possibly-absent role (absent == no privilege).
pub fn permission_denied_message(role: Option<&CabinetRole>) -> &'static str {
    match role {
        Some(role) => role.permission_denied_message(),
        None => "Vous n'avez pas les permissions nécessaires pour cette action",
    }
}

impl From<String> for CabinetRole {
    fn from(label: String) -> Self {
        CabinetRole::parse(&label)
    }
}

impl From<CabinetRole> for String {
    fn from(role: CabinetRole) -> Self {
        role.label().to_string()
    }
}

impl fmt::Display for CabinetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for role in CabinetRole::all() {
            assert_eq!(CabinetRole::parse(role.label()), role);
        }
        assert_eq!(
            CabinetRole::parse("owner"),
            CabinetRole::Other("owner".to_string())
        );
    }

    #[test]
    fn test_founder_only_capabilities() {
        assert!(CabinetRole::Fondateur.can_manage_subscription());
        assert!(CabinetRole::Fondateur.can_delete_cabinet());
        for role in CabinetRole::all() {
            if role != CabinetRole::Fondateur {
                assert!(!role.can_manage_subscription(), "{role}");
                assert!(!role.can_delete_cabinet(), "{role}");
            }
        }
    }

    #[test]
    fn test_assign_role_restrictions() {
        let associe = CabinetRole::Associe;
        assert!(associe.can_assign_role(&CabinetRole::Collaborateur));
        assert!(associe.can_assign_role(&CabinetRole::Stagiaire));
        assert!(!associe.can_assign_role(&CabinetRole::Associe));
        assert!(!associe.can_assign_role(&CabinetRole::Fondateur));
        assert!(!associe.can_assign_role(&CabinetRole::parse("owner")));

        assert!(CabinetRole::Fondateur.can_assign_role(&CabinetRole::Associe));
        assert!(!CabinetRole::Stagiaire.can_assign_role(&CabinetRole::Membre));
        assert!(!CabinetRole::Collaborateur.can_assign_role(&CabinetRole::Stagiaire));
    }

    #[test]
    fn test_denied_messages() {
        assert!(CabinetRole::Stagiaire
            .permission_denied_message()
            .contains("stagiaires"));
        assert!(CabinetRole::Assistant
            .permission_denied_message()
            .contains("assistants"));
        assert!(CabinetRole::Collaborateur
            .permission_denied_message()
            .contains("Fondateurs et Associés"));
        assert_eq!(
            permission_denied_message(None),
            "Vous n'avez pas les permissions nécessaires pour cette action"
        );
    }

    #[test]
    fn test_serde_uses_wire_labels() {
        let json = serde_json::to_string(&CabinetRole::Associe).unwrap();
        assert_eq!(json, "\"Associé\"");
        let parsed: CabinetRole = serde_json::from_str("\"membre\"").unwrap();
        assert_eq!(parsed, CabinetRole::Membre);
        let unknown: CabinetRole = serde_json::from_str("\"owner\"").unwrap();
        assert_eq!(unknown, CabinetRole::Other("owner".to_string()));
    }
}
