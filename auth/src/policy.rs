//! Role → capability policy.
//!
//! Every protected endpoint names exactly one [`Capability`]; whether a role
//! holds it is decided here and nowhere else.
//!
//! | capability        | admin | seller | user |
//! |-------------------|:-----:|:------:|:----:|
//! | `ManageRaffles`    |   ✓   |        |      |
//! | `ManagePromotions` |   ✓   |        |      |
//! | `ManageTickets`    |   ✓   |        |      |
//! | `SellTickets`      |   ✓   |   ✓    |      |
//! | `ViewDashboard`    |   ✓   |   ✓    |      |
//! | `ManageUsers`      |   ✓   |        |      |
//! | `ManageContent`    |   ✓   |        |      |

use crate::error::{AuthError, Result};
use rifa_core::{Role, User};
use serde::Serialize;
use std::fmt;

/// Something a role may be allowed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create, edit, activate and delete raffles
    ManageRaffles,
    /// Edit promotion bundles
    ManagePromotions,
    /// Initialize pools and override ticket status
    ManageTickets,
    /// Record sales
    SellTickets,
    /// Read the status summary
    ViewDashboard,
    /// Administer accounts
    ManageUsers,
    /// Replace site content blocks
    ManageContent,
}

impl Capability {
    /// Every capability, in table order.
    pub const ALL: [Self; 7] = [
        Self::ManageRaffles,
        Self::ManagePromotions,
        Self::ManageTickets,
        Self::SellTickets,
        Self::ViewDashboard,
        Self::ManageUsers,
        Self::ManageContent,
    ];

    /// Stable name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ManageRaffles => "manage_raffles",
            Self::ManagePromotions => "manage_promotions",
            Self::ManageTickets => "manage_tickets",
            Self::SellTickets => "sell_tickets",
            Self::ViewDashboard => "view_dashboard",
            Self::ManageUsers => "manage_users",
            Self::ManageContent => "manage_content",
        }
    }

    /// Whether `role` holds this capability.
    #[must_use]
    pub const fn granted_to(self, role: Role) -> bool {
        match role {
            Role::Admin => true,
            Role::Seller => matches!(self, Self::SellTickets | Self::ViewDashboard),
            Role::User => false,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capabilities held by a role, in table order.
#[must_use]
pub fn capabilities(role: Role) -> Vec<Capability> {
    Capability::ALL
        .into_iter()
        .filter(|capability| capability.granted_to(role))
        .collect()
}

/// Check that `user` holds `required`.
///
/// # Errors
///
/// [`AuthError::InsufficientPermissions`] otherwise.
pub fn authorize(user: &User, required: Capability) -> Result<()> {
    if required.granted_to(user.role) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, role = %user.role, %required, "Capability denied");
        Err(AuthError::InsufficientPermissions { required })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_holds_everything() {
        assert_eq!(capabilities(Role::Admin), Capability::ALL.to_vec());
    }

    #[test]
    fn test_seller_sells_and_views_dashboard() {
        assert_eq!(
            capabilities(Role::Seller),
            vec![Capability::SellTickets, Capability::ViewDashboard]
        );
    }

    #[test]
    fn test_user_holds_nothing() {
        assert!(capabilities(Role::User).is_empty());
    }

    #[test]
    fn test_authorize_reports_missing_capability() {
        let now = chrono::Utc::now();
        let user = User {
            id: rifa_core::UserId::new(),
            username: "visitor".to_string(),
            password_hash: String::new(),
            role: Role::User,
            active: true,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(
            authorize(&user, Capability::ManageUsers),
            Err(AuthError::InsufficientPermissions {
                required: Capability::ManageUsers
            })
        );
    }
}
