//! Staff authorization for administrative commands.

use std::collections::HashSet;

/// Role ids allowed to run mutating admin commands.
#[derive(Debug, Clone, Default)]
pub struct StaffRoles {
    roles: HashSet<String>,
}

impl StaffRoles {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether a member holding `member_roles` counts as staff.
    ///
    /// An empty staff list authorizes nobody.
    #[must_use]
    pub fn permits<S: AsRef<str>>(&self, member_roles: &[S]) -> bool {
        member_roles
            .iter()
            .any(|role| self.roles.contains(role.as_ref()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
