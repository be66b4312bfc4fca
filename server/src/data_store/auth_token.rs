use crate::cli::CliAuthTokenKey;
use crate::data_store::{StoreError, UserId};
use std::fmt::{Display, Formatter};

pub struct EnumMemberNotExistingError {
    pub member_value: String,
    pub enum_name: &'static str,
}

impl Display for EnumMemberNotExistingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} is not a valid value for {} enum",
            self.member_value, self.enum_name
        )
    }
}

/// Authorization token for authorizing access to the data_store
///
/// The AuthToken belongs to a specific user (by user id) and holds a list of active
/// [AccessRole]s in the current context. These imply specific [Privilege]s.
///
/// This structure is our main protection against accidental unauthorized-access bugs: All
/// data_store access functions that are not public require an AuthToken and check the validity of
/// the AuthToken for the required privilege (and ownership, where applicable). An AuthToken can
/// only be created by [crate::data_store::LittleLemonStoreFacade::get_auth_token_for_session],
/// based on the user id in a client's session, and by cli functions via [Self::create_for_cli].
#[derive(Debug, Clone)]
pub struct AuthToken {
    user_id: Option<UserId>,
    roles: Vec<AccessRole>,
}

impl AuthToken {
    /// Create a new AuthToken for a client session of an existing user.
    ///
    /// This function must only be used by implementations of
    /// [crate::data_store::LittleLemonStoreFacade::get_auth_token_for_session] after checking that
    /// the user exists and determining its roles!
    pub(super) fn create_for_session(user_id: UserId, roles: Vec<AccessRole>) -> Self {
        AuthToken {
            user_id: Some(user_id),
            roles,
        }
    }

    /// Create a new AuthToken for a command line interface functionality.
    ///
    /// The AuthToken is created with the AccessRole::Admin and is not associated with any user.
    ///
    /// This function must only be used by command line interface functions, not in the context of
    /// the web server!
    pub fn create_for_cli(_key: &CliAuthTokenKey) -> Self {
        AuthToken {
            user_id: None,
            roles: vec![AccessRole::Admin],
        }
    }

    /// The user this token has been issued for. `None` for command line tokens.
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Check if the AuthToken authorizes for the given `privilege`.
    ///
    /// The actual authorization check is delegated to [Privilege::qualifying_roles], by checking if
    /// any of the roles active in the context qualifies.
    pub fn has_privilege(&self, privilege: Privilege) -> bool {
        privilege
            .qualifying_roles()
            .iter()
            .any(|role| self.roles.contains(role))
    }

    /// Check if the AuthToken authorizes for the given `privilege`. If not, return an appropriate
    /// PermissionDenied error.
    pub fn check_privilege(&self, privilege: Privilege) -> Result<(), StoreError> {
        if self.has_privilege(privilege) {
            Ok(())
        } else {
            Err(StoreError::PermissionDenied {
                required_privilege: privilege,
            })
        }
    }

    /// Check if the AuthToken belongs to the owner of some entity or, otherwise, authorizes for
    /// the given `privilege`, which allows acting on other users' entities.
    pub fn check_owner_or_privilege(
        &self,
        owner: UserId,
        privilege: Privilege,
    ) -> Result<(), StoreError> {
        if self.user_id == Some(owner) {
            Ok(())
        } else {
            self.check_privilege(privilege)
        }
    }

    /// Get the user id of the token for actions that require a user context (e.g. creating a
    /// booking), after checking the given privilege.
    pub fn check_privilege_for_user(&self, privilege: Privilege) -> Result<UserId, StoreError> {
        self.check_privilege(privilege)?;
        self.user_id.ok_or(StoreError::PermissionDenied {
            required_privilege: privilege,
        })
    }
}

/// Possible roles of a client.
///
/// Each role qualifies for a set of [Privilege]s. See [Privilege::qualifying_roles].
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy)]
pub enum AccessRole {
    /// Any registered user
    User,
    /// Member of the restaurant staff, managing branches, menu, holidays, users and bookings
    BranchManager,
    /// Command line interface
    Admin,
}

impl AccessRole {
    pub fn name(&self) -> &str {
        match self {
            AccessRole::User => "User",
            AccessRole::BranchManager => "Branch Manager",
            AccessRole::Admin => "Admin",
        }
    }
}

/// Enum of available authorization privileges.
///
/// Each data_store action and web endpoint typically requires a single privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privilege {
    /// Create bookings and view/modify the own bookings
    BookTables,
    /// Look up branch labels, working hours and availability
    ShowBranchInfo,
    /// View, delete and change the status of any user's bookings
    ManageAllBookings,
    ManageBranches,
    ManageMenu,
    ManageHolidays,
    /// View, create, modify and delete any user account and assign the manager role
    ManageUsers,
}

impl Privilege {
    /// Get the list of [AccessRole]s that qualify for this privilege. Each returned role is
    /// individually sufficient for the privilege.
    ///
    /// This is function is our source of truth for authorization!
    pub fn qualifying_roles(&self) -> &'static [AccessRole] {
        match self {
            Privilege::BookTables => &[AccessRole::User, AccessRole::BranchManager],
            Privilege::ShowBranchInfo => &[
                AccessRole::User,
                AccessRole::BranchManager,
                AccessRole::Admin,
            ],
            Privilege::ManageAllBookings => &[AccessRole::BranchManager, AccessRole::Admin],
            Privilege::ManageBranches => &[AccessRole::BranchManager, AccessRole::Admin],
            Privilege::ManageMenu => &[AccessRole::BranchManager, AccessRole::Admin],
            Privilege::ManageHolidays => &[AccessRole::BranchManager, AccessRole::Admin],
            Privilege::ManageUsers => &[AccessRole::BranchManager, AccessRole::Admin],
        }
    }
}
