//! Which roles may perform which operation
//!
//! This table is the only place role membership is decided. The HTTP layer
//! consults it through [`crate::middleware::Authorized`]; domain services
//! consult it through [`crate::guard::ensure_role`]. Ownership rules live
//! with the operations themselves.

use super::models::{Role, RoleSet};

const ADMIN: RoleSet = RoleSet::of(&[Role::Admin]);
const CITIZEN_OR_ADMIN: RoleSet = RoleSet::of(&[Role::Citizen, Role::Admin]);
const PERSONNEL_OR_ADMIN: RoleSet = RoleSet::of(&[Role::Personnel, Role::Admin]);
const PERSONNEL: RoleSet = RoleSet::of(&[Role::Personnel]);

macro_rules! operations {
    ($($(#[$doc:meta])* $name:ident => $roles:expr,)*) => {
        /// Every guarded operation
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Operation {
            $($(#[$doc])* $name,)*
        }

        impl Operation {
            pub const fn allowed_roles(self) -> RoleSet {
                match self {
                    $(Operation::$name => $roles,)*
                }
            }
        }

        /// Type-level operation markers for the `Authorized` extractor
        pub mod op {
            $(
                #[derive(Debug, Clone, Copy)]
                pub struct $name;

                impl super::Guarded for $name {
                    const OPERATION: super::Operation = super::Operation::$name;
                }
            )*
        }
    };
}

/// Binds a marker type to its operation
pub trait Guarded: Send + Sync + 'static {
    const OPERATION: Operation;
}

operations! {
    /// Read own profile
    ViewProfile => RoleSet::ANY,
    /// Change own name, email or password
    UpdateProfile => RoleSet::ANY,
    ListUsers => ADMIN,
    CreateUser => ADMIN,
    UpdateUser => ADMIN,
    DeleteUser => ADMIN,
    ChangeRole => ADMIN,
    ListPersonnel => ADMIN,
    AddPersonnel => ADMIN,

    CreateCollection => CITIZEN_OR_ADMIN,
    ListAllCollections => ADMIN,
    /// Admins, the record's creator, or its assignee
    ViewCollection => RoleSet::ANY,
    /// Admins, or the user whose records are listed
    ListUserCollections => RoleSet::ANY,
    /// Personnel only for records assigned to them
    UpdateCollectionStatus => PERSONNEL_OR_ADMIN,
    AssignCollection => ADMIN,
    RecordMissed => ADMIN,
    /// Admins, or the record's creator
    DeleteCollection => CITIZEN_OR_ADMIN,
    DailySummary => ADMIN,
    ScanCode => PERSONNEL,

    CreateSchedule => CITIZEN_OR_ADMIN,
    ListSchedules => ADMIN,
    UpdateScheduleStatus => PERSONNEL_OR_ADMIN,
    AssignSchedule => ADMIN,

    CreatePayment => CITIZEN_OR_ADMIN,
    /// Non-admins see only their own payments
    ListPayments => CITIZEN_OR_ADMIN,
    ViewPayment => CITIZEN_OR_ADMIN,
    UpdatePaymentStatus => ADMIN,
    DeletePayment => ADMIN,

    AddCredits => ADMIN,
    ViewCredits => RoleSet::ANY,

    GenerateReport => ADMIN,
    ListReports => ADMIN,
    /// Admins, or the report's generator
    ViewReport => RoleSet::ANY,
    DownloadReport => RoleSet::ANY,
    DeleteReport => ADMIN,
    ViewAnalytics => ADMIN,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_only_operations_exclude_other_roles() {
        for op in [
            Operation::AssignCollection,
            Operation::AddCredits,
            Operation::RecordMissed,
            Operation::ChangeRole,
        ] {
            let roles = op.allowed_roles();
            assert!(roles.contains(Role::Admin), "{:?}", op);
            assert!(!roles.contains(Role::Citizen), "{:?}", op);
            assert!(!roles.contains(Role::Personnel), "{:?}", op);
        }
    }

    #[test]
    fn personnel_cannot_create_collections() {
        assert!(!Operation::CreateCollection
            .allowed_roles()
            .contains(Role::Personnel));
    }

    #[test]
    fn markers_point_at_their_operation() {
        assert_eq!(
            <op::ScanCode as Guarded>::OPERATION,
            Operation::ScanCode
        );
    }
}
