pub mod alerts;
pub mod analytes;
pub mod auth;
pub mod health;
pub mod patients;
pub mod reports;
pub mod results;
pub mod trends;

use crate::api::types::AuthContext;
use crate::models::Patient;

/// Owner-or-clinical object permission: clinical roles see every patient,
/// everyone else only patients linked to their own account.
pub(crate) fn can_access_patient(auth: &AuthContext, patient: &Patient) -> bool {
    auth.role.is_clinical() || patient.user_id == Some(auth.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{Role, Sex};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn patient(user_id: Option<Uuid>) -> Patient {
        Patient {
            id: Uuid::new_v4(),
            user_id,
            name: "Test".into(),
            sex: Sex::Other,
            birth_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn auth(role: Role) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            username: "u".into(),
            role,
        }
    }

    #[test]
    fn clinical_roles_access_any_patient() {
        for role in [Role::Doctor, Role::Lab, Role::Admin] {
            assert!(can_access_patient(&auth(role), &patient(None)));
        }
    }

    #[test]
    fn patients_access_only_their_own() {
        let me = auth(Role::Patient);
        assert!(can_access_patient(&me, &patient(Some(me.user_id))));
        assert!(!can_access_patient(&me, &patient(Some(Uuid::new_v4()))));
        assert!(!can_access_patient(&me, &patient(None)));
    }
}
