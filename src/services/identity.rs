use crate::error::Result;
use crate::models::Student;
use crate::store::AdmissionStore;

/// Resolves an opaque NFC token to a student identity.
///
/// A student carries two independent surrogates; they are tried in fixed
/// order, card id first and phone id second, so an ambiguous token resolves
/// deterministically. No side effects: the caller owns the audit entry when
/// resolution fails.
pub async fn resolve(store: &dyn AdmissionStore, nfc_id: &str) -> Result<Option<Student>> {
    if let Some(student) = store.student_by_card_id(nfc_id).await? {
        return Ok(Some(student));
    }
    store.student_by_phone_id(nfc_id).await
}
