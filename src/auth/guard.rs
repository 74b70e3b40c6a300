use tracing::warn;

use crate::error::{AppError, AppResult};

/// A stored resource that belongs to exactly one user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

pub fn authorize_owner<R: Owned>(resource: &R, user_id: i64) -> AppResult<()> {
    if resource.owner_id() != user_id {
        warn!(user_id, owner_id = resource.owner_id(), "ownership check failed");
        return Err(AppError::Forbidden(
            "Not authorized to access this blog".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Thing(i64);
    impl Owned for Thing {
        fn owner_id(&self) -> i64 {
            self.0
        }
    }

    #[test]
    fn owner_passes_everyone_else_is_forbidden() {
        assert!(authorize_owner(&Thing(3), 3).is_ok());
        assert!(matches!(
            authorize_owner(&Thing(3), 4),
            Err(AppError::Forbidden(_))
        ));
    }
}
