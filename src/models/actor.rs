use super::audit::ActorType;
use crate::errors::{AppError, AppResult};

/// Who is acting. Authentication is handled upstream; the core only checks
/// scope: a tutor acts on their own records, an admin within a franchise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Tutor { account_id: i64 },
    Admin { account_id: i64 },
    System,
}

impl Actor {
    pub fn account_type(&self) -> ActorType {
        match self {
            Actor::Tutor { .. } => ActorType::Tutor,
            Actor::Admin { .. } => ActorType::Admin,
            Actor::System => ActorType::System,
        }
    }

    pub fn account_id(&self) -> Option<i64> {
        match self {
            Actor::Tutor { account_id } | Actor::Admin { account_id } => Some(*account_id),
            Actor::System => None,
        }
    }

    /// Parse `tutor:<id>` / `admin:<id>` as given on the command line.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let (kind, id) = raw.split_once(':').ok_or_else(|| {
            AppError::Validation(format!(
                "Invalid actor '{raw}'. Use 'tutor:<id>' or 'admin:<id>'."
            ))
        })?;
        let account_id: i64 = id
            .trim()
            .parse()
            .map_err(|_| AppError::Validation(format!("Invalid actor id '{id}'")))?;

        match kind.trim().to_lowercase().as_str() {
            "tutor" => Ok(Actor::Tutor { account_id }),
            "admin" => Ok(Actor::Admin { account_id }),
            other => Err(AppError::Validation(format!(
                "Unknown actor type '{other}'"
            ))),
        }
    }

    /// Tutors may only act on their own records.
    pub fn ensure_tutor(&self, tutor_id: i64) -> AppResult<()> {
        match self {
            Actor::Tutor { account_id } if *account_id == tutor_id => Ok(()),
            Actor::Tutor { .. } => Err(AppError::Authorization(
                "tutors may only act on their own time entries".into(),
            )),
            _ => Err(AppError::Authorization(
                "this action must be performed by the tutor".into(),
            )),
        }
    }

    pub fn ensure_admin(&self) -> AppResult<i64> {
        match self {
            Actor::Admin { account_id } => Ok(*account_id),
            _ => Err(AppError::Authorization(
                "this action requires an admin account".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tutor_and_admin() {
        assert_eq!(
            Actor::parse("tutor:7").unwrap(),
            Actor::Tutor { account_id: 7 }
        );
        assert_eq!(
            Actor::parse("ADMIN: 3").unwrap(),
            Actor::Admin { account_id: 3 }
        );
        assert!(Actor::parse("guest:1").is_err());
        assert!(Actor::parse("tutor").is_err());
    }

    #[test]
    fn tutor_cannot_act_for_another_tutor() {
        let actor = Actor::Tutor { account_id: 7 };
        assert!(actor.ensure_tutor(7).is_ok());
        assert!(matches!(
            actor.ensure_tutor(8),
            Err(AppError::Authorization(_))
        ));
    }
}
