use super::{StoreError, StoreResult};

/// Longest manager chain walked before a write is refused.
pub const MAX_CHAIN_DEPTH: usize = 64;

/// Read access to the `manager` column by `empId`.
#[allow(async_fn_in_trait)]
pub trait ManagerLookup {
    /// `None` when no employee has this `empId`, otherwise that employee's
    /// own manager reference.
    async fn manager_of(&mut self, emp_id: &str) -> StoreResult<Option<Option<String>>>;
}

/// Check that `subject` may report to `manager`: the manager exists, is
/// not the subject, and the chain above it never leads back to the subject.
/// A dangling reference higher up the chain simply ends the walk.
pub async fn validate_manager<L: ManagerLookup>(
    lookup: &mut L,
    subject: &str,
    manager: Option<&str>,
) -> StoreResult<()> {
    let Some(manager) = manager else {
        return Ok(());
    };

    if manager == subject {
        return Err(integrity("an employee cannot be their own manager"));
    }

    let mut next = match lookup.manager_of(manager).await? {
        Some(next) => next,
        None => return Err(integrity(format!("manager '{manager}' does not exist"))),
    };

    for _ in 0..MAX_CHAIN_DEPTH {
        let Some(current) = next else {
            return Ok(());
        };
        if current == subject {
            return Err(integrity(format!(
                "reporting to '{manager}' would make '{subject}' its own ancestor"
            )));
        }
        next = match lookup.manager_of(&current).await? {
            Some(above) => above,
            None => return Ok(()),
        };
    }

    Err(integrity(format!(
        "manager chain exceeds {MAX_CHAIN_DEPTH} levels"
    )))
}

fn integrity(reason: impl Into<String>) -> StoreError {
    StoreError::Integrity {
        field: "manager",
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Chart(HashMap<String, Option<String>>);

    impl Chart {
        fn new(edges: &[(&str, Option<&str>)]) -> Self {
            Self(
                edges
                    .iter()
                    .map(|(e, m)| (e.to_string(), m.map(str::to_string)))
                    .collect(),
            )
        }
    }

    impl ManagerLookup for Chart {
        async fn manager_of(&mut self, emp_id: &str) -> StoreResult<Option<Option<String>>> {
            Ok(self.0.get(emp_id).cloned())
        }
    }

    fn reason(err: StoreError) -> String {
        match err {
            StoreError::Integrity { field, reason } => {
                assert_eq!(field, "manager");
                reason
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[actix_web::test]
    async fn no_manager_is_always_fine() {
        let mut chart = Chart::new(&[]);
        validate_manager(&mut chart, "EMP1", None).await.unwrap();
    }

    #[actix_web::test]
    async fn existing_manager_is_accepted() {
        let mut chart = Chart::new(&[("EMP2", Some("EMP3")), ("EMP3", None)]);
        validate_manager(&mut chart, "EMP1", Some("EMP2")).await.unwrap();
    }

    #[actix_web::test]
    async fn self_reference_is_rejected() {
        let mut chart = Chart::new(&[("EMP1", None)]);
        let err = validate_manager(&mut chart, "EMP1", Some("EMP1"))
            .await
            .unwrap_err();
        assert!(reason(err).contains("own manager"));
    }

    #[actix_web::test]
    async fn unknown_manager_is_rejected() {
        let mut chart = Chart::new(&[]);
        let err = validate_manager(&mut chart, "EMP1", Some("EMP9"))
            .await
            .unwrap_err();
        assert!(reason(err).contains("does not exist"));
    }

    #[actix_web::test]
    async fn cycle_through_reports_is_rejected() {
        // EMP3 -> EMP2 -> EMP1; making EMP1 report to EMP3 closes the loop.
        let mut chart = Chart::new(&[
            ("EMP1", None),
            ("EMP2", Some("EMP1")),
            ("EMP3", Some("EMP2")),
        ]);
        let err = validate_manager(&mut chart, "EMP1", Some("EMP3"))
            .await
            .unwrap_err();
        assert!(reason(err).contains("own ancestor"));
    }

    #[actix_web::test]
    async fn dangling_reference_above_ends_the_walk() {
        let mut chart = Chart::new(&[("EMP2", Some("GONE"))]);
        validate_manager(&mut chart, "EMP1", Some("EMP2")).await.unwrap();
    }

    #[actix_web::test]
    async fn overly_deep_chain_is_rejected() {
        let ids: Vec<String> = (0..=MAX_CHAIN_DEPTH + 1).map(|i| format!("E{i}")).collect();
        let edges: Vec<(&str, Option<&str>)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), ids.get(i + 1).map(String::as_str)))
            .collect();
        let mut chart = Chart::new(&edges);

        let err = validate_manager(&mut chart, "NEW", Some("E0"))
            .await
            .unwrap_err();
        assert!(reason(err).contains("exceeds"));
    }
}
