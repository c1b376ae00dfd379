use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::utils::validation::Violations;

/// A person declared against exactly one employee. Only the three
/// attributes below ever leave the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Dependant {
    #[schema(example = "Bob Lee")]
    pub name: String,
    #[schema(example = "spouse")]
    pub relationship: String,
    #[schema(example = "555-0101")]
    pub mobile_number: String,
}

/// Dependant row tagged with its owner's surrogate id, used when loading
/// dependants for many employees at once.
#[derive(Debug, sqlx::FromRow)]
pub struct OwnedDependant {
    pub employee_id: u64,
    #[sqlx(flatten)]
    pub dependant: Dependant,
}

pub fn validate_dependants(dependants: &[Dependant]) -> Violations {
    let mut v = Violations::new();
    for (i, d) in dependants.iter().enumerate() {
        v.require(&format!("dependants[{i}].name"), &d.name);
        v.require(&format!("dependants[{i}].relationship"), &d.relationship);
        v.require(&format!("dependants[{i}].mobileNumber"), &d.mobile_number);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_reported_per_index() {
        let deps: Vec<Dependant> =
            serde_json::from_str(r#"[{"name":"Bob Lee","relationship":"spouse","mobileNumber":"555-0101"},{"name":"Tim"}]"#)
                .unwrap();

        let errors = validate_dependants(&deps).into_result().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            ["dependants[1].relationship", "dependants[1].mobileNumber"]
        );
    }
}
