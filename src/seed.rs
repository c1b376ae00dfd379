use chrono::NaiveDate;
use tracing::{debug, info};

use crate::model::{Dependant, NewEmployee};
use crate::store::{EmployeeStore, StoreResult};

struct Person<'a> {
    emp_id: &'a str,
    first: &'a str,
    last: &'a str,
    business_unit: &'a str,
    designation: &'a str,
    joined: (i32, u32, u32),
    born: (i32, u32, u32),
    mobile: &'a str,
    manager: Option<&'a str>,
    dependants: &'a [(&'a str, &'a str, &'a str)],
}

fn date((y, m, d): (i32, u32, u32)) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y, m, d)
}

impl Person<'_> {
    fn into_new_employee(self) -> NewEmployee {
        let handle = format!("{}.{}", self.first, self.last).to_lowercase();
        let mut new = NewEmployee {
            emp_id: self.emp_id.to_string(),
            dependants: self
                .dependants
                .iter()
                .map(|(name, relationship, mobile)| Dependant {
                    name: name.to_string(),
                    relationship: relationship.to_string(),
                    mobile_number: mobile.to_string(),
                })
                .collect(),
            ..Default::default()
        };
        let p = &mut new.profile;
        p.first_name = self.first.to_string();
        p.last_name = self.last.to_string();
        p.business_unit = Some(self.business_unit.to_string());
        p.designation = Some(self.designation.to_string());
        p.date_of_joining_full_time = date(self.joined);
        p.date_of_birth = date(self.born);
        p.mobile_number = self.mobile.to_string();
        p.personal_email = format!("{handle}@personal.com");
        p.company_email = Some(format!("{handle}@company.com"));
        p.manager = self.manager.map(str::to_string);
        new
    }
}

/// Demo roster, ordered so every manager is created before its reports.
pub fn demo_roster() -> Vec<NewEmployee> {
    let people = [
        Person {
            emp_id: "EMP003",
            first: "Priya",
            last: "Sharma",
            business_unit: "Engineering",
            designation: "Director of Engineering",
            joined: (2019, 7, 1),
            born: (1980, 2, 11),
            mobile: "9876543215",
            manager: None,
            dependants: &[("Rahul Sharma", "Spouse", "9876543216")],
        },
        Person {
            emp_id: "EMP002",
            first: "Sarah",
            last: "Wilson",
            business_unit: "Engineering",
            designation: "Engineering Manager",
            joined: (2022, 3, 10),
            born: (1985, 8, 15),
            mobile: "9876543212",
            manager: Some("EMP003"),
            dependants: &[
                ("Tom Wilson", "Son", "9876543213"),
                ("Mike Wilson", "Spouse", "9876543214"),
            ],
        },
        Person {
            emp_id: "EMP001",
            first: "John",
            last: "Doe",
            business_unit: "Engineering",
            designation: "Software Engineer",
            joined: (2023, 1, 15),
            born: (1990, 5, 20),
            mobile: "9876543210",
            manager: Some("EMP002"),
            dependants: &[("Jane Doe", "Spouse", "9876543211")],
        },
        Person {
            emp_id: "EMP004",
            first: "Arjun",
            last: "Mehta",
            business_unit: "Human Resources",
            designation: "HR Manager",
            joined: (2021, 11, 2),
            born: (1987, 12, 3),
            mobile: "9876543217",
            manager: Some("EMP003"),
            dependants: &[],
        },
        Person {
            emp_id: "EMP005",
            first: "Emily",
            last: "Chen",
            business_unit: "Engineering",
            designation: "QA Engineer",
            joined: (2023, 6, 5),
            born: (1996, 9, 27),
            mobile: "9876543218",
            manager: Some("EMP002"),
            dependants: &[("Grace Chen", "Mother", "9876543219")],
        },
    ];

    let mut roster: Vec<NewEmployee> = people.into_iter().map(Person::into_new_employee).collect();

    // One relieved employee so both statuses show up.
    if let Some(last) = roster.last_mut() {
        last.profile.date_of_joining_internship = date((2022, 12, 1));
        last.profile.relieving_date = date((2024, 6, 30));
    }
    roster
}

/// Load the demo roster into an empty store. Returns how many employees
/// were created.
pub async fn seed_if_empty<S: EmployeeStore>(store: &S) -> StoreResult<usize> {
    let existing = store.count_employees().await?;
    if existing > 0 {
        info!(existing, "Store already has employees, skipping demo seed");
        return Ok(0);
    }

    let mut created = 0;
    for new in demo_roster() {
        let record = store.create_employee(new).await?;
        debug!(emp_id = %record.emp_id(), "Seeded employee");
        created += 1;
    }
    info!(created, "Demo employees seeded");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EmployeeStatus;
    use crate::store::MemoryEmployeeStore;

    #[test]
    fn roster_is_valid() {
        for new in demo_roster() {
            assert!(new.validate().is_ok(), "{} is invalid", new.emp_id);
        }
    }

    #[actix_web::test]
    async fn seeds_once() {
        let store = MemoryEmployeeStore::new();
        let created = seed_if_empty(&store).await.unwrap();
        assert_eq!(created, demo_roster().len());
        assert_eq!(seed_if_empty(&store).await.unwrap(), 0);

        let john = store.get_employee("EMP001").await.unwrap();
        assert_eq!(
            john.manager_details.map(|m| m.emp_id),
            Some("EMP002".to_string())
        );

        let emily = store.get_employee("EMP005").await.unwrap();
        assert_eq!(emily.status, EmployeeStatus::Relieved);
    }
}
