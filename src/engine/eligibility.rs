use crate::engine::workload::WorkloadTracker;
use crate::models::employee::Employee;
use crate::models::service::{Qualification, ServiceType};

/// Hard qualification gate. Medicine is nurse-only; every other service accepts the
/// whole roster and leaves quality differences to scoring. An empty result means no
/// qualified staff and is never an error here.
pub fn eligible_for(service: ServiceType, roster: &[Employee]) -> Vec<Employee> {
    roster
        .iter()
        .filter(|employee| {
            !service.requires_nurse() || employee.qualification == Qualification::Nurse
        })
        .cloned()
        .collect()
}

/// Keeps employees whose current count is below their daily capacity, in input order.
pub fn available(eligible: &[Employee], workload: &WorkloadTracker) -> Vec<Employee> {
    eligible
        .iter()
        .filter(|employee| workload.has_headroom(&employee.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{available, eligible_for};
    use crate::engine::workload::WorkloadTracker;
    use crate::models::employee::Employee;
    use crate::models::service::{Qualification, ServiceType, TransportMode};

    fn employee(id: &str, qualification: Qualification, capacity: u32) -> Employee {
        Employee {
            id: id.to_string(),
            name: id.to_string(),
            qualification,
            languages: vec!["English".to_string()],
            transport: TransportMode::Car,
            home_location: "Leeds".to_string(),
            post_code: String::new(),
            daily_capacity: capacity,
        }
    }

    #[test]
    fn medicine_keeps_only_nurses() {
        let roster = vec![
            employee("E1", Qualification::Carer, 3),
            employee("E2", Qualification::Nurse, 3),
            employee("E3", Qualification::SeniorCarer, 3),
        ];

        let eligible = eligible_for(ServiceType::Medicine, &roster);

        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].id, "E2");
    }

    #[test]
    fn medicine_without_nurses_is_empty() {
        let roster = vec![employee("E1", Qualification::SeniorCarer, 3)];
        assert!(eligible_for(ServiceType::Medicine, &roster).is_empty());
    }

    #[test]
    fn non_medicine_services_accept_everyone_in_roster_order() {
        let roster = vec![
            employee("E1", Qualification::Carer, 3),
            employee("E2", Qualification::Nurse, 3),
        ];

        let ids: Vec<String> = eligible_for(ServiceType::Companionship, &roster)
            .into_iter()
            .map(|employee| employee.id)
            .collect();

        assert_eq!(ids, vec!["E1".to_string(), "E2".to_string()]);
    }

    #[test]
    fn availability_drops_employees_at_capacity() {
        let roster = vec![
            employee("E1", Qualification::Carer, 1),
            employee("E2", Qualification::Carer, 2),
        ];
        let workload = WorkloadTracker::new();
        workload.register_roster(&roster, &[]);
        workload.try_increment("E1").unwrap();
        workload.try_increment("E2").unwrap();

        let first = available(&roster, &workload);
        let second = available(&roster, &workload);

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].id, "E2");
        assert_eq!(first, second);
    }
}
