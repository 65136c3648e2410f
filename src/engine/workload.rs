use std::collections::HashMap;

use dashmap::DashMap;
use thiserror::Error;

use crate::models::employee::Employee;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkloadError {
    #[error("employee {0} is not on the roster")]
    UnknownEmployee(String),

    #[error("employee {0} is at daily capacity")]
    CapacityExceeded(String),
}

#[derive(Debug, Clone, Copy)]
struct WorkloadSlot {
    count: u32,
    capacity: u32,
}

/// Per-employee assignment counters. Every mutation happens under the map's shard
/// lock for that employee, so a check against capacity and the increment that
/// follows it cannot interleave with another request.
#[derive(Default)]
pub struct WorkloadTracker {
    slots: DashMap<String, WorkloadSlot>,
}

impl WorkloadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the tracked roster. Counts are rebuilt from `existing`, the employee id
    /// of every assignment already on record, capped at each capacity. Employees on
    /// both rosters stay tracked throughout. Returns the ids that could not be counted.
    pub fn register_roster(&self, employees: &[Employee], existing: &[&str]) -> Vec<String> {
        let mut next: HashMap<String, WorkloadSlot> = employees
            .iter()
            .map(|employee| {
                let slot = WorkloadSlot {
                    count: 0,
                    capacity: employee.daily_capacity.max(1),
                };
                (employee.id.clone(), slot)
            })
            .collect();

        let mut uncounted = Vec::new();
        for employee_id in existing {
            match next.get_mut(*employee_id) {
                Some(slot) if slot.count < slot.capacity => slot.count += 1,
                _ => uncounted.push((*employee_id).to_string()),
            }
        }

        self.slots.retain(|employee_id, _| next.contains_key(employee_id));
        for (employee_id, slot) in next {
            self.slots.insert(employee_id, slot);
        }

        uncounted
    }

    pub fn current(&self, employee_id: &str) -> u32 {
        self.slots
            .get(employee_id)
            .map(|slot| slot.count)
            .unwrap_or(0)
    }

    pub fn has_headroom(&self, employee_id: &str) -> bool {
        self.slots
            .get(employee_id)
            .map(|slot| slot.count < slot.capacity)
            .unwrap_or(false)
    }

    /// Re-validates capacity at commit time and returns the new count.
    pub fn try_increment(&self, employee_id: &str) -> Result<u32, WorkloadError> {
        let mut slot = self
            .slots
            .get_mut(employee_id)
            .ok_or_else(|| WorkloadError::UnknownEmployee(employee_id.to_string()))?;

        if slot.count >= slot.capacity {
            return Err(WorkloadError::CapacityExceeded(employee_id.to_string()));
        }

        slot.count += 1;
        Ok(slot.count)
    }

    pub fn decrement(&self, employee_id: &str) {
        if let Some(mut slot) = self.slots.get_mut(employee_id) {
            slot.count = slot.count.saturating_sub(1);
        }
    }

    pub fn utilization(&self, employee_id: &str) -> f64 {
        self.slots
            .get(employee_id)
            .map(|slot| slot.count as f64 / slot.capacity as f64)
            .unwrap_or(0.0)
    }

    /// Clears counts but keeps registered capacities.
    pub fn reset(&self) {
        for mut slot in self.slots.iter_mut() {
            slot.count = 0;
        }
    }

    pub fn forget_all(&self) {
        self.slots.clear();
    }
}
