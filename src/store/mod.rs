//! Record persistence behind a narrow trait. `MemoryStore` keeps every table in
//! process; replacing the employee or patient table is always a full overwrite.

use std::sync::{PoisonError, RwLock};

use chrono::Utc;
use serde_json::Value;
use thiserror::Error;

use crate::models::assignment::Assignment;
use crate::models::employee::Employee;
use crate::models::operation::OperationLog;
use crate::models::patient::Patient;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub trait RotaStore: Send + Sync {
    fn store_employees(&self, employees: Vec<Employee>) -> Result<(), StoreError>;
    fn store_patients(&self, patients: Vec<Patient>) -> Result<(), StoreError>;
    fn employees(&self) -> Result<Vec<Employee>, StoreError>;
    fn patients(&self) -> Result<Vec<Patient>, StoreError>;
    fn log_assignment(&self, assignment: &Assignment) -> Result<(), StoreError>;
    fn assignments(&self) -> Result<Vec<Assignment>, StoreError>;
    fn clear_assignments(&self) -> Result<(), StoreError>;
    fn log_operation(&self, kind: &str, description: &str, details: Value)
    -> Result<(), StoreError>;
    fn operations(&self) -> Result<Vec<OperationLog>, StoreError>;
    fn clear_all(&self) -> Result<(), StoreError>;

    fn employee(&self, id: &str) -> Result<Option<Employee>, StoreError> {
        Ok(self.employees()?.into_iter().find(|employee| employee.id == id))
    }

    fn patient(&self, id: &str) -> Result<Option<Patient>, StoreError> {
        Ok(self.patients()?.into_iter().find(|patient| patient.id == id))
    }
}

#[derive(Default)]
pub struct MemoryStore {
    employees: RwLock<Vec<Employee>>,
    patients: RwLock<Vec<Patient>>,
    assignments: RwLock<Vec<Assignment>>,
    operations: RwLock<Vec<OperationLog>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn snapshot<T: Clone>(table: &RwLock<Vec<T>>) -> Vec<T> {
    table.read().unwrap_or_else(PoisonError::into_inner).clone()
}

fn replace<T>(table: &RwLock<Vec<T>>, rows: Vec<T>) {
    *table.write().unwrap_or_else(PoisonError::into_inner) = rows;
}

impl RotaStore for MemoryStore {
    fn store_employees(&self, employees: Vec<Employee>) -> Result<(), StoreError> {
        replace(&self.employees, employees);
        Ok(())
    }

    fn store_patients(&self, patients: Vec<Patient>) -> Result<(), StoreError> {
        replace(&self.patients, patients);
        Ok(())
    }

    fn employees(&self) -> Result<Vec<Employee>, StoreError> {
        Ok(snapshot(&self.employees))
    }

    fn patients(&self) -> Result<Vec<Patient>, StoreError> {
        Ok(snapshot(&self.patients))
    }

    fn log_assignment(&self, assignment: &Assignment) -> Result<(), StoreError> {
        self.assignments
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(assignment.clone());
        Ok(())
    }

    fn assignments(&self) -> Result<Vec<Assignment>, StoreError> {
        Ok(snapshot(&self.assignments))
    }

    fn clear_assignments(&self) -> Result<(), StoreError> {
        replace(&self.assignments, Vec::new());
        Ok(())
    }

    fn log_operation(
        &self,
        kind: &str,
        description: &str,
        details: Value,
    ) -> Result<(), StoreError> {
        self.operations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OperationLog {
                kind: kind.to_string(),
                description: description.to_string(),
                details,
                recorded_at: Utc::now(),
            });
        Ok(())
    }

    fn operations(&self) -> Result<Vec<OperationLog>, StoreError> {
        Ok(snapshot(&self.operations))
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        replace(&self.employees, Vec::new());
        replace(&self.patients, Vec::new());
        replace(&self.assignments, Vec::new());
        replace(&self.operations, Vec::new());
        Ok(())
    }
}
