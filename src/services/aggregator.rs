use std::sync::Arc;

use thiserror::Error;

use crate::{
    managers::{AttendanceLedger, Directory, DirectoryError, LedgerError},
    models::attendance::LowAttendanceEntry,
};

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),
}

/// Read-only join of ledger counts with student reference data.
pub struct LowAttendanceAggregator {
    ledger: Arc<dyn AttendanceLedger>,
    directory: Arc<dyn Directory>,
}

impl LowAttendanceAggregator {
    pub fn new(ledger: Arc<dyn AttendanceLedger>, directory: Arc<dyn Directory>) -> Self {
        Self { ledger, directory }
    }

    /// Every known student with fewer than `threshold` marks, lowest count
    /// first, then by roll number.
    pub async fn students_below(
        &self,
        threshold: u32,
    ) -> Result<Vec<LowAttendanceEntry>, AggregateError> {
        let students = self.directory.students().await?;
        let mut entries = Vec::new();

        for student in students {
            let attendance_count = self.ledger.count_for_student(&student.id).await?;
            if attendance_count < threshold {
                entries.push(LowAttendanceEntry {
                    student_id: student.id,
                    full_name: student.full_name,
                    roll_number: student.roll_number,
                    attendance_count,
                });
            }
        }

        entries.sort_by(|a, b| {
            a.attendance_count
                .cmp(&b.attendance_count)
                .then_with(|| a.roll_number.cmp(&b.roll_number))
                .then_with(|| a.student_id.cmp(&b.student_id))
        });

        tracing::debug!("{} students below {} marks", entries.len(), threshold);
        Ok(entries)
    }
}
