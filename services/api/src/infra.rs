use async_trait::async_trait;
use enrollment::admission::{
    sort_newest_first, CourseId, Enrollment, EnrollmentFilter, EnrollmentId, EnrollmentStore,
    NewEnrollment, StoreError, StudentId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tokio::sync::{Semaphore, SemaphorePermit};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct Table {
    rows: Vec<Enrollment>,
    last_id: u64,
}

/// Process-local enrollment table. Each call holds one of `max_connections` permits,
/// standing in for a bounded database pool.
#[derive(Clone)]
pub(crate) struct InMemoryEnrollmentStore {
    table: Arc<Mutex<Table>>,
    pool: Arc<Semaphore>,
}

impl InMemoryEnrollmentStore {
    pub(crate) fn new(max_connections: usize) -> Self {
        Self {
            table: Arc::new(Mutex::new(Table::default())),
            pool: Arc::new(Semaphore::new(max_connections.max(1))),
        }
    }

    async fn connection(&self) -> Result<SemaphorePermit<'_>, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(|_| StoreError::Unavailable("connection pool closed".to_string()))
    }
}

#[async_trait]
impl EnrollmentStore for InMemoryEnrollmentStore {
    async fn list(&self, filter: &EnrollmentFilter) -> Result<Vec<Enrollment>, StoreError> {
        let _conn = self.connection().await?;
        let guard = self.table.lock().expect("enrollment table mutex poisoned");
        let mut rows: Vec<Enrollment> = guard
            .rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        sort_newest_first(&mut rows);
        Ok(rows)
    }

    async fn exists(
        &self,
        student_id: &StudentId,
        course_id: &CourseId,
    ) -> Result<bool, StoreError> {
        let _conn = self.connection().await?;
        let guard = self.table.lock().expect("enrollment table mutex poisoned");
        Ok(guard
            .rows
            .iter()
            .any(|row| &row.student_id == student_id && &row.course_id == course_id))
    }

    async fn insert(&self, enrollment: NewEnrollment) -> Result<Enrollment, StoreError> {
        let _conn = self.connection().await?;
        let mut guard = self.table.lock().expect("enrollment table mutex poisoned");
        let taken = guard.rows.iter().any(|row| {
            row.student_id == enrollment.student_id && row.course_id == enrollment.course_id
        });
        if taken {
            return Err(StoreError::Duplicate {
                student_id: enrollment.student_id,
                course_id: enrollment.course_id,
            });
        }

        guard.last_id += 1;
        let stored = enrollment.into_enrollment(EnrollmentId(guard.last_id));
        guard.rows.push(stored.clone());
        Ok(stored)
    }
}
