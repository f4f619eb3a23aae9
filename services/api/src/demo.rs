use crate::infra::InMemoryEnrollmentStore;
use clap::Args;
use enrollment::admission::{
    AdmissionConfig, CourseId, Credential, EnrollmentQuery, EnrollmentRequest,
    EnrollmentService, LookupFailurePolicy, Requester, Role, StaticCourseCatalog, StudentId,
    TeacherId, TeacherSource,
};
use enrollment::error::AppError;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Student id used for the scripted requests.
    #[arg(long, default_value = "s-100")]
    pub(crate) student: String,
    /// Teacher id attached to every request (the built-in table has no teachers).
    #[arg(long, default_value = "t-1")]
    pub(crate) teacher: String,
}

struct Step {
    label: &'static str,
    student_id: String,
    course_id: &'static str,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { student, teacher } = args;

    let catalog = Arc::new(StaticCourseCatalog::standard()?);
    let store = Arc::new(InMemoryEnrollmentStore::new(1));
    let service = EnrollmentService::new(
        store,
        catalog.clone(),
        AdmissionConfig {
            teacher_source: TeacherSource::Request,
            lookup_failure_policy: LookupFailurePolicy::Skip,
        },
    );
    let credential = Credential::bearer("demo");
    let me = Requester::new(student.as_str(), Role::Student);

    println!("Enrollment admission demo");
    println!("Course table");
    for id in ["1", "2", "3"] {
        if let Some(course) = catalog.get(&CourseId::new(id)) {
            println!("  course {:<3} {}", id, course.schedule);
        }
    }

    let steps = [
        Step {
            label: "enroll in a free slot",
            student_id: student.clone(),
            course_id: "1",
        },
        Step {
            label: "overlapping Monday course",
            student_id: student.clone(),
            course_id: "2",
        },
        Step {
            label: "different day",
            student_id: student.clone(),
            course_id: "3",
        },
        Step {
            label: "same course twice",
            student_id: student.clone(),
            course_id: "1",
        },
        Step {
            label: "unknown course",
            student_id: student.clone(),
            course_id: "99",
        },
        Step {
            label: "enroll someone else",
            student_id: format!("{student}-friend"),
            course_id: "3",
        },
    ];

    println!("\nAdmission decisions for student {student}");
    for step in steps {
        let request = EnrollmentRequest::new(
            StudentId::new(step.student_id.as_str()),
            CourseId::new(step.course_id),
        )
        .with_teacher(TeacherId::new(teacher.as_str()));

        match service.admit(&me, &credential, request).await {
            Ok(enrollment) => println!(
                "  - {:<28} course {:<3} accepted (enrollment #{})",
                step.label, step.course_id, enrollment.id.0
            ),
            Err(err) => println!(
                "  - {:<28} course {:<3} rejected [{}] {}",
                step.label,
                step.course_id,
                err.status().as_u16(),
                err
            ),
        }
    }

    match service.list(&me, EnrollmentQuery::default()).await {
        Ok(enrollments) => {
            println!("\nCurrent enrollments ({})", enrollments.len());
            for enrollment in enrollments {
                println!(
                    "  #{} course {} at {}",
                    enrollment.id.0,
                    enrollment.course_id,
                    enrollment.created_at.format("%Y-%m-%d %H:%M:%S")
                );
            }
        }
        Err(err) => println!("\nCould not list enrollments: {err}"),
    }

    Ok(())
}
