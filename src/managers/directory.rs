use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Utc, Weekday};
use serde::Deserialize;
use thiserror::Error;

use crate::models::{
    identity::Identity,
    roster::{ClassSession, Course, CourseId, SessionId, Student, StudentId, Teacher, TeacherId},
};

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("roster could not be read: {0}")]
    Io(#[from] std::io::Error),

    #[error("roster is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("roster is inconsistent: {0}")]
    Invalid(String),

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of the people and timetable owned by the scheduling and
/// identity services.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn session(&self, id: &SessionId) -> Result<Option<ClassSession>, DirectoryError>;

    /// The session if it exists and is scheduled for the day containing `now`.
    async fn active_session(
        &self,
        id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<ClassSession>, DirectoryError>;

    async fn is_enrolled(
        &self,
        student_id: &StudentId,
        course_id: &CourseId,
    ) -> Result<bool, DirectoryError>;

    async fn student(&self, id: &StudentId) -> Result<Option<Student>, DirectoryError>;

    async fn students(&self) -> Result<Vec<Student>, DirectoryError>;

    async fn teacher(&self, id: &TeacherId) -> Result<Option<Teacher>, DirectoryError>;

    /// Sessions the caller teaches or attends on `weekday`, by start time.
    async fn sessions_for_day(
        &self,
        identity: &Identity,
        weekday: Weekday,
    ) -> Result<Vec<ClassSession>, DirectoryError>;

    /// Calendar date of `now` in the school's local time.
    fn local_date(&self, now: DateTime<Utc>) -> NaiveDate;

    fn weekday_of(&self, now: DateTime<Utc>) -> Weekday {
        self.local_date(now).weekday()
    }
}

#[derive(Debug, Deserialize)]
pub struct RosterFile {
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub students: Vec<Student>,
    #[serde(default)]
    pub courses: Vec<Course>,
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
    #[serde(default)]
    pub schedules: Vec<ScheduleEntry>,
}

#[derive(Debug, Deserialize)]
pub struct Enrollment {
    pub student_id: StudentId,
    pub course_id: CourseId,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleEntry {
    pub id: SessionId,
    pub course_id: CourseId,
    pub teacher_id: TeacherId,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

pub struct InMemoryDirectory {
    teachers: HashMap<TeacherId, Teacher>,
    students: HashMap<StudentId, Student>,
    sessions: HashMap<SessionId, ClassSession>,
    enrollments: HashSet<(StudentId, CourseId)>,
    utc_offset: FixedOffset,
}

impl InMemoryDirectory {
    pub fn load(path: impl AsRef<Path>, utc_offset: FixedOffset) -> Result<Self, DirectoryError> {
        let roster = fs::read_to_string(path)?;
        Self::from_json(&roster, utc_offset)
    }

    pub fn from_json(roster: &str, utc_offset: FixedOffset) -> Result<Self, DirectoryError> {
        let roster: RosterFile = serde_json::from_str(roster)?;
        Self::from_roster(roster, utc_offset)
    }

    pub fn from_roster(roster: RosterFile, utc_offset: FixedOffset) -> Result<Self, DirectoryError> {
        let courses: HashMap<CourseId, Course> = roster
            .courses
            .into_iter()
            .map(|course| (course.id.clone(), course))
            .collect();
        let teachers: HashMap<TeacherId, Teacher> = roster
            .teachers
            .into_iter()
            .map(|teacher| (teacher.id.clone(), teacher))
            .collect();
        let students: HashMap<StudentId, Student> = roster
            .students
            .into_iter()
            .map(|student| (student.id.clone(), student))
            .collect();

        let mut sessions = HashMap::with_capacity(roster.schedules.len());
        for entry in roster.schedules {
            if !(1..=7).contains(&entry.day_of_week) {
                return Err(DirectoryError::Invalid(format!(
                    "schedule {} has day_of_week {}, expected 1-7",
                    entry.id, entry.day_of_week
                )));
            }
            if entry.end_time <= entry.start_time {
                return Err(DirectoryError::Invalid(format!(
                    "schedule {} ends before it starts",
                    entry.id
                )));
            }
            let course = courses.get(&entry.course_id).ok_or_else(|| {
                DirectoryError::Invalid(format!(
                    "schedule {} references unknown course {}",
                    entry.id, entry.course_id
                ))
            })?;
            if !teachers.contains_key(&entry.teacher_id) {
                return Err(DirectoryError::Invalid(format!(
                    "schedule {} references unknown teacher {}",
                    entry.id, entry.teacher_id
                )));
            }

            let session = ClassSession {
                id: entry.id.clone(),
                course_id: entry.course_id,
                course_name: course.course_name.clone(),
                teacher_id: entry.teacher_id,
                day_of_week: entry.day_of_week,
                start_time: entry.start_time,
                end_time: entry.end_time,
            };
            if sessions.insert(entry.id.clone(), session).is_some() {
                return Err(DirectoryError::Invalid(format!(
                    "schedule {} is listed twice",
                    entry.id
                )));
            }
        }

        let mut enrollments = HashSet::with_capacity(roster.enrollments.len());
        for enrollment in roster.enrollments {
            if !students.contains_key(&enrollment.student_id) {
                return Err(DirectoryError::Invalid(format!(
                    "enrollment references unknown student {}",
                    enrollment.student_id
                )));
            }
            if !courses.contains_key(&enrollment.course_id) {
                return Err(DirectoryError::Invalid(format!(
                    "enrollment references unknown course {}",
                    enrollment.course_id
                )));
            }
            enrollments.insert((enrollment.student_id, enrollment.course_id));
        }

        tracing::info!(
            "Roster loaded: {} teachers, {} students, {} sessions, {} enrollments",
            teachers.len(),
            students.len(),
            sessions.len(),
            enrollments.len()
        );

        Ok(Self {
            teachers,
            students,
            sessions,
            enrollments,
            utc_offset,
        })
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn session(&self, id: &SessionId) -> Result<Option<ClassSession>, DirectoryError> {
        Ok(self.sessions.get(id).cloned())
    }

    async fn active_session(
        &self,
        id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<ClassSession>, DirectoryError> {
        let today = self.weekday_of(now);
        Ok(self
            .sessions
            .get(id)
            .filter(|session| session.runs_on(today))
            .cloned())
    }

    async fn is_enrolled(
        &self,
        student_id: &StudentId,
        course_id: &CourseId,
    ) -> Result<bool, DirectoryError> {
        Ok(self
            .enrollments
            .contains(&(student_id.clone(), course_id.clone())))
    }

    async fn student(&self, id: &StudentId) -> Result<Option<Student>, DirectoryError> {
        Ok(self.students.get(id).cloned())
    }

    async fn students(&self) -> Result<Vec<Student>, DirectoryError> {
        Ok(self.students.values().cloned().collect())
    }

    async fn teacher(&self, id: &TeacherId) -> Result<Option<Teacher>, DirectoryError> {
        Ok(self.teachers.get(id).cloned())
    }

    async fn sessions_for_day(
        &self,
        identity: &Identity,
        weekday: Weekday,
    ) -> Result<Vec<ClassSession>, DirectoryError> {
        let mut sessions: Vec<ClassSession> = self
            .sessions
            .values()
            .filter(|session| session.runs_on(weekday))
            .filter(|session| match identity {
                Identity::Teacher(teacher) => session.teacher_id == teacher.id,
                Identity::Student(student) => self
                    .enrollments
                    .contains(&(student.id.clone(), session.course_id.clone())),
            })
            .cloned()
            .collect();

        sessions.sort_by(|a, b| a.start_time.cmp(&b.start_time).then_with(|| a.id.cmp(&b.id)));
        Ok(sessions)
    }

    fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.utc_offset).date_naive()
    }
}
