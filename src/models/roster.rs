use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

macro_rules! roster_id {
    ($name:ident) => {
        #[derive(
            Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

roster_id!(SessionId);
roster_id!(StudentId);
roster_id!(TeacherId);
roster_id!(CourseId);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub full_name: String,
    pub roll_number: String,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Teacher {
    pub id: TeacherId,
    pub full_name: String,
    pub employee_id: String,
    #[serde(default)]
    pub department: Option<String>,
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Course {
    pub id: CourseId,
    pub course_name: String,
}

/// One scheduled class meeting. Recurs weekly on `day_of_week` (ISO, Monday = 1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSession {
    pub id: SessionId,
    pub course_id: CourseId,
    pub course_name: String,
    pub teacher_id: TeacherId,
    pub day_of_week: u8,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl ClassSession {
    pub fn runs_on(&self, weekday: Weekday) -> bool {
        iso_day_number(weekday) == self.day_of_week
    }

    /// The occurrence of this session on `date`, if it is scheduled that day.
    pub fn meeting_on(&self, date: NaiveDate) -> Option<Meeting> {
        self.runs_on(date.weekday()).then(|| Meeting {
            session_id: self.id.clone(),
            date,
        })
    }
}

/// One dated occurrence of a weekly [`ClassSession`]. Attendance is taken per meeting.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Meeting {
    pub session_id: SessionId,
    /// Local calendar date in the school's offset.
    pub date: NaiveDate,
}

impl fmt::Display for Meeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.session_id, self.date)
    }
}

pub fn iso_day_number(weekday: Weekday) -> u8 {
    weekday.number_from_monday() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monday_slot() -> ClassSession {
        ClassSession {
            id: SessionId::new("s-mon"),
            course_id: CourseId::new("c-1"),
            course_name: "Compilers".into(),
            teacher_id: TeacherId::new("t-1"),
            day_of_week: 1,
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        }
    }

    #[test]
    fn each_week_is_a_separate_meeting() {
        let slot = monday_slot();
        let first = slot.meeting_on(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();
        let second = slot.meeting_on(NaiveDate::from_ymd_opt(2024, 1, 8).unwrap()).unwrap();

        assert_eq!(first.session_id, second.session_id);
        assert_ne!(first, second);
        assert_eq!(first.to_string(), "s-mon@2024-01-01");
    }

    #[test]
    fn no_meeting_on_other_weekdays() {
        assert!(monday_slot()
            .meeting_on(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap())
            .is_none());
    }
}
