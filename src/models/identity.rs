use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::roster::{StudentId, TeacherId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeacherIdentity {
    pub id: TeacherId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StudentIdentity {
    pub id: StudentId,
}

/// Verified caller. Operations take the variant they are legal for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Identity {
    Teacher(TeacherIdentity),
    Student(StudentIdentity),
}

impl Identity {
    pub fn role(&self) -> Role {
        match self {
            Self::Teacher(_) => Role::Teacher,
            Self::Student(_) => Role::Student,
        }
    }

    pub fn subject(&self) -> &str {
        match self {
            Self::Teacher(teacher) => teacher.id.as_str(),
            Self::Student(student) => student.id.as_str(),
        }
    }
}
