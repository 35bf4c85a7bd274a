use serde::{Deserialize, Serialize};

use super::{Hospital, Profession, RatingSummary, RecordId, Timestamp};
use crate::error::{AppError, AppResult};

/// Stored doctor profile. Owned by one user account; ratings live on comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: RecordId,
    pub user_id: RecordId,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub img: String,
    pub about: String,
    pub profession_id: RecordId,
    pub hospital_id: RecordId,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub contact: Contact,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub profession: String,
    pub hospital: String,
    pub field: String,
    pub term_start: Timestamp,
    pub term_end: Timestamp,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub major: String,
    pub institution: String,
    pub term_start: Timestamp,
    pub term_end: Timestamp,
    pub country: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub phone: String,
    pub email: String,
    pub facebook: String,
}

/// Profile fields a doctor submits about themselves
#[derive(Debug, Clone, Deserialize)]
pub struct DoctorProfile {
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub about: String,
    pub profession_id: RecordId,
    pub hospital_id: RecordId,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub contact: Contact,
}

impl DoctorProfile {
    pub fn validate(&self) -> AppResult<()> {
        for (field, value) in [
            ("title", &self.title),
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{} is required", field)));
            }
        }
        Ok(())
    }

    pub fn into_doctor(self, id: RecordId, user_id: RecordId, now: Timestamp) -> Doctor {
        Doctor {
            id,
            user_id,
            title: self.title,
            first_name: self.first_name,
            last_name: self.last_name,
            img: String::new(),
            about: self.about,
            profession_id: self.profession_id,
            hospital_id: self.hospital_id,
            experience: self.experience,
            education: self.education,
            contact: self.contact,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Doctor strict-joined with its profession and hospital
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorView {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub full_name: String,
    pub profession: Profession,
    pub hospital: Hospital,
}

impl DoctorView {
    pub fn new(doctor: Doctor, profession: Profession, hospital: Hospital) -> Self {
        Self {
            full_name: doctor.full_name(),
            doctor,
            profession,
            hospital,
        }
    }
}

/// One row of the ranked doctor listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDoctor {
    pub id: RecordId,
    pub user_id: RecordId,
    pub title: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub img: String,
    pub rank: f64,
    pub rating: RatingSummary,
    pub profession: Profession,
    pub hospital: Hospital,
}

impl RankedDoctor {
    pub fn new(view: DoctorView, rating: RatingSummary, rank: f64) -> Self {
        let DoctorView {
            doctor,
            full_name,
            profession,
            hospital,
        } = view;
        Self {
            id: doctor.id,
            user_id: doctor.user_id,
            title: doctor.title,
            first_name: doctor.first_name,
            last_name: doctor.last_name,
            full_name,
            img: doctor.img,
            rank,
            rating,
            profession,
            hospital,
        }
    }
}

/// Doctor page payload.
///
/// `rate` is `-1` with `reviews = 0` when nobody has reviewed the doctor yet;
/// existing clients rely on that sentinel since 0 is outside the rating range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DoctorDetail {
    #[serde(flatten)]
    pub view: DoctorView,
    pub rate: f64,
    pub reviews: u64,
}

impl DoctorDetail {
    pub const NO_RATING: f64 = -1.0;

    pub fn new(view: DoctorView, rating: Option<RatingSummary>) -> Self {
        match rating.filter(|r| !r.is_empty()) {
            Some(rating) => Self {
                view,
                rate: rating.value,
                reviews: rating.count,
            },
            None => Self {
                view,
                rate: Self::NO_RATING,
                reviews: 0,
            },
        }
    }
}

#[cfg(test)]
impl Doctor {
    pub fn fixture(
        id: RecordId,
        user_id: RecordId,
        profession_id: RecordId,
        hospital_id: RecordId,
    ) -> Self {
        Doctor {
            id,
            user_id,
            title: "Dr.".into(),
            first_name: format!("First{}", id),
            last_name: format!("Last{}", id),
            img: String::new(),
            about: String::new(),
            profession_id,
            hospital_id,
            experience: Vec::new(),
            education: Vec::new(),
            contact: Contact::default(),
            created_at: 1_700_000_000,
            updated_at: 1_700_000_000,
        }
    }
}
