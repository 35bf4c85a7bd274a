// DirectoryService - doctor profiles and the profession/hospital reference lists

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::infrastructure::{IdGenerator, ReviewStore, ViewerContext};
use crate::models::{current_time_secs, DoctorProfile, DoctorView, Hospital, Page, Profession};
use crate::ranking::NameFilter;

#[derive(Debug, Clone, Deserialize)]
pub struct NewProfession {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewHospital {
    pub name: String,
    #[serde(default)]
    pub img: String,
}

#[derive(Clone)]
pub struct DirectoryService {
    store: Arc<dyn ReviewStore>,
    ids: Arc<IdGenerator>,
}

impl DirectoryService {
    pub fn new(store: Arc<dyn ReviewStore>, ids: Arc<IdGenerator>) -> Self {
        Self { store, ids }
    }

    /// Create or replace the profile owned by the viewer
    pub async fn upsert_doctor_profile(
        &self,
        viewer: &ViewerContext,
        profile: DoctorProfile,
    ) -> AppResult<(DoctorView, bool)> {
        let user_id = viewer.require_user()?;
        profile.validate()?;

        if !self.store.profession_exists(profile.profession_id).await? {
            return Err(AppError::NotFound(format!(
                "Profession {} not found",
                profile.profession_id
            )));
        }
        if !self.store.hospital_exists(profile.hospital_id).await? {
            return Err(AppError::NotFound(format!(
                "Hospital {} not found",
                profile.hospital_id
            )));
        }

        let doctor = profile.into_doctor(self.ids.next_id(), user_id, current_time_secs());
        let (stored, created) = self.store.upsert_doctor(&doctor).await?;
        info!(
            "Doctor profile {} for user {} {} ({})",
            stored.id,
            user_id,
            if created { "created" } else { "updated" },
            viewer.request_id
        );

        let view = self.store.doctor_view(stored.id).await?.ok_or_else(|| {
            AppError::Internal(format!("Doctor {} vanished after upsert", stored.id))
        })?;
        Ok((view, created))
    }

    pub async fn doctor_by_self(&self, viewer: &ViewerContext) -> AppResult<DoctorView> {
        let user_id = viewer.require_user()?;
        self.store
            .doctor_view_by_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No doctor profile for this user".to_string()))
    }

    pub async fn create_profession(
        &self,
        viewer: &ViewerContext,
        input: NewProfession,
    ) -> AppResult<Profession> {
        viewer.require_user()?;
        let profession = Profession {
            id: self.ids.next_id(),
            name: required_name(&input.name)?,
        };
        self.store.create_profession(&profession).await?;
        info!("Profession {:?} created ({})", profession.name, viewer.request_id);
        Ok(profession)
    }

    pub async fn list_professions(&self, term: &str, page: Page) -> AppResult<Vec<Profession>> {
        let filter = NameFilter::new(term)?;
        let professions = self.store.list_professions().await?;
        Ok(paginate(professions.into_iter().filter(|p| filter.matches(&p.name)), page))
    }

    pub async fn create_hospital(
        &self,
        viewer: &ViewerContext,
        input: NewHospital,
    ) -> AppResult<Hospital> {
        viewer.require_user()?;
        let hospital = Hospital {
            id: self.ids.next_id(),
            name: required_name(&input.name)?,
            img: input.img.trim().to_string(),
        };
        self.store.create_hospital(&hospital).await?;
        info!("Hospital {:?} created ({})", hospital.name, viewer.request_id);
        Ok(hospital)
    }

    pub async fn list_hospitals(&self, term: &str, page: Page) -> AppResult<Vec<Hospital>> {
        let filter = NameFilter::new(term)?;
        let hospitals = self.store.list_hospitals().await?;
        Ok(paginate(hospitals.into_iter().filter(|h| filter.matches(&h.name)), page))
    }
}

fn required_name(raw: &str) -> AppResult<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    Ok(name.to_string())
}

fn paginate<T>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    items.skip(page.skip as usize).take(page.limit as usize).collect()
}
