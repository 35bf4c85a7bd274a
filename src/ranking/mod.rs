// Rating aggregation and doctor ranking

pub mod filter;
pub mod score;

pub use filter::NameFilter;
pub use score::{rank_score, RatingSnapshot};

use std::sync::Arc;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ReviewStore;
use crate::models::{DoctorDetail, DoctorView, Page, RankedDoctor, RecordId};

/// Read-only ranking over the review store. Ratings are always aggregated on
/// read; nothing here is cached between queries.
#[derive(Clone)]
pub struct RankingEngine {
    store: Arc<dyn ReviewStore>,
}

impl RankingEngine {
    pub fn new(store: Arc<dyn ReviewStore>) -> Self {
        Self { store }
    }

    /// Rank-ordered page of doctors whose full name contains `term`
    pub async fn rank_doctors(&self, term: &str, page: Page) -> AppResult<Vec<RankedDoctor>> {
        let filter = NameFilter::new(term)?;

        let snapshot = RatingSnapshot::from_doctor_ratings(self.store.doctor_ratings().await?);
        let candidates = self.store.ranking_candidates().await?;
        debug!(
            "Ranking {} doctors against global prior {:?}",
            candidates.len(),
            snapshot.global
        );

        Ok(rank_candidates(candidates, &snapshot, &filter, page))
    }

    pub async fn doctor_detail(&self, doctor_id: RecordId) -> AppResult<DoctorDetail> {
        let view = self
            .store
            .doctor_view(doctor_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Doctor {} not found", doctor_id)))?;
        let rating = self.store.doctor_rating(doctor_id).await?;
        Ok(DoctorDetail::new(view, rating))
    }
}

/// Score, filter, order and page already-joined candidates.
///
/// Candidates arrive in insertion order; the sort is stable so equal scores
/// keep that order and pagination stays deterministic.
pub fn rank_candidates(
    candidates: Vec<DoctorView>,
    snapshot: &RatingSnapshot,
    filter: &NameFilter,
    page: Page,
) -> Vec<RankedDoctor> {
    let mut ranked: Vec<RankedDoctor> = candidates
        .into_iter()
        .filter(|view| filter.matches(&view.full_name))
        .map(|view| {
            let rating = snapshot.for_doctor(view.doctor.id);
            let rank = snapshot.score(view.doctor.id);
            RankedDoctor::new(view, rating, rank)
        })
        .collect();

    ranked.sort_by(|a, b| b.rank.total_cmp(&a.rank));

    ranked
        .into_iter()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::sqlite_database::SqliteReviewStore;
    use crate::models::{Comment, Doctor, Hospital, Profession, RatingSummary};

    fn view(id: RecordId, first: &str, last: &str) -> DoctorView {
        let mut doctor = Doctor::fixture(id, id + 1000, 1, 1);
        doctor.first_name = first.to_string();
        doctor.last_name = last.to_string();
        DoctorView::new(
            doctor,
            Profession { id: 1, name: "Surgery".into() },
            Hospital { id: 1, name: "Central".into(), img: String::new() },
        )
    }

    fn ids(ranked: &[RankedDoctor]) -> Vec<RecordId> {
        ranked.iter().map(|d| d.id).collect()
    }

    #[test]
    fn test_rank_orders_by_score_then_input_order() {
        let snapshot = RatingSnapshot::from_doctor_ratings(vec![
            (2, RatingSummary::new(5.0, 10)),
            (4, RatingSummary::new(1.0, 10)),
        ]);
        let candidates = vec![
            view(1, "Ann", "A"),
            view(2, "Bob", "B"),
            view(3, "Cat", "C"),
            view(4, "Dan", "D"),
            view(5, "Eve", "E"),
        ];
        let all = NameFilter::new("").unwrap();

        let ranked = rank_candidates(candidates.clone(), &snapshot, &all, Page::new(0, 0, 12));
        // 1, 3 and 5 tie on the global prior and keep insertion order
        assert_eq!(ids(&ranked), vec![2, 1, 3, 5, 4]);
        assert_eq!(ranked[1].rating, RatingSummary::EMPTY);

        let page = rank_candidates(candidates, &snapshot, &all, Page::new(1, 2, 12));
        assert_eq!(ids(&page), vec![1, 3]);
    }

    #[test]
    fn test_rank_applies_name_filter() {
        let snapshot = RatingSnapshot::default();
        let candidates = vec![view(1, "Ada", "Lovelace"), view(2, "Grace", "Hopper")];
        let filter = NameFilter::new("HOPP").unwrap();

        let ranked = rank_candidates(candidates, &snapshot, &filter, Page::new(0, 12, 12));
        assert_eq!(ids(&ranked), vec![2]);
        assert_eq!(ranked[0].full_name, "Grace Hopper");
        assert_eq!(ranked[0].rank, 0.0);
    }

    async fn seeded_engine() -> (RankingEngine, Arc<SqliteReviewStore>) {
        let store = Arc::new(SqliteReviewStore::new_in_memory().await.unwrap());
        store
            .create_profession(&Profession { id: 1, name: "Cardiology".into() })
            .await
            .unwrap();
        store
            .create_hospital(&Hospital { id: 1, name: "General".into(), img: String::new() })
            .await
            .unwrap();
        (RankingEngine::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_rank_doctors_end_to_end() {
        let (engine, store) = seeded_engine().await;

        let d = Doctor::fixture(10, 1, 1, 1);
        let e = Doctor::fixture(11, 2, 1, 1);
        let orphan = Doctor::fixture(12, 3, 99, 1);
        for doctor in [&d, &e, &orphan] {
            store.upsert_doctor(doctor).await.unwrap();
        }

        let mut next_id = 1000;
        for (doctor_id, ratings) in [(10, vec![4.0, 4.0, 4.0, 5.0]), (11, vec![5.0]), (12, vec![1.0, 1.0])] {
            for rating in ratings {
                next_id += 1;
                store
                    .upsert_comment(&Comment::fixture(next_id, doctor_id, next_id, rating))
                    .await
                    .unwrap();
            }
        }

        let ranked = engine.rank_doctors("", Page::new(0, 0, 12)).await.unwrap();
        // the orphaned doctor has no profession and is excluded, but its
        // comments still count toward the global prior
        assert_eq!(ids(&ranked), vec![10, 11]);
        let global = RatingSummary::new(24.0 / 7.0, 7);
        assert!((ranked[0].rank - rank_score(RatingSummary::new(4.25, 4), global)).abs() < 1e-9);
        assert_eq!(ranked[0].rating.count, 4);
        assert_eq!(ranked[1].rating, RatingSummary::new(5.0, 1));
        assert_eq!(ranked[0].profession.name, "Cardiology");

        let filtered = engine.rank_doctors("last11", Page::new(0, 0, 12)).await.unwrap();
        assert_eq!(ids(&filtered), vec![11]);
    }

    #[tokio::test]
    async fn test_rank_doctors_without_any_comments() {
        let (engine, store) = seeded_engine().await;
        store.upsert_doctor(&Doctor::fixture(10, 1, 1, 1)).await.unwrap();

        let ranked = engine.rank_doctors("", Page::new(0, 0, 12)).await.unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].rank, 0.0);
        assert_eq!(ranked[0].rating, RatingSummary::EMPTY);
    }

    #[tokio::test]
    async fn test_doctor_detail() {
        let (engine, store) = seeded_engine().await;
        store.upsert_doctor(&Doctor::fixture(10, 1, 1, 1)).await.unwrap();
        store.upsert_doctor(&Doctor::fixture(12, 3, 1, 99)).await.unwrap();

        let detail = engine.doctor_detail(10).await.unwrap();
        assert_eq!((detail.rate, detail.reviews), (-1.0, 0));

        store.upsert_comment(&Comment::fixture(1, 10, 5, 3.0)).await.unwrap();
        store.upsert_comment(&Comment::fixture(2, 10, 6, 4.0)).await.unwrap();
        let detail = engine.doctor_detail(10).await.unwrap();
        assert_eq!((detail.rate, detail.reviews), (3.5, 2));
        assert_eq!(detail.view.hospital.name, "General");

        assert!(matches!(engine.doctor_detail(12).await, Err(AppError::NotFound(_))));
        assert!(matches!(engine.doctor_detail(77).await, Err(AppError::NotFound(_))));
    }
}
