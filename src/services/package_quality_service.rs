use surrealdb::sql::Thing;

use crate::entities::data_package::{PackageQualityUpdate, PackageQualityView};
use crate::entities::review_submission::ReviewSubmissionEntity;
use crate::interfaces::repositories::data_package_ifce::DataPackageRepositoryInterface;
use crate::interfaces::repositories::review_submission_ifce::ReviewSubmissionRepositoryInterface;
use crate::middleware::error::{AppError, AppResult};

pub const RECENT_REVIEWS_LIMIT: u16 = 10;
pub const FINDINGS_PREVIEW_CHARS: usize = 200;

/// Means of one settled batch. The running review count is added on top by the store.
pub fn batch_update(submissions: &[ReviewSubmissionEntity]) -> PackageQualityUpdate {
    let count = submissions.len();
    let mean = |score: fn(&ReviewSubmissionEntity) -> u8| {
        if count == 0 {
            return 0.0;
        }
        submissions.iter().map(|s| score(s) as f64).sum::<f64>() / count as f64
    };
    PackageQualityUpdate {
        avg_quality_score: mean(|s| s.quality_score),
        avg_timeliness_score: mean(|s| s.timeliness_score),
        avg_schema_score: mean(|s| s.schema_compliance_score),
        overall_rating: mean(|s| s.overall_rating),
        review_count: count as u32,
    }
}

fn preview(findings: String) -> String {
    if findings.chars().count() <= FINDINGS_PREVIEW_CHARS {
        return findings;
    }
    findings.chars().take(FINDINGS_PREVIEW_CHARS).collect()
}

pub struct PackageQualityService<'a, P, S>
where
    P: DataPackageRepositoryInterface + Send + Sync,
    S: ReviewSubmissionRepositoryInterface + Send + Sync,
{
    packages: &'a P,
    submissions: &'a S,
}

impl<'a, P, S> PackageQualityService<'a, P, S>
where
    P: DataPackageRepositoryInterface + Send + Sync,
    S: ReviewSubmissionRepositoryInterface + Send + Sync,
{
    pub fn new(packages: &'a P, submissions: &'a S) -> Self {
        Self {
            packages,
            submissions,
        }
    }

    pub async fn get_quality(&self, package_id: &Thing) -> AppResult<PackageQualityView> {
        let package = self
            .packages
            .get(package_id)
            .await?
            .ok_or(AppError::EntityFailIdNotFound {
                ident: package_id.to_raw(),
            })?;
        let quality = self.packages.get_quality(&package.id).await?;
        let recent_reviews = self
            .submissions
            .list_recent_for_package(&package.id, RECENT_REVIEWS_LIMIT)
            .await?
            .into_iter()
            .map(|mut review| {
                review.findings = preview(review.findings);
                review
            })
            .collect();

        Ok(PackageQualityView {
            package_id: package.id,
            package_name: package.name,
            quality,
            recent_reviews,
        })
    }
}
