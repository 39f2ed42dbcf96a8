use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::job::Job;
use crate::services::interview_service::InterviewService;
use crate::store::client::StoreClient;
use crate::store::collections;
use chrono::Utc;

#[derive(Clone)]
pub struct ApplicationService {
    store: StoreClient,
}

impl ApplicationService {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn apply(
        &self,
        job: &Job,
        candidate_id: &str,
        name: &str,
        email: &str,
        phone: Option<String>,
        skills: Vec<String>,
        experience: Option<String>,
        location: Option<String>,
        resume_url: Option<String>,
    ) -> Result<Application> {
        let existing = self.list_for_candidate(candidate_id).await?;
        if existing.iter().any(|a| a.job_id == job.id) {
            return Err(Error::Conflict(
                "candidate already applied to this job".to_string(),
            ));
        }

        let application = Application {
            id: StoreClient::push_id(),
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            candidate_id: candidate_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            phone,
            skills,
            experience,
            location,
            resume_url,
            status: ApplicationStatus::Pending,
            applied_at: Utc::now(),
        };
        self.store
            .put_record(collections::APPLICATIONS, &application.id, &application)
            .await?;
        Ok(application)
    }

    pub async fn get(&self, id: &str) -> Result<Application> {
        self.store
            .get_record(collections::APPLICATIONS, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("application {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<Application>> {
        self.store.list(collections::APPLICATIONS).await
    }

    pub async fn list_for_candidate(&self, candidate_id: &str) -> Result<Vec<Application>> {
        let mut applications = self.list().await?;
        applications.retain(|a| a.candidate_id == candidate_id);
        Ok(applications)
    }

    pub async fn list_for_jobs(&self, job_ids: &[String]) -> Result<Vec<Application>> {
        let mut applications = self.list().await?;
        applications.retain(|a| job_ids.contains(&a.job_id));
        Ok(applications)
    }

    /// Recruiter decision. Selecting a candidate also schedules an interview
    /// record, mirroring the dashboard flow.
    pub async fn update_status(
        &self,
        id: &str,
        job: &Job,
        status: ApplicationStatus,
        interviews: &InterviewService,
    ) -> Result<Application> {
        let mut application = self.get(id).await?;
        if application.job_id != job.id {
            return Err(Error::BadRequest(
                "application does not belong to this job".to_string(),
            ));
        }
        application.status = status;
        self.store
            .put_record(collections::APPLICATIONS, id, &application)
            .await?;

        if status == ApplicationStatus::Selected {
            interviews.schedule(job, &application).await?;
        }
        Ok(application)
    }
}
