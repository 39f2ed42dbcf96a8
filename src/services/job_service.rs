use crate::error::{Error, Result};
use crate::models::job::{Job, JobStatus};
use crate::store::client::StoreClient;
use crate::store::collections;
use chrono::Utc;

#[derive(Clone)]
pub struct JobService {
    store: StoreClient,
}

impl JobService {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    pub async fn create(
        &self,
        recruiter_id: &str,
        recruiter_name: &str,
        company: &str,
        title: String,
        description: String,
        requirements: Vec<String>,
    ) -> Result<Job> {
        if title.trim().is_empty() {
            return Err(Error::BadRequest("job title must not be empty".to_string()));
        }

        let job = Job {
            id: StoreClient::push_id(),
            title,
            description,
            requirements,
            status: JobStatus::Active,
            company: company.to_string(),
            recruiter_id: recruiter_id.to_string(),
            recruiter_name: recruiter_name.to_string(),
            created_at: Utc::now(),
            job_description_url: None,
        };
        self.store
            .put_record(collections::JOBS, &job.id, &job)
            .await?;
        Ok(job)
    }

    pub async fn get(&self, id: &str) -> Result<Job> {
        self.store
            .get_record(collections::JOBS, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("job {} not found", id)))
    }

    pub async fn list(&self) -> Result<Vec<Job>> {
        self.store.list(collections::JOBS).await
    }

    pub async fn list_for_recruiter(&self, recruiter_id: &str) -> Result<Vec<Job>> {
        let mut jobs = self.list().await?;
        jobs.retain(|j| j.recruiter_id == recruiter_id);
        Ok(jobs)
    }

    pub async fn list_active(&self) -> Result<Vec<Job>> {
        let mut jobs = self.list().await?;
        jobs.retain(|j| j.status == JobStatus::Active);
        Ok(jobs)
    }

    pub async fn set_status(&self, id: &str, recruiter_id: &str, status: JobStatus) -> Result<Job> {
        let mut job = self.get(id).await?;
        if job.recruiter_id != recruiter_id {
            return Err(Error::Forbidden(
                "job belongs to another recruiter".to_string(),
            ));
        }
        job.status = status;
        self.store.put_record(collections::JOBS, id, &job).await?;
        Ok(job)
    }

    /// Attach the URL of an uploaded job-description document. The bytes
    /// themselves go through the pass-through upload store.
    pub async fn attach_document(&self, id: &str, recruiter_id: &str, url: String) -> Result<Job> {
        let mut job = self.get(id).await?;
        if job.recruiter_id != recruiter_id {
            return Err(Error::Forbidden(
                "job belongs to another recruiter".to_string(),
            ));
        }
        job.job_description_url = Some(url);
        self.store.put_record(collections::JOBS, id, &job).await?;
        Ok(job)
    }
}
