use crate::error::Result;
use crate::models::application::Application;
use crate::models::interview::{Interview, InterviewStatus};
use crate::models::job::Job;
use crate::store::client::StoreClient;
use crate::store::collections;
use chrono::Utc;

#[derive(Clone)]
pub struct InterviewService {
    store: StoreClient,
}

impl InterviewService {
    pub fn new(store: StoreClient) -> Self {
        Self { store }
    }

    pub async fn schedule(&self, job: &Job, application: &Application) -> Result<Interview> {
        let interview = Interview {
            id: StoreClient::push_id(),
            job_id: job.id.clone(),
            job_title: job.title.clone(),
            candidate_id: application.candidate_id.clone(),
            candidate_name: application.name.clone(),
            candidate_email: application.email.clone(),
            recruiter_id: job.recruiter_id.clone(),
            company: job.company.clone(),
            status: InterviewStatus::Scheduled,
            scheduled_at: None,
            created_at: Utc::now(),
        };
        self.store
            .put_record(collections::INTERVIEWS, &interview.id, &interview)
            .await?;
        tracing::info!(
            interview_id = %interview.id,
            candidate = %interview.candidate_name,
            "interview scheduled"
        );
        Ok(interview)
    }

    pub async fn list_for_candidate(&self, candidate_id: &str) -> Result<Vec<Interview>> {
        let mut interviews: Vec<Interview> = self.store.list(collections::INTERVIEWS).await?;
        interviews.retain(|i| i.candidate_id == candidate_id);
        Ok(interviews)
    }

    pub async fn list_for_recruiter(&self, recruiter_id: &str) -> Result<Vec<Interview>> {
        let mut interviews: Vec<Interview> = self.store.list(collections::INTERVIEWS).await?;
        interviews.retain(|i| i.recruiter_id == recruiter_id);
        Ok(interviews)
    }
}
