pub mod config;
pub mod dto;
pub mod error;
pub mod exam;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use crate::services::{
    application_service::ApplicationService, assignment_service::AssignmentService,
    auth_service::AuthService, interview_service::InterviewService, job_service::JobService,
    question_source::QuestionSource,
};
use crate::store::backend::StoreBackend;
use crate::store::client::StoreClient;
use reqwest::Client;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: StoreClient,
    pub auth_service: AuthService,
    pub question_source: QuestionSource,
    pub assignment_service: AssignmentService,
    pub job_service: JobService,
    pub application_service: ApplicationService,
    pub interview_service: InterviewService,
}

impl AppState {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        let config = crate::config::get_config();
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("failed to build HTTP client");

        let store = StoreClient::new(backend);
        let auth_service = AuthService::new(
            config.identity_base_url.clone(),
            config.identity_api_key.clone(),
            config.jwt_secret.clone(),
            store.clone(),
            http_client.clone(),
        );
        let question_source = QuestionSource::new(
            config.generation_base_url.clone(),
            config.generation_api_key.clone(),
            http_client,
        );
        let assignment_service = AssignmentService::new(store.clone());
        let job_service = JobService::new(store.clone());
        let application_service = ApplicationService::new(store.clone());
        let interview_service = InterviewService::new(store.clone());

        Self {
            store,
            auth_service,
            question_source,
            assignment_service,
            job_service,
            application_service,
            interview_service,
        }
    }
}
