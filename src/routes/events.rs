use std::convert::Infallible;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::stream::{Stream, StreamExt};

use crate::error::Error;
use crate::services::auth_service::Claims;
use crate::store::collections;
use crate::AppState;

fn snapshot_event(collection: &str, data: &serde_json::Value) -> Event {
    Event::default()
        .event("snapshot")
        .data(serde_json::json!({ "collection": collection, "data": data }).to_string())
}

/// Live collection feed. The first frame is the current snapshot so the
/// consumer never renders from nothing; every subsequent frame is the whole
/// collection again after some write touched it.
pub async fn subscribe_collection(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(collection): Path<String>,
) -> crate::error::Result<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    if !collections::is_known(&collection) {
        return Err(Error::NotFound(format!(
            "unknown collection: {}",
            collection
        )));
    }
    // Profile records carry contact details; only recruiters observe them.
    if collection == collections::USERS && claims.role != "recruiter" {
        return Err(Error::Forbidden(
            "profiles are not observable for this role".to_string(),
        ));
    }

    let initial = snapshot_event(&collection, &state.store.snapshot(&collection).await?);
    let subscription = state.store.subscribe(&collection);

    let updates = futures::stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.recv().await?;
        Some((
            Ok(snapshot_event(&event.collection, &event.data)),
            subscription,
        ))
    });
    let stream = futures::stream::once(async move { Ok(initial) }).chain(updates);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
