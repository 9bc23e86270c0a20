//! The HTTP clients against a local axum server standing in for the remote services.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::http::{Method, StatusCode};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use services::{AdvanceOutcome, AppConfig, AppServices, AuthError, Clock, NotificationLevel};
use storage::repository::{InMemoryRepository, StorageError, StudyStatsRepository};
use toeic_core::FetchError;
use toeic_core::model::practice::{
    AddHighlightRequest, AddNoteRequest, FlashcardMasterRequest, HighlightRange, PracticeKind,
    PracticeSubmission, UpdateNoteRequest,
};
use toeic_core::model::{LessonId, NoteId, ProfileUpdate, StudyStatsUpdate, UserId};
use toeic_core::time::fixed_now;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct Recorded {
    finishes: Arc<Mutex<Vec<(String, Value)>>>,
    writes: Arc<Mutex<Vec<(Method, String, Value)>>>,
}

impl Recorded {
    fn write(&self, method: Method, path: String, body: Value) {
        self.writes.lock().unwrap().push((method, path, body));
    }

    fn writes(&self) -> Vec<(Method, String, Value)> {
        self.writes.lock().unwrap().clone()
    }
}

const LESSON_ONE: &str = r#"{
    "id": 1,
    "title": "Present Simple",
    "videos": [],
    "exerciseTypes": [
        { "id": 1, "name": "Part 5", "exercises": [
            { "id": 11, "question": "q1", "optionA": "a", "optionB": "b", "optionC": "c", "optionD": "d", "correctOption": "A", "explanation": "" },
            { "id": 12, "question": "q2", "optionA": "a", "optionB": "b", "optionC": "c", "optionD": "d", "correctOption": "B", "explanation": "" }
        ]},
        { "id": 2, "name": "Part 6", "exercises": [
            { "id": 21, "question": "q3", "optionA": "a", "optionB": "b", "optionC": "c", "optionD": "d", "correctOption": "C", "explanation": "" },
            { "id": 22, "question": "q4", "optionA": "a", "optionB": "b", "optionC": "c", "optionD": "d", "correctOption": "D", "explanation": "" }
        ]}
    ]
}"#;

async fn courses() -> Json<Value> {
    Json(json!([{ "id": 1, "name": "TOEIC 450+" }, { "id": 2, "name": "Broken" }]))
}

async fn course_detail(Path(id): Path<u64>) -> Response {
    if id == 1 {
        Json(json!({
            "id": 1,
            "name": "TOEIC 450+",
            "modules": [{ "id": 10, "name": "Grammar", "lessons": [{ "id": 1, "title": "Present Simple" }] }]
        }))
        .into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
    }
}

async fn lesson(Path(id): Path<u64>) -> Response {
    match id {
        1 => (
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            LESSON_ONE,
        )
            .into_response(),
        2 => Json(json!({
            "id": 2, "title": "Broken", "exerciseTypes": [{ "id": 1, "name": "x", "exercises": [
                { "id": 1, "question": "q", "correctOption": "E" }
            ]}]
        }))
        .into_response(),
        _ => (StatusCode::NOT_FOUND, "lesson not found").into_response(),
    }
}

async fn theory(Query(query): Query<HashMap<String, String>>) -> String {
    format!(
        "Theory for {}",
        query.get("titleLesson").cloned().unwrap_or_default()
    )
}

async fn finish(
    State(recorded): State<Recorded>,
    Path((user, lesson)): Path<(u64, u64)>,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded
        .finishes
        .lock()
        .unwrap()
        .push((format!("{user}/{lesson}"), body));
    Json(json!({ "message": "lesson finished" }))
}

async fn get_stats(Path(user): Path<u64>) -> Response {
    if user == 7 {
        Json(json!({ "completed_lessons": 3, "total_study_hours": 1.5, "current_streak": 2 }))
            .into_response()
    } else {
        (StatusCode::NOT_FOUND, "no stats").into_response()
    }
}

async fn put_stats() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "db down").into_response()
}

async fn login(Json(body): Json<Value>) -> Response {
    if body["password"] == "secret" {
        Json(json!({
            "message": "ok",
            "user": { "id": 42, "username": body["username"], "email": "lan@example.com" }
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "wrong password" })),
        )
            .into_response()
    }
}

async fn add_note(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    recorded.write(Method::POST, "user-notes/add".into(), body.clone());
    Json(json!({
        "message": "note added",
        "note": {
            "id": 5, "userId": body["userId"], "lessonId": body["lessonId"],
            "note": body["note"], "createdAt": "2024-05-01T10:00:00Z"
        }
    }))
}

async fn update_note(
    State(recorded): State<Recorded>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded.write(Method::PUT, format!("user-notes/update/{id}"), body.clone());
    Json(json!({
        "message": "note updated",
        "note": {
            "id": id, "userId": 42, "lessonId": 1,
            "note": body["note"], "createdAt": "2024-05-01T10:00:00Z"
        }
    }))
}

async fn delete_note(State(recorded): State<Recorded>, Path(id): Path<u64>) -> Json<Value> {
    recorded.write(Method::DELETE, format!("user-notes/delete/{id}"), Value::Null);
    Json(json!({ "message": "note deleted" }))
}

async fn highlights(Path((user, lesson)): Path<(u64, u64)>) -> Json<Value> {
    Json(json!([
        { "id": 1, "userId": user, "lessonId": lesson, "startIndex": 0, "endIndex": 4, "color": "yellow" },
        { "id": 2, "userId": user, "lessonId": lesson, "startIndex": 10, "endIndex": 18, "color": "green",
          "createdAt": "2024-05-02T10:00:00Z" }
    ]))
}

async fn add_highlight(State(recorded): State<Recorded>, Json(body): Json<Value>) -> Json<Value> {
    recorded.write(Method::POST, "user-highlights/add".into(), body.clone());
    let mut highlight = body;
    highlight["id"] = json!(3);
    Json(json!({ "message": "highlight added", "highlight": highlight }))
}

async fn post_practice(
    State(recorded): State<Recorded>,
    Path((kind, action)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    match (kind.as_str(), action.as_str()) {
        (_, "submit") | ("flashcard", "master") => {
            recorded.write(Method::POST, format!("user-progress/{kind}/{action}"), body);
            Json(json!({ "message": "saved", "data": null })).into_response()
        }
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn practice_count(Path((kind, what, _user)): Path<(String, String, u64)>) -> Response {
    match (kind.as_str(), what.as_str()) {
        ("grammar", "completed") => Json(json!(4)).into_response(),
        ("reading", "completed") => Json(json!(2)).into_response(),
        ("listening", "completed") => Json(json!(0)).into_response(),
        ("flashcard", "mastered") => Json(json!(9)).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn dashboard_summary(Path(user): Path<u64>) -> Response {
    if user == 42 {
        Json(json!({
            "vocabularyCount": 120, "notesCount": 3, "highlightsCount": 5,
            "grammarCompleted": 4, "readingCompleted": 2, "flashcardMastered": 9
        }))
        .into_response()
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "stats offline").into_response()
    }
}

async fn get_profile(Path(user): Path<u64>) -> Response {
    if user == 42 {
        Json(json!({ "id": 42, "email": "lan@example.com", "full_name": "Lan Nguyen", "avatar_url": null }))
            .into_response()
    } else {
        (StatusCode::NOT_FOUND, "no profile").into_response()
    }
}

async fn put_profile(
    State(recorded): State<Recorded>,
    Path(user): Path<u64>,
    Json(body): Json<Value>,
) -> Json<Value> {
    recorded.write(Method::PUT, format!("profiles/{user}"), body.clone());
    Json(json!({
        "id": user,
        "email": "lan@example.com",
        "full_name": body.get("full_name").cloned().unwrap_or(Value::Null)
    }))
}

async fn goals(Path(_user): Path<u64>) -> Json<Value> {
    Json(json!([
        { "id": 1, "goal_type": "lessons_per_week", "target_value": 5, "current_value": 2, "completed": false },
        { "id": 2, "goal_type": "target_score", "target_value": 650, "current_value": 700, "completed": true }
    ]))
}

async fn achievements(Path(_user): Path<u64>) -> Json<Value> {
    Json(json!([
        { "id": 1, "achievement_type": "lesson", "title": "First lesson", "earned_at": "2024-04-01T09:00:00Z" },
        { "id": 3, "achievement_type": "streak", "title": "7 day streak", "description": "a full week",
          "earned_at": "2024-04-20T09:00:00Z" },
        { "id": 2, "achievement_type": "score", "title": "Perfect score", "earned_at": "2024-04-10T09:00:00Z" }
    ]))
}

async fn serve() -> (SocketAddr, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/courses", get(courses))
        .route("/api/courses/:id", get(course_detail))
        .route("/api/lessons/:id", get(lesson))
        .route("/api/grammar/generate", get(theory))
        .route("/api/user-lessons/:user/:lesson/finish", put(finish))
        .route("/api/user-study-stats/:user", get(get_stats).put(put_stats))
        .route("/api/auth/login", post(login))
        .route("/api/user-notes/add", post(add_note))
        .route("/api/user-notes/update/:id", put(update_note))
        .route("/api/user-notes/delete/:id", delete(delete_note))
        .route("/api/user-highlights/:user/:lesson", get(highlights))
        .route("/api/user-highlights/add", post(add_highlight))
        .route("/api/user-progress/:kind/:action", post(post_practice))
        .route("/api/user-progress/:kind/:what/:user", get(practice_count))
        .route("/api/dashboard-stats/summary/:user", get(dashboard_summary))
        .route("/api/profiles/:user", get(get_profile).put(put_profile))
        .route("/api/user-goals/:user", get(goals))
        .route("/api/user-achievements/:user", get(achievements))
        .with_state(recorded.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, recorded)
}

fn config(addr: SocketAddr) -> AppConfig {
    let base = format!("http://{addr}/api");
    AppConfig {
        api_base_url: base.clone(),
        practice_base_url: base.clone(),
        theory_base_url: base.clone(),
        progress_base_url: base,
        db_url: "sqlite::memory:".into(),
        http_timeout: Duration::from_secs(5),
    }
}

fn app_services(addr: SocketAddr) -> AppServices {
    AppServices::with_auth_store(
        &config(addr),
        Clock::fixed(fixed_now()),
        Arc::new(InMemoryRepository::new()),
    )
    .unwrap()
}

#[tokio::test]
async fn lesson_detail_is_validated_and_theory_falls_back_to_text() {
    let (addr, _) = serve().await;
    let content = app_services(addr).content();

    let lesson = content.lesson(LessonId::new(1)).await.unwrap();
    assert_eq!(lesson.exercise_count(), 4);
    assert_eq!(
        content.theory(&lesson.title).await.unwrap().as_deref(),
        Some("Theory for Present Simple")
    );

    let err = content.lesson(LessonId::new(2)).await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));

    let err = content.lesson(LessonId::new(3)).await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Status {
            status: 404,
            body: "lesson not found".into()
        }
    );
}

#[tokio::test]
async fn full_lesson_over_http_sends_final_score() {
    let (addr, recorded) = serve().await;
    let services = app_services(addr);
    let mut auth = services.auth().await.unwrap();
    let user = auth.login("lan", "secret").await.unwrap().clone();

    let loop_svc = services.session_loop();
    let page = loop_svc.open_lesson(LessonId::new(1)).await;
    assert_eq!(
        page.lesson.data().and_then(|l| l.theory.as_deref()),
        Some("Theory for Present Simple")
    );
    let mut session = page.session.unwrap();

    let mut last = None;
    for choice in ["A", "X", "C", "D"] {
        session.select_option(choice).unwrap();
        loop_svc.submit_answer(&mut session).unwrap();
        last = Some(loop_svc.advance(&mut session, Some(&user)).unwrap());
    }
    let Some(AdvanceOutcome::Completed { persistence, .. }) = last else {
        panic!("lesson should be completed");
    };
    let report = persistence.wait().await;

    assert!(report.lesson_saved);
    assert!(!report.stats_saved, "stats endpoint answers 500");
    assert_eq!(
        *recorded.finishes.lock().unwrap(),
        vec![("42/1".to_owned(), json!({ "score": 75 }))]
    );
    assert_eq!(services.notifier().count(NotificationLevel::Warning), 1);
}

#[tokio::test]
async fn study_stats_missing_row_is_none_and_failures_carry_status() {
    let (addr, _) = serve().await;
    let config = config(addr);
    let progress = services::api::HttpProgressRepository::new(services::api::ApiClient::new(
        reqwest::Client::new(),
        config.progress_base_url,
    ));

    assert!(progress.get_stats(UserId::new(1)).await.unwrap().is_none());
    let existing = progress.get_stats(UserId::new(7)).await.unwrap().unwrap();
    assert_eq!(existing.completed_lessons, 3);

    let err = progress
        .save_stats(
            UserId::new(1),
            StudyStatsUpdate {
                completed_lessons: 1,
                total_study_hours: 0.5,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StorageError::Fetch(FetchError::Status { status: 500, ref body }) if body == "db down"
    ));
}

#[tokio::test]
async fn dashboard_skips_courses_whose_detail_fails() {
    let (addr, _) = serve().await;
    let overview = app_services(addr).dashboard().overview(None).await.unwrap();
    assert_eq!(overview.course_count, 2);
    assert_eq!(overview.module_count, 1);
    assert_eq!(overview.lesson_count, 1);
    assert!(overview.learner.is_none());
}

#[tokio::test]
async fn refused_login_surfaces_server_message() {
    let (addr, _) = serve().await;
    let mut auth = app_services(addr).auth().await.unwrap();
    let err = auth.login("lan", "guess").await.unwrap_err();
    assert!(matches!(err, AuthError::Rejected(ref m) if m == "wrong password"));
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn notes_are_added_updated_and_deleted_by_id() {
    let (addr, recorded) = serve().await;
    let practice = app_services(addr).practice();

    let added = practice
        .add_note(&AddNoteRequest {
            user_id: UserId::new(42),
            lesson_id: LessonId::new(1),
            note: "third person takes -s".into(),
        })
        .await
        .unwrap();
    let id = added.note.id.expect("server assigns an id");
    assert_eq!(id, NoteId::new(5));

    let updated = practice
        .update_note(
            id,
            &UpdateNoteRequest {
                note: "he/she/it takes -s".into(),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.note.note, "he/she/it takes -s");

    let deleted = practice.delete_note(id).await.unwrap();
    assert_eq!(deleted.message, "note deleted");

    assert_eq!(
        recorded.writes(),
        vec![
            (
                Method::POST,
                "user-notes/add".to_owned(),
                json!({ "userId": 42, "lessonId": 1, "note": "third person takes -s" })
            ),
            (
                Method::PUT,
                "user-notes/update/5".to_owned(),
                json!({ "note": "he/she/it takes -s" })
            ),
            (Method::DELETE, "user-notes/delete/5".to_owned(), Value::Null),
        ]
    );
}

#[tokio::test]
async fn highlights_list_and_add_with_flat_range() {
    let (addr, recorded) = serve().await;
    let practice = app_services(addr).practice();

    let list = practice
        .highlights(UserId::new(42), LessonId::new(1))
        .await
        .unwrap();
    assert_eq!(list.len(), 2);
    assert!(list[0].created_at.is_none());
    assert_eq!((list[1].start_index, list[1].end_index), (10, 18));

    let added = practice
        .add_highlight(&AddHighlightRequest {
            user_id: UserId::new(42),
            lesson_id: LessonId::new(1),
            range: HighlightRange::new(20, 27).unwrap(),
            color: "pink".into(),
        })
        .await
        .unwrap();
    assert_eq!(added.highlight.color, "pink");
    assert_eq!(added.highlight.start_index, 20);

    assert_eq!(
        recorded.writes(),
        vec![(
            Method::POST,
            "user-highlights/add".to_owned(),
            json!({ "userId": 42, "lessonId": 1, "startIndex": 20, "endIndex": 27, "color": "pink" })
        )]
    );
}

#[tokio::test]
async fn practice_submissions_post_kind_specific_bodies() {
    let (addr, recorded) = serve().await;
    let practice = app_services(addr).practice();

    practice
        .submit_practice(&PracticeSubmission {
            kind: PracticeKind::Listening,
            user_id: UserId::new(42),
            item_id: 3,
            score: Some(80),
        })
        .await
        .unwrap();
    practice
        .submit_practice(&PracticeSubmission {
            kind: PracticeKind::Grammar,
            user_id: UserId::new(42),
            item_id: 11,
            score: None,
        })
        .await
        .unwrap();
    practice
        .master_flashcard(&FlashcardMasterRequest {
            user_id: UserId::new(42),
            flashcard_id: 8,
            review_count: None,
        })
        .await
        .unwrap();

    assert_eq!(
        recorded.writes(),
        vec![
            (
                Method::POST,
                "user-progress/listening/submit".to_owned(),
                json!({ "userId": 42, "listeningPracticeId": 3, "score": 80 })
            ),
            (
                Method::POST,
                "user-progress/grammar/submit".to_owned(),
                json!({ "userId": 42, "grammarExerciseId": 11 })
            ),
            (
                Method::POST,
                "user-progress/flashcard/master".to_owned(),
                json!({ "userId": 42, "flashcardId": 8 })
            ),
        ]
    );
}

#[tokio::test]
async fn dashboard_stats_and_practice_counts() {
    let (addr, _) = serve().await;
    let practice = app_services(addr).practice();
    let user = UserId::new(42);

    let stats = practice.dashboard_stats(user).await.unwrap();
    assert_eq!(stats.vocabulary_count, 120);
    assert_eq!(stats.listening_completed, 0);

    assert_eq!(
        practice
            .completed_count(PracticeKind::Grammar, user)
            .await
            .unwrap(),
        4
    );
    assert_eq!(
        practice
            .completed_count(PracticeKind::Reading, user)
            .await
            .unwrap(),
        2
    );
    assert_eq!(
        practice
            .completed_count(PracticeKind::Listening, user)
            .await
            .unwrap(),
        0
    );
    assert_eq!(practice.mastered_flashcards(user).await.unwrap(), 9);

    let err = practice.dashboard_stats(UserId::new(1)).await.unwrap_err();
    assert_eq!(
        err,
        FetchError::Status {
            status: 500,
            body: "stats offline".into()
        }
    );
}

#[tokio::test]
async fn profile_goals_and_achievements() {
    let (addr, recorded) = serve().await;
    let profiles = app_services(addr).profiles();
    let user = UserId::new(42);

    let profile = profiles.profile(user).await.unwrap().expect("profile row");
    assert_eq!(profile.full_name.as_deref(), Some("Lan Nguyen"));
    assert!(profile.avatar_url.is_none());
    assert!(profiles.profile(UserId::new(1)).await.unwrap().is_none());

    let updated = profiles
        .update_profile(
            user,
            &ProfileUpdate {
                full_name: Some("Lan N.".into()),
                ..ProfileUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name.as_deref(), Some("Lan N."));
    assert_eq!(
        recorded.writes(),
        vec![(
            Method::PUT,
            "profiles/42".to_owned(),
            json!({ "full_name": "Lan N." })
        )]
    );

    let goals = profiles.goals(user).await.unwrap();
    let percents: Vec<u32> = goals.iter().map(|g| g.percent()).collect();
    assert_eq!(percents, vec![40, 100]);

    let titles: Vec<String> = profiles
        .achievements(user)
        .await
        .unwrap()
        .into_iter()
        .map(|a| a.title)
        .collect();
    assert_eq!(titles, ["7 day streak", "Perfect score", "First lesson"]);
}
