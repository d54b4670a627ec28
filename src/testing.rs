//! In-process fake of the students API used by tests.
//!
//! Mirrors json-server: `_page`/`_limit` paging with `x-total-count`, numeric
//! ids, PATCH merging. Emails without `@` are rejected with a 422 carrying
//! `{ "error": { "email": "invalid" } }`. Every request is recorded as
//! `"METHOD /path?query"` so tests can count network calls.

use axum::extract::{Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::Terminal;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{CachedStudentApi, Gender, StudentForm};
use crate::app::AppContext;
use crate::config::Config;
use crate::ui::components::Toasts;

#[derive(Default)]
struct Db {
  students: BTreeMap<u64, Value>,
  next_id: u64,
  requests: Vec<String>,
}

type SharedDb = Arc<Mutex<Db>>;

pub struct FakeServer {
  addr: SocketAddr,
  db: SharedDb,
}

impl FakeServer {
  /// Start a server seeded with students `1..=count`
  pub async fn start_with(count: u64) -> Self {
    let mut db = Db::default();
    for id in 1..=count {
      db.students.insert(id, seed_student(id));
    }
    db.next_id = count + 1;
    let db = Arc::new(Mutex::new(db));

    let app = Router::new()
      .route("/students", get(list).post(create))
      .route("/students/add", post(create))
      .route(
        "/students/{id}",
        get(get_one).patch(update).delete(remove),
      )
      .route("/slow", get(slow))
      .route("/boom", get(boom))
      .layer(middleware::from_fn_with_state(db.clone(), record))
      .with_state(db.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
      .await
      .expect("bind fake server");
    let addr = listener.local_addr().expect("fake server addr");
    tokio::spawn(async move {
      let _ = axum::serve(listener, app).await;
    });

    Self { addr, db }
  }

  pub fn base_url(&self) -> String {
    format!("http://{}", self.addr)
  }

  /// Every request received so far, in order
  pub fn requests(&self) -> Vec<String> {
    self.db.lock().unwrap().requests.clone()
  }

  pub fn student(&self, id: u64) -> Option<Value> {
    self.db.lock().unwrap().students.get(&id).cloned()
  }
}

fn seed_student(id: u64) -> Value {
  json!({
    "id": id,
    "first_name": format!("First{}", id),
    "last_name": format!("Last{}", id),
    "email": format!("student{}@school.edu", id),
    "gender": if id % 2 == 0 { "Female" } else { "Male" },
    "country": "Norway",
    "avatar": format!("https://avatars.test/{}.png", id),
    "btc_address": format!("1BTC{}", id),
  })
}

fn invalid_email(body: &Value) -> bool {
  body
    .get("email")
    .and_then(Value::as_str)
    .is_some_and(|email| !email.contains('@'))
}

fn unprocessable() -> Response {
  (
    StatusCode::UNPROCESSABLE_ENTITY,
    Json(json!({ "error": { "email": "invalid" } })),
  )
    .into_response()
}

async fn record(State(db): State<SharedDb>, request: Request, next: Next) -> Response {
  let line = format!(
    "{} {}",
    request.method(),
    request
      .uri()
      .path_and_query()
      .map(|p| p.as_str())
      .unwrap_or("/")
  );
  db.lock().unwrap().requests.push(line);
  next.run(request).await
}

#[derive(Deserialize)]
struct PageParams {
  #[serde(rename = "_page")]
  page: Option<usize>,
  #[serde(rename = "_limit")]
  limit: Option<usize>,
}

async fn list(State(db): State<SharedDb>, Query(params): Query<PageParams>) -> Response {
  let db = db.lock().unwrap();
  let total = db.students.len();
  let page = params.page.unwrap_or(1).max(1);
  let limit = params.limit.unwrap_or(total.max(1));

  let items: Vec<Value> = db
    .students
    .values()
    .skip((page - 1) * limit)
    .take(limit)
    .cloned()
    .collect();

  ([("x-total-count", total.to_string())], Json(items)).into_response()
}

async fn get_one(State(db): State<SharedDb>, Path(id): Path<u64>) -> Response {
  match db.lock().unwrap().students.get(&id) {
    Some(student) => Json(student.clone()).into_response(),
    None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
  }
}

async fn create(State(db): State<SharedDb>, Json(mut body): Json<Value>) -> Response {
  if invalid_email(&body) {
    return unprocessable();
  }
  let mut db = db.lock().unwrap();
  let id = db.next_id;
  db.next_id += 1;
  body["id"] = json!(id);
  db.students.insert(id, body.clone());
  (StatusCode::CREATED, Json(body)).into_response()
}

async fn update(
  State(db): State<SharedDb>,
  Path(id): Path<u64>,
  Json(body): Json<Value>,
) -> Response {
  if invalid_email(&body) {
    return unprocessable();
  }
  let mut db = db.lock().unwrap();
  let Some(student) = db.students.get_mut(&id) else {
    return (StatusCode::NOT_FOUND, Json(json!({}))).into_response();
  };
  if let (Some(target), Some(fields)) = (student.as_object_mut(), body.as_object()) {
    for (key, value) in fields {
      target.insert(key.clone(), value.clone());
    }
  }
  Json(student.clone()).into_response()
}

async fn remove(State(db): State<SharedDb>, Path(id): Path<u64>) -> Response {
  match db.lock().unwrap().students.remove(&id) {
    Some(_) => Json(json!({})).into_response(),
    None => (StatusCode::NOT_FOUND, Json(json!({}))).into_response(),
  }
}

async fn slow() -> Response {
  tokio::time::sleep(Duration::from_secs(2)).await;
  Json(json!([])).into_response()
}

async fn boom() -> Response {
  (
    StatusCode::INTERNAL_SERVER_ERROR,
    Json(json!({ "message": "boom" })),
  )
    .into_response()
}

/// A complete, valid form with the given email
pub fn sample_form(email: &str) -> StudentForm {
  StudentForm {
    first_name: "Ada".into(),
    last_name: "Lovelace".into(),
    email: email.into(),
    gender: Gender::Female,
    country: "England".into(),
    avatar: String::new(),
    btc_address: "1AdaBTC".into(),
  }
}

/// Default config pointed at a fake server
pub fn test_config(server: &FakeServer) -> Config {
  let mut config = Config::default();
  config.api.base_url = server.base_url();
  config.api.timeout_secs = 5;
  config
}

/// View context against a fake server, plus the toast stack it notifies
pub fn test_context(server: &FakeServer) -> (AppContext, Toasts) {
  let config = test_config(server);
  let (toasts, notifier) = Toasts::new();
  let api = CachedStudentApi::new(&config).expect("api client");
  (
    AppContext {
      api,
      notifier,
      title: config.display_title(),
    },
    toasts,
  )
}

/// Rendered buffer as one string per row
pub fn buffer_lines(buffer: &Buffer) -> Vec<String> {
  let area = buffer.area;
  (area.top()..area.bottom())
    .map(|y| {
      (area.left()..area.right())
        .map(|x| buffer[(x, y)].symbol())
        .collect::<String>()
    })
    .collect()
}

/// Render with `draw` into an off-screen terminal and return its rows
pub fn render_lines(width: u16, height: u16, draw: impl FnOnce(&mut ratatui::Frame)) -> Vec<String> {
  let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
  terminal.draw(draw).expect("draw");
  buffer_lines(terminal.backend().buffer())
}
