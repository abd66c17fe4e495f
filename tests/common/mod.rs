#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use employee_directory_api::application::employee_service::EmployeeService;
use employee_directory_api::application::password_service::PasswordService;
use employee_directory_api::data::employee_repository::InMemoryEmployeeRepository;
use employee_directory_api::data::user_repository::InMemoryUserRepository;
use employee_directory_api::infrastructure::mail::{Mailer, OutgoingMail};
use employee_directory_api::infrastructure::uploads::ImageStore;
use employee_directory_api::presentation::handlers::AppState;
use actix_web::web;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const BOUNDARY: &str = "----employee-directory-test-boundary";

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct CapturingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
}

impl CapturingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _mail: OutgoingMail) -> Result<()> {
        Err(anyhow::anyhow!("SMTP relay unavailable"))
    }
}

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub users: Arc<InMemoryUserRepository>,
    pub mailer: Arc<CapturingMailer>,
    pub upload_dir: PathBuf,
    // dropped last, removes the upload directory
    _tmp: TempDir,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(None, None)
    }

    pub fn with_public_url(url: &str) -> Self {
        Self::build(Some(url.to_string()), None)
    }

    pub fn with_mailer(mailer: Arc<dyn Mailer>) -> Self {
        Self::build(None, Some(mailer))
    }

    fn build(public_url: Option<String>, mailer: Option<Arc<dyn Mailer>>) -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let upload_dir = tmp.path().join("uploads");
        let users = Arc::new(InMemoryUserRepository::new());
        let capturing = Arc::new(CapturingMailer::default());
        let mailer: Arc<dyn Mailer> = mailer.unwrap_or_else(|| capturing.clone() as Arc<dyn Mailer>);

        let state = web::Data::new(AppState {
            employee_service: EmployeeService::new(
                Arc::new(InMemoryEmployeeRepository::new()),
                ImageStore::new(&upload_dir),
            ),
            password_service: PasswordService::new(users.clone(), mailer, Duration::hours(1)),
            public_url,
        });

        Self {
            state,
            users,
            mailer: capturing,
            upload_dir,
            _tmp: tmp,
        }
    }

    /// Number of files currently in the upload directory.
    pub fn stored_files(&self) -> usize {
        std::fs::read_dir(&self.upload_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

macro_rules! init_app {
    ($ctx:expr) => {{
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($ctx.state.clone())
                .wrap(employee_directory_api::presentation::middleware::RequestTracing)
                .configure(employee_directory_api::presentation::configure),
        )
        .await
    }};
}

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, filename, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn build(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        (
            format!("multipart/form-data; boundary={}", BOUNDARY),
            self.body,
        )
    }
}

/// All required employee fields, with the given email.
pub fn employee_form(email: &str) -> MultipartBody {
    MultipartBody::new()
        .text("firstName", "Ada")
        .text("lastName", "Lovelace")
        .text("email", email)
        .text("phoneNumber", "+44 20 7946 0000")
        .text("jobTitle", "Analyst")
        .text("department", "Engineering")
}

/// A few bytes carrying the PNG signature.
pub fn png_bytes(len: usize) -> Vec<u8> {
    let mut data = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    data.resize(len.max(8), 0);
    data
}
