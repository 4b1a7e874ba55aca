//! docval CLI
//!
//! Command-line client for a running docval server:
//! - Manage projects and documents
//! - Upload scans and user input
//! - Run validation and read results
//! - Inspect the event log

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use reqwest::multipart::{Form, Part};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "docval")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Validate OCR output against user-entered values")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API server URL
    #[arg(long, default_value = "http://localhost:8000", global = true)]
    pub api_url: String,

    /// Output format (table, json, csv)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show server status
    Status,

    /// List projects
    Projects,

    /// Create a project
    CreateProject {
        /// Project name
        name: String,
    },

    /// List documents
    Documents {
        /// Only documents of this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Create a document, optionally attaching its sample OCR response
    CreateDocument {
        /// Project id
        project_id: String,
        /// Document name
        name: String,
        /// OCR endpoint URL, or "mock" to replay the sample JSON
        #[arg(long)]
        ocr_url: Option<String>,
        /// Sample OCR response (.json)
        #[arg(long)]
        sample: Option<PathBuf>,
    },

    /// Upload a scan for a document
    Upload {
        /// Document id
        document_id: String,
        /// Scan file (pdf, png, jpg, jpeg, tif, tiff)
        path: PathBuf,
        /// User input (.json) to attach right away
        #[arg(long)]
        user_input: Option<PathBuf>,
    },

    /// Attach user-entered values to an upload
    UserInput {
        /// Upload id
        upload_id: String,
        /// User input file (.json)
        path: PathBuf,
    },

    /// Start a validation job for a document
    Validate {
        /// Document id
        document_id: String,
        /// Poll until the job finishes
        #[arg(short, long)]
        wait: bool,
        /// Poll interval in seconds
        #[arg(long, default_value = "1")]
        interval: u64,
    },

    /// Show the progress of a validation job
    Job {
        /// Job id
        job_id: String,
        /// Poll until the job finishes
        #[arg(short, long)]
        wait: bool,
        /// Poll interval in seconds
        #[arg(long, default_value = "1")]
        interval: u64,
    },

    /// Show the latest validation results of an upload
    Results {
        /// Upload id
        upload_id: String,
    },

    /// Show recent events
    Logs {
        /// Number of entries
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Thin wrapper over the REST API
struct ApiClient {
    http: reqwest::Client,
    base: String,
}

impl ApiClient {
    fn new(api_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn get(&self, path: &str) -> anyhow::Result<Value> {
        let response = self.http.get(self.url(path)).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn get_text(&self, path: &str) -> anyhow::Result<String> {
        let response = self.http.get(self.url(path)).send().await?;
        Ok(check(response).await?.text().await?)
    }

    async fn post_json(&self, path: &str, body: Value) -> anyhow::Result<Value> {
        let response = self.http.post(self.url(path)).json(&body).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn post_file(&self, path: &str, field: &str, file: &Path) -> anyhow::Result<Value> {
        let data = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string());

        let form = Form::new().part(field.to_string(), Part::bytes(data).file_name(file_name));
        let response = self.http.post(self.url(path)).multipart(form).send().await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Turn an error response into an error carrying the server's message
async fn check(response: reqwest::Response) -> anyhow::Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&text)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or(text);
    bail!("Request failed ({}): {}", status, message)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let api = ApiClient::new(&cli.api_url);
    let as_json = cli.format == "json";

    match cli.command {
        Commands::Status => match api.get("/health").await {
            Ok(health) => {
                if as_json {
                    print_json(&health)?;
                } else {
                    println!("docval v{}", env!("CARGO_PKG_VERSION"));
                    println!();
                    println!("API Status: {}", str_field(&health, "status"));
                    println!("Database:   {}", str_field(&health, "database"));
                    if let Some(uptime) = health["uptime_seconds"].as_u64() {
                        println!("Uptime:     {}", format_duration(uptime));
                    }
                }
            }
            Err(e) => {
                eprintln!("Cannot connect to docval API at {}", cli.api_url);
                eprintln!("Error: {}", e);
                eprintln!();
                eprintln!("Make sure the docval API server is running:");
                eprintln!("  cargo run --bin docval-api");
                std::process::exit(1);
            }
        },

        Commands::Projects => {
            let projects = api.get("/api/projects").await?;
            if as_json {
                print_json(&projects)?;
            } else if is_empty(&projects) {
                println!("No projects yet.");
                println!();
                println!("Create one with:");
                println!("  docval create-project <name>");
            } else {
                println!("{:<38} {:<30} {}", "ID", "Name", "Created");
                println!("{}", "-".repeat(90));
                for p in rows(&projects) {
                    println!(
                        "{:<38} {:<30} {}",
                        str_field(p, "id"),
                        str_field(p, "name"),
                        str_field(p, "created_at")
                    );
                }
            }
        }

        Commands::CreateProject { name } => {
            let project = api.post_json("/api/projects", json!({ "name": name })).await?;
            if as_json {
                print_json(&project)?;
            } else {
                println!("Created project {} ({})", str_field(&project, "name"), str_field(&project, "id"));
            }
        }

        Commands::Documents { project } => {
            let path = match &project {
                Some(id) => format!("/api/documents?project_id={}", urlencoding::encode(id)),
                None => "/api/documents".to_string(),
            };
            let documents = api.get(&path).await?;
            if as_json {
                print_json(&documents)?;
            } else if is_empty(&documents) {
                println!("No documents.");
            } else {
                println!("{:<38} {:<24} {:<30} {}", "ID", "Name", "OCR URL", "Sample");
                println!("{}", "-".repeat(100));
                for d in rows(&documents) {
                    println!(
                        "{:<38} {:<24} {:<30} {}",
                        str_field(d, "id"),
                        str_field(d, "name"),
                        str_field(d, "ocr_url"),
                        if d["sample_json_path"].is_string() { "yes" } else { "no" }
                    );
                }
            }
        }

        Commands::CreateDocument {
            project_id,
            name,
            ocr_url,
            sample,
        } => {
            let mut document = api
                .post_json(
                    "/api/documents",
                    json!({ "project_id": project_id, "name": name, "ocr_url": ocr_url }),
                )
                .await?;

            if let Some(sample) = sample {
                let id = str_field(&document, "id").to_string();
                document = api
                    .post_file(&format!("/api/documents/{}/sample-json", id), "sample", &sample)
                    .await?;
            }

            if as_json {
                print_json(&document)?;
            } else {
                println!("Created document {} ({})", str_field(&document, "name"), str_field(&document, "id"));
            }
        }

        Commands::Upload {
            document_id,
            path,
            user_input,
        } => {
            let mut upload = api
                .post_file(&format!("/api/documents/{}/upload", document_id), "file", &path)
                .await?;

            if let Some(user_input) = user_input {
                let id = str_field(&upload, "id").to_string();
                upload = api
                    .post_file(&format!("/api/documents/{}/user-input", id), "form_json", &user_input)
                    .await?;
            }

            if as_json {
                print_json(&upload)?;
            } else {
                println!("Uploaded {} ({})", str_field(&upload, "file_name"), str_field(&upload, "id"));
            }
        }

        Commands::UserInput { upload_id, path } => {
            let upload = api
                .post_file(&format!("/api/documents/{}/user-input", upload_id), "form_json", &path)
                .await?;
            if as_json {
                print_json(&upload)?;
            } else {
                println!("Attached user input to upload {}", str_field(&upload, "id"));
            }
        }

        Commands::Validate {
            document_id,
            wait,
            interval,
        } => {
            let job = api
                .post_json("/api/validation/run", json!({ "document_id": document_id }))
                .await?;
            let job_id = str_field(&job, "id").to_string();

            if !wait {
                if as_json {
                    print_json(&job)?;
                } else {
                    println!("Started validation job {}", job_id);
                    println!("{}", progress_hint(&job_id));
                }
                return Ok(());
            }

            follow_job(&api, &job_id, interval, as_json).await?;
        }

        Commands::Job {
            job_id,
            wait,
            interval,
        } => {
            if wait {
                follow_job(&api, &job_id, interval, as_json).await?;
            } else {
                let status = api.get(&format!("/api/validation/status/{}", job_id)).await?;
                if as_json {
                    print_json(&status)?;
                } else {
                    print_job_status(&job_id, &status);
                    if is_finished(str_field(&status, "status")) {
                        let result = api.get(&format!("/api/validation/result/{}", job_id)).await?;
                        print_job_result(&result);
                    }
                }
            }
        }

        Commands::Results { upload_id } => {
            if cli.format == "csv" {
                let csv = api
                    .get_text(&format!("/api/validation/upload/{}/results?format=csv", upload_id))
                    .await?;
                print!("{}", csv);
            } else {
                let results = api
                    .get(&format!("/api/validation/upload/{}/results", upload_id))
                    .await?;
                if as_json {
                    print_json(&results)?;
                } else if is_empty(&results) {
                    println!("No validation results for upload {}", upload_id);
                } else {
                    print_field_results(rows(&results));
                }
            }
        }

        Commands::Logs { limit } => {
            let logs = api.get(&format!("/api/logs?limit={}", limit)).await?;
            if as_json {
                print_json(&logs)?;
            } else {
                for entry in rows(&logs) {
                    println!(
                        "{} {:<5} {}",
                        str_field(entry, "created_at"),
                        str_field(entry, "level"),
                        str_field(entry, "message")
                    );
                    if let Some(context) = entry["context"].as_str() {
                        println!("      {}", context);
                    }
                }
            }
        }

        Commands::Config { output } => {
            let config = docval::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn rows(value: &Value) -> &[Value] {
    value.as_array().map(Vec::as_slice).unwrap_or(&[])
}

fn is_empty(value: &Value) -> bool {
    rows(value).is_empty()
}

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or("-")
}

/// How to check on a job started without `--wait`
fn progress_hint(job_id: &str) -> String {
    format!("Check progress with: docval job {} --wait", job_id)
}

fn is_finished(state: &str) -> bool {
    state == "completed" || state == "failed"
}

fn print_job_status(job_id: &str, status: &Value) {
    println!(
        "Job {}: {} ({}/{})",
        job_id,
        str_field(status, "status"),
        status["processed_uploads"].as_u64().unwrap_or(0),
        status["total_uploads"].as_u64().unwrap_or(0)
    );
}

/// Poll a job until it finishes, then print its result
async fn follow_job(api: &ApiClient, job_id: &str, interval: u64, as_json: bool) -> anyhow::Result<()> {
    loop {
        let status = api.get(&format!("/api/validation/status/{}", job_id)).await?;
        if !as_json {
            print_job_status(job_id, &status);
        }
        if is_finished(str_field(&status, "status")) {
            break;
        }
        tokio::time::sleep(Duration::from_secs(interval.max(1))).await;
    }

    let result = api.get(&format!("/api/validation/result/{}", job_id)).await?;
    if as_json {
        print_json(&result)?;
    } else {
        print_job_result(&result);
    }
    Ok(())
}

fn print_job_result(result: &Value) {
    if let Some(error) = result["error"].as_str() {
        println!("Validation failed: {}", error);
        return;
    }

    let summary = &result["result"];
    println!();
    println!(
        "Uploads: {} total, {} successful, {} failed",
        summary["total_uploads"].as_u64().unwrap_or(0),
        summary["successful_uploads"].as_u64().unwrap_or(0),
        summary["failed_uploads"].as_u64().unwrap_or(0)
    );

    for upload in rows(&summary["upload_results"]) {
        println!();
        match upload["error"].as_str() {
            Some(error) => println!("Upload {}: {}", str_field(upload, "upload_id"), error),
            None => {
                println!(
                    "Upload {}: {:.1}% overall",
                    str_field(upload, "upload_id"),
                    upload["overall_accuracy"].as_f64().unwrap_or(0.0) * 100.0
                );
                print_field_results(rows(&upload["results"]));
            }
        }
    }
}

fn print_field_results(results: &[Value]) {
    println!("{:<24} {:<24} {:<24} {:>8}", "Field", "User", "OCR", "Accuracy");
    println!("{}", "-".repeat(84));
    for r in results {
        println!(
            "{:<24} {:<24} {:<24} {:>7.1}%",
            str_field(r, "field_name"),
            str_field(r, "user_value"),
            str_field(r, "ocr_value"),
            r["accuracy"].as_f64().unwrap_or(0.0) * 100.0
        );
    }
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_hint_follows_the_started_job() {
        let hint = progress_hint("job-42");
        assert_eq!(hint, "Check progress with: docval job job-42 --wait");

        // The suggested command polls the job instead of starting another one
        let args: Vec<&str> = hint
            .trim_start_matches("Check progress with: ")
            .split(' ')
            .collect();
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Job { job_id, wait, .. } => {
                assert_eq!(job_id, "job-42");
                assert!(wait);
            }
            _ => panic!("hint should parse as the job command"),
        }
    }

    #[test]
    fn test_finished_states() {
        assert!(is_finished("completed"));
        assert!(is_finished("failed"));
        assert!(!is_finished("pending"));
        assert!(!is_finished("running"));
    }
}
