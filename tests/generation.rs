//! End-to-end orchestration tests over the scripted model adapter.

use std::sync::{Arc, Mutex};

use weave::adapters::scripted::ScriptedModel;
use weave::error::GenerateError;
use weave::orchestrator::{FallbackChain, GenerationRequest, Orchestrator};
use weave::pipeline::{read_archive, EndpointRecord};
use weave::ports::{Fragment, ModelStream, StreamFuture, StreamRequest};
use weave::prompt::{Architecture, ConversionDirection, GenerationMode};
use weave::transcript::TranscriptCall;

const BLOG_PLAN: &str = r#"{"files":[{"path":"src/server.ts","description":"entry point"},{"path":"src/models/Post.ts","description":"Post model"}]}"#;

/// Wraps a scripted model, capturing every prompt sent through it.
struct PromptCapture {
    inner: ScriptedModel,
    prompts: Mutex<Vec<String>>,
}

impl PromptCapture {
    fn new(calls: Vec<TranscriptCall>) -> Self {
        Self { inner: ScriptedModel::new(calls), prompts: Mutex::new(Vec::new()) }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl ModelStream for PromptCapture {
    fn stream(&self, request: &StreamRequest) -> StreamFuture<'_> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        self.inner.stream(request)
    }
}

/// Serves pre-built receivers whose senders the test holds open.
struct HeldStream {
    receivers: Mutex<Vec<weave::ports::FragmentReceiver>>,
}

impl ModelStream for HeldStream {
    fn stream(&self, _request: &StreamRequest) -> StreamFuture<'_> {
        let receiver = self.receivers.lock().unwrap().pop();
        Box::pin(async move {
            match receiver {
                Some(receiver) => Ok(receiver),
                None => Err("no held receivers left".into()),
            }
        })
    }
}

fn request(mode: GenerationMode, architecture: Architecture, spec: &str) -> GenerationRequest {
    GenerationRequest {
        specification: spec.into(),
        mode,
        architecture,
        source_code: None,
    }
}

#[tokio::test]
async fn blog_scenario_generates_both_planned_files_in_order() {
    let model = Arc::new(PromptCapture::new(vec![
        // Planning stream, manifest split mid-JSON across fragments.
        ScriptedModel::call(&[&BLOG_PLAN[..30], &BLOG_PLAN[30..]]),
        ScriptedModel::call(&[
            "```typescript filename:src/server.ts\nimport express from 'express';\napp.get(\"/posts\", list);\n```",
        ]),
        ScriptedModel::call(&[
            "```typescript filename:src/models/Post.ts\nexport class Post {}\n```",
        ]),
    ]));
    let orchestrator = Orchestrator::new(model.clone(), "gemini-2.0-flash".into());

    let handle = orchestrator
        .generate(
            &request(
                GenerationMode::Backend,
                Architecture::Microservices,
                "Create a blog system with posts and comments, monolith architecture",
            ),
            "job-blog",
        )
        .expect("job starts");
    let outcome = handle.finish().await.expect("job completes");

    // Exactly one planning prompt plus one per-file prompt per manifest
    // entry, in manifest order.
    let prompts = model.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[1].contains("File path: src/server.ts"));
    assert!(prompts[2].contains("File path: src/models/Post.ts"));

    assert_eq!(outcome.file_count, 2);
    let files = read_archive(&outcome.archive).expect("readable archive");
    assert_eq!(files[0].path, "src/server.ts");
    assert_eq!(files[1].path, "src/models/Post.ts");
    assert_eq!(files[1].content, "export class Post {}");

    // The route in src/server.ts lands in the endpoint map.
    let map = files.iter().find(|f| f.path == "api_map.json").expect("api_map.json");
    let records: Vec<EndpointRecord> = serde_json::from_str(&map.content).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].method, "GET");
    assert_eq!(records[0].endpoint, "/posts");
}

#[tokio::test]
async fn per_file_failure_becomes_an_inline_comment_not_a_job_failure() {
    let model = Arc::new(ScriptedModel::new(vec![
        ScriptedModel::call(&[BLOG_PLAN]),
        ScriptedModel::call(&[
            "```typescript filename:src/server.ts\nconst ok = true;\n```",
        ]),
        ScriptedModel::dying_call(&["partial"], "connection reset"),
    ]));
    let orchestrator = Orchestrator::new(model, "gemini-2.0-flash".into());

    let handle = orchestrator
        .generate(
            &request(GenerationMode::Backend, Architecture::Microservices, "a blog"),
            "job-partial",
        )
        .expect("job starts");
    let outcome = handle.finish().await.expect("job reaches done, not failed");

    let files = read_archive(&outcome.archive).expect("readable archive");
    assert_eq!(files.len(), 2);
    assert_eq!(files[0].content, "const ok = true;");
    assert!(files[1].content.contains("generation failed for src/models/Post.ts"));
    assert!(files[1].content.contains("connection reset"));
}

#[tokio::test]
async fn plan_failure_without_fallback_fails_the_job() {
    let model = Arc::new(ScriptedModel::new(vec![ScriptedModel::call(&[
        "I cannot produce a plan right now.",
    ])]));
    let orchestrator = Orchestrator::new(model, "gemini-2.0-flash".into());

    let handle = orchestrator
        .generate(
            &request(GenerationMode::Backend, Architecture::Microservices, "a blog"),
            "job-noplan",
        )
        .expect("job starts");
    let err = handle.finish().await.unwrap_err();
    assert!(matches!(err, GenerateError::Plan(_)));
}

#[tokio::test]
async fn exhausted_fallback_chain_surfaces_one_marker_and_a_clean_failure() {
    let inner = Arc::new(ScriptedModel::new(vec![
        ScriptedModel::failing_call("primary down"),
        ScriptedModel::failing_call("backup down"),
    ]));
    let chain = Arc::new(FallbackChain::new(inner, "primary".into(), &["backup".into()]));
    let orchestrator = Orchestrator::new(chain, "primary".into());

    let mut handle = orchestrator
        .generate(
            &request(GenerationMode::Backend, Architecture::Monolith, "a blog"),
            "job-down",
        )
        .expect("job starts");

    let mut markers = 0;
    let mut texts = 0;
    while let Some(fragment) = handle.fragments.recv().await {
        match fragment {
            Fragment::Failed(message) => {
                markers += 1;
                assert!(message.contains("backup down"));
            }
            Fragment::Text(_) => texts += 1,
        }
    }
    assert_eq!(markers, 1);
    assert_eq!(texts, 0);

    let err = handle.outcome.await.expect("task reported").unwrap_err();
    assert!(matches!(err, GenerateError::Stream(_)));
}

#[tokio::test]
async fn duplicate_job_key_is_rejected_while_first_is_in_flight() {
    let (sender, receiver) = tokio::sync::mpsc::unbounded_channel();
    let model = Arc::new(HeldStream { receivers: Mutex::new(vec![receiver]) });
    let orchestrator = Orchestrator::new(model, "gemini-2.0-flash".into());

    let spec = request(GenerationMode::Backend, Architecture::Monolith, "a blog");
    let mut first = orchestrator.generate(&spec, "job-dup").expect("first starts");

    // Confirm the first job owns the held stream before submitting more:
    // its tee must deliver this fragment.
    sender.send(Fragment::Text("```js filename:a.js\n".into())).unwrap();
    assert_eq!(
        first.fragments.recv().await,
        Some(Fragment::Text("```js filename:a.js\n".into()))
    );

    let err = orchestrator.generate(&spec, "job-dup").unwrap_err();
    assert!(matches!(err, GenerateError::JobInProgress(ref key) if key == "job-dup"));

    // An unrelated key is not blocked by the first job; it only fails later
    // for want of a held stream, which is not a duplicate rejection.
    let other = orchestrator.generate(&spec, "job-other").expect("not a duplicate");
    assert!(matches!(other.finish().await.unwrap_err(), GenerateError::Stream(_)));

    // Finish the first job and the key frees up.
    sender.send(Fragment::Text("let a = 1;\n```".into())).unwrap();
    drop(sender);
    while first.fragments.recv().await.is_some() {}
    let outcome = first.outcome.await.expect("task reported").expect("first completes");
    assert_eq!(outcome.file_count, 1);

    assert!(orchestrator.generate(&spec, "job-dup").is_ok());
}

#[tokio::test]
async fn single_shot_zero_files_is_a_warning_shaped_success() {
    let model = Arc::new(ScriptedModel::new(vec![ScriptedModel::call(&[
        "Sorry, here is a description instead of code.",
    ])]));
    let orchestrator = Orchestrator::new(model, "gemini-2.0-flash".into());

    let handle = orchestrator
        .generate(
            &request(GenerationMode::Backend, Architecture::Monolith, "a blog"),
            "job-empty",
        )
        .expect("job starts");
    let outcome = handle.finish().await.expect("empty but well-formed");

    assert_eq!(outcome.file_count, 0);
    assert_eq!(outcome.endpoint_count, 0);
    assert!(read_archive(&outcome.archive).expect("valid archive").is_empty());
}

#[tokio::test]
async fn live_fragments_arrive_in_stream_order() {
    let model = Arc::new(ScriptedModel::new(vec![ScriptedModel::call(&[
        "```js filename:a.js\n",
        "let a = 1;\n",
        "```",
    ])]));
    let orchestrator = Orchestrator::new(model, "gemini-2.0-flash".into());

    let mut handle = orchestrator
        .generate(
            &request(GenerationMode::Backend, Architecture::Monolith, "a blog"),
            "job-live",
        )
        .expect("job starts");

    let mut streamed = String::new();
    while let Some(fragment) = handle.fragments.recv().await {
        if let Fragment::Text(chunk) = fragment {
            streamed.push_str(&chunk);
        }
    }
    assert_eq!(streamed, "```js filename:a.js\nlet a = 1;\n```");

    let outcome = handle.outcome.await.expect("task reported").expect("success");
    assert_eq!(outcome.file_count, 1);
}

#[tokio::test]
async fn planning_mode_archives_the_manifest_itself() {
    let model = Arc::new(ScriptedModel::new(vec![ScriptedModel::call(&[BLOG_PLAN])]));
    let orchestrator = Orchestrator::new(model, "gemini-2.0-flash".into());

    let handle = orchestrator
        .generate(
            &request(GenerationMode::Planning, Architecture::Microservices, "a blog"),
            "job-plan",
        )
        .expect("job starts");
    let outcome = handle.finish().await.expect("job completes");

    let files = read_archive(&outcome.archive).expect("readable archive");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "plan.json");
    assert!(files[0].content.contains("src/server.ts"));
}

#[tokio::test]
async fn conversion_plan_failure_falls_back_to_the_fixed_manifest() {
    // Planning yields prose; the three per-file calls cover the fixed
    // frontend-to-backend manifest.
    let model = Arc::new(ScriptedModel::new(vec![
        ScriptedModel::call(&["no json, just vibes"]),
        ScriptedModel::call(&["```json filename:package.json\n{\"name\":\"api\"}\n```"]),
        ScriptedModel::call(&["```javascript filename:src/server.js\napp.listen(3000);\n```"]),
        ScriptedModel::call(&["```javascript filename:src/routes/api.js\nrouter.get(\"/posts\", h);\n```"]),
    ]));
    let orchestrator = Orchestrator::new(model, "gemini-2.0-flash".into());

    let conversion = GenerationRequest {
        specification: "serve this frontend".into(),
        mode: GenerationMode::Backend,
        architecture: Architecture::Monolith,
        source_code: Some("fetch('/posts')".into()),
    };
    let handle = orchestrator
        .convert(ConversionDirection::FrontendToBackend, &conversion, "job-conv")
        .expect("job starts");
    let outcome = handle.finish().await.expect("fallback manifest carries the job");

    let files = read_archive(&outcome.archive).expect("readable archive");
    let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
    assert!(paths.contains(&"package.json"));
    assert!(paths.contains(&"src/server.js"));
    assert!(paths.contains(&"src/routes/api.js"));
    assert!(paths.contains(&"api_map.json"));
}

#[tokio::test]
async fn conversion_without_source_fails_before_spawning() {
    let model = Arc::new(ScriptedModel::new(vec![]));
    let orchestrator = Orchestrator::new(model, "gemini-2.0-flash".into());

    let conversion = GenerationRequest {
        specification: "serve this frontend".into(),
        mode: GenerationMode::Backend,
        architecture: Architecture::Monolith,
        source_code: None,
    };
    let err = orchestrator
        .convert(ConversionDirection::FrontendToBackend, &conversion, "job-nosrc")
        .err()
        .expect("missing source is a template error");
    assert!(matches!(err, GenerateError::Template(_)));
}
