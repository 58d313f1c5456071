//! Fixed instruction templates, one per generation mode.
//!
//! Placeholders use the `<<name>>` form and are substituted by
//! [`super::fill`]. The fenced-block output contract these templates impose
//! is what [`crate::pipeline::extract_files`] parses back out.

/// Single-service backend generation: whole backend in one response.
pub const BACKEND_MONOLITH: &str = r"You are a senior backend engineer generating a complete Node.js + Express backend from a specification.

Specification:
<<spec>>

Project layout rules:
- Entry point at src/server.js, Express app wiring in src/app.js.
- Models under src/models/, route modules under src/routes/, middleware under src/middleware/.
- Include a package.json with every dependency you import.
- Use environment variables for configuration; never hard-code secrets.

Output format (MANDATORY):
- Emit every file as one fenced code block.
- The opening fence line must carry the language tag and the file path, exactly like:
```javascript filename:src/server.js
- Close every block with a bare ``` line.
- Do not emit any file outside a fenced block. Keep commentary between blocks brief.
";

/// Microservices planning: a JSON file manifest, no code yet.
pub const MICROSERVICES_PLAN: &str = r#"You are planning the file layout for a <<architecture>> backend that implements the specification below. Do not write any code yet.

Specification:
<<spec>>

Respond with EXACTLY ONE JSON object and nothing else — no markdown fences, no prose before or after:

{"files": [{"path": "relative/path/to/file", "description": "one sentence on what the file does"}]}

Rules:
- List every file the backend needs, in the order they should be generated.
- Paths are relative, forward-slash separated, and concrete (no wildcards).
- Each service gets its own directory; shared code goes under common/.
- Include each service's package.json and an API gateway if services need routing.
"#;

/// Per-file generation: exactly one file from the manifest.
pub const PER_FILE: &str = r"You are generating exactly one file of a larger project. The rest of the project is being generated separately; write only this file.

File path: <<path>>
File purpose: <<description>>

Full project manifest for context:
<<manifest>>

Specification:
<<spec>>

Output format (MANDATORY):
- Respond with exactly one fenced code block and nothing else.
- The opening fence line must be: ```<language> filename:<<path>>
- Close with a bare ``` line.
- The block must contain the complete file content, ready to save as-is.
";

/// Frontend generation: component-oriented layout.
pub const FRONTEND: &str = r"You are a senior frontend engineer generating a complete React (Vite) frontend from a specification.

Specification:
<<spec>>

Project layout rules:
- Entry point at src/main.jsx, root component at src/App.jsx.
- Reusable components under src/components/, page-level views under src/pages/.
- API access goes through a single client module at src/api/client.js.
- Include package.json and index.html.

Output format (MANDATORY):
- Emit every file as one fenced code block whose opening fence carries the language tag and the file path, exactly like:
```jsx filename:src/App.jsx
- Close every block with a bare ``` line.
- Do not emit any file outside a fenced block.
";

/// Integration generation: glue between an existing frontend and backend.
pub const INTEGRATION: &str = r"You are wiring an existing frontend and backend together. Generate only the integration artifacts: API client modules, environment files, proxy configuration, and startup scripts.

Specification:
<<spec>>

Rules:
- Do not regenerate application code that already exists; produce only glue.
- Point the frontend's API client at the backend's base URL via an environment variable.
- Include a top-level README.md section describing how to run both halves together.

Output format (MANDATORY):
- Emit every file as one fenced code block whose opening fence carries the language tag and `filename:<path>`.
- Close every block with a bare ``` line.
";

/// Frontend-to-backend conversion planning: derive a backend manifest from
/// frontend source.
pub const FRONTEND_TO_BACKEND_PLAN: &str = r#"You are designing a backend to serve an existing frontend. Read the frontend source below, infer every API call it makes, and plan the backend files needed to satisfy them. Do not write any code yet.

Specification:
<<spec>>

Frontend source:
<<source>>

Respond with EXACTLY ONE JSON object and nothing else — no markdown fences, no prose:

{"files": [{"path": "relative/path/to/file", "description": "one sentence on what the file does"}]}

Rules:
- Every endpoint the frontend calls must be served by some planned route file.
- Include package.json and the server entry point.
- Paths are relative and forward-slash separated.
"#;

/// Backend-to-frontend conversion planning: derive a frontend manifest from
/// backend source.
pub const BACKEND_TO_FRONTEND_PLAN: &str = r#"You are designing a frontend for an existing backend. Read the backend source below, inventory its routes, and plan the frontend files needed to exercise them. Do not write any code yet.

Specification:
<<spec>>

Backend source:
<<source>>

Respond with EXACTLY ONE JSON object and nothing else — no markdown fences, no prose:

{"files": [{"path": "relative/path/to/file", "description": "one sentence on what the file does"}]}

Rules:
- Cover every route the backend exposes with at least one page or component.
- Include package.json, index.html, and the Vite entry point.
- Paths are relative and forward-slash separated.
"#;
